//! Backup configuration - passed from higher layers

use crate::core::schema::labels;
use crate::crypto::{Scheme, DEFAULT_PBKDF2_HMAC_SHA256_ITERATIONS, DEFAULT_PBKDF2_ITERATIONS};

/// Envelope version written by this release. Anything but 1 selects SHA-256.
pub const DEFAULT_VERSION_CODE: i64 = 2;

#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Written as the envelope `version`.
    pub version_code: i64,
    /// Human readable release, written into support backups.
    pub version_name: String,
    pub legacy_iterations: u32,
    pub sha256_iterations: u32,
    pub samourai_label: String,
    /// Label for the collection built from a flat legacy backup.
    pub legacy_label: String,
    /// Keep plain addresses from the flat legacy `legacy` array. Off by
    /// default: key classification gives addresses no type, so they fail
    /// the array type check and are dropped.
    pub legacy_addresses: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            version_code: DEFAULT_VERSION_CODE,
            version_name: env!("CARGO_PKG_VERSION").to_string(),
            legacy_iterations: DEFAULT_PBKDF2_ITERATIONS,
            sha256_iterations: DEFAULT_PBKDF2_HMAC_SHA256_ITERATIONS,
            samourai_label: labels::SAMOURAI_COLLECTION.to_string(),
            legacy_label: labels::LEGACY_COLLECTION.to_string(),
            legacy_addresses: false,
        }
    }
}

impl BackupConfig {
    pub fn new() -> Self { Self::default() }

    /// Defaults overridden by `SENTINEL_BACKUP_VERSION` and `SENTINEL_VERSION_NAME`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = std::env::var("SENTINEL_BACKUP_VERSION").ok().and_then(|v| v.trim().parse().ok()) {
            config.version_code = v;
        }
        if let Ok(name) = std::env::var("SENTINEL_VERSION_NAME") {
            if !name.trim().is_empty() {
                config.version_name = name;
            }
        }
        config
    }

    pub fn with_version_code(mut self, v: i64) -> Self { self.version_code = v; self }
    pub fn with_version_name(mut self, v: impl Into<String>) -> Self { self.version_name = v.into(); self }
    pub fn with_legacy_iterations(mut self, n: u32) -> Self { self.legacy_iterations = n; self }
    pub fn with_sha256_iterations(mut self, n: u32) -> Self { self.sha256_iterations = n; self }
    pub fn with_samourai_label(mut self, l: impl Into<String>) -> Self { self.samourai_label = l.into(); self }
    pub fn with_legacy_label(mut self, l: impl Into<String>) -> Self { self.legacy_label = l.into(); self }
    pub fn with_legacy_addresses(mut self, keep: bool) -> Self { self.legacy_addresses = keep; self }

    /// Iteration count to pair with `scheme`.
    pub fn iterations(&self, scheme: Scheme) -> u32 {
        match scheme {
            Scheme::Legacy => self.legacy_iterations,
            Scheme::Sha256 => self.sha256_iterations,
        }
    }

    /// Scheme and iteration count for an envelope `version`.
    pub fn scheme_for(&self, version: i64) -> (Scheme, u32) {
        let scheme = Scheme::for_version(version);
        (scheme, self.iterations(scheme))
    }

    /// Pairing used by flat legacy backups: the PRF follows the version, but
    /// the iteration count is always the legacy one.
    pub fn legacy_scheme_for(&self, version: i64) -> (Scheme, u32) {
        (Scheme::for_version(version), self.legacy_iterations)
    }

    /// Every distinct pairing worth trying for an envelope `version`, most
    /// likely first.
    pub fn candidate_schemes(&self, version: i64) -> Vec<(Scheme, u32)> {
        let mut out = Vec::with_capacity(3);
        for pairing in [
            self.scheme_for(version),
            self.legacy_scheme_for(version),
            (Scheme::Legacy, self.legacy_iterations),
        ] {
            if !out.contains(&pairing) {
                out.push(pairing);
            }
        }
        out
    }
}
