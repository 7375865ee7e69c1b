//! Keys - Classify scanned or imported strings as extended keys or addresses.
//!
//! The prefix of an extended public key encodes the derivation scheme:
//!
//! | Prefix | Network | Type |
//! |--------|---------|------|
//! | `xpub` / `tpub` | main / test | BIP44 |
//! | `ypub` / `upub` | main / test | BIP49 |
//! | `zpub` / `vpub` | main / test | BIP84 |

use crate::models::PubKeyType;
use bitcoin::address::{Address, NetworkUnchecked};
use std::str::FromStr;
use tracing::debug;

const URI_PREFIXES: &[&str] = &["bitcoin:", "BITCOIN:", "bitcointestnet:"];

/// Serialized BIP32 key length (without checksum).
const XPUB_LEN: usize = 78;

/// Version bytes of every public extended-key prefix we accept.
const XPUB_VERSIONS: &[[u8; 4]] = &[
    [0x04, 0x88, 0xb2, 0x1e], // xpub
    [0x04, 0x9d, 0x7c, 0xb2], // ypub
    [0x04, 0xb2, 0x47, 0x46], // zpub
    [0x04, 0x35, 0x87, 0xcf], // tpub
    [0x04, 0x4a, 0x52, 0x62], // upub
    [0x04, 0x5f, 0x1c, 0xf6], // vpub
];

/// Strip a payment-URI scheme and any `?query` suffix.
pub fn normalize(code: &str) -> &str {
    let code = code.trim();
    let stripped = URI_PREFIXES
        .iter()
        .find_map(|prefix| code.strip_prefix(prefix))
        .unwrap_or(code);
    match stripped.find('?') {
        Some(idx) => &stripped[..idx],
        None => stripped,
    }
}

/// Type implied by the literal prefix, before any checksum validation.
pub fn prefix_type(key: &str) -> Option<PubKeyType> {
    if key.starts_with("xpub") || key.starts_with("tpub") {
        Some(PubKeyType::Bip44)
    } else if key.starts_with("ypub") || key.starts_with("upub") {
        Some(PubKeyType::Bip49)
    } else if key.starts_with("zpub") || key.starts_with("vpub") {
        Some(PubKeyType::Bip84)
    } else {
        None
    }
}

/// Classify `code` as an extended public key.
///
/// Extended keys must pass Base58Check and carry a known version; a
/// recognized prefix that fails that check yields `None`. Without a
/// recognized prefix the string is checked as an address and still yields
/// `None`: a plain address is not an extended key. Use [`address_type`] to
/// tell addresses apart from garbage.
pub fn validate(code: &str) -> Option<PubKeyType> {
    let payload = normalize(code);
    match prefix_type(payload) {
        Some(kind) if is_valid_xpub(payload) => Some(kind),
        Some(_) => None,
        None => {
            if is_valid_address(payload) {
                debug!("plain address, no extended key type");
            }
            None
        }
    }
}

/// [`PubKeyType::Address`] when `code` (after [`normalize`]) is a parseable
/// address without an extended-key prefix.
pub fn address_type(code: &str) -> Option<PubKeyType> {
    let payload = normalize(code);
    (prefix_type(payload).is_none() && is_valid_address(payload)).then_some(PubKeyType::Address)
}

/// Base58Check-decodes to a 78-byte BIP32 public key with a known version.
pub fn is_valid_xpub(key: &str) -> bool {
    match bitcoin::base58::decode_check(key) {
        Ok(data) => data.len() == XPUB_LEN && XPUB_VERSIONS.iter().any(|v| data[..4] == v[..]),
        Err(_) => false,
    }
}

/// Any base58 or bech32 address on any network.
pub fn is_valid_address(address: &str) -> bool {
    Address::<NetworkUnchecked>::from_str(address).is_ok()
}
