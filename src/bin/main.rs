//! Sentinel CLI - backup envelope tooling
//!
//! Every command prints JSON:
//!   sentinel validate <key>                       → {"key", "valid", "type", "address"}
//!   sentinel inspect <file>                       → {"version", "time", "scheme", ...}
//!   sentinel restore <file> --password <pw>       → decoded collections / keys
//!   sentinel export --collections <file> --password <pw>  → envelope
//!
//! Configuration:
//!   SENTINEL_BACKUP_VERSION, SENTINEL_VERSION_NAME (env or .env)
//!   SENTINEL_PASSWORD (fallback for --password)
//!
//! Output format:
//!   --json     Compact JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use anyhow::{anyhow, bail, Context, Result};
use sentinel::logging::init_logging;
use sentinel::{
    read_backup_file, AesCipher, BackupCodec, BackupConfig, Envelope, LegacyRestore, MemoryDojo, MemoryPrefs,
    MemoryStore, PayloadShape, PubKeyCollection, PubKeyType, Restored, Scheme, SentinelRestore,
};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::debug;

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);
    init_logging();

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("sentinel {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("validate") => cmd_validate(&opts),
        Some("inspect") => cmd_inspect(&opts),
        Some("restore") => cmd_restore(&opts),
        Some("export") => cmd_export(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = !opts.json && (opts.pretty || std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({"error": format!("{:#}", e)}), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    target: Option<String>,
    password: Option<String>,
    format: Option<String>,
    collections: Option<String>,
    prefs: Option<String>,
    dojo: Option<String>,
    legacy_addresses: bool,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        load_dotenv();

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let mut value = || {
                i += 1;
                args.get(i).cloned()
            };
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--legacy-addresses" => opts.legacy_addresses = true,
                "--password" | "-p" => opts.password = value(),
                "--format" | "-f" => opts.format = value(),
                "--collections" | "-c" => opts.collections = value(),
                "--prefs" => opts.prefs = value(),
                "--dojo" => opts.dojo = value(),
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        let mut positional = positional.into_iter();
        opts.command = positional.next();
        opts.target = positional.next();

        if opts.password.is_none() {
            opts.password = env::var("SENTINEL_PASSWORD").ok().filter(|s| !s.is_empty());
        }

        opts
    }

    fn target(&self, what: &str) -> Result<&str> {
        self.target.as_deref().ok_or_else(|| anyhow!("Missing {}", what))
    }

    fn password(&self) -> Result<&str> {
        self.password.as_deref().ok_or_else(|| anyhow!("--password is required"))
    }
}

/// `KEY=value` lines from `./.env`; the real environment wins.
fn load_dotenv() {
    let Ok(contents) = std::fs::read_to_string(".env") else { return };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && env::var(key.trim()).is_err() {
                env::set_var(key.trim(), value);
            }
        }
    }
}

fn print_usage() {
    println!(
        r#"sentinel - watch-only wallet backup tool

USAGE:
    sentinel <command> [target] [options]

COMMANDS:
    validate <key>          Classify an xpub/ypub/zpub or address
    inspect <file>          Show envelope version and time (no decrypt)
    restore <file>          Decrypt and decode a backup
    export                  Build an encrypted backup envelope

RESTORE OPTIONS:
    --password, -p <pw>     Backup password (env: SENTINEL_PASSWORD)
    --format, -f <fmt>      auto|sentinel|legacy|samourai (default: auto)
    --legacy-addresses      Keep plain addresses from legacy exports

EXPORT OPTIONS:
    --collections, -c <f>   JSON array of collections (required)
    --prefs <file>          JSON object of preferences
    --dojo <file>           Dojo pairing JSON
    --password, -p <pw>     Backup password (env: SENTINEL_PASSWORD)

OUTPUT OPTIONS:
    --json                  Compact JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

EXAMPLES:
    sentinel validate zpub6r...
    sentinel inspect backup.txt
    sentinel restore backup.txt --password hunter2 --format samourai
    sentinel export -c collections.json --prefs prefs.json -p hunter2 > backup.txt
"#
    );
}

fn codec(config: BackupConfig, collections: Vec<PubKeyCollection>, prefs: MemoryPrefs, dojo: MemoryDojo) -> BackupCodec {
    BackupCodec::new(
        config,
        Arc::new(AesCipher::new()),
        Arc::new(MemoryStore::with_collections(collections)),
        Arc::new(prefs),
        Arc::new(dojo),
    )
}

fn empty_codec(opts: &ParsedArgs) -> BackupCodec {
    let config = BackupConfig::from_env().with_legacy_addresses(opts.legacy_addresses);
    codec(config, Vec::new(), MemoryPrefs::new(), MemoryDojo::new())
}

fn cmd_validate(opts: &ParsedArgs) -> Result<Value> {
    let key = opts.target("key")?;
    let kind = sentinel::validate(key).or_else(|| sentinel::keys::address_type(key));
    Ok(json!({
        "key": sentinel::keys::normalize(key),
        "valid": kind.is_some(),
        "type": kind.map(|k| k.as_str()),
        "address": kind == Some(PubKeyType::Address),
    }))
}

fn cmd_inspect(opts: &ParsedArgs) -> Result<Value> {
    let path = opts.target("backup file")?;
    let env = Envelope::parse(&read_backup_file(path)?)?;
    let time = chrono::DateTime::from_timestamp_millis(env.time).map(|t| t.to_rfc3339());
    Ok(json!({
        "version": env.version,
        "time": env.time,
        "time_utc": time,
        "scheme": Scheme::for_version(env.version).as_str(),
        "payload_len": env.payload.len(),
    }))
}

fn cmd_restore(opts: &ParsedArgs) -> Result<Value> {
    let path = opts.target("backup file")?;
    let password = opts.password()?;
    let backup = read_backup_file(path)?;
    let codec = empty_codec(opts);

    let format = opts.format.as_deref().unwrap_or("auto");
    debug!(format, "restoring backup");
    let restored = match format {
        "auto" => codec.restore(&backup, password)?,
        other => match PayloadShape::from_str(other) {
            Some(PayloadShape::Sentinel) => Restored::Sentinel(codec.decrypt_sentinel(&backup, password)?),
            Some(PayloadShape::Legacy) => Restored::Legacy(codec.decrypt_sentinel_legacy(&backup, password)?),
            Some(PayloadShape::Samourai) => Restored::Samourai(
                codec
                    .decrypt_and_parse_samourai_payload(&backup, password)
                    .ok_or_else(|| anyhow!("Not a readable Samourai backup"))?,
            ),
            None => bail!("Unknown format: {}", other),
        },
    };
    restored_json(restored)
}

fn restored_json(restored: Restored) -> Result<Value> {
    let shape = restored.shape().as_str();
    Ok(match restored {
        Restored::Sentinel(SentinelRestore { collections, prefs, dojo }) => json!({
            "format": shape,
            "collections": serde_json::to_value(collections)?,
            "prefs": prefs,
            "dojo": dojo,
        }),
        Restored::Legacy(LegacyRestore { pub_keys, dojo }) => json!({
            "format": shape,
            "pub_keys": serde_json::to_value(pub_keys)?,
            "dojo": dojo,
        }),
        Restored::Samourai(collection) => json!({
            "format": shape,
            "collections": [serde_json::to_value(collection)?],
        }),
    })
}

fn cmd_export(opts: &ParsedArgs) -> Result<Value> {
    let password = opts.password()?;
    let collections_path = opts.collections.as_deref().ok_or_else(|| anyhow!("--collections is required"))?;
    let collections: Vec<PubKeyCollection> = serde_json::from_str(&read_backup_file(collections_path)?)
        .with_context(|| format!("Invalid collections file: {}", collections_path))?;

    let prefs = match opts.prefs.as_deref() {
        Some(path) => {
            let value: Value = serde_json::from_str(&read_backup_file(path)?)
                .with_context(|| format!("Invalid prefs file: {}", path))?;
            if !value.is_object() {
                bail!("Prefs file must hold a JSON object: {}", path);
            }
            MemoryPrefs::from_value(value)
        }
        None => MemoryPrefs::new(),
    };
    let dojo = match opts.dojo.as_deref() {
        Some(path) => MemoryDojo::with_payload(read_backup_file(path)?),
        None => MemoryDojo::new(),
    };

    let envelope = codec(BackupConfig::from_env(), collections, prefs, dojo).export(password)?;
    Ok(serde_json::from_str(&envelope)?)
}
