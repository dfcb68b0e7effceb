//! QC-Spork-Admin: spork operator tool
//!
//! Offline signing and inspection of spork messages. Output is JSON on stdout;
//! logs go to stderr (`RUST_LOG` or `QC_LOG_LEVEL`, default `info`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use qc_18_spork_management::{
    Network, OperatorKey, Secp256k1SignatureScheme, SignatureScheme, SporkCatalog, SporkKind,
    SporkMessage, SystemTimeSource, TimeSource,
};

/// QC-Spork-Admin: sign, verify and inspect sporks
#[derive(Parser, Debug)]
#[command(name = "qc-spork-admin")]
#[command(about = "Operator tool for Quantum-Chain sporks")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the spork catalog with compiled-in defaults
    List,

    /// Sign a spork and print the wire payload
    Sign {
        /// mainnet, testnet or regtest
        #[arg(short, long, default_value = "testnet")]
        network: Network,

        /// Operator private key (32-byte hex)
        #[arg(short, long)]
        key: String,

        /// Spork name (SPORK_5_RECONSIDER_BLOCKS) or numeric id
        #[arg(short, long)]
        spork: String,

        /// New value
        #[arg(short, long, allow_hyphen_values = true)]
        value: i64,

        /// Signing time in Unix seconds (default: now)
        #[arg(short, long)]
        time: Option<i64>,
    },

    /// Decode a hex wire payload and check its signature
    Verify {
        #[arg(short, long, default_value = "testnet")]
        network: Network,

        /// Hex-encoded `spork` payload
        #[arg(long)]
        hex: String,
    },

    /// Derive the compressed public key for a private key
    Pubkey {
        #[arg(short, long)]
        key: String,
    },
}

#[derive(Serialize)]
struct CatalogEntry {
    id: i32,
    name: &'static str,
    default_value: i64,
    kind: &'static str,
}

#[derive(Serialize, Debug)]
struct SporkReport {
    spork_id: i32,
    name: &'static str,
    value: i64,
    signed_time: i64,
    signature: String,
    identity: String,
    payload: String,
    valid: bool,
}

impl SporkReport {
    fn new(msg: &SporkMessage, valid: bool) -> Result<Self> {
        Ok(Self {
            spork_id: msg.spork_id,
            name: msg.name(),
            value: msg.value,
            signed_time: msg.signed_time,
            signature: hex::encode(&msg.signature),
            identity: hex::encode(msg.identity()),
            payload: hex::encode(msg.to_bytes()?),
            valid,
        })
    }
}

fn catalog() -> Vec<CatalogEntry> {
    SporkCatalog::definitions()
        .iter()
        .map(|d| CatalogEntry {
            id: d.id.as_i32(),
            name: d.name,
            default_value: d.default_value,
            kind: match d.kind {
                SporkKind::Activation => "activation",
                SporkKind::Parameter => "parameter",
            },
        })
        .collect()
}

/// Accepts a catalog name or a raw numeric id.
fn resolve_spork(arg: &str) -> Result<i32> {
    if let Ok(raw) = arg.parse::<i32>() {
        return Ok(raw);
    }
    match SporkCatalog::id_by_name(arg) {
        Some(id) => Ok(id.as_i32()),
        None => bail!("unknown spork: {arg}"),
    }
}

fn network_key(network: Network) -> Result<Vec<u8>> {
    hex::decode(network.spork_public_key_hex()).context("decoding network spork key")
}

fn sign(
    network: Network,
    key: &str,
    spork: &str,
    value: i64,
    time: Option<i64>,
) -> Result<SporkReport> {
    let scheme = Secp256k1SignatureScheme::new();
    let key = OperatorKey::new(key);
    let spork_id = resolve_spork(spork)?;
    let signed_time = time.unwrap_or_else(|| SystemTimeSource.now());

    let mut msg = SporkMessage::new(spork_id, value, signed_time);
    msg.signature = scheme
        .sign(msg.canonical_payload().as_bytes(), &key)
        .context("signing spork")?;

    let valid = scheme.verify(
        msg.canonical_payload().as_bytes(),
        &msg.signature,
        &network_key(network)?,
    );
    if !valid {
        warn!(
            network = network.as_str(),
            "Key is not the network spork key; peers will reject this message"
        );
    }
    SporkReport::new(&msg, valid)
}

fn verify(network: Network, payload_hex: &str) -> Result<SporkReport> {
    let bytes = hex::decode(payload_hex.trim()).context("payload is not hex")?;
    let msg = SporkMessage::from_bytes(&bytes)?;
    let valid = Secp256k1SignatureScheme::new().verify(
        msg.canonical_payload().as_bytes(),
        &msg.signature,
        &network_key(network)?,
    );
    SporkReport::new(&msg, valid)
}

fn pubkey(key: &str) -> Result<String> {
    let public_key = Secp256k1SignatureScheme::new()
        .derive_public_key(&OperatorKey::new(key))
        .context("deriving public key")?;
    Ok(hex::encode(public_key))
}

fn init_logging() {
    let level = std::env::var("QC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let output = match args.command {
        Command::List => serde_json::to_string_pretty(&catalog())?,
        Command::Sign {
            network,
            key,
            spork,
            value,
            time,
        } => {
            let report = sign(network, &key, &spork, value, time)?;
            info!(spork = report.name, identity = %report.identity, "Spork signed");
            serde_json::to_string_pretty(&report)?
        }
        Command::Verify { network, hex } => {
            let report = verify(network, &hex)?;
            let json = serde_json::to_string_pretty(&report)?;
            if !report.valid {
                println!("{json}");
                bail!("signature does not verify against the {} spork key", network.as_str());
            }
            json
        }
        Command::Pubkey { key } => serde_json::to_string_pretty(&serde_json::json!({
            "public_key": pubkey(&key)?,
        }))?,
    };

    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_18_spork_management::test_utils::REGTEST_OPERATOR_KEY;

    #[test]
    fn test_resolve_spork_by_name_and_id() {
        assert_eq!(resolve_spork("SPORK_5_RECONSIDER_BLOCKS").unwrap(), 10005);
        assert_eq!(resolve_spork("10023").unwrap(), 10023);
        assert_eq!(resolve_spork("31337").unwrap(), 31337);
        assert!(resolve_spork("SPORK_0_NOPE").is_err());
    }

    #[test]
    fn test_catalog_lists_every_spork() {
        let entries = catalog();
        assert_eq!(entries.len(), 23);
        assert_eq!(entries[2].name, "SPORK_3_MAX_VALUE");
        assert_eq!(entries[2].kind, "parameter");
    }

    #[test]
    fn test_sign_then_verify() {
        let signed = sign(
            Network::Regtest,
            REGTEST_OPERATOR_KEY,
            "SPORK_3_MAX_VALUE",
            250,
            Some(1_700_000_000),
        )
        .unwrap();
        assert!(signed.valid);

        let checked = verify(Network::Regtest, &signed.payload).unwrap();
        assert!(checked.valid);
        assert_eq!(checked.identity, signed.identity);
        assert_eq!(checked.value, 250);

        assert!(!verify(Network::Mainnet, &signed.payload).unwrap().valid);
    }

    #[test]
    fn test_pubkey_matches_network_constant() {
        assert_eq!(
            pubkey(REGTEST_OPERATOR_KEY).unwrap(),
            Network::Regtest.spork_public_key_hex()
        );
        assert!(pubkey("xyz").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "qc-spork-admin",
            "sign",
            "--network",
            "regtest",
            "--key",
            "ab",
            "--spork",
            "10001",
            "--value",
            "-5",
        ])
        .unwrap();
        match args.command {
            Command::Sign { network, value, time, .. } => {
                assert_eq!(network, Network::Regtest);
                assert_eq!(value, -5);
                assert_eq!(time, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
