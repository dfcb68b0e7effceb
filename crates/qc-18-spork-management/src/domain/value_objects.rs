//! Value objects for spork configuration.

use std::env;
use std::str::FromStr;

use tracing::warn;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::catalog::SPORK_OFF;

/// Returned by `get_value` for ids with neither an active entry nor a default.
pub const UNKNOWN_SPORK_VALUE: i64 = -1;

/// Misbehavior score charged for a spork with a bad signature.
pub const INVALID_SIGNATURE_PENALTY: u32 = 100;

/// Reconsideration slack per block: twice a 150 s block interval.
pub const REPROCESS_SECONDS_PER_BLOCK: i64 = 5 * 60;

/// Network the node participates in. Each has its own operator key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Regtest,
}

impl Network {
    /// Compressed secp256k1 spork public key, hex encoded.
    pub fn spork_public_key_hex(self) -> &'static str {
        match self {
            Network::Mainnet => "03b5ab0d9236eb62709be3c3634d70ef353ed46294bfc3685649d0f9862eea4a72",
            Network::Testnet => "02c0ebc6a821a5ab0fb0ad01ca71a86cbecfe6db28626ac1b017fb2b2b493c1286",
            Network::Regtest => "0208239d642f287c2d865512ada838bf6f40fcbdf037703c0237912175d9391799",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(format!("unknown network: {other}")),
        }
    }
}

/// Operator private key as supplied by the operator (hex-encoded secret).
///
/// Cleared from memory on drop and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct OperatorKey(String);

impl OperatorKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OperatorKey(<redacted>)")
    }
}

/// Spork subsystem configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SporkConfig {
    /// Network whose operator key is trusted
    pub network: Network,
    /// Hex-encoded public key that spork signatures must verify against
    pub spork_public_key: String,
    /// Penalty applied to peers relaying badly signed sporks
    pub misbehavior_penalty: u32,
    /// Reconsideration window per requested block, in seconds
    pub reprocess_seconds_per_block: i64,
    /// Activation time substituted for unknown sporks
    pub far_future_activation: i64,
    /// Ignore all inbound spork traffic
    pub lite_mode: bool,
}

impl Default for SporkConfig {
    fn default() -> Self {
        Self::for_network(Network::default())
    }
}

impl SporkConfig {
    /// Defaults for a given network.
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            spork_public_key: network.spork_public_key_hex().to_string(),
            misbehavior_penalty: INVALID_SIGNATURE_PENALTY,
            reprocess_seconds_per_block: REPROCESS_SECONDS_PER_BLOCK,
            far_future_activation: SPORK_OFF,
            lite_mode: false,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_NETWORK`: mainnet, testnet or regtest (default: testnet)
    /// - `QC_SPORK_PUBKEY`: overrides the network's spork public key
    /// - `QC_SPORK_LITE_MODE`: ignore spork traffic (default: false)
    pub fn from_env() -> Self {
        let network = network_or_default(env::var("QC_NETWORK").ok().as_deref());

        let mut config = Self::for_network(network);

        if let Ok(key) = env::var("QC_SPORK_PUBKEY") {
            config.spork_public_key = key;
        }

        config.lite_mode = env::var("QC_SPORK_LITE_MODE")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        config
    }
}

/// Parse a `QC_NETWORK` value, falling back to the default network.
fn network_or_default(raw: Option<&str>) -> Network {
    let Some(raw) = raw else {
        return Network::default();
    };
    raw.parse().unwrap_or_else(|_| {
        let fallback = Network::default();
        warn!(
            value = raw,
            fallback = fallback.as_str(),
            "Unrecognized QC_NETWORK, using default network"
        );
        fallback
    })
}
