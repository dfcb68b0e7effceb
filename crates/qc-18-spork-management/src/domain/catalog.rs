//! # Spork Catalog
//!
//! The closed set of sporks this node understands, with their names and the
//! compiled-in defaults used until the network delivers a signed value.
//!
//! Activation sporks carry a Unix timestamp: the feature is on once that
//! time has passed. Parameter sporks carry a plain number and must be read
//! with `get_value`, never `is_active`.

/// Default for activation sporks that ship disabled (2099-01-01T00:00:00Z).
pub const SPORK_OFF: i64 = 4_070_908_800;

/// Default for activation sporks that ship enabled (2001-01-01T00:00:00Z).
pub const SPORK_ON: i64 = 978_307_200;

/// Known spork identifiers.
///
/// Discriminants are the wire ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum SporkId {
    SwiftTx = 10001,
    SwiftTxBlockFiltering = 10002,
    MaxValue = 10003,
    MasternodePaymentEnforcement = 10004,
    ReconsiderBlocks = 10005,
    MnWinnerMinimumAge = 10006,
    NewProtocolEnforcement = 10007,
    MinStakeInput = 10008,
    BlockReward = 10009,
    Tier1Collateral = 10010,
    Tier2Collateral = 10011,
    Tier3Collateral = 10012,
    Tier4Collateral = 10013,
    Tier5Collateral = 10014,
    Tier1BlockPercent = 10015,
    Tier2BlockPercent = 10016,
    Tier3BlockPercent = 10017,
    Tier4BlockPercent = 10018,
    Tier5BlockPercent = 10019,
    SkipMnSync = 10020,
    ActivateMinStake = 10021,
    CoinMaturity = 10022,
    FreezeChain = 10023,
}

impl SporkId {
    /// Every catalog entry, in id order.
    pub const ALL: [SporkId; 23] = [
        SporkId::SwiftTx,
        SporkId::SwiftTxBlockFiltering,
        SporkId::MaxValue,
        SporkId::MasternodePaymentEnforcement,
        SporkId::ReconsiderBlocks,
        SporkId::MnWinnerMinimumAge,
        SporkId::NewProtocolEnforcement,
        SporkId::MinStakeInput,
        SporkId::BlockReward,
        SporkId::Tier1Collateral,
        SporkId::Tier2Collateral,
        SporkId::Tier3Collateral,
        SporkId::Tier4Collateral,
        SporkId::Tier5Collateral,
        SporkId::Tier1BlockPercent,
        SporkId::Tier2BlockPercent,
        SporkId::Tier3BlockPercent,
        SporkId::Tier4BlockPercent,
        SporkId::Tier5BlockPercent,
        SporkId::SkipMnSync,
        SporkId::ActivateMinStake,
        SporkId::CoinMaturity,
        SporkId::FreezeChain,
    ];

    /// Wire id.
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Resolve a wire id. `None` for ids this build does not know.
    pub fn from_i32(raw: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.as_i32() == raw)
    }

    /// Catalog entry for this id.
    pub fn definition(self) -> &'static SporkDefinition {
        // CATALOG is laid out in the same order as ALL, starting at 10001.
        &CATALOG[(self.as_i32() - SporkId::SwiftTx.as_i32()) as usize]
    }

    /// Canonical upper-case name, e.g. `SPORK_5_RECONSIDER_BLOCKS`.
    pub fn name(self) -> &'static str {
        self.definition().name
    }
}

impl From<SporkId> for i32 {
    fn from(id: SporkId) -> i32 {
        id.as_i32()
    }
}

impl std::fmt::Display for SporkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a spork's value is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SporkKind {
    /// Value is a Unix timestamp; active once it has passed.
    Activation,
    /// Value is a raw numeric parameter.
    Parameter,
}

/// One row of the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SporkDefinition {
    pub id: SporkId,
    pub name: &'static str,
    pub default_value: i64,
    pub kind: SporkKind,
}

const fn def(id: SporkId, name: &'static str, default_value: i64, kind: SporkKind) -> SporkDefinition {
    SporkDefinition {
        id,
        name,
        default_value,
        kind,
    }
}

use SporkKind::{Activation, Parameter};

static CATALOG: [SporkDefinition; 23] = [
    def(SporkId::SwiftTx, "SPORK_1_SWIFTTX", SPORK_ON, Activation),
    def(SporkId::SwiftTxBlockFiltering, "SPORK_2_SWIFTTX_BLOCK_FILTERING", 1_424_217_600, Activation),
    def(SporkId::MaxValue, "SPORK_3_MAX_VALUE", 1_000, Parameter),
    def(SporkId::MasternodePaymentEnforcement, "SPORK_4_MASTERNODE_PAYMENT_ENFORCEMENT", SPORK_OFF, Activation),
    def(SporkId::ReconsiderBlocks, "SPORK_5_RECONSIDER_BLOCKS", 0, Parameter),
    def(SporkId::MnWinnerMinimumAge, "SPORK_6_MN_WINNER_MINIMUM_AGE", 8_000, Parameter),
    def(SporkId::NewProtocolEnforcement, "SPORK_7_NEW_PROTOCOL_ENFORCEMENT", SPORK_OFF, Activation),
    def(SporkId::MinStakeInput, "SPORK_8_MIN_STAKE_INPUT", 0, Parameter),
    def(SporkId::BlockReward, "SPORK_9_BLOCK_REWARD", SPORK_OFF, Activation),
    def(SporkId::Tier1Collateral, "SPORK_10_TIER_1_COLLATERAL", 1_000, Parameter),
    def(SporkId::Tier2Collateral, "SPORK_11_TIER_2_COLLATERAL", 3_000, Parameter),
    def(SporkId::Tier3Collateral, "SPORK_12_TIER_3_COLLATERAL", 10_000, Parameter),
    def(SporkId::Tier4Collateral, "SPORK_13_TIER_4_COLLATERAL", 30_000, Parameter),
    def(SporkId::Tier5Collateral, "SPORK_14_TIER_5_COLLATERAL", 100_000, Parameter),
    def(SporkId::Tier1BlockPercent, "SPORK_15_TIER_1_BLOCK_PERCENT", 4, Parameter),
    def(SporkId::Tier2BlockPercent, "SPORK_16_TIER_2_BLOCK_PERCENT", 10, Parameter),
    def(SporkId::Tier3BlockPercent, "SPORK_17_TIER_3_BLOCK_PERCENT", 20, Parameter),
    def(SporkId::Tier4BlockPercent, "SPORK_18_TIER_4_BLOCK_PERCENT", 30, Parameter),
    def(SporkId::Tier5BlockPercent, "SPORK_19_TIER_5_BLOCK_PERCENT", 36, Parameter),
    def(SporkId::SkipMnSync, "SPORK_20_SKIP_MN_SYNC", SPORK_OFF, Activation),
    def(SporkId::ActivateMinStake, "SPORK_21_ACTIVATE_MIN_STAKE", SPORK_OFF, Activation),
    def(SporkId::CoinMaturity, "SPORK_22_COIN_MATURITY", 100, Parameter),
    def(SporkId::FreezeChain, "SPORK_23_FREEZE_CHAIN", SPORK_OFF, Activation),
];

/// Read-only view over the compiled-in catalog.
#[derive(Clone, Copy, Debug, Default)]
pub struct SporkCatalog;

impl SporkCatalog {
    /// All definitions, in id order.
    pub fn definitions() -> &'static [SporkDefinition] {
        &CATALOG
    }

    /// Definition for a raw wire id.
    pub fn definition(raw_id: i32) -> Option<&'static SporkDefinition> {
        SporkId::from_i32(raw_id).map(SporkId::definition)
    }

    /// Compiled-in default for a raw wire id.
    pub fn default_value(raw_id: i32) -> Option<i64> {
        Self::definition(raw_id).map(|d| d.default_value)
    }

    /// Look up an id by its canonical name.
    pub fn id_by_name(name: &str) -> Option<SporkId> {
        CATALOG.iter().find(|d| d.name == name).map(|d| d.id)
    }

    /// Canonical name for a raw wire id, or `"Unknown"`.
    pub fn name_by_id(raw_id: i32) -> &'static str {
        Self::definition(raw_id).map_or("Unknown", |d| d.name)
    }
}
