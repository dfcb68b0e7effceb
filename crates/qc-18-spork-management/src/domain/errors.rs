//! # Spork Errors
//!
//! Error types for spork signing, verification and wire decoding.
//!
//! Stale updates are not errors. They surface as
//! [`ProcessOutcome::Stale`](crate::events::ProcessOutcome).

use thiserror::Error;

/// Errors raised by the spork subsystem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SporkError {
    /// Wire payload could not be decoded
    #[error("Malformed spork message: {0}")]
    MalformedMessage(String),

    /// Wire command is not handled by this subsystem
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Signature does not verify against the network spork key
    #[error("Invalid spork signature")]
    InvalidSignature,

    /// Signing requested but no private key was configured
    #[error("No spork signing key configured")]
    SigningKeyMissing,

    /// Configured private key could not be parsed
    #[error("Invalid spork signing key: {0}")]
    InvalidSigningKey(String),

    /// Network public key could not be parsed
    #[error("Invalid spork public key: {0}")]
    InvalidPublicKey(String),

    /// The signature scheme refused to sign
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Operator key signs, but not with the network spork key
    #[error("Signing key does not match the network spork key")]
    UnauthorizedSigningKey,

    /// A freshly produced signature did not verify against its own key
    #[error("Signature self-verification failed")]
    SelfVerificationFailed,

    /// Operator referenced a spork name that is not in the catalog
    #[error("Unknown spork name: {0}")]
    UnknownSporkName(String),
}

/// Errors reported by the chain layer while reprocessing blocks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainViewError {
    /// Block is no longer present in the block index
    #[error("Block not found in index")]
    BlockNotFound,

    /// Chain layer rejected the reconsideration
    #[error("Reconsider failed: {0}")]
    ReconsiderFailed(String),

    /// Best-chain activation failed
    #[error("Activate best chain failed: {0}")]
    ActivationFailed(String),
}
