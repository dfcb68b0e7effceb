//! # Adapters Module
//!
//! Infrastructure adapters implementing the outbound ports that do not
//! belong to another subsystem.

mod secp256k1;
mod time;

pub use self::secp256k1::Secp256k1SignatureScheme;
pub use self::time::SystemTimeSource;
