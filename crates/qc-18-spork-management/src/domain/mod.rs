//! # Domain Layer for Spork Management
//!
//! Pure business logic with no I/O dependencies.
//!
//! ## Contents
//!
//! - **catalog**: Closed set of spork ids with names and defaults
//! - **entities**: `SporkMessage`, inventory and chain views
//! - **registry**: Lock-guarded history and active maps
//! - **services**: Update ordering, activation and effect rules
//! - **value_objects**: Configuration and protocol constants

pub mod catalog;
pub mod entities;
pub mod errors;
pub mod registry;
pub mod services;
pub mod value_objects;

pub use catalog::*;
pub use entities::*;
pub use errors::*;
pub use registry::*;
pub use services::*;
pub use value_objects::*;
