//! Core utilities and common types for vigil.

pub mod access;
pub mod error;
pub mod types;

pub use access::{AccessControl, Capability};
pub use error::{Error, Result};
pub use types::*;
