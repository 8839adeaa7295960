//! Shared error types and architectural constants.

pub mod constants;
pub mod error;

pub use self::error::{BusError, ConfigError, LoadError, MemoryError, SimError};
