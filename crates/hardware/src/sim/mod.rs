//! Program loading and the lock-step machine.

pub mod loader;
pub mod machine;

pub use self::machine::Machine;
