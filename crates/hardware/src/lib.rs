//! Cycle-accurate multi-core simulator with MSI cache coherence.
//!
//! Each core runs a 5-stage in-order pipeline over a private direct-mapped
//! cache. The caches share a single coherence bus that serializes BusRd,
//! BusRdX and Flush traffic in front of a latency-modeled word memory.
//!
//! The crate is organized leaf-first:
//! - [`common`]: error types and architectural constants.
//! - [`config`]: TOML-backed simulator configuration.
//! - [`isa`]: the instruction set and the assembly text parser.
//! - [`core`]: register file, cache and the pipeline engine.
//! - [`system`]: shared memory, coherence bus and the LL/SC watch table.
//! - [`sim`]: program loading and the lock-step [`sim::Machine`].
//! - [`stats`]: per-core and machine-wide reporting.

pub mod common;
pub mod config;
pub mod core;
pub mod isa;
pub mod sim;
pub mod stats;
pub mod system;

pub use crate::config::Config;
pub use crate::sim::Machine;
