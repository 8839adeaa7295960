//! Error types.
//!
//! Load-time problems in program text surface as [`LoadError`], fatal
//! runtime conditions as [`SimError`]. Recoverable conditions (cache misses,
//! writes to non-Modified lines, failed store-conditionals) are ordinary
//! result enums in their modules and never appear here.

use std::path::PathBuf;

use thiserror::Error;

/// A fatal problem in a program's text, reported with its 1-based line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("line {line}: unknown opcode `{opcode}`")]
    UnknownOpcode { line: usize, opcode: String },

    #[error("line {line}: `{opcode}` expects {expected} operand(s), found {found}")]
    OperandCount {
        line: usize,
        opcode: String,
        expected: &'static str,
        found: usize,
    },

    #[error("line {line}: malformed register `{token}` (expected `$N`)")]
    BadRegister { line: usize, token: String },

    #[error("line {line}: register ${reg} out of range (0-15)")]
    RegisterOutOfRange { line: usize, reg: u32 },

    #[error("line {line}: $1 is reserved and cannot be a destination")]
    ReservedDestination { line: usize },

    #[error("line {line}: malformed immediate `{token}`")]
    MalformedImmediate { line: usize, token: String },

    #[error("line {line}: immediate {value} out of range (-2048..=2047)")]
    ImmediateOutOfRange { line: usize, value: i64 },

    #[error("line {line}: branch target {target} outside program of {len} instruction(s)")]
    TargetOutOfRange { line: usize, target: i32, len: usize },

    #[error("program has {len} instructions, limit is {max}")]
    ProgramTooLong { len: usize, max: usize },

    #[error("could not read `{path}`: {message}")]
    Io { path: PathBuf, message: String },
}

/// A fatal runtime condition that aborts the simulation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("core {core}: register ${reg} out of range at pc {pc}")]
    InvalidRegister { core: usize, pc: usize, reg: usize },

    #[error("core {core}: $1 used as destination at pc {pc}")]
    ReservedDestination { core: usize, pc: usize },

    #[error("core {core}: negative shift amount {amount} at pc {pc}")]
    NegativeShift { core: usize, pc: usize, amount: i32 },

    #[error("core {core}: address {addr} out of range")]
    AddressOutOfRange { core: usize, addr: i64 },

    #[error("core {core}: pc {pc} outside program of {len} instruction(s)")]
    PcOutOfRange { core: usize, pc: i64, len: usize },

    #[error("machine has {cores} core(s), program count is {programs}")]
    CoreCount { cores: usize, programs: usize },

    #[error("invalid machine configuration: {0}")]
    Config(String),

    #[error("cycle limit of {limit} reached before all cores halted")]
    CycleLimit { limit: u64 },

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// An invalid call into the coherence bus.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("bus request from unknown core {core}")]
    InvalidCore { core: usize },

    #[error("bus request for address {addr} outside memory")]
    AddressOutOfRange { addr: u32 },

    #[error("memory rejected a request while busy")]
    MemoryBusy,
}

/// A memory request that could not be started.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("memory busy with an outstanding operation")]
    Busy,

    #[error("memory address {addr} out of range")]
    AddressOutOfRange { addr: u32 },
}

impl From<MemoryError> for BusError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::Busy => BusError::MemoryBusy,
            MemoryError::AddressOutOfRange { addr } => BusError::AddressOutOfRange { addr },
        }
    }
}

/// Configuration could not be read, parsed or validated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
