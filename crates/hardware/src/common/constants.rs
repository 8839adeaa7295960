//! Architectural constants shared by the ISA, pipeline and memory system.

/// Number of general-purpose registers per core.
pub const NUM_REGS: usize = 16;

/// Hardwired zero register.
pub const REG_ZERO: usize = 0;

/// Reserved link/return register; programs may never name it as a destination.
pub const REG_RESERVED: usize = 1;

/// Register that receives the return address of `jal`.
pub const REG_LINK: usize = 15;

/// Maximum number of instructions in one program.
pub const MAX_PROGRAM_LEN: usize = 1024;

/// Smallest immediate an instruction can encode.
pub const IMM_MIN: i32 = -2048;

/// Largest immediate an instruction can encode.
pub const IMM_MAX: i32 = 2047;

/// Default memory size in words (2^20).
pub const DEFAULT_MEM_WORDS: usize = 1 << 20;

/// Default memory latency in cycles.
pub const DEFAULT_MEM_LATENCY: u64 = 64;

/// Default number of lines per direct-mapped cache.
pub const DEFAULT_CACHE_LINES: usize = 256;

/// Hazard countdown when the producer sits in Execute.
pub const HAZARD_EX: u32 = 3;

/// Hazard countdown when the producer sits in Memory.
pub const HAZARD_MEM: u32 = 2;

/// Hazard countdown when the producer sits in Write-back.
pub const HAZARD_WB: u32 = 1;

/// Number of pipeline stages.
pub const NUM_STAGES: usize = 5;
