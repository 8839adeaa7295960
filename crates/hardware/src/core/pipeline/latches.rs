use crate::isa::Instruction;

/// Fetch -> Decode.
#[derive(Clone, Copy, Debug, Default)]
pub struct IfId {
    pub pc: usize,
    pub inst: Instruction,
}

/// Decode -> Execute. Operand values are read here, never stored in the instruction.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdEx {
    pub pc: usize,
    pub inst: Instruction,
    pub rs_val: i32,
    pub second_val: i32,
    /// Store data (`sw`/`sc` read their `rd`).
    pub rd_val: i32,
}

/// Execute -> Memory.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExMem {
    pub pc: usize,
    pub inst: Instruction,
    /// ALU result, `sc` success flag, or `jal` return address.
    pub result: i32,
    /// Effective address; `None` for a failed `sc`, which performs no store.
    pub addr: Option<u32>,
    pub store_data: i32,
}

/// Memory -> Write-back.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemWb {
    pub pc: usize,
    pub inst: Instruction,
    /// Value bound for the destination register, if the instruction has one.
    pub value: i32,
}

impl IfId {
    pub fn bubble() -> Self {
        Self::default()
    }
}

impl IdEx {
    pub fn bubble() -> Self {
        Self::default()
    }
}

impl ExMem {
    pub fn bubble() -> Self {
        Self::default()
    }
}

impl MemWb {
    pub fn bubble() -> Self {
        Self::default()
    }
}
