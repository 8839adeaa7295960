//! Decoded instruction records.

use std::fmt;

use serde::Serialize;

use crate::common::constants::REG_LINK;

/// Register-register / register-immediate ALU operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AluOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Mul,
    Sll,
    Srl,
    Sra,
}

impl AluOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "add",
            AluOp::Sub => "sub",
            AluOp::And => "and",
            AluOp::Or => "or",
            AluOp::Xor => "xor",
            AluOp::Mul => "mul",
            AluOp::Sll => "sll",
            AluOp::Srl => "srl",
            AluOp::Sra => "sra",
        }
    }
}

/// Signed comparison used by conditional branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BranchCond {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BranchCond {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BranchCond::Eq => "beq",
            BranchCond::Ne => "bne",
            BranchCond::Lt => "blt",
            BranchCond::Gt => "bgt",
            BranchCond::Le => "ble",
            BranchCond::Ge => "bge",
        }
    }

    /// Evaluates the condition on two signed operands.
    pub fn taken(self, a: i32, b: i32) -> bool {
        match self {
            BranchCond::Eq => a == b,
            BranchCond::Ne => a != b,
            BranchCond::Lt => a < b,
            BranchCond::Gt => a > b,
            BranchCond::Le => a <= b,
            BranchCond::Ge => a >= b,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Opcode {
    Alu(AluOp),
    Branch(BranchCond),
    JumpAndLink,
    /// `lw`, or `ll` when `linked`.
    Load { linked: bool },
    /// `sw`, or `sc` when `conditional`.
    Store { conditional: bool },
    Halt,
    /// Empty pipeline slot.
    #[default]
    Bubble,
}

/// Second ALU / address operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Operand {
    Reg(usize),
    Imm(i32),
}

/// One decoded instruction.
///
/// Field use per opcode:
///
/// | opcode | `rd` | `rs` | `second` |
/// | --- | --- | --- | --- |
/// | ALU | destination | first operand | register or immediate |
/// | branch | unused | left operand | register (right operand) |
/// | `jal` | unused | unused | unused |
/// | load | destination | base | register or immediate offset |
/// | store | data source (`sc`: also result) | base | register or immediate offset |
///
/// `target` holds the absolute instruction index for branches and `jal`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Instruction {
    pub op: Opcode,
    pub rd: Option<usize>,
    pub rs: Option<usize>,
    pub second: Option<Operand>,
    pub target: Option<i32>,
}

impl Instruction {
    pub fn bubble() -> Self {
        Self::default()
    }

    pub fn halt() -> Self {
        Self {
            op: Opcode::Halt,
            ..Self::default()
        }
    }

    pub fn alu(op: AluOp, rd: usize, rs: usize, second: Operand) -> Self {
        Self {
            op: Opcode::Alu(op),
            rd: Some(rd),
            rs: Some(rs),
            second: Some(second),
            target: None,
        }
    }

    pub fn branch(cond: BranchCond, rs: usize, rt: usize, target: i32) -> Self {
        Self {
            op: Opcode::Branch(cond),
            rd: None,
            rs: Some(rs),
            second: Some(Operand::Reg(rt)),
            target: Some(target),
        }
    }

    pub fn jal(target: i32) -> Self {
        Self {
            op: Opcode::JumpAndLink,
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn load(linked: bool, rd: usize, base: usize, offset: Operand) -> Self {
        Self {
            op: Opcode::Load { linked },
            rd: Some(rd),
            rs: Some(base),
            second: Some(offset),
            target: None,
        }
    }

    pub fn store(conditional: bool, rd: usize, base: usize, offset: Operand) -> Self {
        Self {
            op: Opcode::Store { conditional },
            rd: Some(rd),
            rs: Some(base),
            second: Some(offset),
            target: None,
        }
    }

    pub fn is_bubble(&self) -> bool {
        self.op == Opcode::Bubble
    }

    pub fn is_halt(&self) -> bool {
        self.op == Opcode::Halt
    }

    /// Register this instruction writes at write-back, if any.
    ///
    /// Plain stores and branches write nothing; `sc` writes its success flag
    /// into `rd`; `jal` always writes the link register.
    pub fn dest(&self) -> Option<usize> {
        match self.op {
            Opcode::Alu(_) | Opcode::Load { .. } => self.rd,
            Opcode::Store { conditional: true } => self.rd,
            Opcode::JumpAndLink => Some(REG_LINK),
            Opcode::Store { conditional: false }
            | Opcode::Branch(_)
            | Opcode::Halt
            | Opcode::Bubble => None,
        }
    }

    /// Registers read in decode, in operand order.
    pub fn sources(&self) -> [Option<usize>; 3] {
        let second = match self.second {
            Some(Operand::Reg(r)) => Some(r),
            _ => None,
        };
        match self.op {
            Opcode::Alu(_) | Opcode::Branch(_) | Opcode::Load { .. } => [self.rs, second, None],
            Opcode::Store { .. } => [self.rs, second, self.rd],
            Opcode::JumpAndLink | Opcode::Halt | Opcode::Bubble => [None; 3],
        }
    }

    /// Whether decode must reject `rd == $1` for this instruction.
    pub fn writes_rd(&self) -> bool {
        matches!(
            self.op,
            Opcode::Alu(_) | Opcode::Load { .. } | Opcode::Store { conditional: true }
        )
    }

    pub fn mnemonic(&self) -> &'static str {
        match self.op {
            Opcode::Alu(op) => op.mnemonic(),
            Opcode::Branch(cond) => cond.mnemonic(),
            Opcode::JumpAndLink => "jal",
            Opcode::Load { linked: false } => "lw",
            Opcode::Load { linked: true } => "ll",
            Opcode::Store { conditional: false } => "sw",
            Opcode::Store { conditional: true } => "sc",
            Opcode::Halt => "halt",
            Opcode::Bubble => "-",
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(r) => write!(f, "${r}"),
            Operand::Imm(v) => write!(f, "{v}"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.mnemonic();
        let rd = self.rd.unwrap_or(0);
        let rs = self.rs.unwrap_or(0);
        let second = self.second.unwrap_or(Operand::Imm(0));
        let target = self.target.unwrap_or(0);
        match self.op {
            Opcode::Alu(_) | Opcode::Load { .. } | Opcode::Store { .. } => {
                write!(f, "{m} ${rd}, ${rs}, {second}")
            }
            Opcode::Branch(_) => write!(f, "{m} ${rs}, {second}, {target}"),
            Opcode::JumpAndLink => write!(f, "{m} {target}"),
            Opcode::Halt | Opcode::Bubble => f.write_str(m),
        }
    }
}
