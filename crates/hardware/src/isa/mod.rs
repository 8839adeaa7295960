//! Instruction set.
//!
//! Programs are plain text, one instruction per line. [`parser`] turns that
//! text into [`Instruction`] records the pipeline consumes unchanged.

pub mod instruction;
pub mod parser;

pub use self::instruction::{AluOp, BranchCond, Instruction, Opcode, Operand};
pub use self::parser::{parse_line, parse_program};
