//! Assembly text parser.
//!
//! Accepted forms (operands separated by commas and/or whitespace, `;` starts
//! a comment):
//!
//! ```text
//! add  $rd, $rs, $rt        add  $rd, $rs, imm
//! beq  $rs, $rt, target     jal  target        jal $rd, target
//! lw   $rd, $rs, $rt|imm    lw   $rd, imm($rs)  lw  $rd, $rt($rs)
//! sw   $rd, ...             (same addressing; rd is the data register)
//! halt
//! ```
//!
//! Registers are written `$N`, `$rN` or `$RN`. Immediates are decimal or
//! `0x` hexadecimal, signed, within `-2048..=2047`. Branch and `jal` targets
//! are absolute instruction indices.

use crate::common::LoadError;
use crate::common::constants::{IMM_MAX, IMM_MIN, MAX_PROGRAM_LEN, NUM_REGS, REG_RESERVED};
use crate::isa::instruction::{AluOp, BranchCond, Instruction, Operand};

/// Parses a whole program and validates its control-flow targets.
///
/// Blank and comment-only lines are skipped; instruction indices count only
/// the lines that produced an instruction.
pub fn parse_program(text: &str) -> Result<Vec<Instruction>, LoadError> {
    let mut program = Vec::new();
    let mut lines = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        if let Some(inst) = parse_line(raw, i + 1)? {
            program.push(inst);
            lines.push(i + 1);
        }
    }

    if program.len() > MAX_PROGRAM_LEN {
        return Err(LoadError::ProgramTooLong {
            len: program.len(),
            max: MAX_PROGRAM_LEN,
        });
    }

    for (inst, &line) in program.iter().zip(&lines) {
        if let Some(target) = inst.target {
            if target < 0 || target as usize >= program.len() {
                return Err(LoadError::TargetOutOfRange {
                    line,
                    target,
                    len: program.len(),
                });
            }
        }
    }

    Ok(program)
}

/// Parses one source line. Returns `Ok(None)` for blank or comment lines.
pub fn parse_line(raw: &str, line: usize) -> Result<Option<Instruction>, LoadError> {
    let code = match raw.find(';') {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    let mut tokens = code
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty());

    let Some(opcode) = tokens.next() else {
        return Ok(None);
    };
    let mnemonic = opcode.to_ascii_lowercase();
    let operands: Vec<&str> = tokens.collect();
    let p = LineParser {
        line,
        opcode: &mnemonic,
        operands: &operands,
    };

    let inst = match mnemonic.as_str() {
        "add" => p.alu(AluOp::Add)?,
        "sub" => p.alu(AluOp::Sub)?,
        "and" => p.alu(AluOp::And)?,
        "or" => p.alu(AluOp::Or)?,
        "xor" => p.alu(AluOp::Xor)?,
        "mul" => p.alu(AluOp::Mul)?,
        "sll" => p.alu(AluOp::Sll)?,
        "srl" => p.alu(AluOp::Srl)?,
        "sra" => p.alu(AluOp::Sra)?,
        "beq" => p.branch(BranchCond::Eq)?,
        "bne" => p.branch(BranchCond::Ne)?,
        "blt" => p.branch(BranchCond::Lt)?,
        "bgt" => p.branch(BranchCond::Gt)?,
        "ble" => p.branch(BranchCond::Le)?,
        "bge" => p.branch(BranchCond::Ge)?,
        "jal" => p.jal()?,
        "lw" => p.memory(|rd, rs, off| Instruction::load(false, rd, rs, off), true)?,
        "ll" => p.memory(|rd, rs, off| Instruction::load(true, rd, rs, off), true)?,
        "sw" => p.memory(|rd, rs, off| Instruction::store(false, rd, rs, off), false)?,
        "sc" => p.memory(|rd, rs, off| Instruction::store(true, rd, rs, off), true)?,
        "halt" => {
            p.expect(&[0], "0")?;
            Instruction::halt()
        }
        _ => {
            return Err(LoadError::UnknownOpcode {
                line,
                opcode: opcode.to_string(),
            });
        }
    };
    Ok(Some(inst))
}

struct LineParser<'a> {
    line: usize,
    opcode: &'a str,
    operands: &'a [&'a str],
}

impl LineParser<'_> {
    fn expect(&self, counts: &[usize], expected: &'static str) -> Result<(), LoadError> {
        if counts.contains(&self.operands.len()) {
            Ok(())
        } else {
            Err(LoadError::OperandCount {
                line: self.line,
                opcode: self.opcode.to_string(),
                expected,
                found: self.operands.len(),
            })
        }
    }

    fn alu(&self, op: AluOp) -> Result<Instruction, LoadError> {
        self.expect(&[3], "3")?;
        let rd = self.dest(self.operands[0])?;
        let rs = register(self.operands[1], self.line)?;
        let second = operand(self.operands[2], self.line)?;
        Ok(Instruction::alu(op, rd, rs, second))
    }

    fn branch(&self, cond: BranchCond) -> Result<Instruction, LoadError> {
        self.expect(&[3], "3")?;
        let rs = register(self.operands[0], self.line)?;
        let rt = register(self.operands[1], self.line)?;
        let target = immediate(self.operands[2], self.line)?;
        Ok(Instruction::branch(cond, rs, rt, target))
    }

    fn jal(&self) -> Result<Instruction, LoadError> {
        self.expect(&[1, 2], "1 or 2")?;
        // An explicit destination is accepted for compatibility; the return
        // address always lands in the link register.
        if self.operands.len() == 2 {
            register(self.operands[0], self.line)?;
        }
        let target = immediate(self.operands[self.operands.len() - 1], self.line)?;
        Ok(Instruction::jal(target))
    }

    fn memory(
        &self,
        build: impl Fn(usize, usize, Operand) -> Instruction,
        rd_is_dest: bool,
    ) -> Result<Instruction, LoadError> {
        self.expect(&[2, 3], "2 or 3")?;
        let rd = if rd_is_dest {
            self.dest(self.operands[0])?
        } else {
            register(self.operands[0], self.line)?
        };

        let (base, offset) = if self.operands.len() == 3 {
            (
                register(self.operands[1], self.line)?,
                operand(self.operands[2], self.line)?,
            )
        } else {
            self.displacement(self.operands[1])?
        };
        Ok(build(rd, base, offset))
    }

    /// Splits `off($rs)` into base register and offset; `($rs)` means offset 0.
    fn displacement(&self, token: &str) -> Result<(usize, Operand), LoadError> {
        let malformed = || LoadError::MalformedImmediate {
            line: self.line,
            token: token.to_string(),
        };
        let open = token.find('(').ok_or_else(malformed)?;
        let inner = token[open + 1..].strip_suffix(')').ok_or_else(malformed)?;
        let base = register(inner, self.line)?;
        let off = &token[..open];
        let offset = if off.is_empty() {
            Operand::Imm(0)
        } else {
            operand(off, self.line)?
        };
        Ok((base, offset))
    }

    fn dest(&self, token: &str) -> Result<usize, LoadError> {
        let rd = register(token, self.line)?;
        if rd == REG_RESERVED {
            return Err(LoadError::ReservedDestination { line: self.line });
        }
        Ok(rd)
    }
}

fn register(token: &str, line: usize) -> Result<usize, LoadError> {
    let bad = || LoadError::BadRegister {
        line,
        token: token.to_string(),
    };
    let body = token.strip_prefix('$').ok_or_else(bad)?;
    let digits = body
        .strip_prefix('r')
        .or_else(|| body.strip_prefix('R'))
        .unwrap_or(body);
    let reg: u32 = digits.parse().map_err(|_| bad())?;
    if reg as usize >= NUM_REGS {
        return Err(LoadError::RegisterOutOfRange { line, reg });
    }
    Ok(reg as usize)
}

fn operand(token: &str, line: usize) -> Result<Operand, LoadError> {
    if token.starts_with('$') {
        register(token, line).map(Operand::Reg)
    } else {
        immediate(token, line).map(Operand::Imm)
    }
}

fn immediate(token: &str, line: usize) -> Result<i32, LoadError> {
    let malformed = || LoadError::MalformedImmediate {
        line,
        token: token.to_string(),
    };
    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let magnitude = match body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).map_err(|_| malformed())?,
        None if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) => {
            body.parse::<i64>().map_err(|_| malformed())?
        }
        None => return Err(malformed()),
    };
    let value = if negative { -magnitude } else { magnitude };
    if value < i64::from(IMM_MIN) || value > i64::from(IMM_MAX) {
        return Err(LoadError::ImmediateOutOfRange { line, value });
    }
    Ok(value as i32)
}
