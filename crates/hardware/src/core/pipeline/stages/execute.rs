//! Execute (EX) Stage.

use std::mem;

use crate::common::SimError;
use crate::core::pipeline::{ExMem, IdEx, Pipeline, Stage};
use crate::isa::{AluOp, Opcode};
use crate::system::System;

/// Runs the ALU, forms effective addresses, and settles `ll`/`sc` with the bus.
pub fn execute_stage(pipe: &mut Pipeline, system: &mut System) -> Result<(), SimError> {
    if pipe.is_stalled(Stage::Execute) || !pipe.ex_mem.inst.is_bubble() {
        return Ok(());
    }
    let IdEx {
        pc,
        inst,
        rs_val,
        second_val,
        rd_val,
    } = mem::take(&mut pipe.id_ex);
    if inst.is_bubble() {
        return Ok(());
    }

    let core = pipe.core_id;
    let mut out = ExMem {
        pc,
        inst,
        ..ExMem::default()
    };

    match inst.op {
        Opcode::Alu(op) => {
            out.result = alu(op, rs_val, second_val).ok_or(SimError::NegativeShift {
                core,
                pc,
                amount: second_val,
            })?;
        }
        Opcode::Load { linked } => {
            let addr = effective_address(core, rs_val, second_val, system)?;
            if linked {
                system.bus.set_watch(core, addr);
            }
            out.addr = Some(addr);
        }
        Opcode::Store { conditional } => {
            let addr = effective_address(core, rs_val, second_val, system)?;
            out.store_data = rd_val;
            if !conditional {
                out.addr = Some(addr);
            } else if system.bus.check_and_consume(core, addr) {
                out.addr = Some(addr);
                out.result = 1;
            }
        }
        Opcode::JumpAndLink => out.result = pc as i32 + 1,
        Opcode::Branch(_) | Opcode::Halt | Opcode::Bubble => {}
    }

    pipe.ex_mem = out;
    pipe.busy(Stage::Execute);
    Ok(())
}

/// Computes one ALU operation. `None` means a negative shift amount.
///
/// Arithmetic wraps. Shifts of 32 or more move every bit out: logical shifts
/// give 0 and `sra` gives the sign fill.
pub fn alu(op: AluOp, a: i32, b: i32) -> Option<i32> {
    let value = match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Mul => a.wrapping_mul(b),
        AluOp::Sll | AluOp::Srl | AluOp::Sra if b < 0 => return None,
        AluOp::Sll => {
            if b >= 32 { 0 } else { ((a as u32) << b) as i32 }
        }
        AluOp::Srl => {
            if b >= 32 { 0 } else { ((a as u32) >> b) as i32 }
        }
        AluOp::Sra => a >> b.min(31),
    };
    Some(value)
}

fn effective_address(core: usize, base: i32, offset: i32, system: &System) -> Result<u32, SimError> {
    let addr = i64::from(base) + i64::from(offset);
    if addr < 0 || addr >= system.memory.size() as i64 {
        return Err(SimError::AddressOutOfRange { core, addr });
    }
    Ok(addr as u32)
}
