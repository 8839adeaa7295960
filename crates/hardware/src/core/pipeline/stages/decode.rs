//! Instruction Decode (ID) Stage.
//!
//! Runs the hazard check, validates register use, reads operands and
//! resolves control flow. Taken branches and `jal` redirect the PC here and
//! raise the flush signal that costs Fetch exactly one bubble.

use std::mem;

use crate::common::SimError;
use crate::common::constants::{NUM_REGS, REG_RESERVED};
use crate::core::pipeline::{IdEx, IfId, Pipeline, Stage, hazard};
use crate::isa::{Instruction, Opcode, Operand};

pub fn decode_stage(pipe: &mut Pipeline) -> Result<(), SimError> {
    if pipe.is_stalled(Stage::Decode) || !pipe.id_ex.inst.is_bubble() {
        return Ok(());
    }

    if pipe.hazard_countdown > 0 {
        pipe.hazard_countdown -= 1;
        pipe.stats.hazard_stalls += 1;
        return Ok(());
    }
    if pipe.if_id.inst.is_bubble() {
        return Ok(());
    }

    let stall = hazard::stall_cycles(
        &pipe.if_id.inst,
        &pipe.ex_mem.inst,
        &pipe.mem_wb.inst,
        &pipe.wb_latch.inst,
    );
    if stall > 0 {
        // This cycle's bubble counts as the first stall cycle.
        pipe.hazard_countdown = stall - 1;
        pipe.stats.hazard_stalls += 1;
        return Ok(());
    }

    let IfId { pc, inst } = mem::take(&mut pipe.if_id);
    validate(pipe, pc, &inst)?;

    let read = |r: Option<usize>| r.map_or(0, |r| pipe.regs.read(r));
    let rs_val = read(inst.rs);
    let second_val = match inst.second {
        Some(Operand::Reg(r)) => pipe.regs.read(r),
        Some(Operand::Imm(v)) => v,
        None => 0,
    };
    let rd_val = match inst.op {
        Opcode::Store { .. } => read(inst.rd),
        _ => 0,
    };

    let redirect = match inst.op {
        Opcode::Branch(cond) => cond.taken(rs_val, second_val).then_some(inst.target),
        Opcode::JumpAndLink => Some(inst.target),
        _ => None,
    };
    if let Some(target) = redirect {
        let target = target.unwrap_or(-1);
        if target < 0 || target as usize >= pipe.program.len() {
            return Err(SimError::PcOutOfRange {
                core: pipe.core_id,
                pc: i64::from(target),
                len: pipe.program.len(),
            });
        }
        pipe.pc = target as usize;
        pipe.branch_flush = true;
        pipe.stats.flushes += 1;
    }

    pipe.id_ex = IdEx {
        pc,
        inst,
        rs_val,
        second_val,
        rd_val,
    };
    pipe.busy(Stage::Decode);
    Ok(())
}

fn validate(pipe: &Pipeline, pc: usize, inst: &Instruction) -> Result<(), SimError> {
    let second = match inst.second {
        Some(Operand::Reg(r)) => Some(r),
        _ => None,
    };
    for reg in [inst.rd, inst.rs, second].into_iter().flatten() {
        if reg >= NUM_REGS {
            return Err(SimError::InvalidRegister {
                core: pipe.core_id,
                pc,
                reg,
            });
        }
    }
    if inst.writes_rd() && inst.rd == Some(REG_RESERVED) {
        return Err(SimError::ReservedDestination {
            core: pipe.core_id,
            pc,
        });
    }
    Ok(())
}
