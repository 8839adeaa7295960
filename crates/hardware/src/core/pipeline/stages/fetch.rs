//! Instruction Fetch (IF) Stage.

use crate::common::SimError;
use crate::core::pipeline::{IfId, Pipeline, Stage};

/// Fetches `program[pc]` into the IF/ID latch.
///
/// Holds while stalled, while Decode is counting down a hazard, or while
/// IF/ID is still occupied. A pending branch flush is consumed by inserting
/// one bubble. `halt` is a fixed point: the PC does not move past it.
pub fn fetch_stage(pipe: &mut Pipeline) -> Result<(), SimError> {
    if pipe.is_stalled(Stage::Fetch) || pipe.hazard_countdown > 0 {
        return Ok(());
    }
    if !pipe.if_id.inst.is_bubble() {
        return Ok(());
    }
    if pipe.branch_flush {
        pipe.branch_flush = false;
        pipe.if_id = IfId::bubble();
        return Ok(());
    }

    let Some(&inst) = pipe.program.get(pipe.pc) else {
        return Err(SimError::PcOutOfRange {
            core: pipe.core_id,
            pc: pipe.pc as i64,
            len: pipe.program.len(),
        });
    };
    pipe.if_id = IfId { pc: pipe.pc, inst };
    if !inst.is_halt() {
        pipe.pc += 1;
    }
    pipe.busy(Stage::Fetch);
    Ok(())
}
