//! Write-back (WB) Stage.

use std::mem;

use crate::common::constants::REG_RESERVED;
use crate::core::pipeline::{MemWb, Pipeline, Stage};

/// Applies last cycle's deferred register write, then retires the
/// instruction in MEM/WB and records its own write for the next cycle.
/// Retiring `halt` drains the pipeline.
pub fn wb_stage(pipe: &mut Pipeline) {
    if let Some((reg, value)) = pipe.pending_write.take() {
        pipe.regs.write(reg, value);
    }
    pipe.wb_latch = MemWb::bubble();
    if pipe.is_stalled(Stage::WriteBack) {
        return;
    }

    let entry = mem::take(&mut pipe.mem_wb);
    if entry.inst.is_bubble() {
        return;
    }
    pipe.busy(Stage::WriteBack);
    pipe.stats.retired += 1;

    if let Some(rd) = entry.inst.dest().filter(|&r| r != REG_RESERVED) {
        pipe.pending_write = Some((rd, entry.value));
    }
    if entry.inst.is_halt() {
        pipe.drained = true;
    }
    pipe.wb_latch = entry;
}
