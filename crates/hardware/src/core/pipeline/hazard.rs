//! Data-hazard detection for Decode.
//!
//! There is no forwarding. A source register produced by an older
//! instruction must wait until that instruction's deferred write-back has
//! been applied, which happens at the start of the cycle after Write-back
//! processes it.

use crate::common::constants::{HAZARD_EX, HAZARD_MEM, HAZARD_WB, REG_RESERVED, REG_ZERO};
use crate::isa::Instruction;

/// Stall cycles `inst` needs before it may read its operands.
///
/// `ex`, `mem` and `wb` are the instructions Execute, Memory and Write-back
/// processed this cycle (bubbles where the stage did nothing). For each
/// source the nearest producer decides; the largest count over all sources
/// is returned, 0 meaning no hazard.
pub fn stall_cycles(inst: &Instruction, ex: &Instruction, mem: &Instruction, wb: &Instruction) -> u32 {
    inst.sources()
        .into_iter()
        .flatten()
        .filter(|&r| r != REG_ZERO && r != REG_RESERVED)
        .map(|src| {
            if ex.dest() == Some(src) {
                HAZARD_EX
            } else if mem.dest() == Some(src) {
                HAZARD_MEM
            } else if wb.dest() == Some(src) {
                HAZARD_WB
            } else {
                0
            }
        })
        .max()
        .unwrap_or(0)
}
