//! Five-stage in-order pipeline engine.
//!
//! Stages run in reverse order each cycle (Write-back, Memory, Execute,
//! Decode, Fetch) so every stage sees its input latch as the previous cycle
//! left it. A stage takes its input, leaving a bubble behind, and never
//! overwrites an output latch that still holds an instruction: a stage whose
//! successor has not drained simply holds.
//!
//! A cache miss in Memory freezes the pipeline. Memory and Write-back stop
//! at once; earlier stages finish the current cycle and stop from the next
//! one. The machine unfreezes the core when the bus resolves the miss.

pub mod hazard;
pub mod latches;
pub mod stages;

use log::trace;

pub use self::latches::{ExMem, IdEx, IfId, MemWb};

use crate::common::SimError;
use crate::common::constants::NUM_STAGES;
use crate::core::register_file::RegisterFile;
use crate::isa::Instruction;
use crate::stats::PipelineStats;
use crate::system::System;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Fetch = 0,
    Decode = 1,
    Execute = 2,
    Memory = 3,
    WriteBack = 4,
}

impl Stage {
    pub const ALL: [Stage; NUM_STAGES] = [
        Stage::Fetch,
        Stage::Decode,
        Stage::Execute,
        Stage::Memory,
        Stage::WriteBack,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Fetch => "IF",
            Stage::Decode => "ID",
            Stage::Execute => "EX",
            Stage::Memory => "MEM",
            Stage::WriteBack => "WB",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageStatus {
    pub stalled: bool,
    pub stall_next_cycle: bool,
}

pub struct Pipeline {
    pub core_id: usize,
    pub program: Vec<Instruction>,
    pub pc: usize,
    pub regs: RegisterFile,

    pub if_id: IfId,
    pub id_ex: IdEx,
    pub ex_mem: ExMem,
    pub mem_wb: MemWb,
    /// What Write-back processed this cycle; the hazard check's view of it.
    pub wb_latch: MemWb,

    pub status: [StageStatus; NUM_STAGES],
    /// Register write recorded by Write-back, applied at the start of the next cycle.
    pub pending_write: Option<(usize, i32)>,
    pub hazard_countdown: u32,
    pub branch_flush: bool,
    /// Set once `halt` reaches Write-back; the pipeline never advances again.
    pub drained: bool,

    pub trace: bool,
    pub stats: PipelineStats,
}

impl Pipeline {
    pub fn new(core_id: usize, program: Vec<Instruction>) -> Self {
        Self {
            core_id,
            program,
            pc: 0,
            regs: RegisterFile::new(),
            if_id: IfId::bubble(),
            id_ex: IdEx::bubble(),
            ex_mem: ExMem::bubble(),
            mem_wb: MemWb::bubble(),
            wb_latch: MemWb::bubble(),
            status: [StageStatus::default(); NUM_STAGES],
            pending_write: None,
            hazard_countdown: 0,
            branch_flush: false,
            drained: false,
            trace: false,
            stats: PipelineStats::default(),
        }
    }

    /// Runs one clock cycle.
    ///
    /// # Arguments
    ///
    /// * `system` - Shared state; only this core's cache and the bus are touched.
    ///
    /// # Returns
    ///
    /// A fatal runtime error raised by any stage. A drained pipeline does nothing.
    pub fn cycle(&mut self, system: &mut System) -> Result<(), SimError> {
        if self.drained {
            return Ok(());
        }
        self.stats.cycles += 1;
        if self.is_frozen() {
            self.stats.frozen_cycles += 1;
        }
        if self.trace {
            self.trace_diagram();
        }

        stages::write_back::wb_stage(self);
        self.end_stage(Stage::WriteBack);
        if self.drained {
            return Ok(());
        }

        stages::memory_access::mem_stage(self, system)?;
        self.end_stage(Stage::Memory);
        stages::execute::execute_stage(self, system)?;
        self.end_stage(Stage::Execute);
        stages::decode::decode_stage(self)?;
        self.end_stage(Stage::Decode);
        stages::fetch::fetch_stage(self)?;
        self.end_stage(Stage::Fetch);
        Ok(())
    }

    pub fn is_stalled(&self, stage: Stage) -> bool {
        self.status[stage as usize].stalled
    }

    pub fn is_frozen(&self) -> bool {
        self.is_stalled(Stage::Memory)
    }

    /// Stops `stage` and everything after it now, and earlier stages from the next cycle.
    pub fn freeze(&mut self, stage: Stage) {
        for s in Stage::ALL {
            let status = &mut self.status[s as usize];
            if s < stage {
                status.stall_next_cycle = true;
            } else {
                status.stalled = true;
            }
        }
    }

    pub fn unfreeze(&mut self) {
        self.status = [StageStatus::default(); NUM_STAGES];
    }

    fn end_stage(&mut self, stage: Stage) {
        let status = &mut self.status[stage as usize];
        if status.stall_next_cycle {
            status.stalled = true;
            status.stall_next_cycle = false;
        }
    }

    pub(crate) fn busy(&mut self, stage: Stage) {
        self.stats.stage_busy[stage as usize] += 1;
    }

    fn trace_diagram(&self) {
        trace!(
            target: "pipeline",
            "core {} cycle {:>6} pc={:<4} | IF/ID {:<18} | ID/EX {:<18} | EX/MEM {:<18} | MEM/WB {:<18}{}{}",
            self.core_id,
            self.stats.cycles,
            self.pc,
            self.if_id.inst.to_string(),
            self.id_ex.inst.to_string(),
            self.ex_mem.inst.to_string(),
            self.mem_wb.inst.to_string(),
            if self.is_frozen() { " [frozen]" } else { "" },
            if self.hazard_countdown > 0 { " [hazard]" } else { "" },
        );
    }
}
