//! Per-core counters and the end-of-run machine report.

use serde::Serialize;

use crate::common::constants::{NUM_REGS, NUM_STAGES};
use crate::core::cache::CacheStats;
use crate::core::pipeline::Stage;
use crate::system::BusStats;
use crate::system::memory::MemoryStats;

/// Counters kept by one pipeline. `cycles` includes the cycle `halt` retires in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub cycles: u64,
    /// Cycles each stage spent on a real instruction, indexed by [`Stage`].
    pub stage_busy: [u64; NUM_STAGES],
    pub hazard_stalls: u64,
    pub frozen_cycles: u64,
    pub flushes: u64,
    pub retired: u64,
}

impl PipelineStats {
    /// Busy share of `stage` in percent; 0 before the first cycle.
    pub fn utilization(&self, stage: Stage) -> f64 {
        if self.cycles == 0 {
            return 0.0;
        }
        self.stage_busy[stage as usize] as f64 / self.cycles as f64 * 100.0
    }

    pub fn print(&self) {
        println!("Execution Time (Cycles): {}", self.cycles);
        for stage in Stage::ALL {
            println!("{} Utilization: {:.2}%", stage.name(), self.utilization(stage));
        }
        println!(
            "Retired: {}  Hazard stalls: {}  Frozen: {}  Flushes: {}",
            self.retired, self.hazard_stalls, self.frozen_cycles, self.flushes
        );
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct StageUtilization {
    pub fetch: f64,
    pub decode: f64,
    pub execute: f64,
    pub memory: f64,
    pub write_back: f64,
}

impl From<&PipelineStats> for StageUtilization {
    fn from(stats: &PipelineStats) -> Self {
        Self {
            fetch: stats.utilization(Stage::Fetch),
            decode: stats.utilization(Stage::Decode),
            execute: stats.utilization(Stage::Execute),
            memory: stats.utilization(Stage::Memory),
            write_back: stats.utilization(Stage::WriteBack),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoreReport {
    pub core: usize,
    pub halted: bool,
    pub utilization: StageUtilization,
    pub pipeline: PipelineStats,
    pub cache: CacheStats,
    pub registers: [i32; NUM_REGS],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MachineReport {
    /// Global clock at the end of the run.
    pub cycles: u64,
    pub cores: Vec<CoreReport>,
    pub bus: BusStats,
    pub memory: MemoryStats,
}

impl MachineReport {
    pub fn print(&self) {
        println!("\n==========================================================");
        println!("MACHINE: {} core(s), {} cycles", self.cores.len(), self.cycles);
        for core in &self.cores {
            println!("----------------------------------------------------------");
            println!("Core {}{}", core.core, if core.halted { "" } else { " (not halted)" });
            core.pipeline.print();
            println!(
                "Cache: {} hits, {} misses, {} memory reads, {} memory writes",
                core.cache.hits, core.cache.misses, core.cache.mem_reads, core.cache.mem_writes
            );
            let regs: Vec<String> = core
                .registers
                .iter()
                .enumerate()
                .map(|(i, v)| format!("${i}={v}"))
                .collect();
            println!("Registers: {}", regs.join(" "));
        }
        println!("----------------------------------------------------------");
        let b = &self.bus;
        println!(
            "Bus: {} BusRd, {} BusRdX ({} upgrades), {} cache-to-cache, {} invalidations",
            b.bus_rd, b.bus_rdx, b.upgrades, b.cache_to_cache, b.invalidations
        );
        println!(
            "     {} flushes, {} write-backs, {} memory reads, {} memory writes, {} busy cycles",
            b.flushes, b.writebacks, b.mem_reads, b.mem_writes, b.busy_cycles
        );
        println!(
            "Memory: {} reads, {} writes, {} busy cycles",
            self.memory.reads, self.memory.writes, self.memory.busy_cycles
        );
        println!("==========================================================");
    }
}
