//! Lock-step multi-core machine.
//!
//! One global tick runs, in order: every non-drained pipeline (by core id),
//! the memory countdown, the coherence bus, and finally the unfreeze of the
//! core whose miss the bus resolved. Nothing is concurrent, so a run is
//! fully deterministic.

use log::info;

use crate::common::SimError;
use crate::config::Config;
use crate::core::Pipeline;
use crate::core::cache::MsiState;
use crate::isa::Instruction;
use crate::stats::{CoreReport, MachineReport, StageUtilization};
use crate::system::{BusTraceEntry, System};

pub struct Machine {
    pub config: Config,
    pub cores: Vec<Pipeline>,
    pub system: System,
    pub cycle: u64,
}

impl Machine {
    /// Builds a machine with one core per program.
    pub fn new(config: Config, programs: Vec<Vec<Instruction>>) -> Result<Self, SimError> {
        config
            .validate()
            .map_err(|e| SimError::Config(e.to_string()))?;
        if programs.is_empty() {
            return Err(SimError::CoreCount {
                cores: 0,
                programs: 0,
            });
        }

        let system = System::new(&config, programs.len());
        let cores = programs
            .into_iter()
            .enumerate()
            .map(|(id, program)| {
                let mut core = Pipeline::new(id, program);
                core.trace = config.general.trace_pipeline;
                core
            })
            .collect();
        Ok(Self {
            config,
            cores,
            system,
            cycle: 0,
        })
    }

    pub fn num_cores(&self) -> usize {
        self.cores.len()
    }

    /// Every core has retired `halt`.
    pub fn is_done(&self) -> bool {
        self.cores.iter().all(|c| c.drained)
    }

    /// Advances the whole machine by one clock cycle.
    pub fn tick(&mut self) -> Result<(), SimError> {
        if self.is_done() {
            return Ok(());
        }
        self.cycle += 1;
        for core in &mut self.cores {
            core.cycle(&mut self.system)?;
        }
        if let Some(core) = self.system.tick(self.cycle)? {
            self.cores[core].unfreeze();
        }
        Ok(())
    }

    /// One tick under the `general.max_cycles` limit. `Ok(true)` once every
    /// core has halted.
    pub fn step(&mut self) -> Result<bool, SimError> {
        if let Some(limit) = self.config.general.max_cycles {
            if !self.is_done() && self.cycle >= limit {
                return Err(SimError::CycleLimit { limit });
            }
        }
        self.tick()?;
        Ok(self.is_done())
    }

    /// Runs until every core halts, or until `general.max_cycles` is exceeded.
    pub fn run(&mut self) -> Result<MachineReport, SimError> {
        info!(
            "starting {} core(s): {} cache lines, {} memory words, latency {}",
            self.num_cores(),
            self.config.cache.lines,
            self.config.memory.size_words,
            self.config.memory.latency
        );
        while !self.is_done() {
            self.step()?;
        }
        info!("all cores halted after {} cycles", self.cycle);
        Ok(self.report())
    }

    pub fn report(&self) -> MachineReport {
        MachineReport {
            cycles: self.cycle,
            cores: self
                .cores
                .iter()
                .map(|c| CoreReport {
                    core: c.core_id,
                    halted: c.drained,
                    utilization: StageUtilization::from(&c.stats),
                    pipeline: c.stats,
                    cache: self.system.caches[c.core_id].stats,
                    registers: c.regs.snapshot(),
                })
                .collect(),
            bus: self.system.bus.stats,
            memory: self.system.memory.stats,
        }
    }

    pub fn bus_trace(&self) -> &[BusTraceEntry] {
        self.system.bus.trace()
    }

    /// Untimed memory write, for seeding data before a run.
    pub fn poke(&mut self, addr: u32, data: i32) -> bool {
        self.system.memory.poke(addr, data)
    }

    /// Current value of `addr`: the Modified copy if a cache owns it, else memory.
    pub fn read_word(&self, addr: u32) -> Option<i32> {
        self.system
            .caches
            .iter()
            .find(|c| c.state(addr) == MsiState::Modified)
            .and_then(|c| c.peek(addr))
            .or_else(|| self.system.memory.peek(addr))
    }
}
