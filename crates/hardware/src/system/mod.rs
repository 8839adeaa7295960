//! Everything the cores share: the coherence bus, the private caches it
//! snoops, and main memory.

pub mod bus;
pub mod memory;
pub mod reservation;

pub use self::bus::{BusCommand, BusStats, BusTraceEntry, CoherenceBus};
pub use self::memory::Memory;

use crate::common::BusError;
use crate::config::Config;
use crate::core::cache::Cache;

/// Shared machine state handed to each pipeline for the duration of its cycle.
///
/// A pipeline only ever touches `caches[its core id]`; the bus receives the
/// whole cache slice when it advances.
pub struct System {
    pub bus: CoherenceBus,
    pub caches: Vec<Cache>,
    pub memory: Memory,
}

impl System {
    pub fn new(config: &Config, cores: usize) -> Self {
        Self {
            bus: CoherenceBus::new(cores, config.memory.size_words, config.bus.trace),
            caches: (0..cores).map(|_| Cache::new(config.cache.lines)).collect(),
            memory: Memory::new(config.memory.size_words, config.memory.latency),
        }
    }

    /// Memory countdown, then the bus. Returns the core whose miss resolved.
    pub fn tick(&mut self, cycle: u64) -> Result<Option<usize>, BusError> {
        let completed = self.memory.tick();
        self.bus
            .advance(cycle, completed, &mut self.caches, &mut self.memory)
    }
}
