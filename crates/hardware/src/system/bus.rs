//! MSI coherence bus.
//!
//! Misses from every core queue here in arrival order and are served one at
//! a time. A transaction first snoops the other caches (zero latency), then
//! runs whatever memory steps it needs in order: write-back of a dirty
//! victim, flush of a demoted owner, and a fill read when no cache supplied
//! the data. When no memory step remains the line is installed and the
//! requesting core is reported as resolved. At most one transaction
//! resolves per bus cycle, and the next queued request starts on the
//! following cycle, so a resolved core always retries against the line it
//! was just given.

use std::collections::VecDeque;
use std::fmt;

use log::{debug, warn};
use serde::Serialize;

use crate::common::BusError;
use crate::core::cache::{Cache, Fill, MsiBits, MsiState};
use crate::system::memory::{MemStatus, Memory};
use crate::system::reservation::{WatchState, WatchTable};

/// Coherence request a core issues on a miss.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BusCommand {
    /// Read miss.
    BusRd,
    /// Write miss or upgrade from Shared.
    BusRdX,
}

/// What a trace entry records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TraceKind {
    BusRd,
    BusRdX,
    /// Owner demoted by a BusRd writes its data to memory.
    Flush,
    /// Dirty victim evicted by the requester's fill.
    WriteBack,
    MemRead,
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraceKind::BusRd => "BusRd",
            TraceKind::BusRdX => "BusRdX",
            TraceKind::Flush => "Flush",
            TraceKind::WriteBack => "WriteBack",
            TraceKind::MemRead => "MemRead",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BusTraceEntry {
    pub cycle: u64,
    /// Core on whose behalf the command was issued.
    pub origin: usize,
    pub command: TraceKind,
    pub address: u32,
    /// Data moved, when known at issue time.
    pub data: Option<i32>,
}

impl fmt::Display for BusTraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.cycle, self.origin, self.command, self.address)?;
        match self.data {
            Some(d) => write!(f, " {d}"),
            None => f.write_str(" -"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    pub bus_rd: u64,
    pub bus_rdx: u64,
    pub upgrades: u64,
    pub cache_to_cache: u64,
    pub invalidations: u64,
    pub flushes: u64,
    pub writebacks: u64,
    pub mem_reads: u64,
    pub mem_writes: u64,
    pub busy_cycles: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Request {
    core: usize,
    command: BusCommand,
    addr: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MemStep {
    Write { addr: u32, data: i32 },
    Read { addr: u32 },
}

#[derive(Debug)]
struct Transaction {
    req: Request,
    data: Option<i32>,
    steps: VecDeque<MemStep>,
}

pub struct CoherenceBus {
    num_cores: usize,
    mem_words: usize,
    queue: VecDeque<Request>,
    in_flight: Option<Transaction>,
    watches: WatchTable,
    trace_enabled: bool,
    trace: Vec<BusTraceEntry>,
    pub stats: BusStats,
}

impl CoherenceBus {
    pub fn new(num_cores: usize, mem_words: usize, trace_enabled: bool) -> Self {
        Self {
            num_cores,
            mem_words,
            queue: VecDeque::new(),
            in_flight: None,
            watches: WatchTable::new(num_cores),
            trace_enabled,
            trace: Vec::new(),
            stats: BusStats::default(),
        }
    }

    /// Queues a coherence request.
    ///
    /// # Arguments
    ///
    /// * `core` - Requesting core; must exist.
    /// * `command` - `BusRd` for a read miss, `BusRdX` for a write miss.
    /// * `addr` - Word address; must lie inside memory.
    pub fn request(&mut self, core: usize, command: BusCommand, addr: u32) -> Result<(), BusError> {
        if core >= self.num_cores {
            warn!(target: "bus", "rejected {command:?} from unknown core {core}");
            return Err(BusError::InvalidCore { core });
        }
        if addr as usize >= self.mem_words {
            warn!(target: "bus", "rejected {command:?} from core {core} for address {addr}");
            return Err(BusError::AddressOutOfRange { addr });
        }
        self.queue.push_back(Request {
            core,
            command,
            addr,
        });
        Ok(())
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len() + usize::from(self.in_flight.is_some())
    }

    pub fn trace(&self) -> &[BusTraceEntry] {
        &self.trace
    }

    pub fn watch_state(&self, core: usize, addr: u32) -> WatchState {
        self.watches.state(core, addr)
    }

    /// Registers a load-linked watch.
    pub fn set_watch(&mut self, core: usize, addr: u32) {
        if self.known_core(core, "ll") {
            self.watches.set_watch(core, addr);
        }
    }

    /// Decides a store-conditional; `true` means the store may proceed.
    pub fn check_and_consume(&mut self, core: usize, addr: u32) -> bool {
        if !self.known_core(core, "sc") {
            return false;
        }
        let ok = self.watches.check_and_consume(core, addr);
        debug!(target: "bus", "sc core {core} addr {addr}: {}", if ok { "success" } else { "fail" });
        ok
    }

    /// Whether a store-conditional that succeeded in Execute may still write.
    /// Another core's BusRdX on `addr` since then revokes it.
    pub fn conditional_still_held(&self, core: usize, addr: u32) -> bool {
        self.watches.holds_success(core, addr)
    }

    /// A successful store-conditional has been written into the core's cache.
    pub fn release_conditional(&mut self, core: usize, addr: u32) {
        if self.known_core(core, "sc release") {
            self.watches.release(core, addr);
        }
    }

    fn known_core(&self, core: usize, what: &str) -> bool {
        if core >= self.num_cores {
            warn!(target: "bus", "ignored {what} from unknown core {core}");
            return false;
        }
        true
    }

    /// Advances the bus by one cycle.
    ///
    /// `completed` is what memory reported on this cycle's tick. Returns the
    /// core whose miss was resolved this cycle, if any.
    pub fn advance(
        &mut self,
        cycle: u64,
        completed: MemStatus,
        caches: &mut [Cache],
        memory: &mut Memory,
    ) -> Result<Option<usize>, BusError> {
        if !self.is_idle() {
            self.stats.busy_cycles += 1;
        }

        let Some(mut tx) = self.in_flight.take() else {
            let Some(req) = self.queue.pop_front() else {
                return Ok(None);
            };
            let tx = self.start(cycle, req, caches);
            return self.proceed(tx, caches, memory);
        };

        match (tx.steps.front().copied(), completed) {
            (Some(MemStep::Read { .. }), MemStatus::ReadCompleted { address, data }) => {
                self.record(cycle, tx.req.core, TraceKind::MemRead, address, Some(data));
                tx.data = Some(data);
            }
            (Some(MemStep::Write { .. }), MemStatus::WriteCompleted { .. }) => {}
            _ => {
                self.in_flight = Some(tx);
                return Ok(None);
            }
        }
        tx.steps.pop_front();
        self.proceed(tx, caches, memory)
    }

    /// Issues the next memory step, or finishes the transaction when none remain.
    fn proceed(
        &mut self,
        tx: Transaction,
        caches: &mut [Cache],
        memory: &mut Memory,
    ) -> Result<Option<usize>, BusError> {
        let Some(step) = tx.steps.front().copied() else {
            return Ok(Some(self.finish(tx, caches)));
        };
        let core = tx.req.core;
        match step {
            MemStep::Write { addr, data } => {
                memory.begin_write(addr, data)?;
                self.stats.mem_writes += 1;
            }
            MemStep::Read { addr } => {
                memory.begin_read(addr)?;
                self.stats.mem_reads += 1;
                caches[core].stats.mem_reads += 1;
            }
        }
        self.in_flight = Some(tx);
        Ok(None)
    }

    /// Snoops the other caches and plans the memory steps of a new transaction.
    fn start(&mut self, cycle: u64, req: Request, caches: &mut [Cache]) -> Transaction {
        let Request { core, command, addr } = req;
        let mut tx = Transaction {
            req,
            data: None,
            steps: VecDeque::new(),
        };

        let own = caches[core].state(addr);
        let satisfied = match command {
            BusCommand::BusRd => own.is_valid(),
            BusCommand::BusRdX => own == MsiState::Modified,
        };
        if satisfied {
            tx.data = caches[core].peek(addr);
            return tx;
        }

        match command {
            BusCommand::BusRd => self.stats.bus_rd += 1,
            BusCommand::BusRdX => self.stats.bus_rdx += 1,
        }

        if command == BusCommand::BusRdX && own == MsiState::Shared {
            self.stats.upgrades += 1;
            self.invalidate_others(core, addr, caches);
            tx.data = caches[core].peek(addr);
            self.record(cycle, core, TraceKind::BusRdX, addr, tx.data);
            return tx;
        }

        if let Some((victim, data)) = caches[core].dirty_victim(addr) {
            self.stats.writebacks += 1;
            caches[core].stats.mem_writes += 1;
            self.record(cycle, core, TraceKind::WriteBack, victim, Some(data));
            tx.steps.push_back(MemStep::Write { addr: victim, data });
        }

        match command {
            BusCommand::BusRd => {
                for other in (0..caches.len()).filter(|&c| c != core) {
                    let Some(data) = caches[other].peek(addr) else {
                        continue;
                    };
                    tx.data = Some(data);
                    if caches[other].state(addr) == MsiState::Modified {
                        caches[other].set_bits(addr, MsiBits::SHARED);
                        caches[other].stats.mem_writes += 1;
                        self.stats.flushes += 1;
                        self.record(cycle, other, TraceKind::Flush, addr, Some(data));
                        tx.steps.push_back(MemStep::Write { addr, data });
                    }
                }
            }
            BusCommand::BusRdX => {
                for other in (0..caches.len()).filter(|&c| c != core) {
                    if let Some(data) = caches[other].peek(addr) {
                        tx.data = Some(data);
                    }
                }
                self.invalidate_others(core, addr, caches);
            }
        }

        if tx.data.is_some() {
            self.stats.cache_to_cache += 1;
        } else {
            tx.steps.push_back(MemStep::Read { addr });
        }
        let kind = match command {
            BusCommand::BusRd => TraceKind::BusRd,
            BusCommand::BusRdX => TraceKind::BusRdX,
        };
        self.record(cycle, core, kind, addr, tx.data);
        tx
    }

    fn invalidate_others(&mut self, core: usize, addr: u32, caches: &mut [Cache]) {
        for (other, cache) in caches.iter_mut().enumerate() {
            if other != core && cache.state(addr).is_valid() {
                cache.set_bits(addr, MsiBits::INVALID);
                self.stats.invalidations += 1;
            }
        }
        self.watches.clear_others(core, addr);
    }

    fn finish(&mut self, tx: Transaction, caches: &mut [Cache]) -> usize {
        let Request { core, command, addr } = tx.req;
        let data = tx.data.unwrap_or_default();
        let fill = match command {
            BusCommand::BusRd => Fill::Read,
            BusCommand::BusRdX => Fill::Write,
        };
        let satisfied = match command {
            BusCommand::BusRd => caches[core].state(addr).is_valid(),
            BusCommand::BusRdX => caches[core].state(addr) == MsiState::Modified,
        };
        if !satisfied {
            caches[core].install(addr, data, fill);
        }
        debug!(target: "bus", "resolved {command:?} for core {core} addr {addr} as {fill:?}");
        core
    }

    fn record(&mut self, cycle: u64, origin: usize, command: TraceKind, address: u32, data: Option<i32>) {
        let entry = BusTraceEntry {
            cycle,
            origin,
            command,
            address,
            data,
        };
        debug!(target: "bus", "{entry}");
        if self.trace_enabled {
            self.trace.push(entry);
        }
    }
}
