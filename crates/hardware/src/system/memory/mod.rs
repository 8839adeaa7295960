//! Shared word-addressed memory with a fixed access latency.
//!
//! At most one operation is in flight. It is started with
//! [`Memory::begin_read`] or [`Memory::begin_write`] and completes on the
//! [`Memory::tick`] that brings its countdown to zero; the write lands (or the
//! read samples) at that moment.

use serde::Serialize;

use crate::common::MemoryError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemOp {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug)]
struct InFlight {
    op: MemOp,
    address: u32,
    data: i32,
    cycles_remaining: u64,
}

/// Outcome of one memory clock tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemStatus {
    Idle,
    Pending,
    ReadCompleted { address: u32, data: i32 },
    WriteCompleted { address: u32 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub reads: u64,
    pub writes: u64,
    pub busy_cycles: u64,
}

pub struct Memory {
    words: Vec<i32>,
    latency: u64,
    in_flight: Option<InFlight>,
    pub stats: MemoryStats,
}

impl Memory {
    pub fn new(size_words: usize, latency: u64) -> Self {
        Self {
            words: vec![0; size_words],
            latency: latency.max(1),
            in_flight: None,
            stats: MemoryStats::default(),
        }
    }

    pub fn size(&self) -> usize {
        self.words.len()
    }

    pub fn latency(&self) -> u64 {
        self.latency
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn contains(&self, addr: u32) -> bool {
        (addr as usize) < self.words.len()
    }

    pub fn begin_read(&mut self, address: u32) -> Result<(), MemoryError> {
        self.begin(MemOp::Read, address, 0)
    }

    pub fn begin_write(&mut self, address: u32, data: i32) -> Result<(), MemoryError> {
        self.begin(MemOp::Write, address, data)
    }

    fn begin(&mut self, op: MemOp, address: u32, data: i32) -> Result<(), MemoryError> {
        if self.in_flight.is_some() {
            return Err(MemoryError::Busy);
        }
        if !self.contains(address) {
            return Err(MemoryError::AddressOutOfRange { addr: address });
        }
        self.in_flight = Some(InFlight {
            op,
            address,
            data,
            cycles_remaining: self.latency,
        });
        Ok(())
    }

    /// Advances the outstanding operation by one cycle.
    pub fn tick(&mut self) -> MemStatus {
        let Some(op) = self.in_flight.as_mut() else {
            return MemStatus::Idle;
        };
        self.stats.busy_cycles += 1;
        op.cycles_remaining -= 1;
        if op.cycles_remaining > 0 {
            return MemStatus::Pending;
        }

        let InFlight {
            op, address, data, ..
        } = *op;
        self.in_flight = None;
        match op {
            MemOp::Read => {
                self.stats.reads += 1;
                MemStatus::ReadCompleted {
                    address,
                    data: self.words[address as usize],
                }
            }
            MemOp::Write => {
                self.stats.writes += 1;
                self.words[address as usize] = data;
                MemStatus::WriteCompleted { address }
            }
        }
    }

    /// Untimed read, for setup and inspection.
    pub fn peek(&self, addr: u32) -> Option<i32> {
        self.words.get(addr as usize).copied()
    }

    /// Untimed write, for setup. Returns `false` when out of range.
    pub fn poke(&mut self, addr: u32, data: i32) -> bool {
        match self.words.get_mut(addr as usize) {
            Some(word) => {
                *word = data;
                true
            }
            None => false,
        }
    }
}
