//! Private direct-mapped cache with per-line MSI state.
//!
//! One word per line, so an address splits into `(tag, index)` with no
//! offset bits. The owning pipeline only uses [`Cache::read`] and
//! [`Cache::write`]; every state change beyond a write hit on a Modified
//! line is made by the coherence bus through the install and raw-bit
//! helpers.

use serde::Serialize;

/// Coherence state of one line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum MsiState {
    Modified,
    Shared,
    #[default]
    Invalid,
}

impl MsiState {
    pub fn is_valid(self) -> bool {
        self != MsiState::Invalid
    }
}

/// Raw `(M, S, I)` flag triple as the bus manipulates it.
///
/// All three flags clear also means Invalid. `M` and `S` together is not a
/// legal state and is rejected by [`Cache::set_bits`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MsiBits {
    pub m: bool,
    pub s: bool,
    pub i: bool,
}

impl MsiBits {
    pub const MODIFIED: MsiBits = MsiBits { m: true, s: false, i: false };
    pub const SHARED: MsiBits = MsiBits { m: false, s: true, i: false };
    pub const INVALID: MsiBits = MsiBits { m: false, s: false, i: true };

    pub fn state(self) -> Option<MsiState> {
        match (self.m, self.s) {
            (true, true) => None,
            (true, false) => Some(MsiState::Modified),
            (false, true) => Some(MsiState::Shared),
            (false, false) => Some(MsiState::Invalid),
        }
    }
}

impl From<MsiState> for MsiBits {
    fn from(state: MsiState) -> Self {
        match state {
            MsiState::Modified => MsiBits::MODIFIED,
            MsiState::Shared => MsiBits::SHARED,
            MsiState::Invalid => MsiBits::INVALID,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct CacheLine {
    state: MsiState,
    tag: u32,
    data: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheRead {
    Hit(i32),
    Miss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheWrite {
    Success,
    Fail,
}

/// Which kind of miss a line is being installed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    /// BusRd fill, installs Shared.
    Read,
    /// BusRdX fill, installs Modified.
    Write,
}

/// Reporting counters. `mem_reads`/`mem_writes` are bumped by the bus for
/// memory traffic issued on this cache's behalf.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub mem_reads: u64,
    pub mem_writes: u64,
}

pub struct Cache {
    lines: Vec<CacheLine>,
    index_bits: u32,
    pub stats: CacheStats,
}

impl Cache {
    /// Creates a cache of `lines` lines, all Invalid.
    ///
    /// # Arguments
    ///
    /// * `lines` - Number of lines; must be a power of two (the config
    ///   validates this before any cache is built).
    pub fn new(lines: usize) -> Self {
        Self {
            lines: vec![CacheLine::default(); lines],
            index_bits: lines.trailing_zeros(),
            stats: CacheStats::default(),
        }
    }

    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    /// Splits an address into `(tag, index)`.
    pub fn split(&self, addr: u32) -> (u32, usize) {
        let index = addr & ((1u32 << self.index_bits) - 1);
        (addr >> self.index_bits, index as usize)
    }

    /// Inverse of [`Cache::split`].
    pub fn join(&self, tag: u32, index: usize) -> u32 {
        (tag << self.index_bits) | index as u32
    }

    fn lookup(&self, addr: u32) -> Option<&CacheLine> {
        let (tag, index) = self.split(addr);
        let line = &self.lines[index];
        (line.state.is_valid() && line.tag == tag).then_some(line)
    }

    pub fn read(&mut self, addr: u32) -> CacheRead {
        match self.lookup(addr).map(|l| l.data) {
            Some(data) => {
                self.stats.hits += 1;
                CacheRead::Hit(data)
            }
            None => {
                self.stats.misses += 1;
                CacheRead::Miss
            }
        }
    }

    /// Writes through to the line only if this cache owns it (Modified).
    pub fn write(&mut self, addr: u32, data: i32) -> CacheWrite {
        let (tag, index) = self.split(addr);
        let line = &mut self.lines[index];
        if line.state == MsiState::Modified && line.tag == tag {
            line.data = data;
            self.stats.hits += 1;
            CacheWrite::Success
        } else {
            self.stats.misses += 1;
            CacheWrite::Fail
        }
    }

    /// Overwrites the line at the address's index, whatever it held.
    pub fn install(&mut self, addr: u32, data: i32, fill: Fill) {
        let (tag, index) = self.split(addr);
        self.lines[index] = CacheLine {
            state: match fill {
                Fill::Read => MsiState::Shared,
                Fill::Write => MsiState::Modified,
            },
            tag,
            data,
        };
    }

    /// Raw state bits of the line holding `addr`, or `None` on tag mismatch.
    pub fn bits(&self, addr: u32) -> Option<MsiBits> {
        let (tag, index) = self.split(addr);
        let line = &self.lines[index];
        (line.tag == tag).then(|| line.state.into())
    }

    /// Sets the raw state bits of the line holding `addr`.
    ///
    /// Returns `false` without touching the line on tag mismatch or when the
    /// triple has both M and S set.
    pub fn set_bits(&mut self, addr: u32, bits: MsiBits) -> bool {
        let (tag, index) = self.split(addr);
        let line = &mut self.lines[index];
        match bits.state() {
            Some(state) if line.tag == tag => {
                line.state = state;
                true
            }
            _ => false,
        }
    }

    /// State of `addr` in this cache; Invalid when another block occupies the line.
    pub fn state(&self, addr: u32) -> MsiState {
        self.lookup(addr).map_or(MsiState::Invalid, |l| l.state)
    }

    /// Cached data for `addr` without touching counters.
    pub fn peek(&self, addr: u32) -> Option<i32> {
        self.lookup(addr).map(|l| l.data)
    }

    /// A different block held Modified at `addr`'s index, as `(address, data)`.
    pub fn dirty_victim(&self, addr: u32) -> Option<(u32, i32)> {
        let (tag, index) = self.split(addr);
        let line = &self.lines[index];
        (line.state == MsiState::Modified && line.tag != tag)
            .then(|| (self.join(line.tag, index), line.data))
    }

    /// Valid lines as `(address, state, data)`.
    pub fn resident(&self) -> impl Iterator<Item = (u32, MsiState, i32)> + '_ {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.state.is_valid())
            .map(|(i, l)| (self.join(l.tag, i), l.state, l.data))
    }
}
