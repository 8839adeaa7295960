//! Load-linked / store-conditional watch table.
//!
//! `ll` marks `(core, address)` Watched. The first `sc` to check a Watched
//! entry wins: its entry becomes `SucceededFor(core)` until the store is
//! performed, and every other core's watch on that address is dropped. While
//! a successful store is still pending, no other core's `sc` to the same
//! address can succeed. A write by another core before that store is
//! performed revokes the success, and the `sc` then fails in Memory.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WatchState {
    #[default]
    NotWatched,
    Watched,
    SucceededFor(usize),
}

pub struct WatchTable {
    entries: Vec<HashMap<u32, WatchState>>,
}

impl WatchTable {
    pub fn new(cores: usize) -> Self {
        Self {
            entries: vec![HashMap::new(); cores],
        }
    }

    pub fn state(&self, core: usize, addr: u32) -> WatchState {
        self.entries
            .get(core)
            .and_then(|m| m.get(&addr))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_watch(&mut self, core: usize, addr: u32) {
        if let Some(map) = self.entries.get_mut(core) {
            map.insert(addr, WatchState::Watched);
        }
    }

    /// Decides a store-conditional. A failing check also drops the core's own watch.
    pub fn check_and_consume(&mut self, core: usize, addr: u32) -> bool {
        let pending_elsewhere = self
            .entries
            .iter()
            .enumerate()
            .any(|(c, m)| c != core && matches!(m.get(&addr), Some(WatchState::SucceededFor(_))));

        match self.state(core, addr) {
            WatchState::Watched if !pending_elsewhere => {
                self.entries[core].insert(addr, WatchState::SucceededFor(core));
                self.clear_others(core, addr);
                true
            }
            WatchState::Watched => {
                self.entries[core].remove(&addr);
                false
            }
            WatchState::NotWatched | WatchState::SucceededFor(_) => false,
        }
    }

    /// The successful store-conditional of `core` has been performed.
    pub fn release(&mut self, core: usize, addr: u32) {
        if let Some(map) = self.entries.get_mut(core) {
            if map.get(&addr) == Some(&WatchState::SucceededFor(core)) {
                map.remove(&addr);
            }
        }
    }

    /// `core` won its store-conditional on `addr` and the store is still owed.
    pub fn holds_success(&self, core: usize, addr: u32) -> bool {
        self.state(core, addr) == WatchState::SucceededFor(core)
    }

    /// Drops every other core's entry on `addr`, pending successes included.
    pub fn clear_others(&mut self, core: usize, addr: u32) {
        for (c, map) in self.entries.iter_mut().enumerate() {
            if c != core {
                map.remove(&addr);
            }
        }
    }
}
