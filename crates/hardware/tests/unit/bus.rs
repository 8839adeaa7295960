//! # Coherence Bus Tests
//!
//! Drives the bus through `System::tick` with hand-placed cache contents.

use msisim::common::BusError;
use msisim::config::Config;
use msisim::core::cache::{Fill, MsiState};
use msisim::system::reservation::WatchState;
use msisim::system::{BusCommand, System};
use msisim::system::bus::TraceKind;

fn system(cores: usize, latency: u64) -> System {
    let mut config = Config::default();
    config.cache.lines = 4;
    config.memory.size_words = 64;
    config.memory.latency = latency;
    config.bus.trace = true;
    System::new(&config, cores)
}

/// Ticks until a core is resolved, returning `(cycle, core)`.
fn run_until_resolved(sys: &mut System, start: u64) -> (u64, usize) {
    for cycle in start..start + 1000 {
        if let Some(core) = sys.tick(cycle).unwrap() {
            return (cycle, core);
        }
    }
    panic!("bus never resolved a request");
}

#[test]
fn test_read_miss_fills_from_memory() {
    let mut sys = system(2, 3);
    sys.memory.poke(5, 50);
    sys.bus.request(0, BusCommand::BusRd, 5).unwrap();

    // started on cycle 1, memory completes three ticks later
    assert_eq!(run_until_resolved(&mut sys, 1), (4, 0));
    assert_eq!(sys.caches[0].state(5), MsiState::Shared);
    assert_eq!(sys.caches[0].peek(5), Some(50));
    assert_eq!(sys.bus.stats.bus_rd, 1);
    assert_eq!(sys.bus.stats.mem_reads, 1);
    assert_eq!(sys.caches[0].stats.mem_reads, 1);
    assert!(sys.bus.is_idle());
}

#[test]
fn test_read_with_modified_owner_demotes_and_flushes() {
    let mut sys = system(2, 2);
    sys.caches[1].install(5, 77, Fill::Write);
    sys.bus.request(0, BusCommand::BusRd, 5).unwrap();

    let (_, core) = run_until_resolved(&mut sys, 1);
    assert_eq!(core, 0);
    assert_eq!(sys.caches[0].peek(5), Some(77));
    assert_eq!(sys.caches[0].state(5), MsiState::Shared);
    assert_eq!(sys.caches[1].state(5), MsiState::Shared);
    assert_eq!(sys.memory.peek(5), Some(77));
    assert_eq!(sys.bus.stats.flushes, 1);
    assert_eq!(sys.bus.stats.mem_reads, 0);
    assert_eq!(sys.caches[1].stats.mem_writes, 1);

    let kinds: Vec<TraceKind> = sys.bus.trace().iter().map(|e| e.command).collect();
    assert_eq!(kinds, vec![TraceKind::Flush, TraceKind::BusRd]);
}

#[test]
fn test_read_from_sharer_needs_no_memory() {
    let mut sys = system(3, 10);
    sys.caches[2].install(6, 12, Fill::Read);
    sys.bus.request(0, BusCommand::BusRd, 6).unwrap();

    assert_eq!(run_until_resolved(&mut sys, 1), (1, 0));
    assert_eq!(sys.caches[0].peek(6), Some(12));
    assert_eq!(sys.bus.stats.cache_to_cache, 1);
    assert_eq!(sys.memory.stats.reads, 0);
}

#[test]
fn test_write_miss_invalidates_everyone_else() {
    let mut sys = system(3, 2);
    sys.caches[1].install(7, 3, Fill::Read);
    sys.caches[2].install(7, 3, Fill::Read);
    sys.bus.set_watch(1, 7);
    sys.bus.request(0, BusCommand::BusRdX, 7).unwrap();

    run_until_resolved(&mut sys, 1);
    assert_eq!(sys.caches[0].state(7), MsiState::Modified);
    assert_eq!(sys.caches[0].peek(7), Some(3));
    assert_eq!(sys.caches[1].state(7), MsiState::Invalid);
    assert_eq!(sys.caches[2].state(7), MsiState::Invalid);
    assert_eq!(sys.bus.stats.invalidations, 2);
    assert_eq!(sys.bus.watch_state(1, 7), WatchState::NotWatched);
}

#[test]
fn test_upgrade_from_shared() {
    let mut sys = system(2, 5);
    sys.caches[0].install(9, 4, Fill::Read);
    sys.caches[1].install(9, 4, Fill::Read);
    sys.bus.request(0, BusCommand::BusRdX, 9).unwrap();

    assert_eq!(run_until_resolved(&mut sys, 1), (1, 0));
    assert_eq!(sys.caches[0].state(9), MsiState::Modified);
    assert_eq!(sys.caches[1].state(9), MsiState::Invalid);
    assert_eq!(sys.bus.stats.upgrades, 1);
    assert_eq!(sys.memory.stats.reads, 0);
}

#[test]
fn test_dirty_victim_written_back_before_fill() {
    let mut sys = system(1, 2);
    sys.caches[0].install(1, 99, Fill::Write);
    sys.memory.poke(5, 55);
    // 5 maps onto the same line as 1 in a 4-line cache
    sys.bus.request(0, BusCommand::BusRd, 5).unwrap();

    // write-back (2 ticks) then fill read (2 ticks)
    assert_eq!(run_until_resolved(&mut sys, 1), (5, 0));
    assert_eq!(sys.memory.peek(1), Some(99));
    assert_eq!(sys.caches[0].peek(5), Some(55));
    assert_eq!(sys.bus.stats.writebacks, 1);
    assert_eq!(sys.caches[0].stats.mem_writes, 1);
}

#[test]
fn test_requests_served_in_order_one_per_cycle() {
    let mut sys = system(2, 10);
    sys.caches[1].install(3, 8, Fill::Read);
    sys.caches[0].install(4, 9, Fill::Read);
    sys.bus.request(0, BusCommand::BusRd, 3).unwrap();
    sys.bus.request(1, BusCommand::BusRd, 4).unwrap();
    assert_eq!(sys.bus.pending(), 2);

    assert_eq!(sys.tick(1).unwrap(), Some(0));
    assert_eq!(sys.tick(2).unwrap(), Some(1));
    assert!(sys.bus.is_idle());
}

#[test]
fn test_invalid_requests_rejected() {
    let mut sys = system(2, 1);
    assert_eq!(
        sys.bus.request(2, BusCommand::BusRd, 0),
        Err(BusError::InvalidCore { core: 2 })
    );
    assert_eq!(
        sys.bus.request(0, BusCommand::BusRdX, 64),
        Err(BusError::AddressOutOfRange { addr: 64 })
    );
    assert!(sys.bus.is_idle());
}

#[test]
fn test_store_conditional_decisions() {
    let mut sys = system(2, 1);
    sys.bus.set_watch(0, 4);
    sys.bus.set_watch(1, 4);
    assert!(sys.bus.check_and_consume(0, 4));
    assert!(!sys.bus.check_and_consume(1, 4));
    assert!(!sys.bus.check_and_consume(0, 4));
    assert_eq!(sys.bus.watch_state(0, 4), WatchState::SucceededFor(0));
    sys.bus.release_conditional(0, 4);
    assert_eq!(sys.bus.watch_state(0, 4), WatchState::NotWatched);
}

#[test]
fn test_foreign_write_miss_revokes_decided_sc() {
    let mut sys = system(2, 2);
    sys.bus.set_watch(0, 4);
    assert!(sys.bus.check_and_consume(0, 4));
    assert!(sys.bus.conditional_still_held(0, 4));

    sys.bus.request(1, BusCommand::BusRdX, 4).unwrap();
    run_until_resolved(&mut sys, 1);
    assert!(!sys.bus.conditional_still_held(0, 4));
    assert_eq!(sys.bus.watch_state(0, 4), WatchState::NotWatched);
}

#[test]
fn test_own_write_miss_keeps_decided_sc() {
    let mut sys = system(2, 2);
    sys.bus.set_watch(0, 4);
    assert!(sys.bus.check_and_consume(0, 4));

    sys.bus.request(0, BusCommand::BusRdX, 4).unwrap();
    run_until_resolved(&mut sys, 1);
    assert!(sys.bus.conditional_still_held(0, 4));
}

#[test]
fn test_watch_calls_from_unknown_core_are_ignored() {
    let mut sys = system(2, 1);
    sys.bus.set_watch(5, 4);
    assert!(!sys.bus.check_and_consume(5, 4));
    sys.bus.release_conditional(5, 4);
    assert_eq!(sys.bus.watch_state(5, 4), WatchState::NotWatched);
    assert!(!sys.bus.conditional_still_held(5, 4));
}
