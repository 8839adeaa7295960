//! Single-core cycle counts.
//!
//! Without hazards or misses an `n`-instruction program whose last
//! instruction is `halt` finishes in `n + 4` cycles: `halt` is fetched on
//! cycle `n` and retires four stages later.

use crate::common::harness::TestHarness;
use msisim::core::pipeline::Stage;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn test_halt_only() {
    let mut h = TestHarness::boot_default(&["halt"]);
    let report = h.run();
    assert_eq!(report.cycles, 5);
    assert_eq!(report.cores[0].pipeline.retired, 1);
}

#[test]
fn test_hazard_free_program_fills_pipeline() {
    let mut h = TestHarness::boot_default(&[
        "add $2, $0, 5\n\
         add $3, $0, 7\n\
         add $4, $0, 9\n\
         halt\n",
    ]);
    let report = h.run();
    assert_eq!(report.cycles, 8);
    assert_eq!((h.reg(0, 2), h.reg(0, 3), h.reg(0, 4)), (5, 7, 9));

    let stats = &report.cores[0].pipeline;
    assert_eq!(stats.hazard_stalls, 0);
    assert_eq!(stats.retired, 4);
    assert_eq!(stats.utilization(Stage::WriteBack), 50.0);
    assert_eq!(report.cores[0].utilization.write_back, 50.0);
}

#[test]
fn test_back_to_back_dependency_stalls_three_cycles() {
    let mut h = TestHarness::boot_default(&["add $2, $1, $1\nadd $3, $2, $1\nhalt\n"]);
    let report = h.run();
    assert_eq!(report.cycles, 10);
    assert_eq!(report.cores[0].pipeline.hazard_stalls, 3);
}

/// Three instructions plus pipeline depth, plus the three-cycle stall of the
/// back-to-back dependency. No memory traffic at all.
#[test]
fn test_register_only_program_end_to_end() {
    let mut h = TestHarness::boot_default(&["add $2, $0, $0\nadd $2, $2, $0\nhalt\n"]);
    let report = h.run();
    assert_eq!(report.cycles, 10);
    assert_eq!(report.cores[0].pipeline.hazard_stalls, 3);
    assert_eq!(h.reg(0, 2), 0);
    assert_eq!((report.memory.reads, report.memory.writes), (0, 0));
    assert_eq!((report.cores[0].cache.mem_reads, report.cores[0].cache.mem_writes), (0, 0));
    assert!(h.machine.bus_trace().is_empty());
}

#[test]
fn test_dependent_value_is_read_after_write_back() {
    let mut h = TestHarness::boot_default(&["add $2, $0, 3\nadd $3, $2, $2\nhalt\n"]);
    h.run();
    assert_eq!(h.reg(0, 3), 6);
}

#[rstest]
#[case::distance_two(
    "add $2, $0, 4\nadd $5, $0, 1\nadd $3, $2, $0\nhalt\n",
    10,
    2
)]
#[case::distance_three(
    "add $2, $0, 4\nadd $5, $0, 1\nadd $6, $0, 1\nadd $3, $2, $0\nhalt\n",
    10,
    1
)]
#[case::distance_four(
    "add $2, $0, 4\nadd $5, $0, 1\nadd $6, $0, 1\nadd $7, $0, 1\nadd $3, $2, $0\nhalt\n",
    10,
    0
)]
#[case::store_data_register(
    "add $2, $0, 4\nadd $5, $0, 1\nsw $2, 0($0)\nhalt\n",
    // store misses: hazard (2) plus the fill latency of 64
    8 + 2 + 64 + 1,
    2
)]
fn test_hazard_distance(#[case] src: &str, #[case] cycles: u64, #[case] stalls: u64) {
    let mut h = TestHarness::boot_default(&[src]);
    let report = h.run();
    assert_eq!(report.cores[0].pipeline.hazard_stalls, stalls);
    assert_eq!(report.cycles, cycles);
    assert_eq!(h.reg(0, 3), if src.contains("$3") { 4 } else { 0 });
}

#[test]
fn test_taken_branch_costs_one_bubble() {
    let mut h = TestHarness::boot_default(&[
        "add $2, $0, 1\n\
         add $3, $0, 0\n\
         beq $0, $0, 4\n\
         add $4, $0, 99\n\
         halt\n",
    ]);
    let report = h.run();
    assert_eq!(report.cycles, 9);
    assert_eq!(h.reg(0, 4), 0);
    assert_eq!(report.cores[0].pipeline.flushes, 1);
}

#[test]
fn test_jal_links_and_skips() {
    let mut h = TestHarness::boot_default(&["jal 2\nadd $4, $0, 99\nhalt\n"]);
    let report = h.run();
    assert_eq!(report.cycles, 7);
    assert_eq!(h.reg(0, 15), 1);
    assert_eq!(h.reg(0, 4), 0);
}

#[test]
fn test_countdown_loop() {
    let mut h = TestHarness::boot_default(&[
        "add $2, $0, 3\n\
         sub $2, $2, 1\n\
         add $6, $6, 1\n\
         bne $2, $0, 1\n\
         halt\n",
    ]);
    let report = h.run();
    assert_eq!(h.reg(0, 2), 0);
    assert_eq!(h.reg(0, 6), 3);
    assert_eq!(report.cores[0].pipeline.flushes, 2);
}

#[rstest]
#[case("beq", 5, 5, true)]
#[case("beq", 5, 6, false)]
#[case("bne", 5, 5, false)]
#[case("blt", -1, 0, true)]
#[case("bgt", -1, 0, false)]
#[case("ble", 3, 3, true)]
#[case("bge", 2, 3, false)]
#[case("bge", 3, 2, true)]
fn test_branch_conditions(#[case] op: &str, #[case] a: i32, #[case] b: i32, #[case] taken: bool) {
    let src = format!(
        "add $2, $0, {a}\nadd $3, $0, {b}\n{op} $2, $3, 4\nadd $4, $0, 1\nhalt\n"
    );
    let mut h = TestHarness::boot_default(&[&src]);
    h.run();
    assert_eq!(h.reg(0, 4), if taken { 0 } else { 1 });
}

#[test]
fn test_alu_results() {
    let mut h = TestHarness::boot_default(&[
        "add $2, $0, -8\n\
         sra $3, $2, 1\n\
         srl $4, $2, 28\n\
         sll $5, $2, 2\n\
         mul $6, $2, $2\n\
         xor $7, $2, 5\n\
         and $8, $2, 12\n\
         or  $9, $2, 3\n\
         sub $10, $0, $2\n\
         sll $11, $2, 40\n\
         add $0, $0, 1\n\
         halt\n",
    ]);
    h.run();
    let regs: Vec<i32> = (0..12).map(|r| h.reg(0, r)).collect();
    assert_eq!(regs, vec![0, 0, -8, -4, 15, -32, 64, -3, 8, -5, 8, 0]);
}

#[rstest]
#[case(1)]
#[case(5)]
#[case(64)]
fn test_cold_load_waits_for_memory(#[case] latency: u64) {
    let mut h = TestHarness::with_latency(latency, &["lw $2, 0($0)\nhalt\n"]);
    h.machine.poke(0, 42);
    let report = h.run();

    assert_eq!(report.cycles, latency + 7);
    assert_eq!(h.reg(0, 2), 42);
    assert_eq!(report.cores[0].pipeline.frozen_cycles, latency);
    assert_eq!(report.bus.bus_rd, 1);
    assert_eq!(report.memory.reads, 1);
    assert_eq!(report.cores[0].cache.misses, 1);
    assert_eq!(report.cores[0].cache.hits, 1);
}

#[test]
fn test_store_stays_in_cache() {
    let mut h = TestHarness::with_latency(10, &["add $2, $0, 7\nsw $2, 3($0)\nhalt\n"]);
    let report = h.run();
    assert_eq!(report.cycles, 21);
    assert_eq!(h.word(3), 7);
    assert_eq!(h.machine.system.memory.peek(3), Some(0));
    assert_eq!(report.bus.bus_rdx, 1);
}

#[test]
fn test_second_load_hits() {
    let mut h = TestHarness::with_latency(10, &["lw $2, 4($0)\nlw $3, 4($0)\nhalt\n"]);
    h.machine.poke(4, -3);
    let report = h.run();
    assert_eq!((h.reg(0, 2), h.reg(0, 3)), (-3, -3));
    assert_eq!(report.bus.bus_rd, 1);
    assert_eq!(report.cores[0].cache.hits, 2);
}
