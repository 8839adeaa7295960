use msisim::config::Config;
use msisim::core::cache::MsiState;
use msisim::isa::parse_program;
use msisim::stats::MachineReport;
use msisim::Machine;

/// Builds a machine from program text and runs it.
pub struct TestHarness {
    pub machine: Machine,
}

impl TestHarness {
    pub fn boot(config: Config, sources: &[&str]) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let programs = sources
            .iter()
            .map(|s| parse_program(s).expect("program should parse"))
            .collect();
        Self {
            machine: Machine::new(config, programs).expect("machine should build"),
        }
    }

    /// Reference machine with the given memory latency.
    pub fn with_latency(latency: u64, sources: &[&str]) -> Self {
        let mut config = Config::default();
        config.memory.latency = latency;
        config.general.max_cycles = Some(1_000_000);
        Self::boot(config, sources)
    }

    pub fn boot_default(sources: &[&str]) -> Self {
        Self::with_latency(64, sources)
    }

    pub fn run(&mut self) -> MachineReport {
        self.machine.run().expect("run should finish")
    }

    pub fn reg(&self, core: usize, reg: usize) -> i32 {
        self.machine.cores[core].regs.read(reg)
    }

    pub fn state(&self, core: usize, addr: u32) -> MsiState {
        self.machine.system.caches[core].state(addr)
    }

    pub fn word(&self, addr: u32) -> i32 {
        self.machine.read_word(addr).expect("address in range")
    }
}
