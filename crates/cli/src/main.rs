//! Multi-core MSI simulator CLI.

use clap::Parser;
use env_logger::Env;
use log::error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use msisim::Machine;
use msisim::common::SimError;
use msisim::config::Config;
use msisim::sim::loader;
use msisim::stats::MachineReport;

#[derive(Parser, Debug)]
#[command(
    name = "msisim",
    author,
    version,
    about = "Cycle-accurate multi-core pipeline simulator with MSI coherence",
    long_about = None,
)]
struct Cli {
    /// Program files, one per core (core 0 first).
    #[arg(required = true)]
    programs: Vec<PathBuf>,

    /// TOML configuration; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Abort after this many cycles (overrides the config).
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Write the bus trace to this file, one `cycle origin command address data` line per entry.
    #[arg(long)]
    bus_trace: Option<PathBuf>,

    /// Print the final report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Log the pipeline diagram every cycle (needs RUST_LOG=trace).
    #[arg(long)]
    trace_pipeline: bool,

    /// Advance one cycle per ENTER, printing every core's registers and stats.
    #[arg(long)]
    step: bool,

    /// Raise the default log level (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::init_from_env(Env::default().filter_or("RUST_LOG", default_level));

    let mut config = match &cli.config {
        Some(path) => Config::load(path).unwrap_or_else(|e| fatal(&e)),
        None => Config::default(),
    };
    if cli.max_cycles.is_some() {
        config.general.max_cycles = cli.max_cycles;
    }
    if cli.bus_trace.is_some() {
        config.bus.trace = true;
    }
    config.general.trace_pipeline |= cli.trace_pipeline;

    let programs = loader::load_programs(&cli.programs).unwrap_or_else(|e| fatal(&e));
    let mut machine = Machine::new(config, programs).unwrap_or_else(|e| fatal(&e));

    let result = if cli.step {
        step_loop(&mut machine)
    } else {
        machine.run()
    };

    if let Some(path) = &cli.bus_trace {
        write_trace(&machine, path);
    }

    match result {
        Ok(report) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(text) => println!("{text}"),
                    Err(e) => fatal(&e),
                }
            } else {
                report.print();
            }
            std::io::stdout().flush().ok();
        }
        Err(e) => {
            eprintln!("\n\x1b[1;31m[!] FATAL:\x1b[0m {}", e);
            for core in &machine.cores {
                eprintln!("core {} pc={}", core.core_id, core.pc);
                core.regs.dump();
            }
            machine.report().print();
            process::exit(1);
        }
    }
}

/// Interactive single-step run. `c` runs to completion, `q` stops early and
/// reports the partial state. End of input behaves like `c`.
fn step_loop(machine: &mut Machine) -> Result<MachineReport, SimError> {
    let stdin = io::stdin();
    let mut line = String::new();
    while !machine.is_done() {
        let done = machine.step()?;

        println!("---------------- cycle {} ----------------", machine.cycle);
        for core in &machine.cores {
            println!("core {} pc={}{}", core.core_id, core.pc, if core.is_frozen() { " [frozen]" } else { "" });
            core.regs.dump();
            core.stats.print();
        }
        if done {
            break;
        }

        print!("[ENTER] step, [c] continue, [q] quit > ");
        io::stdout().flush().ok();
        line.clear();
        let read = stdin.lock().read_line(&mut line);
        match (read, line.trim()) {
            (Ok(0) | Err(_), _) | (_, "c") => return machine.run(),
            (_, "q") => break,
            _ => {}
        }
    }
    Ok(machine.report())
}

fn write_trace(machine: &Machine, path: &Path) {
    let mut text = String::new();
    for entry in machine.bus_trace() {
        text.push_str(&entry.to_string());
        text.push('\n');
    }
    if let Err(e) = fs::write(path, text) {
        error!("could not write bus trace to {}: {}", path.display(), e);
    }
}

fn fatal(e: &dyn std::fmt::Display) -> ! {
    eprintln!("\x1b[1;31merror:\x1b[0m {}", e);
    process::exit(1);
}
