//! hierarchical-vm - run a script of virtual memory operations
//!
//! Usage: hierarchical-vm [OPTIONS] <SCRIPT> [OUTPUT]
//!
//! Each script line is one of `r <addr>`, `w <addr> <value>` or `t <addr>`.
//! Results are written one per line to OUTPUT, or stdout when omitted.

mod logger;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use hierarchical_vm::constants::*;
use hierarchical_vm::io::{format_results, parse_script, read_script, write_results, Outcome};
use hierarchical_vm::{MmuConfig, SimulatedMemory, VirtualMemory};

use crate::logger::StderrLogger;

#[derive(Parser)]
#[command(name = "hierarchical-vm")]
#[command(about = "Demand-paged virtual memory over a simulated physical store")]
struct Args {
    /// Script of read/write/translate operations
    script: PathBuf,

    /// Output file for results (default: stdout)
    output: Option<PathBuf>,

    /// Width of a virtual address in bits
    #[arg(long, default_value_t = DEFAULT_VIRTUAL_ADDRESS_WIDTH)]
    virtual_address_width: u32,

    /// Width of the page offset in bits; a page holds 2^width words
    #[arg(long, default_value_t = DEFAULT_OFFSET_WIDTH)]
    offset_width: u32,

    /// Number of physical frames
    #[arg(long, default_value_t = DEFAULT_NUM_FRAMES)]
    num_frames: u64,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    StderrLogger::new(StderrLogger::level_for(args.verbose))
        .init()
        .context("failed to install logger")?;

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let config = MmuConfig::new(args.virtual_address_width, args.offset_width, args.num_frames)
        .context("invalid memory layout")?;
    info!("layout: {}", config);

    let content = read_script(&args.script)
        .with_context(|| format!("failed to read script {}", args.script.display()))?;
    let ops = parse_script(&content)
        .with_context(|| format!("failed to parse script {}", args.script.display()))?;
    info!("{} operations to run", ops.len());

    let mut vm = VirtualMemory::new(config, SimulatedMemory::new(&config));
    let results: Vec<Outcome> = ops.into_iter().map(|op| op.apply(&mut vm)).collect();

    let successes = results.iter().filter(|r| r.is_success()).count();
    let stats = vm.memory().stats();
    info!("successful operations: {}", successes);
    info!("failed operations: {}", results.len() - successes);
    info!(
        "evictions: {}, restores: {}, pages in swap: {}",
        stats.evictions,
        stats.restores,
        vm.memory().swapped_pages()
    );

    match &args.output {
        Some(path) => {
            write_results(path, &results)
                .with_context(|| format!("failed to write results to {}", path.display()))?;
            info!("results written to {}", path.display());
        }
        None => print!("{}", format_results(&results)),
    }

    Ok(())
}
