//! Command-line entry point for the Vela memory visualizer.
//!
//! Pure glue: parses a menu option or explicit settings, wires the
//! workload generator to the memory unit, and hands state views to the
//! renderer.

mod error;
mod logger;
mod render;
mod workload;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use error::{CliError, Result};
use mmu::{MemoryRequest, Mmu, MmuConfig};
use workload::Workload;

#[derive(Parser)]
#[command(name = "vela")]
#[command(about = "Terminal visualizer for a simulated virtual-memory subsystem")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read a menu option (0 shows the menu, 1 starts the visualizer)
    Menu {
        /// The selected option
        #[arg(long)]
        option: usize,
    },
    /// Start the visualizer with explicit settings
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Number of physical frames
    #[arg(long, default_value_t = 8)]
    frames: usize,

    /// Number of simulated processes
    #[arg(long, default_value_t = 3)]
    processes: u32,

    /// Seed for a reproducible workload
    #[arg(long)]
    seed: Option<u64>,

    /// Render the state after every request instead of only at the end
    #[arg(long)]
    step: bool,

    /// Log every translation step
    #[arg(long)]
    verbose: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            frames: 8,
            processes: 3,
            seed: None,
            step: false,
            verbose: false,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match dispatch(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(args: Args) -> Result<()> {
    match args.command {
        Command::Menu { option } => match option {
            0 => {
                print_menu();
                Ok(())
            }
            1 => run(RunArgs::default()),
            other => Err(CliError::UnknownMenuOption(other)),
        },
        Command::Run(run_args) => run(run_args),
    }
}

fn print_menu() {
    println!("0 - Show this menu");
    println!("1 - Start visualizer");
}

fn run(args: RunArgs) -> Result<()> {
    logger::install(args.verbose);
    log::info!("memory visualizer starting");

    let mut mmu = Mmu::with_config(MmuConfig {
        frame_count: args.frames,
        ..MmuConfig::default()
    });

    let workload = Workload::generate(args.processes, args.seed);
    let processes: Vec<_> = workload.processes().collect();
    for process in &processes {
        mmu.register_process(*process);
    }

    for request in workload.drain_round_robin() {
        log::info!("{}", request.description);
        let frame = mmu.access(&MemoryRequest {
            process: request.process,
            virtual_address: request.virtual_address,
            kind: request.kind,
        })?;
        log::info!(
            "process {}, address {} -> frame {frame}",
            request.process,
            request.virtual_address
        );

        if args.step {
            println!("{}", render::render(&mmu.snapshot()));
        }
    }

    println!("{}", render::render(&mmu.snapshot()));

    let stats = mmu.stats();
    log::info!(
        "run complete: {} hits, {} misses, {} faults",
        stats.tlb_hits,
        stats.tlb_misses,
        stats.page_faults
    );
    Ok(())
}
