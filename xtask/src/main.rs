// Desktop/tooling crate — unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod cargo;
mod check;
mod emulate;
mod flash;
mod test;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "SPI DMA loopback harness development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flash the harness to the Nucleo-H743ZI via probe-rs
    Flash {
        /// Build and flash release version
        #[arg(short, long)]
        release: bool,
        /// Kernel command line baked into the image (e.g. "loglevel=3")
        #[arg(long, default_value = "")]
        cmdline: String,
        /// defmt strings compiled in; `loglevel=` filters the rest at runtime
        #[arg(long, default_value = "debug")]
        defmt_log: String,
    },
    /// Run the harness on the host against the loopback SPI mock
    Emulate {
        /// Kernel command line passed to the emulator
        #[arg(long, default_value = "")]
        cmdline: String,
        /// tracing filter (RUST_LOG syntax)
        #[arg(long, default_value = "info")]
        log: String,
    },
    /// Check the hardware image, the emulator and the no_std trait crate
    Check,
    /// Run the host test suites
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
        /// Also build the release image and verify its DMA buffer placement
        #[arg(long)]
        elf: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Flash {
            release,
            cmdline,
            defmt_log,
        } => flash::run(release, &cmdline, &defmt_log),
        Commands::Emulate { cmdline, log } => emulate::run(&cmdline, &log),
        Commands::Check => check::run(),
        Commands::Test {
            unit,
            integration,
            elf,
        } => test::run(unit, integration, elf),
    }
}
