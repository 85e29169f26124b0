// CLI module
// Command-line interface and argument parsing

mod args;

pub use args::{CliArgs, StrategyType};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// Flags not given on the command line fall back to their `BANK_LEDGER_*`
/// environment variables. If parsing fails (invalid arguments, missing input
/// or `--help`), clap prints the message and exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
