// CLI module
// Server configuration from arguments and environment

mod args;

pub use args::{LogFormat, ServerArgs};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// Values not given on the command line are read from `LEDGER_*` environment
/// variables, then from defaults. On invalid arguments or `--help`, clap
/// prints a message and exits the process.
pub fn parse_args() -> ServerArgs {
    ServerArgs::parse()
}
