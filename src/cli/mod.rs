pub mod check;
pub mod once;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Deletes expired media files from generation output directories")]
pub struct Args {
    /// Run a single scan cycle and exit
    #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with_all = ["check", "print_config"])]
    pub once: bool,
    /// Exit with 0 if a live instance holds the lock file, 1 otherwise
    #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with = "print_config")]
    pub check: bool,
    /// Print the effective configuration as JSON and exit
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub print_config: bool,
}
