use crate::{errors::Result, lock::holder_pid};
use std::path::Path;

/// Probes the lock file for a live instance. Provisioning scripts use the exit code to decide
/// whether a new daemon needs to be started.
pub fn run(lock_file: &Path) -> Result<()> {
    match holder_pid(lock_file)? {
        Some(pid) => {
            println!("Janitor is running (pid {pid})");
            Ok(())
        }
        None => {
            eprintln!("Janitor is not running");
            std::process::exit(1);
        }
    }
}
