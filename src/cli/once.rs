use crate::{
    config::Config,
    errors::{Error, Result},
    janitor::{Janitor, SweepReport},
    lock::holder_pid,
    record::human_size,
};

pub fn run(config: Config) -> Result<()> {
    println!("Running cleanup...");
    let report = sweep_unless_running(config)?;

    println!(
        "Cleanup completed. Deleted: {}, freed: {}, skipped: {}, missing directories: {}",
        report.deleted,
        human_size(report.freed_bytes),
        report.skipped,
        report.missing_dirs
    );

    Ok(())
}

// 守护进程运行中时拒绝执行，避免两个扫描者同时删除
fn sweep_unless_running(config: Config) -> Result<SweepReport> {
    if let Some(pid) = holder_pid(&config.lock_file)? {
        return Err(Error::AlreadyRunning {
            pid,
            lock_file: config.lock_file,
        });
    }

    Ok(Janitor::new(config).sweep())
}
