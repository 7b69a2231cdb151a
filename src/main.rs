use crate::{
    cli::Args, config::Config, errors::Result, janitor::Janitor, lock::InstanceLock,
    record::human_size,
};
use clap::Parser;
use log::info;

mod cli;
mod config;
mod errors;
mod janitor;
mod lock;
mod logger;
mod record;
mod scheduler;
mod vars;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    // Load environment variables from .env file if it exists
    let dotenv_loaded = dotenvy::dotenv().is_ok();
    // 配置只在启动时读取一次
    let config = Config::from_env()?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else if args.check {
        cli::check::run(&config.lock_file)?;
    } else {
        logger::init();
        if dotenv_loaded {
            info!("loaded .env file");
        }
        if args.once {
            cli::once::run(config)?;
        } else {
            daemon(config).await?;
        }
    }

    Ok(())
}

async fn daemon(config: Config) -> Result<()> {
    // 单实例保护，退出时自动删除锁文件
    let lock = InstanceLock::acquire(config.lock_file.clone())?;
    info!(
        "Acquired instance lock {} (pid {})",
        lock.path().display(),
        std::process::id()
    );

    let janitor = Janitor::new(config);
    let config = janitor.config();
    info!(
        "Janitor watching {} director(ies) for {:?} every {}s, TTL {} minute(s), recording to {}",
        config.output_dirs.len(),
        config
            .patterns
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>(),
        config.interval.as_secs(),
        config.ttl.as_secs() / 60,
        config.log_file.display()
    );
    let interval = config.interval;

    let (stop, shutdown) = scheduler::shutdown_channel();
    tokio::spawn(async move {
        scheduler::shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = stop.send(true);
    });

    let totals = scheduler::run(janitor, interval, shutdown).await;
    info!(
        "Freed {} in total across {} cycle(s)",
        human_size(totals.freed_bytes),
        totals.cycles
    );
    drop(lock);

    Ok(())
}
