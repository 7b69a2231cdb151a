//! Single-instance guard backed by a pid file.
//!
//! The guard lives in the entry point, outside the cleanup loop. A lock file naming a dead
//! process (or holding garbage) is considered stale and replaced.

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, warn};
use nix::{errno::Errno, sys::signal::kill, unistd::Pid};

use crate::{
    err,
    errors::{Error, Result},
};

#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let pid = std::process::id();

        // 遇到陈旧锁文件时移除后重试
        for _ in 0..3 {
            match create_exclusive(&path, pid) {
                Ok(()) => {
                    debug!("Acquired instance lock {} (pid {pid})", path.display());
                    return Ok(InstanceLock { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let Some(stale) = read_lock(&path)? else {
                        continue;
                    };
                    // 自身 pid 说明是上次异常退出后残留的锁（容器重启常复用 pid）
                    if let Some(holder) = live_pid(&stale)
                        && holder != pid as i32
                    {
                        return Err(Error::AlreadyRunning {
                            pid: holder,
                            lock_file: path,
                        });
                    }
                    // 内容已变化说明另一启动者刚替换了锁，重新检查
                    if read_lock(&path)?.as_deref() != Some(stale.as_str()) {
                        continue;
                    }
                    warn!("Removing stale lock file {}", path.display());
                    match fs::remove_file(&path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::NotFound => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        err!(
            "failed to acquire instance lock {}: contended",
            path.display()
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove lock file {}: {e}", self.path.display());
        }
    }
}

fn create_exclusive(path: &Path, pid: u32) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    writeln!(file, "{pid}")
}

fn read_lock(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn live_pid(content: &str) -> Option<i32> {
    let pid = content.trim().parse::<i32>().ok()?;
    (pid > 0 && is_alive(pid)).then_some(pid)
}

/// Returns the pid recorded in the lock file if that process is still alive.
pub fn holder_pid(path: &Path) -> Result<Option<i32>> {
    Ok(read_lock(path)?.as_deref().and_then(live_pid))
}

// 信号 0 只做存在性检查；EPERM 表示进程存在但属于其他用户
fn is_alive(pid: i32) -> bool {
    matches!(kill(Pid::from_raw(pid), None), Ok(()) | Err(Errno::EPERM))
}
