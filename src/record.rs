//! Append-only deletion records.
//!
//! The record file is the only observable output of the daemon for operators: one line per
//! productive cycle, plus a notice when a watched directory is first found missing.

use chrono::Local;
use log::warn;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct RecordLog {
    path: PathBuf,
}

impl RecordLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RecordLog { path: path.into() }
    }

    pub fn deleted(&self, count: usize, freed_bytes: u64) {
        self.append(&format!(
            "Deleted {count} expired file(s), freed {}",
            human_size(freed_bytes)
        ));
    }

    pub fn missing_dir(&self, dir: &Path) {
        self.append(&format!(
            "Output directory {} does not exist yet, skipping",
            dir.display()
        ));
    }

    // 写入失败只记录诊断日志，不影响清理循环
    fn append(&self, message: &str) {
        let line = format!("[{}] {message}\n", Local::now().format(TIMESTAMP_FORMAT));
        if let Err(e) = self.try_append(&line) {
            warn!(
                "Failed to write deletion record to {}: {e}",
                self.path.display()
            );
        }
    }

    fn try_append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{size:.1} {}", UNITS[unit])
}
