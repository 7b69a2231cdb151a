use std::{
    collections::{BTreeSet, HashSet},
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use log::{debug, info};
use walkdir::WalkDir;

use crate::{config::Config, record::RecordLog};

/// A matched file old enough to be deleted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Candidate {
    pub path: PathBuf,
}

/// Tally of one scan cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    // 成功删除的文件数
    pub deleted: usize,
    // 释放的字节数
    pub freed_bytes: u64,
    // 删除失败（已消失、无权限等）而跳过的文件数
    pub skipped: usize,
    // 本轮不存在的监视目录数
    pub missing_dirs: usize,
}

#[derive(Debug)]
pub struct Janitor {
    config: Config,
    records: RecordLog,
    // 已记录过缺失的目录，目录重新出现后移除
    noted_missing: HashSet<PathBuf>,
}

impl Janitor {
    pub fn new(config: Config) -> Self {
        let records = RecordLog::new(config.log_file.clone());
        Janitor {
            config,
            records,
            noted_missing: HashSet::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one full cycle: enumerate, delete, and record the summary.
    pub fn sweep(&mut self) -> SweepReport {
        self.sweep_at(SystemTime::now())
    }

    pub fn sweep_at(&mut self, now: SystemTime) -> SweepReport {
        let (candidates, missing_dirs) = self.collect_candidates(now);
        let mut report = purge(&candidates);
        report.missing_dirs = missing_dirs;

        if report.deleted > 0 {
            info!(
                "Cleaned up {} expired file(s), freed {} bytes",
                report.deleted, report.freed_bytes
            );
            self.records.deleted(report.deleted, report.freed_bytes);
        } else {
            debug!("No expired files to clean up");
        }

        report
    }

    /// Scans every watched directory and returns the de-duplicated candidates along with the
    /// number of directories that were missing.
    pub fn collect_candidates(&mut self, now: SystemTime) -> (Vec<Candidate>, usize) {
        let mut found = BTreeSet::new();
        let mut missing = 0;

        for dir in &self.config.output_dirs {
            if !dir.is_dir() {
                missing += 1;
                if self.noted_missing.insert(dir.clone()) {
                    info!("Output directory {} does not exist, skipping", dir.display());
                    self.records.missing_dir(dir);
                }
                continue;
            }
            if self.noted_missing.remove(dir) {
                info!("Output directory {} is now available", dir.display());
            }

            scan_dir(&self.config, dir, now, &mut found);
        }

        (found.into_iter().collect(), missing)
    }
}

fn scan_dir(config: &Config, dir: &Path, now: SystemTime, found: &mut BTreeSet<Candidate>) {
    let mut walker = WalkDir::new(dir).min_depth(1);
    if !config.recursive {
        walker = walker.max_depth(1);
    }

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry under {}: {e}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !config.matches(name) {
            continue;
        }
        if is_expired(entry.path(), config, now) {
            found.insert(Candidate {
                path: entry.into_path(),
            });
        }
    }
}

fn is_expired(path: &Path, config: &Config, now: SystemTime) -> bool {
    let modified = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(time) => time,
        Err(_) => return false,
    };

    // 修改时间在未来（时钟问题）时保守起见不删除
    match now.duration_since(modified) {
        Ok(age) => age > config.ttl,
        Err(_) => false,
    }
}

/// Deletes the given candidates. Files that vanished or cannot be removed are skipped silently.
pub fn purge(candidates: &[Candidate]) -> SweepReport {
    let mut report = SweepReport::default();

    for candidate in candidates {
        // 删除前读取大小，删除后无法获取
        let size = match fs::symlink_metadata(&candidate.path) {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            _ => {
                report.skipped += 1;
                continue;
            }
        };
        match fs::remove_file(&candidate.path) {
            Ok(()) => {
                debug!("Deleted expired file: {}", candidate.path.display());
                report.deleted += 1;
                report.freed_bytes += size;
            }
            Err(e) => {
                debug!("Skipped {}: {e}", candidate.path.display());
                report.skipped += 1;
            }
        }
    }

    report
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{RawConfig, tests::raw};
    use std::{fs::File, time::Duration};
    use tempfile::TempDir;

    pub(crate) fn minutes_ago(now: SystemTime, minutes: u64) -> SystemTime {
        now - Duration::from_secs(minutes * 60)
    }

    pub(crate) fn touch(path: &Path, modified: SystemTime, len: usize) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![0u8; len]).unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
    }

    pub(crate) fn config_for(dirs: &str, log_file: &Path, recursive: bool) -> Config {
        let log_file = log_file.to_str().unwrap();
        Config::try_from(RawConfig {
            output_dirs: dirs,
            log_file,
            recursive: if recursive { "true" } else { "false" },
            ..raw()
        })
        .unwrap()
    }

    struct Fixture {
        _root: TempDir,
        output: PathBuf,
        log_file: PathBuf,
        janitor: Janitor,
    }

    fn fixture(recursive: bool) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("output");
        fs::create_dir_all(&output).unwrap();
        let log_file = root.path().join("janitor.log");
        let janitor = Janitor::new(config_for(
            output.to_str().unwrap(),
            &log_file,
            recursive,
        ));

        Fixture {
            _root: root,
            output,
            log_file,
            janitor,
        }
    }

    fn log_lines(path: &Path) -> Vec<String> {
        match fs::read_to_string(path) {
            Ok(content) => content.lines().map(String::from).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn test_expired_only_matching() {
        let mut f = fixture(true);
        let now = SystemTime::now();
        touch(&f.output.join("a.mp4"), minutes_ago(now, 15), 100);
        touch(&f.output.join("b.mp4"), minutes_ago(now, 5), 100);
        touch(&f.output.join("c.txt"), minutes_ago(now, 20), 100);

        let report = f.janitor.sweep_at(now);

        assert_eq!(report.deleted, 1);
        assert_eq!(report.freed_bytes, 100);
        assert!(!f.output.join("a.mp4").exists());
        assert!(f.output.join("b.mp4").exists());
        assert!(f.output.join("c.txt").exists());
        let lines = log_lines(&f.log_file);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Deleted 1 expired file(s)"));
    }

    #[test]
    fn test_second_sweep_is_idle() {
        let mut f = fixture(true);
        let now = SystemTime::now();
        touch(&f.output.join("x.mp4"), minutes_ago(now, 30), 10);
        touch(&f.output.join("y.webm"), minutes_ago(now, 30), 20);

        let first = f.janitor.sweep_at(now);
        let second = f.janitor.sweep_at(now);

        assert_eq!(first.deleted, 2);
        assert_eq!(first.freed_bytes, 30);
        assert_eq!(second, SweepReport::default());
        // 空闲轮次不写记录
        assert_eq!(log_lines(&f.log_file).len(), 1);
    }

    #[test]
    fn test_young_and_future_files_kept() {
        let mut f = fixture(true);
        let now = SystemTime::now();
        touch(&f.output.join("young.mp4"), minutes_ago(now, 9), 1);
        touch(&f.output.join("future.mp4"), now + Duration::from_secs(3600), 1);

        let report = f.janitor.sweep_at(now);

        assert_eq!(report.deleted, 0);
        assert!(f.output.join("young.mp4").exists());
        assert!(f.output.join("future.mp4").exists());
        assert!(log_lines(&f.log_file).is_empty());
    }

    #[test]
    fn test_exactly_ttl_old_is_kept() {
        let mut f = fixture(true);
        let now = SystemTime::now();
        // 恰好等于 TTL 不算过期，超过 1 秒才删除
        touch(&f.output.join("edge.mp4"), minutes_ago(now, 10), 1);
        touch(
            &f.output.join("over.mp4"),
            minutes_ago(now, 10) - Duration::from_secs(1),
            2,
        );

        let report = f.janitor.sweep_at(now);

        assert_eq!(report.deleted, 1);
        assert_eq!(report.freed_bytes, 2);
        assert!(f.output.join("edge.mp4").exists());
        assert!(!f.output.join("over.mp4").exists());
    }

    #[test]
    fn test_recursive_and_flat() {
        let now = SystemTime::now();

        let mut recursive = fixture(true);
        touch(&recursive.output.join("video/deep.mp4"), minutes_ago(now, 60), 1);
        assert_eq!(recursive.janitor.sweep_at(now).deleted, 1);
        assert!(!recursive.output.join("video/deep.mp4").exists());
        // 目录本身保留
        assert!(recursive.output.join("video").is_dir());

        let mut flat = fixture(false);
        touch(&flat.output.join("video/deep.mp4"), minutes_ago(now, 60), 1);
        touch(&flat.output.join("top.mp4"), minutes_ago(now, 60), 1);
        assert_eq!(flat.janitor.sweep_at(now).deleted, 1);
        assert!(flat.output.join("video/deep.mp4").exists());
        assert!(!flat.output.join("top.mp4").exists());
    }

    #[test]
    fn test_missing_dir_then_created() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("not-yet");
        let log_file = root.path().join("janitor.log");
        let mut janitor = Janitor::new(config_for(output.to_str().unwrap(), &log_file, true));
        let now = SystemTime::now();

        let report = janitor.sweep_at(now);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.missing_dirs, 1);
        // 缺失只记录一次
        janitor.sweep_at(now);
        let lines = log_lines(&log_file);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("does not exist yet"));

        touch(&output.join("late.mp4"), minutes_ago(now, 11), 5);
        let report = janitor.sweep_at(now);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.missing_dirs, 0);
        assert!(!output.join("late.mp4").exists());
    }

    #[test]
    fn test_overlapping_dirs_delete_once() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("output");
        let nested = output.join("video");
        let dirs = format!("{},{}", output.display(), nested.display());
        let log_file = root.path().join("janitor.log");
        let mut janitor = Janitor::new(config_for(&dirs, &log_file, true));
        let now = SystemTime::now();
        touch(&nested.join("clip.mp4"), minutes_ago(now, 20), 7);

        let (candidates, _) = janitor.collect_candidates(now);
        assert_eq!(candidates.len(), 1);

        let report = janitor.sweep_at(now);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn test_vanished_between_scan_and_delete() {
        let mut f = fixture(true);
        let now = SystemTime::now();
        touch(&f.output.join("gone.mp4"), minutes_ago(now, 20), 3);
        touch(&f.output.join("kept.mp4"), minutes_ago(now, 20), 4);

        let (candidates, _) = f.janitor.collect_candidates(now);
        assert_eq!(candidates.len(), 2);
        // 模拟其他进程抢先删除
        fs::remove_file(f.output.join("gone.mp4")).unwrap();

        let report = purge(&candidates);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.freed_bytes, 4);
        assert_eq!(report.skipped, 1);
        assert!(!f.output.join("kept.mp4").exists());
    }

    #[test]
    fn test_replaced_by_directory_is_skipped() {
        let mut f = fixture(true);
        let now = SystemTime::now();
        let path = f.output.join("odd.mp4");
        touch(&path, minutes_ago(now, 20), 1);

        let (candidates, _) = f.janitor.collect_candidates(now);
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let report = purge(&candidates);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.skipped, 1);
        assert!(path.is_dir());
    }
}
