use crate::{
    errors::{Error, Result},
    vars::{
        JANITOR_INTERVAL_SECS, JANITOR_LOCK_FILE, JANITOR_LOG_FILE, JANITOR_OUTPUT_DIRS,
        JANITOR_PATTERNS, JANITOR_RECURSIVE, JANITOR_TTL_MINUTES,
    },
};
use glob::Pattern;
use serde::{Serialize, Serializer};
use std::{path::PathBuf, time::Duration};

/// Raw, unvalidated configuration values as they come from the environment.
#[derive(Debug, Clone, Copy)]
pub struct RawConfig<'a> {
    pub ttl_minutes: &'a str,
    pub interval_secs: &'a str,
    pub output_dirs: &'a str,
    pub patterns: &'a str,
    pub log_file: &'a str,
    pub recursive: &'a str,
    pub lock_file: &'a str,
}

impl RawConfig<'static> {
    pub fn from_env() -> Self {
        RawConfig {
            ttl_minutes: *JANITOR_TTL_MINUTES,
            interval_secs: *JANITOR_INTERVAL_SECS,
            output_dirs: *JANITOR_OUTPUT_DIRS,
            patterns: *JANITOR_PATTERNS,
            log_file: *JANITOR_LOG_FILE,
            recursive: *JANITOR_RECURSIVE,
            lock_file: *JANITOR_LOCK_FILE,
        }
    }
}

/// Cleanup configuration, fixed for the lifetime of the process.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    #[serde(rename = "ttl_secs", serialize_with = "as_secs")]
    pub ttl: Duration,
    #[serde(rename = "interval_secs", serialize_with = "as_secs")]
    pub interval: Duration,
    pub output_dirs: Vec<PathBuf>,
    #[serde(serialize_with = "as_strs")]
    pub patterns: Vec<Pattern>,
    pub log_file: PathBuf,
    pub recursive: bool,
    pub lock_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::try_from(RawConfig::from_env())
    }

    /// 文件名是否匹配任一模式
    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(file_name))
    }
}

impl TryFrom<RawConfig<'_>> for Config {
    type Error = Error;

    fn try_from(raw: RawConfig<'_>) -> Result<Self> {
        let ttl_minutes = parse_positive("JANITOR_TTL_MINUTES", raw.ttl_minutes)?;
        let interval_secs = parse_positive("JANITOR_INTERVAL_SECS", raw.interval_secs)?;

        let output_dirs = split_list(raw.output_dirs, &[':', ','])
            .map(PathBuf::from)
            .collect::<Vec<_>>();
        if output_dirs.is_empty() {
            return Err(Error::invalid_config(
                "JANITOR_OUTPUT_DIRS",
                raw.output_dirs,
                "at least one directory is required",
            ));
        }

        let patterns = split_list(raw.patterns, &[','])
            .map(Pattern::new)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if patterns.is_empty() {
            return Err(Error::invalid_config(
                "JANITOR_PATTERNS",
                raw.patterns,
                "at least one pattern is required",
            ));
        }

        let log_file = raw.log_file.trim();
        if log_file.is_empty() {
            return Err(Error::invalid_config(
                "JANITOR_LOG_FILE",
                raw.log_file,
                "path must not be empty",
            ));
        }

        let lock_file = raw.lock_file.trim();
        if lock_file.is_empty() {
            return Err(Error::invalid_config(
                "JANITOR_LOCK_FILE",
                raw.lock_file,
                "path must not be empty",
            ));
        }

        let ttl_secs = ttl_minutes.checked_mul(60).ok_or_else(|| {
            Error::invalid_config("JANITOR_TTL_MINUTES", raw.ttl_minutes, "value too large")
        })?;

        Ok(Config {
            ttl: Duration::from_secs(ttl_secs),
            interval: Duration::from_secs(interval_secs),
            output_dirs,
            patterns,
            log_file: PathBuf::from(log_file),
            recursive: parse_bool("JANITOR_RECURSIVE", raw.recursive)?,
            lock_file: PathBuf::from(lock_file),
        })
    }
}

fn split_list<'a>(value: &'a str, separators: &'a [char]) -> impl Iterator<Item = &'a str> {
    value
        .split(separators)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(Error::invalid_config(key, value, "must be greater than zero")),
        Ok(n) => Ok(n),
        Err(e) => Err(Error::invalid_config(key, value, e.to_string())),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::invalid_config(key, value, "expected true or false")),
    }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_secs())
}

fn as_strs<S: Serializer>(
    patterns: &[Pattern],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(patterns.iter().map(Pattern::as_str))
}
