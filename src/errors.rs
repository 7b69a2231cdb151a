use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // 配置值无效
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: String,
    },
    // 已有实例在运行
    #[error("another instance is already running (pid {pid}, lock file: {})", lock_file.display())]
    AlreadyRunning { pid: i32, lock_file: PathBuf },
    // 内部通用错误
    #[error("internal error: {0}")]
    Internal(String),
    // 包装 glob::PatternError
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    // 包装 std::io::Error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    // 包装 serde_json::Error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_config(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[macro_export]
macro_rules! fail {
    ($msg:expr) => {
        $crate::errors::Error::Internal(format!($msg))
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::Error::Internal(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! err {
    ($msg:expr) => {
        Err($crate::fail!($msg))
    };
    ($fmt:expr, $($arg:tt)*) => {
        Err($crate::fail!($fmt, $($arg)*))
    };
}
