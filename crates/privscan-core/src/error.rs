//! 错误类型
use std::path::PathBuf;
use thiserror::Error;

/// 扫描库统一错误
///
/// 只有编排层面的失败（非法 glob、选项指纹失败）会从 `scan_project` 返回；
/// 单文件、单目录的问题在内部记录后吞掉。
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid glob pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid rule `{tag}` in catalog {catalog}: {source}")]
    InvalidRule {
        catalog: String,
        tag: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to parse catalog {name}: {source}")]
    Catalog {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not UTF-8 text")]
    Undecodable { path: PathBuf },

    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("failed to fingerprint scan options: {0}")]
    Fingerprint(#[from] serde_json::Error),

    #[error("failed to build scan thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
