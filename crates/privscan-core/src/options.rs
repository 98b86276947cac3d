//! 扫描选项与管理器配置（模块）
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};

/// 默认 include 模式：常见源码/配置扩展名 + Podfile
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &[
    "**/*.{js,mjs,ts,jsx,tsx,vue,svelte,html,htm,xhtml,css,scss,less,json,java,kt,kts,gradle,xml,swift,m,h,plist}",
    "**/Podfile",
];

/// 默认 exclude 模式：依赖、构建产物与 VCS 目录
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
    "**/.git/**",
];

/// 默认最大文件数
pub const DEFAULT_MAX_FILES: usize = 1000;

/// 单次扫描选项（每次调用 `scan_project` 传入）
/// - 反序列化时使用 camelCase 键名，未知键忽略
/// - `None` 表示使用默认值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanOptions {
    /// 忽略缓存，强制重新扫描（结果会覆盖缓存）
    pub force_rescan: bool,
    pub include_patterns: Option<Vec<String>>,
    pub exclude_patterns: Option<Vec<String>>,
    pub max_files: Option<usize>,
}

/// 归一化后的选项：补全默认值，且不含 force_rescan。
/// 用于 ScanID 指纹，保证强制扫描与普通扫描落在同一缓存槽位。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct NormalizedOptions {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_files: usize,
}

impl ScanOptions {
    pub(crate) fn normalized(&self) -> NormalizedOptions {
        let or_default = |v: &Option<Vec<String>>, d: &[&str]| match v {
            Some(v) => v.clone(),
            None => d.iter().map(|s| s.to_string()).collect(),
        };
        NormalizedOptions {
            include_patterns: or_default(&self.include_patterns, DEFAULT_INCLUDE_PATTERNS),
            exclude_patterns: or_default(&self.exclude_patterns, DEFAULT_EXCLUDE_PATTERNS),
            max_files: self.max_files.unwrap_or(DEFAULT_MAX_FILES),
        }
    }
}

/// 扫描管理器配置（构造 `ScannerManager` 时使用，可从 TOML 加载）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// 是否启用批次并行扫描
    pub enable_parallel_scanning: bool,
    /// 每批并发扫描的文件数（亦即线程池大小）
    pub max_concurrent_scans: usize,
    /// 缓存条目存活时间（毫秒）
    pub cache_ttl_ms: u64,
    /// 缓存容量（条目数），超出后淘汰最早插入的条目
    pub cache_capacity: usize,
    /// 最大文件大小（字节）；超过则跳过并记为告警
    pub max_file_size: Option<u64>,
    /// 规则目录：其中的 android.toml / ios.toml / web.toml 覆盖内置规则
    pub rules_dir: Option<PathBuf>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            enable_parallel_scanning: true,
            max_concurrent_scans: 3,
            cache_ttl_ms: 300_000,
            cache_capacity: 100,
            max_file_size: None,
            rules_dir: None,
        }
    }
}

impl ManagerConfig {
    /// 从 TOML 文件加载；文件不存在时返回默认配置
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let txt = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
        let cfg: ManagerConfig = toml::from_str(&txt).map_err(|source| ScanError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_scans == 0 {
            return Err(ScanError::InvalidConfig("max_concurrent_scans must be at least 1".into()));
        }
        if self.cache_capacity == 0 {
            return Err(ScanError::InvalidConfig("cache_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

/// 管理器统计信息（便于 CLI 打印）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerStats {
    pub total_detectors: usize,
    pub detector_names: Vec<String>,
    pub cached_scans: usize,
    pub parallel_scanning: bool,
    pub max_concurrent_scans: usize,
}
