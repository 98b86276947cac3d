//! 多平台静态隐私扫描库
//!
//! 设计要点：
//! - 目录遍历（glob include/exclude + 跳过名单 + 文件上限）产出待扫描文件列表。
//! - Android / iOS / Web 检测器按文件后缀认领文件，以 TOML 规则目录做模式匹配。
//! - 编排层支持串行或按批次有界并行；单文件失败只记告警，不中断整体扫描。
//! - 结果按类别去重合并，计算风险分与合规提示；整份报告按指纹缓存（TTL + 容量淘汰）。

mod aggregate;
mod cache;
mod detectors;
mod error;
mod findings;
mod options;
mod rules;
mod scan;
mod types;
mod walker;

pub use aggregate::{merge_findings, risk_level, risk_score, summarize, SENSITIVE_PERMISSIONS};
pub use detectors::{file_extension, AndroidDetector, Detector, IosDetector, WebDetector};
pub use error::{Result, ScanError};
pub use findings::{Category, Finding};
pub use options::{
    ManagerConfig, ManagerStats, ScanOptions, DEFAULT_EXCLUDE_PATTERNS, DEFAULT_INCLUDE_PATTERNS, DEFAULT_MAX_FILES,
};
pub use rules::PatternCatalog;
pub use scan::ScannerManager;
pub use types::{DataFlow, Dependency, HtmlAnalysis, HtmlAssets, MergedFindings, ProjectFile, Report, RiskLevel, Summary};
pub use walker::{collect_project_files, should_skip_directory, Glob, GlobSet, WalkOptions, SKIP_DIRECTORIES};
