//! 公共类型（对外暴露）
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// 遍历阶段产生的项目文件（不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    /// 绝对路径
    pub path: PathBuf,
    /// 文件名
    pub name: String,
    /// 相对扫描根目录的路径，统一使用 `/` 分隔
    pub relative_path: String,
}

/// 依赖声明（gradle / Podfile / package.json）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// HTML 文件中的外部资源
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlAnalysis {
    pub external_scripts: Vec<String>,
    pub meta_tags: Vec<String>,
    pub iframes: Vec<String>,
}

impl HtmlAnalysis {
    pub fn is_empty(&self) -> bool {
        self.external_scripts.is_empty() && self.meta_tags.is_empty() && self.iframes.is_empty()
    }
}

/// 项目级 HTML 资源汇总（去重）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlAssets {
    pub external_scripts: BTreeSet<String>,
    pub meta_tags: BTreeSet<String>,
    pub iframes: BTreeSet<String>,
}

/// 合并后的项目级命中集合
/// - `scanners` 保留贡献顺序（允许重复）
/// - 其余集合去重，序列化时按字典序输出
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedFindings {
    pub scanners: Vec<String>,
    pub permissions: BTreeSet<String>,
    pub apis: BTreeSet<String>,
    pub third_party_services: BTreeSet<String>,
    pub data_collection: BTreeSet<String>,
    pub storage: BTreeSet<String>,
    pub tracking: BTreeSet<String>,
    pub web_apis: BTreeSet<String>,
    /// 各文件依赖直接拼接，不去重
    pub dependencies: Vec<Dependency>,
    pub html_assets: HtmlAssets,
}

/// 隐私风险等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// 数据流向推断
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlow {
    pub collects_personal_data: bool,
    pub shares_with_third_parties: bool,
    pub uses_tracking: bool,
    pub stores_locally: bool,
}

/// 风险摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub privacy_risk_level: RiskLevel,
    pub risk_score: f64,
    pub main_features: Vec<String>,
    pub compliance_hints: Vec<String>,
    pub data_flow: DataFlow,
}

/// 项目级扫描报告（可直接序列化为 JSON）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub scan_id: String,
    pub project_path: PathBuf,
    /// 扫描开始时间（Unix 毫秒）
    pub started_at: u64,
    /// 遍历得到的文件数
    pub total_files: usize,
    /// 产生了非空命中的文件数
    pub files_scanned: usize,
    pub duration_ms: u64,
    #[serde(flatten)]
    pub findings: MergedFindings,
    /// 单文件读取/解码问题（不致命）
    pub warnings: Vec<String>,
    pub summary: Summary,
}
