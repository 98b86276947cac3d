//! 单文件命中（检测器输出，仅供聚合器消费）
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{Dependency, HtmlAnalysis};

/// 命中类别
/// `ThirdPartyLibs` 是检测器侧的别名类别，合并时并入 `ThirdPartyServices`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Permissions,
    Apis,
    ThirdPartyServices,
    ThirdPartyLibs,
    DataCollection,
    Storage,
    Tracking,
    WebApis,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Permissions,
        Category::Apis,
        Category::ThirdPartyServices,
        Category::ThirdPartyLibs,
        Category::DataCollection,
        Category::Storage,
        Category::Tracking,
        Category::WebApis,
    ];
}

/// 单个检测器对单个文件的命中结果
/// 各类别内标签有序且不重复
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub scanner: String,
    pub file_path: PathBuf,
    pub permissions: Vec<String>,
    pub apis: Vec<String>,
    pub third_party_services: Vec<String>,
    pub third_party_libs: Vec<String>,
    pub data_collection: Vec<String>,
    pub storage: Vec<String>,
    pub tracking: Vec<String>,
    pub web_apis: Vec<String>,
    pub dependencies: Vec<Dependency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_analysis: Option<HtmlAnalysis>,
}

impl Finding {
    pub fn new(scanner: &str, path: &Path) -> Self {
        Self { scanner: scanner.to_string(), file_path: path.to_path_buf(), ..Default::default() }
    }

    pub fn category(&self, c: Category) -> &[String] {
        match c {
            Category::Permissions => &self.permissions,
            Category::Apis => &self.apis,
            Category::ThirdPartyServices => &self.third_party_services,
            Category::ThirdPartyLibs => &self.third_party_libs,
            Category::DataCollection => &self.data_collection,
            Category::Storage => &self.storage,
            Category::Tracking => &self.tracking,
            Category::WebApis => &self.web_apis,
        }
    }

    pub fn category_mut(&mut self, c: Category) -> &mut Vec<String> {
        match c {
            Category::Permissions => &mut self.permissions,
            Category::Apis => &mut self.apis,
            Category::ThirdPartyServices => &mut self.third_party_services,
            Category::ThirdPartyLibs => &mut self.third_party_libs,
            Category::DataCollection => &mut self.data_collection,
            Category::Storage => &mut self.storage,
            Category::Tracking => &mut self.tracking,
            Category::WebApis => &mut self.web_apis,
        }
    }

    /// 追加标签（类别内去重）
    pub fn push_tag(&mut self, c: Category, tag: &str) {
        let list = self.category_mut(c);
        if !list.iter().any(|t| t == tag) {
            list.push(tag.to_string());
        }
    }

    /// 是否含有任何信号；全空的结果在合并前被丢弃
    pub fn has_signal(&self) -> bool {
        Category::ALL.iter().any(|&c| !self.category(c).is_empty())
            || !self.dependencies.is_empty()
            || self.html_analysis.as_ref().is_some_and(|h| !h.is_empty())
    }
}
