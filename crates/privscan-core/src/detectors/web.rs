//! Web 检测器（含 React Native / Flutter Web 前端代码）
use regex::Regex;
use std::path::Path;
use tracing::debug;

use super::{file_extension, file_name_of, Detector};
use crate::error::{Result, ScanError};
use crate::findings::{Category, Finding};
use crate::rules::{PatternCatalog, BUILTIN_WEB};
use crate::types::{Dependency, HtmlAnalysis};

const GOOGLE_ANALYTICS: &str = "GOOGLE_ANALYTICS";

const SCRIPT_SRC: &str = r#"(?i)<script[^>]*src=["']([^"']+)["']"#;
const META_TAG: &str = r#"(?i)<meta[^>]*>"#;
const IFRAME_SRC: &str = r#"(?i)<iframe[^>]*src=["']([^"']+)["']"#;

/// HTML 资源提取用的正则
struct HtmlPatterns {
    script: Regex,
    meta: Regex,
    iframe: Regex,
}

/// 扫描 JS/TS/HTML/CSS/JSON 等前端文件
pub struct WebDetector {
    catalog: PatternCatalog,
    html: HtmlPatterns,
}

impl WebDetector {
    pub fn new(catalog: PatternCatalog) -> Result<Self> {
        let compile = |tag: &str, pat: &str| {
            Regex::new(pat).map_err(|source| ScanError::InvalidRule {
                catalog: catalog.name().to_string(),
                tag: tag.to_string(),
                source,
            })
        };
        let html = HtmlPatterns {
            script: compile("HTML_SCRIPT", SCRIPT_SRC)?,
            meta: compile("HTML_META", META_TAG)?,
            iframe: compile("HTML_IFRAME", IFRAME_SRC)?,
        };
        Ok(Self { catalog, html })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(PatternCatalog::from_toml(BUILTIN_WEB, "web.toml")?)
    }

    fn html_analysis(&self, content: &str) -> HtmlAnalysis {
        let group1 = |re: &Regex| -> Vec<String> {
            re.captures_iter(content)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .collect()
        };
        HtmlAnalysis {
            external_scripts: group1(&self.html.script),
            meta_tags: self.html.meta.find_iter(content).map(|m| m.as_str().to_string()).collect(),
            iframes: group1(&self.html.iframe),
        }
    }
}

/// 解析 package.json 的 dependencies + devDependencies
/// 同名包以 devDependencies 的版本为准；JSON 非法时返回空列表
fn package_json_dependencies(content: &str) -> Vec<Dependency> {
    let parsed: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };
    let mut deps: Vec<Dependency> = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        let Some(map) = parsed.get(section).and_then(|v| v.as_object()) else { continue };
        for (name, version) in map {
            let version = version.as_str().map(str::to_string);
            match deps.iter_mut().find(|d| d.name == *name) {
                Some(existing) => existing.version = version,
                None => deps.push(Dependency { name: name.clone(), version }),
            }
        }
    }
    deps
}

impl Detector for WebDetector {
    fn name(&self) -> &str { self.catalog.name() }

    fn extensions(&self) -> &[String] { self.catalog.extensions() }

    fn scan(&self, content: &str, path: &Path) -> Finding {
        let mut finding = Finding::new(self.name(), path);
        self.catalog.apply(content, path, &mut finding);

        // 检测到 GA 跟踪时，GA 同时视为第三方服务（置于首位）
        if finding.tracking.iter().any(|t| t == GOOGLE_ANALYTICS)
            && !finding.third_party_services.iter().any(|s| s == GOOGLE_ANALYTICS)
        {
            finding.third_party_services.insert(0, GOOGLE_ANALYTICS.to_string());
        }

        let file_name = file_name_of(path);
        if matches!(file_extension(file_name).as_str(), "html" | "htm" | "xhtml") {
            finding.html_analysis = Some(self.html_analysis(content));
        }
        if file_name == "package.json" {
            finding.dependencies = package_json_dependencies(content);
        }

        // 由 Web API 推断权限
        if finding.web_apis.iter().any(|a| a == "CAMERA") {
            finding.push_tag(Category::Permissions, "CAMERA");
        }
        if finding.web_apis.iter().any(|a| a.contains("GEOLOCATION")) {
            finding.push_tag(Category::Permissions, "LOCATION");
        }

        debug!(
            path = %path.display(),
            web_apis = finding.web_apis.len(),
            tracking = finding.tracking.len(),
            services = finding.third_party_services.len(),
            "web scan done"
        );
        finding
    }
}
