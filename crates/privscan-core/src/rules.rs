//! 规则目录加载（TOML）
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, ScanError};
use crate::findings::{Category, Finding};

/// 内置规则目录（随库编译）
pub(crate) const BUILTIN_ANDROID: &str = include_str!("../rules/android.toml");
pub(crate) const BUILTIN_IOS: &str = include_str!("../rules/ios.toml");
pub(crate) const BUILTIN_WEB: &str = include_str!("../rules/web.toml");

/// 单条规则的配置
#[derive(Debug, Clone, Deserialize)]
struct RuleEntry {
    category: Category,
    tag: String,
    pattern: String,
    /// 仅对该文件名生效（大小写不敏感）
    #[serde(default)]
    only_in: Option<String>,
}

/// 顶层规则文件结构
#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    name: String,
    #[serde(default)]
    extensions: Vec<String>,
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

/// 编译后的规则
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub(crate) category: Category,
    pub(crate) tag: String,
    pub(crate) regex: Regex,
    pub(crate) only_in: Option<String>,
}

/// 编译后的规则目录：检测器构造时注入，之后只读
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    pub(crate) name: String,
    pub(crate) extensions: Vec<String>,
    pub(crate) rules: Vec<CompiledRule>,
}

impl PatternCatalog {
    /// 从 TOML 文本解析并编译（所有模式大小写不敏感）
    pub fn from_toml(txt: &str, origin: &str) -> Result<Self> {
        let parsed: CatalogFile = toml::from_str(txt).map_err(|source| ScanError::Catalog {
            name: origin.to_string(),
            source,
        })?;
        let mut rules = Vec::with_capacity(parsed.rules.len());
        for e in parsed.rules {
            let regex = RegexBuilder::new(&e.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| ScanError::InvalidRule {
                    catalog: parsed.name.clone(),
                    tag: e.tag.clone(),
                    source,
                })?;
            rules.push(CompiledRule { category: e.category, tag: e.tag, regex, only_in: e.only_in });
        }
        let extensions = parsed.extensions.iter().map(|e| e.to_lowercase()).collect();
        Ok(Self { name: parsed.name, extensions, rules })
    }

    /// 从规则文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let txt = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
        Self::from_toml(&txt, &path.display().to_string())
    }

    /// 优先从 `dir/<file>` 加载，不存在则使用内置文本
    pub(crate) fn load_or_builtin(dir: Option<&Path>, file: &str, builtin: &str) -> Result<Self> {
        if let Some(dir) = dir {
            let p = dir.join(file);
            if p.is_file() {
                return Self::load(&p);
            }
        }
        Self::from_toml(builtin, file)
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn extensions(&self) -> &[String] { &self.extensions }

    /// 依次执行规则，将命中标签写入 `finding`（保持规则顺序）
    pub(crate) fn apply(&self, content: &str, path: &Path, finding: &mut Finding) {
        let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        for rule in &self.rules {
            if let Some(only) = &rule.only_in {
                if !file_name.eq_ignore_ascii_case(only) { continue; }
            }
            if rule.regex.is_match(content) {
                finding.push_tag(rule.category, &rule.tag);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalogs_compile() {
        for (txt, name) in [(BUILTIN_ANDROID, "android"), (BUILTIN_IOS, "ios"), (BUILTIN_WEB, "web")] {
            let c = PatternCatalog::from_toml(txt, name).unwrap();
            assert!(!c.rules.is_empty(), "{name} has no rules");
            assert!(!c.extensions.is_empty(), "{name} has no extensions");
        }
    }

    #[test]
    fn only_in_restricts_rule_to_file_name() {
        let txt = r#"
            name = "T"
            extensions = ["xml"]
            [[rules]]
            category = "data_collection"
            tag = "NETWORK_ACCESS"
            pattern = 'android\.permission\.INTERNET'
            only_in = "AndroidManifest.xml"
        "#;
        let c = PatternCatalog::from_toml(txt, "t").unwrap();
        let content = "android.permission.INTERNET";

        let mut f = Finding::new("T", Path::new("/app/res/layout.xml"));
        c.apply(content, Path::new("/app/res/layout.xml"), &mut f);
        assert!(f.data_collection.is_empty());

        let mut f = Finding::new("T", Path::new("/app/androidmanifest.xml"));
        c.apply(content, Path::new("/app/androidmanifest.xml"), &mut f);
        assert_eq!(f.data_collection, vec!["NETWORK_ACCESS"]);
    }

    #[test]
    fn bad_pattern_names_the_rule() {
        let txt = "name = \"T\"\n[[rules]]\ncategory = \"apis\"\ntag = \"BROKEN\"\npattern = '('\n";
        match PatternCatalog::from_toml(txt, "t") {
            Err(ScanError::InvalidRule { tag, .. }) => assert_eq!(tag, "BROKEN"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_category_is_a_catalog_error() {
        let txt = "name = \"T\"\n[[rules]]\ncategory = \"secrets\"\ntag = \"X\"\npattern = 'x'\n";
        assert!(matches!(PatternCatalog::from_toml(txt, "t"), Err(ScanError::Catalog { .. })));
    }
}
