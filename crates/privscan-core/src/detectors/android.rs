//! Android 检测器
use regex::Regex;
use std::path::Path;
use tracing::debug;

use super::Detector;
use crate::error::{Result, ScanError};
use crate::findings::Finding;
use crate::rules::{PatternCatalog, BUILTIN_ANDROID};
use crate::types::Dependency;

/// Gradle 依赖声明：`implementation 'g:a:v'` / `api("g:a:v")`
const GRADLE_DEPENDENCY: &str = r#"\b(?:implementation|api)\s*\(?\s*['"]([^'"]+)['"]"#;

/// 扫描 Java/Kotlin 源码、AndroidManifest.xml 与 Gradle 构建文件
pub struct AndroidDetector {
    catalog: PatternCatalog,
    gradle_dep: Regex,
}

impl AndroidDetector {
    pub fn new(catalog: PatternCatalog) -> Result<Self> {
        let gradle_dep = Regex::new(GRADLE_DEPENDENCY).map_err(|source| ScanError::InvalidRule {
            catalog: catalog.name().to_string(),
            tag: "GRADLE_DEPENDENCY".into(),
            source,
        })?;
        Ok(Self { catalog, gradle_dep })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(PatternCatalog::from_toml(BUILTIN_ANDROID, "android.toml")?)
    }

    /// 提取 Gradle 依赖；`group:artifact:version` 拆成名称与版本
    fn gradle_dependencies(&self, content: &str) -> Vec<Dependency> {
        self.gradle_dep
            .captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .map(|m| {
                let coord = m.as_str();
                match coord.rsplit_once(':') {
                    Some((name, version)) if name.contains(':') => {
                        Dependency { name: name.to_string(), version: Some(version.to_string()) }
                    }
                    _ => Dependency { name: coord.to_string(), version: None },
                }
            })
            .collect()
    }
}

impl Detector for AndroidDetector {
    fn name(&self) -> &str { self.catalog.name() }

    fn extensions(&self) -> &[String] { self.catalog.extensions() }

    fn scan(&self, content: &str, path: &Path) -> Finding {
        let mut finding = Finding::new(self.name(), path);
        // 清单文件专属规则（only_in）在这里一并生效
        self.catalog.apply(content, path, &mut finding);

        // 路径中任意位置含 .gradle 即视为 Gradle 脚本（含 .gradle/ 目录下的脚本）
        if path.to_string_lossy().contains(".gradle") {
            finding.dependencies = self.gradle_dependencies(content);
        }

        debug!(
            path = %path.display(),
            permissions = finding.permissions.len(),
            apis = finding.apis.len(),
            libs = finding.third_party_libs.len(),
            "android scan done"
        );
        finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> AndroidDetector { AndroidDetector::builtin().unwrap() }

    #[test]
    fn manifest_permissions_map_to_tags() {
        let content = r#"
            <manifest xmlns:android="http://schemas.android.com/apk/res/android">
                <uses-permission android:name="android.permission.CAMERA" />
                <uses-permission android:name="android.permission.ACCESS_FINE_LOCATION" />
            </manifest>
        "#;
        let f = detector().scan(content, Path::new("/app/src/main/AndroidManifest.xml"));
        assert_eq!(f.permissions, vec!["CAMERA", "LOCATION_FINE"]);
        assert_eq!(f.scanner, "AndroidDetector");
    }

    #[test]
    fn manifest_infers_data_collection() {
        let content = r#"
            <uses-permission android:name="android.permission.INTERNET" />
            <uses-permission android:name="android.permission.READ_PHONE_STATE" />
        "#;
        let f = detector().scan(content, Path::new("AndroidManifest.xml"));
        assert_eq!(f.data_collection, vec!["NETWORK_ACCESS", "DEVICE_ID"]);
        assert_eq!(f.permissions, vec!["PHONE_STATE"]);

        // 非清单文件不做推断
        let f = detector().scan(content, Path::new("res/values/strings.xml"));
        assert!(f.data_collection.is_empty());
    }

    #[test]
    fn source_file_reports_api_usage() {
        let content = "Camera camera = Camera.open();\nLocationManager lm = getSystemService(LOCATION_SERVICE);";
        let f = detector().scan(content, Path::new("MainActivity.java"));
        assert_eq!(f.apis, vec!["CAMERA_API", "LOCATION_API"]);
        assert!(f.permissions.is_empty());
    }

    #[test]
    fn gradle_file_lists_dependencies() {
        let content = r#"
            dependencies {
                implementation 'com.google.firebase:firebase-analytics:21.0.0'
                implementation("com.appsflyer:af-android-sdk:6.9.0")
                api 'local-lib'
            }
        "#;
        let f = detector().scan(content, Path::new("app/build.gradle"));
        assert_eq!(f.dependencies.len(), 3);
        assert_eq!(f.dependencies[0].name, "com.google.firebase:firebase-analytics");
        assert_eq!(f.dependencies[0].version.as_deref(), Some("21.0.0"));
        assert_eq!(f.dependencies[2], Dependency { name: "local-lib".into(), version: None });
        assert!(f.third_party_libs.contains(&"FIREBASE".to_string()));
        assert!(f.third_party_libs.contains(&"ANALYTICS".to_string()));
        assert!(f.third_party_libs.contains(&"APPSFLYER".to_string()));
    }

    #[test]
    fn gradle_directory_in_path_enables_dependency_extraction() {
        let content = "dependencies { implementation(\"com.adjust.sdk:adjust-android:4.33.0\") }";
        let f = detector().scan(content, Path::new("/home/dev/.gradle/init.d/deps.kts"));
        assert_eq!(f.dependencies.len(), 1);
        assert_eq!(f.dependencies[0].name, "com.adjust.sdk:adjust-android");

        let f = detector().scan(content, Path::new("/app/src/Deps.kt"));
        assert!(f.dependencies.is_empty());
    }

    #[test]
    fn plain_text_yields_empty_finding() {
        let f = detector().scan("fun main() = println(\"hi\")", Path::new("Main.kt"));
        assert!(!f.has_signal());
    }
}
