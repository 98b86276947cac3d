//! iOS 检测器
use regex::Regex;
use std::path::Path;
use tracing::debug;

use super::{file_extension, file_name_of, Detector};
use crate::error::{Result, ScanError};
use crate::findings::Finding;
use crate::rules::{PatternCatalog, BUILTIN_IOS};
use crate::types::Dependency;

/// CocoaPods 依赖文件（无扩展名，按文件名特判）
const PODFILE: &str = "Podfile";
/// `pod 'Name'` 或 `pod 'Name', '~> 1.0'`
const POD_DEPENDENCY: &str = r#"(?m)^\s*pod\s+['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#;

/// 扫描 Swift/Objective-C 源码、Info.plist 与 Podfile
pub struct IosDetector {
    catalog: PatternCatalog,
    pod_dep: Regex,
}

impl IosDetector {
    pub fn new(catalog: PatternCatalog) -> Result<Self> {
        let pod_dep = Regex::new(POD_DEPENDENCY).map_err(|source| ScanError::InvalidRule {
            catalog: catalog.name().to_string(),
            tag: "POD_DEPENDENCY".into(),
            source,
        })?;
        Ok(Self { catalog, pod_dep })
    }

    pub fn builtin() -> Result<Self> {
        Self::new(PatternCatalog::from_toml(BUILTIN_IOS, "ios.toml")?)
    }

    fn pod_dependencies(&self, content: &str) -> Vec<Dependency> {
        self.pod_dep
            .captures_iter(content)
            .filter_map(|caps| {
                let name = caps.get(1)?.as_str().to_string();
                let version = caps.get(2).map(|m| m.as_str().to_string());
                Some(Dependency { name, version })
            })
            .collect()
    }
}

impl Detector for IosDetector {
    fn name(&self) -> &str { self.catalog.name() }

    fn extensions(&self) -> &[String] { self.catalog.extensions() }

    fn supports(&self, file_name: &str) -> bool {
        if file_name == PODFILE {
            return true;
        }
        let ext = file_extension(file_name);
        self.extensions().iter().any(|e| *e == ext)
    }

    fn scan(&self, content: &str, path: &Path) -> Finding {
        let mut finding = Finding::new(self.name(), path);
        // Info.plist 专属推断在前，代码级数据收集规则在后
        self.catalog.apply(content, path, &mut finding);

        if file_name_of(path) == PODFILE {
            finding.dependencies = self.pod_dependencies(content);
        }

        debug!(
            path = %path.display(),
            permissions = finding.permissions.len(),
            apis = finding.apis.len(),
            data_collection = finding.data_collection.len(),
            "ios scan done"
        );
        finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> IosDetector { IosDetector::builtin().unwrap() }

    #[test]
    fn plist_usage_descriptions_and_inferences() {
        let content = r#"
            <key>NSCameraUsageDescription</key><string>Scan receipts</string>
            <key>NSLocationWhenInUseUsageDescription</key><string>Nearby stores</string>
            <key>NSAppTransportSecurity</key><dict/>
            <key>UIBackgroundModes</key><array><string>location</string></array>
        "#;
        let f = detector().scan(content, Path::new("/app/Info.plist"));
        assert_eq!(f.permissions, vec!["CAMERA", "LOCATION_WHEN_IN_USE"]);
        assert_eq!(f.data_collection, vec!["NETWORK_ACCESS", "BACKGROUND_PROCESSING"]);
    }

    #[test]
    fn plist_rules_do_not_fire_in_source() {
        let f = detector().scan("let k = \"NSAppTransportSecurity\"", Path::new("Config.swift"));
        assert!(f.data_collection.is_empty());
    }

    #[test]
    fn swift_source_reports_apis_and_code_collection() {
        let content = r#"
            import CoreLocation
            let manager = CLLocationManager()
            let id = UIDevice.current.identifierForVendor
            UserDefaults.standard.set(id, forKey: "device")
            URLSession.shared.dataTask(with: url)
        "#;
        let f = detector().scan(content, Path::new("ViewController.swift"));
        assert_eq!(f.apis, vec!["LOCATION_API"]);
        assert_eq!(f.data_collection, vec!["DEVICE_ID", "NETWORK_REQUESTS", "LOCAL_STORAGE"]);
    }

    #[test]
    fn short_sdk_prefixes_are_case_sensitive() {
        let f = detector().scan("// first, again: gadget", Path::new("Notes.swift"));
        assert!(f.third_party_libs.is_empty());
        let f = detector().scan("FIRApp.configure()", Path::new("AppDelegate.m"));
        assert_eq!(f.third_party_libs, vec!["FIREBASE"]);
    }

    #[test]
    fn podfile_lists_pods() {
        let content = "platform :ios, '14.0'\ntarget 'App' do\n  pod 'Firebase/Analytics'\n  pod 'Mixpanel', '~> 4.0'\nend\n";
        assert!(detector().supports("Podfile"));
        let f = detector().scan(content, Path::new("/app/Podfile"));
        assert_eq!(f.dependencies.len(), 2);
        assert_eq!(f.dependencies[0], Dependency { name: "Firebase/Analytics".into(), version: None });
        assert_eq!(f.dependencies[1].version.as_deref(), Some("~> 4.0"));
        assert_eq!(f.third_party_libs, vec!["FIREBASE", "MIXPANEL"]);
    }
}
