//! 检测器契约与内置检测器（Android / iOS / Web）
use std::path::Path;

use crate::findings::Finding;

mod android;
mod ios;
mod web;

pub use android::AndroidDetector;
pub use ios::IosDetector;
pub use web::WebDetector;

/// 平台检测器
///
/// - `supports`：按小写后缀判断是否处理该文件，纯函数
/// - `scan`：对文本内容做模式匹配；未命中只是返回空结果，不会报错
///
/// 检测器除构造时注入的只读规则目录外不持有状态，可跨线程共享。
pub trait Detector: Send + Sync {
    /// 检测器名称（写入 `Finding::scanner` 与报告的 `scanners`）
    fn name(&self) -> &str;

    /// 声明支持的小写扩展名（不含点）
    fn extensions(&self) -> &[String];

    fn supports(&self, file_name: &str) -> bool {
        let ext = file_extension(file_name);
        self.extensions().iter().any(|e| *e == ext)
    }

    fn scan(&self, content: &str, path: &Path) -> Finding;
}

/// 取小写文件名的最后一个点后缀；无点或以点结尾时返回空串
pub fn file_extension(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    match lower.rsplit_once('.') {
        Some((_, ext)) => ext.to_string(),
        None => String::new(),
    }
}

/// 路径的文件名部分（非 UTF-8 时为空）
pub(crate) fn file_name_of(path: &Path) -> &str {
    path.file_name().and_then(|s| s.to_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_last_lowercased_suffix() {
        assert_eq!(file_extension("MainActivity.JAVA"), "java");
        assert_eq!(file_extension("app.min.js"), "js");
        assert_eq!(file_extension("Podfile"), "");
        assert_eq!(file_extension("weird."), "");
        assert_eq!(file_extension(".gitignore"), "gitignore");
    }

    #[test]
    fn builtin_detectors_route_by_extension() {
        let android = AndroidDetector::builtin().unwrap();
        let ios = IosDetector::builtin().unwrap();
        let web = WebDetector::builtin().unwrap();

        assert!(android.supports("MainActivity.java"));
        assert!(android.supports("AndroidManifest.xml"));
        assert!(android.supports("build.gradle"));
        assert!(!android.supports("app.js"));

        assert!(ios.supports("ViewController.swift"));
        assert!(ios.supports("Info.plist"));
        assert!(ios.supports("Podfile"));
        assert!(!ios.supports("podfile.lock"));

        assert!(web.supports("index.HTML"));
        assert!(web.supports("package.json"));
        assert!(!web.supports("image.png"));
        assert!(!web.supports("notes.txt"));
    }

    #[test]
    fn supports_is_stable_for_identical_names() {
        let web = WebDetector::builtin().unwrap();
        for name in ["a.ts", "A.TS", "README", "x.tar.gz"] {
            assert_eq!(web.supports(name), web.supports(name));
        }
    }
}
