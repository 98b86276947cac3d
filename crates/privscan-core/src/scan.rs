//! 扫描主流程与批次并行调度
use crossbeam_channel as channel;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

use crate::aggregate::{merge_findings, summarize};
use crate::cache::ScanCache;
use crate::detectors::{file_name_of, AndroidDetector, Detector, IosDetector, WebDetector};
use crate::error::{Result, ScanError};
use crate::findings::Finding;
use crate::options::{ManagerConfig, ManagerStats, ScanOptions};
use crate::rules::{PatternCatalog, BUILTIN_ANDROID, BUILTIN_IOS, BUILTIN_WEB};
use crate::types::{ProjectFile, Report};
use crate::walker::{collect_project_files, WalkOptions};

/// 单文件扫描结果：(文件序号, 命中或跳过原因)
type FileOutcome = (usize, Result<Vec<Finding>>);

/// 扫描管理器
/// - 持有检测器注册表、扫描线程池与扫描历史缓存
/// - 可跨线程共享；缓存锁只在查询/写入时持有，扫描期间不持有
pub struct ScannerManager {
    config: ManagerConfig,
    detectors: Vec<Arc<dyn Detector>>,
    pool: rayon::ThreadPool,
    cache: Mutex<ScanCache>,
}

impl ScannerManager {
    /// 注册内置检测器（Android、iOS、Web 顺序固定）并创建线程池
    pub fn new(config: ManagerConfig) -> Result<Self> {
        config.validate()?;
        let rules_dir = config.rules_dir.as_deref();
        let android = PatternCatalog::load_or_builtin(rules_dir, "android.toml", BUILTIN_ANDROID)?;
        let ios = PatternCatalog::load_or_builtin(rules_dir, "ios.toml", BUILTIN_IOS)?;
        let web = PatternCatalog::load_or_builtin(rules_dir, "web.toml", BUILTIN_WEB)?;
        let detectors: Vec<Arc<dyn Detector>> = vec![
            Arc::new(AndroidDetector::new(android)?),
            Arc::new(IosDetector::new(ios)?),
            Arc::new(WebDetector::new(web)?),
        ];

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrent_scans)
            .thread_name(|i| format!("privscan-scan-{i}"))
            .build()?;
        let cache = ScanCache::new(Duration::from_millis(config.cache_ttl_ms), config.cache_capacity);

        info!(
            detectors = detectors.len(),
            parallel = config.enable_parallel_scanning,
            max_concurrent = config.max_concurrent_scans,
            "scanner manager ready"
        );
        Ok(Self { config, detectors, pool, cache: Mutex::new(cache) })
    }

    /// 追加自定义检测器；之后的扫描按注册顺序调用
    pub fn add_detector(&mut self, detector: Arc<dyn Detector>) {
        info!(name = detector.name(), "detector registered");
        self.detectors.push(detector);
    }

    /// 支持该文件名的检测器（注册顺序）
    pub fn supported_detectors(&self, file_name: &str) -> Vec<Arc<dyn Detector>> {
        self.detectors.iter().filter(|d| d.supports(file_name)).cloned().collect()
    }

    /// 扫描项目目录，返回项目级报告
    ///
    /// 未过期的缓存命中且未要求强制扫描时直接返回缓存副本，不再遍历目录。
    /// 编排失败（非法 glob、指纹失败）返回 `Err`，缓存保持不变。
    pub fn scan_project(&self, path: &Path, options: &ScanOptions) -> Result<Report> {
        let scan_id = self.scan_id(path, options)?;
        info!(path = %path.display(), %scan_id, force = options.force_rescan, "scanning project");

        if !options.force_rescan {
            if let Some(report) = self.cache().get(&scan_id) {
                info!(%scan_id, "using cached report");
                return Ok(report.clone());
            }
        }

        let report = self.execute_project_scan(path, options, scan_id)?;
        self.cache().insert(report.scan_id.clone(), report.clone());

        info!(
            scan_id = %report.scan_id,
            total_files = report.total_files,
            files_scanned = report.files_scanned,
            warnings = report.warnings.len(),
            risk = ?report.summary.privacy_risk_level,
            duration_ms = report.duration_ms,
            "scan finished"
        );
        Ok(report)
    }

    fn execute_project_scan(&self, path: &Path, options: &ScanOptions, scan_id: String) -> Result<Report> {
        let start = Instant::now();
        let started_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let normalized = options.normalized();
        let walk = WalkOptions::new(&normalized.include_patterns, &normalized.exclude_patterns, normalized.max_files)?;
        let files = collect_project_files(path, &walk);
        debug!(count = files.len(), "project files collected");

        // 决策：启用并行且文件数 > 1 时走批次调度；否则串行
        let outcomes = if self.config.enable_parallel_scanning && files.len() > 1 {
            self.scan_in_batches(&files)
        } else {
            files.iter().enumerate().map(|(i, f)| (i, self.scan_single_file(f))).collect()
        };

        let mut findings: Vec<Finding> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut files_scanned = 0usize;
        for (idx, outcome) in outcomes {
            match outcome {
                Ok(per_file) => {
                    if !per_file.is_empty() {
                        files_scanned += 1;
                    }
                    findings.extend(per_file);
                }
                Err(err) => {
                    warn!(file = %files[idx].relative_path, error = %err, "file skipped");
                    warnings.push(format!("{}: {}", files[idx].relative_path, err));
                }
            }
        }

        let merged = merge_findings(&findings);
        let summary = summarize(&merged);
        Ok(Report {
            scan_id,
            project_path: path.to_path_buf(),
            started_at,
            total_files: files.len(),
            files_scanned,
            duration_ms: start.elapsed().as_millis() as u64,
            findings: merged,
            warnings,
            summary,
        })
    }

    /// 批次并行调度：
    /// - 按 `max_concurrent_scans` 切分批次，批次之间严格串行
    /// - 批内任务在线程池 scope 中并发执行，scope 结束即为屏障
    /// - 结果经通道回传，批内按完成顺序排列
    fn scan_in_batches(&self, files: &[ProjectFile]) -> Vec<FileOutcome> {
        let batch_size = self.config.max_concurrent_scans;
        let (tx, rx) = channel::unbounded::<FileOutcome>();
        let mut outcomes: Vec<FileOutcome> = Vec::with_capacity(files.len());

        for (batch_no, batch) in files.chunks(batch_size).enumerate() {
            let base = batch_no * batch_size;
            debug!(batch = batch_no, size = batch.len(), "scanning batch");
            self.pool.scope(|s| {
                for (i, file) in batch.iter().enumerate() {
                    let tx = tx.clone();
                    s.spawn(move |_| {
                        let _ = tx.send((base + i, self.scan_single_file(file)));
                    });
                }
            });
            outcomes.extend(rx.try_iter());
        }
        outcomes
    }

    /// 读取并扫描单个文件；读取/解码问题以 `Err` 返回，由调用方记为告警
    fn scan_single_file(&self, file: &ProjectFile) -> Result<Vec<Finding>> {
        if let Some(limit) = self.config.max_file_size {
            let size = std::fs::metadata(&file.path).map_err(|e| ScanError::io(&file.path, e))?.len();
            if size > limit {
                return Err(ScanError::TooLarge { path: file.path.clone(), size, limit });
            }
        }
        let bytes = std::fs::read(&file.path).map_err(|e| ScanError::io(&file.path, e))?;
        if is_probably_binary(&bytes) {
            return Err(ScanError::Undecodable { path: file.path.clone() });
        }
        let content = String::from_utf8(bytes).map_err(|_| ScanError::Undecodable { path: file.path.clone() })?;
        Ok(self.scan_content(&content, &file.path))
    }

    /// 对内存中的内容运行所有支持该文件的检测器，只返回非空命中
    /// 检测器 panic 会被捕获并记录，其结果丢弃
    pub fn scan_content(&self, content: &str, path: &Path) -> Vec<Finding> {
        let file_name = file_name_of(path);
        let mut out = Vec::new();
        for detector in self.detectors.iter().filter(|d| d.supports(file_name)) {
            match catch_unwind(AssertUnwindSafe(|| detector.scan(content, path))) {
                Ok(finding) if finding.has_signal() => out.push(finding),
                Ok(_) => {}
                Err(_) => error!(detector = detector.name(), path = %path.display(), "detector panicked"),
            }
        }
        out
    }

    /// 按 ScanID 查询缓存（过期条目视为不存在）
    pub fn cached_report(&self, scan_id: &str) -> Option<Report> {
        self.cache().get(scan_id).cloned()
    }

    /// 由项目路径与归一化选项计算 ScanID
    pub fn scan_id(&self, path: &Path, options: &ScanOptions) -> Result<String> {
        let json = serde_json::to_string(&options.normalized())?;
        Ok(format!("scan_{}", simple_hash(&format!("{}:{}", path.display(), json))))
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
        info!("scan cache cleared");
    }

    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            total_detectors: self.detectors.len(),
            detector_names: self.detectors.iter().map(|d| d.name().to_string()).collect(),
            cached_scans: self.cache().len(),
            parallel_scanning: self.config.enable_parallel_scanning,
            max_concurrent_scans: self.config.max_concurrent_scans,
        }
    }

    fn cache(&self) -> MutexGuard<'_, ScanCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 31 倍滚动哈希（按 UTF-16 码元，i32 回绕），取绝对值后以 36 进制输出
fn simple_hash(s: &str) -> String {
    let mut hash: i32 = 0;
    for unit in s.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
    }
    to_base36(hash.unsigned_abs() as u64)
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

/// 判定缓冲区是否“明显是二进制”
/// - 只要包含任何 NUL 字节即认为二进制
/// - 否则可打印 ASCII（含 tab/CR/LF）占比低于 25% 也认为二进制
/// 非 ASCII 的 UTF-8 文本（如中文注释）由后续解码判定，这里只抽样前 8KiB
fn is_probably_binary(buf: &[u8]) -> bool {
    let sample = &buf[..buf.len().min(8192)];
    if sample.is_empty() { return false; }
    if sample.contains(&0) { return true; }
    let printable = sample
        .iter()
        .filter(|&&b| matches!(b, 0x09 | 0x0A | 0x0D) || (0x20..=0x7E).contains(&b) || b >= 0x80)
        .count();
    (printable as f32 / sample.len() as f32) < 0.25
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exploding;

    impl Detector for Exploding {
        fn name(&self) -> &str { "Exploding" }
        fn extensions(&self) -> &[String] { &[] }
        fn supports(&self, _file_name: &str) -> bool { true }
        fn scan(&self, _content: &str, _path: &Path) -> Finding { panic!("boom") }
    }

    fn manager() -> ScannerManager { ScannerManager::new(ManagerConfig::default()).unwrap() }

    #[test]
    fn hash_matches_rolling_31() {
        assert_eq!(simple_hash(""), "0");
        // 'a' = 97 = 2*36 + 25
        assert_eq!(simple_hash("a"), "2p");
        // "ab" = 97*31 + 98 = 3105
        assert_eq!(simple_hash("ab"), to_base36(3105));
    }

    #[test]
    fn scan_id_ignores_force_flag_and_default_spelling() {
        let m = manager();
        let p = Path::new("/work/app");
        let plain = m.scan_id(p, &ScanOptions::default()).unwrap();
        let forced = m.scan_id(p, &ScanOptions { force_rescan: true, max_files: Some(1000), ..Default::default() }).unwrap();
        assert_eq!(plain, forced);
        assert!(plain.starts_with("scan_"));

        let capped = m.scan_id(p, &ScanOptions { max_files: Some(5), ..Default::default() }).unwrap();
        assert_ne!(plain, capped);
        assert_ne!(plain, m.scan_id(Path::new("/work/other"), &ScanOptions::default()).unwrap());
    }

    #[test]
    fn binary_detection() {
        assert!(is_probably_binary(b"PK\x03\x04\x00\x00"));
        assert!(!is_probably_binary(b"let a = 1;\n"));
        assert!(!is_probably_binary("// 中文注释\nlet a = 1;".as_bytes()));
        assert!(is_probably_binary(&[0x01, 0x02, 0x03, 0x04, 0x05, b'a']));
        assert!(!is_probably_binary(b""));
    }

    #[test]
    fn panicking_detector_is_isolated() {
        let mut m = manager();
        m.add_detector(Arc::new(Exploding));
        let findings = m.scan_content("navigator.geolocation.getCurrentPosition()", Path::new("a.js"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].scanner, "WebDetector");
    }

    #[test]
    fn empty_results_are_filtered() {
        let m = manager();
        assert!(m.scan_content("console.log('hello')", Path::new("a.js")).is_empty());
    }

    #[test]
    fn registry_order_and_stats() {
        let mut m = manager();
        assert_eq!(m.supported_detectors("index.html").len(), 1);
        assert!(m.supported_detectors("notes.txt").is_empty());
        m.add_detector(Arc::new(Exploding));
        let names: Vec<_> = m.supported_detectors("Info.plist").iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["IosDetector", "Exploding"]);

        let stats = m.stats();
        assert_eq!(stats.total_detectors, 4);
        assert_eq!(stats.detector_names, vec!["AndroidDetector", "IosDetector", "WebDetector", "Exploding"]);
        assert_eq!(stats.cached_scans, 0);
        assert!(stats.parallel_scanning);
        assert_eq!(stats.max_concurrent_scans, 3);
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.js");
        std::fs::write(&path, "x".repeat(64)).unwrap();
        let m = ScannerManager::new(ManagerConfig { max_file_size: Some(16), ..Default::default() }).unwrap();
        let file = ProjectFile { path, name: "big.js".into(), relative_path: "big.js".into() };
        assert!(matches!(m.scan_single_file(&file), Err(ScanError::TooLarge { size: 64, limit: 16, .. })));
    }

    #[test]
    fn zero_concurrency_fails_construction() {
        let cfg = ManagerConfig { max_concurrent_scans: 0, ..Default::default() };
        assert!(matches!(ScannerManager::new(cfg), Err(ScanError::InvalidConfig(_))));
    }
}
