//! 项目文件遍历与 glob 过滤
//!
//! - 跳过名单目录与隐藏目录，整棵子树不进入
//! - 先匹配 exclude（命中即跳过；目录命中则剪枝），文件再匹配 include
//! - 达到文件上限即停止，返回已收集的部分结果
//! - 单个目录读取失败只记录日志，继续遍历兄弟节点
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, ScanError};
use crate::types::ProjectFile;

/// 固定跳过的目录名（小写比较）
pub const SKIP_DIRECTORIES: &[&str] = &[
    "node_modules", ".git", ".vscode", ".idea", "dist", "build", "out",
    "coverage", ".nyc_output", "bower_components", "jspm_packages", "tmp", "temp",
];

/// 编译后的 glob（整体锚定到完整相对路径）
#[derive(Debug, Clone)]
pub struct Glob {
    regex: Regex,
}

impl Glob {
    /// 编译规则：
    /// - `**/` 匹配零个或多个目录层级；其余位置的 `**` 匹配任意字符（含 `/`）
    /// - `*` 匹配不含 `/` 的任意序列，`?` 匹配一个非 `/` 字符
    /// - `{a,b}` 为备选
    pub fn new(pattern: &str) -> Result<Self> {
        let mut re = String::with_capacity(pattern.len() * 2 + 2);
        re.push('^');
        let chars: Vec<char> = pattern.chars().collect();
        let mut brace_depth = 0usize;
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            match ch {
                '*' if chars.get(i + 1) == Some(&'*') => {
                    if chars.get(i + 2) == Some(&'/') {
                        re.push_str("(?:.*/)?");
                        i += 3;
                    } else {
                        re.push_str(".*");
                        i += 2;
                    }
                    continue;
                }
                '*' => re.push_str("[^/]*"),
                '?' => re.push_str("[^/]"),
                '{' => { brace_depth += 1; re.push_str("(?:"); }
                '}' if brace_depth > 0 => { brace_depth -= 1; re.push(')'); }
                ',' if brace_depth > 0 => re.push('|'),
                _ => re.push_str(&regex::escape(ch.encode_utf8(&mut [0u8; 4]))),
            }
            i += 1;
        }
        re.push('$');
        let regex = Regex::new(&re).map_err(|source| ScanError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, relative_path: &str) -> bool { self.regex.is_match(relative_path) }
}

/// 一组 glob，任一命中即命中
#[derive(Debug, Clone, Default)]
pub struct GlobSet {
    globs: Vec<Glob>,
}

impl GlobSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let globs = patterns.iter().map(|p| Glob::new(p.as_ref())).collect::<Result<Vec<_>>>()?;
        Ok(Self { globs })
    }

    pub fn is_match(&self, relative_path: &str) -> bool {
        self.globs.iter().any(|g| g.is_match(relative_path))
    }
}

/// 遍历参数
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub include: GlobSet,
    pub exclude: GlobSet,
    pub max_files: usize,
}

impl WalkOptions {
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S], max_files: usize) -> Result<Self> {
        Ok(Self { include: GlobSet::new(include)?, exclude: GlobSet::new(exclude)?, max_files })
    }
}

/// 目录名是否应整体跳过（名单内或以点开头）
pub fn should_skip_directory(dir_name: &str) -> bool {
    let lower = dir_name.to_lowercase();
    lower.starts_with('.') || SKIP_DIRECTORIES.contains(&lower.as_str())
}

/// 相对路径，统一使用 `/` 分隔
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// 遍历项目目录，按文件名顺序返回匹配的文件
pub fn collect_project_files(root: &Path, opts: &WalkOptions) -> Vec<ProjectFile> {
    let mut files: Vec<ProjectFile> = Vec::new();
    if opts.max_files == 0 {
        return files;
    }
    let root: PathBuf = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            if should_skip_directory(&name) {
                return false;
            }
            // 目录按 "rel/" 参与 exclude 匹配，使 `**/dist/**` 之类模式可剪枝
            let rel = relative_path(&root, e.path());
            !(opts.exclude.is_match(&rel) || opts.exclude.is_match(&format!("{rel}/")))
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() { continue; }

        let rel = relative_path(&root, entry.path());
        if opts.exclude.is_match(&rel) { continue; }
        if !opts.include.is_match(&rel) { continue; }

        files.push(ProjectFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.into_path(),
            relative_path: rel,
        });
        if files.len() >= opts.max_files { break; }
    }

    files
}
