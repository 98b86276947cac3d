use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use privscan_core::{ManagerConfig, ScanOptions, ScannerManager};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "privscan", version, about = "多平台静态隐私扫描")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描项目目录并输出 JSON 报告
    Scan {
        /// 项目根目录
        #[arg(long)]
        input: PathBuf,

        /// 输出文件；缺省写到标准输出
        #[arg(long)]
        output: Option<PathBuf>,

        /// 忽略缓存强制重新扫描
        #[arg(long)]
        force: bool,

        /// include glob，可重复；缺省使用内置模式
        #[arg(long)]
        include: Vec<String>,

        /// exclude glob，可重复；缺省使用内置模式
        #[arg(long)]
        exclude: Vec<String>,

        /// 最大文件数
        #[arg(long)]
        max_files: Option<usize>,

        /// 每批并发扫描数（"auto"=CPU 核心数）；缺省沿用配置文件或默认值 3
        #[arg(long)]
        concurrency: Option<String>,

        /// 关闭批次并行，逐个文件扫描
        #[arg(long)]
        sequential: bool,

        /// 管理器配置文件（TOML）
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { input, output, force, include, exclude, max_files, concurrency, sequential, config } => {
            info!(?input, ?output, "starting scan");
            ensure_project_dir(&input)?;
            let cfg = manager_config(config.as_deref(), concurrency.as_deref(), sequential)?;
            let manager = ScannerManager::new(cfg).context("build scanner manager")?;
            let opts = ScanOptions {
                force_rescan: force,
                include_patterns: (!include.is_empty()).then_some(include),
                exclude_patterns: (!exclude.is_empty()).then_some(exclude),
                max_files,
            };
            let report = manager.scan_project(&input, &opts).context("scan project failed")?;

            let mut out: Box<dyn Write> = match &output {
                Some(path) => Box::new(BufWriter::new(File::create(path).context("create output file")?)),
                None => Box::new(BufWriter::new(std::io::stdout().lock())),
            };
            serde_json::to_writer_pretty(&mut out, &report).context("write report")?;
            writeln!(out)?;
            out.flush().context("flush report")?;

            info!(
                total_files = report.total_files,
                files_scanned = report.files_scanned,
                risk = ?report.summary.privacy_risk_level,
                "scan finished"
            );
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写到 stderr，避免与 stdout 上的报告混在一起
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 输入必须是已存在的目录
fn ensure_project_dir(input: &Path) -> Result<()> {
    if !input.is_dir() {
        bail!("input {} is not a directory", input.display());
    }
    Ok(())
}

/// 组装管理器配置：配置文件为底，仅显式给出的命令行参数覆盖
fn manager_config(config: Option<&Path>, concurrency: Option<&str>, sequential: bool) -> Result<ManagerConfig> {
    let mut cfg = match config {
        Some(path) => ManagerConfig::load(path).with_context(|| format!("load config {}", path.display()))?,
        None => ManagerConfig::default(),
    };
    if let Some(n) = concurrency.and_then(parse_concurrency) {
        cfg.max_concurrent_scans = n;
    }
    if sequential {
        cfg.enable_parallel_scanning = false;
    }
    Ok(cfg)
}

/// 解析并发参数："auto" 取 CPU 核数；非法值返回 None（沿用配置）
fn parse_concurrency(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return Some(num_cpus::get()); }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}
