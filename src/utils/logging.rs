use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::{AnalysisKind, RunMode};
use crate::orchestrator::BatchReport;

/// 初始化 tracing
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n分析批处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(kind: AnalysisKind, total_trials: usize, mode: RunMode, workers: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {} 批处理", kind);
    info!("📄 试次数量: {}", total_trials);
    match mode {
        RunMode::Sequential => info!("📋 顺序处理"),
        RunMode::Parallel => info!("📊 并行处理，最大并发数: {}", workers),
    }
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息，并追加到日志文件
///
/// # 参数
/// - `report`: 批处理报告
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(report: &BatchReport, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.completed, report.total);
    info!("⏭️ 跳过: {}", report.skipped);
    info!("❌ 失败: {}", report.failures.len());
    for failure in &report.failures {
        info!("   - {}: {}", failure.trial, failure.error);
    }
    if !report.removed_files.is_empty() {
        info!("🧹 清理文件: {}", report.removed_files.len());
    }
    info!("{}", "=".repeat(60));

    if let Err(e) = append_summary(report, log_file_path) {
        tracing::warn!("无法写入日志文件 {}: {}", log_file_path, e);
    } else {
        info!("\n日志已保存至: {}", log_file_path);
    }
}

fn append_summary(report: &BatchReport, log_file_path: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    writeln!(file, "分析类型: {}", report.kind)?;
    writeln!(
        file,
        "成功 {}/{} | 跳过 {} | 失败 {}",
        report.completed,
        report.total,
        report.skipped,
        report.failures.len()
    )?;
    for failure in &report.failures {
        writeln!(file, "失败: {} | {}", failure.trial, failure.error)?;
    }
    for removed in &report.removed_files {
        writeln!(file, "已删除: {}", removed.display())?;
    }
    Ok(())
}
