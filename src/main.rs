use anyhow::{Context, Result};
use osim_batch::models::load_job;
use osim_batch::utils::logging;
use osim_batch::{App, Config};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::init_log_file(&config.output_log_file)?;

    // 任务文件：命令行参数优先
    let job_file = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.job_file));

    let request = load_job(&job_file)
        .await
        .with_context(|| format!("无法加载任务文件: {}", job_file.display()))?;

    let report = App::new(config.clone()).run(request).await?;
    report
        .write_json(&config.report_file)
        .with_context(|| format!("无法写入报告: {}", config.report_file))?;

    if !report.is_success() {
        anyhow::bail!("{} 个试次处理失败", report.failures.len());
    }

    Ok(())
}
