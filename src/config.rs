/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 任务文件路径（TOML）
    pub job_file: String,
    /// OpenSim 命令行工具
    pub opensim_cmd: String,
    /// 并行模式下的最大工作线程数
    pub max_workers: usize,
    /// 临时 XML 文件存放目录
    pub temp_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 批处理报告（JSON）
    pub report_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            job_file: "analyze_job.toml".to_string(),
            opensim_cmd: "opensim-cmd".to_string(),
            max_workers: available_workers(),
            temp_dir: ".".to_string(),
            verbose_logging: false,
            output_log_file: "analyze_log.txt".to_string(),
            report_file: "analyze_report.json".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            job_file: std::env::var("OSIM_JOB_FILE").unwrap_or(default.job_file),
            opensim_cmd: std::env::var("OPENSIM_CMD").unwrap_or(default.opensim_cmd),
            max_workers: std::env::var("MAX_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default.max_workers),
            temp_dir: std::env::var("TEMP_DIR").unwrap_or(default.temp_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            report_file: std::env::var("REPORT_FILE").unwrap_or(default.report_file),
        }
    }
}

/// 可用的处理器核心数
fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_at_least_one_worker() {
        let config = Config::default();
        assert!(config.max_workers >= 1);
        assert_eq!(config.opensim_cmd, "opensim-cmd");
        assert_eq!(config.temp_dir, ".");
    }
}
