//! 批量试次处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一批试次的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **参数提取**：每批只解析一次模板 XML
//! 2. **并发控制**：使用 Semaphore 限制同时运行的试次数（顺序模式下为 1）
//! 3. **阻塞隔离**：引擎调用放到阻塞线程池，不占用异步运行时
//! 4. **错误汇总**：单个试次失败不影响其他试次，最后统一报告
//! 5. **后处理**：整批完成后再清理输出目录
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个试次的细节，委托给 `TrialFlow`
//! - **资源所有者**：唯一持有引擎的模块

use crate::config::Config;
use crate::error::{AppError, AppResult, EngineError};
use crate::infrastructure::{OpenSimCmd, SimulationEngine};
use crate::models::{load_parameters, AnalysisKind, AnalysisRequest, RunMode};
use crate::services::output_cleaner;
use crate::utils::logging;
use crate::workflow::{TrialCtx, TrialFlow, TrialOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    engine: Arc<dyn SimulationEngine>,
}

impl App {
    /// 使用 opensim-cmd 引擎初始化应用
    pub fn new(config: Config) -> Self {
        let engine = Arc::new(OpenSimCmd::new(&config.opensim_cmd, &config.temp_dir));
        Self::with_engine(config, engine)
    }

    /// 使用指定的引擎初始化应用
    pub fn with_engine(config: Config, engine: Arc<dyn SimulationEngine>) -> Self {
        Self { config, engine }
    }

    /// 运行一批分析
    pub async fn run(&self, request: AnalysisRequest) -> AppResult<BatchReport> {
        let workers = match request.run_mode {
            RunMode::Sequential => 1,
            RunMode::Parallel => self.config.max_workers.max(1),
        };
        logging::log_startup(request.kind, request.trials.len(), request.run_mode, workers);
        info!("🔧 引擎: {}", self.engine.name());

        // 模板每批只解析一次
        let params = load_parameters(&request.xml_input, request.kind.node_name()).await?;
        if params.is_empty() {
            warn!(
                "⚠️ 模板 {} 中没有 <{}> 节点",
                request.xml_input.display(),
                request.kind.node_name()
            );
        }

        create_dir(&request.sto_output).await?;
        if request.print_to_xml {
            if let Some(dir) = &request.xml_output {
                create_dir(dir).await?;
            }
        }

        let request = Arc::new(request);
        let flow = Arc::new(TrialFlow::new(
            request.clone(),
            Arc::new(params),
            self.engine.clone(),
            &self.config.temp_dir,
        ));

        let total = request.trials.len();
        let contexts: Vec<TrialCtx> = request
            .trials
            .iter()
            .enumerate()
            .map(|(idx, path)| TrialCtx::new(idx + 1, total, path))
            .collect();

        let results = process_trials(flow, contexts, workers).await?;

        let mut report = BatchReport {
            kind: request.kind,
            total,
            ..Default::default()
        };
        for (ctx, result) in results {
            match result {
                Ok(TrialOutcome::Completed) => report.completed += 1,
                Ok(TrialOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    error!("{} ❌ 处理失败: {}", ctx, e);
                    report.failures.push(TrialFailure {
                        trial: ctx.stem.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if report.skipped > 0 {
            warn!(
                "⏭️ {} 个试次的文件名不以 '{}' 开头，已跳过",
                report.skipped,
                request.prefix.as_deref().unwrap_or_default()
            );
        }

        // 后处理放在整批完成之后，避免并行时删掉其他试次正在写的文件
        let post = &request.post;
        if post.remove_empty_files {
            let removed = output_cleaner::remove_empty_files(&request.sto_output, post.empty_threshold)?;
            report.removed_files.extend(removed);
        }
        if let Some(contains) = &post.contains {
            let removed = output_cleaner::subset_output(&request.sto_output, contains)?;
            report.removed_files.extend(removed);
        }

        logging::print_final_stats(&report, &self.config.output_log_file);

        Ok(report)
    }
}

/// 在阻塞线程池中处理所有试次
///
/// 同时运行的试次数不超过 `workers`；顺序模式下 `workers` 为 1，
/// 每个试次都在上一个完成后才开始
async fn process_trials(
    flow: Arc<TrialFlow>,
    contexts: Vec<TrialCtx>,
    workers: usize,
) -> AppResult<Vec<(TrialCtx, AppResult<TrialOutcome>)>> {
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut handles = Vec::with_capacity(contexts.len());

    for ctx in contexts {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Other(e.to_string()))?;
        let flow = flow.clone();
        let task_ctx = ctx.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            flow.run(&task_ctx)
        });
        handles.push((ctx, handle));
    }

    let (contexts, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    let joined = futures::future::join_all(handles).await;

    Ok(contexts
        .into_iter()
        .zip(joined)
        .map(|(ctx, joined)| {
            let result = joined.unwrap_or_else(|e| {
                Err(EngineError::TaskAborted {
                    trial: ctx.stem.clone(),
                    message: e.to_string(),
                }
                .into())
            });
            (ctx, result)
        })
        .collect())
}

async fn create_dir(dir: &Path) -> AppResult<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::file_write_failed(dir, e))
}

/// 单个试次的失败信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrialFailure {
    pub trial: String,
    pub error: String,
}

/// 批处理报告
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchReport {
    pub kind: AnalysisKind,
    pub total: usize,
    pub completed: usize,
    /// 前缀不匹配而跳过的试次数
    pub skipped: usize,
    pub failures: Vec<TrialFailure>,
    /// 后处理删除的文件
    pub removed_files: Vec<PathBuf>,
}

impl Default for BatchReport {
    fn default() -> Self {
        Self {
            kind: AnalysisKind::StaticOptimization,
            total: 0,
            completed: 0,
            skipped: 0,
            failures: Vec::new(),
            removed_files: Vec::new(),
        }
    }
}

impl BatchReport {
    /// 是否所有试次都成功（或被跳过）
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// 写出 JSON 报告
    pub fn write_json(&self, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| AppError::Other(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| AppError::file_write_failed(path, e))
    }
}
