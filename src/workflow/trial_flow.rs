//! 试次处理流程 - 流程层
//!
//! 核心职责：定义"一个试次"的完整处理流程
//!
//! 流程顺序：
//! 1. 前缀过滤
//! 2. 确定起止时间
//! 3. 生成临时外力设置（可选）
//! 4. 构建分析对象 → 挂到模型 → 运行分析工具 → 卸下分析
//! 5. 删除临时外力设置
//!
//! 整个流程是阻塞的，由编排层放到阻塞线程池执行

use crate::error::{AppError, AppResult, ConfigError};
use crate::infrastructure::{xml_writer, AnalyzeToolSetup, SimulationEngine};
use crate::models::loaders::read_time_range;
use crate::models::request::effective_window;
use crate::models::{AnalysisRequest, ParameterMap};
use crate::services::analysis_builder::build_analysis;
use crate::services::external_loads::{forces_data_file, ExternalLoadsFile};
use crate::workflow::TrialCtx;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 试次处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    /// 分析已运行
    Completed,
    /// 前缀不匹配，跳过
    Skipped,
}

/// 试次处理流程
///
/// - 持有整批共享的只读输入（请求、模板参数、引擎）
/// - 每个试次各自加载模型、构建分析对象，用完即丢
pub struct TrialFlow {
    request: Arc<AnalysisRequest>,
    params: Arc<ParameterMap>,
    engine: Arc<dyn SimulationEngine>,
    temp_dir: PathBuf,
}

impl TrialFlow {
    /// 创建新的试次处理流程
    pub fn new(
        request: Arc<AnalysisRequest>,
        params: Arc<ParameterMap>,
        engine: Arc<dyn SimulationEngine>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            request,
            params,
            engine,
            temp_dir: temp_dir.into(),
        }
    }

    pub fn run(&self, ctx: &TrialCtx) -> AppResult<TrialOutcome> {
        let request = &self.request;

        if !request.accepts(&ctx.stem) {
            debug!("{} 前缀不匹配，跳过", ctx);
            return Ok(TrialOutcome::Skipped);
        }

        info!("{} ▶ 开始 {} 分析", ctx, request.kind);

        let trial = absolute(&ctx.path)?;

        // 每个试次一份独立的模型
        let mut model = request.model.instantiate()?;

        let (first_time, last_time) =
            effective_window(request.time_range, || read_time_range(&trial))?;
        debug!("{} 时间范围: {} → {}", ctx, first_time, last_time);

        let external_loads = match &request.xml_forces {
            Some(template) => {
                let ext_dir = request
                    .ext_forces_dir
                    .as_deref()
                    .ok_or(ConfigError::MissingField { field: "ext_forces_dir" })?;
                let datafile =
                    forces_data_file(&absolute(ext_dir)?, &trial, request.prefix.as_deref());
                Some(ExternalLoadsFile::create(
                    template,
                    &self.temp_dir,
                    &trial,
                    &datafile,
                    request.low_pass,
                )?)
            }
            None => None,
        };

        let analysis = build_analysis(
            request.kind,
            &self.params,
            request.forces_file.as_deref(),
            (first_time, last_time),
        )?;
        let analysis_name = analysis.name.clone();

        if request.print_to_xml {
            if let Some(dir) = &request.xml_output {
                let path = dir.join(format!("{}_analysis.xml", request.kind.node_name()));
                let document = xml_writer::analysis_document(&analysis)?;
                std::fs::write(&path, document)
                    .map_err(|e| AppError::file_write_failed(&path, e))?;
            }
        }

        let setup = AnalyzeToolSetup {
            name: ctx.stem.clone(),
            coordinates_file: trial.clone(),
            results_dir: absolute(&request.sto_output)?,
            initial_time: first_time,
            final_time: last_time,
            solve_for_equilibrium: request.kind.solve_for_equilibrium(),
            force_set_files: match &request.xml_actuators {
                Some(actuators) => vec![absolute(actuators)?],
                None => Vec::new(),
            },
            lowpass_cutoff: request.low_pass,
            external_loads_file: external_loads
                .as_ref()
                .map(|loads| absolute(loads.path()))
                .transpose()?,
        };

        model.add_analysis(analysis);
        let result = self.engine.run(&model, &setup);
        // 无论成功与否都卸下分析，避免残留
        model.remove_analysis(&analysis_name);
        drop(external_loads);
        result?;

        info!("{} ✓ 分析完成", ctx);
        Ok(TrialOutcome::Completed)
    }
}

fn absolute(path: &Path) -> AppResult<PathBuf> {
    std::path::absolute(path).map_err(|e| AppError::file_read_failed(path, e))
}
