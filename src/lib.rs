//! # osim_batch
//!
//! 用 OpenSim 分析工具（静态优化、肌肉分析、关节反力分析）批量处理运动捕捉试次
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部引擎，只暴露能力
//! - `SimulationEngine` - 引擎接口，`OpenSimCmd` 通过 `opensim-cmd run-tool` 实现
//! - `xml_writer` - 生成引擎读取的 XML 文档
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `analysis_builder` - 模板参数 → 分析对象
//! - `external_loads` - 试次专用的临时外力设置
//! - `output_cleaner` - 删除空结果、按文件名筛选
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个试次"的完整处理流程
//! - `TrialCtx` - 上下文封装（试次索引 + 文件）
//! - `TrialFlow` - 流程编排（过滤 → 时间范围 → 外力 → 分析 → 运行 → 清理）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量试次处理器，管理引擎、并发和后处理
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{AnalyzeToolSetup, OpenSimCmd, SimulationEngine};
pub use models::{AnalysisKind, AnalysisRequest, ModelHandle, ModelSource, ParamValue, ParameterMap};
pub use orchestrator::{App, BatchReport};
pub use workflow::{TrialCtx, TrialFlow, TrialOutcome};
