//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量试次处理器
//! - 每批解析一次模板参数
//! - 控制并发数量（Semaphore）
//! - 持有仿真引擎
//! - 汇总失败、执行后处理、输出统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Trial>)
//!     ↓
//! workflow::TrialFlow (处理单个 Trial)
//!     ↓
//! services (能力层：analysis_builder / external_loads / output_cleaner)
//!     ↓
//! infrastructure (基础设施：SimulationEngine / xml_writer)
//! ```

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{App, BatchReport, TrialFailure};
