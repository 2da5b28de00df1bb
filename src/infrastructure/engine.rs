//! 仿真引擎 - 基础设施层
//!
//! 引擎本身是不透明的外部依赖，这里只暴露"运行分析工具"的能力

use crate::error::{AppError, AppResult, EngineError};
use crate::infrastructure::xml_writer;
use crate::models::ModelHandle;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

/// 一次分析工具运行的设置
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeToolSetup {
    /// 工具名（试次文件名去掉扩展名）
    pub name: String,
    /// 坐标（运动学）文件
    pub coordinates_file: PathBuf,
    /// 结果目录
    pub results_dir: PathBuf,
    pub initial_time: f64,
    pub final_time: f64,
    /// 是否求解辅助状态平衡（肌肉分析需要）
    pub solve_for_equilibrium: bool,
    /// 附加的力集合文件
    pub force_set_files: Vec<PathBuf>,
    /// 坐标低通滤波截止频率
    pub lowpass_cutoff: Option<f64>,
    /// 外力设置文件
    pub external_loads_file: Option<PathBuf>,
}

/// 仿真引擎
///
/// 职责：
/// - 用模型上挂载的分析运行一次分析工具
/// - 调用是阻塞的，由编排层放到阻塞线程池执行
/// - 不认识批处理、前缀过滤、后处理
pub trait SimulationEngine: Send + Sync {
    /// 引擎名称（仅用于日志）
    fn name(&self) -> &str;

    /// 运行分析工具，结果写入 `setup.results_dir`
    fn run(&self, model: &ModelHandle, setup: &AnalyzeToolSetup) -> AppResult<()>;
}

/// 通过 `opensim-cmd run-tool` 调用 OpenSim
pub struct OpenSimCmd {
    program: String,
    temp_dir: PathBuf,
}

impl OpenSimCmd {
    /// 创建新的引擎
    ///
    /// # 参数
    /// - `program`: opensim-cmd 可执行文件
    /// - `temp_dir`: 设置文件的临时目录
    pub fn new(program: impl Into<String>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            temp_dir: temp_dir.into(),
        }
    }
}

impl SimulationEngine for OpenSimCmd {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&self, model: &ModelHandle, setup: &AnalyzeToolSetup) -> AppResult<()> {
        let document = xml_writer::analyze_tool_document(model, setup)?;
        // 以试次名命名，并行时不会冲突
        let setup_path = self.temp_dir.join(format!("{}_setup.xml", setup.name));
        std::fs::write(&setup_path, document)
            .map_err(|e| AppError::file_write_failed(&setup_path, e))?;

        debug!("{} run-tool {}", self.program, setup_path.display());
        let output = Command::new(&self.program)
            .arg("run-tool")
            .arg(&setup_path)
            .output();

        if let Err(e) = std::fs::remove_file(&setup_path) {
            warn!("无法删除临时设置文件 {}: {}", setup_path.display(), e);
        }

        let output = output.map_err(|e| EngineError::SpawnFailed {
            program: self.program.clone(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(EngineError::RunFailed {
                trial: setup.name.clone(),
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr, 20),
            }
            .into());
        }

        Ok(())
    }
}

/// 取 stderr 的最后几行
fn stderr_tail(stderr: &[u8], max_lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr = b"one\ntwo\nthree\nfour\n";
        assert_eq!(stderr_tail(stderr, 2), "three\nfour");
        assert_eq!(stderr_tail(stderr, 10), "one\ntwo\nthree\nfour");
        assert_eq!(stderr_tail(b"", 3), "");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.osim");
        std::fs::write(&model_path, "<OpenSimDocument/>").unwrap();
        let model = ModelHandle::load(&model_path).unwrap();

        let engine = OpenSimCmd::new("definitely-not-opensim-cmd-xyz", dir.path());
        let setup = AnalyzeToolSetup {
            name: "trial01".to_string(),
            coordinates_file: dir.path().join("trial01.mot"),
            results_dir: dir.path().join("out"),
            initial_time: 0.0,
            final_time: 1.0,
            solve_for_equilibrium: false,
            force_set_files: Vec::new(),
            lowpass_cutoff: None,
            external_loads_file: None,
        };

        let err = engine.run(&model, &setup).unwrap_err();
        assert!(matches!(err, AppError::Engine(EngineError::SpawnFailed { .. })));
        // 设置文件已被清理
        assert!(!dir.path().join("trial01_setup.xml").exists());
    }
}
