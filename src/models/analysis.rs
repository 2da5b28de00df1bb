//! 分析对象
//!
//! 每个试次都会新建一个分析对象，挂到模型上运行后再卸下

use crate::models::AnalysisKind;

/// 静态优化参数
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StaticOptimizationSettings {
    pub use_model_force_set: bool,
    pub activation_exponent: f64,
    pub use_muscle_physiology: bool,
    pub optimizer_convergence_criterion: f64,
    pub optimizer_max_iterations: i64,
}

/// 肌肉分析参数
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MuscleAnalysisSettings {
    pub moment_arm_coordinate_list: Vec<String>,
    pub muscle_list: Vec<String>,
}

/// 关节反力分析参数
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct JointReactionSettings {
    /// 肌肉力文件（任务文件中的设置优先于模板）
    pub forces_file: Option<String>,
    pub joint_names: Vec<String>,
    pub apply_on_bodies: Vec<String>,
    pub express_in_frame: Vec<String>,
}

/// 各分析类型独有的参数
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum AnalysisSettings {
    StaticOptimization(StaticOptimizationSettings),
    MuscleAnalysis(MuscleAnalysisSettings),
    JointReaction(JointReactionSettings),
}

impl AnalysisSettings {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisSettings::StaticOptimization(_) => AnalysisKind::StaticOptimization,
            AnalysisSettings::MuscleAnalysis(_) => AnalysisKind::MuscleAnalysis,
            AnalysisSettings::JointReaction(_) => AnalysisKind::JointReaction,
        }
    }
}

/// 所有分析类型共有的参数
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CommonSettings {
    pub on: bool,
    pub step_interval: i64,
    pub in_degrees: bool,
    pub start_time: f64,
    pub end_time: f64,
}

/// 一个配置完成的分析对象
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Analysis {
    /// 分析名称（与类名相同）
    pub name: String,
    pub common: CommonSettings,
    pub settings: AnalysisSettings,
}

impl Analysis {
    pub fn kind(&self) -> AnalysisKind {
        self.settings.kind()
    }
}
