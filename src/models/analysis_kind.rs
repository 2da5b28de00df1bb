use crate::error::ConfigError;
use std::str::FromStr;

/// 分析类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AnalysisKind {
    /// 静态优化
    StaticOptimization,
    /// 肌肉分析
    MuscleAnalysis,
    /// 关节反力分析
    JointReaction,
}

impl AnalysisKind {
    /// 全部分析类型
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::StaticOptimization,
        AnalysisKind::MuscleAnalysis,
        AnalysisKind::JointReaction,
    ];

    /// 引擎中的类名，同时也是模板 XML 中的节点名
    pub fn node_name(self) -> &'static str {
        match self {
            AnalysisKind::StaticOptimization => "StaticOptimization",
            AnalysisKind::MuscleAnalysis => "MuscleAnalysis",
            AnalysisKind::JointReaction => "JointReaction",
        }
    }

    /// 分析工具是否需要求解辅助状态平衡
    pub fn solve_for_equilibrium(self) -> bool {
        matches!(self, AnalysisKind::MuscleAnalysis)
    }
}

impl FromStr for AnalysisKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "StaticOptimization" | "static_optimization" | "so" => {
                Ok(AnalysisKind::StaticOptimization)
            }
            "MuscleAnalysis" | "muscle_analysis" | "ma" => Ok(AnalysisKind::MuscleAnalysis),
            "JointReaction" | "joint_reaction" | "jr" => Ok(AnalysisKind::JointReaction),
            other => Err(ConfigError::UnknownAnalysisKind {
                name: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.node_name())
    }
}
