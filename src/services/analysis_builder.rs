//! 分析对象构建 - 业务能力层
//!
//! 只负责"参数表 → 分析对象"，不关心试次、模型和执行

use crate::error::AppResult;
use crate::models::{
    Analysis, AnalysisKind, AnalysisSettings, CommonSettings, JointReactionSettings,
    MuscleAnalysisSettings, ParameterMap, StaticOptimizationSettings,
};
use tracing::debug;

/// 根据分析类型和模板参数构建分析对象
///
/// # 参数
/// - `kind`: 分析类型
/// - `params`: 从模板中提取的参数
/// - `forces_file`: 任务文件中指定的肌肉力文件（仅关节反力分析，优先于模板）
/// - `window`: 有效起止时间
pub fn build_analysis(
    kind: AnalysisKind,
    params: &ParameterMap,
    forces_file: Option<&str>,
    window: (f64, f64),
) -> AppResult<Analysis> {
    let settings = match kind {
        AnalysisKind::StaticOptimization => {
            AnalysisSettings::StaticOptimization(StaticOptimizationSettings {
                use_model_force_set: params.bool("use_model_force_set")?,
                activation_exponent: params.float("activation_exponent")?,
                use_muscle_physiology: params.bool("use_muscle_physiology")?,
                optimizer_convergence_criterion: params.float("optimizer_convergence_criterion")?,
                optimizer_max_iterations: params.integer("optimizer_max_iterations")?,
            })
        }
        AnalysisKind::MuscleAnalysis => AnalysisSettings::MuscleAnalysis(MuscleAnalysisSettings {
            moment_arm_coordinate_list: params.list("moment_arm_coordinate_list")?,
            muscle_list: params.list("muscle_list")?,
        }),
        AnalysisKind::JointReaction => {
            let forces_file = match forces_file {
                Some(file) => Some(file.to_string()),
                None => params.optional_text("forces_file")?,
            };
            AnalysisSettings::JointReaction(JointReactionSettings {
                forces_file,
                joint_names: params.list("joint_names")?,
                apply_on_bodies: params.list("apply_on_bodies")?,
                express_in_frame: params.list("express_in_frame")?,
            })
        }
    };

    let (start_time, end_time) = window;
    let common = CommonSettings {
        on: params.bool("on")?,
        step_interval: params.integer("step_interval")?,
        in_degrees: params.bool("in_degrees")?,
        start_time,
        end_time,
    };

    debug!("构建 {} 分析: {:?}", kind, settings);

    Ok(Analysis {
        name: kind.node_name().to_string(),
        common,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ParamError};
    use crate::models::ParamValue;

    fn shared(node: &str) -> ParameterMap {
        let mut params = ParameterMap::new(node);
        params.insert("on", ParamValue::Bool(true));
        params.insert("step_interval", ParamValue::Float(10.0));
        params.insert("in_degrees", ParamValue::Bool(true));
        params.insert("start_time", ParamValue::Float(0.0));
        params
    }

    #[test]
    fn test_static_optimization() {
        let mut params = shared("StaticOptimization");
        params.insert("use_model_force_set", ParamValue::Bool(true));
        params.insert("activation_exponent", ParamValue::Float(2.0));
        params.insert("use_muscle_physiology", ParamValue::Bool(false));
        params.insert("optimizer_convergence_criterion", ParamValue::Float(1e-4));
        params.insert("optimizer_max_iterations", ParamValue::Float(100.0));

        let analysis =
            build_analysis(AnalysisKind::StaticOptimization, &params, None, (2.0, 5.0)).unwrap();
        assert_eq!(analysis.name, "StaticOptimization");
        assert_eq!(analysis.common.step_interval, 10);
        assert_eq!((analysis.common.start_time, analysis.common.end_time), (2.0, 5.0));
        match analysis.settings {
            AnalysisSettings::StaticOptimization(so) => {
                assert_eq!(so.optimizer_max_iterations, 100);
                assert!(!so.use_muscle_physiology);
            }
            other => panic!("unexpected settings: {:?}", other),
        }
    }

    #[test]
    fn test_muscle_analysis_lists() {
        let mut params = shared("MuscleAnalysis");
        params.insert("moment_arm_coordinate_list", ParamValue::List(vec!["all".into()]));
        params.insert(
            "muscle_list",
            ParamValue::List(vec!["DELT1".into(), "DELT2".into()]),
        );

        let analysis =
            build_analysis(AnalysisKind::MuscleAnalysis, &params, None, (0.0, 1.0)).unwrap();
        assert_eq!(
            analysis.settings,
            AnalysisSettings::MuscleAnalysis(MuscleAnalysisSettings {
                moment_arm_coordinate_list: vec!["all".into()],
                muscle_list: vec!["DELT1".into(), "DELT2".into()],
            })
        );
    }

    #[test]
    fn test_joint_reaction_forces_file_override() {
        let mut params = shared("JointReaction");
        params.insert("forces_file", ParamValue::List(vec!["template_forces.sto".into()]));
        params.insert("joint_names", ParamValue::List(vec!["GH".into()]));
        params.insert("apply_on_bodies", ParamValue::List(vec!["child".into()]));
        params.insert("express_in_frame", ParamValue::List(vec!["ground".into()]));

        let from_template =
            build_analysis(AnalysisKind::JointReaction, &params, None, (0.0, 1.0)).unwrap();
        let overridden = build_analysis(
            AnalysisKind::JointReaction,
            &params,
            Some("so_forces.sto"),
            (0.0, 1.0),
        )
        .unwrap();

        let forces = |a: &Analysis| match &a.settings {
            AnalysisSettings::JointReaction(jr) => jr.forces_file.clone(),
            _ => None,
        };
        assert_eq!(forces(&from_template).as_deref(), Some("template_forces.sto"));
        assert_eq!(forces(&overridden).as_deref(), Some("so_forces.sto"));
    }

    #[test]
    fn test_missing_parameter_names_the_key() {
        let params = shared("StaticOptimization");
        let err = build_analysis(AnalysisKind::StaticOptimization, &params, None, (0.0, 1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Param(ParamError::Missing { ref key, .. }) if key == "use_model_force_set"
        ));
    }
}
