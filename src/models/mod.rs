pub mod analysis;
pub mod analysis_kind;
pub mod loaders;
pub mod model_handle;
pub mod params;
pub mod request;

pub use analysis::{
    Analysis, AnalysisSettings, CommonSettings, JointReactionSettings, MuscleAnalysisSettings,
    StaticOptimizationSettings,
};
pub use analysis_kind::AnalysisKind;
pub use loaders::{load_job, load_parameters, read_time_range};
pub use model_handle::{ModelHandle, ModelSource};
pub use params::{ParamValue, ParameterMap};
pub use request::{AnalysisRequest, PostProcessing, RunMode, TimeRange};
