//! 分析请求
//!
//! 每次调用构建一次，用完即丢，不做持久化

use crate::error::{AppResult, ConfigError};
use crate::models::{AnalysisKind, ModelSource};
use std::path::PathBuf;

/// 默认的"空文件"阈值（字节）
pub const DEFAULT_EMPTY_THRESHOLD: u64 = 1000;

/// 表示"未设置"的时间哨兵值
pub const UNSET_TIME: f64 = -1.0;

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum RunMode {
    /// 逐个试次顺序处理
    #[default]
    Sequential,
    /// 固定大小的工作池，试次完成顺序不确定
    Parallel,
}

/// 显式时间范围 [start, end]
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// 从任意长度的序列构建，长度必须为 2
    pub fn from_slice(values: &[f64]) -> Result<Self, ConfigError> {
        match values {
            [start, end] => Ok(Self::new(*start, *end)),
            _ => Err(ConfigError::InvalidTimeRange { len: values.len() }),
        }
    }
}

/// 计算试次的有效起止时间
///
/// 显式值（且不是 -1）优先，否则取试次自身的首末时间。
/// 只有在需要时才会读取试次文件。
pub fn effective_window<F>(range: Option<TimeRange>, trial_range: F) -> AppResult<(f64, f64)>
where
    F: FnOnce() -> AppResult<(f64, f64)>,
{
    let explicit = |v: f64| if v == UNSET_TIME { None } else { Some(v) };
    let start = range.and_then(|r| explicit(r.start));
    let end = range.and_then(|r| explicit(r.end));

    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => {
            let (first, last) = trial_range()?;
            Ok((start.unwrap_or(first), end.unwrap_or(last)))
        }
    }
}

/// 输出目录的后处理选项
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessing {
    /// 删除小于阈值的文件
    pub remove_empty_files: bool,
    /// 阈值（字节）
    pub empty_threshold: u64,
    /// 只保留文件名包含该字符串的文件
    pub contains: Option<String>,
}

impl Default for PostProcessing {
    fn default() -> Self {
        Self {
            remove_empty_files: false,
            empty_threshold: DEFAULT_EMPTY_THRESHOLD,
            contains: None,
        }
    }
}

/// 分析请求
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub kind: AnalysisKind,
    pub model: ModelSource,
    /// 模板 XML
    pub xml_input: PathBuf,
    /// print_to_xml 时分析 XML 的输出目录
    pub xml_output: Option<PathBuf>,
    /// 结果目录
    pub sto_output: PathBuf,
    pub trials: Vec<PathBuf>,
    /// 外力模板 XML
    pub xml_forces: Option<PathBuf>,
    /// 外力数据（.sto）所在目录
    pub ext_forces_dir: Option<PathBuf>,
    /// 关节反力分析的肌肉力文件
    pub forces_file: Option<String>,
    /// 执行器（力集合）文件
    pub xml_actuators: Option<PathBuf>,
    /// 试次文件名前缀过滤
    pub prefix: Option<String>,
    /// 低通滤波截止频率
    pub low_pass: Option<f64>,
    pub time_range: Option<TimeRange>,
    pub print_to_xml: bool,
    pub post: PostProcessing,
    pub run_mode: RunMode,
}

impl AnalysisRequest {
    pub fn new(
        kind: AnalysisKind,
        model: ModelSource,
        xml_input: impl Into<PathBuf>,
        sto_output: impl Into<PathBuf>,
        trials: Vec<PathBuf>,
    ) -> Self {
        Self {
            kind,
            model,
            xml_input: xml_input.into(),
            xml_output: None,
            sto_output: sto_output.into(),
            trials,
            xml_forces: None,
            ext_forces_dir: None,
            forces_file: None,
            xml_actuators: None,
            prefix: None,
            low_pass: None,
            time_range: None,
            print_to_xml: false,
            post: PostProcessing::default(),
            run_mode: RunMode::default(),
        }
    }

    /// 设置时间范围；序列长度不为 2 时立即报错
    pub fn with_time_range(mut self, range: Option<&[f64]>) -> Result<Self, ConfigError> {
        self.time_range = range.map(TimeRange::from_slice).transpose()?;
        Ok(self)
    }

    /// 试次是否通过前缀过滤
    pub fn accepts(&self, trial_stem: &str) -> bool {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => trial_stem.starts_with(prefix),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(
            AnalysisKind::StaticOptimization,
            ModelSource::Path("model.osim".into()),
            "so.xml",
            "out",
            vec!["wu_walk01.mot".into()],
        )
    }

    #[test]
    fn test_time_range_must_have_two_elements() {
        assert!(matches!(
            request().with_time_range(Some(&[1.0])),
            Err(ConfigError::InvalidTimeRange { len: 1 })
        ));
        assert!(matches!(
            request().with_time_range(Some(&[1.0, 2.0, 3.0])),
            Err(ConfigError::InvalidTimeRange { len: 3 })
        ));
        let ok = request().with_time_range(Some(&[2.0, 5.0])).unwrap();
        assert_eq!(ok.time_range, Some(TimeRange::new(2.0, 5.0)));
        assert_eq!(request().with_time_range(None).unwrap().time_range, None);
    }

    #[test]
    fn test_explicit_range_overrides_trial_time() {
        let window = effective_window(Some(TimeRange::new(2.0, 5.0)), || {
            panic!("explicit range should not read the trial")
        })
        .unwrap();
        assert_eq!(window, (2.0, 5.0));
    }

    #[test]
    fn test_missing_range_uses_trial_time() {
        let window = effective_window(None, || Ok((0.25, 3.5))).unwrap();
        assert_eq!(window, (0.25, 3.5));
    }

    #[test]
    fn test_sentinel_bound_falls_back_per_side() {
        let window = effective_window(Some(TimeRange::new(-1.0, 4.0)), || Ok((0.5, 9.0))).unwrap();
        assert_eq!(window, (0.5, 4.0));
        let window = effective_window(Some(TimeRange::new(1.0, -1.0)), || Ok((0.5, 9.0))).unwrap();
        assert_eq!(window, (1.0, 9.0));
    }

    #[test]
    fn test_zero_start_is_an_explicit_value() {
        let window = effective_window(Some(TimeRange::new(0.0, 2.0)), || Ok((0.5, 9.0))).unwrap();
        assert_eq!(window, (0.0, 2.0));
    }

    #[test]
    fn test_prefix_filter() {
        let mut req = request();
        req.prefix = Some("wu".to_string());
        assert!(req.accepts("wu_walk01"));
        assert!(!req.accepts("ta_walk01"));

        req.prefix = None;
        assert!(req.accepts("ta_walk01"));
    }
}
