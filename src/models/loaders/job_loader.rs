use crate::error::{AppError, AppResult, ConfigError, FileError, ParseError};
use crate::models::request::{AnalysisRequest, PostProcessing, RunMode, DEFAULT_EMPTY_THRESHOLD};
use crate::models::{AnalysisKind, ModelSource};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 默认的试次文件匹配规则
pub const DEFAULT_TRIAL_PATTERN: &str = r"\.mot$";

/// TOML 任务文件
///
/// ```toml
/// kind = "StaticOptimization"
/// model = "dapo/_models/wu_scaled_markers.osim"
/// xml_input = "_templates/wu_so.xml"
/// sto_output = "dapo/3_static_optimization"
/// trials_dir = "dapo/1_inverse_kinematic"
/// prefix = "wu"
/// low_pass = 5
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub kind: String,
    pub model: PathBuf,
    pub xml_input: PathBuf,
    #[serde(default)]
    pub xml_output: Option<PathBuf>,
    pub sto_output: PathBuf,
    #[serde(default)]
    pub trials: Vec<PathBuf>,
    #[serde(default)]
    pub trials_dir: Option<PathBuf>,
    #[serde(default)]
    pub trial_pattern: Option<String>,
    #[serde(default)]
    pub xml_forces: Option<PathBuf>,
    #[serde(default)]
    pub ext_forces_dir: Option<PathBuf>,
    #[serde(default)]
    pub forces_file: Option<String>,
    #[serde(default)]
    pub xml_actuators: Option<PathBuf>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub low_pass: Option<f64>,
    #[serde(default)]
    pub time_range: Option<Vec<f64>>,
    #[serde(default)]
    pub remove_empty_files: bool,
    #[serde(default)]
    pub empty_threshold: Option<u64>,
    #[serde(default)]
    pub contains: Option<String>,
    #[serde(default)]
    pub print_to_xml: bool,
    #[serde(default)]
    pub multi: bool,
}

impl JobFile {
    /// 校验并转换为分析请求
    ///
    /// 分析类型和时间范围在这里就会报错，不会等到引擎调用
    pub async fn into_request(self) -> AppResult<AnalysisRequest> {
        let kind: AnalysisKind = self.kind.parse()?;

        let mut trials = self.trials;
        if let Some(dir) = &self.trials_dir {
            let pattern = self.trial_pattern.as_deref().unwrap_or(DEFAULT_TRIAL_PATTERN);
            trials.extend(discover_trials(dir, pattern).await?);
        }
        if trials.is_empty() {
            return Err(ConfigError::NoTrials.into());
        }

        if self.print_to_xml && self.xml_output.is_none() {
            return Err(ConfigError::MissingField { field: "xml_output" }.into());
        }
        if self.xml_forces.is_some() && self.ext_forces_dir.is_none() {
            return Err(ConfigError::MissingField { field: "ext_forces_dir" }.into());
        }

        let mut request = AnalysisRequest::new(
            kind,
            ModelSource::Path(self.model),
            self.xml_input,
            self.sto_output,
            trials,
        )
        .with_time_range(self.time_range.as_deref())?;

        request.xml_output = self.xml_output;
        request.xml_forces = self.xml_forces;
        request.ext_forces_dir = self.ext_forces_dir;
        request.forces_file = self
            .forces_file
            .filter(|file| !file.trim().is_empty())
            .map(|file| absolute_text(&file))
            .transpose()?;
        request.xml_actuators = self.xml_actuators;
        request.prefix = self.prefix;
        request.low_pass = self.low_pass;
        request.print_to_xml = self.print_to_xml;
        request.post = PostProcessing {
            remove_empty_files: self.remove_empty_files,
            empty_threshold: self.empty_threshold.unwrap_or(DEFAULT_EMPTY_THRESHOLD),
            contains: self.contains,
        };
        request.run_mode = if self.multi {
            RunMode::Parallel
        } else {
            RunMode::Sequential
        };

        Ok(request)
    }
}

/// 从 TOML 文件加载任务并转换为分析请求
pub async fn load_job(job_path: &Path) -> AppResult<AnalysisRequest> {
    let content = fs::read_to_string(job_path)
        .await
        .map_err(|e| AppError::file_read_failed(job_path, e))?;

    let job: JobFile = toml::from_str(&content).map_err(|e| ParseError::Toml {
        path: job_path.display().to_string(),
        source: e,
    })?;

    job.into_request().await
}

/// 写进引擎设置文件的路径需为绝对路径
fn absolute_text(file: &str) -> AppResult<String> {
    let path = Path::new(file);
    std::path::absolute(path)
        .map(|p| p.display().to_string())
        .map_err(|e| AppError::file_read_failed(path, e))
}

/// 在目录中查找匹配的试次文件，按路径排序
pub async fn discover_trials(folder: &Path, pattern: &str) -> AppResult<Vec<PathBuf>> {
    let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })?;

    if !folder.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: folder.to_path_buf(),
        }
        .into());
    }

    let mut trials = Vec::new();
    let mut entries = fs::read_dir(folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder, e))?
    {
        let path = entry.path();
        let file_name = path.file_name().unwrap_or_default().to_string_lossy().to_string();
        if path.is_file() && regex.is_match(&file_name) {
            trials.push(path);
        }
    }

    trials.sort();
    tracing::info!("在 {} 中找到 {} 个试次", folder.display(), trials.len());

    Ok(trials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeRange;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_job_with_trial_directory() {
        let dir = tempfile::tempdir().unwrap();
        let trials_dir = dir.path().join("1_inverse_kinematic");
        std::fs::create_dir(&trials_dir).unwrap();
        write(&trials_dir, "wu_walk02.mot", "");
        write(&trials_dir, "wu_walk01.mot", "");
        write(&trials_dir, "notes.txt", "");

        let job = format!(
            r#"
kind = "JointReaction"
model = "model.osim"
xml_input = "jr.xml"
sto_output = "out"
trials_dir = "{}"
time_range = [2.0, 5.0]
remove_empty_files = true
contains = "walk"
multi = true
"#,
            trials_dir.display().to_string().replace('\\', "/")
        );
        let job_path = write(dir.path(), "job.toml", &job);

        let request = load_job(&job_path).await.unwrap();
        assert_eq!(request.kind, AnalysisKind::JointReaction);
        assert_eq!(request.trials.len(), 2);
        assert!(request.trials[0].ends_with("wu_walk01.mot"));
        assert_eq!(request.time_range, Some(TimeRange::new(2.0, 5.0)));
        assert_eq!(request.run_mode, RunMode::Parallel);
        assert!(request.post.remove_empty_files);
        assert_eq!(request.post.empty_threshold, DEFAULT_EMPTY_THRESHOLD);
        assert_eq!(request.post.contains.as_deref(), Some("walk"));
    }

    #[tokio::test]
    async fn test_unknown_kind_rejected_before_anything_else() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = write(
            dir.path(),
            "job.toml",
            r#"
kind = "InverseDynamics"
model = "model.osim"
xml_input = "id.xml"
sto_output = "out"
trials = ["a.mot"]
"#,
        );
        let err = load_job(&job_path).await.unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::UnknownAnalysisKind { .. })));
    }

    #[tokio::test]
    async fn test_bad_time_range_shape() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = write(
            dir.path(),
            "job.toml",
            r#"
kind = "StaticOptimization"
model = "model.osim"
xml_input = "so.xml"
sto_output = "out"
trials = ["a.mot"]
time_range = [1.0, 2.0, 3.0]
"#,
        );
        let err = load_job(&job_path).await.unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::InvalidTimeRange { len: 3 })));
    }

    #[tokio::test]
    async fn test_job_without_trials() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = write(
            dir.path(),
            "job.toml",
            "kind = \"so\"\nmodel = \"m.osim\"\nxml_input = \"so.xml\"\nsto_output = \"out\"\n",
        );
        let err = load_job(&job_path).await.unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::NoTrials)));
    }

    #[tokio::test]
    async fn test_forces_file_made_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = write(
            dir.path(),
            "job.toml",
            r#"
kind = "jr"
model = "model.osim"
xml_input = "jr.xml"
sto_output = "out"
trials = ["a.mot"]
forces_file = "so/wu_walk01_StaticOptimization_force.sto"
"#,
        );
        let request = load_job(&job_path).await.unwrap();
        let forces_file = PathBuf::from(request.forces_file.unwrap());
        assert!(forces_file.is_absolute());
        assert!(forces_file.ends_with("so/wu_walk01_StaticOptimization_force.sto"));
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let job_path = write(dir.path(), "job.toml", "kind = ");
        let err = load_job(&job_path).await.unwrap_err();
        assert!(matches!(err, AppError::Parse(ParseError::Toml { .. })));
    }
}
