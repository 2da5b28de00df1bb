//! 外力设置 - 业务能力层
//!
//! 只负责生成和清理单个试次的临时外力 XML

use crate::error::{AppError, AppResult};
use crate::infrastructure::xml_writer;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 临时外力设置文件
///
/// 文件名为 `<试次名>_temp.xml`，离开作用域时删除
#[derive(Debug)]
pub struct ExternalLoadsFile {
    path: PathBuf,
}

impl ExternalLoadsFile {
    /// 基于外力模板生成试次专用的外力设置
    ///
    /// # 参数
    /// - `template`: 外力模板 XML
    /// - `temp_dir`: 临时文件目录
    /// - `trial`: 试次（运动学）文件，需为绝对路径
    /// - `datafile`: 外力数据文件
    /// - `low_pass`: 运动学低通滤波截止频率
    pub fn create(
        template: &Path,
        temp_dir: &Path,
        trial: &Path,
        datafile: &Path,
        low_pass: Option<f64>,
    ) -> AppResult<Self> {
        let content = std::fs::read_to_string(template)
            .map_err(|e| AppError::file_read_failed(template, e))?;
        let document = xml_writer::external_loads_document(
            &content,
            &template.display().to_string(),
            datafile,
            trial,
            low_pass,
        )?;

        let stem = trial_stem(trial);
        let path = temp_dir.join(format!("{}_temp.xml", stem));
        std::fs::write(&path, document).map_err(|e| AppError::file_write_failed(&path, e))?;
        debug!("已生成外力设置: {}", path.display());

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ExternalLoadsFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("无法删除临时外力设置 {}: {}", self.path.display(), e);
        }
    }
}

/// 试次对应的外力数据文件：`<ext_forces_dir>/<去掉 "前缀_" 的试次名>.sto`
pub fn forces_data_file(ext_forces_dir: &Path, trial: &Path, prefix: Option<&str>) -> PathBuf {
    let stem = trial_stem(trial);
    let stem = match prefix {
        Some(prefix) if !prefix.is_empty() => stem.replace(&format!("{}_", prefix), ""),
        _ => stem,
    };
    ext_forces_dir.join(format!("{}.sto", stem))
}

fn trial_stem(trial: &Path) -> String {
    trial
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
