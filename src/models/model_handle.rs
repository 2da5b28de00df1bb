//! 模型句柄
//!
//! 模型本身由引擎加载，这里只记录模型文件和挂载在模型上的分析列表。
//! 挂载/卸载分析会修改句柄，所以每个试次都持有自己的一份。

use crate::error::{AppError, AppResult, FileError};
use crate::models::Analysis;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct ModelHandle {
    path: PathBuf,
    name: String,
    analyses: Vec<Analysis>,
}

impl ModelHandle {
    /// 加载模型文件
    ///
    /// 路径统一转为绝对路径，引擎按设置文件所在目录解析相对路径
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(FileError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let path = std::path::absolute(path).map_err(|e| AppError::file_read_failed(path, e))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self {
            path,
            name,
            analyses: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 模型名（文件名去掉扩展名）
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn analyses(&self) -> &[Analysis] {
        &self.analyses
    }

    /// 挂载分析
    pub fn add_analysis(&mut self, analysis: Analysis) {
        self.analyses.push(analysis);
    }

    /// 卸载分析，返回是否找到
    pub fn remove_analysis(&mut self, name: &str) -> bool {
        let before = self.analyses.len();
        self.analyses.retain(|a| a.name != name);
        self.analyses.len() != before
    }
}

/// 模型来源：文件路径，或已加载的句柄
#[derive(Debug, Clone)]
pub enum ModelSource {
    Path(PathBuf),
    Loaded(ModelHandle),
}

impl ModelSource {
    /// 为单个试次取得一份独立的模型
    pub fn instantiate(&self) -> AppResult<ModelHandle> {
        match self {
            ModelSource::Path(path) => ModelHandle::load(path),
            ModelSource::Loaded(handle) => Ok(handle.clone()),
        }
    }
}
