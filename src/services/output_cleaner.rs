//! 输出目录清理 - 业务能力层
//!
//! 只负责按大小或文件名删除结果文件，不关心是哪个试次产生的

use crate::error::{AppError, AppResult, FileError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 删除目录中小于阈值的文件（视为运行失败的空结果）
///
/// # 参数
/// - `directory`: 结果目录
/// - `threshold`: 阈值（字节）
///
/// # 返回
/// 被删除的文件
pub fn remove_empty_files(directory: &Path, threshold: u64) -> AppResult<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for path in list_files(directory)? {
        let size = std::fs::metadata(&path)
            .map_err(|e| AppError::file_read_failed(&path, e))?
            .len();
        if size < threshold {
            debug!("删除空文件 {} ({} 字节)", path.display(), size);
            delete(&path)?;
            removed.push(path);
        }
    }

    if !removed.is_empty() {
        warn!("🧹 删除了 {} 个小于 {} 字节的文件", removed.len(), threshold);
    }
    Ok(removed)
}

/// 只保留文件名（不含扩展名）包含 `contains` 的文件
///
/// # 返回
/// 被删除的文件
pub fn subset_output(directory: &Path, contains: &str) -> AppResult<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for path in list_files(directory)? {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        if !stem.contains(contains) {
            debug!("删除不含 '{}' 的文件 {}", contains, path.display());
            delete(&path)?;
            removed.push(path);
        }
    }

    if !removed.is_empty() {
        warn!("🧹 删除了 {} 个文件名不含 '{}' 的文件", removed.len(), contains);
    }
    Ok(removed)
}

/// 目录中的普通文件（不含子目录），按路径排序
fn list_files(directory: &Path) -> AppResult<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: directory.to_path_buf(),
        }
        .into());
    }

    let entries =
        std::fs::read_dir(directory).map_err(|e| AppError::file_read_failed(directory, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AppError::file_read_failed(directory, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn delete(path: &Path) -> AppResult<()> {
    std::fs::remove_file(path).map_err(|e| AppError::file_delete_failed(path, e))
}
