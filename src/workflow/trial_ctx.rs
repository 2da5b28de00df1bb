//! 试次处理上下文
//!
//! 封装"我正在处理第几个试次、是哪个文件"这一信息

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// 试次处理上下文
#[derive(Debug, Clone)]
pub struct TrialCtx {
    /// 试次索引（从1开始，仅用于日志显示）
    pub trial_index: usize,

    /// 试次总数
    pub total: usize,

    /// 试次文件
    pub path: PathBuf,

    /// 文件名去掉扩展名
    pub stem: String,
}

impl TrialCtx {
    /// 创建新的试次上下文
    pub fn new(trial_index: usize, total: usize, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            trial_index,
            total,
            path,
            stem,
        }
    }
}

impl Display for TrialCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[试次 {}/{} {}]", self.trial_index, self.total, self.stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_and_display() {
        let ctx = TrialCtx::new(2, 5, "/data/1_inverse_kinematic/wu_walk01.mot");
        assert_eq!(ctx.stem, "wu_walk01");
        assert_eq!(ctx.to_string(), "[试次 2/5 wu_walk01]");
    }
}
