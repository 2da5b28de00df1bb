use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（分析类型、时间范围、任务文件等）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// XML / 运动文件解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),
    /// 模板参数缺失或类型不符
    #[error("参数错误: {0}")]
    Param(#[from] ParamError),
    /// 仿真引擎执行错误
    #[error("引擎错误: {0}")]
    Engine(#[from] EngineError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 配置错误
///
/// 这类错误都在任何引擎调用之前抛出
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 未知的分析类型
    #[error("未知的分析类型: '{name}'（可选: StaticOptimization, MuscleAnalysis, JointReaction）")]
    UnknownAnalysisKind { name: String },
    /// 时间范围必须是 [start, end] 两个元素
    #[error("时间范围必须包含起止两个时间点，实际得到 {len} 个")]
    InvalidTimeRange { len: usize },
    /// 没有任何试次文件
    #[error("没有找到任何试次文件")]
    NoTrials,
    /// 正则表达式无效
    #[error("试次匹配规则无效 '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// 任务文件缺少必要字段
    #[error("任务文件缺少字段: {field}")]
    MissingField { field: &'static str },
}

/// 解析错误
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML 格式错误
    #[error("XML 格式错误 ({path}): {message}")]
    Xml { path: String, message: String },
    /// 运动数据文件格式错误
    #[error("运动文件格式错误 ({path}): {message}")]
    Storage { path: String, message: String },
    /// TOML 任务文件解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 模板参数错误
#[derive(Debug, Error)]
pub enum ParamError {
    /// 模板中缺少参数
    #[error("<{node}> 中缺少参数 <{key}>")]
    Missing { node: String, key: String },
    /// 参数类型不符
    #[error("<{node}> 中参数 <{key}> 应为 {expected}，实际为 {found}")]
    WrongType {
        node: String,
        key: String,
        expected: &'static str,
        found: String,
    },
}

/// 仿真引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    /// 无法启动引擎进程
    #[error("无法启动引擎 '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// 引擎运行失败（非零退出码）
    #[error("试次 {trial} 运行失败 (退出码: {code:?}): {stderr}")]
    RunFailed {
        trial: String,
        code: Option<i32>,
        stderr: String,
    },
    /// 后台任务异常退出
    #[error("试次 {trial} 的后台任务异常退出: {message}")]
    TaskAborted { trial: String, message: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {}", .path.display())]
    NotFound { path: PathBuf },
    /// 读取文件失败
    #[error("读取文件失败 ({}): {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({}): {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 删除文件失败
    #[error("删除文件失败 ({}): {source}", .path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建 XML 解析错误
    pub fn xml(path: impl Into<String>, message: impl ToString) -> Self {
        AppError::Parse(ParseError::Xml {
            path: path.into(),
            message: message.to_string(),
        })
    }

    /// 创建运动文件解析错误
    pub fn storage(path: impl Into<String>, message: impl ToString) -> Self {
        AppError::Parse(ParseError::Storage {
            path: path.into(),
            message: message.to_string(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件删除错误
    pub fn file_delete_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::File(FileError::DeleteFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
