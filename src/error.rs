// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("未找到配置文件，已在 '{0}' 生成模板，请编辑后重新运行")]
    ConfigMissing(PathBuf),
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),
    #[error("服务器返回错误状态: {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("响应类型不符 (期望包含 '{expected}', 实际: '{actual}')")]
    ContentTypeMismatch { expected: String, actual: String },
    #[error("数据流中断 (期望 {expected} 字节, 实际 {actual} 字节)")]
    Truncated { expected: u64, actual: u64 },
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("临时文件持久化失败: {0}")]
    TempFilePersist(#[from] tempfile::PersistError),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV 读写错误: {0}")]
    Csv(#[from] csv::Error),
    #[error("文件 '{path}' 缺少 '{column}' 列")]
    MissingColumn { path: PathBuf, column: String },
    #[error("正则表达式无效: {0}")]
    Regex(#[from] regex::Error),
    #[error("无法启动外部程序 '{program}': {source}")]
    AgentMissing {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("外部程序 '{program}' 退出码异常: {code:?}")]
    AgentFailed { program: String, code: Option<i32> },
    #[error("安全错误: {0}")]
    Security(String),
    #[error("{0}")] // 只打印内部信息，不加任何前缀
    UserInputError(String),
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;
