// src/models.rs

use crate::{error::AppError, symbols};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

/// 合并结果中的一行：URL 及由其推导出的文件名
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UrlRecord {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "File Name")]
    pub file_name: String,
}

/// 同一前缀下去重后的 URL 集合，顺序为首次出现的顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedGroup {
    pub prefix: String,
    pub records: Vec<UrlRecord>,
}

impl MergedGroup {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupOutcome {
    pub urls: Vec<String>,
    pub before: usize,
    pub after: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub expected_local_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_fetch: Vec<DownloadTask>,
    pub skipped_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditEntry {
    pub category_key: String,
    pub file_count: u64,
    pub total_bytes: u64,
    pub removed_duplicate_count: u64,
    pub removed_other_count: u64,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FetchStatus {
    Success,
    HttpError,
    ContentTypeMismatch,
    Truncated,
    NetworkError,
    TimeoutError,
    IoError,
    UnexpectedError,
}

impl FetchStatus {
    pub fn get_display_info(
        &self,
    ) -> (
        &'static ColoredString,
        fn(ColoredString) -> ColoredString,
        &'static str,
    ) {
        match self {
            FetchStatus::Success => (&symbols::OK, |s| s.green(), "下载成功"),
            FetchStatus::HttpError => (&symbols::ERROR, |s| s.red(), "服务器返回错误"),
            FetchStatus::ContentTypeMismatch => {
                (&symbols::ERROR, |s| s.red(), "响应类型与预期不符")
            }
            FetchStatus::Truncated => (&symbols::ERROR, |s| s.red(), "数据流不完整"),
            FetchStatus::NetworkError => (&symbols::ERROR, |s| s.red(), "网络请求失败"),
            FetchStatus::TimeoutError => (&symbols::WARN, |s| s.yellow(), "网络连接超时"),
            FetchStatus::IoError => (&symbols::ERROR, |s| s.red(), "本地文件读写错误"),
            FetchStatus::UnexpectedError => (&symbols::ERROR, |s| s.red(), "发生未预期的程序错误"),
        }
    }
}

impl From<&AppError> for FetchStatus {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Network(e) if e.is_timeout() => FetchStatus::TimeoutError,
            AppError::Network(e) if e.is_status() => FetchStatus::HttpError,
            AppError::Network(_) => FetchStatus::NetworkError,
            AppError::HttpStatus(_) => FetchStatus::HttpError,
            AppError::ContentTypeMismatch { .. } => FetchStatus::ContentTypeMismatch,
            AppError::Truncated { .. } => FetchStatus::Truncated,
            AppError::Io(_) | AppError::TempFilePersist(_) => FetchStatus::IoError,
            _ => FetchStatus::UnexpectedError,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub name: String,
    pub status: FetchStatus,
    pub message: Option<String>,
}
