// src/downloader/direct.rs

use super::Fetcher;
use crate::{
    PipelineContext,
    error::*,
    models::{DownloadTask, FetchResult, FetchStatus},
    ui, utils,
};
use async_trait::async_trait;
use futures::StreamExt;
use indicatif::ProgressBar;
use log::{debug, error, info, warn};
use reqwest::header;
use std::{
    fs,
    io::Write as IoWrite,
    path::{Path, PathBuf},
};

/// 逐个通过 HTTP 下载，先写入同目录下的临时文件，成功后再原子重命名
pub struct DirectFetcher {
    context: PipelineContext,
}

impl DirectFetcher {
    pub fn new(context: PipelineContext) -> Self {
        Self { context }
    }

    /// 带线性退避的重试：第 n 次失败后等待 `backoff * n`
    pub async fn fetch_one(&self, task: &DownloadTask, dest_dir: &Path) -> FetchResult {
        let fetch_config = &self.context.config.fetch;
        let max_attempts = fetch_config.max_attempts.max(1);
        let mut last_error: Option<AppError> = None;

        for attempt in 1..=max_attempts {
            match self.download_to_final(task, dest_dir).await {
                Ok(path) => {
                    info!("下载完成: {}", path.display());
                    return FetchResult {
                        name: task.expected_local_name.clone(),
                        status: FetchStatus::Success,
                        message: None,
                    };
                }
                Err(e @ AppError::Security(_)) => {
                    error!("拒绝写入 '{}': {}", task.expected_local_name, e);
                    last_error = Some(e);
                    break;
                }
                Err(e) => {
                    warn!(
                        "[{}/{}] 下载 '{}' 失败: {}",
                        attempt, max_attempts, task.url, e
                    );
                    last_error = Some(e);
                    if attempt < max_attempts {
                        tokio::time::sleep(fetch_config.backoff * attempt).await;
                    }
                }
            }
        }

        let (status, message) = match &last_error {
            Some(e) => (FetchStatus::from(e), Some(e.to_string())),
            None => (FetchStatus::UnexpectedError, None),
        };
        error!("'{}' 在 {} 次尝试后仍然失败", task.url, max_attempts);
        FetchResult {
            name: task.expected_local_name.clone(),
            status,
            message,
        }
    }

    async fn download_to_final(&self, task: &DownloadTask, dest_dir: &Path) -> AppResult<PathBuf> {
        let final_path = utils::secure_join_path(dest_dir, Path::new(&task.expected_local_name))?;
        let res = self.context.http_client.get(&task.url).await?;

        let expected_type = self.context.config.fetch.expected_content_type.to_lowercase();
        if !expected_type.is_empty() {
            let actual = res
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_lowercase();
            if !actual.contains(&expected_type) {
                return Err(AppError::ContentTypeMismatch {
                    expected: expected_type,
                    actual,
                });
            }
        }

        let expected_len = res.content_length();
        let mut tmp = tempfile::Builder::new()
            .prefix(".harvest-")
            .suffix(".part")
            .tempfile_in(dest_dir)?;
        debug!("临时文件: {}", tmp.path().display());

        // 出错返回时 tmp 被丢弃，临时文件随之删除，最终路径上不会出现残缺文件
        let mut written: u64 = 0;
        let mut stream = res.bytes_stream();
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            tmp.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        if let Some(expected) = expected_len
            && written < expected
        {
            return Err(AppError::Truncated {
                expected,
                actual: written,
            });
        }
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&final_path)?;
        Ok(final_path)
    }
}

#[async_trait]
impl Fetcher for DirectFetcher {
    async fn fetch(&self, prefix: &str, tasks: &[DownloadTask], dest_dir: &Path) -> AppResult<()> {
        fs::create_dir_all(dest_dir)?;
        ui::info(&format!(
            "开始下载分组 '{}' 中的 {} 个文件...",
            prefix,
            tasks.len()
        ));

        let pbar: ProgressBar = ui::new_tasks_progress_bar(tasks.len() as u64, "下载");
        for task in tasks {
            pbar.set_message(utils::truncate_text(&task.expected_local_name, 40));
            let result = self.fetch_one(task, dest_dir).await;
            match result.status {
                FetchStatus::Success => {
                    self.context.manager.record_success();
                    let (symbol, _, _) = result.status.get_display_info();
                    pbar.println(format!("{} {}", symbol, result.name));
                }
                status => {
                    self.context.manager.record_failure(&result.name, status);
                    let (symbol, color_fn, default_msg) = status.get_display_info();
                    let detail = result.message.unwrap_or_default();
                    pbar.println(format!(
                        "{} {} {}",
                        symbol,
                        result.name,
                        color_fn(format!("失败: {} (详情: {})", default_msg, detail).into())
                    ));
                }
            }
            pbar.inc(1);
        }
        pbar.finish_and_clear();
        Ok(())
    }
}
