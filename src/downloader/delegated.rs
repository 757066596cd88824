// src/downloader/delegated.rs

use super::Fetcher;
use crate::{
    PipelineContext,
    config::AgentCommand,
    constants::{artifacts, placeholders},
    error::*,
    models::DownloadTask,
    ui,
};
use async_trait::async_trait;
use log::{error, info, warn};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tokio::process::Command;

/// 把 URL 列表写入任务文件，交给外部下载器 (aria2c / yt-dlp) 一次性处理。
/// 成功后删除任务文件，失败时保留以便手动重试。
pub struct DelegatedFetcher {
    context: PipelineContext,
    command: AgentCommand,
    /// 在任务文件中为每个 URL 写出 `out=<文件名>` (aria2c 输入文件格式)
    name_outputs: bool,
}

impl DelegatedFetcher {
    pub fn new(context: PipelineContext, command: AgentCommand) -> Self {
        Self {
            context,
            command,
            name_outputs: false,
        }
    }

    pub fn with_output_names(mut self) -> Self {
        self.name_outputs = true;
        self
    }

    pub fn job_file_path(prefix: &str, dest_dir: &Path) -> PathBuf {
        dest_dir.join(format!("{}{}", prefix, artifacts::JOB_FILE_SUFFIX))
    }

    pub fn write_job_file(&self, path: &Path, tasks: &[DownloadTask]) -> AppResult<()> {
        let mut writer = BufWriter::new(fs::File::create(path)?);
        for task in tasks {
            writeln!(writer, "{}", task.url.trim())?;
            if self.name_outputs {
                writeln!(writer, "  out={}", task.expected_local_name)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    pub fn render_args(&self, dest_dir: &Path, job_file: &Path) -> Vec<String> {
        let dir = dest_dir.to_string_lossy();
        let input_file = job_file.to_string_lossy();
        let user_agent = &self.context.config.fetch.user_agent;
        self.command
            .args
            .iter()
            .map(|arg| {
                arg.replace(placeholders::DIR, &dir)
                    .replace(placeholders::INPUT_FILE, &input_file)
                    .replace(placeholders::USER_AGENT, user_agent)
            })
            .collect()
    }
}

#[async_trait]
impl Fetcher for DelegatedFetcher {
    async fn fetch(&self, prefix: &str, tasks: &[DownloadTask], dest_dir: &Path) -> AppResult<()> {
        fs::create_dir_all(dest_dir)?;
        let job_file = Self::job_file_path(prefix, dest_dir);
        self.write_job_file(&job_file, tasks)?;
        info!("任务文件已写入: {}", job_file.display());

        let args = self.render_args(dest_dir, &job_file);
        let program = self.command.program.clone();
        ui::info(&format!(
            "调用 {} 下载分组 '{}' 中的 {} 个文件...",
            program,
            prefix,
            tasks.len()
        ));
        info!("执行: {} {}", program, args.join(" "));

        let status = Command::new(&program)
            .args(&args)
            .status()
            .await
            .map_err(|source| {
                error!("无法启动 '{}': {}", program, source);
                AppError::AgentMissing {
                    program: program.clone(),
                    source,
                }
            })?;

        if !status.success() {
            error!(
                "'{}' 处理分组 '{}' 时退出码为 {:?}，任务文件保留在 '{}'",
                program,
                prefix,
                status.code(),
                job_file.display()
            );
            return Err(AppError::AgentFailed {
                program,
                code: status.code(),
            });
        }

        info!("'{}' 已完成分组 '{}'", program, prefix);
        self.context.manager.record_successes(tasks.len());
        if let Err(e) = fs::remove_file(&job_file) {
            warn!("删除任务文件 '{}' 失败: {}", job_file.display(), e);
        }
        Ok(())
    }
}
