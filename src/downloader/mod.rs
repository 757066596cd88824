// src/downloader/mod.rs

mod delegated;
mod direct;
pub mod reconciler;

pub use delegated::DelegatedFetcher;
pub use direct::DirectFetcher;
pub use reconciler::{LastSegmentNaming, NamingStrategy, VideoIdNaming, naming_for, reconcile};

use crate::{
    PipelineContext,
    cli::FetchStrategy,
    error::AppResult,
    models::{DownloadTask, FetchStatus},
    symbols, ui,
};
use async_trait::async_trait;
use colored::*;
use log::info;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

/// 执行实际传输的下载器。调用方保证 `tasks` 非空。
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, prefix: &str, tasks: &[DownloadTask], dest_dir: &Path) -> AppResult<()>;
}

/// 根据配置的策略创建下载器
pub fn fetcher_for(context: &PipelineContext) -> Box<dyn Fetcher> {
    let fetch_config = &context.config.fetch;
    match fetch_config.strategy {
        FetchStrategy::Direct => Box::new(DirectFetcher::new(context.clone())),
        FetchStrategy::Aria2 => Box::new(
            DelegatedFetcher::new(context.clone(), fetch_config.aria2.clone())
                .with_output_names(),
        ),
        FetchStrategy::YtDlp => Box::new(DelegatedFetcher::new(
            context.clone(),
            fetch_config.yt_dlp.clone(),
        )),
    }
}

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct FetchStats {
    pub total: usize,
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct FetchManager {
    stats: Arc<Mutex<FetchStats>>,
    failed_downloads: Arc<Mutex<Vec<(String, String)>>>,
}

impl Default for FetchManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchManager {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(Mutex::new(FetchStats::default())),
            failed_downloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn stats(&self) -> std::sync::MutexGuard<'_, FetchStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn failed(&self) -> std::sync::MutexGuard<'_, Vec<(String, String)>> {
        self.failed_downloads.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 登记一个分组：`wanted` 为分组内的记录总数，`skipped` 为本地已存在的数量
    pub fn start_group(&self, prefix: &str, wanted: usize, skipped: usize) {
        info!("分组 '{}': 共 {} 项，跳过 {} 项", prefix, wanted, skipped);
        let mut stats = self.stats();
        stats.total += wanted;
        stats.skipped += skipped;
    }

    pub fn record_success(&self) {
        self.stats().success += 1;
    }

    pub fn record_successes(&self, count: usize) {
        self.stats().success += count;
    }

    pub fn record_failure(&self, name: &str, status: FetchStatus) {
        let (_, _, msg) = status.get_display_info();
        self.record_failure_with_reason(name, msg);
    }

    pub fn record_failure_with_reason(&self, name: &str, reason: &str) {
        self.stats().failed += 1;
        self.failed().push((name.to_string(), reason.to_string()));
    }

    pub fn get_stats(&self) -> FetchStats {
        self.stats().clone()
    }

    pub fn did_all_succeed(&self) -> bool {
        self.stats().failed == 0
    }

    pub fn print_report(&self) {
        let stats = self.get_stats();
        let failed = self.failed().clone();
        info!(
            "下载报告: Total={}, Success={}, Skipped={}, Failed={}",
            stats.total, stats.success, stats.skipped, stats.failed
        );

        if !failed.is_empty() {
            ui::print_sub_header("下载详情报告");
            println!("\n{} 失败的文件 ({}个):", *symbols::ERROR, stats.failed);
            print_grouped_report(&failed, |s| s.red());
        }
        ui::print_sub_header("任务总结");
        if stats.failed == 0 {
            println!(
                "{} 共 {} 项，下载 {} 项，{} 项已存在。",
                *symbols::OK,
                stats.total,
                stats.success,
                stats.skipped
            );
        } else {
            let summary = format!(
                "{} | {} | {}",
                format!("成功: {}", stats.success).green(),
                format!("失败: {}", stats.failed).red(),
                format!("跳过: {}", stats.skipped).yellow()
            );
            println!("{}", summary);
        }
    }
}

// 模块内的私有辅助函数
fn print_grouped_report(
    items: &[(String, String)],
    color_fn: fn(ColoredString) -> ColoredString,
) {
    let mut grouped: HashMap<&String, Vec<&String>> = HashMap::new();
    for (name, reason) in items {
        grouped.entry(reason).or_default().push(name);
    }
    let mut sorted_reasons: Vec<_> = grouped.keys().copied().collect();
    sorted_reasons.sort();
    for reason in sorted_reasons {
        println!("  - {}", color_fn(format!("原因: {}", reason).into()));
        let mut names = grouped[reason].clone();
        names.sort();
        for name in names {
            println!("    - {}", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_accumulates_across_groups() {
        let manager = FetchManager::new();
        manager.start_group("a", 3, 1);
        manager.record_success();
        manager.record_failure("x.pdf", FetchStatus::HttpError);
        manager.start_group("b", 2, 2);

        assert_eq!(
            manager.get_stats(),
            FetchStats { total: 5, success: 1, skipped: 3, failed: 1 }
        );
        assert!(!manager.did_all_succeed());
    }
}
