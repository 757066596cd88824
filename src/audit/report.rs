// src/audit/report.rs

use crate::{constants::artifacts, error::AppResult, models::AuditEntry, ui};
use log::info;
use std::{
    fs,
    path::{Path, PathBuf},
};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone)]
pub struct RootSummary {
    pub root: PathBuf,
    pub entries: Vec<AuditEntry>,
}

pub fn capacity_gb(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_GB)
}

/// 每个 (根目录, 分类) 一行，分类按名称排序
pub fn write_report(path: &Path, summaries: &[RootSummary]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    wtr.write_record(artifacts::REPORT_HEADER)?;

    for summary in summaries {
        let folder = summary.root.display().to_string();
        for entry in sorted_entries(&summary.entries) {
            wtr.write_record([
                folder.clone(),
                entry.category_key.clone(),
                entry.file_count.to_string(),
                capacity_gb(entry.total_bytes),
                entry.removed_duplicate_count.to_string(),
                entry.removed_other_count.to_string(),
            ])?;
        }
    }
    wtr.flush()?;
    info!("统计报告已写入 '{}'", path.display());
    Ok(())
}

fn sorted_entries(entries: &[AuditEntry]) -> Vec<&AuditEntry> {
    let mut sorted: Vec<&AuditEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.category_key.cmp(&b.category_key));
    sorted
}

pub fn print_summary(summaries: &[RootSummary]) {
    for summary in summaries {
        ui::print_sub_header(&summary.root.display().to_string());
        if summary.entries.is_empty() {
            ui::info("没有找到任何分类目录。");
            continue;
        }
        println!(
            "  {:<24} {:>8} {:>14} {:>12} {:>14}",
            "Path", "Count", "Capacity (GB)", "Removed Dups", "Removed Others"
        );
        for entry in sorted_entries(&summary.entries) {
            println!(
                "  {:<24} {:>8} {:>14} {:>12} {:>14}",
                entry.category_key,
                entry.file_count,
                capacity_gb(entry.total_bytes),
                entry.removed_duplicate_count,
                entry.removed_other_count
            );
        }
    }
}
