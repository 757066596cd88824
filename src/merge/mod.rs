// src/merge/mod.rs

pub mod codec;
pub mod dedup;
pub mod grouping;
pub mod source;

pub use grouping::{group_files, list_raw_files, merge_group};
pub use source::{MergedCsvSource, RecordSource};

use crate::{constants::artifacts, error::*, models::MergedGroup};
use log::{info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// 写出 `<prefix>_merged.csv`，表头为 `URL,File Name`
pub fn write_merged_csv(group: &MergedGroup, output_dir: &Path) -> AppResult<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let out_path = output_dir.join(format!("{}{}", group.prefix, artifacts::MERGED_SUFFIX));

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(&out_path)?;
    for record in &group.records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;

    info!(
        "已写出 {} 个唯一 URL 到 '{}'",
        group.len(),
        out_path.display()
    );
    Ok(out_path)
}

/// 列出目录下所有 `*_merged.csv`，按文件名排序
pub fn list_merged_csvs(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let files = list_raw_files(dir)?;
    let (merged, others): (Vec<PathBuf>, Vec<PathBuf>) = files.into_iter().partition(|p| {
        p.file_name()
            .map(|n| n.to_string_lossy().ends_with(artifacts::MERGED_SUFFIX))
            .unwrap_or(false)
    });
    for path in others {
        warn!(
            "跳过 '{}': 文件名不以 '{}' 结尾",
            path.display(),
            artifacts::MERGED_SUFFIX
        );
    }
    Ok(merged)
}
