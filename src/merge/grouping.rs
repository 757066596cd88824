// src/merge/grouping.rs

use super::{codec, dedup};
use crate::{
    error::AppResult,
    models::{MergedGroup, UrlRecord},
    utils,
};
use log::{debug, info, warn};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// 列出目录下的普通文件，按文件名排序以保证每次运行的顺序一致
pub fn list_raw_files(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!("读取目录 '{}' 中的条目失败: {}", dir.display(), e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(files)
}

/// 按标记之前的前缀分组。组的顺序为前缀首次出现的顺序，组内保持输入顺序。
pub fn group_files(paths: &[PathBuf], marker: &str) -> Vec<(String, Vec<PathBuf>)> {
    let mut groups: Vec<(String, Vec<PathBuf>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for path in paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            continue;
        };
        let Some((prefix, _)) = name.split_once(marker) else {
            debug!("跳过 '{}' (文件名不含标记 '{}')", name, marker);
            continue;
        };
        match index.get(prefix) {
            Some(&i) => groups[i].1.push(path.clone()),
            None => {
                index.insert(prefix.to_string(), groups.len());
                groups.push((prefix.to_string(), vec![path.clone()]));
            }
        }
    }
    groups
}

/// 解码组内所有文件并去重。没有任何有效 URL 时返回 `None`。
pub fn merge_group(prefix: &str, files: &[PathBuf]) -> Option<MergedGroup> {
    info!("处理分组 '{}'，共 {} 个文件", prefix, files.len());
    let urls = files.iter().flat_map(|path| {
        debug!("  - {}", path.display());
        codec::decode_file(path)
    });
    let outcome = dedup::dedupe(urls);
    info!(
        "分组 '{}' 去重前 {} 个 URL，去重后 {} 个",
        prefix, outcome.before, outcome.after
    );

    if outcome.urls.is_empty() {
        warn!("分组 '{}' 没有找到有效的 URL，跳过。", prefix);
        return None;
    }

    let records = outcome
        .urls
        .into_iter()
        .map(|url| UrlRecord {
            file_name: utils::url_last_segment(&url),
            url,
        })
        .collect();
    Some(MergedGroup {
        prefix: prefix.to_string(),
        records,
    })
}
