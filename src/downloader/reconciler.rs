// src/downloader/reconciler.rs

use crate::{
    cli::NamingMode,
    constants::artifacts,
    models::{DownloadTask, MergedGroup, ReconcilePlan, UrlRecord},
    utils,
};
use log::{debug, warn};
use std::{collections::HashSet, fs, io, path::Path};
use url::Url;

/// 由记录推导本地文件名，并判断目录中是否已有对应文件
pub trait NamingStrategy: Send + Sync {
    fn expected_name(&self, record: &UrlRecord) -> String;
    fn is_satisfied_by(&self, expected: &str, existing_name: &str) -> bool;
}

/// 默认策略：记录自带的文件名，没有时取 URL 路径的最后一段，要求文件名完全相同
pub struct LastSegmentNaming;

impl LastSegmentNaming {
    fn name_from_url(url: &str) -> String {
        let segment = utils::url_last_segment(url);
        if segment.trim().is_empty() {
            // 以 '/' 结尾的 URL 没有可用的文件名
            return utils::md5_hex(url.as_bytes())[..8].to_string();
        }
        utils::sanitize_filename(&segment)
    }
}

impl NamingStrategy for LastSegmentNaming {
    fn expected_name(&self, record: &UrlRecord) -> String {
        if record.file_name.trim().is_empty() {
            Self::name_from_url(&record.url)
        } else {
            utils::sanitize_filename(&record.file_name)
        }
    }

    fn is_satisfied_by(&self, expected: &str, existing_name: &str) -> bool {
        existing_name == expected
    }
}

/// 视频策略：URL 中的视频 ID，外部下载器会把它放在文件名开头，
/// 标题与扩展名不确定，因此按前缀匹配
pub struct VideoIdNaming;

impl VideoIdNaming {
    fn extract_id(url: &str) -> Option<String> {
        if let Ok(parsed) = Url::parse(url) {
            if let Some((_, id)) = parsed.query_pairs().find(|(k, _)| k == "v") {
                return Some(id.into_owned());
            }
        }
        url.rsplit_once("v=").map(|(_, id)| {
            id.split(['&', '#']).next().unwrap_or_default().to_string()
        })
    }
}

impl NamingStrategy for VideoIdNaming {
    fn expected_name(&self, record: &UrlRecord) -> String {
        match Self::extract_id(&record.url).filter(|id| !id.is_empty()) {
            Some(id) => utils::sanitize_filename(&id),
            None => LastSegmentNaming.expected_name(record),
        }
    }

    fn is_satisfied_by(&self, expected: &str, existing_name: &str) -> bool {
        existing_name.starts_with(expected)
    }
}

pub fn naming_for(mode: NamingMode) -> Box<dyn NamingStrategy> {
    match mode {
        NamingMode::LastSegment => Box::new(LastSegmentNaming),
        NamingMode::VideoId => Box::new(VideoIdNaming),
    }
}

fn list_existing_names(dest_dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dest_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!("无法读取目录 '{}': {}，按空目录处理", dest_dir.display(), e);
            return Vec::new();
        }
    };
    let names: HashSet<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();

    // 未完成的下载不算已存在：临时文件本身，以及仍带有 aria2 控制文件的目标文件
    names
        .iter()
        .filter(|name| {
            if is_partial(name) {
                debug!("忽略未完成的文件: {}", name);
                return false;
            }
            let control = format!("{}{}", name, artifacts::ARIA2_CONTROL_SUFFIX);
            if names.contains(&control) {
                debug!("'{}' 仍在下载中 (存在 {})", name, control);
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

fn is_partial(name: &str) -> bool {
    artifacts::PARTIAL_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// 计算分组中本地尚未存在的部分。目录内容只读取一次。
pub fn reconcile(group: &MergedGroup, dest_dir: &Path, naming: &dyn NamingStrategy) -> ReconcilePlan {
    let existing = list_existing_names(dest_dir);
    let mut plan = ReconcilePlan::default();

    for record in &group.records {
        let expected = naming.expected_name(record);
        if existing.iter().any(|name| naming.is_satisfied_by(&expected, name)) {
            debug!("已存在，跳过: {}", expected);
            plan.skipped_count += 1;
        } else {
            plan.to_fetch.push(DownloadTask {
                url: record.url.clone(),
                expected_local_name: expected,
            });
        }
    }
    plan
}
