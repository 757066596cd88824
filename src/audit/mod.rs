// src/audit/mod.rs

pub mod report;

pub use report::{RootSummary, write_report};

use crate::{
    config::AuditConfig,
    constants::artifacts,
    error::AppResult,
    models::AuditEntry,
    symbols, utils,
};
use log::{debug, error, info, warn};
use regex::Regex;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// 单个分类目录的清理规则
#[derive(Debug, Clone, Default)]
pub struct AuditRules {
    /// 键为小写的类型名，值为小写扩展名；未列出的类型接受所有扩展名
    allowed_extensions: HashMap<String, Vec<String>>,
    duplicate_pattern: Option<Regex>,
    max_name_len: Option<usize>,
}

impl AuditRules {
    pub fn new(
        allowed_extensions: &HashMap<String, Vec<String>>,
        duplicate_pattern: Option<&str>,
        max_name_len: Option<usize>,
    ) -> AppResult<Self> {
        let allowed_extensions = allowed_extensions
            .iter()
            .map(|(file_type, exts)| {
                (
                    file_type.to_lowercase(),
                    exts.iter()
                        .map(|e| e.trim_start_matches('.').to_lowercase())
                        .collect(),
                )
            })
            .collect();
        let duplicate_pattern = duplicate_pattern.map(Regex::new).transpose()?;
        Ok(Self {
            allowed_extensions,
            duplicate_pattern,
            max_name_len: max_name_len.filter(|&n| n > 0),
        })
    }

    pub fn from_config(config: &AuditConfig) -> AppResult<Self> {
        Self::new(
            &config.allowed_extensions,
            config.duplicate_pattern.as_deref(),
            config.max_name_len,
        )
    }

    fn is_allowed(&self, file_type: &str, ext: &str) -> bool {
        match self.allowed_extensions.get(&file_type.to_lowercase()) {
            Some(allowed) => allowed.iter().any(|a| a == ext),
            None => true,
        }
    }

    fn is_duplicate(&self, name: &str) -> bool {
        self.duplicate_pattern
            .as_ref()
            .is_some_and(|re| re.is_match(name))
    }
}

/// 统计 `<root>/<语言>/<类型>` 下的每个分类目录。不存在的分类不出现在结果中。
pub fn audit_root(
    root: &Path,
    languages: &[String],
    file_types: &[String],
    rules: &AuditRules,
) -> Vec<AuditEntry> {
    if !root.is_dir() {
        warn!("无效的根目录: {}", root.display());
        crate::ui::warn(&format!("无效的根目录: {}", root.display()));
        return Vec::new();
    }

    let mut entries = Vec::new();
    for lang in languages {
        for file_type in file_types {
            let category_dir = root.join(lang).join(file_type);
            if !category_dir.is_dir() {
                continue;
            }
            let key = format!("{}/{}", lang, file_type);
            entries.push(audit_category(&category_dir, &key, file_type, rules));
        }
    }
    entries
}

pub fn audit_category(dir: &Path, category_key: &str, file_type: &str, rules: &AuditRules) -> AuditEntry {
    info!("统计分类 '{}': {}", category_key, dir.display());
    let mut entry = AuditEntry {
        category_key: category_key.to_string(),
        ..Default::default()
    };

    // 先收集再处理，避免重命名后的文件在遍历中被再次访问
    let files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("遍历 '{}' 时出错: {}", dir.display(), err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.ends_with(artifacts::JOB_FILE_SUFFIX) {
            debug!("保留下载任务文件: {}", path.display());
            continue;
        }
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if !rules.is_allowed(file_type, &ext) {
            if remove_file_logged(&path, "扩展名不在允许列表中") {
                entry.removed_other_count += 1;
                continue;
            }
        } else if rules.is_duplicate(&name) {
            if remove_file_logged(&path, "文件名符合重复规则") {
                entry.removed_duplicate_count += 1;
                continue;
            }
        }

        let path = match rules.max_name_len {
            Some(limit) if name.chars().count() > limit => match rename_long_name(&path, limit) {
                Ok(new_path) => new_path,
                Err(e) => {
                    error!("重命名 '{}' 失败: {}", path.display(), e);
                    path
                }
            },
            _ => path,
        };

        match fs::metadata(&path) {
            Ok(meta) => {
                entry.file_count += 1;
                entry.total_bytes += meta.len();
            }
            Err(e) => warn!("无法读取文件信息 '{}': {}", path.display(), e),
        }
    }

    info!(
        "分类 '{}': {} 个文件, {} 字节, 删除重复 {} 个, 删除其他 {} 个",
        entry.category_key,
        entry.file_count,
        entry.total_bytes,
        entry.removed_duplicate_count,
        entry.removed_other_count
    );
    entry
}

fn remove_file_logged(path: &Path, reason: &str) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("已删除 '{}' ({})", path.display(), reason);
            println!("{} 已删除: {}", *symbols::TRASH, path.display());
            true
        }
        Err(e) => {
            error!("删除 '{}' 失败: {}", path.display(), e);
            eprintln!("{} 删除失败: {} - {}", *symbols::WARN, path.display(), e);
            false
        }
    }
}

/// 重命名为 `<截断的主名>_<内容哈希前8位>.<扩展名>`，同名时追加 `_1`、`_2` …
pub fn rename_long_name(path: &Path, max_len: usize) -> AppResult<PathBuf> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext_part = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let digest = utils::calculate_file_md5(path)?;
    let hash = &digest[..8];
    let reserved = 1 + hash.len() + ext_part.chars().count();
    let keep = max_len.saturating_sub(reserved).max(1);
    let base = utils::truncate_chars(&stem, keep);

    let mut candidate = parent.join(format!("{}_{}{}", base, hash, ext_part));
    let mut counter = 1;
    while candidate.exists() {
        candidate = parent.join(format!("{}_{}_{}{}", base, hash, counter, ext_part));
        counter += 1;
    }

    fs::rename(path, &candidate)?;
    info!("已重命名 '{}' -> '{}'", path.display(), candidate.display());
    Ok(candidate)
}
