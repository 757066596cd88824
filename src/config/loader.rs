// src/config/loader.rs

use crate::{
    config::ExternalConfig, // 只需要从父模块导入结构体定义
    constants,
    error::{AppError, AppResult},
};
use anyhow::{Context, anyhow};
use log::{debug, info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(super) fn get_config_path() -> AppResult<PathBuf> {
    let path = dirs::home_dir()
        .ok_or_else(|| AppError::Other(anyhow!("无法获取用户主目录")))?
        .join(constants::CONFIG_DIR_NAME)
        .join(constants::CONFIG_FILE_NAME);
    Ok(path)
}

/// 读取配置文件。文件不存在时写出模板并返回 `ConfigMissing`，在任何处理开始前终止运行。
pub(crate) fn load_external_config(explicit_path: Option<&Path>) -> AppResult<ExternalConfig> {
    let config_path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => get_config_path()?,
    };
    debug!("配置文件路径: {}", config_path.display());

    if config_path.is_file() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("读取配置文件 '{}' 失败", config_path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件 '{}' 失败", config_path.display()))
            .map_err(AppError::from);
    }

    info!("配置文件 {:?} 不存在，将创建模板。", config_path);
    if let Err(e) = write_template(&config_path) {
        warn!("写出配置模板 '{}' 失败: {}", config_path.display(), e);
    }
    Err(AppError::ConfigMissing(config_path))
}

fn write_template(config_path: &Path) -> AppResult<()> {
    if let Some(dir) = config_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json_content = serde_json::to_string_pretty(&ExternalConfig::default_app_config())?;
    fs::write(config_path, json_content)?;
    Ok(())
}
