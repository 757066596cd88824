// src/lib.rs

pub mod audit;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod error;
pub mod merge;
pub mod models;
pub mod symbols;
pub mod ui;
pub mod utils;
pub mod workflows;

use crate::{
    cli::Cli,
    client::RobustClient,
    config::AppConfig,
    downloader::FetchManager,
    error::AppResult,
};
use colored::*;
use log::debug;
use std::sync::Arc;

/// 一次运行所需的全部状态，在入口处构造后显式传给各个流程
#[derive(Clone)]
pub struct PipelineContext {
    pub config: Arc<AppConfig>,
    pub http_client: Arc<RobustClient>,
    pub manager: FetchManager,
    pub args: Arc<Cli>,
}

impl PipelineContext {
    pub fn new(config: Arc<AppConfig>, args: Arc<Cli>) -> AppResult<Self> {
        let http_client = Arc::new(RobustClient::new(&config.fetch)?);
        Ok(Self {
            config,
            http_client,
            manager: FetchManager::new(),
            args,
        })
    }
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);
    if args.config_help {
        ui::box_message(
            "配置文件说明",
            constants::HELP_CONFIG_GUIDE
                .lines()
                .collect::<Vec<_>>()
                .as_slice(),
            |s| s.cyan(),
        );
        return Ok(());
    }

    // 配置缺失是唯一会在开始处理前直接终止的错误
    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);

    let context = PipelineContext::new(config, args.clone())?;

    if args.merge {
        workflows::run_merge(&context).await.map(drop)
    } else if args.fetch {
        workflows::run_fetch(&context).await
    } else if args.audit {
        workflows::run_audit(&context).await.map(drop)
    } else if args.pipeline {
        workflows::run_pipeline(&context).await
    } else {
        Ok(())
    }
}
