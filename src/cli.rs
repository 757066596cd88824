// src/cli.rs

use clap::{Parser, ValueEnum, crate_version};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// 下载策略：直接 HTTP 下载，或交给外部下载器
#[derive(ValueEnum, Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStrategy {
    #[default]
    Direct,
    Aria2,
    #[value(name = "yt-dlp")]
    #[serde(rename = "yt-dlp")]
    YtDlp,
}

/// 本地文件名的推导方式
#[derive(ValueEnum, Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NamingMode {
    #[default]
    LastSegment,
    VideoId,
}

// command 属性
#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("mode")
        .required(true)
        .args(&["merge", "fetch", "audit", "pipeline", "config_help"]),
))]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// 解码并合并原始导出文件，生成 <前缀>_merged.csv
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub merge: bool,
    /// 根据 *_merged.csv 下载本地缺失的文件
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub fetch: bool,
    /// 统计下载目录并清理多余文件，输出报告
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub audit: bool,
    /// 依次执行 合并 -> 下载 -> 统计
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub pipeline: bool,
    /// 显示配置文件说明并退出
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub config_help: bool,

    // --- 选项 (Options) ---
    /// 指定配置文件路径
    #[arg(short, long, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,
    /// 覆盖当前模式的输入目录
    #[arg(long, value_name = "DIR", help_heading = "Options")]
    pub input: Option<PathBuf>,
    /// 覆盖当前模式的输出目录
    #[arg(short, long, value_name = "DIR", help_heading = "Options")]
    pub output: Option<PathBuf>,
    /// [合并] 文件名中的分组标记
    #[arg(long, value_name = "TEXT", help_heading = "Options")]
    pub marker: Option<String>,
    /// [下载] 下载策略
    #[arg(long, value_enum, help_heading = "Options")]
    pub strategy: Option<FetchStrategy>,
    /// [下载] 判断文件是否已存在时使用的命名方式
    #[arg(long, value_enum, help_heading = "Options")]
    pub naming: Option<NamingMode>,
    /// [统计] 报告 CSV 的输出路径
    #[arg(long, value_name = "FILE", help_heading = "Options")]
    pub report: Option<PathBuf>,
    /// [统计] 删除文件名符合重复规则的文件 (如 xxx_2.pdf)
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub prune_duplicates: bool,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}
