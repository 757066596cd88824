// src/config.rs

pub mod loader;

use self::loader::load_external_config;
use crate::{
    cli::{Cli, FetchStrategy, NamingMode},
    constants,
    error::AppResult,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

/// 外部下载器的命令模板，参数中的 `{dir}` `{input_file}` `{user_agent}` 会在运行时替换
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl AgentCommand {
    pub fn aria2() -> Self {
        Self {
            program: "aria2c".into(),
            args: vec![
                "--dir={dir}".into(),
                "--continue=true".into(),
                "--split=4".into(),
                "--max-connection-per-server=4".into(),
                "--user-agent={user_agent}".into(),
                "--input-file={input_file}".into(),
            ],
        }
    }

    pub fn yt_dlp() -> Self {
        Self {
            program: "yt-dlp".into(),
            args: vec![
                "-a".into(),
                "{input_file}".into(),
                "-o".into(),
                // 以视频 ID 开头，便于下次运行时按前缀识别已下载的文件
                "{dir}/%(id)s %(title)s.%(ext)s".into(),
                "-f".into(),
                "bestvideo+bestaudio/best".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MergeSection {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FetchSection {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub strategy: FetchStrategy,
    /// 未设置时按下载策略选择：yt-dlp 使用视频 ID，其余使用 URL 最后一段
    pub naming: Option<NamingMode>,
    pub expected_content_type: Option<String>,
    pub max_attempts: Option<u32>,
    pub backoff_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub aria2: Option<AgentCommand>,
    pub yt_dlp: Option<AgentCommand>,
    #[serde(default)]
    pub yt_dlp_extra_opts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditSection {
    #[serde(default)]
    pub root_paths: Vec<PathBuf>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub file_types: Vec<String>,
    #[serde(default)]
    pub allowed_extensions: HashMap<String, Vec<String>>,
    pub duplicate_pattern: Option<String>,
    pub max_name_len: Option<usize>,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default)]
    pub merge: MergeSection,
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub audit: AuditSection,
}

impl ExternalConfig {
    /// 首次运行时写出的配置模板
    pub(crate) fn default_app_config() -> Self {
        Self {
            merge: MergeSection {
                input_dir: Some("./input/urls".into()),
                output_dir: Some("./output/csvs".into()),
                marker: Some(constants::DEFAULT_MARKER.into()),
            },
            fetch: FetchSection {
                input_dir: Some("./output/csvs".into()),
                output_dir: Some("./output/EN".into()),
                strategy: FetchStrategy::Direct,
                naming: None,
                expected_content_type: Some(constants::DEFAULT_EXPECTED_CONTENT_TYPE.into()),
                max_attempts: Some(constants::DEFAULT_MAX_ATTEMPTS),
                backoff_secs: Some(constants::DEFAULT_BACKOFF_SECS),
                connect_timeout_secs: Some(10),
                timeout_secs: Some(60),
                aria2: Some(AgentCommand::aria2()),
                yt_dlp: Some(AgentCommand::yt_dlp()),
                yt_dlp_extra_opts: vec!["--no-playlist".into(), "--retries=3".into()],
            },
            audit: AuditSection {
                root_paths: vec!["./output".into()],
                languages: vec!["EN".into(), "CN".into(), "RU".into()],
                file_types: vec!["pdf".into(), "video".into()],
                allowed_extensions: HashMap::from([
                    ("pdf".into(), vec!["pdf".into()]),
                    ("video".into(), vec!["mp4".into(), "mkv".into(), "webm".into()]),
                ]),
                duplicate_pattern: None,
                max_name_len: None,
                report_path: Some(constants::DEFAULT_REPORT_FILE.into()),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub marker: String,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub strategy: FetchStrategy,
    pub naming: NamingMode,
    pub expected_content_type: String,
    pub max_attempts: u32,
    pub backoff: Duration,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub aria2: AgentCommand,
    pub yt_dlp: AgentCommand,
}

#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub root_paths: Vec<PathBuf>,
    pub languages: Vec<String>,
    pub file_types: Vec<String>,
    pub allowed_extensions: HashMap<String, Vec<String>>,
    pub duplicate_pattern: Option<String>,
    pub max_name_len: Option<usize>,
    pub report_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub merge: MergeConfig,
    pub fetch: FetchConfig,
    pub audit: AuditConfig,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_external_config(args.config.as_deref())?;
        Ok(Self::from_external(external_config, args))
    }

    /// 合并配置文件与命令行参数，命令行优先
    pub fn from_external(external: ExternalConfig, args: &Cli) -> Self {
        let ExternalConfig { merge, fetch, audit } = external;

        let mut merge_config = MergeConfig {
            input_dir: merge.input_dir.unwrap_or_else(|| ".".into()),
            output_dir: merge.output_dir.unwrap_or_else(|| ".".into()),
            marker: args
                .marker
                .clone()
                .or(merge.marker)
                .unwrap_or_else(|| constants::DEFAULT_MARKER.into()),
        };

        let mut yt_dlp = fetch.yt_dlp.unwrap_or_else(AgentCommand::yt_dlp);
        yt_dlp.args.extend(fetch.yt_dlp_extra_opts);

        let strategy = args.strategy.unwrap_or(fetch.strategy);
        let naming = args
            .naming
            .or(fetch.naming)
            .unwrap_or_else(|| default_naming_for(strategy));

        let mut fetch_config = FetchConfig {
            input_dir: fetch.input_dir.unwrap_or_else(|| ".".into()),
            output_dir: fetch.output_dir.unwrap_or_else(|| "downloads".into()),
            strategy,
            naming,
            expected_content_type: fetch
                .expected_content_type
                .unwrap_or_else(|| constants::DEFAULT_EXPECTED_CONTENT_TYPE.into()),
            max_attempts: fetch
                .max_attempts
                .unwrap_or(constants::DEFAULT_MAX_ATTEMPTS)
                .max(1),
            backoff: Duration::from_secs(
                fetch.backoff_secs.unwrap_or(constants::DEFAULT_BACKOFF_SECS),
            ),
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(fetch.connect_timeout_secs.unwrap_or(10)),
            timeout: Duration::from_secs(fetch.timeout_secs.unwrap_or(60)),
            aria2: fetch.aria2.unwrap_or_else(AgentCommand::aria2),
            yt_dlp,
        };

        let mut audit_config = AuditConfig {
            root_paths: audit.root_paths,
            languages: audit.languages,
            file_types: audit.file_types,
            allowed_extensions: audit.allowed_extensions,
            duplicate_pattern: audit.duplicate_pattern,
            max_name_len: audit.max_name_len,
            report_path: args
                .report
                .clone()
                .or(audit.report_path)
                .unwrap_or_else(|| constants::DEFAULT_REPORT_FILE.into()),
        };
        if args.prune_duplicates && audit_config.duplicate_pattern.is_none() {
            audit_config.duplicate_pattern = Some(constants::LEGACY_DUPLICATE_PATTERN.into());
        } else if !args.prune_duplicates {
            audit_config.duplicate_pattern = None;
        }

        // --input / --output 作用于当前模式；流水线模式下分别作用于首尾两端
        if args.merge || args.pipeline {
            if let Some(input) = &args.input {
                merge_config.input_dir = input.clone();
            }
        }
        if args.merge {
            if let Some(output) = &args.output {
                merge_config.output_dir = output.clone();
            }
        }
        if args.fetch {
            if let Some(input) = &args.input {
                fetch_config.input_dir = input.clone();
            }
        }
        if args.fetch || args.pipeline {
            if let Some(output) = &args.output {
                fetch_config.output_dir = output.clone();
            }
        }
        if args.audit {
            if let Some(input) = &args.input {
                audit_config.root_paths = vec![input.clone()];
            }
        }
        if args.pipeline {
            fetch_config.input_dir = merge_config.output_dir.clone();
            if audit_config.root_paths.is_empty() {
                audit_config.root_paths =
                    vec![pipeline_audit_root(&fetch_config.output_dir, &audit_config.languages)];
            }
        }

        Self {
            merge: merge_config,
            fetch: fetch_config,
            audit: audit_config,
        }
    }
}

fn default_naming_for(strategy: FetchStrategy) -> NamingMode {
    match strategy {
        FetchStrategy::YtDlp => NamingMode::VideoId,
        FetchStrategy::Direct | FetchStrategy::Aria2 => NamingMode::LastSegment,
    }
}

/// 下载目录为 `<根目录>/<分组>`，统计目录为 `<根目录>/<语言>/<类型>`。
/// 下载目录本身以某个语言命名时，统计其上一级目录。
fn pipeline_audit_root(fetch_output: &Path, languages: &[String]) -> PathBuf {
    let is_language_dir = fetch_output
        .file_name()
        .map(|name| languages.iter().any(|lang| name == lang.as_str()))
        .unwrap_or(false);
    match fetch_output.parent() {
        Some(parent) if is_language_dir && !parent.as_os_str().is_empty() => parent.to_path_buf(),
        Some(_) if is_language_dir => PathBuf::from("."),
        _ => fetch_output.to_path_buf(),
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            merge: MergeConfig {
                input_dir: "input".into(),
                output_dir: "output".into(),
                marker: constants::DEFAULT_MARKER.to_string(),
            },
            fetch: FetchConfig {
                input_dir: "output".into(),
                output_dir: "downloads".into(),
                strategy: FetchStrategy::Direct,
                naming: NamingMode::LastSegment,
                expected_content_type: constants::DEFAULT_EXPECTED_CONTENT_TYPE.to_string(),
                max_attempts: 3,
                backoff: Duration::from_millis(10),
                user_agent: "test-agent/1.0".to_string(),
                connect_timeout: Duration::from_secs(5),
                timeout: Duration::from_secs(15),
                aria2: AgentCommand::aria2(),
                yt_dlp: AgentCommand::yt_dlp(),
            },
            audit: AuditConfig {
                root_paths: Vec::new(),
                languages: Vec::new(),
                file_types: Vec::new(),
                allowed_extensions: HashMap::new(),
                duplicate_pattern: None,
                max_name_len: None,
                report_path: constants::DEFAULT_REPORT_FILE.into(),
            },
        }
    }
}
