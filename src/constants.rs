// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const MAX_FILENAME_BYTES: usize = 200;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

pub const DEFAULT_MARKER: &str = "_filetype_pdf_";
pub const DEFAULT_EXPECTED_CONTENT_TYPE: &str = "pdf";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_SECS: u64 = 5;
pub const DEFAULT_REPORT_FILE: &str = "summary.csv";

/// 某些站点重复下载时产生的 `_2.pdf` … `_20.pdf` 文件名，仅在显式开启时使用
pub const LEGACY_DUPLICATE_PATTERN: &str = r"(?i)_(?:[2-9]|1[0-9]|20)\.pdf$";

pub mod artifacts {
    pub const MERGED_SUFFIX: &str = "_merged.csv";
    pub const JOB_FILE_SUFFIX: &str = "_urls.txt";
    pub const URL_COLUMN: &str = "URL";
    pub const FILE_NAME_COLUMN: &str = "File Name";
    /// 未完成下载留下的临时文件与控制文件
    pub const PARTIAL_SUFFIXES: [&str; 3] = [".part", ".ytdl", ".aria2"];
    pub const ARIA2_CONTROL_SUFFIX: &str = ".aria2";
    pub const REPORT_HEADER: [&str; 6] = [
        "Folder",
        "Path",
        "Count",
        "Capacity (GB)",
        "Removed Dups",
        "Removed Others",
    ];
}

pub mod placeholders {
    pub const DIR: &str = "{dir}";
    pub const INPUT_FILE: &str = "{input_file}";
    pub const USER_AGENT: &str = "{user_agent}";
}

pub const HELP_CONFIG_GUIDE: &str = r#"
配置文件为 JSON 格式，默认位置: ~/.harvest-dl/config.json
首次运行时若文件不存在，会自动生成模板并退出，请按需修改后重新运行。

1. merge   - 原始导出文件的合并
   input_dir   : 存放浏览器导出的原始 URL 文件的目录
   output_dir  : 生成 <前缀>_merged.csv 的目录
   marker      : 文件名中的分组标记，例如 "_filetype_pdf_"

2. fetch   - 批量下载
   input_dir   : 存放 *_merged.csv 的目录
   output_dir  : 下载根目录 (每个前缀一个子目录)
   strategy    : "direct" | "aria2" | "yt-dlp"
   naming      : "last-segment" | "video-id"，不填时 yt-dlp 使用 "video-id"，其余使用 "last-segment"
   expected_content_type : 直接下载时要求的响应类型片段，例如 "pdf"，留空则不检查
   max_attempts / backoff_secs : 重试次数与线性退避基数 (秒)

3. audit   - 目录统计与清理
   root_paths  : 待统计的根目录列表 (其下为 <语言>/<类型> 结构)
                 流水线模式下若为空，则使用下载目录 (下载目录以语言命名时使用其上一级)
   languages / file_types : 语言与类型子目录名
   allowed_extensions     : 每种类型允许的扩展名，例如 {"pdf": ["pdf"]}
   duplicate_pattern      : (可选) 重复下载文件名的正则，例如 "_(?:[2-9]|1[0-9]|20)\.pdf$"
   max_name_len           : (可选) 超过该长度的文件名会被重命名为 <前缀>_<哈希>.<扩展名>"#;
