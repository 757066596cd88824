// src/merge/codec.rs

use log::{debug, warn};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::{fs, path::Path};

/// 浏览器导出时保留的字符集之外全部转义
const RAW_BATCH_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// 解码后的原始导出文件。`urls()` 每次调用都会从头开始遍历。
#[derive(Debug, Clone)]
pub struct RawBatch {
    decoded: String,
}

impl RawBatch {
    pub fn decode(raw: &str) -> Self {
        Self {
            decoded: percent_decode_str(raw).decode_utf8_lossy().into_owned(),
        }
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.decoded
            .lines()
            .map(str::trim)
            .map(strip_quotes)
            .filter(|line| !line.is_empty())
    }
}

fn strip_quotes(line: &str) -> &str {
    if line.len() >= 2 && line.starts_with('"') && line.ends_with('"') {
        &line[1..line.len() - 1]
    } else {
        line
    }
}

/// 解码整段文本，保留顺序与重复项
pub fn decode(raw: &str) -> Vec<String> {
    RawBatch::decode(raw).urls().map(str::to_string).collect()
}

/// 读取并解码一个文件；文件无法读取时记录警告并返回空列表
pub fn decode_file(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(raw) => {
            let urls = decode(&raw);
            debug!("从 '{}' 解析出 {} 个 URL", path.display(), urls.len());
            urls
        }
        Err(e) => {
            warn!("无法读取原始文件 '{}': {}", path.display(), e);
            Vec::new()
        }
    }
}

/// `decode` 的逆操作：每行加引号、以 CRLF 连接后整体转义
pub fn encode<S: AsRef<str>>(urls: &[S]) -> String {
    let joined = urls
        .iter()
        .map(|u| format!("\"{}\"", u.as_ref()))
        .collect::<Vec<_>>()
        .join("\r\n");
    utf8_percent_encode(&joined, RAW_BATCH_ESCAPE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "%22https%3A%2F%2Fx.test%2Fa.pdf%22%0D%0A%22https%3A%2F%2Fx.test%2Fa.pdf%22";

    #[test]
    fn test_decode_quoted_crlf_batch() {
        assert_eq!(
            decode(SAMPLE),
            vec!["https://x.test/a.pdf".to_string(), "https://x.test/a.pdf".to_string()]
        );
    }

    #[test]
    fn test_decode_trims_and_drops_empty_lines() {
        let raw = "%20%22https%3A%2F%2Fx.test%2Fb.pdf%22%20%0D%0A%0D%0A%22%22%0D%0Ahttps%3A%2F%2Fx.test%2Fc.pdf";
        assert_eq!(
            decode(raw),
            vec!["https://x.test/b.pdf".to_string(), "https://x.test/c.pdf".to_string()]
        );
    }

    #[test]
    fn test_strip_only_one_layer_of_quotes() {
        assert_eq!(decode("%22%22x%22%22"), vec!["\"x\"".to_string()]);
        // 只有一侧有引号时不处理
        assert_eq!(decode("%22x"), vec!["\"x".to_string()]);
    }

    #[test]
    fn test_batch_is_restartable() {
        let batch = RawBatch::decode(SAMPLE);
        let first: Vec<_> = batch.urls().collect();
        let second: Vec<_> = batch.urls().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_decode_is_idempotent_through_encode() {
        let samples = [
            SAMPLE,
            "%22https%3A%2F%2Fx.test%2Fq%3Fa%3D1%26b%3D2%22%0D%0A%22%22%22x%22%22%22",
            "https%3A%2F%2Fx.test%2F%E4%B8%AD%E6%96%87.pdf",
            "",
        ];
        for raw in samples {
            let once = decode(raw);
            let again = decode(&encode(&once));
            assert_eq!(again, once, "raw = {raw}");
        }
    }

    #[test]
    fn test_unreadable_file_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(decode_file(&dir.path().join("missing.csv")).is_empty());
    }
}
