// src/merge/source.rs

use crate::{
    constants::artifacts,
    error::*,
    models::{MergedGroup, UrlRecord},
    utils,
};
use log::{debug, info};
use std::{
    collections::HashSet,
    path::PathBuf,
};

/// 能够提供一组 (URL, 文件名) 记录的数据源。
///
/// 合并生成的 CSV 是默认实现；站点抓取脚本只要输出同样形状的记录即可接入下载流程。
pub trait RecordSource {
    fn prefix(&self) -> String;
    fn records(&self) -> AppResult<MergedGroup>;
}

/// 任何带有 `URL` 列的 CSV 文件，`File Name` 列可选
pub struct MergedCsvSource {
    path: PathBuf,
}

impl MergedCsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for MergedCsvSource {
    fn prefix(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match name.strip_suffix(artifacts::MERGED_SUFFIX) {
            Some(prefix) => prefix.to_string(),
            None => self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(name),
        }
    }

    fn records(&self) -> AppResult<MergedGroup> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        let headers = rdr.headers()?.clone();
        let url_idx = headers
            .iter()
            .position(|h| h.trim() == artifacts::URL_COLUMN)
            .ok_or_else(|| AppError::MissingColumn {
                path: self.path.clone(),
                column: artifacts::URL_COLUMN.to_string(),
            })?;
        let name_idx = headers
            .iter()
            .position(|h| h.trim() == artifacts::FILE_NAME_COLUMN);

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row?;
            let url = row.get(url_idx).map(str::trim).unwrap_or_default();
            if url.is_empty() {
                continue;
            }
            if !seen.insert(url.to_string()) {
                debug!("'{}' 中的重复 URL 已忽略: {}", self.path.display(), url);
                continue;
            }
            let file_name = name_idx
                .and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| utils::url_last_segment(url));
            records.push(UrlRecord {
                url: url.to_string(),
                file_name,
            });
        }

        info!("'{}' 中共有 {} 个 URL", self.path.display(), records.len());
        Ok(MergedGroup {
            prefix: self.prefix(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::write_merged_csv;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_through_merged_csv() {
        let dir = tempdir().unwrap();
        let group = MergedGroup {
            prefix: "cat".into(),
            records: vec![UrlRecord {
                url: "https://x.test/a.pdf".into(),
                file_name: "a.pdf".into(),
            }],
        };
        let path = write_merged_csv(&group, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "cat_merged.csv");
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "URL,File Name\nhttps://x.test/a.pdf,a.pdf\n"
        );

        let read_back = MergedCsvSource::new(&path).records().unwrap();
        assert_eq!(read_back, group);
    }

    #[test]
    fn test_scraper_shaped_csv_without_file_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta.csv");
        fs::write(
            &path,
            "Title,URL,DOI\nA,https://x.test/p/1.pdf,10.1/a\nB,,10.1/b\nC,https://x.test/p/1.pdf,10.1/c\n",
        )
        .unwrap();

        let group = MergedCsvSource::new(&path).records().unwrap();
        assert_eq!(group.prefix, "meta");
        assert_eq!(group.records.len(), 1);
        assert_eq!(group.records[0].file_name, "1.pdf");
    }

    #[test]
    fn test_missing_url_column_is_input_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad_merged.csv");
        fs::write(&path, "Link,Name\nhttps://x.test/a.pdf,a.pdf\n").unwrap();

        let err = MergedCsvSource::new(&path).records().unwrap_err();
        assert!(matches!(err, AppError::MissingColumn { ref column, .. } if column == "URL"));
    }
}
