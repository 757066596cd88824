// src/merge/dedup.rs

use crate::models::DedupOutcome;
use itertools::Itertools;
use log::debug;

/// 按字符串完全相等去重，保留首次出现的位置
pub fn dedupe<I, S>(urls: I) -> DedupOutcome
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let all: Vec<String> = urls.into_iter().map(Into::into).collect();
    let before = all.len();
    let unique: Vec<String> = all.into_iter().unique().collect();
    let after = unique.len();
    debug!("去重: {} -> {}", before, after);
    DedupOutcome {
        urls: unique,
        before,
        after,
    }
}
