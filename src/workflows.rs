// src/workflows.rs

use crate::{
    PipelineContext,
    audit::{self, AuditRules, RootSummary},
    downloader::{self, naming_for},
    error::{AppError, AppResult},
    merge::{self, MergedCsvSource, RecordSource},
    symbols, ui,
};
use anyhow::anyhow;
use colored::*;
use log::{error, info, warn};

/// 合并模式：原始导出文件 -> `<prefix>_merged.csv`。返回写出的文件数。
pub async fn run_merge(context: &PipelineContext) -> AppResult<usize> {
    let merge_config = &context.config.merge;
    ui::print_header("合并原始 URL 文件");
    ui::info(&format!("输入目录: {}", merge_config.input_dir.display()));
    ui::info(&format!("输出目录: {}", merge_config.output_dir.display()));

    let all_files = merge::list_raw_files(&merge_config.input_dir).map_err(|e| {
        error!("读取输入目录 '{}' 失败: {}", merge_config.input_dir.display(), e);
        e
    })?;
    let groups = merge::group_files(&all_files, &merge_config.marker);
    if groups.is_empty() {
        warn!(
            "目录 '{}' 中没有文件名包含 '{}' 的文件",
            merge_config.input_dir.display(),
            merge_config.marker
        );
        ui::warn(&format!("没有找到文件名包含 '{}' 的文件。", merge_config.marker));
        return Ok(0);
    }
    info!(
        "检测到 {} 个分组: {}",
        groups.len(),
        groups.iter().map(|(p, _)| p.as_str()).collect::<Vec<_>>().join(", ")
    );

    let mut written = 0;
    let mut failed = 0;
    for (prefix, files) in &groups {
        let Some(group) = merge::merge_group(prefix, files) else {
            ui::warn(&format!("分组 '{}' 没有有效的 URL，已跳过。", prefix));
            continue;
        };
        match merge::write_merged_csv(&group, &merge_config.output_dir) {
            Ok(path) => {
                written += 1;
                println!(
                    "{} {} ({} 个文件 -> {} 个唯一 URL)",
                    *symbols::OK,
                    path.display(),
                    files.len(),
                    group.len()
                );
            }
            Err(e) => {
                failed += 1;
                error!("写出分组 '{}' 失败: {}", prefix, e);
                ui::error(&format!("写出分组 '{}' 失败: {}", prefix, e));
            }
        }
    }

    if failed > 0 {
        return Err(AppError::Other(anyhow!("{} 个分组写出失败。", failed)));
    }
    Ok(written)
}

/// 下载模式：对每个 `*_merged.csv` 计算缺失部分并下载
pub async fn run_fetch(context: &PipelineContext) -> AppResult<()> {
    let fetch_config = &context.config.fetch;
    ui::print_header("批量下载");
    ui::info(&format!("输入目录: {}", fetch_config.input_dir.display()));
    ui::info(&format!("输出目录: {}", fetch_config.output_dir.display()));
    ui::info(&format!("下载策略: {:?}", fetch_config.strategy));

    let merged_csvs = merge::list_merged_csvs(&fetch_config.input_dir)?;
    if merged_csvs.is_empty() {
        ui::warn("没有找到任何 *_merged.csv 文件。");
        return Ok(());
    }

    let naming = naming_for(fetch_config.naming);
    let fetcher = downloader::fetcher_for(context);
    let mut failed_groups = 0;

    for csv_path in merged_csvs {
        let source = MergedCsvSource::new(&csv_path);
        ui::print_sub_header(&source.prefix());
        let group = match source.records() {
            Ok(group) => group,
            Err(e) => {
                failed_groups += 1;
                error!("读取 '{}' 失败: {}", csv_path.display(), e);
                ui::error(&format!("读取 '{}' 失败: {}", csv_path.display(), e));
                continue;
            }
        };
        if group.is_empty() {
            ui::warn(&format!("'{}' 中没有 URL，跳过。", csv_path.display()));
            continue;
        }

        let dest_dir = fetch_config.output_dir.join(&group.prefix);
        let plan = downloader::reconcile(&group, &dest_dir, naming.as_ref());
        context
            .manager
            .start_group(&group.prefix, group.len(), plan.skipped_count);
        ui::info(&format!(
            "共 {} 项，已存在 {} 项，待下载 {} 项",
            group.len(),
            plan.skipped_count,
            plan.to_fetch.len()
        ));

        // 全部已存在时不调用下载器，也不生成任务文件
        if plan.to_fetch.is_empty() {
            ui::info("所有文件均已存在，无需下载。");
            continue;
        }

        if let Err(e) = fetcher.fetch(&group.prefix, &plan.to_fetch, &dest_dir).await {
            failed_groups += 1;
            error!("分组 '{}' 下载失败: {}", group.prefix, e);
            context.manager.record_failure_with_reason(
                &format!("{} ({} 项)", group.prefix, plan.to_fetch.len()),
                &e.to_string(),
            );
            ui::error(&format!("分组 '{}' 下载失败: {}", group.prefix, e));
        }
    }

    context.manager.print_report();
    if failed_groups > 0 || !context.manager.did_all_succeed() {
        let stats = context.manager.get_stats();
        return Err(AppError::Other(anyhow!(
            "{} 个分组出错，{} 项下载失败。",
            failed_groups,
            stats.failed
        )));
    }
    Ok(())
}

/// 统计模式：逐个根目录统计并清理，最后写出报告
pub async fn run_audit(context: &PipelineContext) -> AppResult<Vec<RootSummary>> {
    let audit_config = &context.config.audit;
    ui::print_header("目录统计与清理");
    if audit_config.duplicate_pattern.is_some() {
        ui::warn("已启用重复文件清理，匹配的文件将被永久删除。");
    }

    if audit_config.root_paths.is_empty() {
        return Err(AppError::UserInputError(
            "未配置任何统计根目录，请在配置文件的 audit.root_paths 中指定或使用 --input。".into(),
        ));
    }
    let rules = AuditRules::from_config(audit_config)?;
    let summaries: Vec<RootSummary> = audit_config
        .root_paths
        .iter()
        .map(|root| {
            ui::info(&format!("正在扫描: {}", root.display()));
            RootSummary {
                root: root.clone(),
                entries: audit::audit_root(
                    root,
                    &audit_config.languages,
                    &audit_config.file_types,
                    &rules,
                ),
            }
        })
        .collect();

    audit::report::print_summary(&summaries);
    audit::write_report(&audit_config.report_path, &summaries)?;
    println!(
        "\n{} 报告已保存: {}",
        *symbols::OK,
        audit_config.report_path.display().to_string().green()
    );
    Ok(summaries)
}

/// 流水线模式：合并 -> 下载 -> 统计，某一步出错不影响后续步骤
pub async fn run_pipeline(context: &PipelineContext) -> AppResult<()> {
    let mut first_error: Option<AppError> = None;

    if let Err(e) = run_merge(context).await {
        error!("合并阶段出错: {}", e);
        ui::error(&format!("合并阶段出错: {}", e));
        first_error.get_or_insert(e);
    }
    if let Err(e) = run_fetch(context).await {
        error!("下载阶段出错: {}", e);
        ui::error(&format!("下载阶段出错: {}", e));
        first_error.get_or_insert(e);
    }
    if let Err(e) = run_audit(context).await {
        error!("统计阶段出错: {}", e);
        ui::error(&format!("统计阶段出错: {}", e));
        first_error.get_or_insert(e);
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
