// tests/workflow_test.rs

use clap::Parser;
use harvest_dl::{
    PipelineContext,
    cli::{Cli, FetchStrategy, NamingMode},
    config::{AgentCommand, AppConfig, ExternalConfig},
    downloader::{LastSegmentNaming, reconcile},
    merge::{MergedCsvSource, RecordSource},
    workflows,
};
use std::{fs, sync::Arc};
use tempfile::tempdir;

fn context_for(mode: &str, config: AppConfig) -> PipelineContext {
    let args = Arc::new(Cli::parse_from(["harvest-dl", mode]));
    PipelineContext::new(Arc::new(config), args).expect("Failed to create context")
}

#[tokio::test]
async fn test_merge_writes_decoded_deduplicated_csv() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    fs::write(
        input.path().join("A_filetype_pdf_1.txt"),
        "\"https%3A%2F%2Fx.test%2Fa.pdf\"\n",
    )
    .unwrap();
    fs::write(
        input.path().join("A_filetype_pdf_2.txt"),
        "https%3A%2F%2Fx.test%2Fa.pdf\n",
    )
    .unwrap();
    // 不含标记的文件不参与合并
    fs::write(input.path().join("notes.txt"), "https://x.test/other.pdf\n").unwrap();

    let mut config = AppConfig::default();
    config.merge.input_dir = input.path().to_path_buf();
    config.merge.output_dir = output.path().to_path_buf();
    let context = context_for("--merge", config);

    let written = workflows::run_merge(&context).await.unwrap();

    assert_eq!(written, 1);
    let merged = fs::read_to_string(output.path().join("A_merged.csv")).unwrap();
    assert_eq!(merged, "URL,File Name\nhttps://x.test/a.pdf,a.pdf\n");
}

#[tokio::test]
async fn test_second_fetch_of_complete_group_makes_no_requests() {
    let mut server = mockito::Server::new_async().await;
    let mock_a = server
        .mock("GET", "/docs/a.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body("%PDF-a")
        .expect(1)
        .create_async()
        .await;
    let mock_b = server
        .mock("GET", "/docs/b.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body("%PDF-b")
        .expect(1)
        .create_async()
        .await;

    let csv_dir = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    let csv_path = csv_dir.path().join("Papers_merged.csv");
    fs::write(
        &csv_path,
        format!(
            "URL,File Name\n{0}/docs/a.pdf,a.pdf\n{0}/docs/b.pdf,b.pdf\n",
            server.url()
        ),
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.fetch.input_dir = csv_dir.path().to_path_buf();
    config.fetch.output_dir = out_dir.path().to_path_buf();

    // 第一次运行：两个文件都需要下载
    let first = context_for("--fetch", config.clone());
    workflows::run_fetch(&first).await.unwrap();
    let stats = first.manager.get_stats();
    assert_eq!((stats.total, stats.success, stats.skipped), (2, 2, 0));

    // 再次计算差集，结果为空
    let group = MergedCsvSource::new(&csv_path).records().unwrap();
    let group_dir = out_dir.path().join("Papers");
    let plan = reconcile(&group, &group_dir, &LastSegmentNaming);
    assert!(plan.to_fetch.is_empty());
    assert_eq!(plan.skipped_count, 2);

    // 第二次运行：没有任何网络请求
    let second = context_for("--fetch", config);
    workflows::run_fetch(&second).await.unwrap();
    let stats = second.manager.get_stats();
    assert_eq!((stats.total, stats.success, stats.skipped), (2, 0, 2));

    mock_a.assert_async().await;
    mock_b.assert_async().await;
    assert_eq!(fs::read_to_string(group_dir.join("a.pdf")).unwrap(), "%PDF-a");
}

#[tokio::test]
async fn test_fetch_reports_failure_but_keeps_other_groups() {
    let mut server = mockito::Server::new_async().await;
    let _gone = server
        .mock("GET", "/gone.pdf")
        .with_status(410)
        .create_async()
        .await;
    let ok = server
        .mock("GET", "/ok.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body("%PDF")
        .create_async()
        .await;

    let csv_dir = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    fs::write(
        csv_dir.path().join("A_merged.csv"),
        format!("URL,File Name\n{}/gone.pdf,gone.pdf\n", server.url()),
    )
    .unwrap();
    fs::write(
        csv_dir.path().join("B_merged.csv"),
        format!("URL,File Name\n{}/ok.pdf,ok.pdf\n", server.url()),
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.fetch.input_dir = csv_dir.path().to_path_buf();
    config.fetch.output_dir = out_dir.path().to_path_buf();
    config.fetch.max_attempts = 1;
    let context = context_for("--fetch", config);

    let result = workflows::run_fetch(&context).await;

    assert!(result.is_err());
    ok.assert_async().await;
    assert!(out_dir.path().join("B").join("ok.pdf").exists());
    assert!(!out_dir.path().join("A").join("gone.pdf").exists());
    let stats = context.manager.get_stats();
    assert_eq!((stats.success, stats.failed), (1, 1));
}

#[tokio::test]
async fn test_audit_writes_sorted_report() {
    let root = tempdir().unwrap();
    fs::create_dir_all(root.path().join("EN/pdf")).unwrap();
    fs::create_dir_all(root.path().join("CN/pdf")).unwrap();
    fs::write(root.path().join("EN/pdf/a.pdf"), vec![0u8; 1024]).unwrap();
    fs::write(root.path().join("CN/pdf/b.pdf"), vec![0u8; 2048]).unwrap();
    fs::write(root.path().join("CN/pdf/junk.html"), "<html/>").unwrap();

    let report_dir = tempdir().unwrap();
    let report_path = report_dir.path().join("summary.csv");

    let mut config = AppConfig::default();
    config.audit.root_paths = vec![root.path().to_path_buf()];
    config.audit.languages = vec!["EN".into(), "CN".into(), "RU".into()];
    config.audit.file_types = vec!["pdf".into()];
    config.audit.allowed_extensions = [("pdf".to_string(), vec!["pdf".to_string()])].into();
    config.audit.report_path = report_path.clone();
    let context = context_for("--audit", config);

    let summaries = workflows::run_audit(&context).await.unwrap();

    assert_eq!(summaries.len(), 1);
    // RU/pdf 不存在，不出现在结果中
    assert_eq!(summaries[0].entries.len(), 2);
    assert!(!root.path().join("CN/pdf/junk.html").exists());

    let report = fs::read_to_string(&report_path).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "Folder,Path,Count,Capacity (GB),Removed Dups,Removed Others");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].ends_with(",CN/pdf,1,0.00,0,1"));
    assert!(lines[2].ends_with(",EN/pdf,1,0.00,0,0"));
}

#[tokio::test]
async fn test_pipeline_runs_all_stages_in_order() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/p/paper.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body("%PDF-pipeline")
        .expect(1)
        .create_async()
        .await;

    let work = tempdir().unwrap();
    let raw_dir = work.path().join("raw");
    let csv_dir = work.path().join("csvs");
    let library = work.path().join("library");
    fs::create_dir_all(&raw_dir).unwrap();
    let encoded_url = format!("{}/p/paper.pdf", server.url())
        .replace(':', "%3A")
        .replace('/', "%2F");
    // 分组前缀 "pdf" 使下载目录落在 <library>/EN/pdf
    fs::write(raw_dir.join("pdf_filetype_pdf_1.txt"), encoded_url).unwrap();

    let external: ExternalConfig = serde_json::from_value(serde_json::json!({
        "merge": { "input_dir": raw_dir, "output_dir": csv_dir },
        "audit": {
            "languages": ["EN"],
            "file_types": ["pdf"],
            "report_path": work.path().join("summary.csv")
        }
    }))
    .unwrap();
    let download_root = library.join("EN");
    let args = Arc::new(Cli::parse_from([
        "harvest-dl",
        "--pipeline",
        "--output",
        download_root.to_str().unwrap(),
    ]));
    let config = AppConfig::from_external(external, &args);
    let context = PipelineContext::new(Arc::new(config), args).unwrap();

    workflows::run_pipeline(&context).await.unwrap();

    mock.assert_async().await;
    assert_eq!(
        fs::read_to_string(library.join("EN").join("pdf").join("paper.pdf")).unwrap(),
        "%PDF-pipeline"
    );
    let report = fs::read_to_string(work.path().join("summary.csv")).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].ends_with(",EN/pdf,1,0.00,0,0"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_delegated_fetch_is_idempotent() {
    let csv_dir = tempdir().unwrap();
    let out_dir = tempdir().unwrap();
    let calls = tempdir().unwrap();
    let calls_log = calls.path().join("calls.log");
    fs::write(
        csv_dir.path().join("Papers_merged.csv"),
        "URL,File Name\nhttps://x.test/a.pdf,a.pdf\nhttps://x.test/b.pdf,b.pdf\n",
    )
    .unwrap();

    // 代替 aria2c：记录调用次数，并按任务文件中的 URL 生成文件
    let script = format!(
        "echo run >> '{}'; grep -v '^ ' {{input_file}} | while read u; do echo data > \"{{dir}}/$(basename \"$u\")\"; done",
        calls_log.display()
    );
    let mut config = AppConfig::default();
    config.fetch.input_dir = csv_dir.path().to_path_buf();
    config.fetch.output_dir = out_dir.path().to_path_buf();
    config.fetch.strategy = FetchStrategy::Aria2;
    config.fetch.aria2 = AgentCommand {
        program: "sh".into(),
        args: vec!["-c".into(), script],
    };

    let first = context_for("--fetch", config.clone());
    workflows::run_fetch(&first).await.unwrap();
    let stats = first.manager.get_stats();
    assert_eq!((stats.total, stats.success, stats.skipped), (2, 2, 0));

    let group_dir = out_dir.path().join("Papers");
    assert!(group_dir.join("a.pdf").exists());
    assert!(group_dir.join("b.pdf").exists());
    assert!(!group_dir.join("Papers_urls.txt").exists());

    // 第二次运行：不启动外部程序，也不写任务文件
    let second = context_for("--fetch", config);
    workflows::run_fetch(&second).await.unwrap();
    let stats = second.manager.get_stats();
    assert_eq!((stats.total, stats.success, stats.skipped), (2, 0, 2));
    assert_eq!(fs::read_to_string(&calls_log).unwrap().lines().count(), 1);
    assert!(!group_dir.join("Papers_urls.txt").exists());
}

#[test]
fn test_pipeline_config_audits_download_tree() {
    let work = tempdir().unwrap();
    let library = work.path().join("library");
    let mut external: ExternalConfig = serde_json::from_value(serde_json::json!({
        "audit": { "languages": ["EN"], "file_types": ["pdf"] }
    }))
    .unwrap();
    external.merge.output_dir = Some(work.path().join("csvs"));

    let download_root = library.join("EN");
    let args = Cli::parse_from([
        "harvest-dl",
        "--pipeline",
        "--output",
        download_root.to_str().unwrap(),
    ]);
    let config = AppConfig::from_external(external, &args);
    assert_eq!(config.fetch.naming, NamingMode::LastSegment);

    // 分组 "pdf" 的下载结果落在 <library>/EN/pdf
    fs::create_dir_all(download_root.join("pdf")).unwrap();
    fs::write(download_root.join("pdf").join("a.pdf"), "%PDF").unwrap();

    let rules = harvest_dl::audit::AuditRules::from_config(&config.audit).unwrap();
    assert_eq!(config.audit.root_paths.len(), 1);
    let entries = harvest_dl::audit::audit_root(
        &config.audit.root_paths[0],
        &config.audit.languages,
        &config.audit.file_types,
        &rules,
    );
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category_key, "EN/pdf");
    assert_eq!(entries[0].file_count, 1);
}
