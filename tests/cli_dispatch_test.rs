// tests/cli_dispatch_test.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

// 辅助函数，避免重复
fn main_command() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

// --- 测试基本 CLI 行为 ---

#[test]
fn test_help_flag() {
    let mut cmd = main_command();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("显示此帮助信息并退出"));
}

#[test]
fn test_config_help_command() {
    let mut cmd = main_command();
    cmd.arg("--config-help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("配置文件为 JSON 格式"));
}

#[test]
fn test_missing_mode_shows_help() {
    let mut cmd = main_command();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage: harvest-dl"));
}

#[test]
fn test_modes_are_mutually_exclusive() {
    let mut cmd = main_command();
    cmd.arg("--merge").arg("--audit");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_unknown_strategy_is_rejected() {
    let mut cmd = main_command();
    cmd.arg("--fetch").arg("--strategy").arg("wget");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'wget'"));
}

// --- 测试配置加载与分发 ---

#[test]
fn test_missing_config_writes_template_and_halts() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("nested").join("config.json");

    let mut cmd = main_command();
    cmd.arg("--merge").arg("--config").arg(&config_path);
    cmd.assert().failure().code(2);

    // 模板已生成，且是合法的 JSON
    let template = fs::read_to_string(&config_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&template).unwrap();
    assert!(value.get("merge").is_some());
    assert!(value.get("fetch").is_some());
    assert!(value.get("audit").is_some());
}

#[test]
fn test_merge_mode_dispatch() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("urls");
    let output = dir.path().join("csvs");
    fs::create_dir_all(&input).unwrap();
    fs::write(
        input.join("Biology_filetype_pdf_1.txt"),
        "https%3A%2F%2Fx.test%2Fa.pdf\nhttps%3A%2F%2Fx.test%2Fb.pdf\n",
    )
    .unwrap();
    fs::write(
        input.join("Biology_filetype_pdf_2.txt"),
        "\"https%3A%2F%2Fx.test%2Fb.pdf\"\n",
    )
    .unwrap();

    let config_path = dir.path().join("config.json");
    let config = serde_json::json!({
        "merge": { "input_dir": input, "output_dir": output },
    });
    fs::write(&config_path, config.to_string()).unwrap();

    let mut cmd = main_command();
    cmd.arg("--merge").arg("--config").arg(&config_path);
    cmd.assert().success();

    let merged = fs::read_to_string(output.join("Biology_merged.csv")).unwrap();
    assert_eq!(
        merged,
        "URL,File Name\nhttps://x.test/a.pdf,a.pdf\nhttps://x.test/b.pdf,b.pdf\n"
    );
}

#[test]
fn test_fetch_with_nothing_to_do_succeeds() {
    let dir = tempdir().unwrap();
    let csvs = dir.path().join("csvs");
    let out = dir.path().join("pdfs");
    fs::create_dir_all(&csvs).unwrap();
    fs::create_dir_all(out.join("Biology")).unwrap();
    fs::write(out.join("Biology").join("a.pdf"), "%PDF").unwrap();
    fs::write(
        csvs.join("Biology_merged.csv"),
        "URL,File Name\nhttp://127.0.0.1:9/a.pdf,a.pdf\n",
    )
    .unwrap();

    let config_path = dir.path().join("config.json");
    fs::write(&config_path, "{}").unwrap();

    // 所有文件均已存在，不会发出任何请求
    let mut cmd = main_command();
    cmd.arg("--fetch")
        .arg("--config")
        .arg(&config_path)
        .arg("--input")
        .arg(&csvs)
        .arg("--output")
        .arg(&out);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("所有文件均已存在"));
}
