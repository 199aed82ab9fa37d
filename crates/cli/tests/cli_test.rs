use std::fs;
use std::path::Path;
use predicates::prelude::*;
use tempfile::tempdir;

const CATALOG: &str = r#"{
    "projects": [
        {"id": "sql-agent", "title": "SQL Query Agent", "description": "Natural language to SQL", "category": "basic", "difficulty": 2, "tags": ["SQL", "Agent"]},
        {"id": "rag-bot", "title": "RAG Knowledge Bot", "description": "Docs Q&A", "category": "intermediate", "difficulty": 3, "tags": ["RAG"]},
        {"id": "multi-agent", "title": "Multi-Agent Research", "description": "Collaborating agents", "category": "advanced", "difficulty": 5, "tags": ["Agent"]},
        {"id": "chatbot", "title": "Customer Chatbot", "description": "Memory and tools", "category": "basic", "difficulty": 1, "tags": ["Memory"]}
    ],
    "showcases": [
        {"id": "showcase-1", "title": "Shop analytics", "description": "SQL agent", "author": "lin", "projectType": "basic", "date": "2025-01-15", "likes": 12, "featured": true},
        {"id": "showcase-2", "title": "Paper digest", "description": "RAG over papers", "author": "kim", "projectType": "advanced", "date": "2025-02-01", "likes": 3}
    ]
}"#;

fn learntrack(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("learntrack");
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("LEARNTRACK_CATALOG")
        .env_remove("LEARNTRACK_LOG")
        .env("LEARNTRACK_DATA_DIR", dir.join("data"))
        .arg("--catalog")
        .arg(dir.join("catalog.json"));
    cmd
}

fn setup() -> tempfile::TempDir {
    let tmp = tempdir().expect("tempdir");
    fs::write(tmp.path().join("catalog.json"), CATALOG).expect("write catalog");
    tmp
}

#[test]
fn toggle_updates_status_percentage() {
    let tmp = setup();

    learntrack(tmp.path())
        .args(["toggle", "sql-agent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed: sql-agent"));

    learntrack(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress: 25%"))
        .stdout(predicate::str::contains("Completed 1/4 projects"));

    learntrack(tmp.path())
        .args(["toggle", "sql-agent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not completed: sql-agent"));

    learntrack(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress: 0%"));
}

#[test]
fn progress_is_stored_under_versioned_key() {
    let tmp = setup();

    learntrack(tmp.path()).args(["toggle", "rag-bot"]).assert().success();

    let stored = fs::read_to_string(tmp.path().join("data").join("learntrack_progress_v1.json"))
        .expect("snapshot file");
    assert!(stored.contains("\"totalCompleted\": 1"));
    assert!(stored.contains("\"rag-bot\""));
}

#[test]
fn export_and_import_round_trip() {
    let tmp = setup();
    let export = tmp.path().join("backup.json");

    learntrack(tmp.path()).args(["toggle", "chatbot"]).assert().success();
    learntrack(tmp.path()).args(["toggle", "rag-bot"]).assert().success();
    learntrack(tmp.path())
        .args(["export", "--output"])
        .arg(&export)
        .assert()
        .success();

    learntrack(tmp.path()).args(["reset", "--yes"]).assert().success();
    learntrack(tmp.path())
        .arg("status")
        .assert()
        .stdout(predicate::str::contains("Progress: 0%"));

    learntrack(tmp.path())
        .arg("import")
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported progress: 2 completed"));
    learntrack(tmp.path())
        .arg("status")
        .assert()
        .stdout(predicate::str::contains("Progress: 50%"));
}

#[test]
fn export_to_stdout() {
    let tmp = setup();
    learntrack(tmp.path()).args(["toggle", "chatbot"]).assert().success();

    learntrack(tmp.path())
        .args(["export", "--output", "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"records\""))
        .stdout(predicate::str::contains("\"totalCompleted\": 1"));
}

#[test]
fn malformed_import_fails_and_keeps_progress() {
    let tmp = setup();
    let bad = tmp.path().join("bad.json");
    fs::write(&bad, "{\"foo\": 1}").expect("write bad");

    learntrack(tmp.path()).args(["toggle", "sql-agent"]).assert().success();
    learntrack(tmp.path())
        .arg("import")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("import failed"));

    learntrack(tmp.path())
        .arg("status")
        .assert()
        .stdout(predicate::str::contains("Completed 1/4 projects"));
}

#[test]
fn reset_requires_confirmation() {
    let tmp = setup();
    learntrack(tmp.path()).args(["toggle", "sql-agent"]).assert().success();

    learntrack(tmp.path())
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    learntrack(tmp.path())
        .arg("status")
        .assert()
        .stdout(predicate::str::contains("Progress: 25%"));
}

#[test]
fn list_filters_and_marks_completed() {
    let tmp = setup();
    learntrack(tmp.path()).args(["toggle", "multi-agent"]).assert().success();

    learntrack(tmp.path())
        .args(["list", "--tag", "Agent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Projects (2)"))
        .stdout(predicate::str::contains("[x] multi-agent"))
        .stdout(predicate::str::contains("[ ] sql-agent"))
        .stdout(predicate::str::contains("rag-bot").not());

    learntrack(tmp.path())
        .args(["list", "--category", "basic", "--search", "memory"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Projects (1)"))
        .stdout(predicate::str::contains("chatbot"));
}

#[test]
fn unknown_ids_are_tracked_with_a_note() {
    let tmp = setup();

    learntrack(tmp.path())
        .args(["toggle", "not-in-catalog"])
        .assert()
        .success()
        .stderr(predicate::str::contains("not in the catalog"));

    learntrack(tmp.path())
        .arg("status")
        .assert()
        .stdout(predicate::str::contains("Completed 1/4 projects"))
        .stdout(predicate::str::contains("(not in catalog)"));
}

#[test]
fn notes_can_be_set_and_cleared() {
    let tmp = setup();

    learntrack(tmp.path())
        .args(["note", "rag-bot", "try a reranker"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Notes for rag-bot: try a reranker"));

    learntrack(tmp.path())
        .args(["note", "rag-bot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared notes for rag-bot"));
}

#[test]
fn showcases_featured_filter() {
    let tmp = setup();

    learntrack(tmp.path())
        .args(["showcases", "--featured"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Showcases (1)"))
        .stdout(predicate::str::contains("Shop analytics"));
}
