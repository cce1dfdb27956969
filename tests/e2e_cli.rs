//! E2E tests for the `arc-import` binary.

mod common;

use common::cli::{ImportWorkspace, arc_command, path_arg, run_arc};
use predicates::prelude::*;

#[test]
fn e2e_detect_reports_format() {
    common::init_test_logging();
    let workspace = ImportWorkspace::new();
    let file = workspace.write_json("collection.json", &common::fixtures::postman_v2_collection());

    let text = run_arc(&workspace, ["detect", &path_arg(&file)], "detect_text");
    assert!(text.status.success(), "detect failed: {}", text.stderr);
    assert_eq!(text.stdout.trim(), "collection-v2");

    let json = run_arc(&workspace, ["--json", "detect", &path_arg(&file)], "detect_json");
    let payload = json.json();
    assert_eq!(payload["format"], "collection-v2");
    assert_eq!(payload["native"], false);
}

#[test]
fn e2e_normalize_prints_bundle() {
    common::init_test_logging();
    let workspace = ImportWorkspace::new();
    let file = workspace.write_json("export.json", &common::fixtures::native_export());

    let out = run_arc(&workspace, ["normalize", &path_arg(&file)], "normalize");
    assert!(out.status.success(), "normalize failed: {}", out.stderr);
    let bundle = out.json();
    assert_eq!(bundle["kind"], "ARC#Import");
    assert_eq!(bundle["version"], "13.0.0");
    assert_eq!(bundle["requests"].as_array().unwrap().len(), 4);
    assert_eq!(bundle["projects"].as_array().unwrap().len(), 2);
    // Nothing was stored.
    assert!(!workspace.db_path().exists());
}

#[test]
fn e2e_normalize_summary() {
    let workspace = ImportWorkspace::new();
    let file = workspace.write_json("single.json", &common::fixtures::legacy_single_request());

    let out = run_arc(
        &workspace,
        ["--json", "normalize", "--summary", &path_arg(&file)],
        "normalize_summary",
    );
    let summary = out.json();
    assert_eq!(summary["format"], "legacy-single");
    assert_eq!(summary["route"], "workspace");
    assert_eq!(summary["counts"]["requests"], 1);
}

#[test]
fn e2e_import_then_stats() {
    common::init_test_logging();
    let workspace = ImportWorkspace::new();
    let file = workspace.write_json("export.json", &common::fixtures::native_export());
    let db = path_arg(&workspace.db_path());

    let import = run_arc(&workspace, ["--json", "--db", &db, "import", &path_arg(&file)], "import");
    assert!(import.status.success(), "import failed: {}", import.stderr);
    let summary = import.json();
    assert_eq!(summary["dryRun"], false);
    assert_eq!(summary["route"], "inspect");
    assert_eq!(summary["written"]["saved-requests"], 4);
    assert_eq!(summary["written"]["legacy-projects"], 2);
    assert_eq!(summary["urlIndex"], 5);
    assert!(summary["errors"].as_array().unwrap().is_empty());

    let stats = run_arc(&workspace, ["--json", "--db", &db, "stats"], "stats");
    assert!(stats.status.success(), "stats failed: {}", stats.stderr);
    let stats = stats.json();
    assert_eq!(stats["total"], 7);
    let saved = stats["collections"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["collection"] == "saved-requests")
        .unwrap()
        .clone();
    assert_eq!(saved["live"], 4);
}

#[test]
fn e2e_reimport_is_idempotent() {
    let workspace = ImportWorkspace::new();
    let file = workspace.write_json("export.json", &common::fixtures::native_export());
    let db = path_arg(&workspace.db_path());

    for label in ["first", "second"] {
        let out = run_arc(&workspace, ["--json", "--db", &db, "import", &path_arg(&file)], label);
        assert!(out.status.success(), "{label} import failed: {}", out.stderr);
        assert!(out.json()["errors"].as_array().unwrap().is_empty());
    }
    let stats = run_arc(&workspace, ["--json", "--db", &db, "stats"], "stats").json();
    assert_eq!(stats["total"], 7);
}

#[test]
fn e2e_import_text_output() {
    let workspace = ImportWorkspace::new();
    let file = workspace.write_json("collection.json", &common::fixtures::postman_v2_collection());

    arc_command(&workspace)
        .args(["--db", &path_arg(&workspace.db_path()), "import", &path_arg(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains("collection-v2"))
        .stdout(predicate::str::contains("Stored:    6 documents"));
}

#[test]
fn e2e_dry_run_writes_nothing() {
    let workspace = ImportWorkspace::new();
    let file = workspace.write_json("backup.json", &common::fixtures::postman_backup());

    let out = run_arc(
        &workspace,
        ["--json", "--db", &path_arg(&workspace.db_path()), "import", "--dry-run", &path_arg(&file)],
        "dry_run",
    );
    assert!(out.status.success(), "dry run failed: {}", out.stderr);
    let summary = out.json();
    assert_eq!(summary["dryRun"], true);
    assert_eq!(summary["counts"]["variables"], 3);
    assert!(summary["written"].as_object().unwrap().is_empty());
    assert!(!workspace.db_path().exists());
}

#[test]
fn e2e_dry_run_from_config_file() {
    let workspace = ImportWorkspace::new();
    let file = workspace.write_json("collection.json", &common::fixtures::postman_v2_collection());
    workspace.write_file("arc-import.yaml", b"dry-run: true\n");

    arc_command(&workspace)
        .args(["import", &path_arg(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));
    assert!(!workspace.db_path().exists());
}

#[test]
fn e2e_unrecognized_file_exit_code() {
    let workspace = ImportWorkspace::new();
    let file = workspace.write_file("other.json", br#"{"hello": "world"}"#);

    arc_command(&workspace)
        .args(["detect", &path_arg(&file)])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("File not recognized"));

    arc_command(&workspace)
        .args(["--json", "import", &path_arg(&file)])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("UNRECOGNIZED_FORMAT"));
}

#[test]
fn e2e_failed_import_leaves_no_database() {
    let workspace = ImportWorkspace::new();
    let file = workspace.write_file("other.json", br#"{"hello": "world"}"#);
    let missing = workspace.root.join("missing.json");

    for input in [&file, &missing] {
        arc_command(&workspace)
            .args(["--db", &path_arg(&workspace.db_path()), "import", &path_arg(input)])
            .assert()
            .failure();
    }
    assert!(!workspace.db_path().exists());
}

#[test]
fn e2e_non_json_file_is_unknown_format() {
    let workspace = ImportWorkspace::new();
    let file = workspace.write_file("notes.txt", b"just some text");

    arc_command(&workspace)
        .args(["normalize", &path_arg(&file)])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown file format"));
}

#[test]
fn e2e_collaborator_files_need_collaborators() {
    let workspace = ImportWorkspace::new();
    let api = workspace.write_file("api.raml", b"#%RAML 1.0\ntitle: x\n");
    let encrypted = workspace.write_file("secret.arc", b"aes\nU2FsdGVkX1\n");

    arc_command(&workspace)
        .args(["detect", &path_arg(&api)])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("API processor not available"));

    arc_command(&workspace)
        .args(["import", &path_arg(&encrypted)])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Unable to decode encrypted file."));
}

#[test]
fn e2e_missing_config_file() {
    let workspace = ImportWorkspace::new();
    let file = workspace.write_json("collection.json", &common::fixtures::postman_v2_collection());

    arc_command(&workspace)
        .args(["--config", "nope.yaml", "import", &path_arg(&file)])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn e2e_schema_output() {
    let workspace = ImportWorkspace::new();

    let all = run_arc(&workspace, ["schema"], "schema_all");
    assert!(all.status.success(), "schema failed: {}", all.stderr);
    let payload = all.json();
    assert_eq!(payload["tool"], "arc-import");
    for name in ["ImportBundle", "ImportSummary", "StoreStats", "ErrorEnvelope"] {
        assert!(payload["schemas"].get(name).is_some(), "missing {name}");
    }

    let bundle = run_arc(&workspace, ["schema", "bundle"], "schema_bundle").json();
    assert_eq!(bundle["schemas"].as_object().unwrap().len(), 1);
}

#[test]
fn e2e_quiet_prints_nothing() {
    let workspace = ImportWorkspace::new();
    let file = workspace.write_json("collection.json", &common::fixtures::postman_v2_collection());

    arc_command(&workspace)
        .args(["-q", "--db", &path_arg(&workspace.db_path()), "import", &path_arg(&file)])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert!(workspace.db_path().exists());
}
