//! Integration tests driving the `cq` binary against tests/fixtures

use std::path::Path;
use std::process::Command;

const PROJECT: &str = "tests/fixtures";

/// Path to the compiled cq binary
fn cq_bin() -> String {
    env!("CARGO_BIN_EXE_cq").to_string()
}

/// Run a `cq` command and return (stdout, stderr, success).
fn run_cq(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(cq_bin())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute cq with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn algorithm(name: &str) -> String {
    format!("{PROJECT}/algorithms/{name}")
}

fn read(dir: &Path, file: &str) -> String {
    std::fs::read_to_string(dir.join(file))
        .unwrap_or_else(|e| panic!("missing output {file}: {e}"))
}

// ── compile ─────────────────────────────────────────────────────────────

#[test]
fn test_compile_writes_one_file_per_part() {
    let out = tempfile::tempdir().unwrap();
    let out_dir = out.path().to_str().unwrap();
    let (stdout, stderr, ok) = run_cq(&[
        "-p",
        PROJECT,
        "compile",
        &algorithm("daily.cql"),
        "--output-dir",
        out_dir,
    ]);
    assert!(ok, "compile failed: {stderr}");
    assert!(stdout.contains("Compiled 1 algorithm(s)"));

    assert_eq!(
        read(out.path(), "daily_part1.sql"),
        "SELECT\n\tt1.GTP_ID as GTP_ID,\n\tt1.VOL as VOLUME\nFROM\n\tODS.BIDS t1\nWHERE\n\tt1.VOL > 0\n"
    );
    assert_eq!(
        read(out.path(), "daily_part2.sql"),
        "SELECT\n\tt1.GTP_ID as GTP_ID,\n\tt1.VOL as VOLUME\nFROM\n\tODS.DEALS t1\n"
    );
    assert!(!out.path().join("daily.sql").exists());
}

#[test]
fn test_compile_join_parts_uses_configured_placeholder() {
    let out = tempfile::tempdir().unwrap();
    let (_, stderr, ok) = run_cq(&[
        "-p",
        PROJECT,
        "compile",
        &algorithm("daily.cql"),
        "--join-parts",
        "-d",
        out.path().to_str().unwrap(),
    ]);
    assert!(ok, "compile failed: {stderr}");

    let sql = read(out.path(), "daily.sql");
    assert!(sql.starts_with("WITH\nODS_BIDS as ("));
    assert!(sql.ends_with("SELECT * FROM\n\tODS_BIDS\n\tFULL JOIN ODS_DEALS ON 1=1\n"));
}

#[test]
fn test_compile_applies_configured_lookup() {
    let (stdout, stderr, ok) = run_cq(&[
        "-p",
        PROJECT,
        "compile",
        &algorithm("sessions.cql"),
        "--stdout",
    ]);
    assert!(ok, "compile failed: {stderr}");
    assert!(stdout.contains(
        "\tINNER JOIN ODS_002.TRADE_SESSION t2 ON t1.TRADE_SESSION_ID = t2.TRADE_SESSION_ID"
    ));
    assert!(stdout.contains("\tt2.TARGET_DATE as TARGET_DATE,"));
    assert!(stdout.contains("UNION ALL\nSELECT GTP_ID, VOLUME FROM ODS_DEALS;"));
}

#[test]
fn test_compile_json_output() {
    let (stdout, stderr, ok) = run_cq(&[
        "-p",
        PROJECT,
        "compile",
        &algorithm("daily.cql"),
        &algorithm("sessions.cql"),
        "--output",
        "json",
    ]);
    assert!(ok, "compile failed: {stderr}");

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let compiled = json.as_array().unwrap();
    assert_eq!(compiled.len(), 2);
    assert_eq!(compiled[0]["algorithm"], algorithm("daily.cql").as_str());
    assert_eq!(compiled[0]["statements"].as_array().unwrap().len(), 2);
    assert_eq!(compiled[1]["statements"].as_array().unwrap().len(), 1);
}

#[test]
fn test_compile_reports_syntax_error() {
    let (_, stderr, ok) = run_cq(&["-p", PROJECT, "compile", &algorithm("broken.cql"), "--stdout"]);
    assert!(!ok);
    assert!(stderr.contains("Failed to compile algorithm"));
    assert!(stderr.contains("[Q001]"));
}

#[test]
fn test_compile_without_config_uses_defaults() {
    let project = tempfile::tempdir().unwrap();
    let (stdout, stderr, ok) = run_cq(&[
        "-p",
        project.path().to_str().unwrap(),
        "compile",
        &algorithm("daily.cql"),
        "--attributes",
        &format!("{PROJECT}/attributes.yml"),
        "--join-parts",
        "--stdout",
    ]);
    assert!(ok, "compile failed: {stderr}");
    assert!(stdout.contains("FULL JOIN ODS_DEALS ON a=a"));
}

#[test]
fn test_compile_without_attribute_file_fails() {
    let project = tempfile::tempdir().unwrap();
    let (_, stderr, ok) = run_cq(&[
        "-p",
        project.path().to_str().unwrap(),
        "compile",
        &algorithm("daily.cql"),
    ]);
    assert!(!ok);
    assert!(stderr.contains("No attribute file"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let (_, stderr, ok) = run_cq(&["--config", "tests/fixtures/nope.yml", "transforms"]);
    assert!(!ok);
    assert!(stderr.contains("[C001]"));
}

// ── explain / attributes / transforms ──────────────────────────────────

#[test]
fn test_explain_prints_each_part() {
    let (stdout, stderr, ok) = run_cq(&["-p", PROJECT, "explain", &algorithm("daily.cql")]);
    assert!(ok, "explain failed: {stderr}");
    assert!(stdout.contains("Part 1:\n  Table: ODS.BIDS (2 attributes)\n    Filter: VOL > 0\n"));
    assert!(stdout.contains("Part 2:\n  Table: ODS.DEALS (2 attributes)\n"));
}

#[test]
fn test_explain_merged_shows_full_join() {
    let (stdout, _, ok) = run_cq(&["-p", PROJECT, "explain", &algorithm("daily.cql"), "-j"]);
    assert!(ok);
    assert!(stdout.contains("Operation: FULL JOIN"));
    assert!(!stdout.contains("Part 2:"));
}

#[test]
fn test_attributes_json() {
    let (stdout, stderr, ok) = run_cq(&["-p", PROJECT, "attributes", "--output", "json"]);
    assert!(ok, "attributes failed: {stderr}");

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let bids = json["ODS.BIDS"].as_array().unwrap();
    assert_eq!(bids.len(), 2);
    assert_eq!(bids[0]["name"], "GTP_ID");
    assert_eq!(bids[0]["is_pk"], true);
    assert!(json.get("ODS.DEALS").is_some());
}

#[test]
fn test_attributes_text() {
    let (stdout, _, ok) = run_cq(&["-p", PROJECT, "attributes"]);
    assert!(ok);
    assert!(stdout.contains("ODS.BIDS\n  GTP_ID [pk] = GTP_ID\n  VOLUME = VOL\n"));
    assert!(stdout.contains("2 tables"));
}

#[test]
fn test_transforms_lists_builtin_and_configured() {
    let (stdout, stderr, ok) = run_cq(&["-p", PROJECT, "transforms"]);
    assert!(ok, "transforms failed: {stderr}");
    assert!(stdout.contains("get_target_date"));
    assert!(stdout.contains("lookup join on ODS_002.TRADE_SESSION"));
    assert!(stdout.contains("group"));
}
