use assert_cmd::Command;
use std::fs;

fn recite(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("recite").unwrap();
    cmd.arg("--config").arg(dir.path().join("config.json"));
    cmd
}

#[test]
fn split_prints_numbered_units() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("text.txt");
    fs::write(&file, "Hello world. How are you?").unwrap();

    let output = recite(&dir)
        .args(["split", "--max-length", "10", "-s", ".", "-s", "?"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let units: Vec<&str> = stdout
        .lines()
        .map(|l| l.trim_start().splitn(2, "  ").nth(1).unwrap_or(""))
        .collect();
    assert_eq!(units, vec!["Hello", "world.", "How are", "you?"]);
}

#[test]
fn split_rejects_zero_max_length() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("text.txt");
    fs::write(&file, "Some text.").unwrap();

    recite(&dir)
        .args(["split", "--max-length", "0"])
        .arg(&file)
        .assert()
        .failure();
}

#[test]
fn score_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = recite(&dir)
        .args(["score", "The cat sat on the mat.", "the dog sat on mat", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["result"]["matched_count"], 4);
    assert_eq!(value["result"]["total_count"], 5);
    assert_eq!(value["result"]["missing_words"][0], "cat");
    assert_eq!(value["recall"], 80.0);
    assert_eq!(value["highlight"][1]["token"], "dog");
    assert_eq!(value["highlight"][1]["matched"], false);
}

#[test]
fn practice_reads_stdin_and_exports_missing_words() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("text.txt");
    let export = dir.path().join("missing.txt");
    fs::write(&file, "Good morning. The cat sat on the mat.").unwrap();

    recite(&dir)
        .args(["practice", "--no-color", "--no-stats"])
        .arg(&file)
        .arg("--export-missing")
        .arg(&export)
        .write_stdin("\nthe dog sat on mat\n")
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&export).unwrap(), "cat\ngood\nmorning\n");
    assert!(dir.path().join("history.csv").exists());
}

#[test]
fn config_reset_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    recite(&dir).args(["config", "--reset"]).assert().success();

    let saved: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.path().join("config.json")).unwrap()).unwrap();
    assert_eq!(saved["max_length"], 125);
}

#[test]
fn practice_skips_unreadable_file_and_still_exports() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.txt");
    let absent = dir.path().join("absent.txt");
    let export = dir.path().join("missing.txt");
    fs::write(&good, "Good morning.").unwrap();

    let output = recite(&dir)
        .args(["practice", "--no-color", "--no-stats", "--no-history"])
        .arg(&good)
        .arg(&absent)
        .arg("--export-missing")
        .arg(&export)
        .write_stdin("\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    assert_eq!(fs::read_to_string(&export).unwrap(), "good\nmorning\n");
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("absent.txt"));
}

#[test]
fn words_lists_attempts_for_one_word() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("text.txt");
    fs::write(&file, "Good morning.").unwrap();

    recite(&dir)
        .args(["practice", "--no-color", "--no-history"])
        .arg(&file)
        .write_stdin("good\n")
        .assert()
        .success();

    let output = recite(&dir)
        .args(["words", "--word", "Morning"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("missed"));
    assert!(stdout.contains("Good morning."));
    assert!(stdout.contains("morning missed 1 of 1 (100%)"));
}
