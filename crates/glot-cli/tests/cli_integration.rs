use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::{fs, path::PathBuf, process::Command};

fn bin_cmd() -> Command {
    let mut cmd = Command::cargo_bin("glot").expect("binary glot should be built by cargo");
    cmd.arg("--quiet");
    cmd
}

fn write_catalog(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("fixture catalog should be writable");
    path
}

const SAMPLE: &str = "\
@meta locale = de-DE
abcdef (Greeting): hello @fedcba
fedcba: world
facade{one}: 1 apple
facade{other}: %0 apples
style_box: color: #fff; @utility; mass: 2.5
";

#[test]
fn help_works() {
    let mut cmd = bin_cmd();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Message catalog"));
}

#[test]
fn translate_resolves_references() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", SAMPLE);

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&catalog)
        .args(["translate", "ABCDEF"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hello world"));
}

#[test]
fn translate_substitutes_args() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", "abcdef: %0 + %1\n");

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&catalog)
        .args(["translate", "abcdef", "x", "y"]);
    cmd.assert().success().stdout(predicate::str::contains("x + y"));
}

#[test]
fn plural_selects_variant() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", SAMPLE);

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&catalog)
        .args(["plural", "facade", "3", "3"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("3 apples"));

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&catalog)
        .args(["plural", "facade", "1", "1"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1 apple"));
}

#[test]
fn style_prints_string_and_record() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", SAMPLE);

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&catalog)
        .args(["style", "style_box"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("utility color: #fff; mass: 2.5;"))
        .stdout(predicate::str::contains("mass: 2.5"))
        .stdout(predicate::str::contains("physical: true"));
}

#[test]
fn dump_outputs_sorted_table() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", SAMPLE);

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"]).arg(&catalog).arg("dump");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Token        | Label"))
        .stdout(predicate::str::contains("Greeting"));
}

#[test]
fn dump_json_emits_rows() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", SAMPLE);

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&catalog)
        .args(["dump", "--format", "json", "--limit", "2"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"token\": \"abcdef\""))
        .stdout(predicate::str::contains("\"label\": \"Greeting\""));
}

#[test]
fn find_reports_matches_and_misses() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", SAMPLE);

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"]).arg(&catalog).args(["find", "WORLD"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("fedcba(): world"));

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&catalog)
        .args(["find", "nothing-like-this"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("(no matches)"));
}

#[test]
fn check_clean_catalog_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", SAMPLE);

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"]).arg(&catalog).arg("check");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CHECK: OK"));
}

#[test]
fn check_broken_catalog_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", "abcdef: @bbbbbb\n");

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"]).arg(&catalog).arg("check");
    cmd.assert()
        .code(3)
        .stdout(predicate::str::contains("missing inline ref @bbbbbb"))
        .stdout(predicate::str::contains("CHECK: FAIL"));
}

#[test]
fn check_json_carries_machine_readable_kinds() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", "abcdef: @abcdef %2\n");

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&catalog)
        .args(["check", "--format", "json"]);
    cmd.assert()
        .code(3)
        .stdout(predicate::str::contains("\"kind\": \"cycle\""))
        .stdout(predicate::str::contains("\"kind\": \"placeholder-gap\""));
}

#[test]
fn export_writes_binary_that_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", "abcdef: hi %0\n");
    let out = dir.path().join("out").join("catalog.i18n");

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&catalog)
        .args(["export", "--out"])
        .arg(&out);
    cmd.assert().success();

    let meta = fs::metadata(&out).expect("exported catalog should exist");
    assert!(meta.len() > 0, "exported catalog should not be empty");

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&out)
        .args(["--strict", "translate", "abcdef", "=there"]);
    cmd.assert().success().stdout(predicate::str::contains("hi there"));
}

#[test]
fn strict_mode_rejects_bad_lines() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = write_catalog(&dir, "catalog.txt", "not a valid line\nabcdef: ok\n");

    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&catalog)
        .args(["--strict", "translate", "abcdef"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to load"));

    // Non-strict: the bad line is skipped.
    let mut cmd = bin_cmd();
    cmd.args(["--catalog"])
        .arg(&catalog)
        .args(["translate", "abcdef"]);
    cmd.assert().success().stdout(predicate::str::contains("ok"));
}

#[test]
fn missing_catalog_flag_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = bin_cmd();
    // Пустой CWD без glot.toml: каталог взять неоткуда.
    cmd.current_dir(dir.path()).args(["translate", "abcdef"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no catalog given"));
}
