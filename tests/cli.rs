use assert_cmd::Command;
use predicates::prelude::*;

fn tsm() -> Command {
    Command::cargo_bin("tsm").unwrap()
}

#[test]
fn test_version_prints_crate_version() {
    tsm()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    tsm()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("--include-current"));
}

#[test]
fn test_init_writes_config_once() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join(".config/tsm/config.toml");

    tsm()
        .arg("init")
        .env("HOME", home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
    assert!(config.exists());
    let content = std::fs::read_to_string(&config).unwrap();
    assert!(content.contains("keybindings"));

    tsm()
        .arg("init")
        .env("HOME", home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_unknown_subcommand_fails() {
    tsm().arg("bogus").assert().failure();
}
