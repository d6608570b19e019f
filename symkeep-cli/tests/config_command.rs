//! Integration tests for the config command and configuration precedence.

mod common;

use common::TestEnv;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_view_without_configuration() {
    let env = TestEnv::new();
    env.command()
        .args(["config", "view"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("built-in defaults"));
}

#[test]
fn test_set_then_view() {
    let env = TestEnv::new();

    env.command()
        .args(["config", "set", "concurrency_limit", "8"])
        .assert()
        .success();
    assert!(env.data_dir.join("config.yaml").is_file());

    env.command()
        .args(["config", "view"])
        .assert()
        .success()
        .stdout(predicate::str::contains("concurrency_limit: 8"));

    let json = TestEnv::json(env.command().args(["config", "view", "--json"]));
    assert_eq!(json["concurrency_limit"], 8);
}

#[test]
fn test_set_keeps_other_keys() {
    let env = TestEnv::new();
    env.command()
        .args(["config", "set", "force", "yes"])
        .assert()
        .success();
    env.command()
        .args(["config", "set", "default_mode", "open"])
        .assert()
        .success();

    let json = TestEnv::json(env.command().args(["config", "view", "--json"]));
    assert_eq!(json["force"], true);
    assert_eq!(json["default_mode"], "open");
}

#[test]
fn test_set_unknown_key_is_invalid_argument() {
    let env = TestEnv::new();
    env.command()
        .args(["config", "set", "colour", "blue"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("unknown key"));
}

#[test]
fn test_set_out_of_range_value_is_rejected() {
    let env = TestEnv::new();
    env.command()
        .args(["config", "set", "concurrency_limit", "0"])
        .assert()
        .code(4);
    assert!(!env.data_dir.join("config.yaml").exists());
}

#[test]
fn test_reset_removes_global_file() {
    let env = TestEnv::new();
    env.command()
        .args(["config", "set", "verify", "false"])
        .assert()
        .success();

    env.command().args(["config", "reset"]).assert().success();
    assert!(!env.data_dir.join("config.yaml").exists());

    env.command()
        .args(["config", "reset"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No configuration file"));
}

#[test]
fn test_set_directory_writes_local_file() {
    let env = TestEnv::new();
    env.command()
        .args(["config", "set", "--directory", "recursive", "false"])
        .assert()
        .success();

    let text = fs::read_to_string(env.join(".symkeep.yaml")).unwrap();
    assert!(text.contains("recursive: false"));
    assert!(!env.data_dir.join("config.yaml").exists());
}

#[test]
fn test_directory_file_overrides_global() {
    let env = TestEnv::new();
    env.command()
        .args(["config", "set", "fix_search_depth", "3"])
        .assert()
        .success();
    env.command()
        .args(["config", "set", "--directory", "fix_search_depth", "5"])
        .assert()
        .success();

    let json = TestEnv::json(env.command().args(["config", "view", "--json"]));
    assert_eq!(json["fix_search_depth"], 5);

    env.command()
        .args(["config", "view", "--sources"])
        .assert()
        .success()
        .stderr(predicate::str::contains(".symkeep.yaml"))
        .stderr(predicate::str::contains("config.yaml"));
}

#[test]
fn test_environment_overrides_files() {
    let env = TestEnv::new();
    env.command()
        .args(["config", "set", "concurrency_limit", "8"])
        .assert()
        .success();

    let json = TestEnv::json(
        env.command()
            .env("SYMKEEP_CONCURRENCY", "2")
            .args(["config", "view", "--json"]),
    );
    assert_eq!(json["concurrency_limit"], 2);
}

#[test]
fn test_invalid_config_file_is_a_config_error() {
    let env = TestEnv::new();
    fs::write(env.join(".symkeep.yaml"), "no_such_key: 1\n").unwrap();

    env.command()
        .arg("scan")
        .assert()
        .code(7);
}

#[test]
fn test_out_of_range_config_file_is_a_config_error() {
    let env = TestEnv::new();
    fs::write(env.join(".symkeep.yaml"), "concurrency_limit: 0\n").unwrap();

    env.command()
        .arg("scan")
        .assert()
        .code(7);
}
