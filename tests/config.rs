mod support;

use predicates::str::contains;
use serde_json::Value;

use support::TestDir;
use teamboard::config::{Config, CONFIG_FILE};

#[test]
fn config_show_reports_defaults_without_file() {
    let dir = TestDir::new();
    let value = dir.json(&["config", "show"]);
    assert_eq!(value["command"], "config show");
    assert_eq!(value["data"]["exists"], false);
    assert_eq!(value["data"]["config"]["data_dir"], "db");
    assert_eq!(value["data"]["config"]["limits"]["max_users_per_add"], 50);
}

#[test]
fn config_limits_apply_to_commands() {
    let dir = TestDir::new();
    dir.write_config("[limits]\nname_max = 5\n").expect("write config");

    let value = dir.json(&["config", "show"]);
    assert_eq!(value["data"]["exists"], true);
    assert_eq!(value["data"]["config"]["limits"]["name_max"], 5);

    dir.cmd()
        .args(["user", "create", "abcdef", "--display-name", "Long"])
        .assert()
        .code(2)
        .stderr(contains("5 characters or less"));
    dir.cmd()
        .args(["user", "create", "abc", "--display-name", "Short"])
        .assert()
        .success();
}

#[test]
fn custom_data_dir_is_used() {
    let dir = TestDir::new();
    dir.write_config("data_dir = \"state\"\n").expect("write config");
    dir.create(&["user", "create", "alice", "--display-name", "Alice"]);
    assert!(dir.path().join("state/users.json").is_file());
    assert!(!dir.path().join("db").exists());
}

#[test]
fn invalid_config_is_user_error() {
    let dir = TestDir::new();
    dir.write_config("[storage]\nlock_timeout_ms = 0\n")
        .expect("write config");

    let output = dir
        .cmd()
        .args(["user", "list", "--json"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output).expect("error envelope");
    assert_eq!(value["error"]["kind"], "user_error");
    assert_eq!(value["next_steps"][0], "fix .teamboard.toml then retry");
}

#[test]
fn dir_flag_and_env_select_working_directory() {
    let dir = TestDir::new();
    support::teamboard_cmd()
        .arg("--dir")
        .arg(dir.path())
        .args(["user", "create", "alice", "--display-name", "Alice"])
        .assert()
        .success();

    let output = support::teamboard_cmd()
        .env("TEAMBOARD_DIR", dir.path())
        .args(["user", "list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output).expect("envelope");
    assert_eq!(value["data"]["total"], 1);
}

#[test]
fn init_writes_loadable_config() {
    let dir = TestDir::new();
    dir.cmd().arg("init").assert().success();
    let config = Config::load(&dir.path().join(CONFIG_FILE)).expect("load config");
    assert_eq!(config.limits.name_max, 64);
    assert!(config.storage.pretty);
}
