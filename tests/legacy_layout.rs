mod support;

use serde_json::Value;

use support::TestDir;

const LEGACY_USERS: &str = r#"{
    "1": {"name": "alice", "display_name": "Alice", "creation_time": "2024-01-05T10:11:12.123456"},
    "3": {"name": "carol", "display_name": "Carol", "creation_time": "2024-01-06T08:00:00.000001"}
}"#;

#[test]
fn legacy_map_is_read_and_upgraded_on_write() {
    let dir = TestDir::new();
    dir.write_file("db/users.json", LEGACY_USERS).expect("seed users");

    let listed = dir.json(&["user", "list"]);
    assert_eq!(listed["data"]["total"], 2);
    assert_eq!(listed["data"]["users"][1]["name"], "carol");

    // Sequences resume past existing ids rather than reusing a count.
    let id = dir.create(&["user", "create", "dave", "--display-name", "Dave"]);
    assert_eq!(id, "4");

    let raw = dir.read_file("db/users.json");
    let doc: Value = serde_json::from_str(&raw).expect("document");
    assert_eq!(doc["schema_version"], "teamboard.collection.v1");
    assert_eq!(doc["records"]["1"]["name"], "alice");
    assert_eq!(doc["records"]["4"]["name"], "dave");
}

#[test]
fn empty_file_reads_as_empty_collection() {
    let dir = TestDir::new();
    dir.write_file("db/teams.json", "  \n").expect("seed teams");
    let listed = dir.json(&["team", "list"]);
    assert_eq!(listed["data"]["total"], 0);
}

#[test]
fn malformed_collection_is_operation_failure() {
    let dir = TestDir::new();
    dir.write_file("db/boards.json", "[1, 2]").expect("seed boards");

    let output = dir
        .cmd()
        .args(["board", "list", "1", "--json"])
        .assert()
        .code(4)
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output).expect("error envelope");
    assert_eq!(value["error"]["kind"], "operation_failed");
    assert!(value["error"]["details"]["path"]
        .as_str()
        .map_or(false, |p| p.ends_with("boards.json")));

    // The broken document is left untouched.
    assert_eq!(dir.read_file("db/boards.json"), "[1, 2]");
}
