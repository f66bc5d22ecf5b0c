use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const STORE: &str = r#"
[[books]]
title = "Dune"
amount = 2
price = 40

[[books]]
title = "Emma"
amount = 1
price = 15

[[vehicles]]
license = 101
speed = 5

[[vehicles]]
license = 102
speed = 10

[[customers]]
id = 1
name = "Ada"
address = "Main St"
distance = 10
credit = 100

[[customers.orders]]
title = "Dune"
tick = 0

[[customers.orders]]
title = "Emma"
tick = 1

[[customers]]
id = 2
name = "Bo"
address = "Side St"
distance = 5
credit = 30

[[customers.orders]]
title = "Dune"
tick = 2

[services]
workers = 2
"#;

fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write config");
    path
}

fn bookshop() -> Command {
    Command::cargo_bin("bookshop").unwrap()
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_check_prints_counts() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "store.toml", STORE);

    bookshop()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("books: 2"))
        .stdout(predicate::str::contains("vehicles: 2"))
        .stdout(predicate::str::contains("customers: 2"))
        .stdout(predicate::str::contains("orders: 3"));
}

#[test]
fn test_check_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "store.toml",
        r#"
[[vehicles]]
license = 1
speed = 0
"#,
    );

    bookshop()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("zero speed"));
}

#[test]
fn test_check_rejects_unparseable_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "store.toml", "[[books]\ntitle = ");

    bookshop()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure();
}

#[test]
fn test_check_missing_file_fails() {
    bookshop()
        .arg("check")
        .arg("--config")
        .arg("does-not-exist.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.toml"));
}

#[test]
fn test_run_prints_summary() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "store.toml", STORE);

    // Bo cannot afford the second Dune
    bookshop()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("orders completed: 2"))
        .stdout(predicate::str::contains("orders declined: 1"))
        .stdout(predicate::str::contains("deliveries: 2"))
        .stdout(predicate::str::contains("total earnings: 55"));
}

#[test]
fn test_run_writes_snapshots() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "store.toml", STORE);
    let inventory = dir.path().join("inventory.json");
    let receipts = dir.path().join("receipts.json");

    bookshop()
        .args(["--log-level", "error", "run", "--config"])
        .arg(&config)
        .arg("--inventory-out")
        .arg(&inventory)
        .arg("--receipts-out")
        .arg(&receipts)
        .assert()
        .success();

    let inventory = read_json(&inventory);
    assert_eq!(inventory["Dune"], 1);
    assert_eq!(inventory["Emma"], 0);

    let receipts = read_json(&receipts);
    let receipts = receipts.as_array().unwrap();
    assert_eq!(receipts.len(), 2);
    assert!(receipts.iter().all(|r| r["customer_id"] == 1));
}

#[test]
fn test_run_uses_output_paths_from_config() {
    let dir = TempDir::new().unwrap();
    let receipts = dir.path().join("from-config.json");
    let contents = format!(
        "{}\n[output]\nreceipts = {:?}\n",
        STORE,
        receipts.to_string_lossy()
    );
    let config = write_config(&dir, "store.toml", &contents);

    bookshop()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert_eq!(read_json(&receipts).as_array().unwrap().len(), 2);
}

#[test]
fn test_run_accepts_json_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "store.json",
        r#"{
  "books": [{ "title": "Dune", "amount": 1, "price": 40 }],
  "vehicles": [{ "license": 7, "speed": 3 }],
  "customers": [{
    "id": 1, "name": "Ada", "address": "Main St", "distance": 3, "credit": 40,
    "orders": [{ "title": "Dune", "tick": 0 }]
  }]
}"#,
    );

    bookshop()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("orders completed: 1"))
        .stdout(predicate::str::contains("total earnings: 40"));
}

#[test]
fn test_unknown_log_level_is_rejected() {
    bookshop()
        .args(["--log-level", "loud", "check", "--config", "store.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown log level"));
}
