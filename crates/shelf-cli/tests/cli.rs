use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn shelftalk(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("shelftalk").unwrap();
    cmd.current_dir(dir)
        .env_remove("SHELFTALK_DB")
        .arg("--no-color")
        .arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--database")
        .arg(dir.join("shelf.db"));
    cmd
}

fn seed(dir: &Path) {
    shelftalk(dir)
        .args(["member", "add", "7", "--nickname", "reader"])
        .assert()
        .success();
    shelftalk(dir)
        .args(["member", "add", "9", "--nickname", "second"])
        .assert()
        .success();
    shelftalk(dir)
        .args(["book", "add", "42", "--title", "The Vegetarian", "--author", "Han Kang"])
        .assert()
        .success();
}

#[test]
fn test_help() {
    Command::cargo_bin("shelftalk")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("thread"))
        .stdout(predicate::str::contains("reconcile"));
}

#[test]
fn test_thread_lifecycle() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    seed(dir);

    shelftalk(dir)
        .args(["thread", "create", "42", "--member", "7", "--content", "first post"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created thread 1"));

    shelftalk(dir)
        .args(["thread", "exists", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("true"));

    shelftalk(dir)
        .args(["comment", "reply", "1", "--member", "9", "--content", "a reply here"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Posted reply 2"));

    shelftalk(dir)
        .args(["--json", "comment", "list", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"has_more\": false"))
        .stdout(predicate::str::contains("\"reply_count\": 1"))
        .stdout(predicate::str::contains("\"nickname\": \"reader\""));

    shelftalk(dir)
        .args(["thread", "list", "--query", "han kang"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The Vegetarian by Han Kang"));

    shelftalk(dir)
        .args(["comment", "delete", "1", "--member", "7", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed"));

    shelftalk(dir)
        .args(["thread", "exists", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));
}

#[test]
fn test_rejections_exit_non_zero() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    seed(dir);

    shelftalk(dir)
        .args(["thread", "create", "42", "--member", "7", "--content", "too short"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation error"));

    shelftalk(dir)
        .args(["thread", "create", "42", "--member", "8", "--content", "first post"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authorization error"));

    shelftalk(dir)
        .args(["thread", "create", "42", "--member", "7", "--content", "first post"])
        .assert()
        .success();

    shelftalk(dir)
        .args(["comment", "delete", "1", "--member", "9", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authorization error"));

    shelftalk(dir)
        .args(["thread", "show", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_withdraw_and_reconcile() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    seed(dir);

    shelftalk(dir)
        .args(["thread", "create", "42", "--member", "7", "--content", "first post"])
        .assert()
        .success();

    shelftalk(dir)
        .args(["--json", "member", "withdraw", "7", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"comments_deactivated\": 1"))
        .stdout(predicate::str::contains("\"threads_removed\": 1"));

    shelftalk(dir)
        .args(["member", "withdraw", "7", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Conflict"));

    shelftalk(dir)
        .args(["reconcile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to clean up"));
}

#[test]
fn test_init_writes_valid_config() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    Command::cargo_bin("shelftalk")
        .unwrap()
        .current_dir(dir)
        .env_remove("SHELFTALK_DB")
        .args(["--no-color", "init", "--path"])
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Database ready"));

    assert!(dir.join(".shelftalk").join("config.toml").exists());
    assert!(dir.join(".shelftalk").join("shelftalk.db").exists());

    Command::cargo_bin("shelftalk")
        .unwrap()
        .current_dir(dir)
        .env_remove("SHELFTALK_DB")
        .args(["--no-color", "config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_invalid_config_rejected() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    std::fs::write(
        dir.join("config.toml"),
        "[content]\nmin_length = 50\nmax_length = 10\n",
    )
    .unwrap();

    shelftalk(dir)
        .args(["thread", "exists", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("min_length"));
}

#[test]
fn test_comment_paging_hint_respects_max_page_size() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    std::fs::write(dir.join("config.toml"), "[pagination]\nmax_page_size = 2\n").unwrap();
    seed(dir);

    shelftalk(dir)
        .args(["thread", "create", "42", "--member", "7", "--content", "first post"])
        .assert()
        .success();
    for n in 2..=5 {
        shelftalk(dir)
            .args(["comment", "add", "1", "--member", "9", "--content"])
            .arg(format!("comment number {}", n))
            .assert()
            .success();
    }

    shelftalk(dir)
        .args(["comment", "list", "1", "--limit", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Use --offset 2 to continue"))
        .stdout(predicate::str::contains("comment number 5"))
        .stdout(predicate::str::contains("comment number 3").not());

    shelftalk(dir)
        .args(["comment", "list", "1", "--offset", "2", "--limit", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("comment number 3"))
        .stdout(predicate::str::contains("comment number 2"))
        .stdout(predicate::str::contains("Use --offset 4 to continue"));

    shelftalk(dir)
        .args(["thread", "list", "--page", "2", "--limit", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No threads found."));
}
