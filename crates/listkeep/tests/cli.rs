use assert_cmd::prelude::*;

use predicates::prelude::*;
use predicates::str::contains;
use serial_test::serial;
use std::process::Command;

/// A `listkeep` command rooted in a temporary directory.
fn listkeep_cmd(root: &assert_fs::TempDir) -> Command {
  let mut cmd = Command::cargo_bin("listkeep").expect("binary exists");
  cmd.env("LISTKEEP_ROOT", root.path());
  cmd.env("NO_COLOR", "1");
  cmd.env_remove("LISTKEEP_LOG");
  cmd
}

#[test]
#[serial]
fn seeded_inventory_add_search_delete() {
  let temp = assert_fs::TempDir::new().unwrap();

  listkeep_cmd(&temp)
    .args(["inventory", "list"])
    .assert()
    .success()
    .stdout(contains("Cement").and(contains("Bricks")).and(contains("2 of 2 shown")));

  listkeep_cmd(&temp)
    .args(["inventory", "add", "--set", "name=Sand", "--set", "category=Aggregate", "--set", "quantity=60"])
    .assert()
    .success()
    .stdout(contains("Added inventory record"));

  listkeep_cmd(&temp)
    .args(["inventory", "list", "--search", "brick"])
    .assert()
    .success()
    .stdout(contains("Bricks").and(contains("Cement").not()).and(contains("1 of 3 shown")));

  listkeep_cmd(&temp)
    .args(["inventory", "delete", "2", "--force"])
    .assert()
    .success()
    .stdout(contains("Deleted inventory record"));

  listkeep_cmd(&temp).args(["inventory", "get", "2"]).assert().failure().stderr(contains("no inventory record"));

  listkeep_cmd(&temp)
    .args(["inventory", "list", "--json"])
    .assert()
    .success()
    .stdout(contains("\"Sand\"").and(contains("\"unitPrice\"")).and(contains("Bricks").not()));

  assert!(temp.path().join("data").join("inventory.json").exists());
  temp.close().unwrap();
}

#[test]
#[serial]
fn invalid_add_reports_fields_and_saves_nothing() {
  let temp = assert_fs::TempDir::new().unwrap();

  listkeep_cmd(&temp)
    .args(["inventory", "add", "--set", "name=", "--set", "quantity=0"])
    .assert()
    .failure()
    .stderr(contains("name").and(contains("is required")).and(contains("must be a positive number")));

  assert!(!temp.path().join("data").join("inventory.json").exists());
  temp.close().unwrap();
}

#[test]
#[serial]
fn tasks_sort_by_priority_and_update() {
  let temp = assert_fs::TempDir::new().unwrap();

  for (title, priority) in [("Sweep site", "low"), ("Order sand", "high")] {
    listkeep_cmd(&temp)
      .args(["tasks", "add", "--set", &format!("title={title}"), "--set", &format!("priority={priority}")])
      .assert()
      .success();
  }

  let output = listkeep_cmd(&temp).args(["tasks", "list", "--sort", "priority", "--desc"]).output().unwrap();
  let stdout = String::from_utf8(output.stdout).unwrap();
  let high = stdout.find("Order sand").unwrap();
  let low = stdout.find("Sweep site").unwrap();
  assert!(high < low);

  listkeep_cmd(&temp)
    .args(["tasks", "list", "--sort", "colour"])
    .assert()
    .failure()
    .stderr(contains("cannot sort tasks"));

  listkeep_cmd(&temp)
    .args(["tasks", "update", "missing-id", "--set", "status=done"])
    .assert()
    .failure()
    .stderr(contains("missing-id"));

  temp.close().unwrap();
}

#[test]
#[serial]
fn orders_accept_line_items_and_summarize() {
  let temp = assert_fs::TempDir::new().unwrap();

  listkeep_cmd(&temp)
    .args([
      "orders",
      "add",
      "--set",
      "supplier=Acme Supplies",
      "--set",
      "orderDate=2024-04-02",
      "--set",
      r#"items=[{"description":"Rebar","quantity":4,"unitPrice":12}]"#,
    ])
    .assert()
    .success();

  listkeep_cmd(&temp)
    .args(["orders", "summary", "--by", "status", "--sum", "total"])
    .assert()
    .success()
    .stdout(contains("pending 1").and(contains("total=48")));

  listkeep_cmd(&temp)
    .args(["orders", "list", "--search", "rebar"])
    .assert()
    .success()
    .stdout(contains("supplier=Acme Supplies"));

  temp.close().unwrap();
}

#[test]
#[serial]
fn corrupt_snapshot_is_reported_and_replaced_by_seed() {
  let temp = assert_fs::TempDir::new().unwrap();
  let data = temp.path().join("data");
  std::fs::create_dir_all(&data).unwrap();
  std::fs::write(data.join("inventory.json"), "{ definitely not json").unwrap();

  listkeep_cmd(&temp)
    .args(["inventory", "list"])
    .assert()
    .success()
    .stderr(contains("could not be read"))
    .stdout(contains("Cement"));

  temp.close().unwrap();
}

#[test]
#[serial]
fn config_and_details_preference() {
  let temp = assert_fs::TempDir::new().unwrap();
  std::fs::write(temp.path().join("config.yaml"), "seed_on_empty: false\n").unwrap();

  listkeep_cmd(&temp)
    .args(["config"])
    .assert()
    .success()
    .stdout(contains("seed_on_empty: false").and(contains("confirm_delete: true")));

  listkeep_cmd(&temp).args(["inventory", "list"]).assert().success().stdout(contains("No inventory records found"));

  listkeep_cmd(&temp).args(["pref", "details", "on"]).assert().success().stdout(contains("details is now on"));
  listkeep_cmd(&temp).args(["pref", "details"]).assert().success().stdout(contains("details: on"));

  listkeep_cmd(&temp)
    .args(["inventory", "add", "--set", "name=Lime", "--set", "unit=sacks"])
    .assert()
    .success();

  listkeep_cmd(&temp).args(["inventory", "list"]).assert().success().stdout(contains("unit: sacks"));

  listkeep_cmd(&temp).args(["pref", "details", "maybe"]).assert().failure();
  listkeep_cmd(&temp)
    .args(["pref", "../outside", "on"])
    .assert()
    .failure()
    .stderr(contains("invalid preference name"));
  assert!(!temp.path().join("outside.json").exists());
  temp.close().unwrap();
}

#[test]
#[serial]
fn delete_prompt_can_be_declined() {
  let temp = assert_fs::TempDir::new().unwrap();

  let mut prompted = assert_cmd::Command::from_std(listkeep_cmd(&temp));
  prompted
    .args(["inventory", "delete", "1"])
    .write_stdin("n\n")
    .assert()
    .success()
    .stdout(contains("Deletion cancelled"));

  listkeep_cmd(&temp).args(["inventory", "get", "1"]).assert().success().stdout(contains("Cement"));
  temp.close().unwrap();
}
