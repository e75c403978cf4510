//! Tests for `pinsync sync`.

use predicates::prelude::*;
use serde_json::Value;

use crate::common::TestEnv;

const MAIL: &str = "https://mail.test/";
const NEWS: &str = "https://news.test/";
const CHAT: &str = "https://chat.test/";

fn sorted(mut urls: Vec<String>) -> Vec<String> {
  urls.sort();
  urls
}

fn total(report: &Value, field: &str) -> u64 {
  report["collections"]
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c[field].as_u64().unwrap())
    .sum()
}

#[test]
fn first_sync_seeds_store_and_converges_collections() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true), (2, NEWS, false)]), (2, &[(3, CHAT, true)])]);

  let report = env.json(&["sync", "--world", &env.world_arg()]);

  assert_eq!(report["seeded"], true);
  assert_eq!(total(&report, "created"), 2);
  assert_eq!(sorted(env.pinned_urls(1)), vec![CHAT, MAIL]);
  assert_eq!(sorted(env.pinned_urls(2)), vec![CHAT, MAIL]);

  let store = env.store();
  assert_eq!(store["canonical_pins"][MAIL], MAIL);
  assert_eq!(store["canonical_pins"][CHAT], CHAT);
}

#[test]
fn second_sync_changes_nothing() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true)]), (2, &[])]);

  env.json(&["sync", "--world", &env.world_arg()]);
  let world = env.world();
  let report = env.json(&["sync", "--world", &env.world_arg()]);

  assert_eq!(report["seeded"], false);
  assert_eq!(total(&report, "created"), 0);
  assert_eq!(total(&report, "updated"), 0);
  assert_eq!(total(&report, "removed"), 0);
  assert_eq!(env.world(), world);
}

#[test]
fn sync_removes_pins_missing_from_store() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true), (2, CHAT, true), (3, NEWS, false)])]);
  env.write_store(&[(MAIL, MAIL)]);

  let report = env.json(&["sync", "--world", &env.world_arg()]);

  assert_eq!(total(&report, "removed"), 1);
  assert_eq!(env.pinned_urls(1), vec![MAIL]);
}

#[test]
fn sync_retargets_grouped_items() {
  let env = TestEnv::with_world(&[(1, &[(1, "https://mail.test/old", true)])]);
  env.write_config(
    r#"
[identity]
mode = "grouped"
grouped_hosts = ["mail.test"]
"#,
  );
  env.write_store(&[("origin:https://mail.test", "https://mail.test/inbox")]);

  let report = env.json(&["sync", "--world", &env.world_arg()]);

  assert_eq!(total(&report, "updated"), 1);
  assert_eq!(env.pinned_urls(1), vec!["https://mail.test/inbox"]);
}

#[test]
fn keep_existing_policy_leaves_content_alone() {
  let env = TestEnv::with_world(&[(1, &[(1, "https://mail.test/old", true)])]);
  env.write_config(
    r#"
policy = "keep-existing"

[identity]
mode = "grouped"
grouped_hosts = ["mail.test"]
"#,
  );
  env.write_store(&[("origin:https://mail.test", "https://mail.test/inbox")]);

  let report = env.json(&["sync", "--world", &env.world_arg()]);

  assert_eq!(total(&report, "updated"), 0);
  assert_eq!(env.pinned_urls(1), vec!["https://mail.test/old"]);
}

#[test]
fn union_policy_never_writes_store() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true)]), (2, &[(2, CHAT, true)])]);
  env.write_config("policy = \"union\"\n");

  env.json(&["sync", "--world", &env.world_arg()]);

  assert_eq!(sorted(env.pinned_urls(2)), vec![CHAT, MAIL]);
  assert!(!env.store_path().exists());
}

#[test]
fn sync_prints_summary() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true)]), (2, &[])]);

  env
    .cmd()
    .args(["sync", "--world", &env.world_arg()])
    .assert()
    .success()
    .stdout(predicate::str::contains("Seeded canonical mapping"))
    .stdout(predicate::str::contains("Sync complete: 1 created"));
}

#[test]
fn sync_fails_on_malformed_store() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true)])]);
  env.write_raw_store("{ not json");

  env
    .cmd()
    .args(["sync", "--world", &env.world_arg()])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Reconciliation pass failed"));
}

#[test]
fn sync_fails_without_world_file() {
  let env = TestEnv::new();

  env
    .cmd()
    .args(["sync", "--world", &env.world_arg()])
    .assert()
    .failure()
    .stderr(predicate::str::contains("World file not found"));
}
