//! Tests for `pinsync watch`.
//!
//! Events are fed on stdin; a `force` line waits for a pass and prints its
//! report, and end of input stops the engine.

use predicates::prelude::*;
use serde_json::Value;

use crate::common::TestEnv;

const MAIL: &str = "https://mail.test/";
const CHAT: &str = "https://chat.test/";

fn reports(stdout: &[u8]) -> Vec<Value> {
  serde_json::Deserializer::from_slice(stdout)
    .into_iter::<Value>()
    .map(|v| v.unwrap())
    .collect()
}

#[test]
fn startup_then_force_converges_world() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true)]), (2, &[(2, CHAT, true)])]);

  let output = env
    .cmd()
    .args(["watch", "--world", &env.world_arg(), "--output", "json"])
    .write_stdin("{\"event\": \"startup\"}\nforce\n")
    .output()
    .unwrap();

  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
  let reports = reports(&output.stdout);
  assert_eq!(reports.len(), 1);
  assert!(reports[0]["collections"].is_array());

  let mut first = env.pinned_urls(1);
  first.sort();
  assert_eq!(first, vec![CHAT, MAIL]);
  assert_eq!(env.store()["canonical_pins"][CHAT], CHAT);
}

#[test]
fn pin_event_is_recorded_and_propagated() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true), (2, CHAT, true)]), (2, &[(3, MAIL, true)])]);
  env.write_store(&[(MAIL, MAIL)]);

  env
    .cmd()
    .args(["watch", "--world", &env.world_arg(), "--suppression-window", "0s"])
    .write_stdin("{\"event\": \"pin-changed\", \"instance\": 2, \"pinned\": true}\nforce\n")
    .assert()
    .success()
    .stdout(predicate::str::contains("Sync complete: 1 created"));

  assert_eq!(env.store()["canonical_pins"][CHAT], CHAT);
  assert_eq!(env.pinned_urls(2), vec![MAIL, CHAT]);
}

#[test]
fn malformed_event_is_skipped() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true)])]);

  env
    .cmd()
    .args(["watch", "--world", &env.world_arg()])
    .write_stdin("not an event\n\nforce\n")
    .assert()
    .success()
    .stderr(predicate::str::contains("Ignoring malformed event"))
    .stdout(predicate::str::contains("Sync complete"));
}

#[test]
fn watch_requires_world_file() {
  let env = TestEnv::new();

  env
    .cmd()
    .args(["watch", "--world", &env.world_arg()])
    .write_stdin("")
    .assert()
    .failure()
    .stderr(predicate::str::contains("World file not found"));
}

#[test]
fn unpin_before_end_of_input_is_applied() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true), (2, CHAT, false)]), (2, &[(3, MAIL, true), (4, CHAT, true)])]);
  env.write_store(&[(MAIL, MAIL), (CHAT, CHAT)]);

  env
    .cmd()
    .args(["watch", "--world", &env.world_arg()])
    .write_stdin("{\"event\": \"pin-changed\", \"instance\": 2, \"pinned\": false}\n")
    .assert()
    .success();

  assert!(env.store()["canonical_pins"].get(CHAT).is_none());
  assert_eq!(env.pinned_urls(2), vec![MAIL]);
}

#[test]
fn scheduled_pass_runs_before_exit() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true), (2, CHAT, true)]), (2, &[(3, MAIL, true)])]);
  env.write_store(&[(MAIL, MAIL)]);

  env
    .cmd()
    .args(["watch", "--world", &env.world_arg()])
    .write_stdin("{\"event\": \"pin-changed\", \"instance\": 2, \"pinned\": true}\n")
    .assert()
    .success();

  assert_eq!(env.store()["canonical_pins"][CHAT], CHAT);
  assert_eq!(env.pinned_urls(2), vec![MAIL, CHAT]);
}
