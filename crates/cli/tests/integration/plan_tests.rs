//! Tests for `pinsync plan`.

use predicates::prelude::*;

use crate::common::TestEnv;

const MAIL: &str = "https://mail.test/";
const CHAT: &str = "https://chat.test/";

#[test]
fn plan_lists_creates_without_mutating() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true)]), (2, &[(2, CHAT, true)])]);
  let world = env.world();

  let plans = env.json(&["plan", "--world", &env.world_arg()]);

  let plans = plans.as_array().unwrap();
  assert_eq!(plans.len(), 2);
  let first = plans.iter().find(|p| p["collection"] == 1).unwrap();
  assert_eq!(first["plan"]["to_create"][0]["target"], CHAT);
  let second = plans.iter().find(|p| p["collection"] == 2).unwrap();
  assert_eq!(second["plan"]["to_create"][0]["target"], MAIL);

  assert_eq!(env.world(), world);
  assert!(!env.store_path().exists());
}

#[test]
fn plan_uses_stored_mapping() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true), (2, CHAT, true)])]);
  env.write_store(&[(MAIL, MAIL)]);

  let plans = env.json(&["plan", "--world", &env.world_arg()]);

  assert_eq!(plans[0]["plan"]["to_remove"][0], 2);
  assert_eq!(plans[0]["plan"]["to_create"].as_array().unwrap().len(), 0);
}

#[test]
fn plan_text_reports_actions() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true)]), (2, &[])]);

  env
    .cmd()
    .args(["plan", "--world", &env.world_arg()])
    .assert()
    .success()
    .stdout(predicate::str::contains("Collection 2:"))
    .stdout(predicate::str::contains(MAIL))
    .stdout(predicate::str::contains("Plan: 1 action"));
}

#[test]
fn plan_reports_converged_world() {
  let env = TestEnv::with_world(&[(1, &[(1, MAIL, true)]), (2, &[(2, MAIL, true)])]);

  env
    .cmd()
    .args(["plan", "--world", &env.world_arg()])
    .assert()
    .success()
    .stdout(predicate::str::contains("All collections are in sync"));
}
