//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the world file, the
/// canonical store and an optional config file. Default locations are
/// redirected into the same directory so nothing leaks into the real home.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Create an environment whose world holds the given collections.
  ///
  /// Each collection is `(id, [(instance, url, pinned)])`.
  pub fn with_world(collections: &[(u64, &[(u64, &str, bool)])]) -> Self {
    let env = Self::new();
    env.write_world(collections);
    env
  }

  fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap_or_else(|_| self.temp.path().to_path_buf())
  }

  pub fn world_path(&self) -> PathBuf {
    self.root().join("world.json")
  }

  /// World path as a command-line argument.
  pub fn world_arg(&self) -> String {
    self.world_path().display().to_string()
  }

  pub fn store_path(&self) -> PathBuf {
    self.root().join("canonical.json")
  }

  pub fn config_path(&self) -> PathBuf {
    self.root().join("config.toml")
  }

  pub fn write_world(&self, collections: &[(u64, &[(u64, &str, bool)])]) {
    let collections: Vec<Value> = collections
      .iter()
      .map(|(id, items)| {
        let items: Vec<Value> = items
          .iter()
          .map(|(instance, url, pinned)| json!({ "id": instance, "committed": url, "pinned": pinned }))
          .collect();
        json!({ "id": id, "items": items })
      })
      .collect();
    self.write_json(self.world_path(), &json!({ "collections": collections }));
  }

  pub fn write_config(&self, content: &str) {
    std::fs::write(self.config_path(), content).unwrap();
  }

  /// Write the canonical mapping directly, as an earlier run would have.
  pub fn write_store(&self, entries: &[(&str, &str)]) {
    let mapping: serde_json::Map<String, Value> = entries
      .iter()
      .map(|(key, target)| (key.to_string(), json!(target)))
      .collect();
    self.write_json(self.store_path(), &json!({ "canonical_pins": mapping }));
  }

  pub fn write_raw_store(&self, content: &str) {
    std::fs::write(self.store_path(), content).unwrap();
  }

  fn write_json(&self, path: PathBuf, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
  }

  pub fn world(&self) -> Value {
    read_json(self.world_path())
  }

  pub fn store(&self) -> Value {
    read_json(self.store_path())
  }

  /// Pinned URLs of a collection, in enumeration order.
  pub fn pinned_urls(&self, collection: u64) -> Vec<String> {
    let world = self.world();
    let collection = world["collections"]
      .as_array()
      .unwrap()
      .iter()
      .find(|c| c["id"] == collection)
      .unwrap_or_else(|| panic!("collection {} not in world", collection))
      .clone();
    collection["items"]
      .as_array()
      .unwrap()
      .iter()
      .filter(|item| item["pinned"] == true)
      .map(|item| item["committed"].as_str().unwrap().to_string())
      .collect()
  }

  /// A `pinsync` command with default locations isolated to this environment.
  ///
  /// The store is passed explicitly. The config is passed only if written.
  pub fn cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("pinsync");
    let root = self.root();
    cmd
      .env("XDG_CONFIG_HOME", root.join("config"))
      .env("XDG_DATA_HOME", root.join("data"))
      .env("APPDATA", root.join("config"))
      .env("LOCALAPPDATA", root.join("data"))
      .env_remove("RUST_LOG")
      .arg("--store")
      .arg(self.store_path());
    if self.config_path().exists() {
      cmd.arg("--config").arg(self.config_path());
    }
    cmd
  }

  /// Run a command with `--output json` and parse stdout.
  pub fn json(&self, args: &[&str]) -> Value {
    let output = self.cmd().args(args).args(["--output", "json"]).output().unwrap();
    assert!(
      output.status.success(),
      "pinsync {:?} failed: {}",
      args,
      String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
  }
}

fn read_json(path: PathBuf) -> Value {
  let content = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
  serde_json::from_str(&content).unwrap()
}
