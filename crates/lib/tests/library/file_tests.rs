use std::fs;
use std::path::PathBuf;

use pinsync_lib::canonical::{CanonicalStore, JsonFileKv, PinPolicy, STORAGE_KEY};
use pinsync_lib::config::SyncConfig;
use pinsync_lib::host::{CollectionId, FileHost, InstanceId, ItemDescriptor, World};
use pinsync_lib::sync::{PassContext, preview_pass, run_pass};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::Mutex;

struct Fixture {
  _temp: TempDir,
  host: FileHost,
  store_path: PathBuf,
}

impl Fixture {
  fn new(world: World) -> Self {
    let temp = TempDir::new().unwrap();
    let world_path = temp.path().join("world.json");
    world.save(&world_path).unwrap();
    let store_path = temp.path().join("data").join("canonical.json");
    Self {
      host: FileHost::new(world_path),
      store_path,
      _temp: temp,
    }
  }

  fn store(&self) -> Mutex<CanonicalStore<JsonFileKv>> {
    Mutex::new(CanonicalStore::new(JsonFileKv::new(self.store_path.clone())))
  }

  fn world(&self) -> World {
    World::load(self.host.path()).unwrap()
  }

  fn store_json(&self) -> Value {
    serde_json::from_str(&fs::read_to_string(&self.store_path).unwrap()).unwrap()
  }
}

fn windows() -> World {
  World::new()
    .with_collection(
      1,
      vec![
        ItemDescriptor::pinned_at(1, "https://mail.test/inbox#unread"),
        ItemDescriptor::unpinned_at(2, "https://news.test/"),
      ],
    )
    .with_collection(2, vec![ItemDescriptor::pinned_at(3, "https://chat.test/")])
}

#[tokio::test]
async fn pass_against_files_converges_and_persists() {
  let fixture = Fixture::new(windows());
  let store = fixture.store();
  let ctx = PassContext::from_config(&SyncConfig::default());

  let report = run_pass(&fixture.host, &store, &ctx).await.unwrap();
  assert!(report.seeded);
  assert_eq!(report.created(), 2);

  assert_eq!(
    fixture.store_json()[STORAGE_KEY],
    json!({
      "https://chat.test/": "https://chat.test/",
      "https://mail.test/inbox": "https://mail.test/inbox",
    })
  );

  let world = fixture.world();
  assert_eq!(
    world.pinned_targets(CollectionId(1)),
    vec![
      "https://mail.test/inbox#unread".to_string(),
      "https://chat.test/".to_string()
    ]
  );
  assert_eq!(
    world.pinned_targets(CollectionId(2)),
    vec!["https://chat.test/".to_string(), "https://mail.test/inbox".to_string()]
  );

  let again = run_pass(&fixture.host, &store, &ctx).await.unwrap();
  assert!(again.collections.iter().all(|c| !c.changed()));
}

#[tokio::test]
async fn legacy_store_file_is_migrated_by_first_pass() {
  let fixture = Fixture::new(windows());
  fs::create_dir_all(fixture.store_path.parent().unwrap()).unwrap();
  fs::write(
    &fixture.store_path,
    r#"{"pinned_tabs": {"https://chat.test/": "https://chat.test/"}}"#,
  )
  .unwrap();

  let store = fixture.store();
  let mut config = SyncConfig::default();
  config.policy = PinPolicy::KeepExisting;
  let report = run_pass(&fixture.host, &store, &PassContext::from_config(&config))
    .await
    .unwrap();

  assert!(!report.seeded);
  let json = fixture.store_json();
  assert_eq!(json[STORAGE_KEY], json!({"https://chat.test/": "https://chat.test/"}));
  assert!(json.get("pinned_tabs").is_some());

  // mail.test is not canonical, so it is purged.
  let world = fixture.world();
  assert_eq!(
    world.pinned_targets(CollectionId(1)),
    vec!["https://chat.test/".to_string()]
  );
  assert!(world.find(InstanceId(2)).is_some());
}

#[tokio::test]
async fn preview_leaves_files_untouched() {
  let fixture = Fixture::new(windows());
  let before = fs::read_to_string(fixture.host.path()).unwrap();
  let store = fixture.store();

  let plans = preview_pass(&fixture.host, &store, &PassContext::from_config(&SyncConfig::default()))
    .await
    .unwrap();

  assert_eq!(plans.iter().map(|p| p.plan.action_count()).sum::<usize>(), 2);
  assert_eq!(fs::read_to_string(fixture.host.path()).unwrap(), before);
  assert!(!fixture.store_path.exists());
}
