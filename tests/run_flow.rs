// Full-run orchestration over scripted clients: volume resolution, tagging,
// release policy, retention batch continuation.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};

use mongosnap::{
    execute, BackupConfig, BackupRecord, DbClient, DbConnector, DbTarget, Error, InstanceMetadata,
    SnapshotStore, Volume,
};

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn rec(id: &str, created_at: DateTime<Utc>) -> BackupRecord {
    BackupRecord {
        id: id.to_string(),
        created_at,
        env: "prod".to_string(),
        label: "mongosnap".to_string(),
    }
}

// ---------- scripted database ----------

struct DbState {
    unlocks_needed: usize,
    fsync_calls: AtomicUsize,
    unlock_calls: AtomicUsize,
}

struct ScriptedDb {
    state: Arc<DbState>,
}

impl DbClient for ScriptedDb {
    fn is_primary(&self) -> Result<bool> {
        Ok(false)
    }
    fn fsync_and_lock(&self) -> Result<()> {
        self.state.fsync_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn unlock(&self) -> Result<()> {
        self.state.unlock_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn is_locked(&self) -> Result<bool> {
        Ok(self.state.unlock_calls.load(Ordering::SeqCst) < self.state.unlocks_needed)
    }
}

struct ScriptedConnector {
    target: DbTarget,
    state: Arc<DbState>,
}

impl ScriptedConnector {
    fn new(unlocks_needed: usize) -> Self {
        Self {
            target: DbTarget {
                host: "localhost".to_string(),
                port: 27017,
            },
            state: Arc::new(DbState {
                unlocks_needed,
                fsync_calls: AtomicUsize::new(0),
                unlock_calls: AtomicUsize::new(0),
            }),
        }
    }
}

impl DbConnector for ScriptedConnector {
    fn target(&self) -> &DbTarget {
        &self.target
    }
    fn connect(&self) -> Result<Box<dyn DbClient>> {
        Ok(Box::new(ScriptedDb {
            state: self.state.clone(),
        }))
    }
}

// ---------- scripted block-storage service ----------

struct MockStore {
    now: DateTime<Utc>,
    volumes: Vec<Volume>,
    backups: Mutex<Vec<BackupRecord>>,
    fail_delete: HashSet<String>,
    tags: Mutex<Vec<(String, String, String)>>,
    deleted: Mutex<Vec<String>>,
}

impl MockStore {
    fn new(now: DateTime<Utc>, volumes: Vec<Volume>, backups: Vec<BackupRecord>) -> Self {
        Self {
            now,
            volumes,
            backups: Mutex::new(backups),
            fail_delete: HashSet::new(),
            tags: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }
}

impl SnapshotStore for MockStore {
    fn list_volumes(&self, _instance_id: &str) -> Result<Vec<Volume>> {
        Ok(self.volumes.clone())
    }

    fn create_snapshot(&self, _volume_id: &str, description: &str) -> Result<String> {
        // the service stamps its own timestamp a few seconds after "now"
        let record = BackupRecord {
            id: "snap-new".to_string(),
            created_at: self.now + Duration::seconds(3),
            env: "prod".to_string(),
            label: description.to_string(),
        };
        self.backups.lock().unwrap().push(record);
        Ok("snap-new".to_string())
    }

    fn tag(&self, snapshot_id: &str, key: &str, value: &str) -> Result<()> {
        self.tags.lock().unwrap().push((
            snapshot_id.to_string(),
            key.to_string(),
            value.to_string(),
        ));
        Ok(())
    }

    fn list_snapshots(&self, _env: &str) -> Result<Vec<BackupRecord>> {
        Ok(self.backups.lock().unwrap().clone())
    }

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<()> {
        if self.fail_delete.contains(snapshot_id) {
            return Err(anyhow!("access denied for {snapshot_id}"));
        }
        self.deleted.lock().unwrap().push(snapshot_id.to_string());
        Ok(())
    }
}

struct MockMeta;

impl InstanceMetadata for MockMeta {
    fn current_instance_id(&self) -> Result<String> {
        Ok("i-0abc123".to_string())
    }
}

fn volume(id: &str, device: &str) -> Volume {
    Volume {
        id: id.to_string(),
        device: device.to_string(),
    }
}

// ---------- tests ----------

#[test]
fn volume_not_found_aborts_before_touching_the_database() {
    let now = at(2024, 3, 15, 10, 0, 0);
    let cfg = BackupConfig::default();
    let connector = ScriptedConnector::new(1);
    let store = MockStore::new(now, vec![volume("vol-1", "/dev/xvdz")], Vec::new());

    let err = execute(&cfg, &connector, &store, &MockMeta, now)
        .err()
        .expect("run must fail");
    assert!(
        matches!(err.downcast_ref::<Error>(), Some(Error::VolumeNotFound { .. })),
        "unexpected error: {err:#}"
    );
    assert_eq!(connector.state.fsync_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn full_run_creates_tags_releases_and_prunes() {
    let now = at(2024, 3, 15, 10, 0, 0);
    let cfg = BackupConfig::default();
    let connector = ScriptedConnector::new(1);
    let mut store = MockStore::new(
        now,
        vec![volume("vol-1", "/dev/sdf")],
        vec![
            rec("snap-hourly", now - Duration::hours(1)),
            rec("snap-ancient", now - Duration::days(400)),
            rec("snap-stubborn", now - Duration::days(300)),
        ],
    );
    store.fail_delete.insert("snap-stubborn".to_string());

    let report = execute(&cfg, &connector, &store, &MockMeta, now).expect("run must succeed");

    assert_eq!(report.snapshot_id, "snap-new");
    assert_eq!(report.examined, 4);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.failed, 1);
    // the hour-aligned backup and the just-created one survive
    assert_eq!(report.kept, 2);
    assert!(!report.still_locked);

    // snapshot frozen around the request: locked once, unlocked once
    assert_eq!(connector.state.fsync_calls.load(Ordering::SeqCst), 1);
    assert_eq!(connector.state.unlock_calls.load(Ordering::SeqCst), 1);

    // env tag attached to the new snapshot
    let tags = store.tags.lock().unwrap();
    assert_eq!(
        tags.as_slice(),
        &[("snap-new".to_string(), "env".to_string(), "prod".to_string())]
    );

    // the stubborn deletion failed but did not stop the batch
    let deleted = store.deleted.lock().unwrap();
    assert_eq!(deleted.as_slice(), &["snap-ancient".to_string()]);
}

#[test]
fn still_locked_is_logged_but_does_not_abort_the_run() {
    let now = at(2024, 3, 15, 10, 0, 0);
    let cfg = BackupConfig::default();
    let connector = ScriptedConnector::new(usize::MAX);
    let store = MockStore::new(
        now,
        vec![volume("vol-1", "/dev/sdf")],
        vec![rec("snap-ancient", now - Duration::days(400))],
    );

    let report = execute(&cfg, &connector, &store, &MockMeta, now).expect("run must succeed");
    assert!(report.still_locked);
    assert_eq!(report.snapshot_id, "snap-new");
    // retention still ran to completion
    assert_eq!(report.deleted, 1);
}
