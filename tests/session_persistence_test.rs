//! Integration tests for session persistence and share-string import
//!
//! Exercises the full path: edit a session, debounce, write through the
//! file store, and restore an identical configuration in a fresh session.

use estimar::session::{FileShareStore, LoadOutcome, MemoryShareStore, Session};
use estimar::share;
use estimar::{MoeSettings, ShardingStage};
use std::time::{Duration, Instant};

#[test]
fn file_backed_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("estimar-state.txt");

    let mut session = Session::new(FileShareStore::new(&path));
    assert!(matches!(session.load_persisted(), LoadOutcome::NothingStored));

    let now = Instant::now();
    session.apply_preset("mixtral-8x7b", now).unwrap();
    session.set_moe(Some(MoeSettings { experts: 8, top_k: 2 }), now);
    session.set_sharding_stage(ShardingStage::Stage2, now);
    session.set_precision("fp8-e4m3", now).unwrap();
    let expected = session.config().clone();

    // Debounce fires after the deadline
    assert!(session.has_pending_write());
    session.tick(now + Duration::from_millis(600)).unwrap();
    assert!(!session.has_pending_write());
    assert!(path.exists());

    let mut restored = Session::new(FileShareStore::new(&path));
    assert!(matches!(restored.load_persisted(), LoadOutcome::Restored));
    assert_eq!(restored.config(), &expected);
}

#[test]
fn corrupt_state_file_is_discarded_and_removed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("estimar-state.txt");
    std::fs::write(&path, "???not-a-share-string???").unwrap();

    let mut session = Session::new(FileShareStore::new(&path));
    assert!(matches!(session.load_persisted(), LoadOutcome::Discarded(_)));
    // Defaults intact, poisoned file gone
    assert_eq!(session.config().model.hidden_size, 4096);
    assert!(!path.exists());
}

#[test]
fn failed_import_leaves_configuration_untouched() {
    let mut session = Session::new(MemoryShareStore::default());
    session.load_persisted();
    let now = Instant::now();
    session.set_hidden_size(2048, now);
    let before = session.config().clone();

    assert!(session.import("!!garbage!!", now).is_err());
    assert_eq!(session.config(), &before);

    // An out-of-domain payload is rejected wholesale too
    let mut tampered = share::decode(&session.share_string().unwrap()).unwrap();
    tampered.model.hidden_size = 0;
    let bad = share::encode(&tampered).unwrap();
    assert!(session.import(&bad, now).is_err());
    assert_eq!(session.config(), &before);
}

#[test]
fn oversized_share_payload_is_rejected_wholesale() {
    let mut session = Session::new(MemoryShareStore::default());
    session.load_persisted();
    let now = Instant::now();
    let before = session.config().clone();

    let mut tampered = share::decode(&session.share_string().unwrap()).unwrap();
    tampered.model.hidden_size = 1 << 40;
    let payload = share::encode(&tampered).unwrap();
    assert!(session.import(&payload, now).is_err());
    assert_eq!(session.config(), &before);

    // A persisted oversized payload is discarded on startup, not applied
    let mut restored = Session::new(MemoryShareStore::with_payload(payload));
    assert!(matches!(restored.load_persisted(), LoadOutcome::Discarded(_)));
    restored.snapshot();
}

#[test]
fn share_string_transfers_between_sessions() {
    let mut source = Session::new(MemoryShareStore::default());
    source.load_persisted();
    let now = Instant::now();
    source.apply_preset("t5-large", now).unwrap();
    source.set_device_count(4, now);

    let link = source.share_string().unwrap();
    assert!(link.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

    let mut target = Session::new(MemoryShareStore::default());
    target.load_persisted();
    target.import(&link, now).unwrap();
    assert_eq!(target.config(), source.config());
}

#[test]
fn unknown_hardware_in_share_resolves_to_default() {
    let mut source = Session::new(MemoryShareStore::default());
    source.load_persisted();
    let now = Instant::now();

    let mut shared = share::decode(&source.share_string().unwrap()).unwrap();
    shared.hardware_id = "tpu-v9".to_string();
    let link = share::encode(&shared).unwrap();

    let mut target = Session::new(MemoryShareStore::default());
    target.load_persisted();
    target.import(&link, now).unwrap();
    assert_eq!(target.config().hardware_id, "h100-80-sxm");
}
