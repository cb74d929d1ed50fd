use pocketnote_core::{
    load_collection, save_collection, BlobStorage, ManualClock, MemoryBlobStorage, Note,
    NoteStore,
};
use std::collections::HashSet;

const KEY: &str = "online_notebook_notes_v1";

fn store_at(now_ms: i64) -> (NoteStore<MemoryBlobStorage, ManualClock>, ManualClock) {
    let clock = ManualClock::new(now_ms);
    let store = NoteStore::open_default(MemoryBlobStorage::new(), clock.clone());
    (store, clock)
}

fn seeded_store(raw: &str) -> NoteStore<MemoryBlobStorage, ManualClock> {
    let storage = MemoryBlobStorage::new().with_slot(KEY, raw);
    NoteStore::open_default(storage, ManualClock::new(10_000))
}

fn assert_invariants(notes: &[Note]) {
    let ids: HashSet<_> = notes.iter().map(|note| note.id.as_str()).collect();
    assert_eq!(ids.len(), notes.len(), "ids must be unique");
    for note in notes {
        assert!(note.updated_at >= note.created_at, "note {} is stale", note.id);
    }
}

#[test]
fn create_on_empty_store_adds_one_blank_note() {
    let (mut store, _clock) = store_at(1_000);
    assert!(store.is_empty());

    let created = store.create().unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(created.title, "");
    assert_eq!(created.body, "");
    assert_eq!(created.created_at, 1_000);
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(store.get(&created.id), Some(&created));
}

#[test]
fn every_mutation_is_persisted() {
    let (mut store, clock) = store_at(1_000);
    let id = store.create().unwrap().id;
    clock.advance(50);
    store.update(&id, "Title", "Body").unwrap();

    let reopened = NoteStore::open_default(store.storage().clone(), clock.clone());
    let note = reopened.get(&id).unwrap();
    assert_eq!(note.title, "Title");
    assert_eq!(note.body, "Body");
    assert_eq!(note.updated_at, 1_050);
    assert_eq!(note.created_at, 1_000);

    store.delete(&id).unwrap();
    let reopened = NoteStore::open_default(store.storage().clone(), clock);
    assert!(reopened.is_empty());
}

#[test]
fn list_sorts_newest_first() {
    let store = seeded_store(
        r#"[{"id":"a","title":"","body":"","createdAt":100,"updatedAt":100},
            {"id":"b","title":"","body":"","createdAt":200,"updatedAt":200}]"#,
    );
    let ids: Vec<_> = store.list("").into_iter().map(|note| note.id).collect();
    assert_eq!(ids, vec!["b", "a"]);
    let stored: Vec<_> = store.notes().iter().map(|note| note.id.as_str()).collect();
    assert_eq!(stored, vec!["a", "b"], "listing must not reorder storage");
}

#[test]
fn list_filter_is_case_insensitive_over_title_and_body() {
    let store = seeded_store(
        r#"[{"id":"a","title":"Shopping","body":"eggs","createdAt":1,"updatedAt":1},
            {"id":"b","title":"Ideas","body":"Buy EGGPLANT","createdAt":2,"updatedAt":2},
            {"id":"c","title":"Misc","body":"none","createdAt":3,"updatedAt":3}]"#,
    );
    let ids: Vec<_> = store.list("  EGG ").into_iter().map(|note| note.id).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert!(store.list("shop").iter().all(|note| note.id == "a"));
    assert!(store.list("zzz").is_empty());
}

#[test]
fn delete_missing_id_is_silent_no_op() {
    let (mut store, _clock) = store_at(5);
    store.create().unwrap();
    let before = store.notes().to_vec();
    assert!(store.delete("missing-id").unwrap().is_none());
    assert_eq!(store.notes(), before.as_slice());
}

#[test]
fn save_then_load_round_trips_collection() {
    let notes = vec![
        Note {
            id: "x".to_string(),
            title: "Ünïcode ✓".to_string(),
            body: "line1\nline2 \"quoted\"".to_string(),
            created_at: 1,
            updated_at: 9,
        },
        Note::with_id("y", 4),
    ];
    let mut storage = MemoryBlobStorage::new();
    save_collection(&mut storage, KEY, &notes).unwrap();
    let loaded = load_collection(&storage, KEY, &ManualClock::new(0));

    let expected: HashSet<_> = notes.iter().map(|note| format!("{note:?}")).collect();
    let actual: HashSet<_> = loaded.iter().map(|note| format!("{note:?}")).collect();
    assert_eq!(actual, expected);
}

#[test]
fn absent_or_garbage_slot_starts_empty() {
    let (store, _clock) = store_at(0);
    assert!(store.is_empty());

    let store = seeded_store("<<definitely not json>>");
    assert!(store.is_empty());

    let store = seeded_store(r#"[1, 2, 3]"#);
    assert!(store.is_empty());
}

#[test]
fn update_bumps_updated_at_but_not_created_at() {
    let (mut store, clock) = store_at(100);
    let id = store.create().unwrap().id;
    clock.advance(25);
    let updated = store.update(&id, "t", "b").unwrap().unwrap();
    assert_eq!(updated.created_at, 100);
    assert_eq!(updated.updated_at, 125);

    clock.set(50);
    let updated = store.update(&id, "t", "b2").unwrap().unwrap();
    assert_eq!(updated.updated_at, 100, "backwards clock clamps to created_at");
}

#[test]
fn random_operation_sequences_keep_invariants() {
    let (mut store, clock) = store_at(1);
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    for step in 0..400 {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        clock.advance(((seed >> 33) % 7) as i64);
        let ids: Vec<_> = store.notes().iter().map(|note| note.id.clone()).collect();
        match (seed >> 40) % 3 {
            0 => {
                store.create().unwrap();
            }
            1 if !ids.is_empty() => {
                let id = &ids[(seed as usize) % ids.len()];
                store.update(id, format!("t{step}"), "b").unwrap();
            }
            _ if !ids.is_empty() => {
                let id = &ids[(seed as usize) % ids.len()];
                store.delete(id).unwrap();
            }
            _ => {}
        }
        assert_invariants(store.notes());
    }
}

#[test]
fn export_is_pretty_printed_and_reimportable() {
    let store = seeded_store(r#"[{"id":"a","title":"T","body":"B","createdAt":1,"updatedAt":2}]"#);
    let exported = store.export_all().unwrap();
    assert!(exported.contains("\n  {\n    \"id\": \"a\""));

    let (mut other, _clock) = store_at(0);
    assert_eq!(other.import_merge(&exported).unwrap(), 1);
    assert_eq!(other.get("a").unwrap().title, "T");
}

#[test]
fn summaries_follow_list_order() {
    let store = seeded_store(
        r#"[{"id":"a","title":"","body":"first\nsecond","createdAt":1,"updatedAt":1},
            {"id":"b","title":"Plan","body":"","createdAt":2,"updatedAt":2}]"#,
    );
    let summaries = store.list_summaries("");
    assert_eq!(summaries[0].id, "b");
    assert_eq!(summaries[0].display_title, "Plan");
    assert_eq!(summaries[1].display_title, "Untitled");
    assert_eq!(summaries[1].preview, "first second");
    assert_eq!(store.newest().unwrap().id, "b");
}

#[test]
fn quota_failure_surfaces_storage_unavailable() {
    let clock = ManualClock::new(1);
    let mut store = NoteStore::open_default(MemoryBlobStorage::new().with_quota(150), clock);
    store.create().unwrap();
    let err = store.create().unwrap_err();
    assert!(err.to_string().starts_with("storage unavailable"));
    assert_eq!(store.len(), 2, "in-memory state is retained");
    let persisted = store.storage().read(KEY).unwrap().unwrap();
    assert_eq!(persisted.matches("\"id\"").count(), 1);
}

#[test]
fn float_timestamps_in_slot_do_not_wipe_collection() {
    let mut store = seeded_store(
        r#"[{"id":"a","title":"keep me","body":"","createdAt":1700000000000.0,"updatedAt":1700000000000.0},
            {"id":"b","title":"also","body":"","createdAt":1,"updatedAt":1}]"#,
    );
    assert_eq!(store.len(), 2);
    assert_eq!(store.get("a").unwrap().created_at, 1_700_000_000_000);

    store.create().unwrap();
    let raw = store.storage().read(KEY).unwrap().unwrap();
    assert!(raw.contains("keep me"));
    assert!(raw.contains("also"));
    assert_eq!(store.len(), 3);
}

#[test]
fn odd_field_types_in_slot_are_repaired_not_dropped() {
    let store = seeded_store(r#"[{"id":12,"title":false,"body":"text","createdAt":"x"}, null]"#);
    assert_eq!(store.len(), 1);
    let note = store.get("12").unwrap();
    assert_eq!(note.title, "");
    assert_eq!(note.body, "text");
    assert_eq!(note.created_at, 10_000);
    assert_eq!(note.updated_at, note.created_at);
}
