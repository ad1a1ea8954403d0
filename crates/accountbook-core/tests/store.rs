//! Integration tests for the account store.
//!
//! Each test drives a store over a shared backend and checks the in-memory
//! collection against what a fresh load would see.

#![allow(clippy::unwrap_used, clippy::similar_names)]

use std::collections::HashSet;
use std::rc::Rc;

use accountbook_core::storage::{FileBackend, KeyValueBackend, MemoryBackend};
use accountbook_core::{
    Account, AccountId, AccountStore, AccountType, LabelItem, STORAGE_KEY, try_load,
};

fn persisted<B: KeyValueBackend>(backend: &B) -> Vec<Account> {
    try_load(backend).unwrap()
}

fn service_account(id: &AccountId) -> Account {
    Account {
        id: id.clone(),
        label: vec![LabelItem::new("Svc")],
        kind: AccountType::Ldap,
        login: "svc".to_string(),
        password: None,
    }
}

#[test]
fn example_scenario() {
    let backend = Rc::new(MemoryBackend::new());
    let mut store = AccountStore::open(Rc::clone(&backend));

    // 1. blank local account
    let x = store.add_empty();
    assert_eq!(store.len(), 1);
    let first = &store.accounts()[0];
    assert_eq!(first.id, x);
    assert_eq!(first.kind, AccountType::Local);
    assert_eq!(first.login, "");
    assert_eq!(first.password.as_deref(), Some(""));

    // 2. replace it in place
    store.upsert(service_account(&x));
    assert_eq!(store.len(), 1);
    assert_eq!(store.accounts()[0], service_account(&x));

    // 3. second account gets a distinct id
    let y = store.add_empty();
    assert_eq!(store.len(), 2);
    assert_ne!(x, y);

    // 4. remove the first
    store.remove(&x);
    assert_eq!(store.len(), 1);
    assert_eq!(store.accounts()[0].id, y);

    // 5. restart from the persisted blob
    let expected = store.accounts().to_vec();
    drop(store);
    let reloaded = AccountStore::open(backend);
    assert_eq!(reloaded.accounts(), expected.as_slice());
}

#[test]
fn persisted_blob_uses_wire_names() {
    let mut store = AccountStore::open(MemoryBackend::new());
    let id = store.add_empty();
    store.upsert(service_account(&id));

    let raw = store.backend().get(STORAGE_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        serde_json::json!([{
            "id": id.as_str(),
            "label": [{"text": "Svc"}],
            "type": "LDAP",
            "login": "svc",
            "password": null
        }])
    );
}

#[test]
fn ids_stay_unique_across_adds_and_upserts() {
    let mut store = AccountStore::open(MemoryBackend::new());
    for _ in 0..50 {
        let id = store.add_empty();
        store.upsert(service_account(&id));
    }
    store.upsert(service_account(&AccountId::from("external")));
    store.upsert(service_account(&AccountId::from("external")));

    let ids: HashSet<_> = store.accounts().iter().map(|a| a.id.clone()).collect();
    assert_eq!(ids.len(), store.len());
    assert_eq!(store.len(), 51);
}

#[test]
fn upsert_twice_is_idempotent() {
    let mut store = AccountStore::open(MemoryBackend::new());
    store.add_empty();
    let account = service_account(&AccountId::from("fixed"));

    store.upsert(account.clone());
    let after_first = store.accounts().to_vec();
    store.upsert(account);

    assert_eq!(store.accounts(), after_first.as_slice());
    assert_eq!(persisted(store.backend()), after_first);
}

#[test]
fn update_keeps_position() {
    let mut store = AccountStore::open(MemoryBackend::new());
    let ids: Vec<_> = (0..5).map(|_| store.add_empty()).collect();

    let mut updated = store.get(&ids[2]).cloned().unwrap();
    updated.login = "changed".to_string();
    store.upsert(updated.clone());

    assert_eq!(store.accounts()[2], updated);
    let order: Vec<_> = store.accounts().iter().map(|a| a.id.clone()).collect();
    assert_eq!(order, ids);
}

#[test]
fn remove_unknown_is_noop() {
    let mut store = AccountStore::open(MemoryBackend::new());
    store.add_empty();
    store.add_empty();
    let before = store.accounts().to_vec();

    store.remove(&AccountId::from("missing"));

    assert_eq!(store.accounts(), before.as_slice());
    assert_eq!(persisted(store.backend()), before);
}

#[test]
fn cold_start_recovers_to_empty() {
    let cases = [
        None,
        Some(""),
        Some("not json at all"),
        Some("{\"accounts\": []}"),
        Some("\"a string\""),
        Some("null"),
    ];

    for raw in cases {
        let backend = match raw {
            Some(raw) => MemoryBackend::new().with_entry(STORAGE_KEY, raw),
            None => MemoryBackend::new(),
        };
        let store = AccountStore::open(backend);
        assert!(store.is_empty(), "{raw:?} should load as empty");
    }
}

#[test]
fn odd_records_do_not_take_good_ones_down() {
    let raw = r#"[
        {"id":"keep","label":[{"text":"Svc"}],"type":"LDAP","login":"svc","password":null},
        {"id":"legacy","type":"LOCAL","login":"x","password":""},
        {"id":"x","type":"KERBEROS"}
    ]"#;
    let backend = Rc::new(MemoryBackend::new().with_entry(STORAGE_KEY, raw));
    let mut store = AccountStore::open(Rc::clone(&backend));

    let ids: Vec<_> = store.accounts().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["keep", "legacy"]);
    assert_eq!(store.accounts()[0], service_account(&AccountId::from("keep")));
    assert!(store.accounts()[1].label.is_empty());

    let added = store.add_empty();
    let stored = persisted(&backend);
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0].id, AccountId::from("keep"));
    assert_eq!(stored[1].id, AccountId::from("legacy"));
    assert_eq!(stored[2].id, added);
}

#[test]
fn file_backend_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let mut store = AccountStore::open(FileBackend::new(dir.path()));
    let keep = store.add_empty();
    let drop_me = store.add_empty();
    store.upsert(service_account(&keep));
    store.remove(&drop_me);
    let expected = store.accounts().to_vec();
    drop(store);

    assert!(dir.path().join(format!("{STORAGE_KEY}.json")).exists());
    let reloaded = AccountStore::open(FileBackend::new(dir.path()));
    assert_eq!(reloaded.accounts(), expected.as_slice());
}

#[test]
fn write_failure_is_best_effort() {
    let mut store = AccountStore::open(MemoryBackend::with_quota(64));
    let id = store.add_empty();

    // A single blank account already overflows the quota.
    assert_eq!(store.get(&id).map(|a| a.login.as_str()), Some(""));
    assert!(store.flush().is_err());

    let backend = store.into_backend();
    assert!(AccountStore::open(backend).is_empty());
}
