//! Account store: the in-memory collection and its persisted copy.

use tracing::{debug, warn};

use super::id::{IdGenerator, SecureIdGenerator, TimestampIdGenerator};
use super::model::{Account, AccountId};
use super::subscription::{SubscriptionId, Subscribers};
use crate::Result;
use crate::storage::{KeyValueBackend, StorageError};

/// Key the serialized collection is stored under.
pub const STORAGE_KEY: &str = "accounts-v1";

/// Fresh ids drawn before giving up on the configured generator.
const MAX_ID_ATTEMPTS: usize = 8;

/// Why the persisted collection could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Nothing is stored under the key.
    #[error("No stored accounts")]
    Missing,

    /// Backend read failed.
    #[error("Storage error: {0}")]
    Backend(#[from] StorageError),

    /// Stored text is not a JSON array.
    #[error("Malformed account data: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Reads and parses the persisted collection.
///
/// # Errors
///
/// Returns [`LoadError::Missing`] when the key is absent or empty,
/// [`LoadError::Backend`] when the read fails, and [`LoadError::Malformed`]
/// when the text is not a JSON array.
///
/// Array elements that cannot be read as an account are skipped with a
/// warning; the rest load in order.
pub fn try_load<B: KeyValueBackend>(backend: &B) -> std::result::Result<Vec<Account>, LoadError> {
    let raw = backend.get(STORAGE_KEY)?.ok_or(LoadError::Missing)?;
    if raw.is_empty() {
        return Err(LoadError::Missing);
    }
    let records: Vec<serde_json::Value> = serde_json::from_str(&raw)?;

    let accounts = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(account) => Some(account),
            Err(e) => {
                warn!("Skipping unreadable stored account at index {index}: {e}");
                None
            }
        })
        .collect();
    Ok(accounts)
}

/// Ordered collection of accounts mirrored to a key-value backend.
///
/// Every mutation completes in memory, writes the whole collection back under
/// [`STORAGE_KEY`], and then notifies subscribers before returning. Writes are
/// best-effort: a failed write is logged and the in-memory change stands. Use
/// [`flush`](Self::flush) to observe write failures.
#[derive(Debug)]
pub struct AccountStore<B, G = SecureIdGenerator> {
    backend: B,
    ids: G,
    accounts: Vec<Account>,
    subscribers: Subscribers,
}

impl<B: KeyValueBackend> AccountStore<B> {
    /// Loads the store from `backend` using random UUIDs for new accounts.
    ///
    /// A missing or unreadable collection yields an empty store.
    pub fn open(backend: B) -> Self {
        Self::with_id_generator(backend, SecureIdGenerator)
    }
}

impl<B: KeyValueBackend, G: IdGenerator> AccountStore<B, G> {
    /// Loads the store from `backend`, drawing new ids from `ids`.
    pub fn with_id_generator(backend: B, ids: G) -> Self {
        let accounts = match try_load(&backend) {
            Ok(accounts) => {
                debug!("Loaded {} accounts", accounts.len());
                accounts
            }
            Err(LoadError::Missing) => {
                debug!("No stored accounts, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!("Discarding stored accounts: {e}");
                Vec::new()
            }
        };

        Self {
            backend,
            ids,
            accounts,
            subscribers: Subscribers::default(),
        }
    }

    /// Current accounts in order.
    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Looks up an account by ID.
    #[must_use]
    pub fn get(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| &a.id == id)
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the store holds no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Backend the store persists to.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Consumes the store, returning its backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Appends a blank local account and returns its ID.
    pub fn add_empty(&mut self) -> AccountId {
        let id = self.fresh_id();
        self.accounts.push(Account::empty(id.clone()));
        debug!("Added account {id}");
        self.commit();
        id
    }

    /// Removes the account with `id`. Unknown ids are ignored.
    pub fn remove(&mut self, id: &AccountId) {
        let before = self.accounts.len();
        self.accounts.retain(|a| &a.id != id);
        if self.accounts.len() == before {
            debug!("Remove of unknown account {id} ignored");
        } else {
            debug!("Removed account {id}");
        }
        self.commit();
    }

    /// Replaces the account with the same ID in place, or appends it.
    pub fn upsert(&mut self, account: Account) {
        if let Some(slot) = self.accounts.iter_mut().find(|a| a.id == account.id) {
            debug!("Updated account {}", account.id);
            *slot = account;
        } else {
            debug!("Inserted account {}", account.id);
            self.accounts.push(account);
        }
        self.commit();
    }

    /// Writes the current collection to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn flush(&self) -> Result<()> {
        let json = serde_json::to_string(&self.accounts)?;
        self.backend.set(STORAGE_KEY, &json)?;
        debug!("Persisted {} accounts", self.accounts.len());
        Ok(())
    }

    /// Registers `callback` to run with the collection after every mutation.
    pub fn subscribe(&mut self, callback: impl FnMut(&[Account]) + 'static) -> SubscriptionId {
        self.subscribers.add(Box::new(callback))
    }

    /// Drops a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    fn fresh_id(&self) -> AccountId {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.generate();
            if self.get(&id).is_none() {
                return id;
            }
            warn!("Generated id {id} already in use, retrying");
        }
        // The fallback is unique per process, so it cannot repeat an id it handed out.
        loop {
            let id = TimestampIdGenerator.generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn commit(&mut self) {
        if let Err(e) = self.flush() {
            warn!("Failed to persist accounts: {e}");
        }
        self.subscribers.notify(&self.accounts);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::account::model::{AccountType, LabelItem};
    use crate::storage::MemoryBackend;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Hands out `id-0`, `id-1`, ...
    #[derive(Default)]
    struct Sequential(Cell<u32>);

    impl IdGenerator for Sequential {
        fn generate(&self) -> AccountId {
            let n = self.0.get();
            self.0.set(n + 1);
            AccountId::new(format!("id-{n}"))
        }
    }

    /// Always returns the same id.
    struct Stuck;

    impl IdGenerator for Stuck {
        fn generate(&self) -> AccountId {
            AccountId::from("stuck")
        }
    }

    fn stored(backend: &MemoryBackend) -> Vec<Account> {
        serde_json::from_str(&backend.get(STORAGE_KEY).unwrap().unwrap()).unwrap()
    }

    fn ldap(id: &str, login: &str) -> Account {
        Account {
            id: AccountId::from(id),
            label: vec![LabelItem::new(login)],
            kind: AccountType::Ldap,
            login: login.to_string(),
            password: None,
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_missing() {
            let backend = MemoryBackend::new();
            assert!(matches!(try_load(&backend), Err(LoadError::Missing)));
        }

        #[test]
        fn test_empty_string_is_missing() {
            let backend = MemoryBackend::new().with_entry(STORAGE_KEY, "");
            assert!(matches!(try_load(&backend), Err(LoadError::Missing)));
        }

        #[test]
        fn test_malformed() {
            for raw in ["{not json", "{\"id\":\"x\"}", "42", "null", "[1, 2"] {
                let backend = MemoryBackend::new().with_entry(STORAGE_KEY, raw);
                assert!(
                    matches!(try_load(&backend), Err(LoadError::Malformed(_))),
                    "{raw:?} should be malformed"
                );
            }
        }

        #[test]
        fn test_unreadable_records_skipped() {
            let raw = r#"[{"id":1},{"id":"a","type":"LDAP"},"text",{"id":"b","type":"KERBEROS"}]"#;
            let backend = MemoryBackend::new().with_entry(STORAGE_KEY, raw);
            let accounts = try_load(&backend).unwrap();
            assert_eq!(accounts.len(), 1);
            assert_eq!(accounts[0].id, AccountId::from("a"));
            assert_eq!(accounts[0].kind, AccountType::Ldap);
        }

        #[test]
        fn test_well_formed() {
            let raw = r#"[{"id":"a","label":[],"type":"LOCAL","login":"root","password":"pw"}]"#;
            let backend = MemoryBackend::new().with_entry(STORAGE_KEY, raw);
            let accounts = try_load(&backend).unwrap();
            assert_eq!(accounts.len(), 1);
            assert_eq!(accounts[0].login, "root");
            assert_eq!(accounts[0].password.as_deref(), Some("pw"));
        }

        #[test]
        fn test_open_recovers_to_empty() {
            let backend = MemoryBackend::new().with_entry(STORAGE_KEY, "garbage");
            let store = AccountStore::open(backend);
            assert!(store.is_empty());
            // Nothing is written until the first mutation
            assert_eq!(
                store.backend().get(STORAGE_KEY).unwrap().as_deref(),
                Some("garbage")
            );
        }
    }

    #[test]
    fn test_add_empty() {
        let mut store = AccountStore::with_id_generator(MemoryBackend::new(), Sequential::default());
        let id = store.add_empty();

        assert_eq!(id, AccountId::from("id-0"));
        assert_eq!(store.accounts(), &[Account::empty(id)]);
        assert_eq!(stored(store.backend()), store.accounts());
    }

    #[test]
    fn test_add_empty_skips_taken_ids() {
        let mut store = AccountStore::with_id_generator(MemoryBackend::new(), Sequential::default());
        store.upsert(ldap("id-0", "taken"));

        let id = store.add_empty();
        assert_eq!(id, AccountId::from("id-1"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_add_empty_with_stuck_generator_falls_back() {
        let mut store = AccountStore::with_id_generator(MemoryBackend::new(), Stuck);
        let first = store.add_empty();
        let second = store.add_empty();

        assert_eq!(first, AccountId::from("stuck"));
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut store = AccountStore::with_id_generator(MemoryBackend::new(), Sequential::default());
        store.add_empty();
        let middle = store.add_empty();
        store.add_empty();

        store.upsert(ldap(middle.as_str(), "svc"));

        assert_eq!(store.len(), 3);
        assert_eq!(store.accounts()[1], ldap(middle.as_str(), "svc"));
        assert_eq!(stored(store.backend()), store.accounts());
    }

    #[test]
    fn test_upsert_appends_unknown() {
        let mut store = AccountStore::with_id_generator(MemoryBackend::new(), Sequential::default());
        store.add_empty();
        store.upsert(ldap("other", "svc"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.accounts()[1].id, AccountId::from("other"));
    }

    #[test]
    fn test_remove() {
        let mut store = AccountStore::with_id_generator(MemoryBackend::new(), Sequential::default());
        let a = store.add_empty();
        let b = store.add_empty();

        store.remove(&a);
        assert_eq!(store.len(), 1);
        assert_eq!(store.accounts()[0].id, b);
        assert!(store.get(&a).is_none());
        assert_eq!(stored(store.backend()), store.accounts());
    }

    #[test]
    fn test_remove_unknown_still_persists() {
        let mut store = AccountStore::open(MemoryBackend::new());
        store.remove(&AccountId::from("ghost"));

        assert!(store.is_empty());
        assert_eq!(
            store.backend().get(STORAGE_KEY).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut store = AccountStore::open(MemoryBackend::with_quota(4));
        let id = store.add_empty();

        assert_eq!(store.len(), 1);
        assert!(store.get(&id).is_some());
        assert_eq!(store.backend().get(STORAGE_KEY).unwrap(), None);
        assert!(matches!(
            store.flush(),
            Err(crate::Error::Storage(StorageError::QuotaExceeded { .. }))
        ));
    }

    #[test]
    fn test_subscribers_see_every_mutation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = AccountStore::with_id_generator(MemoryBackend::new(), Sequential::default());

        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |accounts| sink.borrow_mut().push(accounts.len()));

        let id = store.add_empty();
        store.add_empty();
        store.upsert(ldap(id.as_str(), "svc"));
        store.remove(&id);
        assert_eq!(*seen.borrow(), vec![1, 2, 2, 1]);

        assert!(store.unsubscribe(sub));
        store.add_empty();
        assert_eq!(seen.borrow().len(), 4);
    }

    #[test]
    fn test_subscribers_run_after_persist() {
        let backend = Rc::new(MemoryBackend::new());
        let mut store = AccountStore::open(Rc::clone(&backend));

        let probe = Rc::clone(&backend);
        let matched = Rc::new(Cell::new(false));
        let flag = Rc::clone(&matched);
        store.subscribe(move |accounts| {
            let persisted: Vec<Account> =
                serde_json::from_str(&probe.get(STORAGE_KEY).unwrap().unwrap()).unwrap();
            flag.set(persisted == accounts);
        });

        store.add_empty();
        assert!(matched.get());
    }
}
