//! # accountbook-core
//!
//! Account records for LDAP and local authentication, held in memory and
//! mirrored to a local key-value store after every change.
//!
//! This crate provides:
//! - The [`Account`] model and its persisted JSON shape
//! - [`AccountStore`] with `add_empty`, `remove` and `upsert`
//! - Pluggable [`storage`] backends (in-memory and file-per-key)
//! - Identifier generation with a secure default and a timestamp fallback
//!
//! ## Example
//!
//! ```
//! use accountbook_core::{AccountStore, AccountType, storage::MemoryBackend};
//!
//! let mut store = AccountStore::open(MemoryBackend::new());
//! let id = store.add_empty();
//!
//! let mut account = store.get(&id).cloned().unwrap();
//! account.kind = AccountType::Ldap;
//! account.login = "svc".to_string();
//! account.password = None;
//! store.upsert(account);
//!
//! assert_eq!(store.accounts()[0].kind, AccountType::Ldap);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
mod error;
pub mod storage;

pub use account::{
    Account, AccountId, AccountStore, AccountType, IdGenerator, LabelItem, LoadError,
    ParseAccountTypeError, STORAGE_KEY, SecureIdGenerator, SubscriptionId, TimestampIdGenerator,
    try_load,
};
pub use error::{Error, Result};
