//! Account management module.
//!
//! Provides the account model, identifier generation, and the store that
//! keeps the collection in sync with a persistence backend.

mod id;
mod model;
mod store;
mod subscription;

pub use id::{IdGenerator, SecureIdGenerator, TimestampIdGenerator};
pub use model::{Account, AccountId, AccountType, LabelItem, ParseAccountTypeError};
pub use store::{AccountStore, LoadError, STORAGE_KEY, try_load};
pub use subscription::SubscriptionId;
