//! Change notification for account store observers.

use super::model::Account;

/// Handle returned by [`AccountStore::subscribe`](super::AccountStore::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&[Account])>;

/// Ordered list of observer callbacks.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback)>,
}

impl Subscribers {
    pub(crate) fn add(&mut self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn notify(&mut self, accounts: &[Account]) {
        for (_, callback) in &mut self.entries {
            callback(accounts);
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.entries.len())
            .finish()
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
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_notify_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut subscribers = Subscribers::default();

        let first = Rc::clone(&log);
        subscribers.add(Box::new(move |_: &[Account]| first.borrow_mut().push("first")));
        let second = Rc::clone(&log);
        subscribers.add(Box::new(move |_: &[Account]| second.borrow_mut().push("second")));

        subscribers.notify(&[]);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_remove() {
        let mut subscribers = Subscribers::default();
        let a = subscribers.add(Box::new(|_: &[Account]| {}));
        let b = subscribers.add(Box::new(|_: &[Account]| {}));
        assert_ne!(a, b);

        assert!(subscribers.remove(a));
        assert!(!subscribers.remove(a));
        assert_eq!(subscribers.entries.len(), 1);
        assert!(subscribers.remove(b));
    }
}
