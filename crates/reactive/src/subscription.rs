//! Callbacks registered for the changes of one table or list.

use alloc::boxed::Box;
use alloc::vec::Vec;
use tether_incremental::CollectionChangeSet;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback type for change notifications.
pub type ChangeCallback = Box<dyn Fn(&CollectionChangeSet)>;

/// The subscriptions of one collection, notified in subscription order.
pub struct SubscriptionManager {
    subscriptions: Vec<(SubscriptionId, ChangeCallback)>,
    next_id: SubscriptionId,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_id: 1,
        }
    }

    /// Registers `callback`; returns the id to unsubscribe with.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&CollectionChangeSet) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.push((id, Box::new(callback)));
        id
    }

    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|(sub, _)| *sub != id);
        self.subscriptions.len() != before
    }

    /// Delivers `changes` to every subscription.
    pub fn notify_all(&self, changes: &CollectionChangeSet) {
        for (_, callback) in &self.subscriptions {
            callback(changes);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut manager = SubscriptionManager::new();
        let id1 = manager.subscribe(|_| {});
        let id2 = manager.subscribe(|_| {});
        assert_eq!((id1, id2), (1, 2));
        assert_eq!(manager.len(), 2);

        assert!(manager.unsubscribe(id1));
        assert!(!manager.unsubscribe(id1));
        assert_eq!(manager.len(), 1);

        manager.clear();
        assert!(manager.is_empty());
    }

    #[test]
    fn test_notify_in_subscription_order() {
        let mut manager = SubscriptionManager::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..3 {
            let seen = seen.clone();
            manager.subscribe(move |changes| {
                seen.borrow_mut().push((tag, changes.modifications.count()));
            });
        }

        let mut changes = CollectionChangeSet::default();
        changes.modifications.add(4);
        manager.notify_all(&changes);
        assert_eq!(*seen.borrow(), vec![(0, 1), (1, 1), (2, 1)]);
    }
}
