//! Reactive entity collections.

use std::cmp::Ordering;
use std::sync::Arc;

use lunch_shared::{Identified, Timed};
use tokio::sync::watch;

type Order<T> = fn(&T, &T) -> Ordering;

/// A reactive collection holding at most one entity per identity key.
///
/// Cloning yields another handle to the same collection. Subscribers are
/// notified after every merge.
pub struct Store<T> {
    tx: Arc<watch::Sender<Vec<T>>>,
    order: Option<Order<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            order: self.order,
        }
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Store<T> {
    /// A store that keeps entities in arrival order.
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::channel(Vec::new()).0),
            order: None,
        }
    }

    /// A store re-sorted (stably) after every merged entity.
    pub fn sorted_by(order: Order<T>) -> Self {
        Self {
            order: Some(order),
            ..Self::new()
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Timed> Store<T> {
    /// Newest first, the order of the rolls and boosts stores.
    pub fn newest_first() -> Self {
        Self::sorted_by(|a, b| b.time().cmp(&a.time()))
    }
}

impl<T: Clone> Store<T> {
    /// Current contents.
    pub fn snapshot(&self) -> Vec<T> {
        self.tx.borrow().clone()
    }
}

impl<T: Identified> Store<T> {
    /// Upsert each entity: drop members with the same key, then append.
    pub fn merge(&self, incoming: Vec<T>) {
        if incoming.is_empty() {
            return;
        }
        let order = self.order;
        self.tx.send_modify(|items| {
            for entity in incoming {
                let key = entity.key();
                items.retain(|existing| existing.key() != key);
                items.push(entity);
                if let Some(order) = order {
                    items.sort_by(order);
                }
            }
        });
    }
}
