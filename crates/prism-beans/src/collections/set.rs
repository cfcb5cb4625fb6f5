#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashSet;

use super::{CollectionListener, Contains, ObservableCollection};
use crate::observable::{CallbackList, InvalidationListener, Observable, ObservableId, Subscription};

/// A single element entering or leaving a set.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SetChange<T> {
    Added(T),
    Removed(T),
}

struct SetInner<T> {
    id: ObservableId,
    items: RefCell<AHashSet<T>>,
    invalidation: CallbackList<dyn Fn(&dyn Observable)>,
    changes: CallbackList<dyn Fn(&SetChange<T>)>,
}

/// Unordered observable set. Iteration order is unspecified.
pub struct ObservableSet<T> {
    inner: Rc<SetInner<T>>,
}

impl<T> Clone for ObservableSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for ObservableSet<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableSet")
            .field("id", &self.inner.id)
            .field("items", &self.inner.items.borrow())
            .finish()
    }
}

impl<T: Eq + Hash + Clone + 'static> Default for ObservableSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone + 'static> ObservableSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SetInner {
                id: ObservableId::next(),
                items: RefCell::new(AHashSet::new()),
                invalidation: CallbackList::new(),
                changes: CallbackList::new(),
            }),
        }
    }

    /// Add `value`. Returns `false` (and fires nothing) if already present.
    pub fn insert(&self, value: T) -> bool {
        let inserted = self.inner.items.borrow_mut().insert(value.clone());
        if inserted {
            self.notify(&[SetChange::Added(value)]);
        }
        inserted
    }

    /// Remove `value`. Returns `false` (and fires nothing) if absent.
    pub fn remove(&self, value: &T) -> bool {
        let removed = self.inner.items.borrow_mut().take(value);
        match removed {
            Some(value) => {
                self.notify(&[SetChange::Removed(value)]);
                true
            }
            None => false,
        }
    }

    /// Remove everything, firing one `Removed` per element.
    pub fn clear(&self) {
        let drained: Vec<T> = self.inner.items.borrow_mut().drain().collect();
        if drained.is_empty() {
            return;
        }
        let changes: Vec<SetChange<T>> = drained.into_iter().map(SetChange::Removed).collect();
        self.notify(&changes);
    }

    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.inner.items.borrow().contains(value)
    }

    /// Snapshot of the elements in unspecified order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.items.borrow().iter().cloned().collect()
    }

    fn notify(&self, changes: &[SetChange<T>]) {
        for listener in self.inner.invalidation.live() {
            listener(self);
        }
        let listeners = self.inner.changes.live();
        for change in changes {
            for listener in &listeners {
                listener(change);
            }
        }
    }
}

impl<T: Eq + Hash + Clone + 'static> Contains<T> for ObservableSet<T> {
    fn contains_value(&self, value: &T) -> bool {
        self.contains(value)
    }
}

impl<T: 'static> Observable for ObservableSet<T> {
    fn id(&self) -> ObservableId {
        self.inner.id
    }

    fn subscribe_invalidation(&self, listener: InvalidationListener) -> Subscription {
        self.inner.invalidation.add(listener)
    }

    fn listener_count(&self) -> usize {
        self.inner.invalidation.len() + self.inner.changes.len()
    }
}

impl<T: Eq + Hash + Clone + 'static> ObservableCollection for ObservableSet<T> {
    type Change = SetChange<T>;

    fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    fn subscribe_changes(&self, listener: CollectionListener<SetChange<T>>) -> Subscription {
        self.inner.changes.add(listener)
    }
}
