#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashMap;

use super::{CollectionListener, Contains, ObservableCollection};
use crate::observable::{CallbackList, InvalidationListener, Observable, ObservableId, Subscription};

/// One entry added, replaced, or removed.
///
/// `old` is `None` for a fresh key and `new` is `None` for a removal.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapChange<K, V> {
    pub key: K,
    pub old: Option<V>,
    pub new: Option<V>,
}

struct MapInner<K, V> {
    id: ObservableId,
    entries: RefCell<AHashMap<K, V>>,
    invalidation: CallbackList<dyn Fn(&dyn Observable)>,
    changes: CallbackList<dyn Fn(&MapChange<K, V>)>,
}

/// Observable key/value map.
pub struct ObservableMap<K, V> {
    inner: Rc<MapInner<K, V>>,
}

impl<K, V> Clone for ObservableMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K, V> PartialEq for ObservableMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ObservableMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableMap")
            .field("id", &self.inner.id)
            .field("entries", &self.inner.entries.borrow())
            .finish()
    }
}

impl<K, V> Default for ObservableMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ObservableMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(MapInner {
                id: ObservableId::next(),
                entries: RefCell::new(AHashMap::new()),
                invalidation: CallbackList::new(),
                changes: CallbackList::new(),
            }),
        }
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.entries.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.entries.borrow().contains_key(key)
    }

    /// Insert or replace. Storing a value equal to the current one fires
    /// nothing.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let old = self
            .inner
            .entries
            .borrow_mut()
            .insert(key.clone(), value.clone());
        if old.as_ref() != Some(&value) {
            self.notify(&[MapChange {
                key,
                old: old.clone(),
                new: Some(value),
            }]);
        }
        old
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let old = self.inner.entries.borrow_mut().remove(key)?;
        self.notify(&[MapChange {
            key: key.clone(),
            old: Some(old.clone()),
            new: None,
        }]);
        Some(old)
    }

    /// Remove every entry, firing one change per entry.
    pub fn clear(&self) {
        let drained: Vec<(K, V)> = self.inner.entries.borrow_mut().drain().collect();
        if drained.is_empty() {
            return;
        }
        let changes: Vec<MapChange<K, V>> = drained
            .into_iter()
            .map(|(key, old)| MapChange {
                key,
                old: Some(old),
                new: None,
            })
            .collect();
        self.notify(&changes);
    }

    /// Snapshot of the keys in unspecified order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.inner.entries.borrow().keys().cloned().collect()
    }

    fn notify(&self, changes: &[MapChange<K, V>]) {
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

impl<K, V> Contains<K> for ObservableMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn contains_value(&self, key: &K) -> bool {
        self.contains_key(key)
    }
}

impl<K: 'static, V: 'static> Observable for ObservableMap<K, V> {
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

impl<K, V> ObservableCollection for ObservableMap<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    type Change = MapChange<K, V>;

    fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    fn subscribe_changes(&self, listener: CollectionListener<MapChange<K, V>>) -> Subscription {
        self.inner.changes.add(listener)
    }
}
