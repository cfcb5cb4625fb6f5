#![forbid(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::{CollectionListener, Contains, ObservableCollection};
use crate::observable::{
    CallbackList, Dependency, InvalidationListener, Observable, ObservableId, Subscription,
};

/// One structural change of a list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ListChange<T> {
    /// `removed` were the elements at `from..from + removed.len()` before
    /// the mutation; `added` are the elements at `from..from + added.len()`
    /// after it.
    Replaced {
        from: usize,
        removed: Vec<T>,
        added: Vec<T>,
    },
    /// Elements were reordered. The element previously at `from + i` is now
    /// at `permutation[i]`.
    Permuted { from: usize, permutation: Vec<usize> },
    /// Elements in `from..to` changed internally, as reported by the list's
    /// extractor. The list holds the same elements as before.
    Updated { from: usize, to: usize },
}

impl<T> ListChange<T> {
    /// First index touched by the change.
    #[must_use]
    pub fn from(&self) -> usize {
        match self {
            Self::Replaced { from, .. }
            | Self::Permuted { from, .. }
            | Self::Updated { from, .. } => *from,
        }
    }

    /// Inserted elements; empty unless [`Replaced`](Self::Replaced).
    #[must_use]
    pub fn added(&self) -> &[T] {
        match self {
            Self::Replaced { added, .. } => added,
            _ => &[],
        }
    }

    /// Taken-out elements; empty unless [`Replaced`](Self::Replaced).
    #[must_use]
    pub fn removed(&self) -> &[T] {
        match self {
            Self::Replaced { removed, .. } => removed,
            _ => &[],
        }
    }

    /// Whether elements were inserted.
    #[must_use]
    pub fn was_added(&self) -> bool {
        !self.added().is_empty()
    }

    /// Whether elements were taken out.
    #[must_use]
    pub fn was_removed(&self) -> bool {
        !self.removed().is_empty()
    }

    /// Whether elements were overwritten in place.
    #[must_use]
    pub fn was_replaced(&self) -> bool {
        self.was_added() && self.was_removed()
    }

    #[must_use]
    pub fn was_permutated(&self) -> bool {
        matches!(self, Self::Permuted { .. })
    }

    #[must_use]
    pub fn was_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }

    /// New index of the element previously at `index`, for a permutation
    /// covering it.
    #[must_use]
    pub fn permuted_index(&self, index: usize) -> Option<usize> {
        match self {
            Self::Permuted { from, permutation } => {
                permutation.get(index.checked_sub(*from)?).copied()
            }
            _ => None,
        }
    }
}

/// Observables of one element whose invalidation is reported as an
/// [`ListChange::Updated`] of that element.
pub type Extractor<T> = Rc<dyn Fn(&T) -> Vec<Dependency>>;

struct ElementWatch {
    token: u64,
    _subscriptions: Vec<Subscription>,
}

struct ListInner<T> {
    id: ObservableId,
    items: RefCell<Vec<T>>,
    extractor: Option<Extractor<T>>,
    /// Parallel to `items` when an extractor is set, empty otherwise.
    watches: RefCell<Vec<ElementWatch>>,
    next_token: Cell<u64>,
    invalidation: CallbackList<dyn Fn(&dyn Observable)>,
    changes: CallbackList<dyn Fn(&ListChange<T>)>,
}

/// Ordered observable sequence.
pub struct ObservableList<T> {
    inner: Rc<ListInner<T>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for ObservableList<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("id", &self.inner.id)
            .field("items", &self.inner.items.borrow())
            .field("extractor", &self.inner.extractor.is_some())
            .finish()
    }
}

impl<T: Clone + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> From<Vec<T>> for ObservableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Clone + 'static> ObservableList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::build(items, None)
    }

    /// A list that also reports changes inside its elements.
    ///
    /// `extractor` names the observables of each element. When one of them
    /// is invalidated the list fires [`ListChange::Updated`] for that
    /// element. Watches follow elements through every mutation.
    #[must_use]
    pub fn with_extractor(
        items: Vec<T>,
        extractor: impl Fn(&T) -> Vec<Dependency> + 'static,
    ) -> Self {
        let list = Self::build(items, Some(Rc::new(extractor)));
        let watches = list.watch_all(&list.inner.items.borrow());
        *list.inner.watches.borrow_mut() = watches;
        list
    }

    fn build(items: Vec<T>, extractor: Option<Extractor<T>>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                id: ObservableId::next(),
                items: RefCell::new(items),
                extractor,
                watches: RefCell::new(Vec::new()),
                next_token: Cell::new(0),
                invalidation: CallbackList::new(),
                changes: CallbackList::new(),
            }),
        }
    }

    /// Element at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Snapshot of the contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    /// Borrow the contents for the duration of `f`.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this list.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    pub fn push(&self, value: T) {
        let from = {
            let mut items = self.inner.items.borrow_mut();
            items.push(value.clone());
            items.len() - 1
        };
        self.splice_watches(from, 0, std::slice::from_ref(&value));
        self.notify(ListChange::Replaced {
            from,
            removed: Vec::new(),
            added: vec![value],
        });
    }

    /// Insert at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, value: T) {
        self.inner.items.borrow_mut().insert(index, value.clone());
        self.splice_watches(index, 0, std::slice::from_ref(&value));
        self.notify(ListChange::Replaced {
            from: index,
            removed: Vec::new(),
            added: vec![value],
        });
    }

    /// Remove the element at `index`, or `None` if out of range.
    pub fn remove(&self, index: usize) -> Option<T> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        }?;
        self.splice_watches(index, 1, &[]);
        self.notify(ListChange::Replaced {
            from: index,
            removed: vec![removed.clone()],
            added: Vec::new(),
        });
        Some(removed)
    }

    /// Overwrite the element at `index`, returning the previous one, or
    /// `None` (and no event) if out of range.
    pub fn set(&self, index: usize, value: T) -> Option<T> {
        let old = {
            let mut items = self.inner.items.borrow_mut();
            let slot = items.get_mut(index)?;
            std::mem::replace(slot, value.clone())
        };
        self.splice_watches(index, 1, std::slice::from_ref(&value));
        self.notify(ListChange::Replaced {
            from: index,
            removed: vec![old.clone()],
            added: vec![value],
        });
        Some(old)
    }

    /// Replace the whole contents.
    pub fn replace_all(&self, items: Vec<T>) {
        let old = std::mem::replace(&mut *self.inner.items.borrow_mut(), items.clone());
        if old.is_empty() && items.is_empty() {
            return;
        }
        self.splice_watches(0, old.len(), &items);
        self.notify(ListChange::Replaced {
            from: 0,
            removed: old,
            added: items,
        });
    }

    pub fn clear(&self) {
        self.replace_all(Vec::new());
    }

    /// Stable sort by `compare`, firing a single [`ListChange::Permuted`].
    /// An already sorted list fires nothing.
    ///
    /// # Panics
    ///
    /// Panics if `compare` accesses this list.
    pub fn sort_by(&self, mut compare: impl FnMut(&T, &T) -> Ordering) {
        let order: Vec<usize> = {
            let items = self.inner.items.borrow();
            let mut order: Vec<usize> = (0..items.len()).collect();
            order.sort_by(|&a, &b| compare(&items[a], &items[b]));
            order
        };
        if order.iter().enumerate().all(|(new, &old)| new == old) {
            return;
        }

        let mut permutation = vec![0; order.len()];
        for (new, &old) in order.iter().enumerate() {
            permutation[old] = new;
        }
        {
            let mut items = self.inner.items.borrow_mut();
            let sorted: Vec<T> = order.iter().map(|&old| items[old].clone()).collect();
            *items = sorted;
        }
        {
            let mut watches = self.inner.watches.borrow_mut();
            if !watches.is_empty() {
                let mut slots: Vec<Option<ElementWatch>> = watches.drain(..).map(Some).collect();
                *watches = order.iter().filter_map(|&old| slots[old].take()).collect();
            }
        }
        self.notify(ListChange::Permuted {
            from: 0,
            permutation,
        });
    }

    fn watch_all(&self, values: &[T]) -> Vec<ElementWatch> {
        let Some(extractor) = &self.inner.extractor else {
            return Vec::new();
        };
        values
            .iter()
            .map(|value| {
                let token = self.inner.next_token.get();
                self.inner.next_token.set(token + 1);
                let weak: Weak<ListInner<T>> = Rc::downgrade(&self.inner);
                let listener: InvalidationListener = Rc::new(move |_: &dyn Observable| {
                    if let Some(inner) = weak.upgrade() {
                        ObservableList { inner }.element_updated(token);
                    }
                });
                let subscriptions = extractor(value)
                    .iter()
                    .map(|dep| dep.subscribe_invalidation(Rc::clone(&listener)))
                    .collect();
                ElementWatch {
                    token,
                    _subscriptions: subscriptions,
                }
            })
            .collect()
    }

    /// Keep element watches aligned with `items` after replacing
    /// `removed` elements at `from` by `added`.
    fn splice_watches(&self, from: usize, removed: usize, added: &[T]) {
        if self.inner.extractor.is_none() {
            return;
        }
        let fresh = self.watch_all(added);
        self.inner
            .watches
            .borrow_mut()
            .splice(from..from + removed, fresh);
    }

    fn element_updated(&self, token: u64) {
        let position = self
            .inner
            .watches
            .borrow()
            .iter()
            .position(|w| w.token == token);
        if let Some(index) = position {
            trace!(list = %self.inner.id, index, "list element updated");
            self.notify(ListChange::Updated {
                from: index,
                to: index + 1,
            });
        }
    }

    fn notify(&self, change: ListChange<T>) {
        for listener in self.inner.invalidation.live() {
            listener(self);
        }
        for listener in self.inner.changes.live() {
            listener(&change);
        }
    }
}

impl<T: Clone + Ord + 'static> ObservableList<T> {
    /// Stable ascending sort, firing a single [`ListChange::Permuted`].
    pub fn sort(&self) {
        self.sort_by(Ord::cmp);
    }
}

impl<T: PartialEq> Contains<T> for ObservableList<T> {
    fn contains_value(&self, value: &T) -> bool {
        self.inner.items.borrow().contains(value)
    }
}

impl<T: 'static> Observable for ObservableList<T> {
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

impl<T: Clone + 'static> ObservableCollection for ObservableList<T> {
    type Change = ListChange<T>;

    fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    fn subscribe_changes(&self, listener: CollectionListener<ListChange<T>>) -> Subscription {
        self.inner.changes.add(listener)
    }
}
