#![forbid(unsafe_code)]

//! Resizable observable arrays of plain numbers.
//!
//! Unlike [`ObservableList`](super::ObservableList), a change does not
//! carry the elements involved: listeners get the touched range and whether
//! the length moved, and read the array for the rest.
//!
//! # Failure Modes
//!
//! Ranges outside the array are caller errors and panic, as slice indexing
//! does.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{CollectionListener, Contains, ObservableCollection};
use crate::observable::{CallbackList, InvalidationListener, Observable, ObservableId, Subscription};

/// One mutation of an [`ObservableArray`].
///
/// Elements in `from..to` hold new values. A pure resize reports
/// `size_changed` with an empty range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrayChange {
    pub size_changed: bool,
    pub from: usize,
    pub to: usize,
}

struct ArrayInner<T> {
    id: ObservableId,
    items: RefCell<Vec<T>>,
    invalidation: CallbackList<dyn Fn(&dyn Observable)>,
    changes: CallbackList<dyn Fn(&ArrayChange)>,
}

/// Observable, resizable array of `Copy` values.
pub struct ObservableArray<T> {
    inner: Rc<ArrayInner<T>>,
}

/// Observable array of `i32`.
pub type ObservableIntegerArray = ObservableArray<i32>;
/// Observable array of `f32`.
pub type ObservableFloatArray = ObservableArray<f32>;

impl<T> Clone for ObservableArray<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for ObservableArray<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableArray")
            .field("id", &self.inner.id)
            .field("items", &self.inner.items.borrow())
            .finish()
    }
}

impl<T: Copy + Default + 'static> Default for ObservableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default + 'static> From<&[T]> for ObservableArray<T> {
    fn from(values: &[T]) -> Self {
        Self::from_slice(values)
    }
}

impl<T: Copy + Default + 'static> ObservableArray<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_slice(&[])
    }

    #[must_use]
    pub fn from_slice(values: &[T]) -> Self {
        Self {
            inner: Rc::new(ArrayInner {
                id: ObservableId::next(),
                items: RefCell::new(values.to_vec()),
                invalidation: CallbackList::new(),
                changes: CallbackList::new(),
            }),
        }
    }

    /// Independent copy of another array's current contents.
    #[must_use]
    pub fn copy_of(other: &Self) -> Self {
        Self::from_slice(&other.inner.items.borrow())
    }

    /// Element at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).copied()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    /// Copy `len` elements starting at `src` into `dest[dest_index..]`.
    ///
    /// # Panics
    ///
    /// Panics if either range is out of bounds.
    pub fn copy_to(&self, src: usize, dest: &mut [T], dest_index: usize, len: usize) {
        dest[dest_index..dest_index + len]
            .copy_from_slice(&self.inner.items.borrow()[src..src + len]);
    }

    /// Overwrite one element.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn set(&self, index: usize, value: T) {
        self.set_range(index, &[value]);
    }

    /// Overwrite `values.len()` elements starting at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the range ends past the array.
    pub fn set_range(&self, index: usize, values: &[T]) {
        if values.is_empty() {
            return;
        }
        self.inner.items.borrow_mut()[index..index + values.len()].copy_from_slice(values);
        self.notify(ArrayChange {
            size_changed: false,
            from: index,
            to: index + values.len(),
        });
    }

    /// Replace the whole contents. Replacing an empty array with nothing
    /// fires nothing.
    pub fn set_all(&self, values: &[T]) {
        let old_len = {
            let mut items = self.inner.items.borrow_mut();
            let old_len = items.len();
            items.clear();
            items.extend_from_slice(values);
            old_len
        };
        if old_len == 0 && values.is_empty() {
            return;
        }
        self.notify(ArrayChange {
            size_changed: old_len != values.len(),
            from: 0,
            to: values.len(),
        });
    }

    /// Append `values`.
    pub fn add_all(&self, values: &[T]) {
        if values.is_empty() {
            return;
        }
        let from = {
            let mut items = self.inner.items.borrow_mut();
            let from = items.len();
            items.extend_from_slice(values);
            from
        };
        self.notify(ArrayChange {
            size_changed: true,
            from,
            to: from + values.len(),
        });
    }

    /// Grow with `T::default()` or truncate to `len`.
    pub fn resize(&self, len: usize) {
        let changed = {
            let mut items = self.inner.items.borrow_mut();
            let changed = items.len() != len;
            items.resize(len, T::default());
            changed
        };
        if changed {
            self.notify(ArrayChange {
                size_changed: true,
                from: 0,
                to: 0,
            });
        }
    }

    pub fn clear(&self) {
        self.resize(0);
    }

    /// Reserve room for at least `capacity` elements in total. Fires
    /// nothing.
    pub fn ensure_capacity(&self, capacity: usize) {
        let mut items = self.inner.items.borrow_mut();
        let additional = capacity.saturating_sub(items.len());
        items.reserve(additional);
    }

    /// Release spare capacity. Fires nothing.
    pub fn trim_to_size(&self) {
        self.inner.items.borrow_mut().shrink_to_fit();
    }

    fn notify(&self, change: ArrayChange) {
        for listener in self.inner.invalidation.live() {
            listener(self);
        }
        for listener in self.inner.changes.live() {
            listener(&change);
        }
    }
}

impl<T: PartialEq> Contains<T> for ObservableArray<T> {
    fn contains_value(&self, value: &T) -> bool {
        self.inner.items.borrow().contains(value)
    }
}

impl<T: 'static> Observable for ObservableArray<T> {
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

impl<T: Copy + Default + 'static> ObservableCollection for ObservableArray<T> {
    type Change = ArrayChange;

    fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    fn subscribe_changes(&self, listener: CollectionListener<ArrayChange>) -> Subscription {
        self.inner.changes.add(listener)
    }
}

impl<T: fmt::Display> fmt::Display for ObservableArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.inner.items.borrow().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str("]")
    }
}
