#![forbid(unsafe_code)]

//! Writable observable values with version tracking and one-way binding.
//!
//! # Design
//!
//! [`Property<T>`] wraps a value of type `T` in shared, reference-counted
//! storage. When the value changes (determined by `PartialEq`), listeners
//! are notified in registration order: invalidation listeners first, then
//! change listeners with `(old, new)`.
//!
//! A property can be bound one-way to any [`ObservableValue`]. While bound
//! it is lazy: an invalidation from the source marks it stale and is
//! forwarded once, and the next read pulls the source value.
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `get()`       | O(1) (plus source read when bound and stale) |
//! | `set()`       | O(L) where L = listeners   |
//! | `add_listener()` | O(1) amortized          |
//!
//! # Failure Modes
//!
//! - **Setting a bound property**: panics. A bound value is owned by its
//!   source; call [`Property::unbind`] first.
//! - **Re-entrant set of the same property from its own listener**: allowed,
//!   the nested notification cycle runs to completion before the outer one
//!   continues.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::observable::{
    ChangeListener, Dependency, InvalidationListener, ListenerSet, Observable, ObservableId,
    ObservableValue, Subscription,
};

struct Bound<T> {
    read: Rc<dyn Fn() -> T>,
    source: Option<Dependency>,
    _subscription: Subscription,
}

struct PropertyState<T> {
    value: T,
    version: u64,
    /// False only while bound and an invalidation has not been pulled yet.
    valid: bool,
    bound: Option<Bound<T>>,
}

struct PropertyInner<T> {
    id: ObservableId,
    name: Option<String>,
    state: RefCell<PropertyState<T>>,
    listeners: ListenerSet<T>,
}

/// A shared, version-tracked, writable observable value.
///
/// Cloning a `Property` creates a new handle to the **same** inner state:
/// both handles see the same value and share listeners.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing mutation.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. Listeners are notified in registration order.
/// 4. Dead listeners (dropped [`Subscription`] guards) are pruned lazily.
pub struct Property<T> {
    inner: Rc<PropertyInner<T>>,
}

/// Boolean-valued property.
pub type BooleanProperty = Property<bool>;
/// 32-bit integer property.
pub type IntegerProperty = Property<i32>;
/// 64-bit integer property.
pub type LongProperty = Property<i64>;
/// Single-precision property.
pub type FloatProperty = Property<f32>;
/// Double-precision property.
pub type DoubleProperty = Property<f64>;
/// Nullable string property. `None` compares as the empty string.
pub type StringProperty = Property<Option<String>>;
/// Nullable object property.
pub type ObjectProperty<T> = Property<Option<T>>;

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Property")
            .field("name", &self.inner.name)
            .field("value", &state.value)
            .field("version", &state.version)
            .field("bound", &state.bound.is_some())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    /// Create a new property with the given initial value.
    ///
    /// The initial version is 0 and no listeners are registered.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::build(None, value)
    }

    /// Create a named property. The name only shows up in `Debug` output
    /// and log fields.
    #[must_use]
    pub fn named(name: impl Into<String>, value: T) -> Self {
        Self::build(Some(name.into()), value)
    }

    fn build(name: Option<String>, value: T) -> Self {
        Self {
            inner: Rc::new(PropertyInner {
                id: ObservableId::next(),
                name,
                state: RefCell::new(PropertyState {
                    value,
                    version: 0,
                    valid: true,
                    bound: None,
                }),
                listeners: ListenerSet::new(),
            }),
        }
    }

    /// Property name, if one was given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.refresh();
        self.inner.state.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls [`set`](Self::set) or [`update`](Self::update)
    /// on this property, since the value stays borrowed while `f` runs.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.refresh();
        f(&self.inner.state.borrow().value)
    }

    /// Set a new value. If it differs from the current value the version is
    /// incremented and listeners are notified.
    ///
    /// # Panics
    ///
    /// Panics if the property is bound.
    pub fn set(&self, value: T) {
        {
            let mut state = self.inner.state.borrow_mut();
            assert!(
                state.bound.is_none(),
                "a bound property cannot be set; unbind it first"
            );
            if state.value == value {
                return;
            }
            state.value = value;
            state.version += 1;
        }
        self.notify();
    }

    /// Modify the value in place. Listeners are notified only if the value
    /// actually changed.
    ///
    /// # Panics
    ///
    /// Panics if the property is bound.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut state = self.inner.state.borrow_mut();
            assert!(
                state.bound.is_none(),
                "a bound property cannot be updated; unbind it first"
            );
            let old = state.value.clone();
            f(&mut state.value);
            if state.value != old {
                state.version += 1;
                true
            } else {
                false
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Bind this property one-way to `source`. Replaces any previous
    /// binding. The property follows the source lazily until
    /// [`unbind`](Self::unbind).
    pub fn bind(&self, source: &(impl ObservableValue<T> + Clone + 'static)) {
        let weak = Rc::downgrade(&self.inner);
        let subscription = source.subscribe_invalidation(Rc::new(move |_| {
            if let Some(inner) = weak.upgrade() {
                Property { inner }.mark_stale();
            }
        }));
        let reader = source.clone();
        let dependency = source.as_dependency();
        {
            let mut state = self.inner.state.borrow_mut();
            state.bound = Some(Bound {
                read: Rc::new(move || reader.value()),
                source: dependency,
                _subscription: subscription,
            });
        }
        self.mark_stale();
    }

    /// Drop the binding, keeping the last value pulled from the source.
    pub fn unbind(&self) {
        self.refresh();
        let mut state = self.inner.state.borrow_mut();
        state.bound = None;
        state.valid = true;
    }

    /// Whether the property currently follows a source.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.state.borrow().bound.is_some()
    }

    /// The source this property is bound to.
    #[must_use]
    pub fn bound_source(&self) -> Option<Dependency> {
        self.inner
            .state
            .borrow()
            .bound
            .as_ref()
            .and_then(|b| b.source.clone())
    }

    /// Current version number. Increments by 1 on each value-changing
    /// mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.refresh();
        self.inner.state.borrow().version
    }

    fn mark_stale(&self) {
        let was_valid = {
            let mut state = self.inner.state.borrow_mut();
            std::mem::replace(&mut state.valid, false)
        };
        if was_valid {
            self.notify();
        }
    }

    /// Pull the source value if bound and stale.
    fn refresh(&self) {
        let read = {
            let state = self.inner.state.borrow();
            match &state.bound {
                Some(bound) if !state.valid => Rc::clone(&bound.read),
                _ => return,
            }
        };
        let value = read();
        let mut state = self.inner.state.borrow_mut();
        state.valid = true;
        if state.value != value {
            state.value = value;
            state.version += 1;
        }
    }

    fn notify(&self) {
        self.inner.listeners.fire(self, || self.get());
    }
}

impl<T: Clone + PartialEq + 'static> Observable for Property<T> {
    fn id(&self) -> ObservableId {
        self.inner.id
    }

    fn subscribe_invalidation(&self, listener: InvalidationListener) -> Subscription {
        self.inner.listeners.add_invalidation(listener)
    }

    fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

impl<T: Clone + PartialEq + 'static> ObservableValue<T> for Property<T> {
    fn value(&self) -> T {
        self.get()
    }

    fn subscribe_change(&self, listener: ChangeListener<T>) -> Subscription {
        let current = self.get();
        self.inner.listeners.add_change(listener, current)
    }

    fn as_dependency(&self) -> Option<Dependency> {
        Some(Dependency::new(self.clone()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
