#![forbid(unsafe_code)]

//! Observable contracts, listener storage, and RAII subscriptions.
//!
//! # Design
//!
//! Every observable owns a [`ListenerSet`]. Listeners are stored as `Weak`
//! callbacks; the strong `Rc` lives inside the [`Subscription`] handed back
//! to the caller. Dropping the subscription makes the entry dead, and dead
//! entries are pruned the next time the observable fires. Neither side keeps
//! the other alive through the registration alone.
//!
//! # Invariants
//!
//! 1. Listeners are notified in registration order.
//! 2. Invalidation listeners are notified before change listeners.
//! 3. A change listener fires only when the observed value differs from the
//!    value it last saw (by `PartialEq`), and only after the new value is
//!    fully computed.
//! 4. Dead listeners never run. They stay counted by `len()` until the next
//!    notification prunes them.
//!
//! # Failure Modes
//!
//! - **Panicking listener**: the panic propagates to whoever triggered the
//!   notification; later listeners in the same cycle do not run.
//! - **Re-entrant mutation**: a listener may mutate other observables. It
//!   must not mutate the observable currently notifying it while relying on
//!   the ordering of the current cycle.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an observable.
///
/// Clones of the same handle share an id. Used for dependency
/// deduplication and for listeners that need to know which source fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservableId(u64);

impl ObservableId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObservableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Callback invoked when an observable may have become stale.
pub type InvalidationListener = Rc<dyn Fn(&dyn Observable)>;

/// Callback invoked with `(old, new)` when an observed value changed.
pub type ChangeListener<T> = Rc<dyn Fn(&T, &T)>;

/// Base contract for anything that can report staleness.
pub trait Observable {
    /// Identity shared by all handles to the same observable.
    fn id(&self) -> ObservableId;

    /// Register an invalidation listener.
    ///
    /// The listener stays registered for as long as the returned
    /// [`Subscription`] is alive.
    fn subscribe_invalidation(&self, listener: InvalidationListener) -> Subscription;

    /// Number of registered listeners, including dead ones not yet pruned.
    fn listener_count(&self) -> usize;

    /// Whether this observable is a derived [`Binding`](crate::Binding).
    fn is_binding(&self) -> bool {
        false
    }

    /// Declared sources of a derived observable. Empty for plain values.
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }
}

/// An observable that carries a value of type `T`.
pub trait ObservableValue<T>: Observable {
    /// Current value, revalidating first if the observable is lazy.
    fn value(&self) -> T;

    /// Register a change listener receiving `(old, new)`.
    fn subscribe_change(&self, listener: ChangeListener<T>) -> Subscription;

    /// Type-erased handle used when this value is wired as a dependency.
    ///
    /// Returns `None` for operands that never change (see
    /// [`Constant`](crate::Constant)).
    fn as_dependency(&self) -> Option<Dependency>;
}

/// Shorthand bound for values that can be captured by a combinator.
pub trait Operand<T>: ObservableValue<T> + Clone + 'static {}

impl<T, O> Operand<T> for O where O: ObservableValue<T> + Clone + 'static {}

/// Closure-friendly registration helpers for every [`Observable`].
pub trait ObservableExt: Observable {
    /// Register an invalidation listener from a closure.
    fn add_listener(&self, listener: impl Fn(&dyn Observable) + 'static) -> Subscription {
        self.subscribe_invalidation(Rc::new(listener))
    }
}

impl<O: Observable + ?Sized> ObservableExt for O {}

/// Closure-friendly registration helpers for every [`ObservableValue`].
pub trait ObservableValueExt<T>: ObservableValue<T> {
    /// Register a change listener from a closure receiving `(old, new)`.
    fn add_change_listener(&self, listener: impl Fn(&T, &T) + 'static) -> Subscription {
        self.subscribe_change(Rc::new(listener))
    }
}

impl<T, O> ObservableValueExt<T> for O where O: ObservableValue<T> + ?Sized {}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// RAII guard for a registered listener.
///
/// Dropping the guard releases the only strong reference to the callback,
/// so the weak entry held by the observable fails to upgrade from then on.
#[must_use = "dropping a Subscription unregisters its listener immediately"]
pub struct Subscription {
    _guard: Option<Box<dyn std::any::Any>>,
}

impl Subscription {
    pub(crate) fn new<F: ?Sized + 'static>(callback: Rc<F>) -> Self {
        Self {
            _guard: Some(Box::new(callback)),
        }
    }

    /// A subscription that holds nothing. Returned by observables that
    /// never fire.
    pub fn empty() -> Self {
        Self { _guard: None }
    }

    /// Whether this guard keeps a callback alive.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self._guard.is_some()
    }

    /// Unregister now. Equivalent to dropping the guard.
    pub fn cancel(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Callback storage
// ---------------------------------------------------------------------------

/// Ordered list of weakly held callbacks.
pub(crate) struct CallbackList<F: ?Sized> {
    entries: RefCell<Vec<Weak<F>>>,
}

impl<F: ?Sized + 'static> CallbackList<F> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, callback: Rc<F>) -> Subscription {
        self.entries.borrow_mut().push(Rc::downgrade(&callback));
        Subscription::new(callback)
    }

    /// Prune dead entries and return the live callbacks in registration
    /// order. No borrow is held once this returns.
    pub(crate) fn live(&self) -> Vec<Rc<F>> {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|w| w.strong_count() > 0);
        entries.iter().filter_map(Weak::upgrade).collect()
    }

    pub(crate) fn has_live(&self) -> bool {
        self.entries.borrow().iter().any(|w| w.strong_count() > 0)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Invalidation and change listeners of one observable.
pub(crate) struct ListenerSet<T> {
    invalidation: CallbackList<dyn Fn(&dyn Observable)>,
    change: CallbackList<dyn Fn(&T, &T)>,
    /// Last value delivered to change listeners.
    observed: RefCell<Option<T>>,
}

impl<T: Clone + PartialEq + 'static> ListenerSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            invalidation: CallbackList::new(),
            change: CallbackList::new(),
            observed: RefCell::new(None),
        }
    }

    pub(crate) fn add_invalidation(&self, listener: InvalidationListener) -> Subscription {
        self.invalidation.add(listener)
    }

    /// Register a change listener. `current` seeds the observed value when
    /// no other change listener is alive.
    pub(crate) fn add_change(&self, listener: ChangeListener<T>, current: T) -> Subscription {
        if !self.change.has_live() {
            *self.observed.borrow_mut() = Some(current);
        }
        self.change.add(listener)
    }

    pub(crate) fn len(&self) -> usize {
        self.invalidation.len() + self.change.len()
    }

    /// Notify invalidation listeners, then change listeners if the value
    /// they observe actually moved. `current` is only called when a change
    /// listener is alive.
    pub(crate) fn fire(&self, source: &dyn Observable, current: impl FnOnce() -> T) {
        for listener in self.invalidation.live() {
            listener(source);
        }

        let changes = self.change.live();
        if changes.is_empty() {
            self.observed.borrow_mut().take();
            return;
        }

        let new_value = current();
        let old_value = self.observed.replace(Some(new_value.clone()));
        if let Some(old_value) = old_value
            && old_value != new_value
        {
            for listener in &changes {
                listener(&old_value, &new_value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Dependency
// ---------------------------------------------------------------------------

/// Type-erased, shared handle to an observable used as a binding source.
///
/// Equality is identity: two dependencies are equal when they refer to the
/// same observable.
#[derive(Clone)]
pub struct Dependency(Rc<dyn Observable>);

impl Dependency {
    /// Wrap an observable handle.
    pub fn new(observable: impl Observable + 'static) -> Self {
        Self(Rc::new(observable))
    }
}

impl Deref for Dependency {
    type Target = dyn Observable;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.0.id() == other.0.id()
    }
}

impl Eq for Dependency {}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("id", &self.0.id())
            .field("binding", &self.0.is_binding())
            .finish()
    }
}

/// Expand nested bindings into their root, non-binding sources.
///
/// Order follows a depth-first walk of the declared dependencies; each root
/// appears once.
#[must_use]
pub fn flatten_dependencies(dependencies: &[Dependency]) -> Vec<Dependency> {
    fn walk(deps: &[Dependency], out: &mut Vec<Dependency>) {
        for dep in deps {
            if dep.is_binding() {
                walk(&dep.dependencies(), out);
            } else if !out.contains(dep) {
                out.push(dep.clone());
            }
        }
    }

    let mut out = Vec::new();
    walk(dependencies, &mut out);
    out
}

/// Collect the dependency handles of a list of operands, skipping constants.
pub(crate) fn collect_dependencies(operands: &[Option<Dependency>]) -> Vec<Dependency> {
    let mut out: Vec<Dependency> = Vec::with_capacity(operands.len());
    for dep in operands.iter().flatten() {
        if !out.contains(dep) {
            out.push(dep.clone());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
