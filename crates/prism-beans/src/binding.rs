#![forbid(unsafe_code)]

//! Lazy, cached values derived from declared dependencies.
//!
//! # Design
//!
//! [`Binding<T>`] wraps a compute function and its cached result in shared,
//! reference-counted storage. It registers one invalidation listener per
//! declared dependency. When a dependency fires, the binding moves from
//! **valid** to **invalid** and forwards the invalidation to its own
//! listeners; it does not recompute. The next [`get()`](Binding::get)
//! recomputes, caches, and moves back to valid.
//!
//! ```text
//!            get() recomputes
//!   Invalid ─────────────────▶ Valid
//!      ▲                         │
//!      └──── dependency fires ───┘  (forwards invalidation once)
//! ```
//!
//! # Invariants
//!
//! 1. A new binding is invalid; `compute` has not run.
//! 2. `valid == true` implies the cached value equals `compute()` over the
//!    current dependency values.
//! 3. While invalid, further dependency invalidations are not forwarded.
//! 4. Change listeners fire only when the recomputed value differs from the
//!    value they last observed.
//! 5. `version` increments by 1 on each recomputation.
//!
//! # Failure Modes
//!
//! - **Compute panics**: the binding stays invalid, so the next `get()`
//!   retries.
//! - **Dependency dropped**: the binding still holds a handle to the source
//!   through its compute function; only the source's listener entry can go
//!   away.
//! - **Binding dropped**: every dependency keeps a dead listener entry until
//!   it next fires, at which point the entry is pruned. Release happens
//!   independently per dependency.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::observable::{
    ChangeListener, Dependency, InvalidationListener, ListenerSet, Observable, ObservableId,
    ObservableValue, Subscription,
};

struct BindingState<T> {
    valid: bool,
    value: Option<T>,
    version: u64,
}

struct BindingInner<T> {
    id: ObservableId,
    state: RefCell<BindingState<T>>,
    compute: Box<dyn Fn() -> T>,
    dependencies: Vec<Dependency>,
    listeners: ListenerSet<T>,
    /// Guards keeping the dependency callbacks alive. Never read.
    subscriptions: RefCell<Vec<Subscription>>,
}

/// A lazily recomputed, cached observable derived from other observables.
///
/// Cloning a `Binding` creates a new handle to the **same** inner state.
pub struct Binding<T> {
    inner: Rc<BindingInner<T>>,
}

/// Boolean-valued binding.
pub type BooleanBinding = Binding<bool>;
/// 32-bit integer binding.
pub type IntegerBinding = Binding<i32>;
/// 64-bit integer binding.
pub type LongBinding = Binding<i64>;
/// Single-precision binding.
pub type FloatBinding = Binding<f32>;
/// Double-precision binding.
pub type DoubleBinding = Binding<f64>;
/// Nullable string binding.
pub type StringBinding = Binding<Option<String>>;
/// Nullable object binding.
pub type ObjectBinding<T> = Binding<Option<T>>;

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Binding")
            .field("id", &self.inner.id)
            .field("valid", &state.valid)
            .field("cached", &state.value)
            .field("version", &state.version)
            .field("dependencies", &self.inner.dependencies.len())
            .finish()
    }
}

/// Non-owning handle used by invalidation callbacks.
pub(crate) struct WeakBinding<T>(Weak<BindingInner<T>>);

impl<T> Clone for WeakBinding<T> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<T> WeakBinding<T> {
    pub(crate) fn upgrade(&self) -> Option<Binding<T>> {
        self.0.upgrade().map(|inner| Binding { inner })
    }
}

impl<T: Clone + PartialEq + 'static> Binding<T> {
    /// Create a binding over `dependencies`, invalidated whenever any of
    /// them fires.
    pub fn new(compute: impl Fn() -> T + 'static, dependencies: Vec<Dependency>) -> Self {
        let binding = Self::detached(compute, dependencies);
        let subscriptions: Vec<Subscription> = binding
            .inner
            .dependencies
            .iter()
            .map(|dep| dep.subscribe_invalidation(binding.invalidator()))
            .collect();
        binding.inner.subscriptions.borrow_mut().extend(subscriptions);
        binding
    }

    /// Derive a binding from a single source.
    pub fn map<S, O>(source: &O, map: impl Fn(S) -> T + 'static) -> Self
    where
        O: ObservableValue<S> + Clone + 'static,
    {
        let src = source.clone();
        let deps = source.as_dependency().into_iter().collect();
        Self::new(move || map(src.value()), deps)
    }

    /// Derive a binding from two sources.
    pub fn map2<A, B, OA, OB>(a: &OA, b: &OB, map: impl Fn(A, B) -> T + 'static) -> Self
    where
        OA: ObservableValue<A> + Clone + 'static,
        OB: ObservableValue<B> + Clone + 'static,
    {
        let (sa, sb) = (a.clone(), b.clone());
        let deps = crate::observable::collect_dependencies(&[a.as_dependency(), b.as_dependency()]);
        Self::new(move || map(sa.value(), sb.value()), deps)
    }

    /// Binding with declared dependencies but no listeners attached yet.
    /// Callers wire their own invalidators through [`retain`](Self::retain).
    pub(crate) fn detached(
        compute: impl Fn() -> T + 'static,
        dependencies: Vec<Dependency>,
    ) -> Self {
        Self {
            inner: Rc::new(BindingInner {
                id: ObservableId::next(),
                state: RefCell::new(BindingState {
                    valid: false,
                    value: None,
                    version: 0,
                }),
                compute: Box::new(compute),
                dependencies,
                listeners: ListenerSet::new(),
                subscriptions: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Keep `subscription` alive for as long as this binding lives.
    pub(crate) fn retain(&self, subscription: Subscription) {
        self.inner.subscriptions.borrow_mut().push(subscription);
    }

    pub(crate) fn downgrade(&self) -> WeakBinding<T> {
        WeakBinding(Rc::downgrade(&self.inner))
    }

    /// The default dependency listener: invalidate unconditionally.
    pub(crate) fn invalidator(&self) -> InvalidationListener {
        let weak = self.downgrade();
        Rc::new(move |_| {
            if let Some(binding) = weak.upgrade() {
                binding.invalidate();
            }
        })
    }

    /// Current value, recomputing first if invalid.
    #[must_use]
    pub fn get(&self) -> T {
        {
            let state = self.inner.state.borrow();
            if state.valid
                && let Some(value) = &state.value
            {
                return value.clone();
            }
        }
        let value = (self.inner.compute)();
        let mut state = self.inner.state.borrow_mut();
        state.value = Some(value.clone());
        state.valid = true;
        state.version += 1;
        value
    }

    /// Access the current value by reference, recomputing first if invalid.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.get();
        f(&value)
    }

    /// Whether the cached value is current.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.state.borrow().valid
    }

    /// Mark the cached value stale and notify listeners. A no-op when the
    /// binding is already invalid.
    pub fn invalidate(&self) {
        let was_valid = {
            let mut state = self.inner.state.borrow_mut();
            std::mem::replace(&mut state.valid, false)
        };
        if was_valid {
            self.inner.listeners.fire(self, || self.get());
        }
    }

    /// Declared sources of this binding.
    #[must_use]
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.inner.dependencies.clone()
    }

    /// Stop listening to dependencies. The binding keeps its last cached
    /// value and will not be invalidated by sources any more.
    pub fn dispose(&self) {
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        drop(subscriptions);
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.state.borrow().version
    }
}

impl<T: Clone + PartialEq + 'static> Observable for Binding<T> {
    fn id(&self) -> ObservableId {
        self.inner.id
    }

    fn subscribe_invalidation(&self, listener: InvalidationListener) -> Subscription {
        self.inner.listeners.add_invalidation(listener)
    }

    fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    fn is_binding(&self) -> bool {
        true
    }

    fn dependencies(&self) -> Vec<Dependency> {
        Binding::dependencies(self)
    }
}

impl<T: Clone + PartialEq + 'static> ObservableValue<T> for Binding<T> {
    fn value(&self) -> T {
        self.get()
    }

    /// Registering a change listener validates the binding so that the
    /// next dependency change is forwarded.
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
