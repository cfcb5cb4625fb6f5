#![forbid(unsafe_code)]

//! Bindings whose value is an observable collection.
//!
//! # Design
//!
//! A [`CollectionBinding`] is a [`Binding<C>`] plus a watch on the contents
//! of the collection it last computed. Two kinds of events are therefore
//! distinguished:
//!
//! - **Replacement**: a dependency fires, the binding is invalidated, and
//!   the next `get()` recomputes (possibly a different collection).
//! - **Content change**: the current collection is mutated in place. The
//!   binding stays valid and `compute` is not re-run; the structural change
//!   is forwarded to content listeners and the derived
//!   [`size_property`](CollectionBinding::size_property) /
//!   [`empty_property`](CollectionBinding::empty_property) are invalidated.
//!
//! The content watch moves to the new collection each time `compute`
//! returns one.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::{
    CollectionListener, ObservableArray, ObservableCollection, ObservableList, ObservableMap,
    ObservableSet,
};
use crate::binding::Binding;
use crate::observable::{
    CallbackList, ChangeListener, Dependency, InvalidationListener, Observable, ObservableId,
    ObservableValue, Subscription,
};

struct Watch {
    target: ObservableId,
    _subscription: Subscription,
}

struct ContentState<C: ObservableCollection> {
    watch: RefCell<Option<Watch>>,
    listeners: CallbackList<dyn Fn(&C::Change)>,
    size: OnceCell<Binding<usize>>,
    empty: OnceCell<Binding<bool>>,
}

impl<C: ObservableCollection> ContentState<C> {
    fn watch(self: &Rc<Self>, collection: &C) {
        let target = collection.id();
        if self
            .watch
            .borrow()
            .as_ref()
            .is_some_and(|w| w.target == target)
        {
            return;
        }
        trace!(collection = %target, "collection binding watching new contents");
        let weak: Weak<Self> = Rc::downgrade(self);
        let subscription = collection.subscribe_changes(Rc::new(move |change: &C::Change| {
            if let Some(state) = weak.upgrade() {
                state.content_changed(change);
            }
        }));
        *self.watch.borrow_mut() = Some(Watch {
            target,
            _subscription: subscription,
        });
    }

    fn content_changed(&self, change: &C::Change) {
        if let Some(size) = self.size.get() {
            size.invalidate();
        }
        if let Some(empty) = self.empty.get() {
            empty.invalidate();
        }
        for listener in self.listeners.live() {
            listener(change);
        }
    }
}

/// A lazily computed observable collection with live content tracking.
pub struct CollectionBinding<C: ObservableCollection> {
    binding: Binding<C>,
    state: Rc<ContentState<C>>,
}

/// Binding producing an [`ObservableList`].
pub type ListBinding<T> = CollectionBinding<ObservableList<T>>;
/// Binding producing an [`ObservableSet`].
pub type SetBinding<T> = CollectionBinding<ObservableSet<T>>;
/// Binding producing an [`ObservableMap`].
pub type MapBinding<K, V> = CollectionBinding<ObservableMap<K, V>>;
/// Binding producing an [`ObservableArray`].
pub type ArrayBinding<T> = CollectionBinding<ObservableArray<T>>;

impl<C: ObservableCollection> Clone for CollectionBinding<C> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<C: ObservableCollection + fmt::Debug> fmt::Debug for CollectionBinding<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionBinding")
            .field("binding", &self.binding)
            .field(
                "watching",
                &self.state.watch.borrow().as_ref().map(|w| w.target),
            )
            .finish()
    }
}

impl<C: ObservableCollection> CollectionBinding<C> {
    /// Create a collection binding over `dependencies`.
    pub fn new(compute: impl Fn() -> C + 'static, dependencies: Vec<Dependency>) -> Self {
        let state = Rc::new(ContentState {
            watch: RefCell::new(None),
            listeners: CallbackList::new(),
            size: OnceCell::new(),
            empty: OnceCell::new(),
        });
        let weak = Rc::downgrade(&state);
        let binding = Binding::new(
            move || {
                let collection = compute();
                if let Some(state) = weak.upgrade() {
                    state.watch(&collection);
                }
                collection
            },
            dependencies,
        );
        Self { binding, state }
    }

    /// Current collection, recomputing first if invalid.
    #[must_use]
    pub fn get(&self) -> C {
        self.binding.get()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.binding.is_valid()
    }

    pub fn invalidate(&self) {
        self.binding.invalidate();
    }

    #[must_use]
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.binding.dependencies()
    }

    /// Stop listening to dependencies and to the current contents.
    pub fn dispose(&self) {
        self.binding.dispose();
        self.state.watch.borrow_mut().take();
    }

    /// Number of `compute` runs.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.binding.version()
    }

    /// Live element count of the current collection.
    pub fn size_property(&self) -> Binding<usize> {
        self.state
            .size
            .get_or_init(|| Binding::map(&self.binding, |c: C| c.len()))
            .clone()
    }

    /// Live emptiness of the current collection.
    pub fn empty_property(&self) -> Binding<bool> {
        self.state
            .empty
            .get_or_init(|| Binding::map(&self.binding, |c: C| c.is_empty()))
            .clone()
    }

    /// Listen to structural changes of whichever collection is current.
    ///
    /// Validates the binding first so the first collection is watched.
    pub fn subscribe_content(&self, listener: CollectionListener<C::Change>) -> Subscription {
        let _ = self.binding.get();
        self.state.listeners.add(listener)
    }

    /// Closure form of [`subscribe_content`](Self::subscribe_content).
    pub fn add_content_listener(&self, listener: impl Fn(&C::Change) + 'static) -> Subscription {
        self.subscribe_content(Rc::new(listener))
    }
}

impl<C: ObservableCollection> Observable for CollectionBinding<C> {
    fn id(&self) -> ObservableId {
        self.binding.id()
    }

    fn subscribe_invalidation(&self, listener: InvalidationListener) -> Subscription {
        self.binding.subscribe_invalidation(listener)
    }

    fn listener_count(&self) -> usize {
        self.binding.listener_count() + self.state.listeners.len()
    }

    fn is_binding(&self) -> bool {
        true
    }

    fn dependencies(&self) -> Vec<Dependency> {
        self.binding.dependencies()
    }
}

impl<C: ObservableCollection> ObservableValue<C> for CollectionBinding<C> {
    fn value(&self) -> C {
        self.binding.get()
    }

    fn subscribe_change(&self, listener: ChangeListener<C>) -> Subscription {
        self.binding.subscribe_change(listener)
    }

    fn as_dependency(&self) -> Option<Dependency> {
        self.binding.as_dependency()
    }
}
