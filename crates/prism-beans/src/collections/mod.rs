#![forbid(unsafe_code)]

//! Observable collections with structural change events.
//!
//! # Design
//!
//! Each collection is a cheap shared handle (`Rc` inside) so the same
//! contents can be held by a property, a binding, and user code at once.
//! A mutation fires, in order:
//!
//! 1. invalidation listeners (the collection is an [`Observable`]), then
//! 2. structural change listeners with a [`ListChange`], [`SetChange`],
//!    [`MapChange`] or [`ArrayChange`] describing exactly what moved.
//!
//! A list built with an extractor also fires [`ListChange::Updated`] when an
//! observable inside one of its elements is invalidated.
//!
//! Mutations that leave the contents untouched (removing a missing key,
//! clearing an empty list) fire nothing.
//!
//! # Invariants
//!
//! 1. Equality of two handles is identity, not contents. A property holding
//!    a collection therefore reports a change only when the collection is
//!    replaced, never when its contents move.
//! 2. Listeners observe the collection after the mutation is complete.

use std::rc::Rc;

use crate::observable::{Observable, Subscription};

mod array;
mod binding;
mod list;
mod map;
mod set;

pub use array::{ArrayChange, ObservableArray, ObservableFloatArray, ObservableIntegerArray};
pub use binding::{ArrayBinding, CollectionBinding, ListBinding, MapBinding, SetBinding};
pub use list::{Extractor, ListChange, ObservableList};
pub use map::{MapChange, ObservableMap};
pub use set::{ObservableSet, SetChange};

/// Callback receiving one structural change.
pub type CollectionListener<C> = Rc<dyn Fn(&C)>;

/// Shared behaviour of observable collections.
pub trait ObservableCollection: Observable + Clone + PartialEq + 'static {
    /// Structural change event type.
    type Change: 'static;

    /// Number of elements (entries for maps).
    fn len(&self) -> usize;

    /// Whether the collection holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a structural change listener.
    fn subscribe_changes(&self, listener: CollectionListener<Self::Change>) -> Subscription;
}

/// Membership test used by the `contains` combinator.
///
/// Lists, sets and arrays test elements; maps test keys.
pub trait Contains<T> {
    /// Whether `value` is present.
    fn contains_value(&self, value: &T) -> bool;
}

/// Closure-friendly registration for collection change listeners.
pub trait ObservableCollectionExt: ObservableCollection {
    /// Register a change listener from a closure.
    fn add_content_listener(&self, listener: impl Fn(&Self::Change) + 'static) -> Subscription {
        self.subscribe_changes(Rc::new(listener))
    }
}

impl<C: ObservableCollection> ObservableCollectionExt for C {}
