#![forbid(unsafe_code)]

//! Fixed operands for combinators.

use std::fmt;
use std::rc::Rc;

use crate::observable::{
    ChangeListener, Dependency, InvalidationListener, Observable, ObservableId, ObservableValue,
    Subscription,
};

/// A value that never changes.
///
/// Lets combinators mix observables with plain values
/// (`add(&width, &Constant::new(4))`). A constant never fires, never holds
/// listeners, and is never reported as a dependency.
pub struct Constant<T> {
    id: ObservableId,
    value: Rc<T>,
}

impl<T> Clone for Constant<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Rc::clone(&self.value),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Constant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constant").field(&self.value).finish()
    }
}

impl<T> Constant<T> {
    /// Wrap a value.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            id: ObservableId::next(),
            value: Rc::new(value),
        }
    }
}

impl<T> Observable for Constant<T> {
    fn id(&self) -> ObservableId {
        self.id
    }

    fn subscribe_invalidation(&self, _listener: InvalidationListener) -> Subscription {
        Subscription::empty()
    }

    fn listener_count(&self) -> usize {
        0
    }
}

impl<T: Clone> ObservableValue<T> for Constant<T> {
    fn value(&self) -> T {
        (*self.value).clone()
    }

    fn subscribe_change(&self, _listener: ChangeListener<T>) -> Subscription {
        Subscription::empty()
    }

    fn as_dependency(&self) -> Option<Dependency> {
        None
    }
}
