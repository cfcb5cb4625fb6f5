#![forbid(unsafe_code)]

//! Ternary `when(cond).then(a).otherwise(b)` builder.
//!
//! The resulting binding depends on every operand, whichever branch is
//! active, and picks the branch from `cond` at evaluation time. Constant
//! branches (`then_value`, `otherwise_value`) add no dependency.

use std::marker::PhantomData;

use crate::binding::Binding;
use crate::constant::Constant;
use crate::observable::{Operand, collect_dependencies};

/// Start a conditional binding.
pub fn when<C: Operand<bool>>(cond: &C) -> When<C> {
    When { cond: cond.clone() }
}

/// Condition captured, awaiting the `then` branch.
#[must_use = "a conditional needs both branches"]
pub struct When<C> {
    cond: C,
}

impl<C: Operand<bool>> When<C> {
    /// Value while the condition is true.
    pub fn then<T, A: Operand<T>>(self, a: &A) -> Then<C, A, T> {
        Then {
            cond: self.cond,
            then: a.clone(),
            _kind: PhantomData,
        }
    }

    /// Fixed value while the condition is true.
    pub fn then_value<T: Clone + 'static>(self, value: T) -> Then<C, Constant<T>, T> {
        Then {
            cond: self.cond,
            then: Constant::new(value),
            _kind: PhantomData,
        }
    }
}

/// Condition and `then` branch captured, awaiting `otherwise`.
#[must_use = "a conditional needs both branches"]
pub struct Then<C, A, T> {
    cond: C,
    then: A,
    _kind: PhantomData<fn() -> T>,
}

impl<C, A, T> Then<C, A, T>
where
    C: Operand<bool>,
    A: Operand<T>,
    T: Clone + PartialEq + 'static,
{
    /// Value while the condition is false.
    pub fn otherwise(self, b: &impl Operand<T>) -> Binding<T> {
        let deps = collect_dependencies(&[
            self.cond.as_dependency(),
            self.then.as_dependency(),
            b.as_dependency(),
        ]);
        let (cond, then, other) = (self.cond, self.then, b.clone());
        Binding::new(
            move || {
                if cond.value() {
                    then.value()
                } else {
                    other.value()
                }
            },
            deps,
        )
    }

    /// Fixed value while the condition is false.
    pub fn otherwise_value(self, value: T) -> Binding<T> {
        self.otherwise(&Constant::new(value))
    }
}
