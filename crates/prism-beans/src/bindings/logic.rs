#![forbid(unsafe_code)]

//! Boolean combinators with short-circuit invalidation.
//!
//! `and(a, b)` only needs `b` while `a` is true, and `or(a, b)` only needs
//! `b` while `a` is false. The listener attached to `b` checks the current
//! value of `a` and swallows invalidations that cannot change the result, so
//! listeners of the combined binding do not hear about masked changes.
//! Changes to `a` always invalidate.

use std::rc::Rc;

use crate::binding::Binding;
use crate::observable::{Operand, collect_dependencies};

/// Logical AND of two boolean operands.
///
/// While the binding is valid and `a` is false, invalidations of `b` are
/// not propagated.
pub fn and(a: &impl Operand<bool>, b: &impl Operand<bool>) -> Binding<bool> {
    short_circuit(a, b, true)
}

/// Logical OR of two boolean operands.
///
/// While the binding is valid and `a` is true, invalidations of `b` are not
/// propagated.
pub fn or(a: &impl Operand<bool>, b: &impl Operand<bool>) -> Binding<bool> {
    short_circuit(a, b, false)
}

/// Logical negation.
pub fn not(op: &impl Operand<bool>) -> Binding<bool> {
    Binding::map(op, |v: bool| !v)
}

/// `pass` is the value of `a` for which `b` decides the result: true for
/// AND, false for OR.
fn short_circuit(a: &impl Operand<bool>, b: &impl Operand<bool>, pass: bool) -> Binding<bool> {
    let (lhs, rhs) = (a.clone(), b.clone());
    let binding = Binding::detached(
        move || {
            if lhs.value() == pass {
                rhs.value()
            } else {
                !pass
            }
        },
        collect_dependencies(&[a.as_dependency(), b.as_dependency()]),
    );

    binding.retain(a.subscribe_invalidation(binding.invalidator()));

    let weak = binding.downgrade();
    let first = a.clone();
    binding.retain(b.subscribe_invalidation(Rc::new(move |_| {
        if let Some(binding) = weak.upgrade()
            && binding.is_valid()
            && first.value() == pass
        {
            binding.invalidate();
        }
    })));

    binding
}
