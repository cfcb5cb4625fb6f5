#![forbid(unsafe_code)]

//! Stateless combinators producing [`Binding`](crate::Binding)s.
//!
//! Every function takes its operands by reference, clones the handles it
//! needs, and returns a fresh lazy binding that depends on each observable
//! operand. [`Constant`](crate::Constant) operands are captured but never
//! registered as dependencies.
//!
//! | Group | Functions |
//! |-------|-----------|
//! | logic | [`and`], [`or`], [`not`] |
//! | arithmetic | [`add`], [`subtract`], [`multiply`], [`divide`], [`min`], [`max`], [`negate`] |
//! | comparison | [`equal`], [`not_equal`], [`greater_than`], [`less_than`], [`greater_than_or_equal`], [`less_than_or_equal`], tolerance and case-insensitive variants |
//! | objects | [`equal_objects`], [`not_equal_objects`], [`is_null`], [`is_not_null`] |
//! | strings | [`concat`], [`convert`], [`length`] |
//! | conditional | [`when`] |
//! | collections | [`size`], [`is_empty`], [`is_not_empty`], [`contains`], [`value_at`], [`value_at_index`], [`value_for_key`] |
//!
//! Only [`and`] and [`or`] suppress invalidations from an operand that
//! cannot affect the result. All other combinators forward every operand
//! invalidation.

mod arithmetic;
mod collections;
mod compare;
mod logic;
mod strings;
mod when;

pub use arithmetic::{add, divide, max, min, multiply, negate, subtract};
pub use collections::{
    contains, is_empty, is_not_empty, size, value_at, value_at_index, value_at_or_default,
    value_for_key, value_for_observable_key,
};
pub use compare::{
    equal, equal_ignore_case, equal_objects, equal_with_tolerance, greater_than,
    greater_than_or_equal, is_not_null, is_null, less_than, less_than_or_equal, not_equal,
    not_equal_ignore_case, not_equal_objects, not_equal_with_tolerance,
};
pub use logic::{and, not, or};
pub use strings::{concat, convert, length};
pub use when::{Then, When, when};
