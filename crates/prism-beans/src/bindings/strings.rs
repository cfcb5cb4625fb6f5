#![forbid(unsafe_code)]

//! String combinators. Absent strings read as `""`.

use std::fmt::Display;

use crate::binding::{Binding, StringBinding};
use crate::numeric::StringLike;
use crate::observable::Operand;

/// Concatenation of two string-like operands. Never absent.
pub fn concat<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> StringBinding
where
    A: StringLike + 'static,
    B: StringLike + 'static,
{
    Binding::map2(a, b, |x: A, y: B| {
        let (x, y) = (x.as_str_or_empty(), y.as_str_or_empty());
        let mut out = String::with_capacity(x.len() + y.len());
        out.push_str(x);
        out.push_str(y);
        Some(out)
    })
}

/// String form of any displayable operand.
pub fn convert<T: Display + 'static>(a: &impl Operand<T>) -> StringBinding {
    Binding::map(a, |v: T| Some(v.to_string()))
}

/// Length in characters; 0 for an absent string.
pub fn length<A: StringLike + 'static>(a: &impl Operand<A>) -> Binding<i32> {
    Binding::map(a, |v: A| {
        i32::try_from(v.as_str_or_empty().chars().count()).unwrap_or(i32::MAX)
    })
}
