#![forbid(unsafe_code)]

//! Equality and ordering combinators.
//!
//! Numeric operands compare after promotion to the wider kind. String
//! operands (`String` or `Option<String>`) treat `None` as `""`. All
//! results are `Binding<bool>`. Unordered numeric pairs (NaN) make every
//! ordering comparison false.

use std::cmp::Ordering;

use crate::binding::Binding;
use crate::numeric::{CompareValues, Numeric, StringLike};
use crate::observable::Operand;

fn compare<A, B>(
    a: &impl Operand<A>,
    b: &impl Operand<B>,
    accept: fn(Option<Ordering>) -> bool,
) -> Binding<bool>
where
    A: CompareValues<B> + 'static,
    B: 'static,
{
    Binding::map2(a, b, move |x: A, y: B| accept(x.values_cmp(&y)))
}

/// `a == b`.
pub fn equal<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<bool>
where
    A: CompareValues<B> + 'static,
    B: 'static,
{
    Binding::map2(a, b, |x: A, y: B| x.values_equal(&y))
}

/// `a != b`.
pub fn not_equal<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<bool>
where
    A: CompareValues<B> + 'static,
    B: 'static,
{
    Binding::map2(a, b, |x: A, y: B| !x.values_equal(&y))
}

/// `a > b`.
pub fn greater_than<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<bool>
where
    A: CompareValues<B> + 'static,
    B: 'static,
{
    compare(a, b, |o| o == Some(Ordering::Greater))
}

/// `a < b`.
pub fn less_than<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<bool>
where
    A: CompareValues<B> + 'static,
    B: 'static,
{
    compare(a, b, |o| o == Some(Ordering::Less))
}

/// `a >= b`.
pub fn greater_than_or_equal<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<bool>
where
    A: CompareValues<B> + 'static,
    B: 'static,
{
    compare(a, b, |o| matches!(o, Some(Ordering::Greater | Ordering::Equal)))
}

/// `a <= b`.
pub fn less_than_or_equal<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<bool>
where
    A: CompareValues<B> + 'static,
    B: 'static,
{
    compare(a, b, |o| matches!(o, Some(Ordering::Less | Ordering::Equal)))
}

/// `|a - b| <= epsilon`, computed in `f64`.
pub fn equal_with_tolerance<A, B>(
    a: &impl Operand<A>,
    b: &impl Operand<B>,
    epsilon: f64,
) -> Binding<bool>
where
    A: Numeric,
    B: Numeric,
{
    Binding::map2(a, b, move |x: A, y: B| {
        (x.to_f64() - y.to_f64()).abs() <= epsilon
    })
}

/// `|a - b| > epsilon`, computed in `f64`.
pub fn not_equal_with_tolerance<A, B>(
    a: &impl Operand<A>,
    b: &impl Operand<B>,
    epsilon: f64,
) -> Binding<bool>
where
    A: Numeric,
    B: Numeric,
{
    Binding::map2(a, b, move |x: A, y: B| {
        (x.to_f64() - y.to_f64()).abs() > epsilon
    })
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Case-insensitive string equality; `None` reads as `""`.
pub fn equal_ignore_case<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<bool>
where
    A: StringLike + 'static,
    B: StringLike + 'static,
{
    Binding::map2(a, b, |x: A, y: B| {
        eq_ignore_case(x.as_str_or_empty(), y.as_str_or_empty())
    })
}

/// Case-insensitive string inequality; `None` reads as `""`.
pub fn not_equal_ignore_case<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<bool>
where
    A: StringLike + 'static,
    B: StringLike + 'static,
{
    Binding::map2(a, b, |x: A, y: B| {
        !eq_ignore_case(x.as_str_or_empty(), y.as_str_or_empty())
    })
}

/// Value equality for arbitrary objects.
pub fn equal_objects<T>(a: &impl Operand<T>, b: &impl Operand<T>) -> Binding<bool>
where
    T: PartialEq + 'static,
{
    Binding::map2(a, b, |x: T, y: T| x == y)
}

/// Value inequality for arbitrary objects.
pub fn not_equal_objects<T>(a: &impl Operand<T>, b: &impl Operand<T>) -> Binding<bool>
where
    T: PartialEq + 'static,
{
    Binding::map2(a, b, |x: T, y: T| x != y)
}

/// Whether an optional value is absent.
pub fn is_null<T: 'static>(a: &impl Operand<Option<T>>) -> Binding<bool> {
    Binding::map(a, |v: Option<T>| v.is_none())
}

/// Whether an optional value is present.
pub fn is_not_null<T: 'static>(a: &impl Operand<Option<T>>) -> Binding<bool> {
    Binding::map(a, |v: Option<T>| v.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;
    use crate::property::{Property, StringProperty};

    #[test]
    fn mixed_numeric_equality() {
        let a = Property::new(3i32);
        let b = Property::new(3.0f64);
        let eq = equal(&a, &b);
        assert!(eq.get());
        b.set(3.5);
        assert!(!eq.get());
        assert!(not_equal(&a, &b).get());
    }

    #[test]
    fn ordering_comparisons() {
        let a = Property::new(2i64);
        let b = Constant::new(2.0f32);
        assert!(!greater_than(&a, &b).get());
        assert!(!less_than(&a, &b).get());
        assert!(greater_than_or_equal(&a, &b).get());
        assert!(less_than_or_equal(&a, &b).get());
        a.set(3);
        let gt = greater_than(&a, &b);
        assert!(gt.get());
    }

    #[test]
    fn nan_is_never_ordered() {
        let a = Property::new(f64::NAN);
        let b = Property::new(1.0f64);
        assert!(!greater_than(&a, &b).get());
        assert!(!less_than_or_equal(&a, &b).get());
    }

    #[test]
    fn tolerance_equality() {
        let a = Property::new(1.0f64);
        let b = Property::new(1.05f32);
        assert!(equal_with_tolerance(&a, &b, 0.1).get());
        assert!(!equal_with_tolerance(&a, &b, 0.01).get());
        assert!(not_equal_with_tolerance(&a, &b, 0.01).get());
    }

    #[test]
    fn absent_strings_are_equal() {
        let a = StringProperty::default();
        let b = StringProperty::default();
        let eq = equal(&a, &b);
        assert!(eq.get());
        b.set(Some(String::new()));
        assert!(eq.get());
        b.set(Some("x".into()));
        assert!(!eq.get());
        assert!(less_than(&a, &b).get());
    }

    #[test]
    fn ignore_case() {
        let a = StringProperty::new(Some("Hello".into()));
        let b = StringProperty::new(Some("hELLO".into()));
        assert!(equal_ignore_case(&a, &b).get());
        assert!(!equal(&a, &b).get());
        b.set(None);
        assert!(not_equal_ignore_case(&a, &b).get());
    }

    #[test]
    fn objects_and_nulls() {
        let a = Property::new(Some(vec![1, 2]));
        let b = Property::new(Some(vec![1, 2]));
        assert!(equal_objects(&a, &b).get());
        b.set(None);
        assert!(not_equal_objects(&a, &b).get());
        assert!(is_null(&b).get());
        assert!(is_not_null(&a).get());
    }
}
