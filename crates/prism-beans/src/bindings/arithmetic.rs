#![forbid(unsafe_code)]

//! Arithmetic combinators over promoted numeric operands.

use tracing::warn;

use crate::binding::Binding;
use crate::numeric::{Numeric, Promote, Promoted};
use crate::observable::Operand;

fn combine<A, B>(
    a: &impl Operand<A>,
    b: &impl Operand<B>,
    op: impl Fn(Promoted<A, B>, Promoted<A, B>) -> Promoted<A, B> + 'static,
) -> Binding<Promoted<A, B>>
where
    A: Promote<B>,
    B: Numeric,
{
    Binding::map2(a, b, move |x: A, y: B| {
        op(x.promote_lhs(), <A as Promote<B>>::promote_rhs(y))
    })
}

/// `a + b` in the wider of the two kinds.
pub fn add<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<Promoted<A, B>>
where
    A: Promote<B>,
    B: Numeric,
{
    combine(a, b, <Promoted<A, B> as Numeric>::add)
}

/// `a - b` in the wider of the two kinds.
pub fn subtract<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<Promoted<A, B>>
where
    A: Promote<B>,
    B: Numeric,
{
    combine(a, b, <Promoted<A, B> as Numeric>::sub)
}

/// `a * b` in the wider of the two kinds.
pub fn multiply<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<Promoted<A, B>>
where
    A: Promote<B>,
    B: Numeric,
{
    combine(a, b, <Promoted<A, B> as Numeric>::mul)
}

/// `a / b` in the wider of the two kinds.
///
/// Integer division by zero logs a warning and yields zero. Floating
/// division follows IEEE 754.
pub fn divide<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<Promoted<A, B>>
where
    A: Promote<B>,
    B: Numeric,
{
    combine(a, b, |x, y| {
        x.div(y).unwrap_or_else(|| {
            warn!(dividend = ?x, "integer division by zero in binding; yielding 0");
            Default::default()
        })
    })
}

/// The smaller operand, promoted.
pub fn min<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<Promoted<A, B>>
where
    A: Promote<B>,
    B: Numeric,
{
    combine(a, b, |x, y| if y < x { y } else { x })
}

/// The larger operand, promoted.
pub fn max<A, B>(a: &impl Operand<A>, b: &impl Operand<B>) -> Binding<Promoted<A, B>>
where
    A: Promote<B>,
    B: Numeric,
{
    combine(a, b, |x, y| if y > x { y } else { x })
}

/// `-a`.
pub fn negate<A: Numeric>(a: &impl Operand<A>) -> Binding<A> {
    Binding::map(a, <A as Numeric>::neg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;
    use crate::property::Property;

    #[test]
    fn integer_plus_double_is_double() {
        let a = Property::new(2i32);
        let b = Property::new(0.5f64);
        let sum: Binding<f64> = add(&a, &b);
        assert!((sum.get() - 2.5).abs() < f64::EPSILON);
        a.set(4);
        assert!((sum.get() - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn integer_plus_long_is_long() {
        let a = Property::new(i32::MAX);
        let b = Property::new(1i64);
        let sum: Binding<i64> = add(&a, &b);
        assert_eq!(sum.get(), i64::from(i32::MAX) + 1);
    }

    #[test]
    fn long_times_float_is_float() {
        let a = Property::new(3i64);
        let b = Constant::new(1.5f32);
        let product: Binding<f32> = multiply(&a, &b);
        assert!((product.get() - 4.5).abs() < f32::EPSILON);
    }

    #[test]
    fn subtract_and_negate() {
        let a = Property::new(10i32);
        let b = Property::new(3i32);
        let diff = subtract(&a, &b);
        assert_eq!(diff.get(), 7);
        let neg = negate(&diff);
        assert_eq!(neg.get(), -7);
        b.set(12);
        assert_eq!(neg.get(), 2);
    }

    #[test]
    #[tracing_test::traced_test]
    fn integer_divide_by_zero_yields_zero() {
        let a = Property::new(9i32);
        let b = Property::new(0i32);
        let q = divide(&a, &b);
        assert_eq!(q.get(), 0);
        assert!(logs_contain("integer division by zero"));
        b.set(2);
        assert_eq!(q.get(), 4);
    }

    #[test]
    fn float_divide_by_zero_is_infinite() {
        let a = Property::new(1.0f64);
        let b = Property::new(0i32);
        let q = divide(&a, &b);
        assert!(q.get().is_infinite());
    }

    #[test]
    fn min_max_promote() {
        let a = Property::new(3i32);
        let b = Property::new(2.5f64);
        assert!((min(&a, &b).get() - 2.5).abs() < f64::EPSILON);
        assert!((max(&a, &b).get() - 3.0).abs() < f64::EPSILON);
    }
}
