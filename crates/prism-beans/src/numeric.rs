#![forbid(unsafe_code)]

//! Numeric value kinds and operand promotion.
//!
//! The four numeric kinds follow the usual tower: `i32 < i64 < f32 < f64`.
//! Combining two operands yields the wider kind; integer + long is long,
//! anything + float is float, anything + double is double. Promotion is
//! resolved at compile time through [`Promote`], so `add(&int, &double)` is
//! a `Binding<f64>` by type.

use std::cmp::Ordering;
use std::fmt;

/// A numeric value kind usable in arithmetic combinators.
pub trait Numeric: Copy + PartialEq + PartialOrd + Default + fmt::Debug + 'static {
    /// Lossy conversion used for tolerance comparisons.
    fn to_f64(self) -> f64;
    /// Addition. Integer kinds wrap on overflow.
    fn add(self, rhs: Self) -> Self;
    /// Subtraction. Integer kinds wrap on overflow.
    fn sub(self, rhs: Self) -> Self;
    /// Multiplication. Integer kinds wrap on overflow.
    fn mul(self, rhs: Self) -> Self;
    /// Division. `None` for integer division by zero.
    fn div(self, rhs: Self) -> Option<Self>;
    /// Negation. Integer kinds wrap on overflow.
    fn neg(self) -> Self;
}

macro_rules! impl_integer {
    ($($t:ty),*) => {$(
        impl Numeric for $t {
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
            #[inline]
            fn add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            #[inline]
            fn mul(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
            #[inline]
            fn div(self, rhs: Self) -> Option<Self> {
                if rhs == 0 { None } else { Some(self.wrapping_div(rhs)) }
            }
            #[inline]
            fn neg(self) -> Self {
                self.wrapping_neg()
            }
        }
    )*};
}

macro_rules! impl_float {
    ($($t:ty),*) => {$(
        impl Numeric for $t {
            #[inline]
            fn to_f64(self) -> f64 {
                f64::from(self)
            }
            #[inline]
            fn add(self, rhs: Self) -> Self {
                self + rhs
            }
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                self - rhs
            }
            #[inline]
            fn mul(self, rhs: Self) -> Self {
                self * rhs
            }
            #[inline]
            fn div(self, rhs: Self) -> Option<Self> {
                Some(self / rhs)
            }
            #[inline]
            fn neg(self) -> Self {
                -self
            }
        }
    )*};
}

impl_integer!(i32, i64);
impl_float!(f32, f64);

/// Widening of a left operand kind against a right operand kind.
pub trait Promote<Rhs: Numeric>: Numeric {
    /// The wider of the two kinds.
    type Output: Numeric;
    /// Widen the left operand.
    fn promote_lhs(self) -> Self::Output;
    /// Widen the right operand.
    fn promote_rhs(rhs: Rhs) -> Self::Output;
}

macro_rules! promote {
    ($($lhs:ty, $rhs:ty => $out:ty;)*) => {$(
        impl Promote<$rhs> for $lhs {
            type Output = $out;
            #[inline]
            #[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
            fn promote_lhs(self) -> $out {
                self as $out
            }
            #[inline]
            #[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
            fn promote_rhs(rhs: $rhs) -> $out {
                rhs as $out
            }
        }
    )*};
}

promote! {
    i32, i32 => i32;
    i32, i64 => i64;
    i32, f32 => f32;
    i32, f64 => f64;
    i64, i32 => i64;
    i64, i64 => i64;
    i64, f32 => f32;
    i64, f64 => f64;
    f32, i32 => f32;
    f32, i64 => f32;
    f32, f32 => f32;
    f32, f64 => f64;
    f64, i32 => f64;
    f64, i64 => f64;
    f64, f32 => f64;
    f64, f64 => f64;
}

/// Result kind of combining `A` with `B`.
pub type Promoted<A, B> = <A as Promote<B>>::Output;

/// Values that can be compared by the comparison combinators.
///
/// Numeric pairs compare after promotion. String-like values compare
/// lexicographically with `None` treated as the empty string.
pub trait CompareValues<Rhs = Self> {
    /// Equality used by `equal` / `not_equal`.
    fn values_equal(&self, rhs: &Rhs) -> bool;
    /// Ordering used by `greater_than` and friends. `None` when unordered
    /// (NaN).
    fn values_cmp(&self, rhs: &Rhs) -> Option<Ordering>;
}

macro_rules! compare_numeric {
    ($($lhs:ty, $rhs:ty;)*) => {$(
        impl CompareValues<$rhs> for $lhs {
            #[inline]
            fn values_equal(&self, rhs: &$rhs) -> bool {
                <$lhs as Promote<$rhs>>::promote_lhs(*self)
                    == <$lhs as Promote<$rhs>>::promote_rhs(*rhs)
            }
            #[inline]
            fn values_cmp(&self, rhs: &$rhs) -> Option<Ordering> {
                <$lhs as Promote<$rhs>>::promote_lhs(*self)
                    .partial_cmp(&<$lhs as Promote<$rhs>>::promote_rhs(*rhs))
            }
        }
    )*};
}

compare_numeric! {
    i32, i32; i32, i64; i32, f32; i32, f64;
    i64, i32; i64, i64; i64, f32; i64, f64;
    f32, i32; f32, i64; f32, f32; f32, f64;
    f64, i32; f64, i64; f64, f32; f64, f64;
}

impl CompareValues for bool {
    fn values_equal(&self, rhs: &bool) -> bool {
        self == rhs
    }

    fn values_cmp(&self, rhs: &bool) -> Option<Ordering> {
        Some(self.cmp(rhs))
    }
}

/// String-like values where absence reads as the empty string.
pub trait StringLike {
    /// The string, or `""` when absent.
    fn as_str_or_empty(&self) -> &str;
}

impl StringLike for String {
    fn as_str_or_empty(&self) -> &str {
        self.as_str()
    }
}

impl StringLike for Option<String> {
    fn as_str_or_empty(&self) -> &str {
        self.as_deref().unwrap_or("")
    }
}

macro_rules! compare_strings {
    ($($lhs:ty, $rhs:ty;)*) => {$(
        impl CompareValues<$rhs> for $lhs {
            fn values_equal(&self, rhs: &$rhs) -> bool {
                self.as_str_or_empty() == rhs.as_str_or_empty()
            }
            fn values_cmp(&self, rhs: &$rhs) -> Option<Ordering> {
                Some(self.as_str_or_empty().cmp(rhs.as_str_or_empty()))
            }
        }
    )*};
}

compare_strings! {
    String, String;
    String, Option<String>;
    Option<String>, String;
    Option<String>, Option<String>;
}
