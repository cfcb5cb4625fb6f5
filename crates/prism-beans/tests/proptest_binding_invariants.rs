//! Property-based invariant tests for the binding graph.
//!
//! 1. A fresh binding is invalid; one `get()` validates it.
//! 2. After any sequence of writes, a binding's value equals the direct
//!    recomputation over the current source values.
//! 3. Numeric combinators agree with promoted arithmetic.
//! 4. `and`/`or` agree with the boolean operators for every write sequence,
//!    and `and` never notifies while its first operand stays false.
//! 5. A change listener sees exactly the sequence of distinct values.
//! 6. Flattened dependencies contain only non-binding roots.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use prism_beans::bindings::{add, and, equal, max, min, multiply, or, subtract, when};
use prism_beans::{
    Binding, Observable, ObservableExt, ObservableValueExt, Property, flatten_dependencies,
};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Write {
    A(i32),
    B(f64),
    Read,
}

fn write_strategy() -> impl Strategy<Value = Write> {
    prop_oneof![
        (-1000i32..=1000).prop_map(Write::A),
        (-1000.0f64..=1000.0).prop_map(Write::B),
        Just(Write::Read),
    ]
}

fn bool_writes() -> impl Strategy<Value = Vec<(bool, bool)>> {
    proptest::collection::vec((any::<bool>(), any::<bool>()), 1..40)
}

// ── Invariants ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn fresh_binding_is_invalid(a in any::<i32>()) {
        let p = Property::new(a);
        let b = Binding::map(&p, |v: i32| v.wrapping_mul(3));
        prop_assert!(!b.is_valid());
        prop_assert_eq!(b.get(), a.wrapping_mul(3));
        prop_assert!(b.is_valid());
    }

    #[test]
    fn value_matches_recomputation(writes in proptest::collection::vec(write_strategy(), 1..60)) {
        let a = Property::new(0i32);
        let b = Property::new(0.0f64);
        let sum = add(&a, &b);
        let diff = subtract(&a, &b);
        let prod = multiply(&a, &b);
        let lo = min(&a, &b);
        let hi = max(&a, &b);
        let same = equal(&a, &b);

        for w in writes {
            match w {
                Write::A(v) => a.set(v),
                Write::B(v) => b.set(v),
                Write::Read => {}
            }
            let (x, y) = (f64::from(a.get()), b.get());
            prop_assert_eq!(sum.get(), x + y);
            prop_assert_eq!(diff.get(), x - y);
            prop_assert_eq!(prod.get(), x * y);
            prop_assert_eq!(lo.get(), x.min(y));
            prop_assert_eq!(hi.get(), x.max(y));
            prop_assert_eq!(same.get(), x == y);
        }
    }

    #[test]
    fn and_or_agree_with_operators(writes in bool_writes()) {
        let a = Property::new(false);
        let b = Property::new(false);
        let both = and(&a, &b);
        let either = or(&a, &b);
        for (x, y) in writes {
            a.set(x);
            b.set(y);
            prop_assert_eq!(both.get(), x && y);
            prop_assert_eq!(either.get(), x || y);
        }
    }

    #[test]
    fn and_silent_while_first_operand_false(
        flips in proptest::collection::vec(any::<bool>(), 1..40),
    ) {
        let a = Property::new(false);
        let b = Property::new(false);
        let both = and(&a, &b);
        let fired = Rc::new(Cell::new(0u32));
        let f = Rc::clone(&fired);
        let _sub = both.add_listener(move |_| f.set(f.get() + 1));
        prop_assert!(!both.get());
        for y in flips {
            b.set(y);
        }
        prop_assert_eq!(fired.get(), 0);
    }

    #[test]
    fn change_listener_sees_distinct_values(values in proptest::collection::vec(0i32..4, 1..50)) {
        let p = Property::new(0i32);
        let half = Binding::map(&p, |v: i32| v / 2);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = half.add_change_listener(move |_, new| s.borrow_mut().push(*new));

        let mut expected = Vec::new();
        let mut last = 0;
        for v in values {
            p.set(v);
            if v / 2 != last {
                expected.push(v / 2);
                last = v / 2;
            }
        }
        prop_assert_eq!(&*seen.borrow(), &expected);
    }

    #[test]
    fn flattened_dependencies_are_roots(depth in 1usize..6) {
        let cond = Property::new(true);
        let leaf = Property::new(1i32);
        let mut top = Binding::map(&leaf, |v: i32| v + 1);
        for _ in 0..depth {
            top = when(&cond).then(&top).otherwise(&leaf);
        }
        let roots = flatten_dependencies(&top.dependencies());
        prop_assert_eq!(roots.len(), 2);
        prop_assert!(roots.iter().all(|d| !d.is_binding()));
    }
}
