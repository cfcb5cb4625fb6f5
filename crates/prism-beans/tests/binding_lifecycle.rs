//! End-to-end binding scenarios: short-circuit notification counts,
//! numeric promotion by type, null-safe string equality, and the
//! operand-by-operand release of dropped bindings.

use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use prism_beans::bindings::{add, and, divide, equal, greater_than, is_empty, or, size};
use prism_beans::{
    Binding, BooleanBinding, DoubleProperty, IntegerProperty, LongProperty, Observable,
    ObservableExt, ObservableList, ObservableValueExt, Property, StringProperty,
};

fn type_of<T: 'static>(_: &Binding<T>) -> TypeId {
    TypeId::of::<T>()
}

#[test]
fn and_toggle_scenario() {
    let a = Property::new(true);
    let b = Property::new(false);
    let both: BooleanBinding = and(&a, &b);

    let invalidations = Rc::new(Cell::new(0u32));
    let inv = Rc::clone(&invalidations);
    let _inv_sub = both.add_listener(move |_| inv.set(inv.get() + 1));

    let changes = Rc::new(RefCell::new(Vec::new()));
    let ch = Rc::clone(&changes);
    let _change_sub = both.add_change_listener(move |old, new| ch.borrow_mut().push((*old, *new)));

    assert!(!both.get());

    a.set(false);
    assert_eq!(invalidations.get(), 1);
    assert!(!both.get());

    a.set(true);
    assert_eq!(invalidations.get(), 2);
    assert!(!both.get());

    // The value never moved, so change listeners stayed quiet.
    assert!(changes.borrow().is_empty());

    b.set(true);
    assert_eq!(*changes.borrow(), vec![(false, true)]);
}

#[test]
fn numeric_promotion_is_typed() {
    let i = IntegerProperty::new(1);
    let l = LongProperty::new(2);
    let d = DoubleProperty::new(0.5);
    let f = Property::new(1.5f32);

    assert_eq!(type_of(&add(&i, &d)), TypeId::of::<f64>());
    assert_eq!(type_of(&add(&i, &l)), TypeId::of::<i64>());
    assert_eq!(type_of(&add(&l, &f)), TypeId::of::<f32>());
    assert_eq!(type_of(&divide(&i, &i)), TypeId::of::<i32>());
    assert_eq!(type_of(&greater_than(&i, &d)), TypeId::of::<bool>());
}

#[test]
fn null_strings_compare_equal() {
    let a = StringProperty::new(None);
    let b = StringProperty::new(None);
    assert!(equal(&a, &b).get());
}

#[test]
fn dropped_binding_releases_each_operand_on_its_own_fire() {
    let a = Property::new(false);
    let b = Property::new(false);
    let either = or(&a, &b);
    assert!(!either.get());
    assert_eq!(a.listener_count(), 1);
    assert_eq!(b.listener_count(), 1);

    drop(either);

    // Entries are still present until each source fires.
    assert_eq!(a.listener_count(), 1);
    assert_eq!(b.listener_count(), 1);

    b.set(true);
    assert_eq!(b.listener_count(), 0);
    assert_eq!(a.listener_count(), 1);

    a.set(true);
    assert_eq!(a.listener_count(), 0);
}

#[test]
fn collection_factories_track_contents() {
    let list = ObservableList::from_vec(vec![1, 2, 3]);
    let n = size(&list);
    let empty = is_empty(&list);
    let fired = Rc::new(Cell::new(0u32));
    let f = Rc::clone(&fired);
    let _sub = n.add_listener(move |_| f.set(f.get() + 1));

    assert_eq!(n.get(), 3);
    list.remove(0);
    assert_eq!(fired.get(), 1);
    assert_eq!(n.get(), 2);
    list.clear();
    assert!(empty.get());
}

#[test]
fn bound_property_follows_binding() {
    let width = Property::new(10i32);
    let padding = Property::new(2i32);
    let total = add(&width, &padding);
    let target = Property::new(0i32);
    target.bind(&total);
    assert_eq!(target.get(), 12);
    width.set(20);
    assert_eq!(target.get(), 22);
    target.unbind();
    width.set(1);
    assert_eq!(target.get(), 22);
}
