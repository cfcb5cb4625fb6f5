#![forbid(unsafe_code)]

//! Combinators over observable collections.
//!
//! Every binding here depends on the collection itself, so it is
//! invalidated by structural changes as well as by the index or key
//! operand. Lookups that miss (index out of range, absent key) log a
//! warning and yield the documented default instead of failing.

use std::fmt;
use std::hash::Hash;

use tracing::warn;

use crate::binding::Binding;
use crate::collections::{Contains, ObservableCollection, ObservableList, ObservableMap};
use crate::observable::{Dependency, Operand, collect_dependencies};

/// Element count.
pub fn size<C: ObservableCollection>(collection: &C) -> Binding<usize> {
    let c = collection.clone();
    Binding::new(move || c.len(), vec![Dependency::new(collection.clone())])
}

/// Whether the collection is empty.
pub fn is_empty<C: ObservableCollection>(collection: &C) -> Binding<bool> {
    let c = collection.clone();
    Binding::new(move || c.is_empty(), vec![Dependency::new(collection.clone())])
}

/// Whether the collection has at least one element.
pub fn is_not_empty<C: ObservableCollection>(collection: &C) -> Binding<bool> {
    let c = collection.clone();
    Binding::new(move || !c.is_empty(), vec![Dependency::new(collection.clone())])
}

/// Whether `value` is a member (element for lists and sets, key for maps).
pub fn contains<C, T>(collection: &C, value: T) -> Binding<bool>
where
    C: ObservableCollection + Contains<T>,
    T: 'static,
{
    let c = collection.clone();
    Binding::new(
        move || c.contains_value(&value),
        vec![Dependency::new(collection.clone())],
    )
}

fn element_at<T: Clone + 'static>(list: &ObservableList<T>, index: usize) -> Option<T> {
    let element = list.get(index);
    if element.is_none() {
        warn!(
            index,
            len = list.len(),
            "list index out of bounds in binding; yielding default"
        );
    }
    element
}

/// Element at a fixed `index`; `None` with a warning while out of range.
pub fn value_at<T>(list: &ObservableList<T>, index: usize) -> Binding<Option<T>>
where
    T: Clone + PartialEq + 'static,
{
    let l = list.clone();
    Binding::new(
        move || element_at(&l, index),
        vec![Dependency::new(list.clone())],
    )
}

/// Element at a fixed `index`; `T::default()` with a warning while out of
/// range.
pub fn value_at_or_default<T>(list: &ObservableList<T>, index: usize) -> Binding<T>
where
    T: Clone + PartialEq + Default + 'static,
{
    let l = list.clone();
    Binding::new(
        move || element_at(&l, index).unwrap_or_default(),
        vec![Dependency::new(list.clone())],
    )
}

/// Element at an observable index. A negative or out-of-range index logs a
/// warning and yields `None`.
pub fn value_at_index<T>(list: &ObservableList<T>, index: &impl Operand<i32>) -> Binding<Option<T>>
where
    T: Clone + PartialEq + 'static,
{
    let (l, i) = (list.clone(), index.clone());
    let deps = collect_dependencies(&[Some(Dependency::new(list.clone())), index.as_dependency()]);
    Binding::new(
        move || {
            let raw = i.value();
            match usize::try_from(raw) {
                Ok(index) => element_at(&l, index),
                Err(_) => {
                    warn!(index = raw, "negative list index in binding; yielding default");
                    None
                }
            }
        },
        deps,
    )
}

fn entry_for<K, V>(map: &ObservableMap<K, V>, key: &K) -> Option<V>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + PartialEq + 'static,
{
    let value = map.get(key);
    if value.is_none() {
        warn!(key = ?key, "map key missing in binding; yielding default");
    }
    value
}

/// Value stored under a fixed `key`; `None` with a warning while absent.
pub fn value_for_key<K, V>(map: &ObservableMap<K, V>, key: K) -> Binding<Option<V>>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + PartialEq + 'static,
{
    let m = map.clone();
    Binding::new(move || entry_for(&m, &key), vec![Dependency::new(map.clone())])
}

/// Value stored under an observable key; `None` with a warning while
/// absent.
pub fn value_for_observable_key<K, V>(
    map: &ObservableMap<K, V>,
    key: &impl Operand<K>,
) -> Binding<Option<V>>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + PartialEq + 'static,
{
    let (m, k) = (map.clone(), key.clone());
    let deps = collect_dependencies(&[Some(Dependency::new(map.clone())), key.as_dependency()]);
    Binding::new(move || entry_for(&m, &k.value()), deps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::{ObservableIntegerArray, ObservableSet};
    use crate::property::Property;

    #[test]
    fn size_and_emptiness_follow_contents() {
        let list = ObservableList::new();
        let n = size(&list);
        let empty = is_empty(&list);
        let any = is_not_empty(&list);
        assert_eq!(n.get(), 0);
        assert!(empty.get());
        list.push("a");
        assert_eq!(n.get(), 1);
        assert!(!empty.get());
        assert!(any.get());
    }

    #[test]
    fn array_size_follows_resize() {
        let array = ObservableIntegerArray::from_slice(&[4, 5]);
        let n = size(&array);
        let empty = is_empty(&array);
        let has_five = contains(&array, 5);
        assert_eq!(n.get(), 2);
        assert!(has_five.get());

        array.add_all(&[6]);
        assert_eq!(n.get(), 3);
        array.set(1, 0);
        assert!(!has_five.get());
        array.clear();
        assert!(empty.get());
        assert_eq!(n.get(), 0);
    }

    #[test]
    fn contains_on_set_and_map() {
        let set = ObservableSet::new();
        let has = contains(&set, 3);
        assert!(!has.get());
        set.insert(3);
        assert!(has.get());

        let map: ObservableMap<&str, i32> = ObservableMap::new();
        let has_key = contains(&map, "w");
        map.insert("w", 1);
        assert!(has_key.get());
    }

    #[test]
    #[tracing_test::traced_test]
    fn value_at_warns_when_out_of_range() {
        let list = ObservableList::from_vec(vec![10, 20]);
        let second = value_at(&list, 1);
        let third = value_at_or_default(&list, 2);
        assert_eq!(second.get(), Some(20));
        assert_eq!(third.get(), 0);
        assert!(logs_contain("list index out of bounds"));
        list.push(30);
        assert_eq!(third.get(), 30);
    }

    #[test]
    #[tracing_test::traced_test]
    fn observable_index() {
        let list = ObservableList::from_vec(vec!['a', 'b']);
        let index = Property::new(0i32);
        let at = value_at_index(&list, &index);
        assert_eq!(at.get(), Some('a'));
        index.set(1);
        assert_eq!(at.get(), Some('b'));
        index.set(-1);
        assert_eq!(at.get(), None);
        assert!(logs_contain("negative list index"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn map_lookups() {
        let map = ObservableMap::new();
        map.insert("gap".to_string(), 4.0f64);
        let key = Property::new("gap".to_string());
        let by_key = value_for_observable_key(&map, &key);
        let fixed = value_for_key(&map, "pad".to_string());
        assert_eq!(by_key.get(), Some(4.0));
        assert_eq!(fixed.get(), None);
        assert!(logs_contain("map key missing"));
        map.insert("pad".to_string(), 1.0);
        assert_eq!(fixed.get(), Some(1.0));
        key.set("pad".to_string());
        assert_eq!(by_key.get(), Some(1.0));
    }
}
