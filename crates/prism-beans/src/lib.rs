#![forbid(unsafe_code)]

//! Observable values and lazily evaluated bindings for Prism.
//!
//! This crate provides:
//! - [`Observable`] / [`ObservableValue`] contracts with RAII [`Subscription`]s
//! - [`Property`] for writable, bindable values
//! - [`Binding`] for lazy, cached values derived from dependencies
//! - [`bindings`], a factory of combinators (logic, arithmetic with numeric
//!   promotion, comparison, strings, `when`/`otherwise`, collections)
//! - Observable collections and [`CollectionBinding`]s with structural change
//!   events
//!
//! Everything here is single-threaded: handles are `Rc`-based and neither
//! `Send` nor `Sync`.

/// Lazy, cached derived values.
pub mod binding;
/// Stateless binding combinators.
pub mod bindings;
/// Observable list, set, map, and numeric arrays.
pub mod collections;
/// Fixed operands.
pub mod constant;
/// Numeric kinds, promotion, and value comparison.
pub mod numeric;
/// Observable contracts and listener storage.
pub mod observable;
/// Writable observable values.
pub mod property;

pub use binding::{
    Binding, BooleanBinding, DoubleBinding, FloatBinding, IntegerBinding, LongBinding,
    ObjectBinding, StringBinding,
};
pub use collections::{
    ArrayBinding, ArrayChange, CollectionBinding, Contains, Extractor, ListBinding, ListChange,
    MapBinding, MapChange, ObservableArray, ObservableCollection, ObservableCollectionExt,
    ObservableFloatArray, ObservableIntegerArray, ObservableList, ObservableMap, ObservableSet,
    SetBinding, SetChange,
};
pub use constant::Constant;
pub use numeric::{CompareValues, Numeric, Promote, Promoted, StringLike};
pub use observable::{
    ChangeListener, Dependency, InvalidationListener, Observable, ObservableExt, ObservableId,
    ObservableValue, ObservableValueExt, Operand, Subscription, flatten_dependencies,
};
pub use property::{
    BooleanProperty, DoubleProperty, FloatProperty, IntegerProperty, LongProperty,
    ObjectProperty, Property, StringProperty,
};
