#![forbid(unsafe_code)]

//! Prism: observable properties, lazy bindings and CSS styling.
//!
//! This crate re-exports the workspace crates:
//! - [`beans`] (`prism-beans`): properties, bindings, observable collections
//! - [`css`] (`prism-css`): stylesheets, selector matching, the cascade
//!
//! Most applications only need the [`prelude`].
//!
//! ```
//! use prism::prelude::*;
//!
//! let width = DoubleProperty::new(10.0);
//! let padding = StyleableProperty::new("-fx-padding", Insets::default());
//!
//! let mut engine = StyleEngine::default();
//! engine.parse_and_add("Button { -fx-padding: 2px; }", StyleOrigin::Author);
//! let node = StyleableNode::new("Button");
//! let resolved = engine.resolve(&[&node], padding.css_name()).unwrap();
//! padding.apply_resolved(resolved.as_deref());
//!
//! let outer = bindings::add(&width, &Constant::new(padding.get().left * 2.0));
//! assert_eq!(outer.get(), 14.0);
//! ```

pub use prism_beans as beans;
pub use prism_css as css;

/// Common imports.
pub mod prelude {
    pub use prism_beans::bindings;
    pub use prism_beans::{
        Binding, BooleanBinding, BooleanProperty, Constant, DoubleBinding, DoubleProperty,
        IntegerProperty, ListBinding, LongProperty, Observable, ObservableArray, ObservableExt,
        ObservableList, ObservableMap, ObservableSet, ObservableValue, ObservableValueExt, Property,
        StringBinding, StringProperty, Subscription,
    };
    pub use prism_css::{
        CalculatedValue, Color, CssError, Font, Insets, StyleConfig, StyleEngine, StyleOrigin,
        StyleValue, Styleable, StyleableNode, StyleableProperty, Stylesheet,
    };
}
