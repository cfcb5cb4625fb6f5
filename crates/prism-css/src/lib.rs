#![forbid(unsafe_code)]

//! CSS styling for Prism: stylesheets, selector matching and the cascade.
//!
//! This crate provides:
//! - [`PseudoClassRegistry`] and [`PseudoClassState`] bit sets
//! - [`Selector`]s, the [`Stylesheet`] model and a stylesheet text parser
//! - [`SelectorPartitioning`] for indexed selector lookup
//! - [`StyleEngine`], which resolves property values with cascade order,
//!   inheritance, looked-up values and a bounded style cache
//! - [`StyleConverter`]s turning declared values into typed [`StyleValue`]s
//! - [`StyleableProperty`], a bindable property aware of its style origin
//!
//! # Example
//!
//! ```
//! use prism_css::{StyleEngine, StyleOrigin, StyleValue, StyleableNode};
//!
//! let mut engine = StyleEngine::default();
//! engine.parse_and_add(".root Button { -fx-opacity: 0.5; }", StyleOrigin::Author);
//!
//! let root = StyleableNode::new("Pane").with_class("root");
//! let button = StyleableNode::new("Button");
//! let opacity = engine.resolve(&[&button, &root], "-fx-opacity").unwrap();
//! assert_eq!(opacity.map(|v| v.value.clone()), Some(StyleValue::Number(0.5)));
//! ```

/// Cascade precedence of matched declarations.
pub mod cascade;
/// Environment-driven engine configuration.
pub mod config;
/// Declared value to typed value conversion.
pub mod converter;
/// Style resolution and caching.
pub mod engine;
/// Error type.
pub mod error;
/// Stylesheet text parser.
pub mod parser;
/// Selector index.
pub mod partition;
/// Styleable property metadata.
pub mod properties;
/// Pseudo-class interning and state sets.
pub mod pseudo_class;
/// Selectors and specificity.
pub mod selector;
/// The node contract seen by the cascade.
pub mod styleable;
/// Properties that remember their style origin.
pub mod styleable_property;
/// Stylesheets, rules and declarations.
pub mod stylesheet;
/// Parsed and converted values.
pub mod value;

pub use cascade::CascadingStyle;
pub use config::{StyleConfig, StyleConfigError, StyleConfigParse};
pub use converter::{ConvertContext, StyleConverter};
pub use engine::{CacheStats, StyleEngine, StylesheetId};
pub use error::CssError;
pub use parser::{parse_declarations, parse_selector, parse_stylesheet};
pub use partition::{SelectorEntry, SelectorPartitioning};
pub use properties::{CssMetaData, PropertyFlags, PropertyRegistry};
pub use pseudo_class::{PseudoClass, PseudoClassRegistry, PseudoClassState};
pub use selector::{Combinator, CompoundSelector, Selector, SimpleSelector, Specificity};
pub use styleable::{StyleChain, Styleable, StyleableNode};
pub use styleable_property::{FromStyleValue, StyleableProperty};
pub use stylesheet::{Declaration, Rule, StyleOrigin, Stylesheet};
pub use value::{
    CalculatedValue, Color, Font, FontPosture, Insets, ParsedValue, Size, SizeUnits, StyleValue,
};
