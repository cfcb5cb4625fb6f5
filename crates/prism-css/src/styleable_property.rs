#![forbid(unsafe_code)]

//! Properties that can be set by code or by the cascade.
//!
//! A [`StyleableProperty`] is a [`Property`] that remembers where its
//! current value came from. Values set by application code carry
//! [`StyleOrigin::User`]; styles applied by the engine carry the origin of
//! the winning declaration.
//!
//! # Invariants
//!
//! 1. A user-agent style never replaces a value set by code.
//! 2. A bound property is never styled.
//! 3. When the cascade stops applying a style, the initial value returns;
//!    user-set values are kept.

use std::cell::Cell;
use std::fmt;

use prism_beans::{
    ChangeListener, Dependency, InvalidationListener, Observable, ObservableId, ObservableValue,
    Property, Subscription,
};
use tracing::{trace, warn};

use crate::stylesheet::StyleOrigin;
use crate::value::{CalculatedValue, Color, Font, Insets, StyleValue};

/// Extraction of a typed value from a converted style value.
pub trait FromStyleValue: Sized {
    fn from_style_value(value: &StyleValue) -> Option<Self>;
}

impl FromStyleValue for f64 {
    fn from_style_value(value: &StyleValue) -> Option<Self> {
        value.as_number()
    }
}

impl FromStyleValue for bool {
    fn from_style_value(value: &StyleValue) -> Option<Self> {
        match value {
            StyleValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromStyleValue for String {
    fn from_style_value(value: &StyleValue) -> Option<Self> {
        match value {
            StyleValue::String(s) | StyleValue::Enum(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromStyleValue for Color {
    fn from_style_value(value: &StyleValue) -> Option<Self> {
        value.as_color()
    }
}

impl FromStyleValue for Font {
    fn from_style_value(value: &StyleValue) -> Option<Self> {
        value.as_font().cloned()
    }
}

impl FromStyleValue for Insets {
    fn from_style_value(value: &StyleValue) -> Option<Self> {
        match value {
            StyleValue::Insets(insets) => Some(*insets),
            _ => None,
        }
    }
}

impl FromStyleValue for StyleValue {
    fn from_style_value(value: &StyleValue) -> Option<Self> {
        Some(value.clone())
    }
}

/// `null` maps to `None`.
impl<T: FromStyleValue> FromStyleValue for Option<T> {
    fn from_style_value(value: &StyleValue) -> Option<Self> {
        match value {
            StyleValue::Null => Some(None),
            other => T::from_style_value(other).map(Some),
        }
    }
}

// ---------------------------------------------------------------------------
// StyleableProperty
// ---------------------------------------------------------------------------

/// A [`Property`] plus the origin of its current value.
pub struct StyleableProperty<T> {
    property: Property<T>,
    css_name: String,
    initial: T,
    origin: Cell<Option<StyleOrigin>>,
}

impl<T: Clone + PartialEq + 'static> StyleableProperty<T> {
    /// Property styled by the CSS property `css_name`.
    #[must_use]
    pub fn new(css_name: &str, initial: T) -> Self {
        let css_name = css_name.to_ascii_lowercase();
        Self {
            property: Property::named(css_name.clone(), initial.clone()),
            css_name,
            initial,
            origin: Cell::new(None),
        }
    }

    #[must_use]
    pub fn css_name(&self) -> &str {
        &self.css_name
    }

    /// The underlying property, for binding and listening.
    #[must_use]
    pub fn property(&self) -> &Property<T> {
        &self.property
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.property.get()
    }

    /// Set from application code. The value is marked user-set.
    ///
    /// # Panics
    ///
    /// Panics if the property is bound.
    pub fn set(&self, value: T) {
        self.property.set(value);
        self.origin.set(Some(StyleOrigin::User));
    }

    /// Origin of the current value; `None` while it is the initial value.
    #[must_use]
    pub fn origin(&self) -> Option<StyleOrigin> {
        self.origin.get()
    }

    #[must_use]
    pub fn is_user_set(&self) -> bool {
        self.origin.get() == Some(StyleOrigin::User)
    }

    /// Apply a styled value. Returns false if the style was ignored.
    pub fn apply_style(&self, value: T, origin: StyleOrigin) -> bool {
        if self.property.is_bound() {
            trace!(property = %self.css_name, "bound property not styled");
            return false;
        }
        if origin == StyleOrigin::UserAgent && self.is_user_set() {
            trace!(property = %self.css_name, "user-set value kept");
            return false;
        }
        self.property.set(value);
        self.origin.set(Some(origin));
        true
    }

    /// Apply the outcome of a cascade resolution.
    ///
    /// `None` means no style applies: a styled value is reset to the initial
    /// value, a user-set value is kept. A value of the wrong type is logged
    /// and ignored.
    pub fn apply_resolved(&self, resolved: Option<&CalculatedValue>) -> bool
    where
        T: FromStyleValue,
    {
        match resolved {
            Some(calculated) => match T::from_style_value(&calculated.value) {
                Some(value) => self.apply_style(value, calculated.origin),
                None => {
                    warn!(
                        property = %self.css_name,
                        value = ?calculated.value,
                        "styled value has the wrong type"
                    );
                    false
                }
            },
            None => self.reset(),
        }
    }

    /// Return to the initial value unless code set the current one.
    pub fn reset(&self) -> bool {
        if self.is_user_set() || self.origin.get().is_none() || self.property.is_bound() {
            return false;
        }
        self.property.set(self.initial.clone());
        self.origin.set(None);
        true
    }
}

impl<T: fmt::Debug> fmt::Debug for StyleableProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleableProperty")
            .field("css_name", &self.css_name)
            .field("property", &self.property)
            .field("origin", &self.origin.get())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable for StyleableProperty<T> {
    fn id(&self) -> ObservableId {
        self.property.id()
    }

    fn subscribe_invalidation(&self, listener: InvalidationListener) -> Subscription {
        self.property.subscribe_invalidation(listener)
    }

    fn listener_count(&self) -> usize {
        self.property.listener_count()
    }
}

impl<T: Clone + PartialEq + 'static> ObservableValue<T> for StyleableProperty<T> {
    fn value(&self) -> T {
        self.property.get()
    }

    fn subscribe_change(&self, listener: ChangeListener<T>) -> Subscription {
        self.property.subscribe_change(listener)
    }

    fn as_dependency(&self) -> Option<Dependency> {
        self.property.as_dependency()
    }
}
