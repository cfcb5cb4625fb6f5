#![forbid(unsafe_code)]

//! The contract a styled node offers to the cascade.
//!
//! The engine never walks a scene graph. Callers pass the node together
//! with its ancestors as a [`StyleChain`]: `chain[0]` is the node being
//! styled, `chain[1]` its parent, and so on up to the root.

use std::collections::BTreeSet;

use crate::error::CssError;
use crate::pseudo_class::{PseudoClassRegistry, PseudoClassState};

/// Node identity seen by selectors and the cascade.
pub trait Styleable {
    /// Type selector name, e.g. `Button`.
    fn type_selector(&self) -> &str;

    fn id(&self) -> Option<&str>;

    fn style_classes(&self) -> &[String];

    fn pseudo_class_states(&self) -> &PseudoClassState;

    /// Declarations of the node's `style` attribute, without braces.
    fn inline_style(&self) -> Option<&str> {
        None
    }

    /// True if application code set `property` directly, in which case
    /// user-agent styles and inherited values must not override it.
    fn is_user_set(&self, _property: &str) -> bool {
        false
    }
}

/// A node followed by its ancestors, nearest first.
pub type StyleChain<'a> = [&'a dyn Styleable];

// ---------------------------------------------------------------------------
// Plain node
// ---------------------------------------------------------------------------

/// Self-contained [`Styleable`] for hosts without their own node type, and
/// for tests.
#[derive(Clone, Debug, Default)]
pub struct StyleableNode {
    type_selector: String,
    id: Option<String>,
    style_classes: Vec<String>,
    states: PseudoClassState,
    inline_style: Option<String>,
    user_set: BTreeSet<String>,
}

impl StyleableNode {
    #[must_use]
    pub fn new(type_selector: impl Into<String>) -> Self {
        Self {
            type_selector: type_selector.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_style_class(class);
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.inline_style = Some(style.into());
        self
    }

    /// Turn on the named pseudo-class, registering it if needed.
    pub fn with_pseudo_class(
        mut self,
        registry: &PseudoClassRegistry,
        name: &str,
    ) -> Result<Self, CssError> {
        self.set_pseudo_class(registry, name, true)?;
        Ok(self)
    }

    pub fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    pub fn add_style_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !self.style_classes.contains(&class) {
            self.style_classes.push(class);
        }
    }

    pub fn remove_style_class(&mut self, class: &str) {
        self.style_classes.retain(|c| c != class);
    }

    pub fn set_pseudo_class(
        &mut self,
        registry: &PseudoClassRegistry,
        name: &str,
        active: bool,
    ) -> Result<(), CssError> {
        let pc = registry.get_or_register(name)?;
        if active {
            self.states.insert(&pc);
        } else {
            self.states.remove(&pc);
        }
        Ok(())
    }

    pub fn set_style(&mut self, style: Option<String>) {
        self.inline_style = style;
    }

    /// Record that `property` was set by application code.
    pub fn mark_user_set(&mut self, property: &str) {
        self.user_set.insert(property.to_ascii_lowercase());
    }
}

impl Styleable for StyleableNode {
    fn type_selector(&self) -> &str {
        &self.type_selector
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn style_classes(&self) -> &[String] {
        &self.style_classes
    }

    fn pseudo_class_states(&self) -> &PseudoClassState {
        &self.states
    }

    fn inline_style(&self) -> Option<&str> {
        self.inline_style.as_deref()
    }

    fn is_user_set(&self, property: &str) -> bool {
        self.user_set.contains(property)
    }
}
