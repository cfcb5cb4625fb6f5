#![forbid(unsafe_code)]

//! Selectors and specificity.
//!
//! A [`SimpleSelector`] tests one node: type name (or `*`), optional id,
//! style classes and required pseudo-classes. A [`CompoundSelector`] chains
//! simple selectors left to right with [`Combinator`]s; its last element is
//! the subject.
//!
//! Matching is split in two, in the order the cascade needs it:
//!
//! * [`Selector::applies`] checks identity only (type, id, classes) for the
//!   subject and its ancestors. This result is stable while the node's
//!   identity and the stylesheets stay the same, so it is what the engine
//!   caches.
//! * [`Selector::state_matches`] additionally checks pseudo-class states at
//!   every matched level, and runs on each lookup.

use std::cmp::Ordering;
use std::fmt;

use crate::pseudo_class::PseudoClassState;
use crate::styleable::{StyleChain, Styleable};

/// Relationship between two adjacent selectors of a compound selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Combinator {
    /// Whitespace: any ancestor.
    Descendant,
    /// `>`: the direct parent.
    Child,
}

/// Specificity as `(ids, classes + pseudo-classes, types)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Specificity {
    pub ids: u32,
    pub classes: u32,
    pub types: u32,
}

impl Specificity {
    #[must_use]
    pub const fn new(ids: u32, classes: u32, types: u32) -> Self {
        Self {
            ids,
            classes,
            types,
        }
    }

    fn add(self, other: Specificity) -> Specificity {
        Specificity {
            ids: self.ids + other.ids,
            classes: self.classes + other.classes,
            types: self.types + other.types,
        }
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ids
            .cmp(&other.ids)
            .then(self.classes.cmp(&other.classes))
            .then(self.types.cmp(&other.types))
    }
}

// ---------------------------------------------------------------------------
// Simple selectors
// ---------------------------------------------------------------------------

/// Predicate over a single node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleSelector {
    /// Type name, or `*` for any type.
    pub name: String,
    pub id: Option<String>,
    pub style_classes: Vec<String>,
    /// Required pseudo-classes.
    pub pseudo_classes: PseudoClassState,
    /// Pseudo-class names as written, for display.
    pub pseudo_class_names: Vec<String>,
}

impl SimpleSelector {
    /// The universal selector `*`.
    #[must_use]
    pub fn universal() -> Self {
        Self::of_type("*")
    }

    #[must_use]
    pub fn of_type(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            style_classes: Vec::new(),
            pseudo_classes: PseudoClassState::new(),
            pseudo_class_names: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_universal(&self) -> bool {
        self.name == "*"
    }

    /// Type, id and classes match; pseudo-classes are not consulted.
    #[must_use]
    pub fn applies(&self, node: &dyn Styleable) -> bool {
        if !self.is_universal() && self.name != node.type_selector() {
            return false;
        }
        if let Some(id) = &self.id
            && node.id() != Some(id.as_str())
        {
            return false;
        }
        let classes = node.style_classes();
        self.style_classes.iter().all(|c| classes.contains(c))
    }

    /// The node is in every required pseudo-class.
    #[must_use]
    pub fn state_matches(&self, node: &dyn Styleable) -> bool {
        node.pseudo_class_states().is_superset_of(&self.pseudo_classes)
    }

    #[must_use]
    pub fn specificity(&self) -> Specificity {
        Specificity::new(
            u32::from(self.id.is_some()),
            (self.style_classes.len() + self.pseudo_class_names.len()) as u32,
            u32::from(!self.is_universal()),
        )
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bare = self.id.is_none()
            && self.style_classes.is_empty()
            && self.pseudo_class_names.is_empty();
        if !self.is_universal() || bare {
            f.write_str(&self.name)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.style_classes {
            write!(f, ".{class}")?;
        }
        for pc in &self.pseudo_class_names {
            write!(f, ":{pc}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Compound selectors
// ---------------------------------------------------------------------------

/// Simple selectors joined by combinators; the last one is the subject.
///
/// `relationships[i]` joins `selectors[i]` and `selectors[i + 1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompoundSelector {
    pub selectors: Vec<SimpleSelector>,
    pub relationships: Vec<Combinator>,
}

impl CompoundSelector {
    /// Build from parts.
    ///
    /// # Panics
    ///
    /// Panics if `selectors` is empty or `relationships` is not exactly one
    /// shorter than `selectors`.
    #[must_use]
    pub fn new(selectors: Vec<SimpleSelector>, relationships: Vec<Combinator>) -> Self {
        assert!(!selectors.is_empty(), "compound selector needs a subject");
        assert_eq!(
            relationships.len() + 1,
            selectors.len(),
            "one combinator between each pair of selectors"
        );
        Self {
            selectors,
            relationships,
        }
    }

    fn subject(&self) -> &SimpleSelector {
        &self.selectors[self.selectors.len() - 1]
    }

    /// Match `selectors[..=sel]` with `selectors[sel]` on `chain[node]`.
    fn matches_at(&self, sel: usize, chain: &StyleChain<'_>, node: usize, states: bool) -> bool {
        let Some(&candidate) = chain.get(node) else {
            return false;
        };
        let simple = &self.selectors[sel];
        if !simple.applies(candidate) || (states && !simple.state_matches(candidate)) {
            return false;
        }
        if sel == 0 {
            return true;
        }
        match self.relationships[sel - 1] {
            Combinator::Child => self.matches_at(sel - 1, chain, node + 1, states),
            Combinator::Descendant => {
                (node + 1..chain.len()).any(|anc| self.matches_at(sel - 1, chain, anc, states))
            }
        }
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sel) in self.selectors.iter().enumerate() {
            if i > 0 {
                match self.relationships[i - 1] {
                    Combinator::Descendant => f.write_str(" ")?,
                    Combinator::Child => f.write_str(" > ")?,
                }
            }
            write!(f, "{sel}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// A selector as it appears in a rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    Simple(SimpleSelector),
    Compound(CompoundSelector),
}

impl Selector {
    /// The selector that tests the styled node itself.
    #[must_use]
    pub fn subject(&self) -> &SimpleSelector {
        match self {
            Self::Simple(s) => s,
            Self::Compound(c) => c.subject(),
        }
    }

    /// Identity match of `chain[0]` and, for compound selectors, of the
    /// ancestors the combinators require.
    #[must_use]
    pub fn applies(&self, chain: &StyleChain<'_>) -> bool {
        match self {
            Self::Simple(s) => chain.first().is_some_and(|&node| s.applies(node)),
            Self::Compound(c) => c.matches_at(c.selectors.len() - 1, chain, 0, false),
        }
    }

    /// Identity and pseudo-class match at every level.
    #[must_use]
    pub fn state_matches(&self, chain: &StyleChain<'_>) -> bool {
        match self {
            Self::Simple(s) => chain
                .first()
                .is_some_and(|&node| s.applies(node) && s.state_matches(node)),
            Self::Compound(c) => c.matches_at(c.selectors.len() - 1, chain, 0, true),
        }
    }

    #[must_use]
    pub fn specificity(&self) -> Specificity {
        match self {
            Self::Simple(s) => s.specificity(),
            Self::Compound(c) => c
                .selectors
                .iter()
                .fold(Specificity::default(), |acc, s| acc.add(s.specificity())),
        }
    }

    /// Every pseudo-class referenced anywhere in the selector.
    #[must_use]
    pub fn pseudo_classes(&self) -> PseudoClassState {
        match self {
            Self::Simple(s) => s.pseudo_classes.clone(),
            Self::Compound(c) => {
                let mut all = PseudoClassState::new();
                for s in &c.selectors {
                    all.union_with(&s.pseudo_classes);
                }
                all
            }
        }
    }
}

impl From<SimpleSelector> for Selector {
    fn from(s: SimpleSelector) -> Self {
        Self::Simple(s)
    }
}

impl From<CompoundSelector> for Selector {
    fn from(c: CompoundSelector) -> Self {
        Self::Compound(c)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(s) => write!(f, "{s}"),
            Self::Compound(c) => write!(f, "{c}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pseudo_class::PseudoClassRegistry;
    use crate::styleable::StyleableNode;

    fn class(name: &str, class: &str) -> SimpleSelector {
        let mut s = SimpleSelector::of_type(name);
        s.style_classes.push(class.to_string());
        s
    }

    #[test]
    fn simple_identity() {
        let node = StyleableNode::new("Button").with_id("ok").with_class("button");
        let chain: [&dyn Styleable; 1] = [&node];

        assert!(Selector::from(SimpleSelector::universal()).applies(&chain));
        assert!(Selector::from(class("Button", "button")).applies(&chain));
        assert!(!Selector::from(class("Label", "button")).applies(&chain));
        assert!(!Selector::from(class("*", "missing")).applies(&chain));

        let mut by_id = SimpleSelector::universal();
        by_id.id = Some("cancel".into());
        assert!(!Selector::from(by_id).applies(&chain));
    }

    #[test]
    fn pseudo_classes_gate_state_match_only() {
        let reg = PseudoClassRegistry::default();
        let hover = reg.get_or_register("hover").unwrap();
        let mut sel = class("*", "button");
        sel.pseudo_classes.insert(&hover);
        sel.pseudo_class_names.push("hover".into());
        let sel = Selector::from(sel);

        let mut node = StyleableNode::new("Button").with_class("button");
        assert!(sel.applies(&[&node as &dyn Styleable]));
        assert!(!sel.state_matches(&[&node as &dyn Styleable]));
        node.set_pseudo_class(&reg, "hover", true).unwrap();
        assert!(sel.state_matches(&[&node as &dyn Styleable]));
    }

    #[test]
    fn descendant_and_child_combinators() {
        let root = StyleableNode::new("VBox").with_class("root");
        let pane = StyleableNode::new("HBox");
        let leaf = StyleableNode::new("Label");
        let chain: [&dyn Styleable; 3] = [&leaf, &pane, &root];

        let descendant = Selector::from(CompoundSelector::new(
            vec![class("*", "root"), SimpleSelector::of_type("Label")],
            vec![Combinator::Descendant],
        ));
        assert!(descendant.applies(&chain));

        let child = Selector::from(CompoundSelector::new(
            vec![class("*", "root"), SimpleSelector::of_type("Label")],
            vec![Combinator::Child],
        ));
        assert!(!child.applies(&chain));

        let nested = Selector::from(CompoundSelector::new(
            vec![
                class("*", "root"),
                SimpleSelector::of_type("HBox"),
                SimpleSelector::of_type("Label"),
            ],
            vec![Combinator::Descendant, Combinator::Child],
        ));
        assert!(nested.applies(&chain));
        assert!(!nested.applies(&chain[..2]));
    }

    #[test]
    fn descendant_backtracks() {
        // `.a > .b .c`: the nearest `.b` has no `.a` parent, the outer one does.
        let a = StyleableNode::new("P").with_class("a");
        let b_outer = StyleableNode::new("P").with_class("b");
        let b_inner = StyleableNode::new("P").with_class("b");
        let c = StyleableNode::new("P").with_class("c");
        let chain: [&dyn Styleable; 4] = [&c, &b_inner, &b_outer, &a];
        let sel = Selector::from(CompoundSelector::new(
            vec![class("*", "a"), class("*", "b"), class("*", "c")],
            vec![Combinator::Child, Combinator::Descendant],
        ));
        assert!(sel.applies(&chain));
    }

    #[test]
    fn specificity_orders_ids_over_classes_over_types() {
        let mut id = SimpleSelector::universal();
        id.id = Some("x".into());
        let typed = SimpleSelector::of_type("Button");
        let classed = class("*", "button");

        let s_id = Selector::from(id).specificity();
        let s_class = Selector::from(classed).specificity();
        let s_type = Selector::from(typed).specificity();
        assert!(s_id > s_class && s_class > s_type);
        let universal = Selector::from(SimpleSelector::universal());
        assert_eq!(universal.specificity(), Specificity::default());

        let compound = Selector::from(CompoundSelector::new(
            vec![class("VBox", "root"), SimpleSelector::of_type("Label")],
            vec![Combinator::Descendant],
        ));
        assert_eq!(compound.specificity(), Specificity::new(0, 1, 2));
    }

    #[test]
    fn display_round_trips_shape() {
        let mut s = class("Button", "ok");
        s.id = Some("go".into());
        s.pseudo_class_names.push("hover".into());
        assert_eq!(s.to_string(), "Button#go.ok:hover");
        assert_eq!(class("*", "x").to_string(), ".x");
        assert_eq!(SimpleSelector::universal().to_string(), "*");

        let c = CompoundSelector::new(
            vec![class("*", "root"), SimpleSelector::of_type("Label")],
            vec![Combinator::Child],
        );
        assert_eq!(c.to_string(), ".root > Label");
    }
}
