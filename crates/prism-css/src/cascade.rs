#![forbid(unsafe_code)]

//! Cascade precedence.
//!
//! A [`CascadingStyle`] is one declaration reached through one matching
//! selector. Styles are totally ordered by precedence; the greatest wins:
//!
//! 1. `!important` over normal declarations;
//! 2. origin: inline > author > user > user-agent;
//! 3. selector specificity;
//! 4. source order of the selector (later wins);
//! 5. position of the declaration within its rule (later wins).

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::selector::{Selector, Specificity};
use crate::stylesheet::{Declaration, Rule, StyleOrigin};
use crate::value::ParsedValue;

/// A declaration paired with the selector that made it apply.
#[derive(Clone)]
pub struct CascadingStyle {
    rule: Rc<Rule>,
    selector_index: usize,
    declaration_index: usize,
    origin: StyleOrigin,
    specificity: Specificity,
    ordinal: usize,
}

impl CascadingStyle {
    pub(crate) fn new(
        rule: Rc<Rule>,
        selector_index: usize,
        declaration_index: usize,
        origin: StyleOrigin,
        ordinal: usize,
    ) -> Self {
        let specificity = rule.selectors[selector_index].specificity();
        Self {
            rule,
            selector_index,
            declaration_index,
            origin,
            specificity,
            ordinal,
        }
    }

    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.rule.selectors[self.selector_index]
    }

    #[must_use]
    pub fn declaration(&self) -> &Declaration {
        &self.rule.declarations[self.declaration_index]
    }

    #[must_use]
    pub fn property(&self) -> &str {
        &self.declaration().property
    }

    #[must_use]
    pub fn value(&self) -> &ParsedValue {
        &self.declaration().value
    }

    #[must_use]
    pub fn is_important(&self) -> bool {
        self.declaration().important
    }

    #[must_use]
    pub fn origin(&self) -> StyleOrigin {
        self.origin
    }

    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Source order of the selector across the engine's stylesheets.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    fn precedence(&self) -> (bool, StyleOrigin, Specificity, usize, usize) {
        (
            self.is_important(),
            self.origin,
            self.specificity,
            self.ordinal,
            self.declaration_index,
        )
    }
}

impl PartialEq for CascadingStyle {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CascadingStyle {}

impl PartialOrd for CascadingStyle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CascadingStyle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence().cmp(&other.precedence())
    }
}

impl fmt::Debug for CascadingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadingStyle")
            .field("selector", &self.selector().to_string())
            .field("declaration", &self.declaration().to_string())
            .field("origin", &self.origin)
            .field("specificity", &self.specificity)
            .field("ordinal", &self.ordinal)
            .finish()
    }
}

impl fmt::Display for CascadingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ {} }} ({})", self.selector(), self.declaration(), self.origin)
    }
}

/// Sort greatest precedence first.
pub(crate) fn sort_by_precedence(styles: &mut [CascadingStyle]) {
    styles.sort_by(|a, b| b.cmp(a));
}
