#![forbid(unsafe_code)]

//! Stylesheet model: origins, declarations, rules.
//!
//! # Invariants
//!
//! A [`Rule`] reports the origin of the stylesheet it is attached to and
//! `None` while detached. Rules enter a sheet only through
//! [`Stylesheet::add_rule`] and leave through [`Stylesheet::remove_rule`],
//! which set and clear the origin respectively.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::selector::Selector;
use crate::value::ParsedValue;

/// Precedence tier of a stylesheet, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StyleOrigin {
    /// Default styles shipped with the toolkit.
    UserAgent,
    /// Values set from application code.
    User,
    /// Application stylesheets.
    Author,
    /// A node's `style` attribute.
    Inline,
}

impl fmt::Display for StyleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UserAgent => "user-agent",
            Self::User => "user",
            Self::Author => "author",
            Self::Inline => "inline",
        })
    }
}

/// `property: value [!important]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Declaration {
    /// Lowercased property name.
    pub property: String,
    pub value: ParsedValue,
    pub important: bool,
}

impl Declaration {
    #[must_use]
    pub fn new(property: &str, value: ParsedValue) -> Self {
        Self {
            property: property.to_ascii_lowercase(),
            value,
            important: false,
        }
    }

    #[must_use]
    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)?;
        if self.important {
            f.write_str(" !important")?;
        }
        Ok(())
    }
}

/// Selector group plus declaration block.
#[derive(Debug)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
    origin: Cell<Option<StyleOrigin>>,
}

impl Rule {
    #[must_use]
    pub fn new(selectors: Vec<Selector>, declarations: Vec<Declaration>) -> Self {
        Self {
            selectors,
            declarations,
            origin: Cell::new(None),
        }
    }

    /// Origin of the owning stylesheet, `None` while detached.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Option<StyleOrigin> {
        self.origin.get()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sel) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{sel}")?;
        }
        f.write_str(" {")?;
        for decl in &self.declarations {
            write!(f, " {decl};")?;
        }
        f.write_str(" }")
    }
}

/// Ordered rules sharing one origin.
#[derive(Debug)]
pub struct Stylesheet {
    origin: StyleOrigin,
    url: Option<String>,
    rules: Vec<Rc<Rule>>,
}

impl Stylesheet {
    #[must_use]
    pub fn new(origin: StyleOrigin) -> Self {
        Self {
            origin,
            url: None,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> StyleOrigin {
        self.origin
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    #[must_use]
    pub fn rules(&self) -> &[Rc<Rule>] {
        &self.rules
    }

    /// Append `rule`, fixing its origin to this sheet's.
    pub fn add_rule(&mut self, rule: Rule) -> Rc<Rule> {
        rule.origin.set(Some(self.origin));
        let rule = Rc::new(rule);
        self.rules.push(Rc::clone(&rule));
        rule
    }

    /// Detach the rule at `index`, clearing its origin.
    pub fn remove_rule(&mut self, index: usize) -> Option<Rc<Rule>> {
        if index >= self.rules.len() {
            return None;
        }
        let rule = self.rules.remove(index);
        rule.origin.set(None);
        Some(rule)
    }
}
