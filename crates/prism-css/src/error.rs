#![forbid(unsafe_code)]

//! Error type shared by the stylesheet parser, the pseudo-class registry and
//! the cascade.

use std::fmt;

/// Errors raised while parsing, registering, or resolving styles.
///
/// Only [`PseudoClassOverflow`](CssError::PseudoClassOverflow) and
/// [`UnknownProperty`](CssError::UnknownProperty) ever reach callers of the
/// cascade. Conversion and lookup failures are logged and the property is
/// left unstyled; parse errors are collected next to the partial stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssError {
    /// The pseudo-class registry is full.
    PseudoClassOverflow { capacity: usize },
    /// A rule or declaration could not be parsed and was dropped.
    Parse { line: usize, message: String },
    /// A declared value could not be converted for its property.
    Conversion { property: String, message: String },
    /// The property has no registered metadata.
    UnknownProperty(String),
    /// A looked-up value did not resolve, or resolved in a cycle.
    UnresolvedLookup(String),
}

impl CssError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn conversion(property: &str, message: impl Into<String>) -> Self {
        Self::Conversion {
            property: property.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PseudoClassOverflow { capacity } => {
                write!(f, "pseudo-class registry full ({capacity} entries)")
            }
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
            Self::Conversion { property, message } => {
                write!(f, "cannot convert value of '{property}': {message}")
            }
            Self::UnknownProperty(name) => write!(f, "unknown property: {name}"),
            Self::UnresolvedLookup(name) => write!(f, "unresolved lookup: {name}"),
        }
    }
}

impl std::error::Error for CssError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            CssError::PseudoClassOverflow { capacity: 4 }.to_string(),
            "pseudo-class registry full (4 entries)"
        );
        assert_eq!(
            CssError::parse(3, "expected '{'").to_string(),
            "parse error at line 3: expected '{'"
        );
        assert_eq!(
            CssError::conversion("-fx-opacity", "expected number").to_string(),
            "cannot convert value of '-fx-opacity': expected number"
        );
    }
}
