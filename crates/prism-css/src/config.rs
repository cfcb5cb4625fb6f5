#![forbid(unsafe_code)]

//! Style engine configuration.
//!
//! Defaults suit a typical scene; every knob can be overridden from the
//! environment:
//!
//! - `PRISM_CSS_PSEUDO_CLASS_CAPACITY` (usize, >= 1)
//! - `PRISM_CSS_STYLE_CACHE_CAPACITY` (usize, >= 1)
//! - `PRISM_CSS_STYLE_MAP_CAPACITY` (usize, >= 1)
//! - `PRISM_CSS_CACHE_ENABLED` (bool)
//! - `PRISM_CSS_DEFAULT_FONT_SIZE` (f64 px, > 0)
//! - `PRISM_CSS_MAX_LOOKUP_DEPTH` (usize, >= 1)

use std::env;
use std::fmt;

const ENV_PSEUDO_CLASS_CAPACITY: &str = "PRISM_CSS_PSEUDO_CLASS_CAPACITY";
const ENV_STYLE_CACHE_CAPACITY: &str = "PRISM_CSS_STYLE_CACHE_CAPACITY";
const ENV_STYLE_MAP_CAPACITY: &str = "PRISM_CSS_STYLE_MAP_CAPACITY";
const ENV_CACHE_ENABLED: &str = "PRISM_CSS_CACHE_ENABLED";
const ENV_DEFAULT_FONT_SIZE: &str = "PRISM_CSS_DEFAULT_FONT_SIZE";
const ENV_MAX_LOOKUP_DEPTH: &str = "PRISM_CSS_MAX_LOOKUP_DEPTH";

/// Tunables for [`StyleEngine`](crate::StyleEngine) and
/// [`PseudoClassRegistry`](crate::PseudoClassRegistry).
#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    /// Maximum number of distinct pseudo-class names.
    pub pseudo_class_capacity: usize,
    /// Entries kept by the resolved-value LRU cache.
    pub style_cache_capacity: usize,
    /// Style maps kept per engine, and separately parsed inline styles.
    pub style_map_capacity: usize,
    /// Whether resolved values are cached at all.
    pub cache_enabled: bool,
    /// Font size in px used when no font is styled.
    pub default_font_size: f64,
    /// Bound on nested looked-up value resolution.
    pub max_lookup_depth: usize,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            pseudo_class_capacity: 1024,
            style_cache_capacity: 4096,
            style_map_capacity: 1024,
            cache_enabled: true,
            default_font_size: 13.0,
            max_lookup_depth: 16,
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct StyleConfigParse {
    pub config: StyleConfig,
    pub errors: Vec<StyleConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl StyleConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for StyleConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for StyleConfigError {}

impl StyleConfig {
    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> StyleConfig {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> StyleConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<StyleConfigError>> {
        let mut errors = Vec::new();
        validate_positive("pseudo_class_capacity", self.pseudo_class_capacity, &mut errors);
        validate_positive("style_cache_capacity", self.style_cache_capacity, &mut errors);
        validate_positive("style_map_capacity", self.style_map_capacity, &mut errors);
        validate_positive("max_lookup_depth", self.max_lookup_depth, &mut errors);
        if !(self.default_font_size.is_finite() && self.default_font_size > 0.0) {
            errors.push(StyleConfigError::new(
                "default_font_size",
                self.default_font_size.to_string(),
                "must be a finite number > 0",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn from_env_with<F>(mut get: F) -> StyleConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = StyleConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_PSEUDO_CLASS_CAPACITY) {
        match parse_usize(&value) {
            Some(parsed) => config.pseudo_class_capacity = parsed,
            None => errors.push(StyleConfigError::new(
                "pseudo_class_capacity",
                value,
                "expected positive integer",
            )),
        }
    }

    if let Some(value) = get(ENV_STYLE_CACHE_CAPACITY) {
        match parse_usize(&value) {
            Some(parsed) => config.style_cache_capacity = parsed,
            None => errors.push(StyleConfigError::new(
                "style_cache_capacity",
                value,
                "expected positive integer",
            )),
        }
    }

    if let Some(value) = get(ENV_STYLE_MAP_CAPACITY) {
        match parse_usize(&value) {
            Some(parsed) => config.style_map_capacity = parsed,
            None => errors.push(StyleConfigError::new(
                "style_map_capacity",
                value,
                "expected positive integer",
            )),
        }
    }

    if let Some(value) = get(ENV_CACHE_ENABLED) {
        match parse_bool(&value) {
            Some(parsed) => config.cache_enabled = parsed,
            None => errors.push(StyleConfigError::new(
                "cache_enabled",
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }

    if let Some(value) = get(ENV_DEFAULT_FONT_SIZE) {
        match value.trim().parse::<f64>() {
            Ok(parsed) => config.default_font_size = parsed,
            Err(_) => errors.push(StyleConfigError::new(
                "default_font_size",
                value,
                "expected number",
            )),
        }
    }

    if let Some(value) = get(ENV_MAX_LOOKUP_DEPTH) {
        match parse_usize(&value) {
            Some(parsed) => config.max_lookup_depth = parsed,
            None => errors.push(StyleConfigError::new(
                "max_lookup_depth",
                value,
                "expected positive integer",
            )),
        }
    }

    if let Err(mut validation) = config.validate() {
        errors.append(&mut validation);
    }

    StyleConfigParse { config, errors }
}

#[inline]
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[inline]
fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

fn validate_positive(field: &'static str, value: usize, errors: &mut Vec<StyleConfigError>) {
    if value == 0 {
        errors.push(StyleConfigError::new(
            field,
            value.to_string(),
            "must be >= 1",
        ));
    }
}
