#![forbid(unsafe_code)]

//! Parsed and converted style values.
//!
//! The parser produces [`ParsedValue`] trees. Converters turn those into
//! typed [`StyleValue`]s, and the engine wraps the result with its cascade
//! metadata as a [`CalculatedValue`].

use std::fmt;

use crate::stylesheet::StyleOrigin;

/// Pixels per inch used for absolute length units.
pub const DPI: f64 = 96.0;

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

/// Unit suffix of a [`Size`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SizeUnits {
    Px,
    Pt,
    Pc,
    In,
    Cm,
    Mm,
    Em,
    Ex,
    Percent,
    Deg,
    Rad,
    Grad,
    Turn,
    S,
    Ms,
}

impl SizeUnits {
    /// Map a unit suffix (case-insensitive) to its unit.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let units = match suffix.to_ascii_lowercase().as_str() {
            "px" => Self::Px,
            "pt" => Self::Pt,
            "pc" => Self::Pc,
            "in" => Self::In,
            "cm" => Self::Cm,
            "mm" => Self::Mm,
            "em" => Self::Em,
            "ex" => Self::Ex,
            "%" => Self::Percent,
            "deg" => Self::Deg,
            "rad" => Self::Rad,
            "grad" => Self::Grad,
            "turn" => Self::Turn,
            "s" => Self::S,
            "ms" => Self::Ms,
            _ => return None,
        };
        Some(units)
    }

    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Pt => "pt",
            Self::Pc => "pc",
            Self::In => "in",
            Self::Cm => "cm",
            Self::Mm => "mm",
            Self::Em => "em",
            Self::Ex => "ex",
            Self::Percent => "%",
            Self::Deg => "deg",
            Self::Rad => "rad",
            Self::Grad => "grad",
            Self::Turn => "turn",
            Self::S => "s",
            Self::Ms => "ms",
        }
    }

    /// True for units whose length depends on a font or a reference size.
    #[must_use]
    pub fn is_relative(self) -> bool {
        matches!(self, Self::Em | Self::Ex | Self::Percent)
    }
}

/// A number with a unit.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub value: f64,
    pub units: SizeUnits,
}

impl Size {
    #[must_use]
    pub const fn new(value: f64, units: SizeUnits) -> Self {
        Self { value, units }
    }

    #[must_use]
    pub const fn px(value: f64) -> Self {
        Self::new(value, SizeUnits::Px)
    }

    #[must_use]
    pub fn is_relative(&self) -> bool {
        self.units.is_relative()
    }

    /// Length in pixels.
    ///
    /// `multiplier` is the reference for percentages (100% == multiplier);
    /// `font_size` is the reference for `em` and `ex`. Angle and time units
    /// have no length and return their raw value.
    #[must_use]
    pub fn pixels_with(&self, multiplier: f64, font_size: f64) -> f64 {
        let v = self.value;
        match self.units {
            SizeUnits::Px => v,
            SizeUnits::Pt => v * DPI / 72.0,
            SizeUnits::Pc => v * DPI / 6.0,
            SizeUnits::In => v * DPI,
            SizeUnits::Cm => v * DPI / 2.54,
            SizeUnits::Mm => v * DPI / 25.4,
            SizeUnits::Em => v * font_size,
            SizeUnits::Ex => v * font_size / 2.0,
            SizeUnits::Percent => v / 100.0 * multiplier,
            SizeUnits::Deg
            | SizeUnits::Rad
            | SizeUnits::Grad
            | SizeUnits::Turn
            | SizeUnits::S
            | SizeUnits::Ms => v,
        }
    }

    /// Length in pixels with percentages taken relative to 1.0.
    #[must_use]
    pub fn pixels(&self, font_size: f64) -> f64 {
        self.pixels_with(1.0, font_size)
    }

    /// Angle in degrees, or `None` for a non-angle unit.
    #[must_use]
    pub fn degrees(&self) -> Option<f64> {
        let v = self.value;
        match self.units {
            SizeUnits::Deg => Some(v),
            SizeUnits::Rad => Some(v.to_degrees()),
            SizeUnits::Grad => Some(v * 0.9),
            SizeUnits::Turn => Some(v * 360.0),
            _ => None,
        }
    }

    /// Duration in milliseconds, or `None` for a non-time unit.
    #[must_use]
    pub fn millis(&self) -> Option<f64> {
        match self.units {
            SizeUnits::S => Some(self.value * 1000.0),
            SizeUnits::Ms => Some(self.value),
            _ => None,
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.units.suffix())
    }
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// sRGB color with alpha in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `rgb`, `rrggbb` or `rrggbbaa` hex digits (without `#`).
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digit = |i: usize| u8::from_str_radix(hex.get(i..=i)?, 16).ok();
        let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            3 => Some(Self::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
            6 => Some(Self::rgb(pair(0)?, pair(2)?, pair(4)?)),
            8 => Some(Self::rgba(
                pair(0)?,
                pair(2)?,
                pair(4)?,
                f64::from(pair(6)?) / 255.0,
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if (self.a - 1.0).abs() < f64::EPSILON {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
        }
    }
}

// ---------------------------------------------------------------------------
// Parsed values
// ---------------------------------------------------------------------------

/// Value of a declaration as written, before conversion.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParsedValue {
    /// Bare identifier: a keyword, or a reference to another property.
    Ident(String),
    /// Quoted string.
    String(String),
    /// Unitless number.
    Number(f64),
    Size(Size),
    Color(Color),
    /// Space-separated terms.
    Series(Vec<ParsedValue>),
    /// Comma-separated layers.
    Layers(Vec<ParsedValue>),
    /// The `inherit` keyword.
    Inherit,
}

impl ParsedValue {
    /// True for the `null` and `none` keywords.
    #[must_use]
    pub fn is_null_keyword(&self) -> bool {
        matches!(
            self,
            Self::Ident(s) if s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("none")
        )
    }

    /// True if the value, or any term inside it, is an identifier that may
    /// name another property.
    #[must_use]
    pub fn contains_idents(&self) -> bool {
        match self {
            Self::Ident(_) => true,
            Self::Series(items) | Self::Layers(items) => items.iter().any(Self::contains_idents),
            _ => false,
        }
    }

    /// True if any size term uses a font-relative unit.
    #[must_use]
    pub fn is_relative(&self) -> bool {
        match self {
            Self::Size(size) => size.is_relative(),
            Self::Series(items) | Self::Layers(items) => items.iter().any(Self::is_relative),
            _ => false,
        }
    }
}

impl fmt::Display for ParsedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[ParsedValue], sep: &str) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }
        match self {
            Self::Ident(s) => f.write_str(s),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Number(n) => write!(f, "{n}"),
            Self::Size(s) => write!(f, "{s}"),
            Self::Color(c) => write!(f, "{c}"),
            Self::Series(items) => join(f, items, " "),
            Self::Layers(items) => join(f, items, ", "),
            Self::Inherit => f.write_str("inherit"),
        }
    }
}

// ---------------------------------------------------------------------------
// Converted values
// ---------------------------------------------------------------------------

/// Slant of a font.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FontPosture {
    #[default]
    Regular,
    Italic,
    Oblique,
}

/// Resolved font.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Font {
    pub family: String,
    /// Size in pixels.
    pub size: f64,
    /// CSS weight, 100 to 900.
    pub weight: u16,
    pub posture: FontPosture,
}

impl Font {
    #[must_use]
    pub fn with_size(size: f64) -> Self {
        Self {
            family: "System".to_string(),
            size,
            weight: 400,
            posture: FontPosture::Regular,
        }
    }
}

/// Four-sided offsets in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    #[must_use]
    pub const fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

/// Typed output of a converter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StyleValue {
    /// Explicit `null` / `none`.
    Null,
    Boolean(bool),
    /// Plain number; lengths are already in pixels, angles in degrees and
    /// durations in milliseconds.
    Number(f64),
    String(String),
    /// Keyword, lowercased.
    Enum(String),
    Color(Color),
    Font(Font),
    Insets(Insets),
    /// One entry per layer.
    List(Vec<StyleValue>),
}

impl StyleValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_font(&self) -> Option<&Font> {
        match self {
            Self::Font(font) => Some(font),
            _ => None,
        }
    }
}

/// A converted value with the cascade information that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct CalculatedValue {
    pub value: StyleValue,
    /// Origin of the winning declaration; the highest origin involved for
    /// values assembled from sub-properties or looked-up references.
    pub origin: StyleOrigin,
    /// True if a font-relative unit took part in the value.
    pub relative: bool,
    /// True if the value came from an ancestor.
    pub inherited: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_units_convert_to_pixels() {
        assert_eq!(Size::new(12.0, SizeUnits::Pt).pixels(13.0), 16.0);
        assert_eq!(Size::new(1.0, SizeUnits::In).pixels(13.0), 96.0);
        assert_eq!(Size::new(1.0, SizeUnits::Pc).pixels(13.0), 16.0);
        assert!((Size::new(2.54, SizeUnits::Cm).pixels(13.0) - 96.0).abs() < 1e-9);
    }

    #[test]
    fn relative_units_use_font_and_multiplier() {
        assert_eq!(Size::new(2.0, SizeUnits::Em).pixels(10.0), 20.0);
        assert_eq!(Size::new(2.0, SizeUnits::Ex).pixels(10.0), 10.0);
        assert_eq!(Size::new(50.0, SizeUnits::Percent).pixels_with(30.0, 10.0), 15.0);
        assert!(SizeUnits::Em.is_relative());
        assert!(!SizeUnits::Px.is_relative());
    }

    #[test]
    fn angles_and_durations() {
        assert_eq!(Size::new(0.5, SizeUnits::Turn).degrees(), Some(180.0));
        assert_eq!(Size::new(100.0, SizeUnits::Grad).degrees(), Some(90.0));
        assert_eq!(Size::new(1.5, SizeUnits::S).millis(), Some(1500.0));
        assert_eq!(Size::px(3.0).degrees(), None);
    }

    #[test]
    fn hex_colors() {
        assert_eq!(Color::from_hex("fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("ff0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::from_hex("00000000"), Some(Color::TRANSPARENT));
        assert_eq!(Color::from_hex("ggg"), None);
        assert_eq!(Color::from_hex("ffff"), None);
        assert_eq!(Color::rgb(1, 2, 255).to_string(), "#0102ff");
    }

    #[test]
    fn parsed_value_queries() {
        let v = ParsedValue::Layers(vec![
            ParsedValue::Series(vec![ParsedValue::Ident("-fx-base".into())]),
            ParsedValue::Size(Size::new(1.0, SizeUnits::Em)),
        ]);
        assert!(v.contains_idents());
        assert!(v.is_relative());
        assert_eq!(v.to_string(), "-fx-base, 1em");
        assert!(ParsedValue::Ident("NONE".into()).is_null_keyword());
    }
}
