#![forbid(unsafe_code)]

//! Value converters: [`ParsedValue`] to typed [`StyleValue`].
//!
//! Each property's metadata names one converter. Converters are pure; any
//! contextual input (the font size that relative units refer to) arrives
//! through [`ConvertContext`].
//!
//! Composite converters ([`FontConverter`]) additionally assemble a value
//! from already converted sub-property values and take one apart again.

use std::fmt;

use crate::error::CssError;
use crate::value::{Color, Font, FontPosture, Insets, ParsedValue, StyleValue};

/// Sub-property names of the `-fx-font` shorthand.
pub const FONT_FAMILY: &str = "-fx-font-family";
pub const FONT_SIZE: &str = "-fx-font-size";
pub const FONT_WEIGHT: &str = "-fx-font-weight";
pub const FONT_STYLE: &str = "-fx-font-style";

/// Inputs a conversion may depend on.
#[derive(Clone, Copy, Debug)]
pub struct ConvertContext<'a> {
    /// Property being converted, for error messages.
    pub property: &'a str,
    /// Font size in px that `em`, `ex` and font percentages refer to.
    pub font_size: f64,
}

impl ConvertContext<'_> {
    fn error(&self, message: impl Into<String>) -> CssError {
        CssError::conversion(self.property, message)
    }

    fn unexpected(&self, value: &ParsedValue, expected: &str) -> CssError {
        self.error(format!("expected {expected}, got '{value}'"))
    }
}

/// Turns declared values into typed values.
pub trait StyleConverter: fmt::Debug {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError>;

    /// Build a value from converted sub-property values.
    fn convert_subs(
        &self,
        _subs: &[(&str, StyleValue)],
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        Err(ctx.error("property has no sub-properties"))
    }

    /// Extract the value of sub-property `sub` from a converted value.
    fn component(&self, _value: &StyleValue, _sub: &str) -> Option<StyleValue> {
        None
    }
}

fn length(value: &ParsedValue, ctx: &ConvertContext<'_>) -> Result<f64, CssError> {
    match value {
        ParsedValue::Number(n) => Ok(*n),
        ParsedValue::Size(size) if size.degrees().is_none() && size.millis().is_none() => {
            Ok(size.pixels(ctx.font_size))
        }
        other => Err(ctx.unexpected(other, "a length")),
    }
}

fn keyword(value: &ParsedValue) -> Option<String> {
    match value {
        ParsedValue::Ident(s) => Some(s.to_ascii_lowercase()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Length in pixels.
#[derive(Clone, Copy, Debug, Default)]
pub struct SizeConverter;

impl StyleConverter for SizeConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        length(value, ctx).map(StyleValue::Number)
    }
}

/// Plain number; sizes are accepted and taken in pixels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NumberConverter;

impl StyleConverter for NumberConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        match value {
            ParsedValue::Size(size) => Ok(StyleValue::Number(size.pixels(ctx.font_size))),
            other => length(other, ctx).map(StyleValue::Number),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BooleanConverter;

impl StyleConverter for BooleanConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        match keyword(value).as_deref() {
            Some("true") => Ok(StyleValue::Boolean(true)),
            Some("false") => Ok(StyleValue::Boolean(false)),
            _ => Err(ctx.unexpected(value, "true or false")),
        }
    }
}

/// Quoted string or bare identifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringConverter;

impl StyleConverter for StringConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        match value {
            ParsedValue::String(s) | ParsedValue::Ident(s) => Ok(StyleValue::String(s.clone())),
            other => Err(ctx.unexpected(other, "a string")),
        }
    }
}

/// One keyword out of a fixed set.
#[derive(Clone, Copy, Debug)]
pub struct EnumConverter {
    pub values: &'static [&'static str],
}

impl StyleConverter for EnumConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        match keyword(value) {
            Some(k) if self.values.contains(&k.as_str()) => Ok(StyleValue::Enum(k)),
            _ => Err(ctx.unexpected(value, &format!("one of {}", self.values.join("|")))),
        }
    }
}

/// Hex, `rgb()`/`rgba()` or named color.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColorConverter;

impl StyleConverter for ColorConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        match value {
            ParsedValue::Color(c) => Ok(StyleValue::Color(*c)),
            ParsedValue::Ident(name) => named_color(name)
                .map(StyleValue::Color)
                .ok_or_else(|| ctx.unexpected(value, "a color")),
            other => Err(ctx.unexpected(other, "a color")),
        }
    }
}

/// Look up a CSS color keyword.
#[must_use]
pub fn named_color(name: &str) -> Option<Color> {
    let c = match name.to_ascii_lowercase().as_str() {
        "transparent" => Color::TRANSPARENT,
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "lime" => Color::rgb(0, 255, 0),
        "blue" => Color::rgb(0, 0, 255),
        "navy" => Color::rgb(0, 0, 128),
        "yellow" => Color::rgb(255, 255, 0),
        "orange" => Color::rgb(255, 165, 0),
        "purple" => Color::rgb(128, 0, 128),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "silver" => Color::rgb(192, 192, 192),
        "lightgray" | "lightgrey" => Color::rgb(211, 211, 211),
        "darkgray" | "darkgrey" => Color::rgb(169, 169, 169),
        "cyan" | "aqua" => Color::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Color::rgb(255, 0, 255),
        "maroon" => Color::rgb(128, 0, 0),
        "olive" => Color::rgb(128, 128, 0),
        "teal" => Color::rgb(0, 128, 128),
        "dodgerblue" => Color::rgb(30, 144, 255),
        _ => return None,
    };
    Some(c)
}

/// Duration in milliseconds; `indefinite` is infinite.
#[derive(Clone, Copy, Debug, Default)]
pub struct DurationConverter;

impl StyleConverter for DurationConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        match value {
            ParsedValue::Number(n) => Ok(StyleValue::Number(*n)),
            ParsedValue::Size(size) => size
                .millis()
                .map(StyleValue::Number)
                .ok_or_else(|| ctx.unexpected(value, "a duration")),
            ParsedValue::Ident(k) if k.eq_ignore_ascii_case("indefinite") => {
                Ok(StyleValue::Number(f64::INFINITY))
            }
            other => Err(ctx.unexpected(other, "a duration")),
        }
    }
}

/// Angle in degrees.
#[derive(Clone, Copy, Debug, Default)]
pub struct AngleConverter;

impl StyleConverter for AngleConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        match value {
            ParsedValue::Number(n) => Ok(StyleValue::Number(*n)),
            ParsedValue::Size(size) => size
                .degrees()
                .map(StyleValue::Number)
                .ok_or_else(|| ctx.unexpected(value, "an angle")),
            other => Err(ctx.unexpected(other, "an angle")),
        }
    }
}

/// One to four lengths in top, right, bottom, left order.
#[derive(Clone, Copy, Debug, Default)]
pub struct InsetsConverter;

impl StyleConverter for InsetsConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        let terms: &[ParsedValue] = match value {
            ParsedValue::Series(items) => items,
            single => std::slice::from_ref(single),
        };
        let sides = terms
            .iter()
            .map(|t| length(t, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        let insets = match sides[..] {
            [all] => Insets::uniform(all),
            [v, h] => Insets { top: v, right: h, bottom: v, left: h },
            [top, h, bottom] => Insets { top, right: h, bottom, left: h },
            [top, right, bottom, left] => Insets { top, right, bottom, left },
            _ => return Err(ctx.unexpected(value, "one to four lengths")),
        };
        Ok(StyleValue::Insets(insets))
    }
}

/// Applies an inner converter to every comma-separated layer.
#[derive(Debug)]
pub struct LayeredConverter {
    inner: Box<dyn StyleConverter>,
}

impl LayeredConverter {
    #[must_use]
    pub fn new(inner: impl StyleConverter + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl StyleConverter for LayeredConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        let layers: &[ParsedValue] = match value {
            ParsedValue::Layers(items) => items,
            single => std::slice::from_ref(single),
        };
        layers
            .iter()
            .map(|layer| self.inner.convert(layer, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(StyleValue::List)
    }
}

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

/// Font size; `em`, `ex` and percentages refer to `ctx.font_size`, which the
/// engine sets to the parent's font size.
#[derive(Clone, Copy, Debug, Default)]
pub struct FontSizeConverter;

impl StyleConverter for FontSizeConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        let px = match value {
            ParsedValue::Number(n) => *n,
            ParsedValue::Size(size) if size.degrees().is_none() && size.millis().is_none() => {
                size.pixels_with(ctx.font_size, ctx.font_size)
            }
            ParsedValue::Ident(k) => match k.to_ascii_lowercase().as_str() {
                "smaller" => ctx.font_size / 1.2,
                "larger" => ctx.font_size * 1.2,
                _ => return Err(ctx.unexpected(value, "a font size")),
            },
            other => return Err(ctx.unexpected(other, "a font size")),
        };
        Ok(StyleValue::Number(px))
    }
}

/// Weight keyword or number, as a number from 100 to 900.
#[derive(Clone, Copy, Debug, Default)]
pub struct FontWeightConverter;

impl FontWeightConverter {
    fn weight(value: &ParsedValue) -> Option<u16> {
        match value {
            ParsedValue::Number(n) if (100.0..=900.0).contains(n) => Some(*n as u16),
            ParsedValue::Ident(k) => match k.to_ascii_lowercase().as_str() {
                "thin" => Some(100),
                "extra-light" => Some(200),
                "light" | "lighter" => Some(300),
                "normal" => Some(400),
                "medium" => Some(500),
                "semi-bold" => Some(600),
                "bold" | "bolder" => Some(700),
                "extra-bold" => Some(800),
                "black" => Some(900),
                _ => None,
            },
            _ => None,
        }
    }
}

impl StyleConverter for FontWeightConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        Self::weight(value)
            .map(|w| StyleValue::Number(f64::from(w)))
            .ok_or_else(|| ctx.unexpected(value, "a font weight"))
    }
}

/// `normal`, `italic` or `oblique`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FontStyleConverter;

impl FontStyleConverter {
    fn posture(value: &ParsedValue) -> Option<FontPosture> {
        match keyword(value)?.as_str() {
            "normal" | "regular" => Some(FontPosture::Regular),
            "italic" => Some(FontPosture::Italic),
            "oblique" => Some(FontPosture::Oblique),
            _ => None,
        }
    }

    fn name(posture: FontPosture) -> &'static str {
        match posture {
            FontPosture::Regular => "normal",
            FontPosture::Italic => "italic",
            FontPosture::Oblique => "oblique",
        }
    }
}

impl StyleConverter for FontStyleConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        Self::posture(value)
            .map(|p| StyleValue::Enum(Self::name(p).to_string()))
            .ok_or_else(|| ctx.unexpected(value, "a font style"))
    }
}

/// The `-fx-font` shorthand: `[style] [weight] size family`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FontConverter;

impl StyleConverter for FontConverter {
    fn convert(
        &self,
        value: &ParsedValue,
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        let terms: &[ParsedValue] = match value {
            ParsedValue::Series(items) => items,
            single => std::slice::from_ref(single),
        };
        let mut font = Font::with_size(ctx.font_size);
        let mut rest = terms;
        while let [first, tail @ ..] = rest {
            if let Some(posture) = FontStyleConverter::posture(first) {
                font.posture = posture;
            } else if let Some(weight) = FontWeightConverter::weight(first) {
                font.weight = weight;
            } else {
                break;
            }
            rest = tail;
        }
        let [size, family @ ..] = rest else {
            return Err(ctx.unexpected(value, "a font size"));
        };
        if let StyleValue::Number(px) = FontSizeConverter.convert(size, ctx)? {
            font.size = px;
        }
        if !family.is_empty() {
            font.family = family
                .iter()
                .map(|t| match t {
                    ParsedValue::String(s) | ParsedValue::Ident(s) => Ok(s.as_str()),
                    other => Err(ctx.unexpected(other, "a font family")),
                })
                .collect::<Result<Vec<_>, _>>()?
                .join(" ");
        }
        Ok(StyleValue::Font(font))
    }

    fn convert_subs(
        &self,
        subs: &[(&str, StyleValue)],
        ctx: &ConvertContext<'_>,
    ) -> Result<StyleValue, CssError> {
        let mut font = Font::with_size(ctx.font_size);
        for (name, value) in subs {
            match (*name, value) {
                (FONT_FAMILY, StyleValue::String(family)) => font.family = family.clone(),
                (FONT_SIZE, StyleValue::Number(px)) => font.size = *px,
                (FONT_WEIGHT, StyleValue::Number(w)) => font.weight = *w as u16,
                (FONT_STYLE, StyleValue::Enum(k)) => {
                    font.posture = FontStyleConverter::posture(&ParsedValue::Ident(k.clone()))
                        .unwrap_or_default();
                }
                (other, v) => {
                    return Err(ctx.error(format!("unexpected font component {other} = {v:?}")));
                }
            }
        }
        Ok(StyleValue::Font(font))
    }

    fn component(&self, value: &StyleValue, sub: &str) -> Option<StyleValue> {
        let font = value.as_font()?;
        match sub {
            FONT_FAMILY => Some(StyleValue::String(font.family.clone())),
            FONT_SIZE => Some(StyleValue::Number(font.size)),
            FONT_WEIGHT => Some(StyleValue::Number(f64::from(font.weight))),
            FONT_STYLE => Some(StyleValue::Enum(
                FontStyleConverter::name(font.posture).to_string(),
            )),
            _ => None,
        }
    }
}
