#![forbid(unsafe_code)]

//! Styleable property metadata.
//!
//! Every property the cascade resolves is described by a [`CssMetaData`]:
//! its converter, initial value, whether it inherits, and, for shorthands,
//! its sub-properties.

use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use bitflags::bitflags;

use crate::converter::{
    AngleConverter, BooleanConverter, ColorConverter, DurationConverter, EnumConverter,
    FONT_FAMILY, FONT_SIZE, FONT_STYLE, FONT_WEIGHT, FontConverter, FontSizeConverter,
    FontStyleConverter, FontWeightConverter, InsetsConverter, LayeredConverter, NumberConverter,
    SizeConverter, StringConverter, StyleConverter,
};
use crate::value::{Color, Font, Insets, StyleValue};

/// The font shorthand property.
pub const FONT: &str = "-fx-font";

bitflags! {
    /// Behavior flags of a styleable property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyFlags: u8 {
        /// Takes the parent's value when no declaration applies.
        const INHERITS = 1 << 0;
        /// Relative units refer to the parent's font rather than the
        /// node's own.
        const FONT = 1 << 1;
    }
}

/// Description of one styleable property.
pub struct CssMetaData {
    name: String,
    converter: Rc<dyn StyleConverter>,
    initial: StyleValue,
    flags: PropertyFlags,
    sub_properties: Vec<String>,
    parent: Option<String>,
}

impl CssMetaData {
    #[must_use]
    pub fn new(
        name: &str,
        converter: impl StyleConverter + 'static,
        initial: StyleValue,
        flags: PropertyFlags,
    ) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            converter: Rc::new(converter),
            initial,
            flags,
            sub_properties: Vec::new(),
            parent: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn converter(&self) -> &dyn StyleConverter {
        self.converter.as_ref()
    }

    #[must_use]
    pub fn initial(&self) -> &StyleValue {
        &self.initial
    }

    #[must_use]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    #[must_use]
    pub fn inherits(&self) -> bool {
        self.flags.contains(PropertyFlags::INHERITS)
    }

    #[must_use]
    pub fn is_font(&self) -> bool {
        self.flags.contains(PropertyFlags::FONT)
    }

    #[must_use]
    pub fn sub_properties(&self) -> &[String] {
        &self.sub_properties
    }

    /// The shorthand this property is a component of.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

impl fmt::Debug for CssMetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CssMetaData")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("initial", &self.initial)
            .field("sub_properties", &self.sub_properties)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

/// Name to metadata table.
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    by_name: AHashMap<String, Rc<CssMetaData>>,
}

impl PropertyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the common `-fx-*` properties.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        let inherit_font = PropertyFlags::INHERITS | PropertyFlags::FONT;

        let font = StyleValue::Font(Font::with_size(13.0));
        reg.register_composite(
            CssMetaData::new(FONT, FontConverter, font, inherit_font),
            vec![
                CssMetaData::new(
                    FONT_FAMILY,
                    StringConverter,
                    StyleValue::String("System".into()),
                    inherit_font,
                ),
                CssMetaData::new(
                    FONT_SIZE,
                    FontSizeConverter,
                    StyleValue::Number(13.0),
                    inherit_font,
                ),
                CssMetaData::new(
                    FONT_WEIGHT,
                    FontWeightConverter,
                    StyleValue::Number(400.0),
                    inherit_font,
                ),
                CssMetaData::new(
                    FONT_STYLE,
                    FontStyleConverter,
                    StyleValue::Enum("normal".into()),
                    inherit_font,
                ),
            ],
        );

        let none = PropertyFlags::empty();
        let inherits = PropertyFlags::INHERITS;
        let zero = || StyleValue::Number(0.0);
        reg.register(CssMetaData::new(
            "-fx-text-fill",
            ColorConverter,
            StyleValue::Color(Color::BLACK),
            inherits,
        ));
        reg.register(CssMetaData::new(
            "-fx-text-alignment",
            EnumConverter { values: &["left", "center", "right", "justify"] },
            StyleValue::Enum("left".into()),
            inherits,
        ));
        reg.register(CssMetaData::new(
            "-fx-background-color",
            LayeredConverter::new(ColorConverter),
            StyleValue::List(vec![StyleValue::Color(Color::TRANSPARENT)]),
            none,
        ));
        reg.register(CssMetaData::new(
            "-fx-background-radius",
            LayeredConverter::new(SizeConverter),
            StyleValue::List(vec![zero()]),
            none,
        ));
        reg.register(CssMetaData::new("-fx-border-color", ColorConverter, StyleValue::Null, none));
        reg.register(CssMetaData::new("-fx-border-width", SizeConverter, zero(), none));
        reg.register(CssMetaData::new(
            "-fx-padding",
            InsetsConverter,
            StyleValue::Insets(Insets::default()),
            none,
        ));
        reg.register(CssMetaData::new("-fx-spacing", SizeConverter, zero(), none));
        let one = StyleValue::Number(1.0);
        reg.register(CssMetaData::new("-fx-opacity", NumberConverter, one, none));
        reg.register(CssMetaData::new("-fx-rotate", AngleConverter, zero(), none));
        reg.register(CssMetaData::new(
            "-fx-visibility",
            BooleanConverter,
            StyleValue::Boolean(true),
            none,
        ));
        reg.register(CssMetaData::new("-fx-cursor", StringConverter, StyleValue::Null, inherits));
        reg.register(CssMetaData::new("-fx-transition-duration", DurationConverter, zero(), none));
        reg
    }

    /// Add or replace a plain property.
    pub fn register(&mut self, meta: CssMetaData) -> Rc<CssMetaData> {
        let meta = Rc::new(meta);
        self.by_name.insert(meta.name.clone(), Rc::clone(&meta));
        meta
    }

    /// Add a shorthand together with its components.
    pub fn register_composite(
        &mut self,
        mut shorthand: CssMetaData,
        subs: Vec<CssMetaData>,
    ) -> Rc<CssMetaData> {
        shorthand.sub_properties = subs.iter().map(|s| s.name.clone()).collect();
        for mut sub in subs {
            sub.parent = Some(shorthand.name.clone());
            self.register(sub);
        }
        self.register(shorthand)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<CssMetaData>> {
        self.by_name.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Registered property names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_font_shorthand() {
        let reg = PropertyRegistry::with_defaults();
        let font = reg.get(FONT).unwrap();
        assert_eq!(font.sub_properties(), [FONT_FAMILY, FONT_SIZE, FONT_WEIGHT, FONT_STYLE]);
        assert!(font.inherits() && font.is_font());

        let size = reg.get(FONT_SIZE).unwrap();
        assert_eq!(size.parent(), Some(FONT));
        assert_eq!(size.initial(), &StyleValue::Number(13.0));

        let opacity = reg.get("-fx-opacity").unwrap();
        assert!(!opacity.inherits());
        assert!(opacity.parent().is_none());
    }

    #[test]
    fn names_are_lowercased_and_sorted() {
        let mut reg = PropertyRegistry::new();
        let none = PropertyFlags::empty();
        reg.register(CssMetaData::new("-FX-Zeta", SizeConverter, StyleValue::Null, none));
        reg.register(CssMetaData::new("-fx-alpha", SizeConverter, StyleValue::Null, none));
        assert_eq!(reg.names(), vec!["-fx-alpha", "-fx-zeta"]);
        assert!(reg.contains("-fx-zeta"));
        assert_eq!(reg.len(), 2);
    }
}
