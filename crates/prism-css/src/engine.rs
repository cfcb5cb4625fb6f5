#![forbid(unsafe_code)]

//! Cascade resolution.
//!
//! [`StyleEngine`] owns the active stylesheets and answers one question:
//! which value does property `p` take on the node at the head of a
//! [`StyleChain`]?
//!
//! Resolution runs in three layers, each cached:
//!
//! 1. **Selector index.** Every selector of every stylesheet is filed in a
//!    [`SelectorPartitioning`]. Rebuilt lazily after a stylesheet change.
//! 2. **Style maps.** For a chain identity (type, id and classes of the node
//!    and its ancestors) the matching declarations are grouped by property
//!    and sorted by precedence. Pseudo-class state is not part of the key;
//!    the map records which pseudo-classes its selectors consult instead.
//!    Style maps and parsed inline styles live in LRUs bounded by
//!    `style_map_capacity`.
//! 3. **Values.** A bounded LRU keyed by property, the style map of every
//!    chain level, each level's pseudo-class state masked to the classes
//!    that any selector consults, and each level's inline style.
//!
//! # Invariants
//!
//! 1. Resolving the same property on an unchanged chain returns the same
//!    `Rc<CalculatedValue>` while the value cache is enabled.
//! 2. Adding or removing a stylesheet, or registering a property, discards
//!    every cache.
//! 3. The winner is the greatest matching [`CascadingStyle`] whose
//!    pseudo-classes are all active on the node.
//!
//! # Failure Modes
//!
//! - Unknown property names are the only error returned to the caller.
//! - A declaration that cannot be converted, or whose looked-up value does
//!   not resolve, is logged at `warn` and the property is left unstyled.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::num::NonZeroUsize;
use std::rc::Rc;

use ahash::AHashMap;
use lru::LruCache;
use tracing::{debug, instrument, trace, warn};

use crate::cascade::{CascadingStyle, sort_by_precedence};
use crate::config::StyleConfig;
use crate::converter::ConvertContext;
use crate::error::CssError;
use crate::parser::{parse_declarations, parse_stylesheet};
use crate::partition::SelectorPartitioning;
use crate::properties::{CssMetaData, FONT, PropertyRegistry};
use crate::pseudo_class::{PseudoClassRegistry, PseudoClassState};
use crate::selector::SimpleSelector;
use crate::styleable::{StyleChain, Styleable};
use crate::stylesheet::{Rule, StyleOrigin, Stylesheet};
use crate::value::{CalculatedValue, ParsedValue, StyleValue};

/// Handle returned when a stylesheet is added to an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StylesheetId(u64);

impl fmt::Display for StylesheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stylesheet#{}", self.0)
    }
}

/// Value cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Cached values.
    pub size: usize,
    pub capacity: usize,
    /// Cached style maps.
    pub style_maps: usize,
    /// Cached parsed inline styles.
    pub inline_styles: usize,
}

impl CacheStats {
    /// Hit ratio in `[0, 1]`; zero before the first lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ---------------------------------------------------------------------------
// Cache keys
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdentity {
    type_name: String,
    id: Option<String>,
    classes: Vec<String>,
}

impl NodeIdentity {
    fn of(node: &dyn Styleable) -> Self {
        Self {
            type_name: node.type_selector().to_string(),
            id: node.id().map(str::to_owned),
            classes: node.style_classes().to_vec(),
        }
    }
}

/// Declarations matching one chain identity, winner first per property.
#[derive(Debug)]
struct StyleMap {
    id: u64,
    styles: AHashMap<String, Vec<CascadingStyle>>,
    /// Pseudo-classes consulted by any selector in the map.
    pseudo_mask: PseudoClassState,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct LevelKey {
    map: u64,
    states: PseudoClassState,
    inline: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ValueKey {
    property: String,
    levels: Vec<LevelKey>,
}

type Resolved = Option<Rc<CalculatedValue>>;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Matches stylesheets against styleable nodes and resolves property values.
pub struct StyleEngine {
    config: StyleConfig,
    pseudo_classes: Rc<PseudoClassRegistry>,
    properties: PropertyRegistry,
    stylesheets: Vec<(StylesheetId, Stylesheet)>,
    next_stylesheet: u64,
    index: RefCell<Option<Rc<SelectorPartitioning>>>,
    style_maps: RefCell<LruCache<Vec<NodeIdentity>, Rc<StyleMap>>>,
    next_map: Cell<u64>,
    inline_rules: RefCell<LruCache<String, Option<Rc<Rule>>>>,
    values: RefCell<LruCache<ValueKey, Resolved>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl StyleEngine {
    /// Engine with the default `-fx-*` properties.
    #[must_use]
    pub fn new(config: StyleConfig) -> Self {
        Self::with_properties(config, PropertyRegistry::with_defaults())
    }

    #[must_use]
    pub fn with_properties(config: StyleConfig, properties: PropertyRegistry) -> Self {
        let registry = PseudoClassRegistry::with_capacity(config.pseudo_class_capacity);
        Self::with_registries(config, Rc::new(registry), properties)
    }

    /// Engine sharing an existing pseudo-class registry.
    ///
    /// Nodes must register their pseudo-classes in the same registry the
    /// engine parses selectors with.
    #[must_use]
    pub fn with_registries(
        config: StyleConfig,
        pseudo_classes: Rc<PseudoClassRegistry>,
        properties: PropertyRegistry,
    ) -> Self {
        let capacity =
            NonZeroUsize::new(config.style_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        let maps = NonZeroUsize::new(config.style_map_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            pseudo_classes,
            properties,
            stylesheets: Vec::new(),
            next_stylesheet: 0,
            index: RefCell::new(None),
            style_maps: RefCell::new(LruCache::new(maps)),
            next_map: Cell::new(0),
            inline_rules: RefCell::new(LruCache::new(maps)),
            values: RefCell::new(LruCache::new(capacity)),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    #[must_use]
    pub fn pseudo_classes(&self) -> &Rc<PseudoClassRegistry> {
        &self.pseudo_classes
    }

    #[must_use]
    pub fn properties(&self) -> &PropertyRegistry {
        &self.properties
    }

    /// Add or replace a property description.
    pub fn register_property(&mut self, meta: CssMetaData) -> Rc<CssMetaData> {
        let meta = self.properties.register(meta);
        self.invalidate();
        meta
    }

    // -- stylesheets --------------------------------------------------------

    pub fn add_stylesheet(&mut self, stylesheet: Stylesheet) -> StylesheetId {
        let id = StylesheetId(self.next_stylesheet);
        self.next_stylesheet += 1;
        debug!(
            %id,
            origin = %stylesheet.origin(),
            rules = stylesheet.rules().len(),
            "stylesheet added"
        );
        self.stylesheets.push((id, stylesheet));
        self.invalidate();
        id
    }

    /// Parse `text` and add the result. Malformed rules are dropped and
    /// reported; the rest of the sheet is added.
    pub fn parse_and_add(
        &mut self,
        text: &str,
        origin: StyleOrigin,
    ) -> (StylesheetId, Vec<CssError>) {
        let (sheet, errors) = parse_stylesheet(text, origin, &self.pseudo_classes);
        (self.add_stylesheet(sheet), errors)
    }

    pub fn remove_stylesheet(&mut self, id: StylesheetId) -> Option<Stylesheet> {
        let pos = self.stylesheets.iter().position(|(sid, _)| *sid == id)?;
        let (_, sheet) = self.stylesheets.remove(pos);
        debug!(%id, "stylesheet removed");
        self.invalidate();
        Some(sheet)
    }

    pub fn stylesheets(&self) -> impl Iterator<Item = (StylesheetId, &Stylesheet)> {
        self.stylesheets.iter().map(|(id, sheet)| (*id, sheet))
    }

    /// Drop every cached index, style map and value.
    pub fn invalidate(&self) {
        *self.index.borrow_mut() = None;
        self.style_maps.borrow_mut().clear();
        self.inline_rules.borrow_mut().clear();
        self.values.borrow_mut().clear();
        trace!("style caches cleared");
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        let values = self.values.borrow();
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
            size: values.len(),
            capacity: values.cap().get(),
            style_maps: self.style_maps.borrow().len(),
            inline_styles: self.inline_rules.borrow().len(),
        }
    }

    // -- resolution ---------------------------------------------------------

    /// Resolve `property` for the node at `chain[0]`.
    ///
    /// Returns `Ok(None)` when no declaration applies and nothing is
    /// inherited; the caller then keeps the property's initial value.
    ///
    /// # Errors
    ///
    /// [`CssError::UnknownProperty`] if `property` is not registered.
    #[instrument(level = "trace", skip(self, chain), fields(depth = chain.len()))]
    pub fn resolve(&self, chain: &StyleChain<'_>, property: &str) -> Result<Resolved, CssError> {
        let name = property.to_ascii_lowercase();
        let meta = self
            .properties
            .get(&name)
            .ok_or_else(|| CssError::UnknownProperty(name.clone()))?;
        let Some(node) = chain.first() else {
            return Ok(None);
        };
        let value = self.calculate(chain, &meta);
        Ok(value.filter(|v| {
            let skip = node.is_user_set(&name)
                && (v.origin == StyleOrigin::UserAgent || v.inherited);
            if skip {
                trace!(property = %name, "user-set value kept");
            }
            !skip
        }))
    }

    /// Resolve every registered property that takes a styled value, in
    /// property-name order.
    #[must_use]
    pub fn resolve_all(&self, chain: &StyleChain<'_>) -> Vec<(String, Rc<CalculatedValue>)> {
        self.properties
            .names()
            .into_iter()
            .filter_map(|name| {
                let value = self.resolve(chain, name).ok().flatten()?;
                Some((name.to_string(), value))
            })
            .collect()
    }

    /// Every declaration that applies to `property` on `chain[0]` in its
    /// current state, winner first.
    ///
    /// Sub-properties include declarations of their shorthand; shorthands
    /// include declarations of their sub-properties.
    ///
    /// # Errors
    ///
    /// [`CssError::UnknownProperty`] if `property` is not registered.
    pub fn matching_styles(
        &self,
        chain: &StyleChain<'_>,
        property: &str,
    ) -> Result<Vec<CascadingStyle>, CssError> {
        let name = property.to_ascii_lowercase();
        let meta = self
            .properties
            .get(&name)
            .ok_or_else(|| CssError::UnknownProperty(name.clone()))?;
        if chain.is_empty() {
            return Ok(Vec::new());
        }
        let mut names = vec![meta.name()];
        names.extend(meta.parent());
        names.extend(meta.sub_properties().iter().map(String::as_str));
        Ok(self
            .candidates(chain, &names)
            .into_iter()
            .filter(|s| s.selector().state_matches(chain))
            .collect())
    }

    // -- caches -------------------------------------------------------------

    fn index(&self) -> Rc<SelectorPartitioning> {
        if let Some(index) = self.index.borrow().as_ref() {
            return Rc::clone(index);
        }
        let mut index = SelectorPartitioning::new();
        for (_, sheet) in &self.stylesheets {
            for rule in sheet.rules() {
                index.partition_rule(rule);
            }
        }
        debug!(
            selectors = index.len(),
            stylesheets = self.stylesheets.len(),
            "selector index rebuilt"
        );
        let index = Rc::new(index);
        *self.index.borrow_mut() = Some(Rc::clone(&index));
        index
    }

    fn style_map(&self, chain: &StyleChain<'_>) -> Rc<StyleMap> {
        let key: Vec<NodeIdentity> = chain.iter().map(|n| NodeIdentity::of(*n)).collect();
        if let Some(map) = self.style_maps.borrow_mut().get(&key) {
            return Rc::clone(map);
        }

        let node = chain[0];
        let index = self.index();
        let mut styles: AHashMap<String, Vec<CascadingStyle>> = AHashMap::new();
        let mut pseudo_mask = PseudoClassState::new();
        for entry in index.matches(node.id(), node.type_selector(), node.style_classes()) {
            let selector = entry.selector();
            if !selector.applies(chain) {
                continue;
            }
            let Some(origin) = entry.rule.origin() else {
                continue;
            };
            pseudo_mask.union_with(&selector.pseudo_classes());
            for (i, decl) in entry.rule.declarations.iter().enumerate() {
                let rule = Rc::clone(&entry.rule);
                let style = CascadingStyle::new(rule, entry.index, i, origin, entry.ordinal);
                styles.entry(decl.property.clone()).or_default().push(style);
            }
        }
        for list in styles.values_mut() {
            sort_by_precedence(list);
        }

        let id = self.next_map.get();
        self.next_map.set(id + 1);
        trace!(map = id, node = node.type_selector(), properties = styles.len(), "style map built");
        let map = Rc::new(StyleMap {
            id,
            styles,
            pseudo_mask,
        });
        self.style_maps.borrow_mut().put(key, Rc::clone(&map));
        map
    }

    /// The node's inline style as a rule, parsed once per distinct text.
    fn inline_rule(&self, node: &dyn Styleable) -> Option<Rc<Rule>> {
        let text = node.inline_style()?;
        if let Some(rule) = self.inline_rules.borrow_mut().get(text) {
            return rule.clone();
        }
        let (declarations, errors) = parse_declarations(text);
        if !errors.is_empty() {
            debug!(errors = errors.len(), "inline style partially parsed");
        }
        let rule = (!declarations.is_empty()).then(|| {
            let mut sheet = Stylesheet::new(StyleOrigin::Inline);
            sheet.add_rule(Rule::new(vec![SimpleSelector::universal().into()], declarations))
        });
        self.inline_rules
            .borrow_mut()
            .put(text.to_string(), rule.clone());
        rule
    }

    fn value_key(&self, chain: &StyleChain<'_>, property: &str) -> ValueKey {
        let maps: Vec<Rc<StyleMap>> =
            (0..chain.len()).map(|i| self.style_map(&chain[i..])).collect();
        let mut mask = PseudoClassState::new();
        for map in &maps {
            mask.union_with(&map.pseudo_mask);
        }
        let levels = chain
            .iter()
            .zip(&maps)
            .map(|(node, map)| LevelKey {
                map: map.id,
                states: node.pseudo_class_states().intersection(&mask),
                inline: node.inline_style().map(str::to_owned),
            })
            .collect();
        ValueKey {
            property: property.to_string(),
            levels,
        }
    }

    // -- cascade ------------------------------------------------------------

    /// Declarations of any of `names` for `chain[0]`, inline included,
    /// winner first. Pseudo-class state is not checked.
    fn candidates(&self, chain: &StyleChain<'_>, names: &[&str]) -> Vec<CascadingStyle> {
        let map = self.style_map(chain);
        let mut out: Vec<CascadingStyle> = names
            .iter()
            .filter_map(|name| map.styles.get(*name))
            .flatten()
            .cloned()
            .collect();
        if let Some(rule) = self.inline_rule(chain[0]) {
            for (i, decl) in rule.declarations.iter().enumerate() {
                if names.contains(&decl.property.as_str()) {
                    out.push(CascadingStyle::new(Rc::clone(&rule), 0, i, StyleOrigin::Inline, 0));
                }
            }
        }
        sort_by_precedence(&mut out);
        out
    }

    /// The winning declaration. With `stateful` unset only selectors that
    /// consult no pseudo-class are considered.
    fn best(
        &self,
        chain: &StyleChain<'_>,
        names: &[&str],
        stateful: bool,
    ) -> Option<CascadingStyle> {
        self.candidates(chain, names).into_iter().find(|style| {
            let selector = style.selector();
            if stateful {
                selector.state_matches(chain)
            } else {
                selector.pseudo_classes().is_empty()
            }
        })
    }

    fn calculate(&self, chain: &StyleChain<'_>, meta: &CssMetaData) -> Resolved {
        if chain.is_empty() {
            return None;
        }
        let key = self
            .config
            .cache_enabled
            .then(|| self.value_key(chain, meta.name()));
        if let Some(key) = &key
            && let Some(hit) = self.values.borrow_mut().get(key)
        {
            self.hits.set(self.hits.get() + 1);
            trace!(property = meta.name(), "style cache hit");
            return hit.clone();
        }
        self.misses.set(self.misses.get() + 1);
        trace!(property = meta.name(), "style cache miss");

        let value = if meta.sub_properties().is_empty() {
            self.compute(chain, meta)
        } else {
            self.compute_composite(chain, meta)
        };
        if let Some(key) = key {
            self.values.borrow_mut().put(key, value.clone());
        }
        value
    }

    fn compute(&self, chain: &StyleChain<'_>, meta: &CssMetaData) -> Resolved {
        let shorthand = meta.parent().and_then(|p| self.properties.get(p));
        let mut names = vec![meta.name()];
        names.extend(shorthand.as_ref().map(|s| s.name()));

        let Some(style) = self.best(chain, &names, true) else {
            return self.unstyled(chain, meta);
        };
        match shorthand {
            Some(shorthand) if style.property() != meta.name() => {
                let whole = self.from_style(chain, &shorthand, &style)?;
                let part = shorthand.converter().component(&whole.value, meta.name())?;
                Some(Rc::new(CalculatedValue {
                    value: part,
                    ..(*whole).clone()
                }))
            }
            _ => self.from_style(chain, meta, &style),
        }
    }

    /// A shorthand, assembled from its own declaration and any of its
    /// sub-properties declared with higher precedence.
    fn compute_composite(&self, chain: &StyleChain<'_>, meta: &CssMetaData) -> Resolved {
        let own = self.best(chain, &[meta.name()], true);
        if let Some(style) = &own
            && matches!(style.value(), ParsedValue::Inherit)
        {
            return self.inherit(chain, meta);
        }
        let overrides: Vec<(Rc<CssMetaData>, CascadingStyle)> = meta
            .sub_properties()
            .iter()
            .filter_map(|name| self.properties.get(name))
            .filter_map(|sub| {
                let style = self.best(chain, &[sub.name()], true)?;
                Some((sub, style))
            })
            .filter(|(_, style)| own.as_ref().is_none_or(|o| style > o))
            .collect();

        let base = match &own {
            Some(style) => self.from_style(chain, meta, style),
            None if overrides.is_empty() => return self.unstyled(chain, meta),
            None if meta.inherits() => self.inherit(chain, meta),
            None => None,
        };
        if overrides.is_empty() {
            return base;
        }

        let mut origin = base.as_ref().map(|b| b.origin);
        let mut relative = base.as_ref().is_some_and(|b| b.relative);
        let mut parts: Vec<(&str, StyleValue)> = Vec::new();
        for sub in meta.sub_properties() {
            let sub = sub.as_str();
            if let Some((sub_meta, style)) = overrides.iter().find(|(m, _)| m.name() == sub) {
                let Some(value) = self.from_style(chain, sub_meta, style) else {
                    continue;
                };
                origin = origin.max(Some(value.origin));
                relative |= value.relative;
                parts.push((sub, value.value.clone()));
            } else if let Some(base) = &base
                && let Some(part) = meta.converter().component(&base.value, sub)
            {
                parts.push((sub, part));
            }
        }

        let ctx = ConvertContext {
            property: meta.name(),
            font_size: self.font_size_for(chain, meta),
        };
        match meta.converter().convert_subs(&parts, &ctx) {
            Ok(value) => Some(Rc::new(CalculatedValue {
                value,
                origin: origin?,
                relative,
                inherited: false,
            })),
            Err(err) => {
                warn!(property = meta.name(), error = %err, "style conversion failed");
                None
            }
        }
    }

    fn unstyled(&self, chain: &StyleChain<'_>, meta: &CssMetaData) -> Resolved {
        if meta.inherits() {
            self.inherit(chain, meta)
        } else {
            None
        }
    }

    fn inherit(&self, chain: &StyleChain<'_>, meta: &CssMetaData) -> Resolved {
        let parent = chain.get(1..).filter(|p| !p.is_empty())?;
        let value = self.calculate(parent, meta)?;
        Some(Rc::new(CalculatedValue {
            inherited: true,
            ..(*value).clone()
        }))
    }

    fn from_style(
        &self,
        chain: &StyleChain<'_>,
        meta: &CssMetaData,
        style: &CascadingStyle,
    ) -> Resolved {
        match style.value() {
            ParsedValue::Inherit => self.inherit(chain, meta),
            value => self.convert(chain, meta, value, style.origin()),
        }
    }

    fn convert(
        &self,
        chain: &StyleChain<'_>,
        meta: &CssMetaData,
        value: &ParsedValue,
        origin: StyleOrigin,
    ) -> Resolved {
        if value.is_null_keyword() {
            return Some(Rc::new(CalculatedValue {
                value: StyleValue::Null,
                origin,
                relative: false,
                inherited: false,
            }));
        }

        let (value, origin) = if value.contains_idents() {
            let mut stack = Vec::new();
            match self.resolve_lookups(chain, value, &mut stack) {
                Ok((resolved, found)) => {
                    (Cow::Owned(resolved), origin.max(found.unwrap_or(origin)))
                }
                Err(err) => {
                    warn!(property = meta.name(), error = %err, "looked-up value not resolved");
                    return None;
                }
            }
        } else {
            (Cow::Borrowed(value), origin)
        };

        let relative = value.is_relative();
        let font_size = if relative || meta.is_font() {
            self.font_size_for(chain, meta)
        } else {
            self.config.default_font_size
        };
        let ctx = ConvertContext {
            property: meta.name(),
            font_size,
        };
        match meta.converter().convert(&value, &ctx) {
            Ok(converted) => Some(Rc::new(CalculatedValue {
                value: converted,
                origin,
                relative,
                inherited: false,
            })),
            Err(err) => {
                warn!(property = meta.name(), error = %err, "style conversion failed");
                None
            }
        }
    }

    /// Replace identifiers that name a declared property with that
    /// property's declared value. Returns the highest origin involved.
    fn resolve_lookups(
        &self,
        chain: &StyleChain<'_>,
        value: &ParsedValue,
        stack: &mut Vec<String>,
    ) -> Result<(ParsedValue, Option<StyleOrigin>), CssError> {
        match value {
            ParsedValue::Ident(name) if !value.is_null_keyword() => {
                let name = name.to_ascii_lowercase();
                let Some((found, origin)) = self.resolve_ref(chain, &name) else {
                    return Ok((value.clone(), None));
                };
                if stack.contains(&name) || stack.len() >= self.config.max_lookup_depth {
                    return Err(CssError::UnresolvedLookup(name));
                }
                stack.push(name);
                let (resolved, inner) = self.resolve_lookups(chain, &found, stack)?;
                stack.pop();
                Ok((resolved, inner.max(Some(origin))))
            }
            ParsedValue::Series(items) => {
                let (items, origin) = self.resolve_each(chain, items, stack)?;
                Ok((ParsedValue::Series(items), origin))
            }
            ParsedValue::Layers(items) => {
                let (items, origin) = self.resolve_each(chain, items, stack)?;
                Ok((ParsedValue::Layers(items), origin))
            }
            other => Ok((other.clone(), None)),
        }
    }

    fn resolve_each(
        &self,
        chain: &StyleChain<'_>,
        items: &[ParsedValue],
        stack: &mut Vec<String>,
    ) -> Result<(Vec<ParsedValue>, Option<StyleOrigin>), CssError> {
        let mut origin = None;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let (resolved, found) = self.resolve_lookups(chain, item, stack)?;
            origin = origin.max(found);
            out.push(resolved);
        }
        Ok((out, origin))
    }

    /// Declared value of `name`: on the node in its state, then on the node
    /// ignoring state-dependent selectors, then on each ancestor likewise.
    fn resolve_ref(
        &self,
        chain: &StyleChain<'_>,
        name: &str,
    ) -> Option<(ParsedValue, StyleOrigin)> {
        (0..chain.len()).find_map(|level| {
            let sub = &chain[level..];
            let style = self
                .best(sub, &[name], true)
                .or_else(|| self.best(sub, &[name], false))?;
            Some((style.value().clone(), style.origin()))
        })
    }

    /// Font size relative units refer to. Font properties use the parent's
    /// font; everything else uses the node's own.
    fn font_size_for(&self, chain: &StyleChain<'_>, meta: &CssMetaData) -> f64 {
        let target = if meta.is_font() { &chain[1..] } else { chain };
        if target.is_empty() {
            return self.config.default_font_size;
        }
        self.properties
            .get(FONT)
            .and_then(|font| self.calculate(target, &font))
            .and_then(|v| v.value.as_font().map(|f| f.size))
            .unwrap_or(self.config.default_font_size)
    }
}

impl Default for StyleEngine {
    fn default() -> Self {
        Self::new(StyleConfig::default())
    }
}

impl fmt::Debug for StyleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleEngine")
            .field("config", &self.config)
            .field("stylesheets", &self.stylesheets.len())
            .field("properties", &self.properties.len())
            .field("cache", &self.cache_stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::FONT_SIZE;
    use crate::styleable::StyleableNode;
    use crate::value::{Color, Font, Insets};

    fn engine(css: &str) -> StyleEngine {
        let mut engine = StyleEngine::default();
        let (_, errors) = engine.parse_and_add(css, StyleOrigin::Author);
        assert!(errors.is_empty(), "{errors:?}");
        engine
    }

    fn value(engine: &StyleEngine, chain: &StyleChain<'_>, property: &str) -> Option<StyleValue> {
        engine
            .resolve(chain, property)
            .unwrap()
            .map(|v| v.value.clone())
    }

    fn color(hex: &str) -> Option<StyleValue> {
        Color::from_hex(hex).map(StyleValue::Color)
    }

    #[test]
    fn specificity_wins_regardless_of_order() {
        let engine = engine(
            "#ok { -fx-text-fill: #ff0000; }
             .button { -fx-text-fill: #00ff00; }
             Button { -fx-text-fill: #0000ff; }",
        );
        let node = StyleableNode::new("Button").with_id("ok").with_class("button");
        assert_eq!(value(&engine, &[&node], "-fx-text-fill"), color("#ff0000"));
    }

    #[test]
    fn later_rule_wins_equal_specificity() {
        let engine = engine(".a { -fx-opacity: 0.1; } .b { -fx-opacity: 0.2; }");
        let node = StyleableNode::new("Label").with_class("b").with_class("a");
        assert_eq!(value(&engine, &[&node], "-fx-opacity"), Some(StyleValue::Number(0.2)));
    }

    #[test]
    fn inline_outranks_stylesheet() {
        let engine = engine("#ok.button { -fx-opacity: 0.1; }");
        let node = StyleableNode::new("Button")
            .with_id("ok")
            .with_class("button")
            .with_style("-fx-opacity: 0.9");
        let resolved = engine.resolve(&[&node], "-fx-opacity").unwrap().unwrap();
        assert_eq!(resolved.value, StyleValue::Number(0.9));
        assert_eq!(resolved.origin, StyleOrigin::Inline);
    }

    #[test]
    fn important_outranks_inline() {
        let engine = engine("Button { -fx-opacity: 0.1 !important; }");
        let node = StyleableNode::new("Button").with_style("-fx-opacity: 0.9");
        assert_eq!(value(&engine, &[&node], "-fx-opacity"), Some(StyleValue::Number(0.1)));
    }

    #[test]
    fn repeated_resolution_hits_cache() {
        let engine = engine("Button { -fx-padding: 4px; }");
        let node = StyleableNode::new("Button");
        let first = engine.resolve(&[&node], "-fx-padding").unwrap().unwrap();
        let second = engine.resolve(&[&node], "-fx-padding").unwrap().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.value, StyleValue::Insets(Insets::uniform(4.0)));

        let stats = engine.cache_stats();
        assert!(stats.hits >= 1);
        assert_eq!(stats.capacity, 4096);
    }

    #[test]
    fn disabled_cache_recomputes() {
        let config = StyleConfig {
            cache_enabled: false,
            ..StyleConfig::default()
        };
        let mut engine = StyleEngine::new(config);
        engine.parse_and_add("Button { -fx-opacity: 0.5; }", StyleOrigin::Author);
        let node = StyleableNode::new("Button");
        let first = engine.resolve(&[&node], "-fx-opacity").unwrap().unwrap();
        let second = engine.resolve(&[&node], "-fx-opacity").unwrap().unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(engine.cache_stats().size, 0);
    }

    #[test]
    fn generated_ids_and_inline_styles_stay_bounded() {
        let config = StyleConfig {
            style_cache_capacity: 16,
            style_map_capacity: 16,
            ..StyleConfig::default()
        };
        let mut engine = StyleEngine::new(config);
        engine.parse_and_add("Button { -fx-opacity: 0.5; }", StyleOrigin::Author);

        for i in 0..500 {
            let node = StyleableNode::new("Button")
                .with_id(format!("b{i}"))
                .with_style(format!("-fx-spacing: {i}"));
            assert_eq!(value(&engine, &[&node], "-fx-opacity"), Some(StyleValue::Number(0.5)));
            assert_eq!(
                value(&engine, &[&node], "-fx-spacing"),
                Some(StyleValue::Number(f64::from(i)))
            );
        }

        let stats = engine.cache_stats();
        assert!(stats.style_maps <= 16, "{stats:?}");
        assert!(stats.inline_styles <= 16, "{stats:?}");
        assert!(stats.size <= 16, "{stats:?}");
    }

    #[test]
    fn pseudo_class_state_gates_rules_and_cache() {
        let mut engine = StyleEngine::default();
        engine.parse_and_add(
            "Button { -fx-opacity: 0.5; } Button:hover { -fx-opacity: 1; }",
            StyleOrigin::Author,
        );
        let reg = Rc::clone(engine.pseudo_classes());
        let mut node = StyleableNode::new("Button");
        assert_eq!(value(&engine, &[&node], "-fx-opacity"), Some(StyleValue::Number(0.5)));
        node.set_pseudo_class(&reg, "hover", true).unwrap();
        assert_eq!(value(&engine, &[&node], "-fx-opacity"), Some(StyleValue::Number(1.0)));
        node.set_pseudo_class(&reg, "hover", false).unwrap();
        assert_eq!(value(&engine, &[&node], "-fx-opacity"), Some(StyleValue::Number(0.5)));
    }

    #[test]
    fn unrelated_pseudo_classes_share_cache_entries() {
        let mut engine = StyleEngine::default();
        engine.parse_and_add("Button { -fx-opacity: 0.5; }", StyleOrigin::Author);
        let reg = Rc::clone(engine.pseudo_classes());
        let plain = StyleableNode::new("Button");
        let focused = StyleableNode::new("Button")
            .with_pseudo_class(&reg, "focused")
            .unwrap();
        let a = engine.resolve(&[&plain], "-fx-opacity").unwrap().unwrap();
        let b = engine.resolve(&[&focused], "-fx-opacity").unwrap().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn descendant_selector_uses_ancestors() {
        let engine = engine(".dialog Button { -fx-opacity: 0.3; }");
        let dialog = StyleableNode::new("VBox").with_class("dialog");
        let pane = StyleableNode::new("HBox");
        let button = StyleableNode::new("Button");
        assert_eq!(
            value(&engine, &[&button, &pane, &dialog], "-fx-opacity"),
            Some(StyleValue::Number(0.3))
        );
        assert_eq!(value(&engine, &[&button, &pane], "-fx-opacity"), None);
    }

    #[test]
    fn inheritable_properties_come_from_ancestors() {
        let engine = engine(".root { -fx-text-fill: #112233; -fx-opacity: 0.5; }");
        let root = StyleableNode::new("Pane").with_class("root");
        let label = StyleableNode::new("Label");
        let fill = engine.resolve(&[&label, &root], "-fx-text-fill").unwrap().unwrap();
        assert_eq!(Some(fill.value.clone()), color("#112233"));
        assert!(fill.inherited);
        assert_eq!(value(&engine, &[&label, &root], "-fx-opacity"), None);
    }

    #[test]
    fn inherit_keyword_takes_parent_value() {
        let engine = engine(".root { -fx-opacity: 0.4; } Label { -fx-opacity: inherit; }");
        let root = StyleableNode::new("Pane").with_class("root");
        let label = StyleableNode::new("Label");
        let resolved = engine.resolve(&[&label, &root], "-fx-opacity").unwrap().unwrap();
        assert_eq!(resolved.value, StyleValue::Number(0.4));
        assert!(resolved.inherited);
        assert_eq!(value(&engine, &[&label], "-fx-opacity"), None);
    }

    #[test]
    fn looked_up_values_resolve_through_ancestors() {
        let engine = engine(
            ".root { -fx-base: #336699; }
             Button { -fx-text-fill: -fx-base; -fx-border-color: null; }",
        );
        let root = StyleableNode::new("Pane").with_class("root");
        let button = StyleableNode::new("Button");
        assert_eq!(value(&engine, &[&button, &root], "-fx-text-fill"), color("#336699"));
        assert_eq!(
            value(&engine, &[&button, &root], "-fx-border-color"),
            Some(StyleValue::Null)
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn cyclic_lookup_is_reported_and_skipped() {
        let engine = engine(
            "Button { -fx-a: -fx-b; -fx-b: -fx-a; -fx-text-fill: -fx-a; }",
        );
        let button = StyleableNode::new("Button");
        assert_eq!(value(&engine, &[&button], "-fx-text-fill"), None);
        assert!(logs_contain("looked-up value not resolved"));
        assert!(logs_contain("unresolved lookup"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn conversion_failure_is_logged_and_skipped() {
        let engine = engine("Button { -fx-opacity: #ff0000; }");
        let button = StyleableNode::new("Button");
        assert_eq!(value(&engine, &[&button], "-fx-opacity"), None);
        assert!(logs_contain("style conversion failed"));
    }

    #[test]
    fn user_set_values_skip_user_agent_and_inherited_styles() {
        let mut engine = StyleEngine::default();
        engine.parse_and_add("Label { -fx-opacity: 0.5; }", StyleOrigin::UserAgent);
        engine.parse_and_add(".root { -fx-text-fill: #ffffff; }", StyleOrigin::Author);
        engine.parse_and_add(".warn { -fx-opacity: 0.7; }", StyleOrigin::Author);
        let root = StyleableNode::new("Pane").with_class("root");
        let mut label = StyleableNode::new("Label");
        label.mark_user_set("-fx-opacity");
        label.mark_user_set("-fx-text-fill");
        assert_eq!(value(&engine, &[&label, &root], "-fx-opacity"), None);
        assert_eq!(value(&engine, &[&label, &root], "-fx-text-fill"), None);

        label.add_style_class("warn");
        assert_eq!(
            value(&engine, &[&label, &root], "-fx-opacity"),
            Some(StyleValue::Number(0.7))
        );
    }

    #[test]
    fn em_units_use_node_font_and_font_sizes_use_parent() {
        let engine = engine(
            ".root { -fx-font-size: 20px; }
             Label { -fx-padding: 0.5em; -fx-font-size: 1.5em; }",
        );
        let root = StyleableNode::new("Pane").with_class("root");
        let label = StyleableNode::new("Label");
        let chain: &StyleChain<'_> = &[&label, &root];
        assert_eq!(value(&engine, chain, FONT_SIZE), Some(StyleValue::Number(30.0)));
        let padding = engine.resolve(chain, "-fx-padding").unwrap().unwrap();
        assert_eq!(padding.value, StyleValue::Insets(Insets::uniform(15.0)));
        assert!(padding.relative);
    }

    #[test]
    fn composite_font_assembles_from_sub_properties() {
        let engine = engine(
            ".root { -fx-font: italic 16px \"Serif\"; }
             Label { -fx-font-weight: bold; }",
        );
        let root = StyleableNode::new("Pane").with_class("root");
        let label = StyleableNode::new("Label");
        let font = value(&engine, &[&label, &root], FONT).unwrap();
        let expected = Font {
            family: "Serif".into(),
            size: 16.0,
            weight: 700,
            posture: crate::value::FontPosture::Italic,
        };
        assert_eq!(font, StyleValue::Font(expected));
    }

    #[test]
    fn sub_property_falls_back_to_shorthand() {
        let engine = engine("Label { -fx-font: bold 18px Arial; }");
        let label = StyleableNode::new("Label");
        assert_eq!(value(&engine, &[&label], FONT_SIZE), Some(StyleValue::Number(18.0)));
        let styles = engine.matching_styles(&[&label], FONT_SIZE).unwrap();
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].property(), FONT);
    }

    #[test]
    fn unknown_property_is_an_error() {
        let engine = StyleEngine::default();
        let node = StyleableNode::new("Button");
        assert_eq!(
            engine.resolve(&[&node], "-fx-nope"),
            Err(CssError::UnknownProperty("-fx-nope".into()))
        );
    }

    #[test]
    fn removing_stylesheet_invalidates() {
        let mut engine = StyleEngine::default();
        let (id, _) = engine.parse_and_add("Button { -fx-opacity: 0.5; }", StyleOrigin::Author);
        let node = StyleableNode::new("Button");
        assert!(value(&engine, &[&node], "-fx-opacity").is_some());
        assert!(engine.remove_stylesheet(id).is_some());
        assert_eq!(value(&engine, &[&node], "-fx-opacity"), None);
        assert!(engine.remove_stylesheet(id).is_none());
    }

    #[test]
    fn resolve_all_lists_styled_properties() {
        let engine = engine("Button { -fx-opacity: 0.5; -fx-spacing: 2; }");
        let node = StyleableNode::new("Button");
        let names: Vec<String> = engine
            .resolve_all(&[&node])
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["-fx-opacity", "-fx-spacing"]);
    }
}
