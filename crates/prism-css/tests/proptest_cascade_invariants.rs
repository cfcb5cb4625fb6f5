//! Property-based invariant tests for selector matching and the cascade.
//!
//! 1. The selector index returns exactly what a linear scan returns, each
//!    selector once, in insertion order.
//! 2. The resolved value is the one declared by the greatest matching rule
//!    under (important, origin, specificity, source order).
//! 3. Cascade precedence is a total order consistent with sorting.
//! 4. Resolving twice without changes returns the same cached value.

use std::rc::Rc;

use prism_css::{
    CascadingStyle, PseudoClassRegistry, Rule, SelectorPartitioning, StyleEngine, StyleOrigin,
    StyleValue, Styleable, StyleableNode, parse_selector,
};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

const TYPES: [&str; 3] = ["Button", "Label", "Pane"];
const IDS: [&str; 2] = ["ok", "cancel"];
const CLASSES: [&str; 3] = ["x", "y", "z"];

#[derive(Clone, Debug)]
struct Ident {
    type_name: Option<usize>,
    id: Option<usize>,
    classes: Vec<usize>,
}

impl Ident {
    fn selector_text(&self) -> String {
        let mut text = self.type_name.map_or(String::new(), |t| TYPES[t].to_string());
        if let Some(id) = self.id {
            text.push('#');
            text.push_str(IDS[id]);
        }
        for &c in &self.classes {
            text.push('.');
            text.push_str(CLASSES[c]);
        }
        if text.is_empty() {
            text.push('*');
        }
        text
    }

    fn node(&self) -> StyleableNode {
        let mut node = StyleableNode::new(TYPES[self.type_name.unwrap_or(0)]);
        if let Some(id) = self.id {
            node = node.with_id(IDS[id]);
        }
        for &c in &self.classes {
            node = node.with_class(CLASSES[c]);
        }
        node
    }
}

fn ident_strategy() -> impl Strategy<Value = Ident> {
    (
        proptest::option::of(0..TYPES.len()),
        proptest::option::of(0..IDS.len()),
        proptest::collection::btree_set(0..CLASSES.len(), 0..=2),
    )
        .prop_map(|(type_name, id, classes)| Ident {
            type_name,
            id,
            classes: classes.into_iter().collect(),
        })
}

fn origin_strategy() -> impl Strategy<Value = StyleOrigin> {
    prop_oneof![
        Just(StyleOrigin::UserAgent),
        Just(StyleOrigin::User),
        Just(StyleOrigin::Author),
    ]
}

#[derive(Clone, Debug)]
struct RuleSpec {
    selector: Ident,
    origin: StyleOrigin,
    important: bool,
}

fn rule_strategy() -> impl Strategy<Value = RuleSpec> {
    (ident_strategy(), origin_strategy(), proptest::bool::weighted(0.2)).prop_map(
        |(selector, origin, important)| RuleSpec {
            selector,
            origin,
            important,
        },
    )
}

fn engine_for(rules: &[RuleSpec]) -> StyleEngine {
    let mut engine = StyleEngine::default();
    for (i, rule) in rules.iter().enumerate() {
        let important = if rule.important { " !important" } else { "" };
        let text = format!("{} {{ -fx-opacity: {i}{important}; }}", rule.selector.selector_text());
        let (_, errors) = engine.parse_and_add(&text, rule.origin);
        assert!(errors.is_empty(), "{text}: {errors:?}");
    }
    engine
}

// ── Invariants ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn partition_matches_linear_scan(
        selectors in proptest::collection::vec(ident_strategy(), 1..30),
        node in ident_strategy(),
    ) {
        let registry = PseudoClassRegistry::default();
        let mut index = SelectorPartitioning::new();
        for ident in &selectors {
            let selector = parse_selector(&ident.selector_text(), &registry).unwrap();
            index.partition_rule(&Rc::new(Rule::new(vec![selector], Vec::new())));
        }
        let node = node.node();

        let indexed: Vec<usize> = index
            .matches(node.id(), node.type_selector(), node.style_classes())
            .into_iter()
            .map(|e| e.ordinal)
            .collect();
        let scanned: Vec<usize> = index
            .entries()
            .filter(|e| e.selector().subject().applies(&node))
            .map(|e| e.ordinal)
            .collect();
        prop_assert_eq!(indexed, scanned);
    }

    #[test]
    fn resolved_value_is_greatest_matching_rule(
        rules in proptest::collection::vec(rule_strategy(), 1..20),
        node in ident_strategy(),
    ) {
        let engine = engine_for(&rules);
        let registry = PseudoClassRegistry::default();
        let node = node.node();

        let expected = rules
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                let selector = parse_selector(&r.selector.selector_text(), &registry).unwrap();
                selector.subject().applies(&node)
            })
            .max_by_key(|(i, r)| {
                let selector = parse_selector(&r.selector.selector_text(), &registry).unwrap();
                (r.important, r.origin, selector.specificity(), *i)
            })
            .map(|(i, _)| StyleValue::Number(i as f64));

        let resolved = engine.resolve(&[&node], "-fx-opacity").unwrap();
        prop_assert_eq!(resolved.map(|v| v.value.clone()), expected);
    }

    #[test]
    fn matching_styles_are_sorted_and_totally_ordered(
        rules in proptest::collection::vec(rule_strategy(), 1..20),
        node in ident_strategy(),
    ) {
        let engine = engine_for(&rules);
        let node = node.node();
        let styles: Vec<CascadingStyle> = engine.matching_styles(&[&node], "-fx-opacity").unwrap();

        for pair in styles.windows(2) {
            prop_assert!(pair[0] >= pair[1]);
        }
        for a in &styles {
            for b in &styles {
                prop_assert_eq!(a.cmp(b), b.cmp(a).reverse());
                prop_assert_eq!(a == b, a.ordinal() == b.ordinal());
            }
        }
        if let Some(first) = styles.first() {
            let resolved = engine.resolve(&[&node], "-fx-opacity").unwrap().unwrap();
            let declared = StyleValue::Number(first.ordinal() as f64);
            prop_assert_eq!(&resolved.value, &declared);
        }
    }

    #[test]
    fn repeated_resolution_is_cached(
        rules in proptest::collection::vec(rule_strategy(), 1..10),
        node in ident_strategy(),
    ) {
        let engine = engine_for(&rules);
        let node = node.node();
        let first = engine.resolve(&[&node], "-fx-opacity").unwrap();
        let second = engine.resolve(&[&node], "-fx-opacity").unwrap();
        match (first, second) {
            (Some(a), Some(b)) => prop_assert!(Rc::ptr_eq(&a, &b)),
            (None, None) => {}
            (a, b) => prop_assert!(false, "cache changed the outcome: {a:?} vs {b:?}"),
        }
    }
}
