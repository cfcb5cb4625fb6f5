//! End-to-end styling scenarios: stylesheet text through the engine into
//! styleable properties.

use std::rc::Rc;

use prism_beans::{Observable, ObservableValueExt, Property, bindings};
use prism_css::{
    Color, CssError, Insets, StyleChain, StyleEngine, StyleOrigin, StyleValue, Styleable,
    StyleableNode, StyleableProperty,
};

const USER_AGENT: &str = r"
    /* defaults */
    .root { -fx-font: 12px System; -fx-text-fill: #333333; -fx-base: #4488cc; }
    Button { -fx-padding: 4px 8px; -fx-background-color: -fx-base; }
    Button:hover { -fx-background-color: -fx-base, #ffffff; }
    Button:pressed { -fx-background-color: #224466; }
";

const AUTHOR: &str = r"
    .dialog Button { -fx-padding: 0.5em; }
    #ok { -fx-text-fill: #008800; }
    .danger { -fx-text-fill: red; }
    .dialog > .danger { -fx-text-fill: #ff0000 !important; }
";

fn engine() -> StyleEngine {
    let mut engine = StyleEngine::default();
    let (_, errors) = engine.parse_and_add(USER_AGENT, StyleOrigin::UserAgent);
    assert!(errors.is_empty(), "{errors:?}");
    let (_, errors) = engine.parse_and_add(AUTHOR, StyleOrigin::Author);
    assert!(errors.is_empty(), "{errors:?}");
    engine
}

fn resolve(engine: &StyleEngine, chain: &StyleChain<'_>, property: &str) -> Option<StyleValue> {
    engine
        .resolve(chain, property)
        .unwrap()
        .map(|v| v.value.clone())
}

#[test]
fn three_rules_of_increasing_specificity() {
    let mut engine = StyleEngine::default();
    engine.parse_and_add(
        "#ok { -fx-opacity: 0.3; }
         Button.primary { -fx-opacity: 0.2; }
         Button { -fx-opacity: 0.1; }",
        StyleOrigin::Author,
    );
    let node = StyleableNode::new("Button").with_id("ok").with_class("primary");
    assert_eq!(resolve(&engine, &[&node], "-fx-opacity"), Some(StyleValue::Number(0.3)));
}

#[test]
fn author_rules_outrank_user_agent_rules() {
    let engine = engine();
    let root = StyleableNode::new("Pane").with_class("root");
    let ok = StyleableNode::new("Button").with_id("ok");
    assert_eq!(
        resolve(&engine, &[&ok, &root], "-fx-text-fill"),
        Some(StyleValue::Color(Color::rgb(0, 0x88, 0)))
    );
}

#[test]
fn looked_up_color_and_pseudo_class_layers() {
    let engine = engine();
    let reg = Rc::clone(engine.pseudo_classes());
    let root = StyleableNode::new("Pane").with_class("root");
    let mut button = StyleableNode::new("Button");

    let base = StyleValue::Color(Color::rgb(0x44, 0x88, 0xcc));
    assert_eq!(
        resolve(&engine, &[&button, &root], "-fx-background-color"),
        Some(StyleValue::List(vec![base]))
    );

    button.set_pseudo_class(&reg, "pressed", true).unwrap();
    assert_eq!(
        resolve(&engine, &[&button, &root], "-fx-background-color"),
        Some(StyleValue::List(vec![StyleValue::Color(Color::rgb(0x22, 0x44, 0x66))]))
    );
}

#[test]
fn relative_padding_follows_inherited_font() {
    let engine = engine();
    let root = StyleableNode::new("Pane").with_class("root");
    let dialog = StyleableNode::new("VBox").with_class("dialog");
    let button = StyleableNode::new("Button");
    let chain: &StyleChain<'_> = &[&button, &dialog, &root];

    let padding = engine.resolve(chain, "-fx-padding").unwrap().unwrap();
    assert_eq!(padding.value, StyleValue::Insets(Insets::uniform(6.0)));
    assert_eq!(padding.origin, StyleOrigin::Author);

    assert_eq!(
        resolve(&engine, &[&button, &root], "-fx-padding"),
        Some(StyleValue::Insets(Insets {
            top: 4.0,
            right: 8.0,
            bottom: 4.0,
            left: 8.0
        }))
    );
}

#[test]
fn important_child_rule_beats_inline_style() {
    let engine = engine();
    let dialog = StyleableNode::new("VBox").with_class("dialog");
    let label = StyleableNode::new("Label")
        .with_class("danger")
        .with_style("-fx-text-fill: #0000ff");
    assert_eq!(
        resolve(&engine, &[&label, &dialog], "-fx-text-fill"),
        Some(StyleValue::Color(Color::rgb(255, 0, 0)))
    );

    let outside = StyleableNode::new("Pane");
    assert_eq!(
        resolve(&engine, &[&label, &outside], "-fx-text-fill"),
        Some(StyleValue::Color(Color::rgb(0, 0, 255)))
    );
}

#[test]
fn parse_errors_keep_the_rest_of_the_sheet() {
    let mut engine = StyleEngine::default();
    let (_, errors) = engine.parse_and_add(
        "Button { -fx-opacity: 0.5; } Button:: { -fx-opacity: 1; } Label { -fx-spacing: 3; }",
        StyleOrigin::Author,
    );
    assert!(errors.iter().all(|e| matches!(e, CssError::Parse { .. })));
    assert!(!errors.is_empty());

    let button = StyleableNode::new("Button");
    let label = StyleableNode::new("Label");
    assert_eq!(resolve(&engine, &[&button], "-fx-opacity"), Some(StyleValue::Number(0.5)));
    assert_eq!(resolve(&engine, &[&label], "-fx-spacing"), Some(StyleValue::Number(3.0)));
}

#[test]
fn styleable_property_tracks_cascade_and_bindings() {
    let mut engine = StyleEngine::default();
    let (sheet, _) = engine.parse_and_add("Button { -fx-opacity: 0.5; }", StyleOrigin::Author);
    let node = StyleableNode::new("Button");
    let opacity = StyleableProperty::new("-fx-opacity", 1.0);

    let doubled = bindings::multiply(opacity.property(), &Property::new(2.0));
    let seen = Rc::new(std::cell::Cell::new(0.0));
    let sink = Rc::clone(&seen);
    let _sub = doubled.add_change_listener(move |_, new: &f64| sink.set(*new));

    let resolved = engine.resolve(&[&node], opacity.css_name()).unwrap();
    assert!(opacity.apply_resolved(resolved.as_deref()));
    assert_eq!(doubled.get(), 1.0);
    assert_eq!(seen.get(), 1.0);

    engine.remove_stylesheet(sheet);
    let resolved = engine.resolve(&[&node], opacity.css_name()).unwrap();
    assert!(opacity.apply_resolved(resolved.as_deref()));
    assert_eq!(opacity.get(), 1.0);
    assert_eq!(doubled.get(), 2.0);
    assert!(opacity.listener_count() > 0);
}

#[test]
fn user_set_node_ignores_user_agent_padding() {
    let engine = engine();
    let root = StyleableNode::new("Pane").with_class("root");
    let mut button = StyleableNode::new("Button");
    button.mark_user_set("-fx-padding");
    assert_eq!(resolve(&engine, &[&button, &root], "-fx-padding"), None);
    assert!(button.is_user_set("-fx-padding"));
}
