#![forbid(unsafe_code)]

//! Stylesheet text parser.
//!
//! Grammar (informal):
//!
//! ```text
//! sheet       := rule*
//! rule        := selector ("," selector)* "{" declaration? (";" declaration?)* "}"
//! selector    := simple (combinator simple)*
//! combinator  := whitespace | ">"
//! simple      := (type | "*")? ("#" id | "." class | ":" pseudo)*
//! declaration := property ":" value ("!" "important")?
//! value       := layer ("," layer)*
//! layer       := term+
//! term        := number | number unit | percentage | ident | string
//!              | "#" hex | rgb(...) | rgba(...)
//! ```
//!
//! # Failure Modes
//!
//! Parsing never fails as a whole. A rule whose selector cannot be parsed
//! is dropped; a declaration whose value cannot be parsed is dropped from
//! its rule. Each drop is logged at `warn` and reported as a
//! [`CssError::Parse`] next to the partial [`Stylesheet`].

mod token;

use tracing::{debug, warn};

use crate::error::CssError;
use crate::pseudo_class::PseudoClassRegistry;
use crate::selector::{Combinator, CompoundSelector, Selector, SimpleSelector};
use crate::stylesheet::{Declaration, Rule, StyleOrigin, Stylesheet};
use crate::value::{Color, ParsedValue, Size, SizeUnits};

use token::{Spanned, Token, Tokenizer};

/// Parse a stylesheet, keeping every rule that parses.
pub fn parse_stylesheet(
    text: &str,
    origin: StyleOrigin,
    registry: &PseudoClassRegistry,
) -> (Stylesheet, Vec<CssError>) {
    let tokens = Tokenizer::new(text).tokenize_all();
    let mut parser = Parser::new(&tokens, registry);
    let mut sheet = Stylesheet::new(origin);
    for rule in parser.rules() {
        sheet.add_rule(rule);
    }
    debug!(
        origin = %origin,
        rules = sheet.rules().len(),
        errors = parser.errors.len(),
        "parsed stylesheet"
    );
    (sheet, parser.errors)
}

/// Parse a declaration list such as a node's `style` attribute.
pub fn parse_declarations(text: &str) -> (Vec<Declaration>, Vec<CssError>) {
    let tokens = Tokenizer::new(text).tokenize_all();
    // Declarations never reference pseudo-classes.
    let registry = PseudoClassRegistry::with_capacity(0);
    let mut parser = Parser::new(&tokens, &registry);
    let declarations = parser.declarations(false);
    (declarations, parser.errors)
}

/// Parse a single selector group entry, e.g. `.root > Label:hover`.
pub fn parse_selector(text: &str, registry: &PseudoClassRegistry) -> Result<Selector, CssError> {
    let tokens = Tokenizer::new(text).tokenize_all();
    let parser = Parser::new(&tokens, registry);
    let (start, end) = trim_ws(&tokens, 0, tokens.len());
    parser.selector(start, end)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    registry: &'a PseudoClassRegistry,
    errors: Vec<CssError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], registry: &'a PseudoClassRegistry) -> Self {
        Self {
            tokens,
            pos: 0,
            registry,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn line_at(&self, pos: usize) -> usize {
        self.tokens
            .get(pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |s| s.line)
    }

    fn error(&mut self, pos: usize, message: String) {
        let line = self.line_at(pos);
        warn!(line, message = %message, "dropping malformed stylesheet input");
        self.errors.push(CssError::parse(line, message));
    }

    fn skip_ws(&mut self) {
        while self.peek() == Some(&Token::Whitespace) {
            self.pos += 1;
        }
    }

    // --- Rules ---

    fn rules(&mut self) -> Vec<Rule> {
        let mut rules = Vec::new();
        loop {
            self.skip_ws();
            let Some(tok) = self.peek() else {
                break;
            };
            let start = self.pos;
            if let Token::Delim('@') = tok {
                self.error(start, "at-rules are not supported".to_string());
                self.skip_statement();
                continue;
            }
            if let Token::RBrace = tok {
                self.error(start, "unexpected '}'".to_string());
                self.pos += 1;
                continue;
            }

            // Prelude runs to the next '{'.
            while self.peek().is_some_and(|t| *t != Token::LBrace) {
                self.pos += 1;
            }
            if self.peek().is_none() {
                self.error(start, "expected '{' after selector".to_string());
                break;
            }
            let prelude_end = self.pos;
            self.pos += 1;

            let selectors = self.selector_group(start, prelude_end);
            let declarations = self.declarations(true);
            match selectors {
                Ok(selectors) => rules.push(Rule::new(selectors, declarations)),
                Err(err) => {
                    warn!(error = %err, "dropping rule with invalid selector");
                    self.errors.push(err);
                }
            }
        }
        rules
    }

    /// Skip an at-rule: up to `;` or past a balanced `{ ... }` block.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            self.pos += 1;
            match tok {
                Token::Semicolon if depth == 0 => return,
                Token::LBrace => depth += 1,
                Token::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    // --- Selectors ---

    fn selector_group(&self, start: usize, end: usize) -> Result<Vec<Selector>, CssError> {
        let mut selectors = Vec::new();
        let mut part_start = start;
        for i in start..=end {
            if i == end || self.tokens[i].token == Token::Comma {
                let (s, e) = trim_ws(self.tokens, part_start, i);
                selectors.push(self.selector(s, e)?);
                part_start = i + 1;
            }
        }
        Ok(selectors)
    }

    fn selector(&self, start: usize, end: usize) -> Result<Selector, CssError> {
        let mut simples = Vec::new();
        let mut relationships = Vec::new();
        let mut pos = start;
        loop {
            let (simple, next) = self.simple_selector(pos, end)?;
            simples.push(simple);
            pos = next;
            if pos >= end {
                break;
            }
            let mut combinator = None;
            while pos < end {
                match self.tokens[pos].token {
                    Token::Whitespace if combinator.is_none() => {
                        combinator = Some(Combinator::Descendant);
                    }
                    Token::Whitespace => {}
                    Token::Delim('>') => combinator = Some(Combinator::Child),
                    _ => break,
                }
                pos += 1;
            }
            match combinator {
                Some(c) if pos < end => relationships.push(c),
                _ => {
                    return Err(CssError::parse(
                        self.line_at(pos),
                        "expected selector after combinator",
                    ));
                }
            }
        }
        if relationships.is_empty() && simples.len() == 1 {
            return Ok(Selector::Simple(simples.remove(0)));
        }
        Ok(Selector::Compound(CompoundSelector::new(simples, relationships)))
    }

    fn simple_selector(
        &self,
        start: usize,
        end: usize,
    ) -> Result<(SimpleSelector, usize), CssError> {
        let mut pos = start;
        let mut selector = match self.tokens.get(pos).map(|s| &s.token) {
            Some(Token::Ident(name)) if pos < end => {
                pos += 1;
                SimpleSelector::of_type(name.as_str())
            }
            Some(Token::Delim('*')) if pos < end => {
                pos += 1;
                SimpleSelector::universal()
            }
            _ => SimpleSelector::universal(),
        };
        let mut parts = usize::from(pos > start);

        while pos < end {
            match &self.tokens[pos].token {
                Token::Hash(id) => {
                    selector.id = Some(id.clone());
                    pos += 1;
                }
                Token::Delim('.') => match self.tokens.get(pos + 1).map(|s| &s.token) {
                    Some(Token::Ident(class)) if pos + 1 < end => {
                        selector.style_classes.push(class.clone());
                        pos += 2;
                    }
                    _ => {
                        let line = self.line_at(pos);
                        return Err(CssError::parse(line, "expected class name after '.'"));
                    }
                },
                Token::Colon => match self.tokens.get(pos + 1).map(|s| &s.token) {
                    Some(Token::Ident(name)) if pos + 1 < end => {
                        let pc = self.registry.get_or_register(name)?;
                        selector.pseudo_classes.insert(&pc);
                        selector.pseudo_class_names.push(name.clone());
                        pos += 2;
                    }
                    _ => {
                        return Err(CssError::parse(
                            self.line_at(pos),
                            "expected pseudo-class name after ':'",
                        ));
                    }
                },
                Token::Whitespace | Token::Delim('>') => break,
                other => {
                    return Err(CssError::parse(
                        self.line_at(pos),
                        format!("unexpected token in selector: {other:?}"),
                    ));
                }
            }
            parts += 1;
        }
        if parts == 0 {
            return Err(CssError::parse(self.line_at(pos), "empty selector"));
        }
        Ok((selector, pos))
    }

    // --- Declarations ---

    /// Parse declarations up to a closing `}` (when `in_block`) or the end
    /// of input, consuming the brace.
    fn declarations(&mut self, in_block: bool) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        loop {
            self.skip_ws();
            let start = self.pos;
            match self.peek() {
                None => {
                    if in_block {
                        self.error(start, "unclosed block".to_string());
                    }
                    break;
                }
                Some(Token::RBrace) if in_block => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Semicolon) => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            // A declaration runs to ';' or to the block's closing brace.
            let mut depth = 0usize;
            while let Some(tok) = self.peek() {
                match tok {
                    Token::Semicolon if depth == 0 => break,
                    Token::RBrace if depth == 0 && in_block => break,
                    Token::Function(_) => depth += 1,
                    Token::RParen => depth = depth.saturating_sub(1),
                    _ => {}
                }
                self.pos += 1;
            }
            let end = self.pos;
            match self.declaration(start, end) {
                Ok(decl) => declarations.push(decl),
                Err(message) => self.error(start, message),
            }
        }
        declarations
    }

    fn declaration(&self, start: usize, end: usize) -> Result<Declaration, String> {
        let (start, mut end) = trim_ws(self.tokens, start, end);
        let Some(Token::Ident(property)) = self.tokens.get(start).map(|s| &s.token) else {
            return Err("expected property name".to_string());
        };
        let mut pos = start + 1;
        while pos < end && self.tokens[pos].token == Token::Whitespace {
            pos += 1;
        }
        if pos >= end || self.tokens[pos].token != Token::Colon {
            return Err(format!("expected ':' after '{property}'"));
        }
        pos += 1;

        let mut important = false;
        if end >= pos + 2
            && self.tokens[end - 2].token == Token::Delim('!')
            && matches!(
                &self.tokens[end - 1].token,
                Token::Ident(s) if s.eq_ignore_ascii_case("important")
            )
        {
            important = true;
            end -= 2;
        }

        let (vstart, vend) = trim_ws(self.tokens, pos, end);
        if vstart >= vend {
            return Err(format!("missing value for '{property}'"));
        }
        let value = self.value(vstart, vend)?;
        let mut decl = Declaration::new(property, value);
        decl.important = important;
        Ok(decl)
    }

    // --- Values ---

    fn value(&self, start: usize, end: usize) -> Result<ParsedValue, String> {
        let mut layers = Vec::new();
        let mut layer = Vec::new();
        let mut pos = start;
        while pos < end {
            match &self.tokens[pos].token {
                Token::Whitespace => pos += 1,
                Token::Comma => {
                    layers.push(collapse_series(std::mem::take(&mut layer))?);
                    pos += 1;
                }
                _ => {
                    let (term, next) = self.term(pos, end)?;
                    layer.push(term);
                    pos = next;
                }
            }
        }
        layers.push(collapse_series(layer)?);
        if layers.len() == 1 {
            return layers.pop().ok_or_else(|| "empty value".to_string());
        }
        Ok(ParsedValue::Layers(layers))
    }

    fn term(&self, pos: usize, end: usize) -> Result<(ParsedValue, usize), String> {
        let value = match &self.tokens[pos].token {
            Token::Ident(s) if s.eq_ignore_ascii_case("inherit") => ParsedValue::Inherit,
            Token::Ident(s) => ParsedValue::Ident(s.clone()),
            Token::String(s) => ParsedValue::String(s.clone()),
            Token::Number(n) => ParsedValue::Number(*n),
            Token::Percentage(n) => ParsedValue::Size(Size::new(*n, SizeUnits::Percent)),
            Token::Dimension { value, unit } => {
                let units =
                    SizeUnits::from_suffix(unit).ok_or_else(|| format!("unknown unit '{unit}'"))?;
                ParsedValue::Size(Size::new(*value, units))
            }
            Token::Hash(hex) => ParsedValue::Color(
                Color::from_hex(hex).ok_or_else(|| format!("invalid color '#{hex}'"))?,
            ),
            Token::Function(name) => return self.function(name, pos + 1, end),
            other => return Err(format!("unexpected token in value: {other:?}")),
        };
        Ok((value, pos + 1))
    }

    /// `rgb(r, g, b)` / `rgba(r, g, b, a)` with numbers or percentages.
    fn function(
        &self,
        name: &str,
        start: usize,
        end: usize,
    ) -> Result<(ParsedValue, usize), String> {
        let lower = name.to_ascii_lowercase();
        let arity = match lower.as_str() {
            "rgb" => 3,
            "rgba" => 4,
            _ => return Err(format!("unsupported function '{name}()'")),
        };
        let mut args = Vec::new();
        let mut pos = start;
        loop {
            if pos >= end {
                return Err(format!("unclosed '{name}('"));
            }
            match &self.tokens[pos].token {
                Token::RParen => break,
                Token::Whitespace | Token::Comma => {}
                Token::Number(n) => args.push((*n, false)),
                Token::Percentage(n) => args.push((*n, true)),
                other => return Err(format!("unexpected {other:?} in '{name}()'")),
            }
            pos += 1;
        }
        if args.len() != arity {
            return Err(format!("'{name}()' takes {arity} arguments, got {}", args.len()));
        }
        let channel = |(v, pct): (f64, bool)| {
            let v = if pct { v * 2.55 } else { v };
            v.round().clamp(0.0, 255.0) as u8
        };
        let alpha = args.get(3).map_or(1.0, |&(v, pct)| {
            let a = if pct { v / 100.0 } else { v };
            a.clamp(0.0, 1.0)
        });
        let color = Color::rgba(channel(args[0]), channel(args[1]), channel(args[2]), alpha);
        Ok((ParsedValue::Color(color), pos + 1))
    }
}

fn collapse_series(mut terms: Vec<ParsedValue>) -> Result<ParsedValue, String> {
    match terms.len() {
        0 => Err("empty value layer".to_string()),
        1 => Ok(terms.remove(0)),
        _ => Ok(ParsedValue::Series(terms)),
    }
}

fn trim_ws(tokens: &[Spanned], mut start: usize, mut end: usize) -> (usize, usize) {
    while start < end && tokens[start].token == Token::Whitespace {
        start += 1;
    }
    while end > start && tokens[end - 1].token == Token::Whitespace {
        end -= 1;
    }
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (Stylesheet, Vec<CssError>) {
        parse_stylesheet(text, StyleOrigin::Author, &PseudoClassRegistry::default())
    }

    #[test]
    fn simple_rule() {
        let (sheet, errors) = parse(".button { -fx-padding: 4px 8px; -fx-opacity: 0.5 }");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(sheet.rules().len(), 1);
        let rule = &sheet.rules()[0];
        assert_eq!(rule.origin(), Some(StyleOrigin::Author));
        assert_eq!(rule.selectors[0].to_string(), ".button");
        assert_eq!(
            rule.declarations[0].value,
            ParsedValue::Series(vec![
                ParsedValue::Size(Size::px(4.0)),
                ParsedValue::Size(Size::px(8.0)),
            ])
        );
        assert_eq!(rule.declarations[1].value, ParsedValue::Number(0.5));
    }

    #[test]
    fn selector_groups_and_combinators() {
        let (sheet, errors) = parse("VBox > .label, #title:hover Text { -fx-rotate: 90deg; }");
        assert!(errors.is_empty(), "{errors:?}");
        let sels: Vec<String> =
            sheet.rules()[0].selectors.iter().map(ToString::to_string).collect();
        assert_eq!(sels, vec!["VBox > .label", "#title:hover Text"]);
        assert!(matches!(sheet.rules()[0].selectors[0], Selector::Compound(_)));
    }

    #[test]
    fn important_layers_and_colors() {
        let (sheet, errors) = parse(
            "* { -fx-background-color: #fff, rgba(0, 0, 0, 0.5) !important;
                 -fx-text-fill: rgb(100%, 0%, 0%); }",
        );
        assert!(errors.is_empty(), "{errors:?}");
        let decls = &sheet.rules()[0].declarations;
        assert!(decls[0].important);
        assert_eq!(
            decls[0].value,
            ParsedValue::Layers(vec![
                ParsedValue::Color(Color::WHITE),
                ParsedValue::Color(Color::rgba(0, 0, 0, 0.5)),
            ])
        );
        assert_eq!(decls[1].value, ParsedValue::Color(Color::rgb(255, 0, 0)));
        assert!(!decls[1].important);
    }

    #[test]
    fn keywords_strings_and_inherit() {
        let (sheet, _) = parse(
            "Label { -fx-font-family: \"Open Sans\"; -fx-text-fill: inherit; -fx-base: -fx-accent; }",
        );
        let decls = &sheet.rules()[0].declarations;
        assert_eq!(decls[0].value, ParsedValue::String("Open Sans".into()));
        assert_eq!(decls[1].value, ParsedValue::Inherit);
        assert_eq!(decls[2].value, ParsedValue::Ident("-fx-accent".into()));
    }

    #[test]
    #[tracing_test::traced_test]
    fn bad_rule_is_dropped_rest_survives() {
        let (sheet, errors) = parse(
            ".a { -fx-opacity: 1; }\n.b:: { -fx-opacity: 2; }\n.c { -fx-opacity: 3; }",
        );
        assert_eq!(sheet.rules().len(), 2);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], CssError::Parse { line: 2, .. }));
        assert!(logs_contain("dropping rule with invalid selector"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn bad_declaration_is_dropped_from_rule() {
        let (sheet, errors) = parse(".a { -fx-opacity: 1zz; -fx-rotate: 45deg; nonsense; }");
        assert_eq!(errors.len(), 2);
        let decls = &sheet.rules()[0].declarations;
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].property, "-fx-rotate");
        assert!(logs_contain("dropping malformed stylesheet input"));
    }

    #[test]
    fn at_rules_and_stray_braces_are_skipped() {
        let (sheet, errors) = parse("@font-face { src: x; }\n} .a { -fx-opacity: 1; }");
        assert_eq!(sheet.rules().len(), 1);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn pseudo_class_overflow_drops_rule() {
        let registry = PseudoClassRegistry::with_capacity(1);
        let (sheet, errors) = parse_stylesheet(
            ".a:hover { -fx-opacity: 1; } .b:focused { -fx-opacity: 2; }",
            StyleOrigin::Author,
            &registry,
        );
        assert_eq!(sheet.rules().len(), 1);
        assert_eq!(errors, vec![CssError::PseudoClassOverflow { capacity: 1 }]);
    }

    #[test]
    fn inline_declarations() {
        let (decls, errors) = parse_declarations("-fx-opacity: 0.25; -FX-ROTATE: 1turn");
        assert!(errors.is_empty());
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[1].property, "-fx-rotate");
        assert_eq!(decls[1].value, ParsedValue::Size(Size::new(1.0, SizeUnits::Turn)));
    }

    #[test]
    fn standalone_selector() {
        let registry = PseudoClassRegistry::default();
        let sel = parse_selector(" .root  >  Label:hover ", &registry).unwrap();
        assert_eq!(sel.to_string(), ".root > Label:hover");
        assert!(parse_selector(".root >", &registry).is_err());
        assert!(parse_selector("", &registry).is_err());
    }
}
