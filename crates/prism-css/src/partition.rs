#![forbid(unsafe_code)]

//! Selector index for sub-linear candidate lookup.
//!
//! Each selector is filed under exactly one bucket chosen from its subject:
//! the id if present, else its first style class, else its type name, else
//! the universal bucket. A lookup visits only the buckets a node's identity
//! can reach, then filters by the subject's full identity.
//!
//! # Invariants
//!
//! 1. [`SelectorPartitioning::matches`] returns every selector whose subject
//!    identity matches, i.e. the same set as a linear scan with
//!    [`SimpleSelector::applies`](crate::SimpleSelector::applies).
//! 2. Each selector appears at most once in a result, in insertion order.
//! 3. Ancestor and pseudo-class constraints are not checked here.

use std::rc::Rc;

use ahash::AHashMap;

use crate::selector::{Selector, SimpleSelector};
use crate::stylesheet::Rule;

/// A selector filed in the index, with the rule that owns it.
#[derive(Clone, Debug)]
pub struct SelectorEntry {
    pub rule: Rc<Rule>,
    /// Position of the selector within `rule.selectors`.
    pub index: usize,
    /// Insertion order across the whole index.
    pub ordinal: usize,
}

impl SelectorEntry {
    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.rule.selectors[self.index]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bucket<'a> {
    Id(&'a str),
    Class(&'a str),
    Type(&'a str),
    Universal,
}

fn bucket_of(subject: &SimpleSelector) -> Bucket<'_> {
    if let Some(id) = &subject.id {
        Bucket::Id(id)
    } else if let Some(class) = subject.style_classes.first() {
        Bucket::Class(class)
    } else if !subject.is_universal() {
        Bucket::Type(&subject.name)
    } else {
        Bucket::Universal
    }
}

/// Buckets of selectors keyed by id, style class and type name.
#[derive(Debug, Default)]
pub struct SelectorPartitioning {
    entries: Vec<SelectorEntry>,
    by_id: AHashMap<String, Vec<usize>>,
    by_class: AHashMap<String, Vec<usize>>,
    by_type: AHashMap<String, Vec<usize>>,
    universal: Vec<usize>,
}

impl SelectorPartitioning {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File every selector of `rule`.
    pub fn partition_rule(&mut self, rule: &Rc<Rule>) {
        for index in 0..rule.selectors.len() {
            self.partition(Rc::clone(rule), index);
        }
    }

    /// File `rule.selectors[index]` and return its ordinal.
    pub fn partition(&mut self, rule: Rc<Rule>, index: usize) -> usize {
        let ordinal = self.entries.len();
        let slot = match bucket_of(rule.selectors[index].subject()) {
            Bucket::Id(id) => self.by_id.entry(id.to_string()).or_default(),
            Bucket::Class(class) => self.by_class.entry(class.to_string()).or_default(),
            Bucket::Type(name) => self.by_type.entry(name.to_string()).or_default(),
            Bucket::Universal => &mut self.universal,
        };
        slot.push(ordinal);
        self.entries.push(SelectorEntry {
            rule,
            index,
            ordinal,
        });
        ordinal
    }

    /// Selectors whose subject can match a node with this identity.
    #[must_use]
    pub fn matches(
        &self,
        id: Option<&str>,
        type_name: &str,
        classes: &[String],
    ) -> Vec<&SelectorEntry> {
        let mut hits: Vec<usize> = Vec::new();
        if let Some(id) = id
            && let Some(bucket) = self.by_id.get(id)
        {
            hits.extend(bucket);
        }
        for class in classes {
            if let Some(bucket) = self.by_class.get(class) {
                hits.extend(bucket);
            }
        }
        if let Some(bucket) = self.by_type.get(type_name) {
            hits.extend(bucket);
        }
        hits.extend(&self.universal);

        hits.sort_unstable();
        hits.dedup();
        hits.into_iter()
            .map(|i| &self.entries[i])
            .filter(|e| subject_matches(e.selector().subject(), id, type_name, classes))
            .collect()
    }

    /// Every filed selector in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &SelectorEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn subject_matches(
    s: &SimpleSelector,
    id: Option<&str>,
    type_name: &str,
    classes: &[String],
) -> bool {
    (s.is_universal() || s.name == type_name)
        && s.id.as_deref().is_none_or(|want| id == Some(want))
        && s.style_classes.iter().all(|c| classes.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_selector;
    use crate::pseudo_class::PseudoClassRegistry;

    fn index(selectors: &[&str]) -> SelectorPartitioning {
        let reg = PseudoClassRegistry::default();
        let mut p = SelectorPartitioning::new();
        for text in selectors {
            let sel = parse_selector(text, &reg).unwrap();
            p.partition_rule(&Rc::new(Rule::new(vec![sel], Vec::new())));
        }
        p
    }

    fn matched(
        p: &SelectorPartitioning,
        id: Option<&str>,
        ty: &str,
        classes: &[&str],
    ) -> Vec<String> {
        let classes: Vec<String> = classes.iter().map(|c| (*c).to_string()).collect();
        p.matches(id, ty, &classes)
            .into_iter()
            .map(|e| e.selector().to_string())
            .collect()
    }

    #[test]
    fn buckets_by_most_selective_predicate() {
        let p = index(&["#ok", ".button", "Button", "*", "Button.button#ok", "Label"]);
        assert_eq!(
            matched(&p, Some("ok"), "Button", &["button"]),
            vec!["#ok", ".button", "Button", "*", "Button#ok.button"]
        );
        assert_eq!(matched(&p, None, "Label", &[]), vec!["*", "Label"]);
    }

    #[test]
    fn filters_on_full_subject_identity() {
        let p = index(&[".a.b", "Button.a", "#x.a"]);
        assert_eq!(matched(&p, None, "Label", &["a"]), Vec::<String>::new());
        assert_eq!(matched(&p, None, "Label", &["a", "b"]), vec![".a.b"]);
        assert_eq!(matched(&p, Some("x"), "Label", &["a"]), vec!["#x.a"]);
    }

    #[test]
    fn duplicate_classes_do_not_duplicate_results() {
        let p = index(&[".a"]);
        assert_eq!(matched(&p, None, "Label", &["a", "a"]), vec![".a"]);
    }

    #[test]
    fn compound_selectors_are_filed_by_subject() {
        let p = index(&[".root Label", "VBox > .cell"]);
        assert_eq!(matched(&p, None, "Label", &[]), vec![".root Label"]);
        assert_eq!(matched(&p, None, "Text", &["cell"]), vec!["VBox > .cell"]);
    }
}
