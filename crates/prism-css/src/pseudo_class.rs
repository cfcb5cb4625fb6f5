#![forbid(unsafe_code)]

//! Pseudo-class interning and state sets.
//!
//! Pseudo-class names are interned by a [`PseudoClassRegistry`] into dense
//! indices. A node's current states, and the states a selector requires,
//! are both [`PseudoClassState`] bit sets over those indices.
//!
//! # Invariants
//!
//! 1. An index, once handed out, names the same pseudo-class for the
//!    registry's lifetime.
//! 2. The registry never holds more than `capacity` names.
//! 3. `PseudoClassState` never stores trailing zero words, so two sets with
//!    the same members are `==` and hash identically regardless of their
//!    history.
//!
//! # Failure Modes
//!
//! Registering a new name on a full registry returns
//! [`CssError::PseudoClassOverflow`]; existing names still resolve.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::error::CssError;

const WORD_BITS: usize = 64;

/// An interned pseudo-class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PseudoClass {
    index: usize,
    name: Rc<str>,
}

impl PseudoClass {
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for PseudoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.name)
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    by_name: AHashMap<Rc<str>, usize>,
    names: Vec<Rc<str>>,
}

/// Name to index table for pseudo-classes, bounded by `capacity`.
///
/// Shared by reference (usually behind an `Rc`) between the stylesheet
/// parser, the engine and the nodes that set states.
#[derive(Debug)]
pub struct PseudoClassRegistry {
    capacity: usize,
    inner: RefCell<RegistryInner>,
}

impl Default for PseudoClassRegistry {
    fn default() -> Self {
        Self::with_capacity(1024)
    }
}

impl PseudoClassRegistry {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RefCell::new(RegistryInner::default()),
        }
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Intern `name`, returning the existing entry if it is already known.
    pub fn get_or_register(&self, name: &str) -> Result<PseudoClass, CssError> {
        if let Some(pc) = self.lookup(name) {
            return Ok(pc);
        }
        let mut inner = self.inner.borrow_mut();
        if inner.names.len() >= self.capacity {
            return Err(CssError::PseudoClassOverflow {
                capacity: self.capacity,
            });
        }
        let index = inner.names.len();
        let name: Rc<str> = Rc::from(name);
        inner.names.push(Rc::clone(&name));
        inner.by_name.insert(Rc::clone(&name), index);
        Ok(PseudoClass { index, name })
    }

    /// Find an already registered pseudo-class.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<PseudoClass> {
        let inner = self.inner.borrow();
        let (name, &index) = inner.by_name.get_key_value(name)?;
        Some(PseudoClass {
            index,
            name: Rc::clone(name),
        })
    }

    #[must_use]
    pub fn name_of(&self, index: usize) -> Option<Rc<str>> {
        self.inner.borrow().names.get(index).cloned()
    }

    /// Names of every member of `state`, in index order.
    #[must_use]
    pub fn names(&self, state: &PseudoClassState) -> Vec<Rc<str>> {
        let inner = self.inner.borrow();
        state
            .indices()
            .filter_map(|i| inner.names.get(i).cloned())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// State sets
// ---------------------------------------------------------------------------

/// Bit set of pseudo-class indices.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct PseudoClassState {
    words: SmallVec<[u64; 2]>,
}

impl PseudoClassState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pc: &PseudoClass) -> bool {
        self.insert_index(pc.index)
    }

    pub fn remove(&mut self, pc: &PseudoClass) -> bool {
        self.remove_index(pc.index)
    }

    #[must_use]
    pub fn contains(&self, pc: &PseudoClass) -> bool {
        self.contains_index(pc.index)
    }

    /// Set bit `index`; returns `true` if it was not already set.
    pub fn insert_index(&mut self, index: usize) -> bool {
        let (word, bit) = (index / WORD_BITS, index % WORD_BITS);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        let was = self.words[word] & (1u64 << bit) != 0;
        self.words[word] |= 1 << bit;
        !was
    }

    /// Clear bit `index`; returns `true` if it was set.
    pub fn remove_index(&mut self, index: usize) -> bool {
        let (word, bit) = (index / WORD_BITS, index % WORD_BITS);
        let Some(slot) = self.words.get_mut(word) else {
            return false;
        };
        let was = *slot & (1u64 << bit) != 0;
        *slot &= !(1u64 << bit);
        self.trim();
        was
    }

    #[must_use]
    pub fn contains_index(&self, index: usize) -> bool {
        let (word, bit) = (index / WORD_BITS, index % WORD_BITS);
        self.words.get(word).is_some_and(|w| w & (1u64 << bit) != 0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// True if every member of `other` is also in `self`.
    #[must_use]
    pub fn is_superset_of(&self, other: &PseudoClassState) -> bool {
        other.words.iter().enumerate().all(|(i, &w)| {
            let mine = self.words.get(i).copied().unwrap_or(0);
            mine & w == w
        })
    }

    pub fn union_with(&mut self, other: &PseudoClassState) {
        if self.words.len() < other.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (mine, &theirs) in self.words.iter_mut().zip(other.words.iter()) {
            *mine |= theirs;
        }
    }

    /// Members present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &PseudoClassState) -> PseudoClassState {
        let mut out = PseudoClassState {
            words: self
                .words
                .iter()
                .zip(other.words.iter())
                .map(|(a, b)| a & b)
                .collect(),
        };
        out.trim();
        out
    }

    /// Indices of the set bits in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            (0..WORD_BITS)
                .filter(move |&bit| word & (1u64 << bit) != 0)
                .map(move |bit| w * WORD_BITS + bit)
        })
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

impl<'a> FromIterator<&'a PseudoClass> for PseudoClassState {
    fn from_iter<I: IntoIterator<Item = &'a PseudoClass>>(iter: I) -> Self {
        let mut state = PseudoClassState::new();
        for pc in iter {
            state.insert(pc);
        }
        state
    }
}

impl fmt::Debug for PseudoClassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.indices()).finish()
    }
}
