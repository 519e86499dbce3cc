//! Three-state visit tracking for cycle detection.
//!
//! One `Coloring` is kept per edge set (base types, property types, alias
//! values, operation signatures). The checker marks a node in progress
//! before following its edges; meeting an in-progress node again means the
//! edge just followed closes a cycle.
//!
//! `ResolutionPath` records which kind of edge led to each node still in
//! progress, so a cycle closed through an alias can be attributed to the
//! heritage clause that started it.

use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Result of entering a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// First visit; the node is now in progress.
    Entered,
    /// The node is already in progress: a cycle.
    Cycle,
    /// The node was fully visited before.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Grey,
    Black,
}

#[derive(Debug)]
pub struct Coloring<K> {
    colors: FxHashMap<K, Color>,
}

impl<K: Clone + Eq + Hash> Coloring<K> {
    pub fn new() -> Self {
        Self {
            colors: FxHashMap::default(),
        }
    }

    pub fn enter(&mut self, key: K) -> Visit {
        match self.colors.get(&key) {
            Some(Color::Grey) => Visit::Cycle,
            Some(Color::Black) => Visit::Done,
            None => {
                self.colors.insert(key, Color::Grey);
                Visit::Entered
            }
        }
    }

    pub fn leave(&mut self, key: K) {
        self.colors.insert(key, Color::Black);
    }

    pub fn is_in_progress(&self, key: &K) -> bool {
        self.colors.get(key) == Some(&Color::Grey)
    }
}

impl<K: Clone + Eq + Hash> Default for Coloring<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// One edge on the current resolution path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<A, H> {
    /// Resolving the value of an alias.
    Alias(A),
    /// Resolving the target of an `extends` or `is` clause of `H`.
    Heritage(H),
    /// Any other edge: a declaration body, template arguments.
    Nested,
}

#[derive(Debug)]
pub struct ResolutionPath<A, H> {
    steps: Vec<Step<A, H>>,
}

impl<A: PartialEq, H> ResolutionPath<A, H> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn push(&mut self, step: Step<A, H>) {
        self.steps.push(step);
    }

    pub fn pop(&mut self) {
        self.steps.pop();
    }

    /// When `alias` is reached again through alias values and heritage
    /// clauses only, the innermost heritage owner on that cycle. A nested
    /// edge is allowed only as the declaration whose heritage clause is
    /// being resolved right above it.
    pub fn heritage_cycle(&self, alias: &A) -> Option<&H> {
        let mut owner = None;
        let mut above_is_heritage = false;
        for step in self.steps.iter().rev() {
            match step {
                Step::Heritage(h) => {
                    owner.get_or_insert(h);
                    above_is_heritage = true;
                    continue;
                }
                Step::Nested if !above_is_heritage => return None,
                Step::Nested => {}
                Step::Alias(a) if a == alias => return owner,
                Step::Alias(_) => {}
            }
            above_is_heritage = false;
        }
        None
    }
}

impl<A: PartialEq, H> Default for ResolutionPath<A, H> {
    fn default() -> Self {
        Self::new()
    }
}
