//! Tree generators shared by the unit and property tests.

use proptest::prelude::*;

use crate::configuration::Configuration;
use crate::labels::LabelSet;
use crate::system::{Action, System};
use crate::tree::{DependencyTree, Head};

pub const NUM_LABELS: usize = 3;

pub fn labels() -> LabelSet {
  ["nsubj", "obj", "root"].iter().collect()
}

/// Endless stream of pseudo-random picks taken from `choices`
struct Picks<'a> {
  choices: &'a [u32],
  pos: usize,
}

impl Picks<'_> {
  fn next(&mut self, bound: usize) -> usize {
    if bound <= 1 || self.choices.is_empty() {
      return 0;
    }
    let v = self.choices[self.pos % self.choices.len()].wrapping_add(self.pos as u32 / 7);
    self.pos += 1;
    v as usize % bound
  }
}

fn labeled(heads: Vec<Head>, picks: &mut Picks) -> DependencyTree {
  let deprels = heads
    .iter()
    .map(|h| h.token().map(|_| picks.next(NUM_LABELS)))
    .collect();
  DependencyTree { heads, deprels }
}

/// Projective tree over `words` tokens plus a final pseudo-root
pub fn projective_tree(words: usize, choices: &[u32]) -> DependencyTree {
  fn build(lo: usize, hi: usize, parent: usize, heads: &mut [Head], picks: &mut Picks) {
    if lo >= hi {
      return;
    }
    let h = lo + picks.next(hi - lo);
    heads[h] = Head::Token(parent);
    build(lo, h, h, heads, picks);
    build(h + 1, hi, h, heads, picks);
  }

  let mut picks = Picks { choices, pos: 0 };
  let mut heads = vec![Head::Unassigned; words + 1];
  // a few sentences get several root children
  let mut lo = 0;
  while lo < words {
    let hi = lo + 1 + picks.next(words - lo);
    build(lo, hi, words, &mut heads, &mut picks);
    lo = hi;
  }
  labeled(heads, &mut picks)
}

/// A projective tree in which some leaves are marked for removal
pub fn projective_tree_with_removals(words: usize, choices: &[u32]) -> DependencyTree {
  let mut tree = projective_tree(words, choices);
  let children = tree.children();
  let mut picks = Picks { choices, pos: 3 };
  for i in 0..words {
    if children[i].is_empty() && picks.next(3) == 0 {
      tree.heads[i] = Head::Removed;
      tree.deprels[i] = None;
    }
  }
  tree
}

/// Any tree (projective or not) over `words` tokens plus a final pseudo-root
pub fn any_tree(words: usize, choices: &[u32]) -> DependencyTree {
  let mut picks = Picks { choices, pos: 0 };
  let mut order = (0..words).collect::<Vec<_>>();
  for i in (1..order.len()).rev() {
    let j = picks.next(i + 1);
    order.swap(i, j);
  }

  let mut heads = vec![Head::Unassigned; words + 1];
  for (k, &node) in order.iter().enumerate() {
    let pick = picks.next(k + 1);
    heads[node] = if pick == k { Head::Token(words) } else { Head::Token(order[pick]) };
  }
  labeled(heads, &mut picks)
}

pub fn projective_trees() -> impl Strategy<Value = DependencyTree> {
  (0usize..9, prop::collection::vec(any::<u32>(), 1..40))
    .prop_map(|(words, choices)| projective_tree(words, &choices))
}

pub fn projective_trees_with_removals() -> impl Strategy<Value = DependencyTree> {
  (0usize..9, prop::collection::vec(any::<u32>(), 1..40))
    .prop_map(|(words, choices)| projective_tree_with_removals(words, &choices))
}

pub fn any_trees() -> impl Strategy<Value = DependencyTree> {
  (0usize..9, prop::collection::vec(any::<u32>(), 1..40)).prop_map(|(words, choices)| any_tree(words, &choices))
}

/// Drives `system` with pseudo-random legal actions until it terminates,
/// calling `visit` before each step with the legal set and the chosen action
pub fn random_walk<S, F>(system: &S, n: usize, choices: &[u32], mut visit: F) -> Configuration
where
  S: System + ?Sized,
  F: FnMut(&Configuration, &[Action], Action),
{
  let mut picks = Picks { choices, pos: 0 };
  let mut config = Configuration::new(n);
  while !config.terminated() {
    let legal = system.legal_actions(&config).unwrap();
    let action = legal[picks.next(legal.len())];
    visit(&config, &legal, action);
    system.apply(&mut config, action).unwrap();
  }
  config
}

/// Tokens other than the root whose head or label differs from `gold`
pub fn errors(config: &Configuration, gold: &DependencyTree) -> u32 {
  (0..gold.len())
    .filter(|&i| !gold.heads[i].is_unassigned())
    .filter(|&i| config.heads[i] != gold.heads[i] || config.deprels[i] != gold.deprels[i])
    .count() as u32
}

/// Parses `a:1:nsubj b:2:obj ROOT:-` style fixtures against `labels()`
pub fn tree(notation: &str) -> DependencyTree {
  notation
    .parse::<crate::parse_tree::AnnotatedSentence>()
    .and_then(|s| s.to_tree(&labels()))
    .unwrap()
}

#[cfg(test)]
mod tests {
  use super::*;

  proptest! {
    #[test]
    fn generated_projective_trees_are_valid(t in projective_trees()) {
      prop_assert!(t.is_tree());
      prop_assert!(t.is_projective());
      prop_assert_eq!(t.root(), Some(t.len() - 1));
    }

    #[test]
    fn generated_removals_keep_a_projective_tree(t in projective_trees_with_removals()) {
      prop_assert!(t.is_tree());
      prop_assert!(t.is_projective());
      prop_assert!(t.heads[t.len() - 1].is_unassigned());
    }

    #[test]
    fn generated_trees_are_valid(t in any_trees()) {
      prop_assert!(t.is_tree());
      prop_assert_eq!(t.root(), Some(t.len() - 1));
    }
  }
}
