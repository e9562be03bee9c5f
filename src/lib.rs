#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod utils;

pub mod configuration;
pub mod decoder;
pub mod error;
pub mod labels;
pub mod oracle;
pub mod parse_tree;
pub mod system;
pub mod tree;

#[cfg(test)]
mod testing;

pub use crate::configuration::Configuration;
pub use crate::decoder::{BeamConfig, Derivation, GoldSearch, Scorer};
pub use crate::error::ParserError;
pub use crate::labels::{Label, LabelSet};
pub use crate::parse_tree::AnnotatedSentence;
pub use crate::system::{Action, ActionKind, System, SystemKind, Transition, TransitionSystem};
pub use crate::tree::{DependencyTree, Head};
pub use crate::utils::Err;

impl TransitionSystem {
  /// Greedy parse of an `n`-token sentence (pseudo-root last)
  pub fn parse<C: Scorer + ?Sized>(
    &self,
    scorer: &mut C,
    input: &C::Input,
    n: usize,
  ) -> Result<DependencyTree, ParserError> {
    decoder::greedy(self, scorer, input, n).map(|d| d.tree)
  }

  /// Best tree of a beam search
  pub fn parse_beam<C: Scorer + ?Sized>(
    &self,
    scorer: &mut C,
    input: &C::Input,
    n: usize,
    settings: &BeamConfig,
  ) -> Result<DependencyTree, ParserError> {
    let beam = decoder::beam_search(self, scorer, input, n, settings)?;
    beam
      .into_iter()
      .next()
      .map(|d| d.tree)
      .ok_or(ParserError::NoLegalAction)
  }

  /// Keeps the arcs of `gold` and lets the scorer pick their labels
  pub fn relabel<C: Scorer + ?Sized>(
    &self,
    scorer: &mut C,
    input: &C::Input,
    gold: &DependencyTree,
  ) -> Result<DependencyTree, ParserError> {
    decoder::label(self, scorer, input, gold).map(|d| d.tree)
  }

  /// Static oracle of a sentence in `form:head:label` notation, as action names
  pub fn oracle_names(&self, notation: &str) -> Result<Vec<String>, ParserError> {
    let sentence: AnnotatedSentence = notation.parse()?;
    let gold = sentence.to_tree(self.labels())?;
    let actions = self.static_oracle(&gold)?;
    Ok(actions.iter().map(|&a| self.action_name(a)).collect())
  }
}

#[cfg(test)]
struct Flat(usize);

#[cfg(test)]
impl Scorer for Flat {
  type Input = str;
  type Checkpoint = ();

  fn new_checkpoint(&mut self, _: &str) {}

  fn score(&self, _: &()) -> Vec<f32> {
    vec![0.0; self.0]
  }

  fn advance(&mut self, _: &mut (), _: Action) {}

  fn clone_checkpoint(&mut self, _: &()) {}

  fn dispose(&mut self, _: ()) {}
}

#[test]
fn test_flat_scores_attach_everything_to_the_root() {
  let labels: LabelSet = ["dep", "root"].iter().collect();
  let sys = TransitionSystem::new(SystemKind::ArcStandard, labels);
  let mut scorer = Flat(sys.num_actions());

  // SHIFT wins every tie, then LEFT-dep hangs each token off the root
  let tree = sys.parse(&mut scorer, "the cat sat", 4).unwrap();
  assert_eq!(
    tree.heads,
    vec![Head::Token(3), Head::Token(3), Head::Token(3), Head::Unassigned]
  );
  assert_eq!(tree.deprels, vec![Some(0), Some(0), Some(0), None]);

  // every item ties at 0, so the first slot keeps the greedy path
  let settings = BeamConfig {
    width: 4,
    normalize: false,
  };
  let beam = sys.parse_beam(&mut scorer, "the cat sat", 4, &settings).unwrap();
  assert_eq!(beam, tree);
}

#[test]
fn test_relabel_and_oracle_names() {
  let labels: LabelSet = ["dep", "root"].iter().collect();
  let sys = TransitionSystem::new(SystemKind::ArcHybrid, labels);
  assert_eq!(
    sys.oracle_names("the:1:dep cat:2:root ROOT:-").unwrap(),
    vec!["SHIFT", "LEFT-dep", "SHIFT", "LEFT-root", "SHIFT"]
  );

  let gold = "the:1:root cat:2:root ROOT:-"
    .parse::<AnnotatedSentence>()
    .and_then(|s| s.to_tree(sys.labels()))
    .unwrap();
  let mut scorer = Flat(sys.num_actions());
  let relabeled = sys.relabel(&mut scorer, "the cat", &gold).unwrap();
  assert_eq!(relabeled.heads, gold.heads);
  assert_eq!(relabeled.deprels, vec![Some(0), Some(0), None]);
}
