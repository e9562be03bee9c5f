//! Decoding loops that drive any [`System`] with scores from an external model.
//!
//! The model sits behind the [`Scorer`] trait. It keeps one opaque checkpoint
//! per partial derivation, and the decoder advances that checkpoint in lockstep
//! with the [`Configuration`]. Every checkpoint the decoder creates, whether
//! from `new_checkpoint` or `clone_checkpoint`, is handed back to `dispose`
//! exactly once, on success and on error.

use tracing::{debug, trace};

use crate::configuration::Configuration;
use crate::error::ParserError;
use crate::system::{Action, System};
use crate::tree::DependencyTree;
use crate::utils::{best_action, log_softmax};

/// The model side of decoding.
pub trait Scorer {
  /// Whatever the model needs to start a sentence (features, embeddings, ...)
  type Input: ?Sized;
  /// Incremental model state aligned with one configuration
  type Checkpoint;

  fn new_checkpoint(&mut self, input: &Self::Input) -> Self::Checkpoint;

  /// One score per action id of the system being decoded
  fn score(&self, checkpoint: &Self::Checkpoint) -> Vec<f32>;

  /// Makes later `score` calls reflect having taken `action`
  fn advance(&mut self, checkpoint: &mut Self::Checkpoint, action: Action);

  /// An independent copy, for forking a beam
  fn clone_checkpoint(&mut self, checkpoint: &Self::Checkpoint) -> Self::Checkpoint;

  fn dispose(&mut self, checkpoint: Self::Checkpoint);
}

/// One finished (or, after an early stop, partial) derivation
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
  pub tree: DependencyTree,
  pub actions: Vec<Action>,
  pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamConfig {
  pub width: usize,
  /// Log-softmax each score vector before adding it to the running total
  pub normalize: bool,
}

impl Default for BeamConfig {
  fn default() -> Self {
    Self {
      width: 8,
      normalize: true,
    }
  }
}

/// Result of a beam search that tracked a gold action sequence
#[derive(Debug, Clone, PartialEq)]
pub struct GoldSearch {
  /// The beam when search stopped, best first
  pub beam: Vec<Derivation>,
  /// Step at which no beam item followed the gold prefix any more
  pub gold_fell_out_at: Option<usize>,
}

fn checked_scores<S, C>(system: &S, scorer: &C, checkpoint: &C::Checkpoint) -> Result<Vec<f32>, ParserError>
where
  S: System + ?Sized,
  C: Scorer + ?Sized,
{
  let scores = scorer.score(checkpoint);
  if scores.len() != system.num_actions() {
    return Err(ParserError::ScoreLength {
      expected: system.num_actions(),
      actual: scores.len(),
    });
  }
  Ok(scores)
}

/// Runs one derivation, letting `choose` pick each action from the legal ones
fn follow<S, C, F>(
  system: &S,
  scorer: &mut C,
  input: &C::Input,
  n: usize,
  mut choose: F,
) -> Result<Derivation, ParserError>
where
  S: System + ?Sized,
  C: Scorer + ?Sized,
  F: FnMut(usize, &[Action], &[f32]) -> Result<(Action, f32), ParserError>,
{
  let mut checkpoint = scorer.new_checkpoint(input);
  let mut config = Configuration::new(n);
  let mut actions = Vec::with_capacity(2 * n);
  let mut total = 0.0;

  let mut run = || -> Result<(), ParserError> {
    while !config.terminated() {
      let legal = system.legal_actions(&config)?;
      let scores = checked_scores(system, scorer, &checkpoint)?;
      let (action, score) = choose(actions.len(), &legal, &scores)?;
      system.apply(&mut config, action)?;
      scorer.advance(&mut checkpoint, action);
      trace!(step = actions.len(), action = %system.action_name(action), score, "decoded");
      actions.push(action);
      total += score;
    }
    Ok(())
  };
  let outcome = run();
  scorer.dispose(checkpoint);
  outcome?;

  Ok(Derivation {
    tree: config.into_tree(),
    actions,
    score: total,
  })
}

/// Takes the best-scoring legal action at every step. Ties go to the lower action id.
pub fn greedy<S, C>(system: &S, scorer: &mut C, input: &C::Input, n: usize) -> Result<Derivation, ParserError>
where
  S: System + ?Sized,
  C: Scorer + ?Sized,
{
  follow(system, scorer, input, n, |_, legal, scores| {
    best_action(scores, legal).ok_or(ParserError::NoLegalAction)
  })
}

/// Rebuilds the structure of `gold` and lets the scorer choose only the labels:
/// at each step the candidates are the legal actions of the same kind as the
/// gold one.
pub fn label<S, C>(system: &S, scorer: &mut C, input: &C::Input, gold: &DependencyTree) -> Result<Derivation, ParserError>
where
  S: System + ?Sized,
  C: Scorer + ?Sized,
{
  let reference = system.static_oracle(gold)?;
  follow(system, scorer, input, gold.len(), |step, legal, scores| {
    let wanted = reference
      .get(step)
      .ok_or(ParserError::NotRealizable(system.name()))
      .and_then(|&a| system.structural_class(a))?;
    let candidates = legal
      .iter()
      .copied()
      .filter(|&a| system.is_kind(a, wanted))
      .collect::<Vec<_>>();
    best_action(scores, &candidates).ok_or(ParserError::NoLegalAction)
  })
}

struct BeamItem<K> {
  config: Configuration,
  score: f32,
  checkpoint: K,
  /// Last step in the back-pointer trellis; `None` before the first action
  node: Option<usize>,
}

/// A candidate successor: parent slot, action (`None` for a finished parent) and score
type Expansion = (usize, Option<Action>, f32);

struct Beam<'a, S: ?Sized, C: Scorer + ?Sized> {
  system: &'a S,
  scorer: &'a mut C,
  settings: BeamConfig,
  items: Vec<BeamItem<C::Checkpoint>>,
  trellis: Vec<(Option<usize>, Action)>,
}

impl<S, C> Beam<'_, S, C>
where
  S: System + ?Sized,
  C: Scorer + ?Sized,
{
  fn finished(&self) -> bool {
    self.items.iter().all(|item| item.config.terminated())
  }

  fn expansions(&self) -> Result<Vec<Expansion>, ParserError> {
    let mut expansions = Vec::new();
    for (slot, item) in self.items.iter().enumerate() {
      if item.config.terminated() {
        expansions.push((slot, None, item.score));
        continue;
      }
      let legal = self.system.legal_actions(&item.config)?;
      let mut scores = checked_scores(self.system, &*self.scorer, &item.checkpoint)?;
      if self.settings.normalize {
        scores = log_softmax(&scores);
      }
      expansions.extend(legal.into_iter().map(|a| (slot, Some(a), item.score + scores[a])));
    }

    // stable, so equal scores keep the lower parent slot first
    expansions.sort_by(|a, b| b.2.total_cmp(&a.2));
    expansions.truncate(self.settings.width);
    Ok(expansions)
  }

  /// Builds the next beam from the surviving expansions and disposes the old one
  fn advance(&mut self, survivors: &[Expansion]) -> Result<(), ParserError> {
    let mut next = Vec::with_capacity(survivors.len());
    for &(slot, action, score) in survivors {
      let parent = &self.items[slot];
      let mut config = parent.config.clone();
      let node = match action {
        Some(a) => {
          if let Err(e) = self.system.apply(&mut config, a) {
            dispose_all(self.scorer, next);
            return Err(e);
          }
          self.trellis.push((parent.node, a));
          Some(self.trellis.len() - 1)
        }
        None => parent.node,
      };
      let mut checkpoint = self.scorer.clone_checkpoint(&parent.checkpoint);
      if let Some(a) = action {
        self.scorer.advance(&mut checkpoint, a);
      }
      next.push(BeamItem {
        config,
        score,
        checkpoint,
        node,
      });
    }

    let old = std::mem::replace(&mut self.items, next);
    dispose_all(self.scorer, old);
    Ok(())
  }

  fn actions_to(&self, mut node: Option<usize>) -> Vec<Action> {
    let mut actions = Vec::new();
    while let Some((parent, action)) = node.and_then(|i| self.trellis.get(i)) {
      actions.push(*action);
      node = *parent;
    }
    actions.reverse();
    actions
  }

  fn into_derivations(self) -> Vec<Derivation> {
    let mut derivations = self
      .items
      .iter()
      .map(|item| Derivation {
        tree: item.config.tree(),
        actions: self.actions_to(item.node),
        score: item.score,
      })
      .collect::<Vec<_>>();
    derivations.sort_by(|a, b| b.score.total_cmp(&a.score));
    dispose_all(self.scorer, self.items);
    derivations
  }
}

fn dispose_all<C, K>(scorer: &mut C, items: Vec<BeamItem<K>>)
where
  C: Scorer<Checkpoint = K> + ?Sized,
{
  for item in items {
    scorer.dispose(item.checkpoint);
  }
}

fn search<S, C>(
  system: &S,
  scorer: &mut C,
  input: &C::Input,
  n: usize,
  settings: &BeamConfig,
  gold: Option<&[Action]>,
) -> Result<GoldSearch, ParserError>
where
  S: System + ?Sized,
  C: Scorer + ?Sized,
{
  if settings.width == 0 {
    return Err(ParserError::InvalidBeamWidth);
  }

  let checkpoint = scorer.new_checkpoint(input);
  let mut beam = Beam {
    system,
    scorer,
    settings: *settings,
    items: vec![BeamItem {
      config: Configuration::new(n),
      score: 0.0,
      checkpoint,
      node: None,
    }],
    trellis: Vec::new(),
  };

  let mut gold_slot = Some(0);
  let mut gold_fell_out_at = None;
  let mut step = 0;

  while !beam.finished() {
    let survivors = match beam.expansions() {
      Ok(survivors) => survivors,
      Err(e) => {
        dispose_all(beam.scorer, beam.items);
        return Err(e);
      }
    };

    if let (Some(gold), Some(slot)) = (gold, gold_slot) {
      let wanted = gold.get(step).copied();
      gold_slot = survivors
        .iter()
        .position(|&(parent, action, _)| parent == slot && action == wanted);
    }

    if let Err(e) = beam.advance(&survivors) {
      dispose_all(beam.scorer, beam.items);
      return Err(e);
    }
    trace!(
      step,
      width = beam.items.len(),
      best = ?beam.items.first().map(|item| item.score),
      "beam step"
    );
    step += 1;

    if gold.is_some() && gold_slot.is_none() {
      debug!(step = step - 1, "gold derivation fell out of the beam");
      gold_fell_out_at = Some(step - 1);
      break;
    }
  }

  Ok(GoldSearch {
    beam: beam.into_derivations(),
    gold_fell_out_at,
  })
}

/// k-best search. Returns the final beam, best first; the first derivation is the parse.
pub fn beam_search<S, C>(
  system: &S,
  scorer: &mut C,
  input: &C::Input,
  n: usize,
  settings: &BeamConfig,
) -> Result<Vec<Derivation>, ParserError>
where
  S: System + ?Sized,
  C: Scorer + ?Sized,
{
  search(system, scorer, input, n, settings, None).map(|result| result.beam)
}

/// Beam search that follows the gold action sequence `gold` alongside and stops
/// as soon as no beam item extends the gold prefix.
pub fn beam_search_with_gold<S, C>(
  system: &S,
  scorer: &mut C,
  input: &C::Input,
  n: usize,
  settings: &BeamConfig,
  gold: &[Action],
) -> Result<GoldSearch, ParserError>
where
  S: System + ?Sized,
  C: Scorer + ?Sized,
{
  search(system, scorer, input, n, settings, Some(gold))
}
