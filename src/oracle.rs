//! Pieces shared by the static and dynamic oracles of all systems.

use crate::configuration::Configuration;
use crate::error::ParserError;
use crate::system::{Action, System, Transition};
use crate::tree::DependencyTree;

/// The arcs an oracle has already replayed, next to the gold children lists
pub(crate) struct GoldProgress<'a> {
  pub gold: &'a DependencyTree,
  pub children: Vec<Vec<usize>>,
  pub attached: Vec<Option<usize>>,
}

impl<'a> GoldProgress<'a> {
  pub fn new(gold: &'a DependencyTree) -> Self {
    Self {
      gold,
      children: gold.children(),
      attached: vec![None; gold.len()],
    }
  }

  /// True once every gold dependent of `node` has been attached
  pub fn complete(&self, node: usize) -> bool {
    self.children[node]
      .iter()
      .all(|&c| self.attached[c].is_some())
  }

  /// True if `dependent` attaches to `head` in the gold tree
  pub fn is_arc(&self, head: usize, dependent: usize) -> bool {
    self.gold.heads[dependent].is(head)
  }

  pub fn attach(&mut self, head: usize, dependent: usize) {
    self.attached[dependent] = Some(head);
  }

  /// Action id of an arc to `dependent` carrying its gold label
  pub fn left<S: System + ?Sized>(&self, system: &S, dependent: usize) -> Result<Action, ParserError> {
    let label = self.gold.deprels[dependent].ok_or(ParserError::MissingLabel(dependent))?;
    Ok(system.encode_left(label))
  }

  pub fn right<S: System + ?Sized>(&self, system: &S, dependent: usize) -> Result<Action, ParserError> {
    let label = self.gold.deprels[dependent].ok_or(ParserError::MissingLabel(dependent))?;
    Ok(system.encode_right(label))
  }
}

/// Computes one cost per candidate action.
///
/// At most one LEFT and one RIGHT action can be the gold one in a configuration;
/// every other LEFT (or RIGHT) shares a single cost, computed once for the first
/// of them and reused for the rest.
pub(crate) fn collapse_costs<S, G, C>(
  system: &S,
  actions: &[Action],
  mut is_gold: G,
  mut cost: C,
) -> Result<Vec<u32>, ParserError>
where
  S: System + ?Sized,
  G: FnMut(Transition) -> bool,
  C: FnMut(Transition) -> Result<u32, ParserError>,
{
  let mut wrong_left: Option<u32> = None;
  let mut wrong_right: Option<u32> = None;

  actions
    .iter()
    .map(|&a| {
      let t = system.decode(a)?;
      let shared = match t {
        Transition::Left(_) if !is_gold(t) => &mut wrong_left,
        Transition::Right(_) if !is_gold(t) => &mut wrong_right,
        _ => return cost(t),
      };
      match *shared {
        Some(c) => Ok(c),
        None => Ok(*shared.insert(cost(t)?)),
      }
    })
    .collect()
}

/// Costs as the growth of `loss`, the number of gold arcs that no completion
/// of a configuration can still build. Candidates must be legal.
pub(crate) fn loss_growth<S, G, L>(
  system: &S,
  config: &Configuration,
  actions: &[Action],
  is_gold: G,
  loss: L,
) -> Result<Vec<u32>, ParserError>
where
  S: System + ?Sized,
  G: FnMut(Transition) -> bool,
  L: Fn(&Configuration) -> u32,
{
  if let Some(&a) = actions.iter().find(|&&a| !system.is_legal_action(config, a)) {
    return Err(ParserError::IllegalAction {
      action: a,
      name: system.action_name(a),
    });
  }

  let before = loss(config);
  collapse_costs(system, actions, is_gold, |t| {
    let mut next = config.clone();
    system.perform(&mut next, t);
    let after = loss(&next);
    after
      .checked_sub(before)
      .ok_or(ParserError::LossDecreased { before, after })
  })
}

/// Counts tokens in `tokens` whose gold head is `head`
pub(crate) fn gold_dependents_in<'a, I>(gold: &DependencyTree, head: usize, tokens: I) -> u32
where
  I: IntoIterator<Item = &'a usize>,
{
  tokens.into_iter().filter(|&&k| gold.heads[k].is(head)).count() as u32
}

/// Counts tokens in `tokens` that are the gold head of `dependent`
pub(crate) fn gold_heads_in<'a, I>(gold: &DependencyTree, dependent: usize, tokens: I) -> u32
where
  I: IntoIterator<Item = &'a usize>,
{
  tokens
    .into_iter()
    .filter(|&&k| gold.heads[dependent].is(k))
    .count() as u32
}

/// Runs `actions` from the initial configuration of an `n`-token sentence
pub fn replay<S: System + ?Sized>(system: &S, n: usize, actions: &[Action]) -> Result<Configuration, ParserError> {
  let mut config = Configuration::new(n);
  for &a in actions {
    system.apply(&mut config, a)?;
  }
  Ok(config)
}

/// True if a finished configuration carries exactly the gold arcs
pub fn matches_gold(config: &Configuration, gold: &DependencyTree) -> bool {
  config.terminated() && config.heads == gold.heads && config.deprels == gold.deprels
}
