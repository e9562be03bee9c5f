use crate::configuration::Configuration;
use crate::error::ParserError;
use crate::labels::LabelSet;
use crate::oracle::{loss_growth, GoldProgress};
use crate::system::{Action, ActionKind, System, Transition};
use crate::tree::{DependencyTree, Head};

const UNLABELED: &[ActionKind] = &[ActionKind::Shift, ActionKind::Drop, ActionKind::Reduce];
const SHIFT: Action = 0;
const DROP: Action = 1;
const REDUCE: Action = 2;

/// Arc-eager: arcs are built between the stack top and the buffer front as
/// soon as both ends are available; REDUCE pops tokens that already have a head.
#[derive(Debug, Clone)]
pub struct ArcEager {
  labels: LabelSet,
}

impl ArcEager {
  pub fn new(labels: LabelSet) -> Self {
    Self { labels }
  }

  /// Non-root tokens that no completion of `config` can get right: wrong
  /// heads or labels, heads out of reach, and removed tokens that can no
  /// longer be dropped
  fn lost(config: &Configuration, gold: &DependencyTree) -> u32 {
    let n = config.len();
    let mut on_stack = vec![false; n];
    let mut in_buffer = vec![false; n];
    let mut is_head = vec![false; n];
    for &s in config.stack.iter() {
      on_stack[s] = true;
    }
    for &b in config.buffer.iter() {
      in_buffer[b] = true;
    }
    for h in config.heads.iter().filter_map(|h| h.token()) {
      is_head[h] = true;
    }

    (0..n)
      .filter(|&i| match (gold.heads[i], config.heads[i]) {
        (Head::Unassigned, _) | (Head::Removed, Head::Removed) => false,
        // DROP needs it at the buffer front with no dependents
        (Head::Removed, _) => !in_buffer[i] || is_head[i],
        (Head::Token(_), Head::Token(_)) | (Head::Token(_), Head::Removed) => {
          config.heads[i] != gold.heads[i] || config.deprels[i] != gold.deprels[i]
        }
        // waiting on the stack for a LEFT, or in the buffer for either arc
        (Head::Token(h), Head::Unassigned) => {
          if on_stack[i] {
            !in_buffer[h]
          } else {
            !(in_buffer[i] && (in_buffer[h] || on_stack[h]))
          }
        }
      })
      .count() as u32
  }
}

impl System for ArcEager {
  fn name(&self) -> &'static str {
    "arceager"
  }

  fn labels(&self) -> &LabelSet {
    &self.labels
  }

  fn unlabeled(&self) -> &'static [ActionKind] {
    UNLABELED
  }

  fn is_legal(&self, config: &Configuration, transition: Transition) -> bool {
    let s0_headed = config.s0().map(|s| !config.heads[s].is_unassigned());
    match transition {
      // the root is shifted last, onto an empty stack
      Transition::Shift => match config.buffer.len() {
        0 => false,
        1 => config.stack.is_empty(),
        _ => true,
      },
      // a token that already has dependents is kept
      Transition::Drop => match config.b0() {
        Some(b) if config.buffer.len() >= 2 => !config.heads.iter().any(|h| h.is(b)),
        _ => false,
      },
      Transition::Reduce => s0_headed == Some(true),
      Transition::Left(_) => s0_headed == Some(false) && !config.buffer.is_empty(),
      // the root never becomes a dependent
      Transition::Right(_) => s0_headed.is_some() && config.buffer.len() >= 2,
      Transition::Swap => false,
    }
  }

  fn perform(&self, config: &mut Configuration, transition: Transition) {
    match transition {
      Transition::Shift => config.shift(),
      Transition::Drop => config.drop_front(),
      Transition::Reduce => {
        config.stack.pop();
      }
      Transition::Left(l) => {
        if let (Some(dep), Some(hed)) = (config.s0(), config.b0()) {
          config.stack.pop();
          config.attach(hed, dep, l);
        }
      }
      Transition::Right(l) => {
        if let (Some(hed), Some(dep)) = (config.s0(), config.b0()) {
          config.shift();
          config.attach(hed, dep, l);
        }
      }
      Transition::Swap => {}
    }
  }

  fn static_oracle(&self, gold: &DependencyTree) -> Result<Vec<Action>, ParserError> {
    gold.check_gold(self.name(), self.labels.len(), true, true)?;

    let n = gold.len();
    let unrealizable = || ParserError::NotRealizable(self.name());
    let mut progress = GoldProgress::new(gold);
    let mut sigma: Vec<usize> = Vec::with_capacity(n);
    let mut beta = 0;
    let mut actions = Vec::with_capacity(2 * n);

    while !(sigma.len() == 1 && beta == n) {
      if beta == n {
        return Err(unrealizable());
      }

      if let Some(&top) = sigma.last() {
        // the unattached token that the stack top hangs from
        let mut t = top;
        while let Some(h) = progress.attached[t] {
          t = h;
        }
        if progress.is_arc(beta, t) {
          if t == top {
            actions.push(progress.left(self, top)?);
            progress.attach(beta, top);
          } else {
            actions.push(REDUCE);
          }
          sigma.pop();
          continue;
        }
      }

      match gold.heads[beta] {
        Head::Removed => actions.push(DROP),
        Head::Unassigned => {
          actions.push(SHIFT);
          sigma.push(beta);
        }
        Head::Token(h) if h > beta => {
          actions.push(SHIFT);
          sigma.push(beta);
        }
        Head::Token(h) => {
          let top = *sigma.last().ok_or_else(unrealizable)?;
          if h == top {
            actions.push(progress.right(self, beta)?);
            progress.attach(top, beta);
            sigma.push(beta);
          } else if progress.attached[top].is_some() {
            actions.push(REDUCE);
            sigma.pop();
            continue;
          } else {
            return Err(unrealizable());
          }
        }
      }
      beta += 1;
    }

    Ok(actions)
  }

  fn dynamic_oracle_costs(
    &self,
    config: &Configuration,
    actions: &[Action],
    gold: &DependencyTree,
  ) -> Result<Vec<u32>, ParserError> {
    if gold.len() != config.len() {
      return Err(ParserError::LengthMismatch {
        expected: config.len(),
        actual: gold.len(),
      });
    }

    let (s0, b0) = (config.s0(), config.b0());
    loss_growth(
      self,
      config,
      actions,
      |t| match (t, s0, b0) {
        (Transition::Left(l), Some(s), Some(b)) => gold.has_arc(b, s, l),
        (Transition::Right(l), Some(s), Some(b)) => gold.has_arc(s, b, l),
        _ => false,
      },
      |c| Self::lost(c, gold),
    )
  }
}
