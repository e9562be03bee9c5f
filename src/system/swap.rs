use crate::configuration::Configuration;
use crate::error::ParserError;
use crate::labels::LabelSet;
use crate::oracle::GoldProgress;
use crate::system::{Action, ActionKind, System, Transition};
use crate::tree::DependencyTree;

const UNLABELED: &[ActionKind] = &[ActionKind::Shift, ActionKind::Swap];
const SHIFT: Action = 0;
const SWAP: Action = 1;

/// Arc-standard extended with SWAP, which moves the element below the stack
/// top back to the buffer and so can build non-projective trees.
#[derive(Debug, Clone)]
pub struct Swap {
  labels: LabelSet,
}

impl Swap {
  pub fn new(labels: LabelSet) -> Self {
    Self { labels }
  }
}

/// Position of every token in the in-order walk of the gold tree: left
/// dependents, then the head, then right dependents.
pub(crate) fn projective_order(root: usize, children: &[Vec<usize>]) -> Vec<usize> {
  fn visit(node: usize, children: &[Vec<usize>], order: &mut [usize], next: &mut usize) {
    let kids = &children[node];
    let pivot = kids.iter().take_while(|&&c| c < node).count();
    for &child in &kids[..pivot] {
      visit(child, children, order, next);
    }
    order[node] = *next;
    *next += 1;
    for &child in &kids[pivot..] {
      visit(child, children, order, next);
    }
  }

  let mut order = vec![usize::MAX; children.len()];
  let mut next = 0;
  visit(root, children, &mut order, &mut next);
  order
}

/// For every token, the head of the largest projective component it falls in
pub(crate) fn maximal_components(root: usize, children: &[Vec<usize>]) -> Vec<usize> {
  // returns whether the subtree of `node` is a contiguous span, and the span
  // grown from `node` over contiguous children
  fn visit(node: usize, children: &[Vec<usize>], mpc: &mut [usize]) -> (bool, usize, usize) {
    let kids = &children[node];
    if kids.is_empty() {
      mpc[node] = node;
      return (true, node, node);
    }

    let (mut left, mut right, mut whole) = (node, node, true);
    let pivot = kids.iter().take_while(|&&c| c < node).count();
    for &child in kids[..pivot].iter().rev() {
      let (contiguous, lo, hi) = visit(child, children, mpc);
      if contiguous && hi + 1 == left {
        left = lo;
      } else {
        whole = false;
      }
    }
    for &child in &kids[pivot..] {
      let (contiguous, lo, hi) = visit(child, children, mpc);
      if contiguous && right + 1 == lo {
        right = hi;
      } else {
        whole = false;
      }
    }

    for m in mpc.iter_mut().take(right + 1).skip(left) {
      *m = node;
    }
    (whole, left, right)
  }

  let mut mpc = vec![0; children.len()];
  visit(root, children, &mut mpc);
  mpc
}

impl System for Swap {
  fn name(&self) -> &'static str {
    "swap"
  }

  fn labels(&self) -> &LabelSet {
    &self.labels
  }

  fn unlabeled(&self) -> &'static [ActionKind] {
    UNLABELED
  }

  fn allow_nonprojective(&self) -> bool {
    true
  }

  fn is_legal(&self, config: &Configuration, transition: Transition) -> bool {
    // with the root on the stack only LEFT remains
    if config.buffer.is_empty() {
      return matches!(transition, Transition::Left(_)) && config.stack.len() >= 2;
    }
    match transition {
      Transition::Shift => true,
      // only tokens still in their original order may be swapped
      Transition::Swap => matches!((config.s1(), config.s0()), (Some(s1), Some(s0)) if s1 < s0),
      Transition::Left(_) | Transition::Right(_) => config.stack.len() >= 2,
      Transition::Drop | Transition::Reduce => false,
    }
  }

  fn perform(&self, config: &mut Configuration, transition: Transition) {
    match transition {
      Transition::Shift => config.shift(),
      Transition::Swap => config.swap(),
      Transition::Left(l) => config.left_on_stack(l),
      Transition::Right(l) => config.right_on_stack(l),
      Transition::Drop | Transition::Reduce => {}
    }
  }

  fn static_oracle(&self, gold: &DependencyTree) -> Result<Vec<Action>, ParserError> {
    gold.check_gold(self.name(), self.labels.len(), false, false)?;

    let n = gold.len();
    let root = n - 1;
    let unrealizable = || ParserError::NotRealizable(self.name());
    let mut progress = GoldProgress::new(gold);
    let order = projective_order(root, &progress.children);
    let mpc = maximal_components(root, &progress.children);

    let mut sigma: Vec<usize> = Vec::with_capacity(n);
    let mut beta = (0..n).rev().collect::<Vec<_>>();
    let mut actions = Vec::with_capacity(2 * n);
    // quadratic in the number of swaps at worst
    let limit = 2 * (n + 1) * (n + 1);

    while !(sigma.len() == 1 && beta.is_empty()) {
      if actions.len() > limit {
        return Err(unrealizable());
      }

      if sigma.len() >= 2 {
        let top0 = sigma[sigma.len() - 1];
        let top1 = sigma[sigma.len() - 2];

        if progress.is_arc(top0, top1) && progress.complete(top1) {
          actions.push(progress.left(self, top1)?);
          progress.attach(top0, top1);
          sigma.pop();
          *sigma.last_mut().ok_or_else(unrealizable)? = top0;
          continue;
        }
        if progress.is_arc(top1, top0) && progress.complete(top0) {
          actions.push(progress.right(self, top0)?);
          progress.attach(top1, top0);
          sigma.pop();
          continue;
        }

        let next_in_same_component = beta.last().is_some_and(|&k| mpc[top0] == mpc[k]);
        if order[top0] < order[top1] && !next_in_same_component {
          actions.push(SWAP);
          sigma.pop();
          *sigma.last_mut().ok_or_else(unrealizable)? = top0;
          beta.push(top1);
          continue;
        }
      }

      let b = beta.pop().ok_or_else(unrealizable)?;
      actions.push(SHIFT);
      sigma.push(b);
    }

    Ok(actions)
  }

  fn dynamic_oracle_costs(
    &self,
    _config: &Configuration,
    _actions: &[Action],
    _gold: &DependencyTree,
  ) -> Result<Vec<u32>, ParserError> {
    Err(ParserError::CostsUnsupported(self.name()))
  }
}
