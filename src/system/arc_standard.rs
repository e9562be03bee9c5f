use crate::configuration::Configuration;
use crate::error::ParserError;
use crate::labels::LabelSet;
use crate::oracle::{loss_growth, GoldProgress};
use crate::system::{Action, ActionKind, System, Transition};
use crate::tree::{DependencyTree, Head};

const UNLABELED: &[ActionKind] = &[ActionKind::Shift, ActionKind::Drop];
const SHIFT: Action = 0;
const DROP: Action = 1;

/// Larger than any reachable loss, small enough that `INF + 1` can't overflow
const INF: u32 = u32::MAX / 2;

/// Arc-standard: LEFT and RIGHT attach between the two topmost stack elements.
#[derive(Debug, Clone)]
pub struct ArcStandard {
  labels: LabelSet,
}

impl ArcStandard {
  pub fn new(labels: LabelSet) -> Self {
    Self { labels }
  }

  /// Minimum number of wrong arcs in any completion of `config`, counting the
  /// arcs already committed.
  pub fn cost(&self, config: &Configuration, gold: &DependencyTree) -> Result<u32, ParserError> {
    if gold.len() != config.len() {
      return Err(ParserError::LengthMismatch {
        expected: config.len(),
        actual: gold.len(),
      });
    }
    let root = gold.root().ok_or(ParserError::NotATree)?;
    Ok(self.min_loss(config, gold, &gold.children(), root))
  }

  fn min_loss(&self, config: &Configuration, gold: &DependencyTree, children: &[Vec<usize>], root: usize) -> u32 {
    let n = gold.len();
    let front = config.b0().unwrap_or(n);

    if config.stack.is_empty() {
      // only DROPs so far: the buffer can still build all its own arcs, but
      // tokens whose head was dropped are lost
      let orphans = config
        .buffer
        .iter()
        .filter(|&&i| matches!(gold.heads[i], Head::Token(h) if h < front))
        .count() as u32;
      return committed_errors(config, gold) + orphans;
    }

    // sigma_l runs down the stack from its top; sigma_r starts at the stack bottom
    // and continues with the buffer tokens that must attach outside the buffer
    let sigma_l = config.stack.iter().rev().copied().collect::<Vec<_>>();
    let mut sigma_r = vec![config.stack[0]];
    let mut in_sigma = vec![false; n];
    for &s in sigma_l.iter() {
      in_sigma[s] = true;
    }
    for &id in config.buffer.iter().rev() {
      let head_outside = match gold.heads[id] {
        Head::Token(h) => h < front,
        Head::Unassigned => true,
        Head::Removed => false,
      };
      if head_outside || children[id].iter().any(|&d| in_sigma[d]) {
        sigma_r.push(id);
        in_sigma[id] = true;
      }
    }

    let (len_l, len_r) = (sigma_l.len(), sigma_r.len());
    let idx = |i: usize, j: usize, h: usize| (i * len_r + j) * n + h;
    let arc = |h: usize, d: usize| if gold.heads[d].is(h) { 0 } else { 1 };

    // t[i][j][h]: fewest mismatches combining sigma_l[..=i] and sigma_r[1..=j]
    // into one subtree headed by h
    let mut t = vec![INF; len_l * len_r * n];
    t[idx(0, 0, sigma_l[0])] = 0;

    for d in 1..(len_l + len_r) {
      for j in d.saturating_sub(len_l)..d.min(len_r) {
        let i = d - j - 1;
        let placed = || sigma_l[..=i].iter().chain(sigma_r[..=j].iter()).copied();

        if i + 1 < len_l {
          let next = sigma_l[i + 1];
          for h in placed() {
            let base = t[idx(i, j, h)];
            if base >= INF {
              continue;
            }
            let to = idx(i + 1, j, h);
            t[to] = t[to].min(base + arc(h, next));
            let to = idx(i + 1, j, next);
            t[to] = t[to].min(base + arc(next, h));
          }
        }

        if j + 1 < len_r {
          let next = sigma_r[j + 1];
          for h in placed() {
            let base = t[idx(i, j, h)];
            if base >= INF {
              continue;
            }
            let to = idx(i, j + 1, h);
            t[to] = t[to].min(base + arc(h, next));
            let to = idx(i, j + 1, next);
            t[to] = t[to].min(base + arc(next, h));
          }
        }
      }
    }

    t[idx(len_l - 1, len_r - 1, root)] + committed_errors(config, gold)
  }
}

/// Arcs already built in front of the buffer that disagree with the gold tree
fn committed_errors(config: &Configuration, gold: &DependencyTree) -> u32 {
  let front = config.b0().unwrap_or(config.len());
  (0..front.min(config.len()))
    .filter(|&i| !config.heads[i].is_unassigned())
    .filter(|&i| config.heads[i] != gold.heads[i] || config.deprels[i] != gold.deprels[i])
    .count() as u32
}

impl System for ArcStandard {
  fn name(&self) -> &'static str {
    "arcstd"
  }

  fn labels(&self) -> &LabelSet {
    &self.labels
  }

  fn unlabeled(&self) -> &'static [ActionKind] {
    UNLABELED
  }

  fn is_legal(&self, config: &Configuration, transition: Transition) -> bool {
    match transition {
      Transition::Shift => !config.buffer.is_empty(),
      // the root is never dropped
      Transition::Drop => config.buffer.len() >= 2,
      Transition::Left(_) => config.stack.len() >= 2,
      // once the buffer is empty the root is on top and must stay a head
      Transition::Right(_) => config.stack.len() >= 2 && !config.buffer.is_empty(),
      Transition::Reduce | Transition::Swap => false,
    }
  }

  fn perform(&self, config: &mut Configuration, transition: Transition) {
    match transition {
      Transition::Shift => config.shift(),
      Transition::Drop => config.drop_front(),
      Transition::Left(l) => config.left_on_stack(l),
      Transition::Right(l) => config.right_on_stack(l),
      Transition::Reduce | Transition::Swap => {}
    }
  }

  fn static_oracle(&self, gold: &DependencyTree) -> Result<Vec<Action>, ParserError> {
    gold.check_gold(self.name(), self.labels.len(), true, true)?;

    let n = gold.len();
    let mut progress = GoldProgress::new(gold);
    let mut sigma: Vec<usize> = Vec::with_capacity(n);
    let mut beta = 0;
    let mut actions = Vec::with_capacity(2 * n);

    while !(sigma.len() == 1 && beta == n) {
      if sigma.len() >= 2 {
        let s0 = sigma[sigma.len() - 1];
        let s1 = sigma[sigma.len() - 2];

        if progress.is_arc(s0, s1) {
          actions.push(progress.left(self, s1)?);
          progress.attach(s0, s1);
          sigma.pop();
          sigma.pop();
          sigma.push(s0);
          continue;
        }
        if progress.is_arc(s1, s0) && progress.complete(s0) {
          actions.push(progress.right(self, s0)?);
          progress.attach(s1, s0);
          sigma.pop();
          continue;
        }
      }

      if beta >= n {
        return Err(ParserError::NotRealizable(self.name()));
      }
      if gold.heads[beta].is_removed() {
        actions.push(DROP);
      } else {
        actions.push(SHIFT);
        sigma.push(beta);
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
    let children = gold.children();
    let root = gold.root().ok_or(ParserError::NotATree)?;

    let (s0, s1) = (config.s0(), config.s1());
    loss_growth(
      self,
      config,
      actions,
      |t| match (t, s1, s0) {
        (Transition::Left(l), Some(s1), Some(s0)) => gold.has_arc(s0, s1, l),
        (Transition::Right(l), Some(s1), Some(s0)) => gold.has_arc(s1, s0, l),
        _ => false,
      },
      |c| self.min_loss(c, gold, &children, root),
    )
  }
}
