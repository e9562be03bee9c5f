use crate::configuration::Configuration;
use crate::error::ParserError;
use crate::labels::LabelSet;
use crate::oracle::{collapse_costs, gold_dependents_in, gold_heads_in, GoldProgress};
use crate::system::{Action, ActionKind, System, Transition};
use crate::tree::DependencyTree;

const UNLABELED: &[ActionKind] = &[ActionKind::Shift];
const SHIFT: Action = 0;

/// Arc-hybrid: LEFT attaches the stack top to the buffer front, RIGHT attaches
/// it to the element below it.
#[derive(Debug, Clone)]
pub struct ArcHybrid {
  labels: LabelSet,
}

impl ArcHybrid {
  pub fn new(labels: LabelSet) -> Self {
    Self { labels }
  }

  fn shift_cost(&self, config: &Configuration, gold: &DependencyTree) -> u32 {
    let Some(b) = config.b0() else {
      return 0;
    };
    let below = &config.stack[..config.stack.len().saturating_sub(1)];
    gold_heads_in(gold, b, below) + gold_dependents_in(gold, b, &config.stack)
  }

  fn left_cost(&self, config: &Configuration, gold: &DependencyTree, label: usize) -> u32 {
    let (Some(s0), Some(b)) = (config.s0(), config.b0()) else {
      return 0;
    };
    let rest = &config.buffer[..config.buffer.len() - 1];
    let mut c = gold_heads_in(gold, s0, rest);
    if let Some(s1) = config.s1() {
      c += gold_heads_in(gold, s0, &[s1]);
    }
    c += gold_dependents_in(gold, s0, &config.buffer);
    if gold.heads[s0].is(b) && gold.deprels[s0] != Some(label) {
      c += 1;
    }
    c
  }

  fn right_cost(&self, config: &Configuration, gold: &DependencyTree, label: usize) -> u32 {
    let (Some(s0), Some(s1)) = (config.s0(), config.s1()) else {
      return 0;
    };
    let mut c = gold_heads_in(gold, s0, &config.buffer) + gold_dependents_in(gold, s0, &config.buffer);
    if gold.heads[s0].is(s1) && gold.deprels[s0] != Some(label) {
      c += 1;
    }
    c
  }
}

impl System for ArcHybrid {
  fn name(&self) -> &'static str {
    "archybrid"
  }

  fn labels(&self) -> &LabelSet {
    &self.labels
  }

  fn unlabeled(&self) -> &'static [ActionKind] {
    UNLABELED
  }

  fn is_legal(&self, config: &Configuration, transition: Transition) -> bool {
    match transition {
      // the root comes last and may only be shifted onto an empty stack
      Transition::Shift => match config.buffer.len() {
        0 => false,
        1 => config.stack.is_empty(),
        _ => true,
      },
      Transition::Left(_) => !config.stack.is_empty() && !config.buffer.is_empty(),
      Transition::Right(_) => config.stack.len() >= 2,
      Transition::Drop | Transition::Reduce | Transition::Swap => false,
    }
  }

  fn perform(&self, config: &mut Configuration, transition: Transition) {
    match transition {
      Transition::Shift => config.shift(),
      Transition::Left(l) => {
        if let (Some(dep), Some(hed)) = (config.s0(), config.b0()) {
          config.stack.pop();
          config.attach(hed, dep, l);
        }
      }
      Transition::Right(l) => config.right_on_stack(l),
      Transition::Drop | Transition::Reduce | Transition::Swap => {}
    }
  }

  fn static_oracle(&self, gold: &DependencyTree) -> Result<Vec<Action>, ParserError> {
    gold.check_gold(self.name(), self.labels.len(), true, false)?;

    let n = gold.len();
    let mut progress = GoldProgress::new(gold);
    let mut sigma: Vec<usize> = Vec::with_capacity(n);
    let mut beta = 0;
    let mut actions = Vec::with_capacity(2 * n);

    while !(sigma.len() == 1 && beta == n) {
      let top0 = sigma.last().copied();
      let top1 = sigma.len().checked_sub(2).map(|i| sigma[i]);

      match (top0, top1) {
        (Some(s0), _) if beta < n && progress.is_arc(beta, s0) => {
          actions.push(progress.left(self, s0)?);
          progress.attach(beta, s0);
          sigma.pop();
        }
        (Some(s0), Some(s1)) if progress.is_arc(s1, s0) && progress.complete(s0) => {
          actions.push(progress.right(self, s0)?);
          progress.attach(s1, s0);
          sigma.pop();
        }
        _ if beta < n => {
          actions.push(SHIFT);
          sigma.push(beta);
          beta += 1;
        }
        _ => return Err(ParserError::NotRealizable(self.name())),
      }
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
    if gold.has_removed() {
      return Err(ParserError::RemovalUnsupported(self.name()));
    }

    let (s0, s1, b0) = (config.s0(), config.s1(), config.b0());
    collapse_costs(
      self,
      actions,
      |t| match t {
        Transition::Left(l) => matches!((s0, b0), (Some(s0), Some(b)) if gold.has_arc(b, s0, l)),
        Transition::Right(l) => matches!((s0, s1), (Some(s0), Some(s1)) if gold.has_arc(s1, s0, l)),
        _ => false,
      },
      |t| {
        Ok(match t {
          Transition::Shift => self.shift_cost(config, gold),
          Transition::Left(l) => self.left_cost(config, gold, l),
          Transition::Right(l) => self.right_cost(config, gold, l),
          _ => 0,
        })
      },
    )
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;
  use crate::oracle::{matches_gold, replay};
  use crate::testing::{errors, labels, projective_trees, random_walk, tree};
  use crate::tree::Head;

  fn system() -> ArcHybrid {
    ArcHybrid::new(labels())
  }

  #[test]
  fn test_static_oracle() {
    let sys = system();
    let gold = tree("she:1:nsubj eats:3:root fish:1:obj ROOT:-");
    let actions = sys.static_oracle(&gold).unwrap();
    let names = actions.iter().map(|&a| sys.action_name(a)).collect::<Vec<_>>();
    assert_eq!(
      names,
      vec!["SHIFT", "LEFT-nsubj", "SHIFT", "SHIFT", "RIGHT-obj", "LEFT-root", "SHIFT"]
    );
    assert!(matches_gold(&replay(&sys, gold.len(), &actions).unwrap(), &gold));
  }

  #[test]
  fn test_right_then_left_to_root() {
    // a <- ROOT, a -> b
    let sys = system();
    let gold = tree("a:2:root b:0:obj ROOT:-");
    let actions = sys.static_oracle(&gold).unwrap();
    let names = actions.iter().map(|&a| sys.action_name(a)).collect::<Vec<_>>();
    assert_eq!(names, vec!["SHIFT", "SHIFT", "RIGHT-obj", "LEFT-root", "SHIFT"]);
    let config = replay(&sys, gold.len(), &actions).unwrap();
    assert_eq!(config.heads, vec![Head::Token(2), Head::Token(0), Head::Unassigned]);
  }

  #[test]
  fn test_rejects_removed_tokens() {
    let gold = tree("a:2:root uh:~ ROOT:-");
    assert_eq!(
      system().static_oracle(&gold),
      Err(ParserError::RemovalUnsupported("archybrid"))
    );
  }

  #[test]
  fn test_costs_reject_removed_tokens() {
    let sys = system();
    let gold = tree("a:2:root uh:~ ROOT:-");
    let c = Configuration::new(gold.len());
    assert_eq!(
      sys.dynamic_oracle_costs(&c, &[SHIFT], &gold),
      Err(ParserError::RemovalUnsupported("archybrid"))
    );
  }

  #[test]
  fn test_legality() {
    let sys = system();
    let mut c = Configuration::new(3);
    assert_eq!(sys.legal_actions(&c).unwrap(), vec![SHIFT]);
    sys.apply(&mut c, SHIFT).unwrap();
    sys.apply(&mut c, SHIFT).unwrap();
    // LEFT onto the root is legal, shifting the root over a non-empty stack isn't
    assert!(!sys.is_legal_action(&c, SHIFT));
    assert!(sys.is_legal_action(&c, sys.encode_left(2)));
    assert!(sys.is_legal_action(&c, sys.encode_right(2)));

    sys.apply(&mut c, sys.encode_right(1)).unwrap();
    sys.apply(&mut c, sys.encode_left(2)).unwrap();
    sys.apply(&mut c, SHIFT).unwrap();
    assert!(c.terminated());

    // no buffer front, no LEFT
    let mut c = Configuration::new(3);
    c.stack = vec![0, 1];
    c.buffer.clear();
    assert!(!sys.is_legal(&c, Transition::Left(0)));
    assert!(sys.is_legal(&c, Transition::Right(0)));
  }

  #[test]
  fn test_costs() {
    let sys = system();
    let gold = tree("she:1:nsubj eats:3:root fish:1:obj ROOT:-");
    // stack [she] buffer [eats fish ROOT]
    let c = replay(&sys, gold.len(), &[SHIFT]).unwrap();
    let legal = sys.legal_actions(&c).unwrap();
    assert_eq!(legal, vec![SHIFT, 1, 3, 5]);
    // shifting she over eats loses she <- eats; LEFT with the wrong label loses the label
    assert_eq!(sys.dynamic_oracle_costs(&c, &legal, &gold).unwrap(), vec![1, 0, 1, 1]);
  }

  proptest! {
    #[test]
    fn static_oracle_round_trips(gold in projective_trees()) {
      let sys = system();
      let actions = sys.static_oracle(&gold).unwrap();
      prop_assert_eq!(actions.len(), 2 * gold.len() - 1);
      prop_assert!(matches_gold(&replay(&sys, gold.len(), &actions).unwrap(), &gold));
    }

    #[test]
    fn some_action_is_always_free(gold in projective_trees(), choices in prop::collection::vec(any::<u32>(), 1..30)) {
      let sys = system();
      let mut lost = 0;
      let end = random_walk(&sys, gold.len(), &choices, |c, legal, chosen| {
        let costs = sys.dynamic_oracle_costs(c, legal, &gold).unwrap();
        assert_eq!(costs.iter().min(), Some(&0), "{}", c);
        lost += costs[legal.iter().position(|&a| a == chosen).unwrap()];
      });
      // the losses add up to the final errors
      prop_assert_eq!(lost, errors(&end, &gold));
    }

    #[test]
    fn oracle_actions_are_free(gold in projective_trees()) {
      let sys = system();
      let mut c = Configuration::new(gold.len());
      for a in sys.static_oracle(&gold).unwrap() {
        let costs = sys.dynamic_oracle_costs(&c, &[a], &gold).unwrap();
        prop_assert_eq!(costs, vec![0]);
        sys.apply(&mut c, a).unwrap();
      }
    }
  }
}
