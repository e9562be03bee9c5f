//! The four shift-reduce transition systems behind one capability trait.
//!
//! Every system numbers its actions the same way: a fixed list of unlabeled
//! actions first, then LEFT/RIGHT interleaved per label, so
//! `left(l) = base + 2l` and `right(l) = base + 2l + 1`.

mod arc_eager;
mod arc_hybrid;
mod arc_standard;
mod swap;

use std::fmt;
use std::str::FromStr;

use crate::configuration::Configuration;
use crate::error::ParserError;
use crate::labels::{Label, LabelSet};
use crate::tree::DependencyTree;

pub use arc_eager::ArcEager;
pub use arc_hybrid::ArcHybrid;
pub use arc_standard::ArcStandard;
pub use swap::Swap;

/// Dense action id, meaningful only together with its system
pub type Action = usize;

/// An action with its label stripped
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
  Shift,
  Drop,
  Reduce,
  Swap,
  Left,
  Right,
}

impl ActionKind {
  fn name(self) -> &'static str {
    match self {
      Self::Shift => "SHIFT",
      Self::Drop => "DROP",
      Self::Reduce => "REDUCE",
      Self::Swap => "SWAP",
      Self::Left => "LEFT",
      Self::Right => "RIGHT",
    }
  }
}

impl fmt::Display for ActionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// A decoded action
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Transition {
  Shift,
  Drop,
  Reduce,
  Swap,
  Left(Label),
  Right(Label),
}

impl Transition {
  pub fn kind(self) -> ActionKind {
    match self {
      Self::Shift => ActionKind::Shift,
      Self::Drop => ActionKind::Drop,
      Self::Reduce => ActionKind::Reduce,
      Self::Swap => ActionKind::Swap,
      Self::Left(_) => ActionKind::Left,
      Self::Right(_) => ActionKind::Right,
    }
  }

  pub fn label(self) -> Option<Label> {
    match self {
      Self::Left(l) | Self::Right(l) => Some(l),
      _ => None,
    }
  }

  fn unlabeled(kind: ActionKind) -> Option<Self> {
    match kind {
      ActionKind::Shift => Some(Self::Shift),
      ActionKind::Drop => Some(Self::Drop),
      ActionKind::Reduce => Some(Self::Reduce),
      ActionKind::Swap => Some(Self::Swap),
      ActionKind::Left | ActionKind::Right => None,
    }
  }
}

/// What every transition system can do. Only legality, the primitive
/// mechanics and the oracles differ between systems; the id arithmetic is shared.
pub trait System {
  fn name(&self) -> &'static str;

  fn labels(&self) -> &LabelSet;

  /// The label-free actions, in id order
  fn unlabeled(&self) -> &'static [ActionKind];

  fn allow_nonprojective(&self) -> bool {
    false
  }

  fn num_actions(&self) -> usize {
    self.unlabeled().len() + 2 * self.labels().len()
  }

  fn num_labels(&self) -> usize {
    self.labels().len()
  }

  fn encode_left(&self, label: Label) -> Action {
    self.unlabeled().len() + 2 * label
  }

  fn encode_right(&self, label: Label) -> Action {
    self.unlabeled().len() + 2 * label + 1
  }

  /// The id of a transition, if this system has it
  fn encode(&self, transition: Transition) -> Option<Action> {
    match transition {
      Transition::Left(l) if l < self.num_labels() => Some(self.encode_left(l)),
      Transition::Right(l) if l < self.num_labels() => Some(self.encode_right(l)),
      Transition::Left(_) | Transition::Right(_) => None,
      t => self.unlabeled().iter().position(|&k| k == t.kind()),
    }
  }

  fn decode(&self, action: Action) -> Result<Transition, ParserError> {
    let base = self.unlabeled().len();
    if action >= self.num_actions() {
      return Err(ParserError::ActionOutOfRange {
        action,
        num_actions: self.num_actions(),
      });
    }
    if action < base {
      // unlabeled() never lists Left or Right
      Transition::unlabeled(self.unlabeled()[action]).ok_or(ParserError::ActionOutOfRange {
        action,
        num_actions: self.num_actions(),
      })
    } else if (action - base) % 2 == 0 {
      Ok(Transition::Left((action - base) / 2))
    } else {
      Ok(Transition::Right((action - base) / 2))
    }
  }

  fn decode_label(&self, action: Action) -> Option<Label> {
    self.decode(action).ok().and_then(Transition::label)
  }

  /// Collapses an action id to its coarse kind
  fn structural_class(&self, action: Action) -> Result<ActionKind, ParserError> {
    self.decode(action).map(Transition::kind)
  }

  fn is_kind(&self, action: Action, kind: ActionKind) -> bool {
    self.structural_class(action).map(|k| k == kind).unwrap_or(false)
  }

  fn is_shift(&self, action: Action) -> bool {
    self.is_kind(action, ActionKind::Shift)
  }

  fn is_left(&self, action: Action) -> bool {
    self.is_kind(action, ActionKind::Left)
  }

  fn is_right(&self, action: Action) -> bool {
    self.is_kind(action, ActionKind::Right)
  }

  fn action_name(&self, action: Action) -> String {
    match self.decode(action) {
      Ok(Transition::Left(l)) | Ok(Transition::Right(l)) => {
        let kind = self.structural_class(action).map(|k| k.name()).unwrap_or("?");
        match self.labels().name(l) {
          Some(name) => format!("{}-{}", kind, name),
          None => format!("{}-{}", kind, l),
        }
      }
      Ok(t) => t.kind().name().to_string(),
      Err(_) => format!("<invalid {}>", action),
    }
  }

  /// Structural guards of one transition in `config`
  fn is_legal(&self, config: &Configuration, transition: Transition) -> bool;

  /// Executes a transition without checking it
  fn perform(&self, config: &mut Configuration, transition: Transition);

  fn is_legal_action(&self, config: &Configuration, action: Action) -> bool {
    self
      .decode(action)
      .map(|t| self.is_legal(config, t))
      .unwrap_or(false)
  }

  /// All legal actions in id order; never empty for a live configuration
  fn legal_actions(&self, config: &Configuration) -> Result<Vec<Action>, ParserError> {
    if config.terminated() {
      return Err(ParserError::Terminated);
    }
    let legal = (0..self.num_actions())
      .filter(|&a| self.is_legal_action(config, a))
      .collect::<Vec<_>>();
    if legal.is_empty() {
      Err(ParserError::NoLegalAction)
    } else {
      Ok(legal)
    }
  }

  fn apply(&self, config: &mut Configuration, action: Action) -> Result<(), ParserError> {
    let transition = self.decode(action)?;
    if !self.is_legal(config, transition) {
      return Err(ParserError::IllegalAction {
        action,
        name: self.action_name(action),
      });
    }
    self.perform(config, transition);
    Ok(())
  }

  /// The canonical action sequence that rebuilds `gold`
  fn static_oracle(&self, gold: &DependencyTree) -> Result<Vec<Action>, ParserError>;

  /// For every candidate, how many gold arcs become unreachable if it is taken
  fn dynamic_oracle_costs(
    &self,
    config: &Configuration,
    actions: &[Action],
    gold: &DependencyTree,
  ) -> Result<Vec<u32>, ParserError>;
}

/// Which transition system to build
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SystemKind {
  ArcStandard,
  ArcEager,
  ArcHybrid,
  Swap,
}

impl SystemKind {
  pub const ALL: [SystemKind; 4] = [
    SystemKind::ArcStandard,
    SystemKind::ArcEager,
    SystemKind::ArcHybrid,
    SystemKind::Swap,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Self::ArcStandard => "arcstd",
      Self::ArcEager => "arceager",
      Self::ArcHybrid => "archybrid",
      Self::Swap => "swap",
    }
  }
}

impl FromStr for SystemKind {
  type Err = ParserError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
      "arcstd" | "arcstandard" => Ok(Self::ArcStandard),
      "arceager" => Ok(Self::ArcEager),
      "archybrid" => Ok(Self::ArcHybrid),
      "swap" => Ok(Self::Swap),
      _ => Err(ParserError::UnknownSystem(s.to_string())),
    }
  }
}

impl fmt::Display for SystemKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// The closed set of systems. Dispatches every `System` method to its variant.
#[derive(Debug, Clone)]
pub enum TransitionSystem {
  ArcStandard(ArcStandard),
  ArcEager(ArcEager),
  ArcHybrid(ArcHybrid),
  Swap(Swap),
}

macro_rules! dispatch {
  ($self:ident, $sys:ident => $body:expr) => {
    match $self {
      TransitionSystem::ArcStandard($sys) => $body,
      TransitionSystem::ArcEager($sys) => $body,
      TransitionSystem::ArcHybrid($sys) => $body,
      TransitionSystem::Swap($sys) => $body,
    }
  };
}

impl TransitionSystem {
  pub fn new(kind: SystemKind, labels: LabelSet) -> Self {
    let system = match kind {
      SystemKind::ArcStandard => Self::ArcStandard(ArcStandard::new(labels)),
      SystemKind::ArcEager => Self::ArcEager(ArcEager::new(labels)),
      SystemKind::ArcHybrid => Self::ArcHybrid(ArcHybrid::new(labels)),
      SystemKind::Swap => Self::Swap(Swap::new(labels)),
    };
    tracing::debug!(
      system = system.name(),
      num_actions = system.num_actions(),
      actions = ?system.action_names(),
      "built transition system"
    );
    system
  }

  pub fn kind(&self) -> SystemKind {
    match self {
      Self::ArcStandard(_) => SystemKind::ArcStandard,
      Self::ArcEager(_) => SystemKind::ArcEager,
      Self::ArcHybrid(_) => SystemKind::ArcHybrid,
      Self::Swap(_) => SystemKind::Swap,
    }
  }

  pub fn action_names(&self) -> Vec<String> {
    (0..self.num_actions()).map(|a| self.action_name(a)).collect()
  }

  /// Inverse of `action_name`: `SHIFT`, `LEFT-nsubj`, ...
  pub fn action_from_name(&self, name: &str) -> Result<Action, ParserError> {
    regex_static!(LABELED, r"^(LEFT|RIGHT)-(\S+)$");

    let unknown = || ParserError::UnknownAction(name.to_string());
    let transition = if let Some(caps) = LABELED.captures(name.trim()) {
      let label = self.labels().get(&caps[2]).ok_or_else(unknown)?;
      if &caps[1] == "LEFT" {
        Transition::Left(label)
      } else {
        Transition::Right(label)
      }
    } else {
      self
        .unlabeled()
        .iter()
        .copied()
        .find(|k| k.name() == name.trim())
        .and_then(Transition::unlabeled)
        .ok_or_else(unknown)?
    };
    self.encode(transition).ok_or_else(unknown)
  }
}

impl System for TransitionSystem {
  fn name(&self) -> &'static str {
    dispatch!(self, s => s.name())
  }

  fn labels(&self) -> &LabelSet {
    dispatch!(self, s => s.labels())
  }

  fn unlabeled(&self) -> &'static [ActionKind] {
    dispatch!(self, s => s.unlabeled())
  }

  fn allow_nonprojective(&self) -> bool {
    dispatch!(self, s => s.allow_nonprojective())
  }

  fn is_legal(&self, config: &Configuration, transition: Transition) -> bool {
    dispatch!(self, s => s.is_legal(config, transition))
  }

  fn perform(&self, config: &mut Configuration, transition: Transition) {
    dispatch!(self, s => s.perform(config, transition))
  }

  fn static_oracle(&self, gold: &DependencyTree) -> Result<Vec<Action>, ParserError> {
    dispatch!(self, s => s.static_oracle(gold))
  }

  fn dynamic_oracle_costs(
    &self,
    config: &Configuration,
    actions: &[Action],
    gold: &DependencyTree,
  ) -> Result<Vec<u32>, ParserError> {
    dispatch!(self, s => s.dynamic_oracle_costs(config, actions, gold))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn labels() -> LabelSet {
    ["det", "nsubj", "root"].iter().collect()
  }

  #[test]
  fn test_num_actions() {
    let counts = SystemKind::ALL
      .iter()
      .map(|&k| TransitionSystem::new(k, labels()).num_actions())
      .collect::<Vec<_>>();
    assert_eq!(counts, vec![2 + 6, 3 + 6, 1 + 6, 2 + 6]);
  }

  #[test]
  fn test_id_scheme_round_trips() {
    for kind in SystemKind::ALL {
      let sys = TransitionSystem::new(kind, labels());
      for a in 0..sys.num_actions() {
        let t = sys.decode(a).unwrap();
        assert_eq!(sys.encode(t), Some(a), "{} {}", kind, a);
        assert_eq!(sys.action_from_name(&sys.action_name(a)), Ok(a));
      }
      assert!(sys.decode(sys.num_actions()).is_err());
    }
  }

  #[test]
  fn test_action_names() {
    let sys = TransitionSystem::new(SystemKind::ArcEager, labels());
    assert_eq!(
      sys.action_names(),
      vec![
        "SHIFT", "DROP", "REDUCE", "LEFT-det", "RIGHT-det", "LEFT-nsubj", "RIGHT-nsubj", "LEFT-root",
        "RIGHT-root"
      ]
    );
    assert_eq!(sys.decode_label(6), Some(1));
    assert_eq!(sys.structural_class(6), Ok(ActionKind::Right));
    assert!(sys.action_from_name("SWAP").is_err());
    assert!(sys.action_from_name("LEFT-obj").is_err());
  }

  #[test]
  fn test_structural_class_ignores_label() {
    let sys = TransitionSystem::new(SystemKind::Swap, labels());
    assert_eq!(sys.structural_class(1), Ok(ActionKind::Swap));
    assert_eq!(sys.structural_class(sys.encode_left(0)), sys.structural_class(sys.encode_left(2)));
    assert_ne!(sys.structural_class(sys.encode_left(0)), sys.structural_class(sys.encode_right(0)));
  }

  #[test]
  fn test_system_kind_from_str() {
    assert_eq!("arcstd".parse(), Ok(SystemKind::ArcStandard));
    assert_eq!("arc-hybrid".parse(), Ok(SystemKind::ArcHybrid));
    assert_eq!("Swap".parse(), Ok(SystemKind::Swap));
    assert!("earley".parse::<SystemKind>().is_err());
  }
}
