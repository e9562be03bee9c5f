use thiserror::Error;

use crate::system::Action;

/// Everything that can go wrong while driving a transition system.
///
/// Most variants are contract violations by the caller (an oracle asked for a
/// tree the system cannot build, an action applied where it is illegal).
/// `CostsUnsupported` is a documented capability gap of the swap system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
  #[error("configuration is already terminated")]
  Terminated,

  #[error("no legal action in a non-terminated configuration")]
  NoLegalAction,

  #[error("illegal action {name} ({action}) in the current configuration")]
  IllegalAction { action: Action, name: String },

  #[error("action id {action} out of range (system has {num_actions} actions)")]
  ActionOutOfRange { action: Action, num_actions: usize },

  #[error("label id {label} out of range (vocabulary has {num_labels} labels)")]
  LabelOutOfRange { label: usize, num_labels: usize },

  #[error("token {0} has no label")]
  MissingLabel(usize),

  #[error("heads do not form a tree")]
  NotATree,

  #[error("tree is not projective")]
  NotProjective,

  #[error("the root must be the last token")]
  RootNotLast,

  #[error("system {0} cannot discard tokens")]
  RemovalUnsupported(&'static str),

  #[error("tree cannot be realized by the {0} system")]
  NotRealizable(&'static str),

  #[error("length mismatch: expected {expected}, got {actual}")]
  LengthMismatch { expected: usize, actual: usize },

  #[error("system {0} does not define per-action costs")]
  CostsUnsupported(&'static str),

  #[error("loss went down from {before} to {after} after one action")]
  LossDecreased { before: u32, after: u32 },

  #[error("scorer returned {actual} scores, system has {expected} actions")]
  ScoreLength { expected: usize, actual: usize },

  #[error("beam width must be at least 1")]
  InvalidBeamWidth,

  #[error("notation: {0}")]
  Notation(String),

  #[error("unknown transition system {0:?}")]
  UnknownSystem(String),

  #[error("unknown action {0:?}")]
  UnknownAction(String),
}
