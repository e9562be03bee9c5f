use std::fmt;

use crate::labels::Label;
use crate::tree::{DependencyTree, Head};

/// The parse state of one sentence: a stack, a buffer and the arcs built so far.
///
/// There are no guard entries: `s0()`, `s1()` and `b0()` return `None` where
/// the stack or buffer runs out.
/// The buffer is stored back-to-front so the next input token is `buffer.last()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
  pub stack: Vec<usize>,
  pub buffer: Vec<usize>,
  pub heads: Vec<Head>,
  pub deprels: Vec<Option<Label>>,
}

impl Configuration {
  /// Initial configuration for `n` tokens, the last of which is the pseudo-root
  pub fn new(n: usize) -> Self {
    Self {
      stack: Vec::with_capacity(n),
      buffer: (0..n).rev().collect(),
      heads: vec![Head::Unassigned; n],
      deprels: vec![None; n],
    }
  }

  pub fn len(&self) -> usize {
    self.heads.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Stack top
  pub fn s0(&self) -> Option<usize> {
    self.stack.last().copied()
  }

  /// Element below the stack top
  pub fn s1(&self) -> Option<usize> {
    self.stack.len().checked_sub(2).map(|i| self.stack[i])
  }

  /// Buffer front
  pub fn b0(&self) -> Option<usize> {
    self.buffer.last().copied()
  }

  /// Only the root is left unattached: nothing to do
  pub fn terminated(&self) -> bool {
    self.stack.len() <= 1 && self.buffer.is_empty()
  }

  pub(crate) fn attach(&mut self, head: usize, dependent: usize, label: Label) {
    self.heads[dependent] = Head::Token(head);
    self.deprels[dependent] = Some(label);
  }

  /// Moves the buffer front onto the stack
  pub(crate) fn shift(&mut self) {
    if let Some(b) = self.buffer.pop() {
      self.stack.push(b);
    }
  }

  /// Discards the buffer front
  pub(crate) fn drop_front(&mut self) {
    if let Some(b) = self.buffer.pop() {
      self.heads[b] = Head::Removed;
      self.deprels[b] = None;
    }
  }

  /// Pops the top two stack elements; the upper stays, the lower goes back to the buffer
  pub(crate) fn swap(&mut self) {
    if let (Some(j), Some(i)) = (self.stack.pop(), self.stack.pop()) {
      self.stack.push(j);
      self.buffer.push(i);
    }
  }

  /// s1 <- s0: s1 becomes a dependent of s0 and leaves the stack
  pub(crate) fn left_on_stack(&mut self, label: Label) {
    if let (Some(hed), Some(dep)) = (self.stack.pop(), self.stack.pop()) {
      self.stack.push(hed);
      self.attach(hed, dep, label);
    }
  }

  /// s1 -> s0: s0 becomes a dependent of s1 and leaves the stack
  pub(crate) fn right_on_stack(&mut self, label: Label) {
    if let Some(dep) = self.stack.pop() {
      if let Some(hed) = self.s0() {
        self.attach(hed, dep, label);
      }
    }
  }

  /// The arcs built so far
  pub fn tree(&self) -> DependencyTree {
    DependencyTree {
      heads: self.heads.clone(),
      deprels: self.deprels.clone(),
    }
  }

  pub fn into_tree(self) -> DependencyTree {
    DependencyTree {
      heads: self.heads,
      deprels: self.deprels,
    }
  }
}

impl fmt::Display for Configuration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "stack: [")?;
    for (idx, s) in self.stack.iter().enumerate() {
      if idx > 0 {
        write!(f, " ")?;
      }
      write!(f, "{}", s)?;
    }
    write!(f, "] buffer: [")?;
    for (idx, b) in self.buffer.iter().rev().enumerate() {
      if idx > 0 {
        write!(f, " ")?;
      }
      write!(f, "{}", b)?;
    }
    write!(f, "]")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_initial_configuration() {
    let c = Configuration::new(3);
    assert_eq!(c.b0(), Some(0));
    assert_eq!(c.s0(), None);
    assert!(!c.terminated());
    assert_eq!(format!("{}", c), "stack: [] buffer: [0 1 2]");
  }

  #[test]
  fn test_primitives() {
    let mut c = Configuration::new(4);
    c.shift();
    c.shift();
    assert_eq!((c.s1(), c.s0()), (Some(0), Some(1)));

    c.swap();
    assert_eq!(c.stack, vec![1]);
    assert_eq!(c.b0(), Some(0));

    c.shift();
    c.left_on_stack(3);
    assert_eq!(c.stack, vec![0]);
    assert_eq!(c.heads[1], Head::Token(0));
    assert_eq!(c.deprels[1], Some(3));

    c.drop_front();
    assert_eq!(c.heads[2], Head::Removed);
    c.shift();
    c.right_on_stack(1);
    assert_eq!(c.heads[3], Head::Token(0));
    assert!(c.terminated());
  }
}
