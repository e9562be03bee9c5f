use crate::error::ParserError;
use crate::labels::Label;

/// What a token is attached to. The pseudo-root (always the last token) keeps
/// `Unassigned` forever; `Removed` marks tokens discarded by DROP.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Head {
  Unassigned,
  Removed,
  Token(usize),
}

impl Head {
  pub fn token(self) -> Option<usize> {
    match self {
      Self::Token(h) => Some(h),
      _ => None,
    }
  }

  pub fn is_unassigned(self) -> bool {
    matches!(self, Self::Unassigned)
  }

  pub fn is_removed(self) -> bool {
    matches!(self, Self::Removed)
  }

  /// True if this is an arc to `h`
  pub fn is(self, h: usize) -> bool {
    self == Self::Token(h)
  }
}

/// A (possibly partial) labeled dependency tree over `len()` tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTree {
  pub heads: Vec<Head>,
  pub deprels: Vec<Option<Label>>,
}

impl DependencyTree {
  pub fn new(heads: Vec<Head>, deprels: Vec<Option<Label>>) -> Result<Self, ParserError> {
    if heads.len() != deprels.len() {
      return Err(ParserError::LengthMismatch {
        expected: heads.len(),
        actual: deprels.len(),
      });
    }
    Ok(Self { heads, deprels })
  }

  pub fn len(&self) -> usize {
    self.heads.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// True if `i` attaches to `h` with exactly `label`
  pub fn has_arc(&self, h: usize, i: usize, label: Label) -> bool {
    self.heads[i].is(h) && self.deprels[i] == Some(label)
  }

  /// The unique unattached token, if there is exactly one
  pub fn root(&self) -> Option<usize> {
    let mut roots = self.heads.iter().enumerate().filter(|(_, h)| h.is_unassigned());
    match (roots.next(), roots.next()) {
      (Some((i, _)), None) => Some(i),
      _ => None,
    }
  }

  pub fn has_removed(&self) -> bool {
    self.heads.iter().any(|h| h.is_removed())
  }

  /// Dependents of every token, each list in ascending order
  pub fn children(&self) -> Vec<Vec<usize>> {
    let mut tree = vec![Vec::new(); self.len()];
    for (i, h) in self.heads.iter().enumerate() {
      if let Some(h) = h.token() {
        if h < tree.len() {
          tree[h].push(i);
        }
      }
    }
    tree
  }

  /// Checks that the non-removed tokens form a single tree under one root
  pub fn is_tree(&self) -> bool {
    let n = self.len();
    if self.heads.iter().any(|h| matches!(h, Head::Token(t) if *t >= n)) {
      return false;
    }
    let root = match self.root() {
      Some(root) => root,
      None => return false,
    };

    let children = self.children();
    let mut visited = vec![false; n];
    let mut agenda = vec![root];
    while let Some(node) = agenda.pop() {
      if visited[node] {
        return false;
      }
      visited[node] = true;
      agenda.extend(children[node].iter().copied());
    }

    (0..n).all(|i| self.heads[i].is_removed() || visited[i])
  }

  /// No two arcs cross when drawn above the sentence. The root's missing head
  /// is treated as a virtual node just past the last token.
  pub fn is_projective(&self) -> bool {
    let n = self.len();
    let position = |i: usize| match self.heads[i] {
      Head::Token(h) => Some(h),
      Head::Unassigned => Some(n),
      Head::Removed => None,
    };

    for m in 0..n {
      let Some(h) = position(m) else { continue };
      let (lo, hi) = if h < m { (h, m) } else { (m, h) };
      for k in (lo + 1)..hi.min(n) {
        if let Some(t) = position(k) {
          if t < lo || t > hi {
            return false;
          }
        }
      }
    }
    true
  }

  /// Fraction of tokens whose head and label both match `gold`
  pub fn accuracy(&self, gold: &DependencyTree) -> Result<f32, ParserError> {
    if gold.len() != self.len() {
      return Err(ParserError::LengthMismatch {
        expected: gold.len(),
        actual: self.len(),
      });
    }
    if self.is_empty() {
      return Ok(0.0);
    }
    let correct = (0..self.len())
      .filter(|&i| self.heads[i] == gold.heads[i] && self.deprels[i] == gold.deprels[i])
      .count();
    Ok(correct as f32 / self.len() as f32)
  }

  /// Validates a gold tree before an oracle replays it
  pub(crate) fn check_gold(
    &self,
    system: &'static str,
    num_labels: usize,
    projective: bool,
    allow_removed: bool,
  ) -> Result<(), ParserError> {
    if self.heads.len() != self.deprels.len() {
      return Err(ParserError::LengthMismatch {
        expected: self.heads.len(),
        actual: self.deprels.len(),
      });
    }
    for (i, (head, label)) in self.heads.iter().zip(self.deprels.iter()).enumerate() {
      if let Head::Token(_) = head {
        match label {
          None => return Err(ParserError::MissingLabel(i)),
          Some(l) if *l >= num_labels => {
            return Err(ParserError::LabelOutOfRange {
              label: *l,
              num_labels,
            });
          }
          _ => {}
        }
      }
    }
    if !self.is_tree() {
      return Err(ParserError::NotATree);
    }
    if self.root() != Some(self.len() - 1) {
      return Err(ParserError::RootNotLast);
    }
    if !allow_removed && self.has_removed() {
      return Err(ParserError::RemovalUnsupported(system));
    }
    if projective && !self.is_projective() {
      return Err(ParserError::NotProjective);
    }
    Ok(())
  }
}
