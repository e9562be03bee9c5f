use std::collections::HashMap;
use std::fmt;

/// Dense relation label id
pub type Label = usize;

/// The relation-label vocabulary. Ids are assigned in insertion order and never change.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LabelSet {
  names: Vec<String>,
  index: HashMap<String, Label>,
}

impl LabelSet {
  pub fn new() -> Self {
    Default::default()
  }

  /// Adds a label if it isn't known yet, returning its id either way
  pub fn insert(&mut self, name: &str) -> Label {
    if let Some(&id) = self.index.get(name) {
      return id;
    }
    let id = self.names.len();
    self.names.push(name.to_string());
    self.index.insert(name.to_string(), id);
    id
  }

  pub fn get(&self, name: &str) -> Option<Label> {
    self.index.get(name).copied()
  }

  pub fn name(&self, label: Label) -> Option<&str> {
    self.names.get(label).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn iter(&self) -> impl Iterator<Item = (Label, &str)> {
    self.names.iter().enumerate().map(|(id, n)| (id, n.as_str()))
  }
}

impl<S: AsRef<str>> FromIterator<S> for LabelSet {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    let mut set = Self::new();
    for name in iter {
      set.insert(name.as_ref());
    }
    set
  }
}

impl fmt::Display for LabelSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[")?;
    for (id, name) in self.iter() {
      if id > 0 {
        write!(f, " ")?;
      }
      write!(f, "{}", name)?;
    }
    write!(f, "]")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_insert_is_idempotent() {
    let mut labels = LabelSet::new();
    assert_eq!(labels.insert("nsubj"), 0);
    assert_eq!(labels.insert("obj"), 1);
    assert_eq!(labels.insert("nsubj"), 0);
    assert_eq!(labels.len(), 2);
    assert_eq!(labels.name(1), Some("obj"));
    assert_eq!(labels.get("det"), None);
  }

  #[test]
  fn test_collect_and_display() {
    let labels: LabelSet = ["det", "nsubj", "det"].iter().collect();
    assert_eq!(labels.len(), 2);
    assert_eq!(format!("{}", labels), "[det nsubj]");
  }
}
