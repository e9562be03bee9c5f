//! Compact one-line notation for annotated sentences.
//!
//! Each whitespace-separated token is `form:head:label`, where `head` is the
//! 0-based index of the head token. The pseudo-root is written `form:-` and
//! tokens to be discarded `form:~`. The pseudo-root must come last.
//!
//! ```text
//! she:1:nsubj eats:3:root fish:1:obj ROOT:-
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::ParserError;
use crate::labels::LabelSet;
use crate::tree::{DependencyTree, Head};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedSentence {
  pub forms: Vec<String>,
  pub heads: Vec<Head>,
  pub labels: Vec<Option<String>>,
}

impl AnnotatedSentence {
  pub fn len(&self) -> usize {
    self.forms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Every label name used, in order of first appearance
  pub fn label_set(&self) -> LabelSet {
    self.labels.iter().flatten().collect()
  }

  /// Resolves label names against `labels`
  pub fn to_tree(&self, labels: &LabelSet) -> Result<DependencyTree, ParserError> {
    let deprels = self
      .labels
      .iter()
      .map(|name| match name {
        Some(name) => labels
          .get(name)
          .map(Some)
          .ok_or_else(|| ParserError::Notation(format!("unknown label {}", name))),
        None => Ok(None),
      })
      .collect::<Result<Vec<_>, _>>()?;
    DependencyTree::new(self.heads.clone(), deprels)
  }
}

fn parse_token(token: &str) -> Result<(String, Head, Option<String>), ParserError> {
  regex_static!(TOKEN, r"^([^:\s]+):(\d+|-|~)(?::([^:\s]+))?$");

  let caps = TOKEN
    .captures(token)
    .ok_or_else(|| ParserError::Notation(format!("couldn't match token at {}", token)))?;
  let form = caps[1].to_string();
  let label = caps.get(3).map(|m| m.as_str().to_string());

  let head = match &caps[2] {
    "-" => Head::Unassigned,
    "~" => Head::Removed,
    idx => Head::Token(
      idx
        .parse()
        .map_err(|e| ParserError::Notation(format!("head of {}: {}", form, e)))?,
    ),
  };

  match (head, &label) {
    (Head::Token(_), None) => Err(ParserError::Notation(format!("{} needs a label", form))),
    (Head::Unassigned, Some(_)) | (Head::Removed, Some(_)) => {
      Err(ParserError::Notation(format!("{} can't carry a label", form)))
    }
    _ => Ok((form, head, label)),
  }
}

impl FromStr for AnnotatedSentence {
  type Err = ParserError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut sentence = Self {
      forms: Vec::new(),
      heads: Vec::new(),
      labels: Vec::new(),
    };
    for token in s.split_whitespace() {
      let (form, head, label) = parse_token(token)?;
      sentence.forms.push(form);
      sentence.heads.push(head);
      sentence.labels.push(label);
    }

    if sentence.is_empty() {
      return Err(ParserError::Notation("empty sentence".into()));
    }
    for head in sentence.heads.iter() {
      if let Head::Token(h) = head {
        if *h >= sentence.len() {
          return Err(ParserError::Notation(format!("head {} out of range", h)));
        }
      }
    }
    Ok(sentence)
  }
}

impl fmt::Display for AnnotatedSentence {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for idx in 0..self.len() {
      if idx > 0 {
        write!(f, " ")?;
      }
      match (self.heads[idx], &self.labels[idx]) {
        (Head::Token(h), Some(l)) => write!(f, "{}:{}:{}", self.forms[idx], h, l)?,
        (Head::Token(h), None) => write!(f, "{}:{}", self.forms[idx], h)?,
        (Head::Unassigned, _) => write!(f, "{}:-", self.forms[idx])?,
        (Head::Removed, _) => write!(f, "{}:~", self.forms[idx])?,
      }
    }
    Ok(())
  }
}
