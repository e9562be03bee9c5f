use std::error::Error;

use crate::system::Action;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: regex::Regex = regex::Regex::new($pattern).unwrap();
    }
  };
}

/// Numerically stable log-softmax over the whole score vector
///
/// ```
/// let p = shiftreduce::utils::log_softmax(&[1.0, 1.0]);
/// assert!((p[0] - (0.5f32).ln()).abs() < 1e-6);
/// ```
pub fn log_softmax(scores: &[f32]) -> Vec<f32> {
  let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
  if !max.is_finite() {
    return scores.to_vec();
  }
  let sum = scores.iter().map(|s| (s - max).exp()).sum::<f32>();
  let log_z = max + sum.ln();
  scores.iter().map(|s| s - log_z).collect()
}

/// Highest-scoring action among `candidates`. Ties go to the earlier candidate.
pub fn best_action(scores: &[f32], candidates: &[Action]) -> Option<(Action, f32)> {
  let mut best: Option<(Action, f32)> = None;
  for &a in candidates {
    let s = scores[a];
    match best {
      Some((_, best_score)) if best_score >= s => {}
      _ => best = Some((a, s)),
    }
  }
  best
}
