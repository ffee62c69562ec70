use knightshift_core::config::RunLimits;
use tokio::time::Instant;

/// Tracks a run against its record cap and wall-clock limit.
pub(crate) struct Budget {
  limits:  RunLimits,
  started: Instant,
}

impl Budget {
  pub fn start(limits: &RunLimits) -> Self {
    Self {
      limits:  limits.clone(),
      started: Instant::now(),
    }
  }

  pub fn out_of_time(&self) -> bool {
    self
      .limits
      .time_limit()
      .is_some_and(|limit| self.started.elapsed() >= limit)
  }

  /// Whether the run should stop after `done` records.
  pub fn exhausted(&self, done: usize) -> bool {
    self.limits.reached(done) || self.out_of_time()
  }

  pub fn limits(&self) -> &RunLimits { &self.limits }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_time_limit_is_immediately_spent() {
    let budget = Budget::start(&RunLimits {
      time_limit_secs: Some(0),
      ..RunLimits::default()
    });
    assert!(budget.out_of_time());
    assert!(budget.exhausted(0));
  }

  #[test]
  fn unbounded_budget_never_exhausts() {
    let budget = Budget::start(&RunLimits::default());
    assert!(!budget.exhausted(usize::MAX));
  }
}
