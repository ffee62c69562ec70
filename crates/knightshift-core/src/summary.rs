//! Per-run summaries returned by each stage.
//!
//! Row-level failures never abort a run; they are tallied here instead.

use serde::Serialize;

use crate::game::UpsertOutcome;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
  pub inserted:          usize,
  pub updated:           usize,
  pub skipped_identical: usize,
  /// Blocks skipped by the parser plus games with no id.
  pub malformed:         usize,
  /// Rows whose upsert failed.
  pub errored:           usize,
  /// The run ended early on a rate-limit signal.
  pub rate_limited:      bool,
}

impl IngestSummary {
  pub fn record(&mut self, outcome: UpsertOutcome) {
    match outcome {
      UpsertOutcome::Inserted => self.inserted += 1,
      UpsertOutcome::Updated => self.updated += 1,
      UpsertOutcome::SkippedIdentical => self.skipped_identical += 1,
    }
  }

  /// Games that reached the store (whatever the outcome).
  pub fn processed(&self) -> usize {
    self.inserted + self.updated + self.skipped_identical
  }
}

/// A row removed by the validator and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deletion {
  pub game_id: String,
  pub reason:  String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
  pub deleted:   usize,
  pub updated:   usize,
  pub errored:   usize,
  pub deletions: Vec<Deletion>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichSummary {
  /// Profile requests issued.
  pub fetched:          usize,
  pub inserted:         usize,
  /// Ids that already had a profile; only the flag was updated.
  pub flagged_existing: usize,
  /// Ids whose fetch or insert failed.
  pub failed:           usize,
  /// Game rows whose `profile_updated` flag was set.
  pub rows_flagged:     u64,
  /// Ids whose games could not be flagged.
  pub flag_failed:      usize,
  pub rate_limited:     bool,
}
