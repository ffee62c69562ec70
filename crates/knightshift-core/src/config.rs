//! Run configuration handed to each pipeline component at construction.
//!
//! Every struct deserialises from the `knightshift.toml` layout and falls back
//! to the defaults below for missing keys. Nothing here reads the
//! environment; layering is the binary's job.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

// ─── Shared limits ───────────────────────────────────────────────────────────

/// Volume and pacing bounds common to every stage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunLimits {
  /// Stop after this many records in one run; `None` for no cap.
  pub max_records:      Option<usize>,
  pub batch_size:       usize,
  /// Pause between batches (ingest: between channel rounds).
  pub batch_pause_secs: u64,
  /// Wall-clock budget for one run; `None` for no limit.
  pub time_limit_secs:  Option<u64>,
}

impl Default for RunLimits {
  fn default() -> Self {
    Self {
      max_records:      None,
      batch_size:       500,
      batch_pause_secs: 0,
      time_limit_secs:  None,
    }
  }
}

impl RunLimits {
  pub fn batch_pause(&self) -> Duration { Duration::from_secs(self.batch_pause_secs) }

  pub fn time_limit(&self) -> Option<Duration> {
    self.time_limit_secs.map(Duration::from_secs)
  }

  /// Whether `done` records already reach `max_records`.
  pub fn reached(&self, done: usize) -> bool {
    self.max_records.is_some_and(|max| done >= max)
  }
}

// ─── Stages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
  pub limits:           RunLimits,
  /// TV channels polled each round.
  pub channels:         Vec<String>,
  /// Attempts to open a channel before giving up on it for the round.
  pub connect_retries:  u32,
  pub retry_delay_secs: u64,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self {
      limits:           RunLimits {
        max_records:      Some(5000),
        batch_size:       500,
        batch_pause_secs: 5,
        time_limit_secs:  Some(90),
      },
      channels:         ["bullet", "blitz", "classical", "rapid", "ultraBullet"]
        .into_iter()
        .map(String::from)
        .collect(),
      connect_retries:  3,
      retry_delay_secs: 5,
    }
  }
}

impl IngestConfig {
  pub fn retry_delay(&self) -> Duration { Duration::from_secs(self.retry_delay_secs) }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidateConfig {
  pub limits:     RunLimits,
  /// Ratings above this bound are treated as invalid.
  pub max_rating: i64,
  /// Host a well-formed site URL must point at.
  pub site_host:  String,
}

impl Default for ValidateConfig {
  fn default() -> Self {
    Self {
      limits:     RunLimits::default(),
      max_rating: 4000,
      site_host:  "lichess.org".to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
  pub limits:              RunLimits,
  /// Delay between individual profile requests.
  pub request_interval_ms: u64,
}

impl Default for EnrichConfig {
  fn default() -> Self {
    Self {
      limits:              RunLimits {
        max_records:      None,
        batch_size:       3000,
        batch_pause_secs: 15 * 60,
        time_limit_secs:  Some(300),
      },
      request_interval_ms: 500,
    }
  }
}

impl EnrichConfig {
  pub fn request_interval(&self) -> Duration {
    Duration::from_millis(self.request_interval_ms)
  }
}

// ─── Remote source ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LichessConfig {
  pub base_url:     String,
  /// Optional personal API token, sent as a bearer token.
  pub token:        Option<String>,
  pub timeout_secs: u64,
}

impl Default for LichessConfig {
  fn default() -> Self {
    Self {
      base_url:     "https://lichess.org".to_string(),
      token:        None,
      timeout_secs: 30,
    }
  }
}

impl LichessConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  pub store_path: PathBuf,
  pub lichess:    LichessConfig,
  pub ingest:     IngestConfig,
  pub validate:   ValidateConfig,
  pub enrich:     EnrichConfig,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("knightshift.db"),
      lichess:    LichessConfig::default(),
      ingest:     IngestConfig::default(),
      validate:   ValidateConfig::default(),
      enrich:     EnrichConfig::default(),
    }
  }
}
