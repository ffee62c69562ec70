//! Error types for `knightshift-core`.

use thiserror::Error;

/// Failure signalled by an external source (game feed or profile lookup).
///
/// `RateLimited` is kept distinct from every other failure: it ends the
/// current pass early, while the others only skip the item at hand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  #[error("rate limited by remote source")]
  RateLimited,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("unexpected status {0}")]
  Status(u16),

  #[error("transport error: {0}")]
  Transport(String),

  #[error("decode error: {0}")]
  Decode(String),
}

/// An item a [`crate::source::GameFeed`] could not turn into a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
  /// The block was malformed and skipped; the feed continues.
  #[error("skipped malformed block: {0}")]
  Malformed(String),

  /// The underlying source failed; the feed ends.
  #[error(transparent)]
  Fetch(#[from] FetchError),
}

pub type Result<T, E = FetchError> = std::result::Result<T, E>;
