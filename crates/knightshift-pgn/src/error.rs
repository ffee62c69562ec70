//! Error types for the knightshift-pgn parser.

use thiserror::Error;

/// Why a PGN block was skipped.
#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed header line: {0}")]
  MalformedHeader(String),

  #[error("missing required header: {0}")]
  MissingHeader(&'static str),

  #[error("missing move text")]
  MissingMoves,

  #[error("read error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
