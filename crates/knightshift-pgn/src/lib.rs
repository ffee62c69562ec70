//! PGN parser and row builder for KnightShift.
//!
//! Turns notation blocks into [`knightshift_core`] rows. Pure synchronous
//! parsing; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use knightshift_pgn::{build_game, games};
//!
//! let pgn = "[White \"a\"][Black \"b\"][Result \"1-0\"] 1. e4 e5";
//! for block in games(pgn.as_bytes()) {
//!   match block {
//!     Ok(block) => println!("{:?}", build_game(&block)),
//!     Err(e) => eprintln!("skipped: {e}"),
//!   }
//! }
//! ```

mod build;
pub mod error;
mod feed;
mod parse;

use std::io::BufRead;

pub use build::{Built, build_game, build_with_diagnostics};
pub use error::{Error, Result};
pub use feed::{PgnFeed, to_feed_item};
pub use parse::{BlockReader, Games, Headers, PgnGame, Tag};

/// Lazily parse every block in `reader`.
pub fn games<R: BufRead>(reader: R) -> Games<R> { Games::new(reader) }

