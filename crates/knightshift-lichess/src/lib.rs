//! Lichess HTTP source for KnightShift.
//!
//! [`LichessClient`] implements both [`knightshift_core::source::FeedSource`]
//! (TV channel PGN streams) and [`knightshift_core::source::ProfileSource`]
//! (the public user endpoint).

mod client;
pub mod error;
mod tv;
mod user;

pub use client::LichessClient;
pub use error::{Error, Result};
pub use tv::TvFeed;
