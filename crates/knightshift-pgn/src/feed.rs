//! [`GameFeed`] over any buffered reader: PGN files, stdin or a fully
//! downloaded export.

use std::io::BufRead;

use knightshift_core::{FeedError, FetchError, game::NewGame, source::GameFeed};

use crate::{
  build::build_with_diagnostics,
  error::Error,
  parse::{Games, PgnGame},
};

/// Turn one parser item into a feed item, logging coercion notes.
pub fn to_feed_item(item: Result<PgnGame, Error>) -> Result<NewGame, FeedError> {
  match item {
    Ok(pgn) => {
      let built = build_with_diagnostics(&pgn);
      for note in &built.diagnostics {
        tracing::debug!(game_id = %built.game.game_id, "{note}");
      }
      Ok(built.game)
    }
    Err(Error::Io(e)) => Err(FeedError::Fetch(FetchError::Transport(e.to_string()))),
    Err(e) => Err(FeedError::Malformed(e.to_string())),
  }
}

/// A feed reading PGN blocks lazily from `R`.
pub struct PgnFeed<R> {
  games: Games<R>,
}

impl<R: BufRead> PgnFeed<R> {
  pub fn new(reader: R) -> Self {
    Self {
      games: Games::new(reader),
    }
  }
}

impl<R: BufRead + Send> GameFeed for PgnFeed<R> {
  async fn next_game(&mut self) -> Option<Result<NewGame, FeedError>> {
    self.games.next().map(to_feed_item)
  }
}
