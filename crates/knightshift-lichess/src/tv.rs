//! Streaming PGN feed over a TV channel response body.

use std::collections::VecDeque;

use knightshift_core::{FeedError, FetchError, game::NewGame, source::GameFeed};
use knightshift_pgn::{BlockReader, to_feed_item};

/// Splits arbitrary byte chunks into lines and hands them to a
/// [`BlockReader`], queueing each completed block.
#[derive(Default)]
struct ChunkDecoder {
  pending: Vec<u8>,
  blocks:  BlockReader,
  ready:   VecDeque<Result<NewGame, FeedError>>,
}

impl ChunkDecoder {
  fn push(&mut self, chunk: &[u8]) {
    self.pending.extend_from_slice(chunk);
    while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
      let line: Vec<u8> = self.pending.drain(..=end).collect();
      self.line(&line);
    }
  }

  fn finish(&mut self) {
    if !self.pending.is_empty() {
      let rest = std::mem::take(&mut self.pending);
      self.line(&rest);
    }
    if let Some(item) = self.blocks.finish() {
      self.ready.push_back(to_feed_item(item));
    }
  }

  fn line(&mut self, bytes: &[u8]) {
    if let Some(item) = self.blocks.feed_line(&String::from_utf8_lossy(bytes)) {
      self.ready.push_back(to_feed_item(item));
    }
  }
}

/// Games from one `GET /api/tv/{channel}` response, read chunk by chunk.
pub struct TvFeed {
  channel:  String,
  response: Option<reqwest::Response>,
  decoder:  ChunkDecoder,
}

impl TvFeed {
  pub(crate) fn new(channel: &str, response: reqwest::Response) -> Self {
    Self {
      channel:  channel.to_string(),
      response: Some(response),
      decoder:  ChunkDecoder::default(),
    }
  }
}

impl GameFeed for TvFeed {
  async fn next_game(&mut self) -> Option<Result<NewGame, FeedError>> {
    loop {
      if let Some(item) = self.decoder.ready.pop_front() {
        return Some(item);
      }
      let response = self.response.as_mut()?;
      match response.chunk().await {
        Ok(Some(chunk)) => self.decoder.push(&chunk),
        Ok(None) => {
          self.response = None;
          self.decoder.finish();
        }
        Err(e) => {
          tracing::warn!(channel = %self.channel, error = %e, "tv stream broke off");
          self.response = None;
          self
            .decoder
            .ready
            .push_back(Err(FetchError::Transport(e.to_string()).into()));
        }
      }
    }
  }
}
