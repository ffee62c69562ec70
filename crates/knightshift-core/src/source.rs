//! Seams to the outside world: the game feed and the profile lookup.

use std::future::Future;

use crate::{
  error::{FeedError, FetchError},
  game::NewGame,
  profile::UserProfile,
};

/// A pull-based stream of built games.
///
/// Each call may wait on I/O. `None` means the feed is exhausted. An item
/// of `Err(FeedError::Malformed(_))` is a skipped block and the feed may be
/// polled again; `Err(FeedError::Fetch(_))` ends the feed.
pub trait GameFeed: Send {
  fn next_game(
    &mut self,
  ) -> impl Future<Output = Option<Result<NewGame, FeedError>>> + Send + '_;
}

/// Opens a [`GameFeed`] per named channel.
pub trait FeedSource: Send + Sync {
  type Feed: GameFeed;

  fn open<'a>(
    &'a self,
    channel: &'a str,
  ) -> impl Future<Output = Result<Self::Feed, FetchError>> + Send + 'a;
}

/// Request/response lookup of a player profile by id.
pub trait ProfileSource: Send + Sync {
  fn fetch_profile<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<UserProfile, FetchError>> + Send + 'a;
}
