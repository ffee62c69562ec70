//! The `GameStore` and `ProfileStore` traits.
//!
//! Implemented by storage backends (e.g. `knightshift-store-sqlite`). The
//! pipeline stages depend on these abstractions, not on a concrete backend.
//! Every row-level write is its own transaction.

use std::future::Future;

use crate::{
  game::{Game, NewGame, UpsertOutcome, ValidatedGame},
  profile::{StoredProfile, UserProfile},
};

/// A pending row whose stored columns could not be decoded.
#[derive(Debug)]
pub struct Undecodable<E> {
  pub game_id: String,
  pub error:   E,
}

/// One entry of a [`GameStore::pending_validation`] page.
pub type Pending<E> = Result<Game, Undecodable<E>>;

/// Storage for game rows.
pub trait GameStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert `game` if its id is unseen, update it in place if its content
  /// differs, or leave it untouched if every content column is identical.
  fn upsert_game(
    &self,
    game: NewGame,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  /// Retrieve a game by id. Returns `None` if not found.
  fn get_game<'a>(
    &'a self,
    game_id: &'a str,
  ) -> impl Future<Output = Result<Option<Game>, Self::Error>> + Send + 'a;

  /// Up to `limit` rows with `validated = false`, in ascending id order,
  /// starting strictly after `after` when given. A row that fails to decode
  /// keeps its place in the page as [`Undecodable`].
  fn pending_validation<'a>(
    &'a self,
    after: Option<&'a str>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Pending<Self::Error>>, Self::Error>> + Send + 'a;

  /// Write back the cleaned columns of a surviving row and mark it
  /// validated.
  fn mark_validated(
    &self,
    update: ValidatedGame,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a row. Returns `false` if it was already gone.
  fn delete_game<'a>(
    &'a self,
    game_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn count_games(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

/// Storage for player profiles and the `profile_updated` flag on games.
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Distinct, non-empty participant ids of games with
  /// `profile_updated = false`, in ascending order.
  fn unprofiled_players(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Whether a profile exists for `user_id` (case-insensitive).
  fn profile_exists<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert a profile unless one with the same id exists. Returns `false`
  /// when an existing profile was left untouched.
  fn insert_profile(
    &self,
    profile: UserProfile,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn get_profile<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<StoredProfile>, Self::Error>> + Send + 'a;

  /// Set `profile_updated = true` on every game where `player` is either
  /// participant. Returns the number of rows changed.
  fn mark_profile_updated<'a>(
    &'a self,
    player: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}
