//! A store wrapper that fails every write touching one id.

use knightshift_core::{
  game::{Game, NewGame, UpsertOutcome, ValidatedGame},
  profile::{StoredProfile, UserProfile},
  store::{GameStore, Pending, ProfileStore, Undecodable},
};
use knightshift_store_sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum FlakyError {
  #[error("write refused for {0}")]
  Refused(String),

  #[error(transparent)]
  Store(#[from] knightshift_store_sqlite::Error),
}

type Result<T> = std::result::Result<T, FlakyError>;

/// Delegates to `inner`, except that writes for the game id or player named
/// `fail_on` return [`FlakyError::Refused`].
#[derive(Clone)]
pub struct FlakyStore {
  pub inner:   SqliteStore,
  pub fail_on: &'static str,
}

impl FlakyStore {
  fn guard(&self, id: &str) -> Result<()> {
    if id == self.fail_on {
      return Err(FlakyError::Refused(id.to_string()));
    }
    Ok(())
  }
}

impl GameStore for FlakyStore {
  type Error = FlakyError;

  async fn upsert_game(&self, game: NewGame) -> Result<UpsertOutcome> {
    self.guard(&game.game_id)?;
    Ok(self.inner.upsert_game(game).await?)
  }

  async fn get_game<'a>(&'a self, game_id: &'a str) -> Result<Option<Game>> {
    Ok(self.inner.get_game(game_id).await?)
  }

  async fn pending_validation<'a>(
    &'a self,
    after: Option<&'a str>,
    limit: usize,
  ) -> Result<Vec<Pending<FlakyError>>> {
    let page = self.inner.pending_validation(after, limit).await?;
    Ok(
      page
        .into_iter()
        .map(|row| {
          row.map_err(|bad| Undecodable {
            game_id: bad.game_id,
            error:   bad.error.into(),
          })
        })
        .collect(),
    )
  }

  async fn mark_validated(&self, update: ValidatedGame) -> Result<()> {
    self.guard(&update.game_id)?;
    Ok(self.inner.mark_validated(update).await?)
  }

  async fn delete_game<'a>(&'a self, game_id: &'a str) -> Result<bool> {
    self.guard(game_id)?;
    Ok(self.inner.delete_game(game_id).await?)
  }

  async fn count_games(&self) -> Result<u64> { Ok(self.inner.count_games().await?) }
}

impl ProfileStore for FlakyStore {
  type Error = FlakyError;

  async fn unprofiled_players(&self) -> Result<Vec<String>> {
    Ok(self.inner.unprofiled_players().await?)
  }

  async fn profile_exists<'a>(&'a self, user_id: &'a str) -> Result<bool> {
    Ok(self.inner.profile_exists(user_id).await?)
  }

  async fn insert_profile(&self, profile: UserProfile) -> Result<bool> {
    Ok(self.inner.insert_profile(profile).await?)
  }

  async fn get_profile<'a>(&'a self, user_id: &'a str) -> Result<Option<StoredProfile>> {
    Ok(self.inner.get_profile(user_id).await?)
  }

  async fn mark_profile_updated<'a>(&'a self, player: &'a str) -> Result<u64> {
    self.guard(player)?;
    Ok(self.inner.mark_profile_updated(player).await?)
  }
}
