//! [`SqliteStore`], the SQLite implementation of [`GameStore`] and
//! [`ProfileStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use knightshift_core::{
  game::{Game, NewGame, UpsertOutcome, ValidatedGame},
  profile::{StoredProfile, UserProfile},
  store::{GameStore, Pending, ProfileStore, Undecodable},
};

use crate::{
  Error, Result,
  encode::{
    GAME_COLUMNS, INGESTED_COLUMNS, PROFILE_COLUMNS, RawGame, encode_date, encode_dt,
    encode_time, game_with_ingested, into_stored_profile, profile_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A KnightShift store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The underlying connection, for maintenance queries outside the trait
  /// surface.
  pub fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }
}

/// Carry a decode failure out of a `call` closure.
fn other(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

// ─── GameStore impl ──────────────────────────────────────────────────────────

impl GameStore for SqliteStore {
  type Error = Error;

  async fn upsert_game(&self, game: NewGame) -> Result<UpsertOutcome> {
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing = tx
          .query_row(
            &format!("SELECT {GAME_COLUMNS}, {INGESTED_COLUMNS} FROM games WHERE game_id = ?1"),
            rusqlite::params![game.game_id],
            game_with_ingested,
          )
          .optional()?;
        let existing = existing
          .map(|(raw, ingested)| raw.into_game().map(|g| (g, ingested)))
          .transpose()
          .map_err(other)?;

        let played_on = game.played_on.map(encode_date);
        let utc_date = game.utc_date.map(encode_date);
        let utc_time = game.utc_time.map(encode_time);

        let outcome = match existing {
          Some((old, ingested)) if old.same_content(&ingested, &game) => {
            UpsertOutcome::SkippedIdentical
          }

          Some((old, _)) => {
            let same_players = old.white == game.white && old.black == game.black;
            tx.execute(
              "UPDATE games SET
                 event = ?2, site = ?3, played_on = ?4, white = ?5, black = ?6,
                 result = ?7, utc_date = ?8, utc_time = ?9, white_elo = ?10,
                 black_elo = ?11, white_title = ?12, black_title = ?13,
                 variant = ?14, time_control = ?15, eco = ?16, opening = ?17,
                 termination = ?18, moves = ?19, ingested_at = ?20,
                 ingested_white_elo = ?10, ingested_black_elo = ?11,
                 ingested_white_title = ?12, ingested_black_title = ?13,
                 ingested_eco = ?16, ingested_termination = ?18,
                 validated = 0, validated_at = NULL, validation_notes = NULL,
                 profile_updated = profile_updated AND ?21
               WHERE game_id = ?1",
              rusqlite::params![
                game.game_id,
                game.event,
                game.site,
                played_on,
                game.white,
                game.black,
                game.result,
                utc_date,
                utc_time,
                game.white_elo,
                game.black_elo,
                game.white_title,
                game.black_title,
                game.variant,
                game.time_control,
                game.eco,
                game.opening,
                game.termination,
                game.moves,
                now,
                same_players,
              ],
            )?;
            UpsertOutcome::Updated
          }

          None => {
            tx.execute(
              "INSERT INTO games (
                 game_id, event, site, played_on, white, black, result,
                 utc_date, utc_time, white_elo, black_elo, white_title,
                 black_title, variant, time_control, eco, opening,
                 termination, moves, ingested_at, ingested_white_elo,
                 ingested_black_elo, ingested_white_title, ingested_black_title,
                 ingested_eco, ingested_termination
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                         ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
                         ?10, ?11, ?12, ?13, ?16, ?18)",
              rusqlite::params![
                game.game_id,
                game.event,
                game.site,
                played_on,
                game.white,
                game.black,
                game.result,
                utc_date,
                utc_time,
                game.white_elo,
                game.black_elo,
                game.white_title,
                game.black_title,
                game.variant,
                game.time_control,
                game.eco,
                game.opening,
                game.termination,
                game.moves,
                now,
              ],
            )?;
            UpsertOutcome::Inserted
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    Ok(outcome)
  }

  async fn get_game<'a>(&'a self, game_id: &'a str) -> Result<Option<Game>> {
    let id = game_id.to_owned();

    let raw: Option<RawGame> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {GAME_COLUMNS} FROM games WHERE game_id = ?1"),
            rusqlite::params![id],
            RawGame::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawGame::into_game).transpose()
  }

  async fn pending_validation<'a>(
    &'a self,
    after: Option<&'a str>,
    limit: usize,
  ) -> Result<Vec<Pending<Error>>> {
    let after = after.map(str::to_owned);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawGame> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GAME_COLUMNS} FROM games
           WHERE validated = 0 AND (?1 IS NULL OR game_id > ?1)
           ORDER BY game_id
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![after, limit], RawGame::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(|raw| {
          let game_id = raw.game_id.clone();
          raw
            .into_game()
            .map_err(|error| Undecodable { game_id, error })
        })
        .collect(),
    )
  }

  async fn mark_validated(&self, update: ValidatedGame) -> Result<()> {
    let at = encode_dt(update.validated_at);
    let id = update.game_id.clone();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE games SET
             white_elo = ?2, black_elo = ?3, white_title = ?4,
             black_title = ?5, eco = ?6, termination = ?7,
             validated = 1, validated_at = ?8, validation_notes = ?9
           WHERE game_id = ?1",
          rusqlite::params![
            update.game_id,
            update.white_elo,
            update.black_elo,
            update.white_title,
            update.black_title,
            update.eco,
            update.termination,
            at,
            update.notes,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::GameNotFound(id));
    }
    Ok(())
  }

  async fn delete_game<'a>(&'a self, game_id: &'a str) -> Result<bool> {
    let id = game_id.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM games WHERE game_id = ?1", rusqlite::params![id])?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn count_games(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM games", [], |r| r.get(0))?))
      .await?;
    Ok(n.max(0) as u64)
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  async fn unprofiled_players(&self) -> Result<Vec<String>> {
    let players = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT white FROM games WHERE profile_updated = 0 AND white <> ''
           UNION
           SELECT black FROM games WHERE profile_updated = 0 AND black <> ''
           ORDER BY 1",
        )?;
        let rows = stmt
          .query_map([], |r| r.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(players)
  }

  async fn profile_exists<'a>(&'a self, user_id: &'a str) -> Result<bool> {
    let id = user_id.to_owned();

    let exists = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM profiles WHERE user_id = ?1",
            rusqlite::params![id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;
    Ok(exists)
  }

  async fn insert_profile(&self, profile: UserProfile) -> Result<bool> {
    let fetched_at = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        let p = &profile;
        Ok(conn.execute(
          &format!(
            "INSERT INTO profiles ({PROFILE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24,
                     ?25, ?26, ?27, ?28, ?29)
             ON CONFLICT(user_id) DO NOTHING"
          ),
          rusqlite::params![
            p.user_id,
            p.username,
            p.title,
            p.url,
            p.real_name,
            p.location,
            p.bio,
            p.country,
            p.fide_rating,
            p.uscf_rating,
            p.ratings.bullet,
            p.ratings.blitz,
            p.ratings.rapid,
            p.ratings.classical,
            p.ratings.correspondence,
            p.ratings.chess960,
            p.ratings.ultra_bullet,
            p.created_at_ms,
            p.seen_at_ms,
            p.playtime_total,
            p.playtime_tv,
            p.counts.all,
            p.counts.rated,
            p.counts.win,
            p.counts.loss,
            p.counts.draw,
            p.patron,
            p.streaming,
            fetched_at,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn get_profile<'a>(&'a self, user_id: &'a str) -> Result<Option<StoredProfile>> {
    let id = user_id.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1"),
            rusqlite::params![id],
            profile_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(into_stored_profile).transpose()
  }

  async fn mark_profile_updated<'a>(&'a self, player: &'a str) -> Result<u64> {
    let player = player.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE games SET profile_updated = 1
           WHERE (white = ?1 OR black = ?1) AND profile_updated = 0",
          rusqlite::params![player],
        )?)
      })
      .await?;

    Ok(changed as u64)
  }
}
