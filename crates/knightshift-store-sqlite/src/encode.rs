//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`, times of day as `HH:MM:SS`, and flags as 0/1 integers.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use knightshift_core::{
  game::{Game, Ingested, StoredRating},
  profile::{GameCounts, PerfRatings, StoredProfile, UserProfile},
};
use rusqlite::{Row, types::Value};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate / NaiveTime
// ────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

/// Rating columns have INTEGER affinity, but SQLite keeps text it cannot
/// convert, so read them as dynamic values.
pub fn decode_rating(column: &'static str, v: Value) -> Result<Option<StoredRating>> {
  match v {
    Value::Null => Ok(None),
    Value::Integer(i) => Ok(Some(StoredRating::Known(i))),
    Value::Real(f) => Ok(Some(StoredRating::Raw(f.to_string()))),
    Value::Text(s) => Ok(Some(StoredRating::Raw(s))),
    Value::Blob(b) => Err(Error::Column {
      column,
      value: format!("<{} byte blob>", b.len()),
    }),
  }
}

// ─── Game rows ───────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` over `games`, in [`RawGame`] order.
pub const GAME_COLUMNS: &str = "game_id, event, site, played_on, white, black, \
   result, utc_date, utc_time, white_elo, black_elo, white_title, black_title, \
   variant, time_control, eco, opening, termination, moves, ingested_at, \
   validated, validated_at, validation_notes, profile_updated";

/// Raw values read directly from a `games` row.
pub struct RawGame {
  pub game_id:          String,
  pub event:            String,
  pub site:             String,
  pub played_on:        Option<String>,
  pub white:            String,
  pub black:            String,
  pub result:           String,
  pub utc_date:         Option<String>,
  pub utc_time:         Option<String>,
  pub white_elo:        Value,
  pub black_elo:        Value,
  pub white_title:      Option<String>,
  pub black_title:      Option<String>,
  pub variant:          String,
  pub time_control:     String,
  pub eco:              Option<String>,
  pub opening:          Option<String>,
  pub termination:      String,
  pub moves:            String,
  pub ingested_at:      String,
  pub validated:        bool,
  pub validated_at:     Option<String>,
  pub validation_notes: Option<String>,
  pub profile_updated:  bool,
}

impl RawGame {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      game_id:          row.get(0)?,
      event:            row.get(1)?,
      site:             row.get(2)?,
      played_on:        row.get(3)?,
      white:            row.get(4)?,
      black:            row.get(5)?,
      result:           row.get(6)?,
      utc_date:         row.get(7)?,
      utc_time:         row.get(8)?,
      white_elo:        row.get(9)?,
      black_elo:        row.get(10)?,
      white_title:      row.get(11)?,
      black_title:      row.get(12)?,
      variant:          row.get(13)?,
      time_control:     row.get(14)?,
      eco:              row.get(15)?,
      opening:          row.get(16)?,
      termination:      row.get(17)?,
      moves:            row.get(18)?,
      ingested_at:      row.get(19)?,
      validated:        row.get(20)?,
      validated_at:     row.get(21)?,
      validation_notes: row.get(22)?,
      profile_updated:  row.get(23)?,
    })
  }

  pub fn into_game(self) -> Result<Game> {
    Ok(Game {
      played_on:        self.played_on.as_deref().map(decode_date).transpose()?,
      utc_date:         self.utc_date.as_deref().map(decode_date).transpose()?,
      utc_time:         self.utc_time.as_deref().map(decode_time).transpose()?,
      white_elo:        decode_rating("white_elo", self.white_elo)?,
      black_elo:        decode_rating("black_elo", self.black_elo)?,
      ingested_at:      decode_dt(&self.ingested_at)?,
      validated_at:     self.validated_at.as_deref().map(decode_dt).transpose()?,
      game_id:          self.game_id,
      event:            self.event,
      site:             self.site,
      white:            self.white,
      black:            self.black,
      result:           self.result,
      white_title:      self.white_title,
      black_title:      self.black_title,
      variant:          self.variant,
      time_control:     self.time_control,
      eco:              self.eco,
      opening:          self.opening,
      termination:      self.termination,
      moves:            self.moves,
      validated:        self.validated,
      validation_notes: self.validation_notes,
      profile_updated:  self.profile_updated,
    })
  }
}

/// The as-ingested columns, selected after [`GAME_COLUMNS`].
pub const INGESTED_COLUMNS: &str = "ingested_white_elo, ingested_black_elo, \
   ingested_white_title, ingested_black_title, ingested_eco, \
   ingested_termination";

/// Read a row selected as `{GAME_COLUMNS}, {INGESTED_COLUMNS}`.
pub fn game_with_ingested(row: &Row<'_>) -> rusqlite::Result<(RawGame, Ingested)> {
  let ingested = Ingested {
    white_elo:   row.get(24)?,
    black_elo:   row.get(25)?,
    white_title: row.get(26)?,
    black_title: row.get(27)?,
    eco:         row.get(28)?,
    termination: row.get(29)?,
  };
  Ok((RawGame::from_row(row)?, ingested))
}

// ─── Profile rows ────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` over `profiles`, in
/// [`profile_from_row`] order.
pub const PROFILE_COLUMNS: &str = "user_id, username, title, url, real_name, \
   location, bio, country, rating_fide, rating_uscf, rating_bullet, \
   rating_blitz, rating_rapid, rating_classical, rating_correspondence, \
   rating_chess960, rating_ultra_bullet, created_at_ms, seen_at_ms, \
   playtime_total, playtime_tv, games_all, games_rated, games_win, games_loss, \
   games_draw, patron, streaming, fetched_at";

/// Read a `profiles` row; `fetched_at` stays raw until decoded by the caller.
pub fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<(UserProfile, String)> {
  let profile = UserProfile {
    user_id:        row.get(0)?,
    username:       row.get(1)?,
    title:          row.get(2)?,
    url:            row.get(3)?,
    real_name:      row.get(4)?,
    location:       row.get(5)?,
    bio:            row.get(6)?,
    country:        row.get(7)?,
    fide_rating:    row.get(8)?,
    uscf_rating:    row.get(9)?,
    ratings:        PerfRatings {
      bullet:         row.get(10)?,
      blitz:          row.get(11)?,
      rapid:          row.get(12)?,
      classical:      row.get(13)?,
      correspondence: row.get(14)?,
      chess960:       row.get(15)?,
      ultra_bullet:   row.get(16)?,
    },
    created_at_ms:  row.get(17)?,
    seen_at_ms:     row.get(18)?,
    playtime_total: row.get(19)?,
    playtime_tv:    row.get(20)?,
    counts:         GameCounts {
      all:   row.get(21)?,
      rated: row.get(22)?,
      win:   row.get(23)?,
      loss:  row.get(24)?,
      draw:  row.get(25)?,
    },
    patron:         row.get(26)?,
    streaming:      row.get(27)?,
  };
  Ok((profile, row.get(28)?))
}

pub fn into_stored_profile((profile, fetched_at): (UserProfile, String)) -> Result<StoredProfile> {
  Ok(StoredProfile {
    profile,
    fetched_at: decode_dt(&fetched_at)?,
  })
}
