//! Game records: the rows of the `games` table.
//!
//! A game enters the store as a [`NewGame`] built from a PGN block. Once
//! persisted it is read back as a [`Game`], which adds the lifecycle columns
//! written by the validator and the enricher.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Result ──────────────────────────────────────────────────────────────────

/// The three canonical outcomes of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
  #[serde(rename = "1-0")]
  WhiteWins,
  #[serde(rename = "0-1")]
  BlackWins,
  #[serde(rename = "1/2-1/2")]
  Draw,
}

impl GameResult {
  pub const ALL: [GameResult; 3] = [Self::WhiteWins, Self::BlackWins, Self::Draw];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::WhiteWins => "1-0",
      Self::BlackWins => "0-1",
      Self::Draw => "1/2-1/2",
    }
  }
}

impl fmt::Display for GameResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for GameResult {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|r| r.as_str() == s)
      .ok_or_else(|| s.to_string())
  }
}

// ─── Termination ─────────────────────────────────────────────────────────────

/// Canonical termination reasons kept after cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Termination {
  Normal,
  TimeForfeit,
  Resigned,
  Abandoned,
}

impl Termination {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Normal => "NORMAL",
      Self::TimeForfeit => "TIME_FORFEIT",
      Self::Resigned => "RESIGNED",
      Self::Abandoned => "ABANDONED",
    }
  }

  /// Map a free-form termination header onto the canonical set.
  ///
  /// Matching is on the trimmed, upper-cased input. Anything unrecognised
  /// (including `Unterminated`) collapses to [`Termination::Normal`].
  pub fn normalize(raw: &str) -> Self {
    match raw.trim().to_uppercase().as_str() {
      "TIME_FORFEIT" | "TIME FORFEIT" => Self::TimeForfeit,
      "RESIGNED" => Self::Resigned,
      "ABANDONED" => Self::Abandoned,
      _ => Self::Normal,
    }
  }
}

impl fmt::Display for Termination {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

/// A rating column as read back from storage.
///
/// Rows written through the builder only ever hold [`StoredRating::Known`].
/// `Raw` covers rows whose column holds text that is not an integer, which
/// the validator nulls out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredRating {
  Known(i64),
  Raw(String),
}

impl StoredRating {
  /// The integer value, if the column holds one (directly or as digits).
  pub fn as_int(&self) -> Option<i64> {
    match self {
      Self::Known(v) => Some(*v),
      Self::Raw(s) => s.trim().parse().ok(),
    }
  }
}

// ─── NewGame ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::GameStore::upsert_game`]: every content column
/// derived from a PGN block. Lifecycle columns are owned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGame {
  pub game_id:      String,
  pub event:        String,
  pub site:         String,
  pub played_on:    Option<NaiveDate>,
  pub white:        String,
  pub black:        String,
  /// Raw `Result` header; canonical values are checked by the validator.
  pub result:       String,
  pub utc_date:     Option<NaiveDate>,
  pub utc_time:     Option<NaiveTime>,
  pub white_elo:    Option<i32>,
  pub black_elo:    Option<i32>,
  pub white_title:  Option<String>,
  pub black_title:  Option<String>,
  pub variant:      String,
  pub time_control: String,
  pub eco:          Option<String>,
  pub opening:      Option<String>,
  pub termination:  String,
  pub moves:        String,
}

// ─── Game ────────────────────────────────────────────────────────────────────

/// A persisted game row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
  pub game_id:          String,
  pub event:            String,
  pub site:             String,
  pub played_on:        Option<NaiveDate>,
  pub white:            String,
  pub black:            String,
  pub result:           String,
  pub utc_date:         Option<NaiveDate>,
  pub utc_time:         Option<NaiveTime>,
  pub white_elo:        Option<StoredRating>,
  pub black_elo:        Option<StoredRating>,
  pub white_title:      Option<String>,
  pub black_title:      Option<String>,
  pub variant:          String,
  pub time_control:     String,
  pub eco:              Option<String>,
  pub opening:          Option<String>,
  pub termination:      String,
  pub moves:            String,
  pub ingested_at:      DateTime<Utc>,
  pub validated:        bool,
  pub validated_at:     Option<DateTime<Utc>>,
  pub validation_notes: Option<String>,
  pub profile_updated:  bool,
}

impl Game {
  /// Field-by-field comparison of every content column against `new`.
  ///
  /// The columns the validator rewrites are compared as they were ingested,
  /// so cleaning a row does not make an unchanged re-ingest look different.
  /// A text rating left in storage never compares identical.
  pub fn same_content(&self, ingested: &Ingested, new: &NewGame) -> bool {
    let raw_rating = |r: &Option<StoredRating>| matches!(r, Some(StoredRating::Raw(_)));

    !raw_rating(&self.white_elo)
      && !raw_rating(&self.black_elo)
      && *ingested == Ingested::from(new)
      && self.game_id == new.game_id
      && self.event == new.event
      && self.site == new.site
      && self.played_on == new.played_on
      && self.white == new.white
      && self.black == new.black
      && self.result == new.result
      && self.utc_date == new.utc_date
      && self.utc_time == new.utc_time
      && self.variant == new.variant
      && self.time_control == new.time_control
      && self.opening == new.opening
      && self.moves == new.moves
  }
}

/// The values of the validator-owned columns as last written by an upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ingested {
  pub white_elo:   Option<i32>,
  pub black_elo:   Option<i32>,
  pub white_title: Option<String>,
  pub black_title: Option<String>,
  pub eco:         Option<String>,
  pub termination: String,
}

impl From<&NewGame> for Ingested {
  fn from(g: &NewGame) -> Self {
    Self {
      white_elo:   g.white_elo,
      black_elo:   g.black_elo,
      white_title: g.white_title.clone(),
      black_title: g.black_title.clone(),
      eco:         g.eco.clone(),
      termination: g.termination.clone(),
    }
  }
}

// ─── Validation write-back ───────────────────────────────────────────────────

/// The cleaned columns the validator writes back for a surviving row, along
/// with the `validated` flag, timestamp and notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedGame {
  pub game_id:      String,
  pub white_elo:    Option<i32>,
  pub black_elo:    Option<i32>,
  pub white_title:  Option<String>,
  pub black_title:  Option<String>,
  pub eco:          Option<String>,
  pub termination:  String,
  pub validated_at: DateTime<Utc>,
  /// `None` when no rule produced a note.
  pub notes:        Option<String>,
}

/// Outcome of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  Inserted,
  Updated,
  SkippedIdentical,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn result_parses_only_canonical_literals() {
    assert_eq!("1-0".parse::<GameResult>(), Ok(GameResult::WhiteWins));
    assert_eq!("1/2-1/2".parse::<GameResult>(), Ok(GameResult::Draw));
    assert_eq!("*".parse::<GameResult>(), Err("*".to_string()));
    assert!("1-1".parse::<GameResult>().is_err());
  }

  #[test]
  fn termination_normalizes_lichess_spellings() {
    assert_eq!(Termination::normalize("Time forfeit"), Termination::TimeForfeit);
    assert_eq!(Termination::normalize("Normal"), Termination::Normal);
    assert_eq!(Termination::normalize("Unterminated"), Termination::Normal);
    assert_eq!(Termination::normalize(" abandoned "), Termination::Abandoned);
  }

  #[test]
  fn stored_rating_reads_digit_text() {
    assert_eq!(StoredRating::Raw(" 1500".into()).as_int(), Some(1500));
    assert_eq!(StoredRating::Raw("abc".into()).as_int(), None);
  }

  fn stored(new: &NewGame) -> Game {
    Game {
      game_id:          new.game_id.clone(),
      event:            new.event.clone(),
      site:             new.site.clone(),
      played_on:        new.played_on,
      white:            new.white.clone(),
      black:            new.black.clone(),
      result:           new.result.clone(),
      utc_date:         new.utc_date,
      utc_time:         new.utc_time,
      white_elo:        new.white_elo.map(|v| StoredRating::Known(v.into())),
      black_elo:        new.black_elo.map(|v| StoredRating::Known(v.into())),
      white_title:      new.white_title.clone(),
      black_title:      new.black_title.clone(),
      variant:          new.variant.clone(),
      time_control:     new.time_control.clone(),
      eco:              new.eco.clone(),
      opening:          new.opening.clone(),
      termination:      new.termination.clone(),
      moves:            new.moves.clone(),
      ingested_at:      Utc::now(),
      validated:        false,
      validated_at:     None,
      validation_notes: None,
      profile_updated:  false,
    }
  }

  fn built() -> NewGame {
    NewGame {
      game_id: "g1".into(),
      white_elo: Some(1500),
      white_title: Some("gm".into()),
      eco: Some("?".into()),
      termination: "Normal".into(),
      moves: "1. e4".into(),
      ..NewGame::default()
    }
  }

  #[test]
  fn raw_rating_never_matches_built_row() {
    let new = built();
    let mut game = stored(&new);
    let ingested = Ingested::from(&new);
    assert!(game.same_content(&ingested, &new));
    game.white_elo = Some(StoredRating::Raw("1500".into()));
    assert!(!game.same_content(&ingested, &new));
  }

  #[test]
  fn cleaned_columns_compare_as_ingested() {
    let new = built();
    let ingested = Ingested::from(&new);
    let mut game = stored(&new);
    game.white_title = Some("GM".into());
    game.eco = None;
    game.termination = "NORMAL".into();
    game.validated = true;
    assert!(game.same_content(&ingested, &new));

    let mut changed = new.clone();
    changed.termination = "Time forfeit".into();
    assert!(!game.same_content(&ingested, &changed));
  }
}
