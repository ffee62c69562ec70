//! Maps a parsed block onto the typed [`NewGame`] row.
//!
//! Coercion never fails: a header that does not parse becomes `None` and the
//! reason is appended to the diagnostics list.

use chrono::{NaiveDate, NaiveTime};
use knightshift_core::game::NewGame;

use crate::parse::{PgnGame, Tag};

/// A built row plus the coercion notes gathered along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Built {
  pub game:        NewGame,
  pub diagnostics: Vec<String>,
}

struct Coercer<'a> {
  pgn:         &'a PgnGame,
  diagnostics: Vec<String>,
}

impl<'a> Coercer<'a> {
  fn text(&self, tag: Tag) -> String {
    self.pgn.headers.get(tag).unwrap_or_default().trim().to_string()
  }

  /// Trimmed value, with empty and `?` mapped to `None`.
  fn opt_text(&self, tag: Tag) -> Option<String> {
    match self.pgn.headers.get(tag).map(str::trim) {
      None | Some("") | Some("?") => None,
      Some(v) => Some(v.to_string()),
    }
  }

  fn rating(&mut self, tag: Tag) -> Option<i32> {
    let pgn = self.pgn;
    let raw = pgn.headers.get(tag)?.trim();
    if raw.is_empty() {
      return None;
    }
    match raw.parse::<i32>() {
      Ok(v) => Some(v),
      Err(_) => {
        self.note(tag, raw);
        None
      }
    }
  }

  /// `YYYY.MM.DD`; placeholders such as `????.??.??` do not parse.
  fn date(&mut self, tag: Tag) -> Option<NaiveDate> {
    let pgn = self.pgn;
    let raw = pgn.headers.get(tag)?.trim();
    if raw.is_empty() {
      return None;
    }
    NaiveDate::parse_from_str(raw, "%Y.%m.%d")
      .map_err(|_| self.note(tag, raw))
      .ok()
  }

  fn time(&mut self, tag: Tag) -> Option<NaiveTime> {
    let pgn = self.pgn;
    let raw = pgn.headers.get(tag)?.trim();
    if raw.is_empty() {
      return None;
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
      .map_err(|_| self.note(tag, raw))
      .ok()
  }

  fn note(&mut self, tag: Tag, raw: &str) {
    self
      .diagnostics
      .push(format!("unparsable {}: {raw}", tag.name()));
  }
}

/// Derive the game id: last path segment of `Site` when it is
/// alphanumeric, else the `GameId` header, else empty. Placeholder sites
/// such as `?` therefore never share an id.
fn game_id(pgn: &PgnGame) -> String {
  let from_site = pgn
    .headers
    .get(Tag::Site)
    .map(|s| s.trim().trim_end_matches('/'))
    .and_then(|s| s.rsplit('/').next())
    .filter(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric()));

  from_site
    .or_else(|| pgn.headers.get(Tag::GameId).map(str::trim))
    .unwrap_or_default()
    .to_string()
}

/// Build a row and keep the coercion notes.
pub fn build_with_diagnostics(pgn: &PgnGame) -> Built {
  let mut c = Coercer {
    pgn,
    diagnostics: Vec::new(),
  };

  let game = NewGame {
    game_id:      game_id(pgn),
    event:        c.text(Tag::Event),
    site:         c.text(Tag::Site),
    played_on:    c.date(Tag::Date),
    white:        c.text(Tag::White),
    black:        c.text(Tag::Black),
    result:       c.text(Tag::Result),
    utc_date:     c.date(Tag::UtcDate),
    utc_time:     c.time(Tag::UtcTime),
    white_elo:    c.rating(Tag::WhiteElo),
    black_elo:    c.rating(Tag::BlackElo),
    white_title:  c.opt_text(Tag::WhiteTitle),
    black_title:  c.opt_text(Tag::BlackTitle),
    variant:      c.text(Tag::Variant),
    time_control: c.text(Tag::TimeControl),
    eco:          c.opt_text(Tag::Eco),
    opening:      c.opt_text(Tag::Opening),
    termination:  c.text(Tag::Termination),
    moves:        pgn.moves.trim().to_string(),
  };

  Built {
    game,
    diagnostics: c.diagnostics,
  }
}

/// Build a row, discarding the coercion notes.
pub fn build_game(pgn: &PgnGame) -> NewGame { build_with_diagnostics(pgn).game }
