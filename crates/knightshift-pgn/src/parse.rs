//! PGN block parser.
//!
//! Pipeline:
//!   lines (BufRead or network chunks)
//!     └─ BlockReader::feed_line()     → header groups + move text
//!          └─ BlockReader::take_block() → PgnGame (or a skip reason)
//!
//! A block is one or more `[Key "Value"]` header lines followed by move
//! text. Move text may span several lines; the block is complete at the
//! first blank line, the next header line, or end of input. Headers
//! followed by a blank line and then more headers form a block without
//! move text, which is skipped on its own.

use std::io::BufRead;

use crate::error::{Error, Result};

// ─── Header tags ─────────────────────────────────────────────────────────────

/// The header keys the builder understands. Anything else is kept verbatim
/// in [`Headers::unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
  Event,
  Site,
  Date,
  Round,
  White,
  Black,
  Result,
  UtcDate,
  UtcTime,
  WhiteElo,
  BlackElo,
  WhiteRatingDiff,
  BlackRatingDiff,
  WhiteTitle,
  BlackTitle,
  Variant,
  TimeControl,
  Eco,
  Opening,
  Termination,
  GameId,
  Annotator,
  Fen,
  SetUp,
}

impl Tag {
  pub const ALL: [Tag; 24] = [
    Self::Event,
    Self::Site,
    Self::Date,
    Self::Round,
    Self::White,
    Self::Black,
    Self::Result,
    Self::UtcDate,
    Self::UtcTime,
    Self::WhiteElo,
    Self::BlackElo,
    Self::WhiteRatingDiff,
    Self::BlackRatingDiff,
    Self::WhiteTitle,
    Self::BlackTitle,
    Self::Variant,
    Self::TimeControl,
    Self::Eco,
    Self::Opening,
    Self::Termination,
    Self::GameId,
    Self::Annotator,
    Self::Fen,
    Self::SetUp,
  ];

  /// Headers a block must carry to be accepted.
  pub const REQUIRED: [Tag; 3] = [Self::White, Self::Black, Self::Result];

  /// Canonical spelling as written in PGN exports.
  pub fn name(&self) -> &'static str {
    match self {
      Self::Event => "Event",
      Self::Site => "Site",
      Self::Date => "Date",
      Self::Round => "Round",
      Self::White => "White",
      Self::Black => "Black",
      Self::Result => "Result",
      Self::UtcDate => "UTCDate",
      Self::UtcTime => "UTCTime",
      Self::WhiteElo => "WhiteElo",
      Self::BlackElo => "BlackElo",
      Self::WhiteRatingDiff => "WhiteRatingDiff",
      Self::BlackRatingDiff => "BlackRatingDiff",
      Self::WhiteTitle => "WhiteTitle",
      Self::BlackTitle => "BlackTitle",
      Self::Variant => "Variant",
      Self::TimeControl => "TimeControl",
      Self::Eco => "ECO",
      Self::Opening => "Opening",
      Self::Termination => "Termination",
      Self::GameId => "GameId",
      Self::Annotator => "Annotator",
      Self::Fen => "FEN",
      Self::SetUp => "SetUp",
    }
  }

  /// Case-insensitive lookup of a header key.
  pub fn from_name(key: &str) -> Option<Tag> {
    Self::ALL
      .into_iter()
      .find(|t| t.name().eq_ignore_ascii_case(key))
  }
}

// ─── Parsed block ────────────────────────────────────────────────────────────

/// Header values of one block. A repeated key keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
  known:   Vec<(Tag, String)>,
  unknown: Vec<(String, String)>,
}

impl Headers {
  pub fn get(&self, tag: Tag) -> Option<&str> {
    self
      .known
      .iter()
      .find(|(t, _)| *t == tag)
      .map(|(_, v)| v.as_str())
  }

  /// Headers outside the known set, with their original key spelling, in
  /// input order.
  pub fn unknown(&self) -> &[(String, String)] { &self.unknown }

  pub fn insert(&mut self, key: &str, value: String) {
    match Tag::from_name(key) {
      Some(tag) => {
        if let Some(slot) = self.known.iter_mut().find(|(t, _)| *t == tag) {
          slot.1 = value;
        } else {
          self.known.push((tag, value));
        }
      }
      None => {
        if let Some(slot) = self.unknown.iter_mut().find(|(k, _)| k == key) {
          slot.1 = value;
        } else {
          self.unknown.push((key.to_string(), value));
        }
      }
    }
  }
}

/// One self-contained notation block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgnGame {
  pub headers: Headers,
  /// Move text with line breaks collapsed to single spaces.
  pub moves:   String,
}

// ─── Header-line scanner ─────────────────────────────────────────────────────

/// Read a double-quoted value (opening quote already consumed), honouring
/// `\"` and `\\`. Returns the value and the text after the closing quote.
fn take_quoted(s: &str) -> Option<(String, &str)> {
  let mut value = String::new();
  let mut chars = s.char_indices();
  while let Some((i, c)) = chars.next() {
    match c {
      '\\' => match chars.next() {
        Some((_, e @ ('"' | '\\'))) => value.push(e),
        Some((_, other)) => {
          value.push('\\');
          value.push(other);
        }
        None => return None,
      },
      '"' => return Some((value, &s[i + 1..])),
      _ => value.push(c),
    }
  }
  None
}

/// Split a line into its `[Key "Value"]` groups and any trailing move text.
fn parse_header_groups(line: &str) -> Result<(Vec<(String, String)>, &str)> {
  let malformed = || Error::MalformedHeader(line.to_string());

  let mut pairs = Vec::new();
  let mut rest = line.trim_start();
  while let Some(inner) = rest.strip_prefix('[') {
    let key_len = inner
      .find(|c: char| c.is_whitespace() || c == ']' || c == '"')
      .unwrap_or(inner.len());
    if key_len == 0 {
      return Err(malformed());
    }
    let key = &inner[..key_len];
    let quoted = inner[key_len..]
      .trim_start()
      .strip_prefix('"')
      .ok_or_else(malformed)?;
    let (value, after_value) = take_quoted(quoted).ok_or_else(malformed)?;
    let after_close = after_value
      .trim_start()
      .strip_prefix(']')
      .ok_or_else(malformed)?;
    pairs.push((key.to_string(), value));
    rest = after_close.trim_start();
  }
  Ok((pairs, rest.trim_end()))
}

// ─── Block state machine ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
  #[default]
  Idle,
  Headers,
  Moves,
}

/// Incremental block assembler. Feed it lines in order; it yields a block
/// each time one completes. Whatever it holds between calls is the partial
/// block, so the caller may stop feeding at any point and resume later.
#[derive(Debug, Default)]
pub struct BlockReader {
  state:   State,
  headers: Headers,
  moves:   Vec<String>,
  /// First header error seen in the current block; the block is skipped
  /// when it completes.
  error:   Option<Error>,
  /// A blank line followed the headers of the current block.
  gap:     bool,
}

impl BlockReader {
  pub fn new() -> Self { Self::default() }

  /// Feed one line (with or without its line terminator).
  pub fn feed_line(&mut self, raw: &str) -> Option<Result<PgnGame>> {
    let line = raw.trim_end_matches(['\n', '\r']).trim();

    if line.is_empty() {
      return match self.state {
        State::Moves => Some(self.take_block()),
        State::Headers => {
          self.gap = true;
          None
        }
        State::Idle => None,
      };
    }

    if line.starts_with('[') {
      let completed = match self.state {
        State::Moves => Some(self.take_block()),
        State::Headers if self.gap => Some(Err(self.abandon())),
        State::Headers | State::Idle => None,
      };
      self.begin_header_line(line);
      return completed;
    }

    // Move text; a block with no headers at all fails the required check.
    self.moves.push(line.to_string());
    self.state = State::Moves;
    None
  }

  /// Flush at end of input.
  pub fn finish(&mut self) -> Option<Result<PgnGame>> {
    match self.state {
      State::Idle => None,
      State::Moves => Some(self.take_block()),
      State::Headers => Some(Err(self.abandon())),
    }
  }

  /// Drop a block that ended without move text.
  fn abandon(&mut self) -> Error {
    let error = self.error.take().unwrap_or(Error::MissingMoves);
    self.reset();
    error
  }

  fn begin_header_line(&mut self, line: &str) {
    self.state = State::Headers;
    match parse_header_groups(line) {
      Ok((pairs, trailing)) => {
        for (key, value) in pairs {
          self.headers.insert(&key, value);
        }
        if !trailing.is_empty() {
          self.moves.push(trailing.to_string());
          self.state = State::Moves;
        }
      }
      Err(e) => {
        if self.error.is_none() {
          self.error = Some(e);
        }
      }
    }
  }

  fn reset(&mut self) {
    self.state = State::Idle;
    self.headers = Headers::default();
    self.moves.clear();
    self.error = None;
    self.gap = false;
  }

  fn take_block(&mut self) -> Result<PgnGame> {
    let headers = std::mem::take(&mut self.headers);
    let moves = self.moves.join(" ");
    let error = self.error.take();
    self.reset();

    if let Some(e) = error {
      return Err(e);
    }
    if let Some(missing) = Tag::REQUIRED.iter().find(|t| headers.get(**t).is_none()) {
      return Err(Error::MissingHeader(missing.name()));
    }
    if moves.is_empty() {
      return Err(Error::MissingMoves);
    }
    Ok(PgnGame { headers, moves })
  }
}

// ─── Lazy iterator ───────────────────────────────────────────────────────────

/// Lazy sequence of blocks over a reader; one line is buffered at a time.
/// A malformed block yields `Err` in its position and iteration continues.
/// An I/O error is yielded once and ends the sequence.
pub struct Games<R> {
  reader: R,
  block:  BlockReader,
  line:   String,
  done:   bool,
}

impl<R: BufRead> Games<R> {
  pub fn new(reader: R) -> Self {
    Self {
      reader,
      block: BlockReader::new(),
      line: String::new(),
      done: false,
    }
  }
}

impl<R: BufRead> Iterator for Games<R> {
  type Item = Result<PgnGame>;

  fn next(&mut self) -> Option<Self::Item> {
    while !self.done {
      self.line.clear();
      match self.reader.read_line(&mut self.line) {
        Ok(0) => {
          self.done = true;
          return self.block.finish();
        }
        Ok(_) => {
          if let Some(item) = self.block.feed_line(&self.line) {
            return Some(item);
          }
        }
        Err(e) => {
          self.done = true;
          return Some(Err(Error::Io(e)));
        }
      }
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse_all(input: &str) -> Vec<Result<PgnGame>> {
    Games::new(input.as_bytes()).collect()
  }

  const LICHESS_TV: &str = "[Event \"Rated blitz game\"]\n\
[Site \"https://lichess.org/abcd1234\"]\n\
[White \"Alice\"]\n\
[Black \"Bob\"]\n\
[Result \"1-0\"]\n\
[WhiteElo \"2501\"]\n\
[ECO \"B01\"]\n\
[Opening \"Scandinavian Defense\"]\n\
\n\
1. e4 d5 2. exd5 Qxd5 1-0\n\
\n\
\n\
[Event \"Rated bullet game\"]\n\
[Site \"https://lichess.org/efgh5678\"]\n\
[White \"Carol\"]\n\
[Black \"Dave\"]\n\
[Result \"0-1\"]\n\
\n\
1. d4 Nf6 0-1\n";

  #[test]
  fn parses_consecutive_blocks() {
    let games = parse_all(LICHESS_TV);
    assert_eq!(games.len(), 2);
    let first = games[0].as_ref().unwrap();
    assert_eq!(first.headers.get(Tag::Site), Some("https://lichess.org/abcd1234"));
    assert_eq!(first.headers.get(Tag::WhiteElo), Some("2501"));
    assert_eq!(first.moves, "1. e4 d5 2. exd5 Qxd5 1-0");
    let second = games[1].as_ref().unwrap();
    assert_eq!(second.headers.get(Tag::White), Some("Carol"));
    assert_eq!(second.moves, "1. d4 Nf6 0-1");
  }

  #[test]
  fn headers_and_moves_on_one_line() {
    let games = parse_all("[White \"a\"][Black \"b\"][Result \"1-0\"] 1. e4 e5");
    assert_eq!(games.len(), 1);
    let game = games[0].as_ref().unwrap();
    assert_eq!(game.headers.get(Tag::White), Some("a"));
    assert_eq!(game.headers.get(Tag::Black), Some("b"));
    assert_eq!(game.headers.get(Tag::Result), Some("1-0"));
    assert_eq!(game.moves, "1. e4 e5");
  }

  #[test]
  fn key_matching_is_case_insensitive() {
    let games = parse_all("[white \"a\"]\n[BLACK \"b\"]\n[result \"0-1\"]\n\n1. e4\n");
    let game = games[0].as_ref().unwrap();
    assert_eq!(game.headers.get(Tag::White), Some("a"));
    assert_eq!(game.headers.get(Tag::Black), Some("b"));
  }

  #[test]
  fn unknown_headers_kept_verbatim() {
    let games = parse_all(
      "[White \"a\"]\n[Black \"b\"]\n[Result \"1-0\"]\n[WhiteFideId \"123\"]\n\n1. e4\n",
    );
    let game = games[0].as_ref().unwrap();
    assert_eq!(
      game.headers.unknown(),
      &[("WhiteFideId".to_string(), "123".to_string())]
    );
  }

  #[test]
  fn multi_line_move_text_joined() {
    let games = parse_all(
      "[White \"a\"]\n[Black \"b\"]\n[Result \"1/2-1/2\"]\n\n1. e4 e5\n2. Nf3 Nc6\n3. Bb5 1/2-1/2\n",
    );
    assert_eq!(
      games[0].as_ref().unwrap().moves,
      "1. e4 e5 2. Nf3 Nc6 3. Bb5 1/2-1/2"
    );
  }

  #[test]
  fn escaped_quotes_in_values() {
    let games = parse_all(
      "[Event \"The \\\"Big\\\" One\"]\n[White \"a\"]\n[Black \"b\"]\n[Result \"1-0\"]\n\n1. e4\n",
    );
    assert_eq!(
      games[0].as_ref().unwrap().headers.get(Tag::Event),
      Some("The \"Big\" One")
    );
  }

  #[test]
  fn missing_required_header_skipped_and_parsing_continues() {
    let input = "[White \"a\"]\n[Result \"1-0\"]\n\n1. e4\n\n\
                 [White \"c\"]\n[Black \"d\"]\n[Result \"0-1\"]\n\n1. d4\n";
    let games = parse_all(input);
    assert_eq!(games.len(), 2);
    assert!(matches!(games[0], Err(Error::MissingHeader("Black"))));
    assert_eq!(games[1].as_ref().unwrap().headers.get(Tag::White), Some("c"));
  }

  #[test]
  fn malformed_header_skips_whole_block() {
    let input = "[White a]\n[Black \"b\"]\n[Result \"1-0\"]\n\n1. e4\n\n\
                 [White \"c\"]\n[Black \"d\"]\n[Result \"0-1\"]\n\n1. d4\n";
    let games = parse_all(input);
    assert!(matches!(games[0], Err(Error::MalformedHeader(_))));
    assert!(games[1].is_ok());
  }

  #[test]
  fn headers_without_moves_at_eof() {
    let games = parse_all("[White \"a\"]\n[Black \"b\"]\n[Result \"1-0\"]\n");
    assert_eq!(games.len(), 1);
    assert!(matches!(games[0], Err(Error::MissingMoves)));
  }

  #[test]
  fn header_only_block_does_not_leak_into_the_next() {
    let input = "[Site \"https://lichess.org/first1\"]\n[White \"a\"]\n[Black \"b\"]\n\
                 [Result \"1-0\"]\n\n\
                 [White \"c\"]\n[Black \"d\"]\n[Result \"0-1\"]\n\n1. d4\n";
    let games = parse_all(input);
    assert_eq!(games.len(), 2);
    assert!(matches!(games[0], Err(Error::MissingMoves)));
    let second = games[1].as_ref().unwrap();
    assert_eq!(second.headers.get(Tag::Site), None);
    assert_eq!(second.headers.get(Tag::White), Some("c"));
    assert_eq!(second.moves, "1. d4");
  }

  #[test]
  fn header_only_block_keeps_its_header_error() {
    let input = "[White a]\n[Black \"b\"]\n\n[White \"c\"]\n[Black \"d\"]\n[Result \"0-1\"]\n1. d4\n";
    let games = parse_all(input);
    assert_eq!(games.len(), 2);
    assert!(matches!(games[0], Err(Error::MalformedHeader(_))));
    assert!(games[1].is_ok());
  }

  #[test]
  fn next_header_line_ends_move_text() {
    let input = "[White \"a\"]\n[Black \"b\"]\n[Result \"1-0\"]\n1. e4\n\
                 [White \"c\"]\n[Black \"d\"]\n[Result \"0-1\"]\n1. d4\n";
    let games = parse_all(input);
    assert_eq!(games.len(), 2);
    assert_eq!(games[0].as_ref().unwrap().moves, "1. e4");
    assert_eq!(games[1].as_ref().unwrap().moves, "1. d4");
  }

  #[test]
  fn crlf_line_endings() {
    let games = parse_all("[White \"a\"]\r\n[Black \"b\"]\r\n[Result \"1-0\"]\r\n\r\n1. e4\r\n");
    assert_eq!(games[0].as_ref().unwrap().moves, "1. e4");
  }

  #[test]
  fn reader_resumes_after_pause() {
    let mut reader = BlockReader::new();
    assert!(reader.feed_line("[White \"a\"]").is_none());
    assert!(reader.feed_line("[Black \"b\"]").is_none());
    // Caller stops feeding here; nothing is lost.
    assert!(reader.feed_line("[Result \"1-0\"]").is_none());
    assert!(reader.feed_line("").is_none());
    assert!(reader.feed_line("1. e4 e5").is_none());
    let game = reader.feed_line("").unwrap().unwrap();
    assert_eq!(game.moves, "1. e4 e5");
    assert!(reader.finish().is_none());
  }

  #[test]
  fn empty_input_yields_nothing() {
    assert!(parse_all("").is_empty());
    assert!(parse_all("\n\n\n").is_empty());
  }
}
