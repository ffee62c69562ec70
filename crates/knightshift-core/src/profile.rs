//! Player profiles: the rows of the `profiles` table.
//!
//! Profiles are written once by the enricher and never overwritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ratings per game mode, as reported by the profile source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerfRatings {
  pub bullet:         Option<i32>,
  pub blitz:          Option<i32>,
  pub rapid:          Option<i32>,
  pub classical:      Option<i32>,
  pub correspondence: Option<i32>,
  pub chess960:       Option<i32>,
  pub ultra_bullet:   Option<i32>,
}

/// Aggregate game counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCounts {
  pub all:   Option<i64>,
  pub rated: Option<i64>,
  pub win:   Option<i64>,
  pub loss:  Option<i64>,
  pub draw:  Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  /// Lower-cased account id; the primary key.
  pub user_id:        String,
  pub username:       Option<String>,
  pub title:          Option<String>,
  pub url:            Option<String>,
  pub real_name:      Option<String>,
  pub location:       Option<String>,
  pub bio:            Option<String>,
  /// Country or region flag code, e.g. `NO` or `_earth`.
  pub country:        Option<String>,
  pub fide_rating:    Option<i32>,
  pub uscf_rating:    Option<i32>,
  pub ratings:        PerfRatings,
  /// Account creation, epoch milliseconds.
  pub created_at_ms:  Option<i64>,
  /// Last seen, epoch milliseconds.
  pub seen_at_ms:     Option<i64>,
  /// Seconds.
  pub playtime_total: Option<i64>,
  pub playtime_tv:    Option<i64>,
  pub counts:         GameCounts,
  pub patron:         bool,
  pub streaming:      bool,
}

/// A profile as read back from the store, with the time it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProfile {
  pub profile:    UserProfile,
  pub fetched_at: DateTime<Utc>,
}

/// Normalize a title the way the cleaning job does: trimmed and upper-cased,
/// with empty, `none` and `unranked` mapping to `None`.
pub fn normalize_title(raw: Option<&str>) -> Option<String> {
  let t = raw?.trim();
  if t.is_empty()
    || t.eq_ignore_ascii_case("none")
    || t.eq_ignore_ascii_case("unranked")
  {
    None
  } else {
    Some(t.to_uppercase())
  }
}

#[cfg(test)]
mod tests {
  use super::normalize_title;

  #[test]
  fn titles() {
    assert_eq!(normalize_title(Some(" gm ")), Some("GM".to_string()));
    assert_eq!(normalize_title(Some("Unranked")), None);
    assert_eq!(normalize_title(Some("")), None);
    assert_eq!(normalize_title(None), None);
  }
}
