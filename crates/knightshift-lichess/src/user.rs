//! Response shape of `GET /api/user/{username}`.

use knightshift_core::profile::{GameCounts, PerfRatings, UserProfile};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserResponse {
  id:         String,
  username:   Option<String>,
  title:      Option<String>,
  url:        Option<String>,
  #[serde(default)]
  profile:    ProfileSection,
  #[serde(default)]
  perfs:      Perfs,
  created_at: Option<i64>,
  seen_at:    Option<i64>,
  #[serde(default)]
  play_time:  PlayTime,
  #[serde(default)]
  count:      Count,
  #[serde(default)]
  patron:     bool,
  #[serde(default)]
  streaming:  bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSection {
  real_name:   Option<String>,
  location:    Option<String>,
  bio:         Option<String>,
  flag:        Option<String>,
  /// Older accounts carry the flag under this name.
  country:     Option<String>,
  fide_rating: Option<i32>,
  uscf_rating: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct Perf {
  rating: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Perfs {
  bullet:         Option<Perf>,
  blitz:          Option<Perf>,
  rapid:          Option<Perf>,
  classical:      Option<Perf>,
  correspondence: Option<Perf>,
  chess960:       Option<Perf>,
  ultra_bullet:   Option<Perf>,
}

#[derive(Debug, Default, Deserialize)]
struct PlayTime {
  total: Option<i64>,
  tv:    Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct Count {
  all:   Option<i64>,
  rated: Option<i64>,
  win:   Option<i64>,
  loss:  Option<i64>,
  draw:  Option<i64>,
}

fn rating(perf: Option<Perf>) -> Option<i32> { perf.and_then(|p| p.rating) }

impl UserResponse {
  pub fn into_profile(self) -> UserProfile {
    UserProfile {
      user_id:        self.id,
      username:       self.username,
      title:          self.title,
      url:            self.url,
      real_name:      self.profile.real_name,
      location:       self.profile.location,
      bio:            self.profile.bio,
      country:        self.profile.flag.or(self.profile.country),
      fide_rating:    self.profile.fide_rating,
      uscf_rating:    self.profile.uscf_rating,
      ratings:        PerfRatings {
        bullet:         rating(self.perfs.bullet),
        blitz:          rating(self.perfs.blitz),
        rapid:          rating(self.perfs.rapid),
        classical:      rating(self.perfs.classical),
        correspondence: rating(self.perfs.correspondence),
        chess960:       rating(self.perfs.chess960),
        ultra_bullet:   rating(self.perfs.ultra_bullet),
      },
      created_at_ms:  self.created_at,
      seen_at_ms:     self.seen_at,
      playtime_total: self.play_time.total,
      playtime_tv:    self.play_time.tv,
      counts:         GameCounts {
        all:   self.count.all,
        rated: self.count.rated,
        win:   self.count.win,
        loss:  self.count.loss,
        draw:  self.count.draw,
      },
      patron:         self.patron,
      streaming:      self.streaming,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn full_response_maps_every_attribute() {
    let body = r#"{
      "id": "thibault",
      "username": "thibault",
      "title": "LM",
      "url": "https://lichess.org/@/thibault",
      "profile": {
        "realName": "Thibault D",
        "location": "FR",
        "bio": "I turn coffee into bugs.",
        "flag": "FR",
        "fideRating": 1500
      },
      "perfs": {
        "blitz": { "games": 1, "rating": 1700, "rd": 60, "prog": 0 },
        "ultraBullet": { "games": 2, "rating": 1400, "rd": 80, "prog": 3 },
        "puzzle": { "games": 9, "rating": 1900 }
      },
      "createdAt": 1290415680000,
      "seenAt": 1700000000000,
      "playTime": { "total": 5000, "tv": 10 },
      "count": { "all": 10, "rated": 8, "win": 5, "loss": 4, "draw": 1, "ai": 0 },
      "patron": true
    }"#;
    let profile = serde_json::from_str::<UserResponse>(body).unwrap().into_profile();
    assert_eq!(profile.user_id, "thibault");
    assert_eq!(profile.title.as_deref(), Some("LM"));
    assert_eq!(profile.real_name.as_deref(), Some("Thibault D"));
    assert_eq!(profile.country.as_deref(), Some("FR"));
    assert_eq!(profile.fide_rating, Some(1500));
    assert_eq!(profile.uscf_rating, None);
    assert_eq!(profile.ratings.blitz, Some(1700));
    assert_eq!(profile.ratings.ultra_bullet, Some(1400));
    assert_eq!(profile.ratings.bullet, None);
    assert_eq!(profile.created_at_ms, Some(1_290_415_680_000));
    assert_eq!(profile.playtime_tv, Some(10));
    assert_eq!(profile.counts.draw, Some(1));
    assert!(profile.patron);
    assert!(!profile.streaming);
  }

  #[test]
  fn closed_account_has_only_an_id() {
    let body = r#"{ "id": "gone", "username": "Gone", "disabled": true }"#;
    let profile = serde_json::from_str::<UserResponse>(body).unwrap().into_profile();
    assert_eq!(profile.user_id, "gone");
    assert_eq!(profile.ratings, PerfRatings::default());
    assert_eq!(profile.counts, GameCounts::default());
  }
}
