//! Drains game feeds into the store.

use knightshift_core::{
  FeedError, FetchError,
  config::IngestConfig,
  source::{FeedSource, GameFeed},
  store::GameStore,
  summary::IngestSummary,
};

use crate::budget::Budget;

/// Why a feed stopped yielding.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Drained {
  Exhausted,
  Budget,
  Failed(FetchError),
}

enum Opened<F> {
  Feed(F),
  /// Retries ran out; try again next round.
  Skipped,
  RateLimited,
}

pub struct Ingester<S> {
  store:  S,
  config: IngestConfig,
}

impl<S: GameStore> Ingester<S> {
  pub fn new(store: S, config: IngestConfig) -> Self { Self { store, config } }

  /// Drain `feed` completely (subject to the configured limits).
  pub async fn ingest_feed<F: GameFeed>(&self, feed: &mut F) -> IngestSummary {
    let budget = Budget::start(&self.config.limits);
    let mut summary = IngestSummary::default();
    match self.drain(feed, &budget, &mut summary).await {
      Drained::Failed(FetchError::RateLimited) => summary.rate_limited = true,
      Drained::Failed(e) => tracing::warn!(error = %e, "feed ended early"),
      Drained::Exhausted | Drained::Budget => {}
    }
    summary
  }

  /// Poll every configured channel in rounds until the time limit or
  /// record cap is reached, or the source signals a rate limit.
  pub async fn run<Src: FeedSource>(&self, source: &Src) -> IngestSummary {
    let budget = Budget::start(&self.config.limits);
    let mut summary = IngestSummary::default();

    'rounds: loop {
      for channel in &self.config.channels {
        if budget.exhausted(summary.processed()) {
          break 'rounds;
        }

        let mut feed = match self.open(source, channel).await {
          Opened::Feed(feed) => feed,
          Opened::Skipped => continue,
          Opened::RateLimited => {
            summary.rate_limited = true;
            break 'rounds;
          }
        };

        let before = summary.processed();
        match self.drain(&mut feed, &budget, &mut summary).await {
          Drained::Failed(FetchError::RateLimited) => {
            tracing::warn!(%channel, "rate limited; ending ingest run");
            summary.rate_limited = true;
            break 'rounds;
          }
          Drained::Failed(e) => {
            tracing::warn!(%channel, error = %e, "channel feed ended early");
          }
          Drained::Exhausted | Drained::Budget => {}
        }
        tracing::info!(
          %channel,
          processed = summary.processed() - before,
          "channel drained"
        );
      }

      if self.config.channels.is_empty() || budget.exhausted(summary.processed()) {
        break;
      }
      tokio::time::sleep(budget.limits().batch_pause()).await;
    }

    tracing::info!(
      inserted = summary.inserted,
      updated = summary.updated,
      skipped_identical = summary.skipped_identical,
      malformed = summary.malformed,
      errored = summary.errored,
      rate_limited = summary.rate_limited,
      "ingest run finished"
    );
    summary
  }

  /// Open `channel`, retrying failures other than a rate limit.
  async fn open<Src: FeedSource>(&self, source: &Src, channel: &str) -> Opened<Src::Feed> {
    let attempts = self.config.connect_retries.max(1);
    for attempt in 1..=attempts {
      match source.open(channel).await {
        Ok(feed) => return Opened::Feed(feed),
        Err(FetchError::RateLimited) => {
          tracing::warn!(%channel, "rate limited opening channel");
          return Opened::RateLimited;
        }
        Err(e) => {
          tracing::warn!(%channel, attempt, error = %e, "failed to open channel");
          if attempt < attempts {
            tokio::time::sleep(self.config.retry_delay()).await;
          }
        }
      }
    }
    tracing::error!(%channel, attempts, "giving up on channel for this round");
    Opened::Skipped
  }

  async fn drain<F: GameFeed>(
    &self,
    feed: &mut F,
    budget: &Budget,
    summary: &mut IngestSummary,
  ) -> Drained {
    loop {
      if budget.exhausted(summary.processed()) {
        return Drained::Budget;
      }
      let game = match feed.next_game().await {
        None => return Drained::Exhausted,
        Some(Ok(game)) => game,
        Some(Err(FeedError::Malformed(reason))) => {
          tracing::warn!(%reason, "skipping malformed block");
          summary.malformed += 1;
          continue;
        }
        Some(Err(FeedError::Fetch(e))) => return Drained::Failed(e),
      };

      if game.game_id.is_empty() {
        tracing::warn!(white = %game.white, black = %game.black, "skipping game without id");
        summary.malformed += 1;
        continue;
      }

      let game_id = game.game_id.clone();
      match self.store.upsert_game(game).await {
        Ok(outcome) => {
          tracing::debug!(%game_id, ?outcome, "upserted game");
          summary.record(outcome);
        }
        Err(e) => {
          tracing::error!(%game_id, error = %e, "failed to upsert game");
          summary.errored += 1;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
  };

  use knightshift_core::{
    config::RunLimits,
    game::NewGame,
    store::GameStore,
  };
  use knightshift_pgn::PgnFeed;
  use knightshift_store_sqlite::SqliteStore;

  use super::*;
  use crate::testing::FlakyStore;

  struct VecFeed(VecDeque<Result<NewGame, FeedError>>);

  impl GameFeed for VecFeed {
    async fn next_game(&mut self) -> Option<Result<NewGame, FeedError>> {
      self.0.pop_front()
    }
  }

  /// Serves a fixed script of items per channel; each `open` replays it.
  #[derive(Default)]
  struct FakeSource {
    channels: HashMap<&'static str, Vec<Result<NewGame, FeedError>>>,
    open_err: HashMap<&'static str, FetchError>,
    opens:    Mutex<Vec<String>>,
  }

  impl FeedSource for FakeSource {
    type Feed = VecFeed;

    async fn open<'a>(&'a self, channel: &'a str) -> Result<VecFeed, FetchError> {
      self.opens.lock().unwrap().push(channel.to_string());
      if let Some(e) = self.open_err.get(channel) {
        return Err(e.clone());
      }
      let items = self.channels.get(channel).cloned().unwrap_or_default();
      Ok(VecFeed(items.into()))
    }
  }

  fn game(id: &str) -> NewGame {
    NewGame {
      game_id: id.into(),
      white: "alice".into(),
      black: "bob".into(),
      result: "1-0".into(),
      moves: "1. e4 e5".into(),
      ..NewGame::default()
    }
  }

  fn config(channels: &[&str]) -> IngestConfig {
    IngestConfig {
      limits:           RunLimits {
        max_records:      None,
        batch_size:       10,
        batch_pause_secs: 0,
        time_limit_secs:  Some(0),
      },
      channels:         channels.iter().map(|c| c.to_string()).collect(),
      connect_retries:  2,
      retry_delay_secs: 0,
    }
  }

  fn unlimited(channels: &[&str], max_records: usize) -> IngestConfig {
    let mut cfg = config(channels);
    cfg.limits.time_limit_secs = None;
    cfg.limits.max_records = Some(max_records);
    cfg
  }

  #[tokio::test]
  async fn feed_outcomes_are_tallied() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.upsert_game(game("known")).await.unwrap();
    let mut changed = game("changed");
    store.upsert_game(changed.clone()).await.unwrap();
    changed.moves = "1. d4".into();

    let mut feed = VecFeed(
      vec![
        Ok(game("new")),
        Ok(game("known")),
        Ok(changed),
        Err(FeedError::Malformed("missing header: Result".into())),
        Ok(game("")),
      ]
      .into(),
    );
    let ingester = Ingester::new(store.clone(), unlimited(&[], 100));
    let summary = ingester.ingest_feed(&mut feed).await;

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.skipped_identical, 1);
    assert_eq!(summary.malformed, 2);
    assert_eq!(summary.errored, 0);
    assert_eq!(store.count_games().await.unwrap(), 3);
  }

  #[tokio::test]
  async fn fetch_error_ends_the_feed() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut feed = VecFeed(
      vec![
        Ok(game("a")),
        Err(FeedError::Fetch(FetchError::Transport("reset".into()))),
        Ok(game("b")),
      ]
      .into(),
    );
    let summary = Ingester::new(store.clone(), unlimited(&[], 100))
      .ingest_feed(&mut feed)
      .await;
    assert_eq!(summary.inserted, 1);
    assert!(!summary.rate_limited);
    assert!(store.get_game("b").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn pgn_text_feed_ingests_end_to_end() {
    let text = "[Event \"Rated Blitz game\"]\n\
                [Site \"https://lichess.org/abcd1234\"]\n\
                [White \"alice\"]\n\
                [Black \"bob\"]\n\
                [Result \"1-0\"]\n\
                [WhiteElo \"abc\"]\n\
                \n\
                1. e4 e5 1-0\n\
                \n\
                [White \"x\"]\n\
                \n\
                1. d4\n";
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut feed = PgnFeed::new(text.as_bytes());
    let summary = Ingester::new(store.clone(), unlimited(&[], 100))
      .ingest_feed(&mut feed)
      .await;

    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.malformed, 1);
    let g = store.get_game("abcd1234").await.unwrap().unwrap();
    assert_eq!(g.white_elo, None);
    assert_eq!(g.moves, "1. e4 e5 1-0");
  }

  #[tokio::test]
  async fn run_polls_channels_until_record_cap() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut source = FakeSource::default();
    source.channels.insert("blitz", vec![Ok(game("b1")), Ok(game("b2"))]);
    source.channels.insert("rapid", vec![Ok(game("r1"))]);

    // Every round after the first only re-sees identical games.
    let summary = Ingester::new(store.clone(), unlimited(&["blitz", "rapid"], 6))
      .run(&source)
      .await;
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.skipped_identical, 3);
    assert_eq!(
      *source.opens.lock().unwrap(),
      ["blitz", "rapid", "blitz", "rapid"]
    );
  }

  #[tokio::test]
  async fn run_stops_at_time_limit() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let source = FakeSource::default();
    let summary = Ingester::new(store, config(&["blitz"])).run(&source).await;
    assert_eq!(summary, IngestSummary::default());
    assert!(source.opens.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn open_retries_then_skips_channel() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut source = FakeSource::default();
    source.open_err.insert("blitz", FetchError::Status(503));
    source.channels.insert("rapid", vec![Ok(game("r1"))]);

    let summary = Ingester::new(store.clone(), unlimited(&["blitz", "rapid"], 1))
      .run(&source)
      .await;
    assert_eq!(summary.inserted, 1);
    assert_eq!(*source.opens.lock().unwrap(), ["blitz", "blitz", "rapid"]);
  }

  #[tokio::test]
  async fn rate_limit_on_open_ends_the_run() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mut source = FakeSource::default();
    source.open_err.insert("blitz", FetchError::RateLimited);
    source.channels.insert("rapid", vec![Ok(game("r1"))]);

    let summary = Ingester::new(store.clone(), unlimited(&["blitz", "rapid"], 10))
      .run(&source)
      .await;
    assert!(summary.rate_limited);
    assert_eq!(*source.opens.lock().unwrap(), ["blitz"]);
    assert_eq!(store.count_games().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn failed_upsert_is_counted_and_the_feed_continues() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let flaky = FlakyStore {
      inner:   store.clone(),
      fail_on: "b",
    };
    let mut feed = VecFeed(vec![Ok(game("a")), Ok(game("b")), Ok(game("c"))].into());

    let summary = Ingester::new(flaky, unlimited(&[], 100))
      .ingest_feed(&mut feed)
      .await;
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.errored, 1);
    assert!(store.get_game("b").await.unwrap().is_none());
    assert!(store.get_game("c").await.unwrap().is_some());
  }
}
