//! Profile enrichment for players referenced by unflagged games.

use knightshift_core::{
  FetchError,
  config::EnrichConfig,
  profile::normalize_title,
  source::ProfileSource,
  store::ProfileStore,
  summary::EnrichSummary,
};

use crate::{Error, Result, budget::Budget};

pub struct Enricher<S, P> {
  store:  S,
  source: P,
  config: EnrichConfig,
}

impl<S: ProfileStore, P: ProfileSource> Enricher<S, P> {
  pub fn new(store: S, source: P, config: EnrichConfig) -> Self {
    Self {
      store,
      source,
      config,
    }
  }

  /// One enrichment pass.
  ///
  /// Players with a stored profile are never fetched again; only their games
  /// are flagged. A rate-limit signal ends the pass early. Any other failure
  /// for one player is logged and that player is skipped.
  pub async fn run(&self) -> Result<EnrichSummary> {
    let budget = Budget::start(&self.config.limits);
    let batch_size = budget.limits().batch_size.max(1);
    let mut summary = EnrichSummary::default();

    let candidates = self.store.unprofiled_players().await.map_err(Error::store)?;
    tracing::info!(candidates = candidates.len(), "starting enrichment pass");

    for user_id in &candidates {
      if budget.exhausted(summary.fetched) {
        break;
      }

      match self.store.profile_exists(user_id).await {
        Ok(true) => {
          self.flag(user_id, &mut summary).await;
          summary.flagged_existing += 1;
          continue;
        }
        Ok(false) => {}
        Err(e) => {
          tracing::error!(%user_id, error = %e, "profile lookup failed");
          summary.failed += 1;
          continue;
        }
      }

      if summary.fetched > 0 {
        if summary.fetched % batch_size == 0 {
          tracing::debug!(fetched = summary.fetched, "pausing between batches");
          tokio::time::sleep(budget.limits().batch_pause()).await;
        } else {
          tokio::time::sleep(self.config.request_interval()).await;
        }
      }

      summary.fetched += 1;
      let mut profile = match self.source.fetch_profile(user_id).await {
        Ok(profile) => profile,
        Err(FetchError::RateLimited) => {
          tracing::warn!(%user_id, "rate limited; ending enrichment pass");
          summary.rate_limited = true;
          break;
        }
        Err(e) => {
          tracing::warn!(%user_id, error = %e, "profile fetch failed");
          summary.failed += 1;
          continue;
        }
      };
      profile.title = normalize_title(profile.title.as_deref());

      match self.store.insert_profile(profile).await {
        Ok(true) => summary.inserted += 1,
        // Written by an overlapping run in the meantime.
        Ok(false) => summary.flagged_existing += 1,
        Err(e) => {
          tracing::error!(%user_id, error = %e, "failed to store profile");
          summary.failed += 1;
          continue;
        }
      }
      self.flag(user_id, &mut summary).await;
    }

    tracing::info!(
      fetched = summary.fetched,
      inserted = summary.inserted,
      flagged_existing = summary.flagged_existing,
      failed = summary.failed,
      rows_flagged = summary.rows_flagged,
      flag_failed = summary.flag_failed,
      rate_limited = summary.rate_limited,
      "enrichment pass finished"
    );
    Ok(summary)
  }

  async fn flag(&self, user_id: &str, summary: &mut EnrichSummary) {
    match self.store.mark_profile_updated(user_id).await {
      Ok(n) => summary.rows_flagged += n,
      Err(e) => {
        tracing::error!(%user_id, error = %e, "failed to flag games");
        summary.flag_failed += 1;
      }
    }
  }
}
