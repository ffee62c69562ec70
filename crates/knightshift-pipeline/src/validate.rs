//! The validation and cleaning pass over rows with `validated = false`.
//!
//! Each row is either deleted (a hard constraint failed) or written back
//! with cleaned columns and marked validated, never both. Rules run in a
//! fixed order:
//!
//! 1. both participants and the move text must be non-empty, else delete;
//! 2. the result must be `1-0`, `0-1` or `1/2-1/2`, else delete;
//! 3. ratings that do not parse or fall outside `0..=max_rating` are nulled;
//! 4. an opening code of `?` is nulled;
//! 5. the site URL is checked for shape only;
//!
//! after which titles and the termination reason are normalized.

use chrono::Utc;
use knightshift_core::{
  config::ValidateConfig,
  game::{Game, GameResult, StoredRating, Termination, ValidatedGame},
  profile::normalize_title,
  store::GameStore,
  summary::{Deletion, ValidationSummary},
};
use url::Url;

use crate::{Error, Result, budget::Budget};

/// What the rules decided for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
  Delete(String),
  Keep(ValidatedGame),
}

/// Apply the rule set to `game`.
pub fn check(game: &Game, config: &ValidateConfig) -> Verdict {
  for (name, value) in [
    ("white", &game.white),
    ("black", &game.black),
    ("moves", &game.moves),
  ] {
    if value.trim().is_empty() {
      return Verdict::Delete(format!("missing required field: {name}"));
    }
  }

  if game.result.parse::<GameResult>().is_err() {
    return Verdict::Delete(format!("invalid result: {}", game.result));
  }

  let mut notes = Vec::new();

  let white_elo = rating("white_elo", game.white_elo.as_ref(), config, &mut notes);
  let black_elo = rating("black_elo", game.black_elo.as_ref(), config, &mut notes);

  let eco = match game.eco.as_deref().map(str::trim) {
    Some("?") | Some("") => {
      notes.push("normalized opening code".to_string());
      None
    }
    other => other.map(str::to_string),
  };

  if !site_is_well_formed(&game.site, &config.site_host) {
    notes.push(format!("invalid site url: {}", game.site));
  }

  let termination = Termination::normalize(&game.termination);
  if game.termination.trim().to_uppercase() != termination.as_str() {
    notes.push(format!(
      "normalized termination: {} -> {termination}",
      game.termination
    ));
  }

  Verdict::Keep(ValidatedGame {
    game_id: game.game_id.clone(),
    white_elo,
    black_elo,
    white_title: normalize_title(game.white_title.as_deref()),
    black_title: normalize_title(game.black_title.as_deref()),
    eco,
    termination: termination.to_string(),
    validated_at: Utc::now(),
    notes: (!notes.is_empty()).then(|| notes.join(", ")),
  })
}

fn rating(
  field: &str,
  stored: Option<&StoredRating>,
  config: &ValidateConfig,
  notes: &mut Vec<String>,
) -> Option<i32> {
  let stored = stored?;
  let plausible = stored
    .as_int()
    .filter(|v| (0..=config.max_rating).contains(v))
    .and_then(|v| i32::try_from(v).ok());
  if plausible.is_none() {
    notes.push(format!("invalid {field}"));
  }
  plausible
}

/// `https://<host>/<alphanumeric id>` with nothing else attached.
fn site_is_well_formed(site: &str, host: &str) -> bool {
  let Ok(url) = Url::parse(site.trim()) else {
    return false;
  };
  let id = url.path().strip_prefix('/').unwrap_or_default();
  url.scheme() == "https"
    && url.host_str() == Some(host)
    && url.port().is_none()
    && url.query().is_none()
    && url.fragment().is_none()
    && !id.is_empty()
    && id.chars().all(|c| c.is_ascii_alphanumeric())
}

// ─── Pass ────────────────────────────────────────────────────────────────────

/// Runs [`check`] over pending rows and applies the verdicts.
pub struct Validator<S> {
  store:  S,
  config: ValidateConfig,
}

impl<S: GameStore> Validator<S> {
  pub fn new(store: S, config: ValidateConfig) -> Self { Self { store, config } }

  /// One pass over the pending rows, bounded by the configured limits.
  ///
  /// Only a failure to fetch a page of pending rows aborts the pass. Rows
  /// that cannot be decoded are counted as errored and passed over.
  pub async fn run(&self) -> Result<ValidationSummary> {
    let budget = Budget::start(&self.config.limits);
    let batch_size = budget.limits().batch_size.max(1);
    let mut summary = ValidationSummary::default();
    let mut cursor: Option<String> = None;
    let mut seen = 0;

    'pages: loop {
      if budget.exhausted(seen) {
        break;
      }

      let page = self
        .store
        .pending_validation(cursor.as_deref(), batch_size)
        .await
        .map_err(Error::store)?;
      let Some(last) = page.last() else {
        break;
      };
      cursor = Some(match last {
        Ok(game) => game.game_id.clone(),
        Err(bad) => bad.game_id.clone(),
      });

      for row in &page {
        if budget.exhausted(seen) {
          break 'pages;
        }
        seen += 1;
        match row {
          Ok(game) => self.apply(game, &mut summary).await,
          Err(bad) => {
            tracing::error!(game_id = %bad.game_id, error = %bad.error, "undecodable game row");
            summary.errored += 1;
          }
        }
      }

      tracing::debug!(
        deleted = summary.deleted,
        updated = summary.updated,
        errored = summary.errored,
        "validation batch done"
      );
      tokio::time::sleep(budget.limits().batch_pause()).await;
    }

    tracing::info!(
      deleted = summary.deleted,
      updated = summary.updated,
      errored = summary.errored,
      "validation pass finished"
    );
    Ok(summary)
  }

  async fn apply(&self, game: &Game, summary: &mut ValidationSummary) {
    let game_id = &game.game_id;
    match check(game, &self.config) {
      Verdict::Delete(reason) => match self.store.delete_game(game_id).await {
        Ok(_) => {
          tracing::info!(%game_id, %reason, "deleted invalid game");
          summary.deleted += 1;
          summary.deletions.push(Deletion {
            game_id: game_id.clone(),
            reason,
          });
        }
        Err(e) => {
          tracing::error!(%game_id, error = %e, "failed to delete game");
          summary.errored += 1;
        }
      },
      Verdict::Keep(update) => {
        if let Some(notes) = &update.notes {
          tracing::debug!(%game_id, %notes, "cleaned game");
        }
        match self.store.mark_validated(update).await {
          Ok(()) => summary.updated += 1,
          Err(e) => {
            tracing::error!(%game_id, error = %e, "failed to mark game validated");
            summary.errored += 1;
          }
        }
      }
    }
  }
}
