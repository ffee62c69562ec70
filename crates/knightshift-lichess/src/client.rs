//! Async HTTP client for the Lichess public API.

use knightshift_core::{
  FetchError,
  config::LichessConfig,
  profile::UserProfile,
  source::{FeedSource, ProfileSource},
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};

use crate::{Result, tv::TvFeed, user::UserResponse};

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct LichessClient {
  client: Client,
  config: LichessConfig,
}

impl LichessClient {
  pub fn new(config: LichessConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout())
      .user_agent(concat!("knightshift/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    match &self.config.token {
      Some(token) if !token.is_empty() => req.bearer_auth(token),
      _ => req,
    }
  }
}

fn transport(e: reqwest::Error) -> FetchError { FetchError::Transport(e.to_string()) }

/// Map non-success statuses onto [`FetchError`]; 429 is kept distinct.
fn check(resp: Response, what: &str) -> std::result::Result<Response, FetchError> {
  match resp.status() {
    s if s.is_success() => Ok(resp),
    StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited),
    StatusCode::NOT_FOUND => Err(FetchError::NotFound(what.to_string())),
    s => Err(FetchError::Status(s.as_u16())),
  }
}

impl FeedSource for LichessClient {
  type Feed = TvFeed;

  /// `GET /api/tv/{channel}` as a PGN stream.
  async fn open<'a>(&'a self, channel: &'a str) -> std::result::Result<TvFeed, FetchError> {
    let resp = self
      .auth(self.client.get(self.url(&format!("/tv/{channel}"))))
      .header(header::ACCEPT, "application/x-chess-pgn")
      .query(&[("clocks", "false"), ("opening", "true")])
      .send()
      .await
      .map_err(transport)?;
    let resp = check(resp, channel)?;
    tracing::debug!(%channel, "opened tv channel");
    Ok(TvFeed::new(channel, resp))
  }
}

impl ProfileSource for LichessClient {
  /// `GET /api/user/{id}?trophies=false`
  async fn fetch_profile<'a>(
    &'a self,
    user_id: &'a str,
  ) -> std::result::Result<UserProfile, FetchError> {
    let resp = self
      .auth(self.client.get(self.url(&format!("/user/{user_id}"))))
      .query(&[("trophies", "false")])
      .send()
      .await
      .map_err(transport)?;
    let body: UserResponse = check(resp, user_id)?
      .json()
      .await
      .map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(body.into_profile())
  }
}
