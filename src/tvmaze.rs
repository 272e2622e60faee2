use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::constants::constants;

/// One entry of a `/search/shows` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShowHit {
  #[serde(default)]
  pub score: f64,
  pub show: Show,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Show {
  pub id: u64,
  pub url: String,
  pub name: String,
  #[serde(default)]
  pub image: Option<ShowImage>,
  #[serde(default)]
  pub rating: Option<Rating>,
  #[serde(default)]
  pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShowImage {
  #[serde(default)]
  pub medium: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rating {
  #[serde(default)]
  pub average: Option<f64>,
}

impl Show {
  pub fn thumbnail_url(&self) -> Option<&str> {
    self.image.as_ref().and_then(|i| i.medium.as_deref()).filter(|s| !s.is_empty())
  }

  pub fn rating(&self) -> Option<f64> {
    self.rating.as_ref().and_then(|r| r.average)
  }

  /// The first listed genre, if any.
  pub fn genre(&self) -> Option<&str> {
    self.genres.first().map(String::as_str).filter(|g| !g.is_empty())
  }
}

/// Where search requests go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
  /// The TVmaze search URL, without query string.
  pub base: String,
  /// Relay prefix prepended verbatim to `base`.
  pub proxy: Option<String>,
}

impl Default for Endpoint {
  fn default() -> Self {
    let c = constants();
    Self { base: c.search_endpoint.clone(), proxy: Some(c.cors_proxy.clone()) }
  }
}

impl Endpoint {
  pub fn direct(base: impl Into<String>) -> Self {
    Self { base: base.into(), proxy: None }
  }

  /// Build the request URL with `query` encoded as the `q` parameter.
  pub fn search_url(&self, query: &str) -> Result<Url> {
    let target = match &self.proxy {
      Some(proxy) => format!("{}{}", proxy, self.base),
      None => self.base.clone(),
    };
    Url::parse_with_params(&target, &[("q", query)]).with_context(|| format!("Invalid search endpoint: {}", target))
  }
}

pub fn build_client() -> Result<Client> {
  Client::builder().timeout(constants().request_timeout()).build().context("Failed to build HTTP client")
}

/// Query the show directory. Any transport, status or decoding failure is an error.
pub async fn search_shows(client: &Client, endpoint: &Endpoint, query: &str) -> Result<Vec<ShowHit>> {
  let url = endpoint.search_url(query)?;
  debug!(url = %url, "GET search");

  let response = client.get(url.clone()).send().await.with_context(|| format!("Request to {} failed", url))?;
  let status = response.status();
  if !status.is_success() {
    return Err(anyhow!("Search request returned HTTP {}", status));
  }

  let body = response.bytes().await.context("Failed to read search response body")?;
  serde_json::from_slice(&body).context("Failed to decode search response")
}

pub async fn fetch_thumbnail(client: &Client, url: &str) -> Result<DynamicImage> {
  let response = client.get(url).send().await.with_context(|| format!("Failed to fetch thumbnail {}", url))?;
  if !response.status().is_success() {
    return Err(anyhow!("Thumbnail request returned HTTP {}", response.status()));
  }
  let bytes = response.bytes().await.with_context(|| format!("Failed to read image bytes from {}", url))?;
  image::load_from_memory(&bytes).with_context(|| format!("Failed to decode image from memory (URL: {})", url))
}
