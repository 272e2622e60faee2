//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so there is no runtime file I/O.
//! Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // TVmaze search
  pub search_endpoint: String,
  pub cors_proxy: String,
  pub debounce_ms: u64,
  pub request_timeout_secs: u64,

  // Panel copy
  pub input_placeholder: String,
  pub prompt_message: String,
  pub no_results_message: String,
  pub missing_field: String,
  pub missing_thumbnail: String,

  // Chrome
  pub spinner_frames: Vec<String>,
  pub error_ttl_secs: u64,
}

impl Constants {
  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  pub fn error_ttl(&self) -> Duration {
    Duration::from_secs(self.error_ttl_secs)
  }
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed every test fails loudly.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
