//! Best-effort URL validity checks.
//!
//! Advisory helpers only: a syntactic shape test and a live reachability
//! probe. Neither gates the core probing logic and neither carries a
//! strong correctness contract.

use std::time::Duration;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(5);

static URL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("URL regex is valid")
});

/// Whether the candidate string looks like an http(s) URL.
pub fn is_url(candidate: &str) -> bool {
    URL_SHAPE.is_match(candidate)
}

/// Whether the URL answers a HEAD request within a short timeout.
///
/// 1xx-3xx responses count as reachable; server errors, client errors and
/// any transport-level fault count as unreachable.
pub fn is_reachable(url: &str) -> bool {
    let client = match reqwest::blocking::Client::builder()
        .timeout(REACHABILITY_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            warn!("Could not build HTTP client: {err}");
            return false;
        }
    };

    match client.head(url).send() {
        Ok(response) => {
            let status = response.status().as_u16();
            (100..400).contains(&status)
        }
        Err(err) => {
            debug!("HEAD {url} failed: {err}");
            false
        }
    }
}
