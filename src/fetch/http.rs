//! HTTP GET with bounded retries.

use crate::config::NetworkConfig;
use crate::error::{AntsibullError, FetchErrorKind, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Wait factor after a failed request.
const WAIT_FACTOR: f64 = 5.0;
/// Wait factor after a timed-out request.
const TIMEOUT_WAIT_FACTOR: f64 = 0.5;

/// Delay before retry number `retry + 1`: `1.5^retry * factor + 0.5 + jitter`,
/// with jitter uniform in `[0, 1)`.
fn backoff(retry: u32, timed_out: bool, jitter: f64) -> Duration {
    let factor = if timed_out {
        TIMEOUT_WAIT_FACTOR
    } else {
        WAIT_FACTOR
    };
    let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
    Duration::from_secs_f64(1.5_f64.powi(exponent) * factor + 0.5 + jitter)
}

fn network_error(url: &str, err: &reqwest::Error) -> AntsibullError {
    AntsibullError::fetch(format!("GET {url}"), FetchErrorKind::Network(err.to_string()))
}

/// Blocking HTTP client that retries failed GET requests.
///
/// A 404 is an answer, not a failure: it is reported as `Ok(None)`.
#[derive(Debug, Clone)]
pub struct RetryingClient {
    client: Client,
    max_retries: u32,
}

impl RetryingClient {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| network_error("(client setup)", &e))?;

        Ok(Self {
            client,
            max_retries: config.max_retries.max(1),
        })
    }

    /// Fetch `url`, returning `None` on 404.
    pub fn get_bytes(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let mut failures: Vec<String> = Vec::new();

        for retry in 0..self.max_retries {
            tracing::debug!("GET {url}");
            let timed_out = match self.client.get(url).send() {
                Ok(response) => {
                    let status = response.status();
                    tracing::debug!("Status code {}", status.as_u16());
                    if status == StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if status.is_success() {
                        return response
                            .bytes()
                            .map(|body| Some(body.to_vec()))
                            .map_err(|e| network_error(url, &e));
                    }
                    failures.push(status.as_u16().to_string());
                    false
                }
                Err(e) if e.is_timeout() => {
                    failures.push("timeout".to_string());
                    true
                }
                Err(e) => {
                    failures.push(e.to_string());
                    false
                }
            };

            let last = retry + 1 == self.max_retries;
            tracing::warn!(
                "GET {url} failed with {}{}",
                failures.last().map_or("", String::as_str),
                if last { ", finally failed." } else { ", retrying..." }
            );
            if last {
                break;
            }
            std::thread::sleep(backoff(retry, timed_out, rand::random::<f64>()));
        }

        Err(AntsibullError::fetch(
            format!("GET {url}"),
            FetchErrorKind::RetriesExhausted {
                attempts: self.max_retries,
                last_error: failures.join(", "),
            },
        ))
    }

    /// Fetch and decode a JSON document, returning `None` on 404.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        match self.get_bytes(url)? {
            Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
            None => Ok(None),
        }
    }
}

/// Join a base URL and a path with exactly one slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
