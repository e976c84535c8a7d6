use crate::constants::*;
use crate::errors::{AppError, AppResult};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the key-rotation retry protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of full passes over the key pool
    pub max_passes: u32,
    /// Length of one backoff unit
    pub backoff_unit: Duration,
    /// Upper bound of the backoff, in units
    pub backoff_cap_units: u64,
    /// Timeout applied to every single request
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_passes: MAX_PASSES,
            backoff_unit: Duration::from_millis(BACKOFF_UNIT_MS),
            backoff_cap_units: BACKOFF_CAP_UNITS,
            request_timeout: Duration::from_secs(METADATA_TIMEOUT_SECS),
        }
    }
}

/// Calculates the wait after a failure with the key at `key_index`.
///
/// Formula: `backoff_unit * min(2^key_index, backoff_cap_units)`
///
/// The delay depends on the position of the key in the pool, so it starts over at
/// one unit on every pass.
pub fn backoff_delay(key_index: usize, policy: &RetryPolicy) -> Duration {
    let units = u32::try_from(key_index)
        .ok()
        .and_then(|i| 2_u64.checked_pow(i))
        .unwrap_or(u64::MAX)
        .min(policy.backoff_cap_units);
    policy
        .backoff_unit
        .saturating_mul(u32::try_from(units).unwrap_or(u32::MAX))
}

/// Why a single attempt did not produce a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Connection, TLS or timeout error
    Transport(String),
    /// Response carried a non-success HTTP status
    HttpStatus(u16),
    /// Response succeeded but did not declare a JSON content type
    NotJson { content_type: String },
    /// Response declared JSON but the body did not decode
    Decode(String),
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Transport(msg) => write!(f, "transport error: {msg}"),
            AttemptOutcome::HttpStatus(status) => write!(f, "HTTP {status}"),
            AttemptOutcome::NotJson { content_type } => {
                write!(f, "unexpected content type '{content_type}'")
            }
            AttemptOutcome::Decode(msg) => write!(f, "invalid JSON body: {msg}"),
        }
    }
}

/// A failed attempt, as reported to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
    /// Zero-based pass number
    pub pass: u32,
    /// Zero-based index of the key in the pool
    pub key_index: usize,
    pub outcome: AttemptOutcome,
}

/// Fetches a JSON document from a templated endpoint, rotating through `api_keys`.
///
/// The `{apiKey}` placeholder in `template` is replaced by each key in turn. An attempt
/// fails on transport errors, non-success statuses, non-JSON content types and bodies
/// that do not decode; every failure is logged and followed by [`backoff_delay`] before
/// the next attempt. The first decoded body is returned right away.
///
/// No delay follows the last attempt of the last pass: once every key has failed on
/// every pass, the error is returned immediately instead of sleeping first.
///
/// # Arguments
///
/// * `client` - HTTP client for making requests
/// * `template` - Endpoint URL containing exactly one `{apiKey}` placeholder
/// * `label` - Request name used in log events and in the exhaustion error
/// * `api_keys` - Ordered key pool; must not be empty
/// * `policy` - Number of passes, backoff and per-request timeout
///
/// # Errors
///
/// Returns `InvalidInput` before any request if the pool is empty or the template does
/// not contain exactly one placeholder, and `FetchExhausted` once every key has failed on
/// every pass.
pub async fn fetch_with_retry(
    client: &reqwest::Client,
    template: &str,
    label: &str,
    api_keys: &[String],
    policy: &RetryPolicy,
) -> AppResult<Value> {
    if api_keys.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one API key is required".to_string(),
        ));
    }
    let placeholders = template.matches(API_KEY_PLACEHOLDER).count();
    if placeholders != 1 {
        return Err(AppError::InvalidInput(format!(
            "Endpoint template must contain exactly one {API_KEY_PLACEHOLDER} placeholder, found {placeholders}"
        )));
    }

    info!(label = label, keys = api_keys.len(), "Requesting AEMET endpoint");

    for pass in 0..policy.max_passes {
        debug!(label = label, pass = pass + 1, max_passes = policy.max_passes, "Starting pass");

        for (key_index, api_key) in api_keys.iter().enumerate() {
            let url = template.replace(API_KEY_PLACEHOLDER, api_key);

            let outcome = match attempt(client, &url, policy.request_timeout).await {
                Ok(data) => {
                    info!(label = label, pass = pass + 1, key = key_index + 1, "Data obtained");
                    return Ok(data);
                }
                Err(outcome) => outcome,
            };

            let record = FetchAttempt {
                pass,
                key_index,
                outcome,
            };
            let is_last = pass + 1 == policy.max_passes && key_index + 1 == api_keys.len();
            let delay = backoff_delay(key_index, policy);
            warn!(
                label = label,
                pass = record.pass + 1,
                key = record.key_index + 1,
                delay_ms = if is_last { 0 } else { delay.as_millis() as u64 },
                error = %record.outcome,
                "Attempt failed"
            );

            if !is_last {
                tokio::time::sleep(delay).await;
            }
        }

        debug!(label = label, pass = pass + 1, "Pass finished without data");
    }

    Err(AppError::FetchExhausted {
        label: label.to_string(),
        passes: policy.max_passes,
        keys: api_keys.len(),
    })
}

/// Performs a single GET and classifies the response.
async fn attempt(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Value, AttemptOutcome> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| AttemptOutcome::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AttemptOutcome::HttpStatus(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.contains("application/json") {
        return Err(AttemptOutcome::NotJson { content_type });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| AttemptOutcome::Transport(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| AttemptOutcome::Decode(e.to_string()))
}
