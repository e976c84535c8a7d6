//! Fetch engine for AEMET OpenData endpoints.
//!
//! Every OpenData request is a two-stage protocol: a metadata call, authenticated with
//! an API key, returns an [`Envelope`] whose `datos` field points at the actual content.
//! The metadata call goes through [`fetch_with_retry`], which rotates through a pool of
//! keys; the content is then downloaded with [`fetch_payload`] or
//! [`crate::extractor::download_archive`].

mod envelope;
mod payload;
mod retry;

// Re-export public API
pub use envelope::Envelope;
pub use payload::{decode_body, fetch_payload, Payload};
pub use retry::{backoff_delay, fetch_with_retry, AttemptOutcome, FetchAttempt, RetryPolicy};

use crate::errors::AppResult;

/// Runs the metadata call for `template` and returns the data URL of its envelope.
///
/// # Errors
///
/// Propagates `FetchExhausted` from the retry loop, and `Upstream` or `MissingDataUrl`
/// when the envelope decoded but reports a failure. Upstream failures are not retried.
pub async fn resolve_data_url(
    client: &reqwest::Client,
    template: &str,
    label: &str,
    api_keys: &[String],
    policy: &RetryPolicy,
) -> AppResult<String> {
    let response = fetch_with_retry(client, template, label, api_keys, policy).await?;
    Envelope::from_value(response)?.into_data_url()
}
