//! Dataset-level requests built on the fetch engine and the archive extractor.
//!
//! Every function validates its input before the first request, then walks stations
//! and time windows sequentially. JSON datasets return the records of every window
//! concatenated; warning datasets return extracted archives.

mod climatology;
mod warnings;

// Re-export public API
pub use climatology::{daily_climatology, extreme_values, monthly_climatology, normal_values};
pub use warnings::{latest_warnings, warnings_archive, WindowArchive};

use crate::config::ResolvedConfig;
use crate::constants::API_KEY_PLACEHOLDER;
use crate::errors::{AppError, AppResult};
use crate::fetcher::{fetch_payload, resolve_data_url};
use serde_json::Value;
use tracing::info;

/// Runs both request stages for one endpoint template and returns its records.
pub(crate) async fn fetch_records(
    client: &reqwest::Client,
    config: &ResolvedConfig,
    template: &str,
    label: &str,
) -> AppResult<Vec<Value>> {
    let data_url = resolve_data_url(
        client,
        template,
        label,
        &config.api_keys,
        &config.retry_policy(),
    )
    .await?;
    let records = fetch_payload(client, &data_url, config.download_timeout())
        .await?
        .into_records();
    info!(label = label, records = records.len(), "Records downloaded");
    Ok(records)
}

pub(crate) fn ensure_api_keys(config: &ResolvedConfig) -> AppResult<()> {
    if config.api_keys.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one API key is required".to_string(),
        ));
    }
    Ok(())
}

/// Requests an arbitrary endpoint and returns its records.
///
/// `endpoint` is either a path relative to `base_url` or an absolute URL. An absolute
/// URL may carry its own `{apiKey}` placeholder; otherwise `api_key={apiKey}` is
/// appended as a query parameter.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty endpoint or key pool, and the errors of the
/// fetch engine otherwise.
pub async fn raw_endpoint(
    client: &reqwest::Client,
    config: &ResolvedConfig,
    endpoint: &str,
) -> AppResult<Vec<Value>> {
    ensure_api_keys(config)?;
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(AppError::InvalidInput("Endpoint is required".to_string()));
    }

    let template = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        if endpoint.contains(API_KEY_PLACEHOLDER) {
            endpoint.to_string()
        } else {
            let separator = if endpoint.contains('?') { '&' } else { '?' };
            format!("{endpoint}{separator}api_key={API_KEY_PLACEHOLDER}")
        }
    } else {
        config.endpoint_template(endpoint)
    };

    fetch_records(client, config, &template, &format!("raw_{endpoint}")).await
}
