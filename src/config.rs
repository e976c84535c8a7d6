use crate::constants::*;
use crate::errors::{AppError, AppResult};
use crate::fetcher::RetryPolicy;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Resolved configuration with all values filled in (no Options).
///
/// This struct represents the client defaults and can be deserialized by the TOML
/// loader. Every key is optional in the file; missing keys take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    /// Root of the OpenData REST API, without a trailing slash
    pub base_url: String,
    /// API keys tried in order by the fetch engine
    pub api_keys: Vec<String>,

    // Retry protocol
    /// Number of full passes over the key pool before giving up
    pub max_passes: u32,
    /// Length of one backoff unit in milliseconds
    pub backoff_unit_ms: u64,
    /// Upper bound of the backoff, in units
    pub backoff_cap_units: u64,

    // Timeouts
    /// Timeout for each metadata request, in seconds
    pub metadata_timeout_secs: u64,
    /// Timeout for data and archive downloads, in seconds
    pub download_timeout_secs: u64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_keys: Vec::new(),
            max_passes: MAX_PASSES,
            backoff_unit_ms: BACKOFF_UNIT_MS,
            backoff_cap_units: BACKOFF_CAP_UNITS,
            metadata_timeout_secs: METADATA_TIMEOUT_SECS,
            download_timeout_secs: DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

impl ResolvedConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// Rejects unknown keys to prevent typos from being silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the TOML is malformed, unknown keys are present,
    /// `max_passes` or a timeout is zero, or `base_url` is not a valid URL.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ResolvedConfig = toml::from_str(&contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.max_passes == 0 {
            return Err(AppError::InvalidInput(
                "max_passes must be greater than 0".into(),
            ));
        }
        if self.metadata_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err(AppError::InvalidInput(
                "Timeouts must be greater than 0".into(),
            ));
        }
        Url::parse(&self.base_url)?;
        Ok(())
    }

    /// Retry policy for metadata calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_passes: self.max_passes,
            backoff_unit: Duration::from_millis(self.backoff_unit_ms),
            backoff_cap_units: self.backoff_cap_units,
            request_timeout: Duration::from_secs(self.metadata_timeout_secs),
        }
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Builds an endpoint template for `path` under `base_url`, with the API key
    /// placeholder appended as the `api_key` query parameter.
    pub fn endpoint_template(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let separator = if path.contains('?') { '&' } else { '?' };
        format!("{base}/{path}{separator}api_key={API_KEY_PLACEHOLDER}")
    }
}

/// Picks the API keys for a run.
///
/// Keys given on the command line (or through the environment) win over the ones in the
/// configuration file. Blank entries are dropped.
///
/// # Errors
///
/// Returns `InvalidInput` if no key is left.
pub fn resolve_api_keys(cli_keys: &[String], config: &ResolvedConfig) -> AppResult<Vec<String>> {
    let source = if cli_keys.is_empty() {
        &config.api_keys
    } else {
        cli_keys
    };
    let keys: Vec<String> = source
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();

    if keys.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "At least one API key is required (use --api-key, {API_KEY_ENV} or api_keys in the config file)"
        )));
    }
    Ok(keys)
}
