use super::ensure_api_keys;
use crate::config::ResolvedConfig;
use crate::dates::{parse_range, warnings_windows, DateWindow};
use crate::endpoints;
use crate::errors::AppResult;
use crate::extractor::{download_archive, ExtractedArchive};
use crate::fetcher::resolve_data_url;
use crate::models::Area;
use tracing::info;

/// Warnings archive downloaded for one date window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowArchive {
    pub window: DateWindow,
    pub entries: ExtractedArchive,
}

/// Downloads the latest CAP warnings issued for `area` and extracts them.
///
/// The service serves a tar.gz archive of CAP XML files; the result maps each file
/// name to its content.
///
/// # Errors
///
/// Returns `InvalidInput` before any request for unknown area codes or an empty key
/// pool; otherwise propagates fetch and download errors.
pub async fn latest_warnings(
    client: &reqwest::Client,
    config: &ResolvedConfig,
    area: &str,
) -> AppResult<ExtractedArchive> {
    let area = Area::parse(area)?;
    ensure_api_keys(config)?;

    info!(area = area.code(), name = area.display_name(), "Requesting latest warnings");
    let template = config.endpoint_template(&endpoints::latest_warnings(&area));
    let label = format!("avisos_area_{}", area.code());
    let data_url = resolve_data_url(
        client,
        &template,
        &label,
        &config.api_keys,
        &config.retry_policy(),
    )
    .await?;

    download_archive(client, &data_url, config.download_timeout()).await
}

/// Downloads the CAP warnings archive between two dates, one archive per window.
///
/// Windows span two days. Archives are returned in window order and are not merged,
/// so entries with the same name in different windows are kept apart.
///
/// # Errors
///
/// Returns `InvalidInput` before any request for malformed or reversed dates or an
/// empty key pool; otherwise propagates fetch and download errors.
pub async fn warnings_archive(
    client: &reqwest::Client,
    config: &ResolvedConfig,
    start: &str,
    end: &str,
) -> AppResult<Vec<WindowArchive>> {
    let (start_date, end_date) = parse_range(start, end)?;
    let windows = warnings_windows(start_date, end_date);
    ensure_api_keys(config)?;

    let policy = config.retry_policy();
    let mut archives = Vec::with_capacity(windows.len());
    for window in windows {
        let (from, to) = (window.start_param(), window.end_param());
        info!(start = %from, end = %to, "Requesting warnings archive");
        let template = config.endpoint_template(&endpoints::warnings_archive(&window));
        let label = format!("avisos_fechas_{from}_{to}");
        let data_url =
            resolve_data_url(client, &template, &label, &config.api_keys, &policy).await?;
        let entries = download_archive(client, &data_url, config.download_timeout()).await?;
        archives.push(WindowArchive { window, entries });
    }
    Ok(archives)
}
