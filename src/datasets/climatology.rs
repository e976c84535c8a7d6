use super::{ensure_api_keys, fetch_records};
use crate::config::ResolvedConfig;
use crate::dates::{daily_climatology_windows, parse_range, year_windows};
use crate::endpoints;
use crate::errors::AppResult;
use crate::models::{validate_stations, ExtremeParameter};
use serde_json::Value;
use tracing::info;

/// Downloads monthly and yearly climate values per station for a range of years.
///
/// Years are requested in chunks of at most three, the longest span the service
/// accepts.
///
/// # Errors
///
/// Returns `InvalidInput` before any request when `stations` or the key pool is
/// empty or `start_year > end_year`; otherwise propagates fetch errors.
pub async fn monthly_climatology(
    client: &reqwest::Client,
    config: &ResolvedConfig,
    stations: &[String],
    start_year: i32,
    end_year: i32,
) -> AppResult<Vec<Value>> {
    let stations = validate_stations(stations)?;
    let windows = year_windows(start_year, end_year)?;
    ensure_api_keys(config)?;

    let mut records = Vec::new();
    for station in &stations {
        for &(from, to) in &windows {
            info!(station = %station, start_year = from, end_year = to, "Requesting monthly climatology");
            let template =
                config.endpoint_template(&endpoints::monthly_climatology(station, from, to));
            let label = format!("climatologia_mensual_{station}_{from}_{to}");
            records.extend(fetch_records(client, config, &template, &label).await?);
        }
    }
    Ok(records)
}

/// Downloads daily climate values per station for a date range.
///
/// `start` and `end` take `AAAA-MM-DD` or `AAAA-MM-DDTHH:MM:SSUTC`. The range is split
/// into windows of five months and 29 days.
///
/// # Errors
///
/// Returns `InvalidInput` before any request for malformed or reversed dates, an empty
/// station list or an empty key pool; otherwise propagates fetch errors.
pub async fn daily_climatology(
    client: &reqwest::Client,
    config: &ResolvedConfig,
    stations: &[String],
    start: &str,
    end: &str,
) -> AppResult<Vec<Value>> {
    let stations = validate_stations(stations)?;
    let (start_date, end_date) = parse_range(start, end)?;
    let windows = daily_climatology_windows(start_date, end_date);
    ensure_api_keys(config)?;

    let mut records = Vec::new();
    for station in &stations {
        for window in &windows {
            let (from, to) = (window.start_param(), window.end_param());
            info!(station = %station, start = %from, end = %to, "Requesting daily climatology");
            let template = config.endpoint_template(&endpoints::daily_climatology(station, window));
            let label = format!("climatologia_diaria_{station}_{from}_{to}");
            records.extend(fetch_records(client, config, &template, &label).await?);
        }
    }
    Ok(records)
}

/// Downloads climatological extremes per station and parameter.
///
/// An empty `parameters` slice requests precipitation, temperature and wind.
pub async fn extreme_values(
    client: &reqwest::Client,
    config: &ResolvedConfig,
    stations: &[String],
    parameters: &[ExtremeParameter],
) -> AppResult<Vec<Value>> {
    let stations = validate_stations(stations)?;
    let parameters = if parameters.is_empty() {
        ExtremeParameter::defaults()
    } else {
        parameters.to_vec()
    };
    ensure_api_keys(config)?;

    let mut records = Vec::new();
    for station in &stations {
        for &parameter in &parameters {
            info!(station = %station, parameter = %parameter, "Requesting extreme values");
            let template =
                config.endpoint_template(&endpoints::extreme_values(station, parameter));
            let label = format!("climatologia_extremos_{station}_{parameter}");
            records.extend(fetch_records(client, config, &template, &label).await?);
        }
    }
    Ok(records)
}

/// Downloads the 1981–2010 climate normals per station.
pub async fn normal_values(
    client: &reqwest::Client,
    config: &ResolvedConfig,
    stations: &[String],
) -> AppResult<Vec<Value>> {
    let stations = validate_stations(stations)?;
    ensure_api_keys(config)?;

    let mut records = Vec::new();
    for station in &stations {
        info!(station = %station, "Requesting normal values");
        let template = config.endpoint_template(&endpoints::normal_values(station));
        let label = format!("climatologia_normales_{station}");
        records.extend(fetch_records(client, config, &template, &label).await?);
    }
    Ok(records)
}
