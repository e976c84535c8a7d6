//! Endpoint paths, relative to the API root, for every dataset.

use crate::dates::DateWindow;
use crate::errors::{AppError, AppResult};
use crate::models::{Area, ExtremeParameter};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

const ALIAS_PARAM_PATTERN: &str = r"\{([A-Za-z_][A-Za-z0-9_]*)\}";

static ALIAS_PARAM_REGEX: OnceLock<Regex> = OnceLock::new();

/// Shortcuts accepted by `aemet raw --alias`, with their `{param}` placeholders.
pub const ENDPOINT_ALIASES: &[(&str, &str)] = &[
    (
        "diarios",
        "valores/climatologicos/diarios/datos/fechaini/{fechaini}/fechafin/{fechafin}/todasestaciones",
    ),
    (
        "mensuales",
        "valores/climatologicos/mensualesanuales/datos/anioini/{anioini}/aniofin/{aniofin}/estacion/{idema}",
    ),
    ("avisos", "avisos_cap/ultimoelaborado/area/{area}"),
    ("normales", "valores/climatologicos/normales/estacion/{idema}"),
];

pub fn monthly_climatology(station: &str, start_year: i32, end_year: i32) -> String {
    format!(
        "valores/climatologicos/mensualesanuales/datos/anioini/{start_year}/aniofin/{end_year}/estacion/{station}"
    )
}

pub fn daily_climatology(station: &str, window: &DateWindow) -> String {
    format!(
        "valores/climatologicos/diarios/datos/fechaini/{}/fechafin/{}/estacion/{station}",
        window.start_param(),
        window.end_param()
    )
}

pub fn extreme_values(station: &str, parameter: ExtremeParameter) -> String {
    format!(
        "valores/climatologicos/valoresextremos/parametro/{}/estacion/{station}",
        parameter.code()
    )
}

pub fn normal_values(station: &str) -> String {
    format!("valores/climatologicos/normales/estacion/{station}")
}

pub fn latest_warnings(area: &Area) -> String {
    format!("avisos_cap/ultimoelaborado/area/{}", area.code())
}

pub fn warnings_archive(window: &DateWindow) -> String {
    format!(
        "avisos_cap/archivo/fechaini/{}/fechafin/{}",
        window.start_param(),
        window.end_param()
    )
}

/// Returns the path template registered under `alias`.
///
/// # Errors
///
/// Returns `InvalidInput` naming the known aliases when `alias` is unknown.
pub fn alias_template(alias: &str) -> AppResult<&'static str> {
    ENDPOINT_ALIASES
        .iter()
        .find(|(name, _)| *name == alias)
        .map(|(_, template)| *template)
        .ok_or_else(|| {
            let known: Vec<&str> = ENDPOINT_ALIASES.iter().map(|(n, _)| *n).collect();
            AppError::InvalidInput(format!(
                "Unknown alias '{alias}'. Available aliases: {}",
                known.join(", ")
            ))
        })
}

/// Substitutes every `{name}` placeholder of `template` with `params[name]`.
///
/// # Errors
///
/// Returns `InvalidInput` naming the first placeholder with no value.
pub fn fill_template(template: &str, params: &BTreeMap<String, String>) -> AppResult<String> {
    let regex = ALIAS_PARAM_REGEX.get_or_init(|| {
        Regex::new(ALIAS_PARAM_PATTERN).expect("ALIAS_PARAM_PATTERN is a valid regex pattern")
    });

    if let Some(missing) = regex
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .find(|name| !params.contains_key(name))
    {
        return Err(AppError::InvalidInput(format!(
            "Missing required parameter: {missing} (e.g. --param {missing}=value)"
        )));
    }

    Ok(regex
        .replace_all(template, |c: &Captures| params[&c[1]].clone())
        .into_owned())
}
