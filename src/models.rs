use crate::constants::*;
use crate::errors::{AppError, AppResult};
use std::fmt;
use std::str::FromStr;

/// Warning area accepted by the CAP warnings endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    code: &'static str,
    name: &'static str,
}

impl Area {
    /// Looks up an area by its AEMET code (`esp` or `61`–`79`).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` listing the valid codes when `code` is unknown.
    pub fn parse(code: &str) -> AppResult<Self> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::InvalidInput("Area code is required".to_string()));
        }
        AREA_CODES
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(code))
            .map(|&(code, name)| Self { code, name })
            .ok_or_else(|| {
                let valid: Vec<&str> = AREA_CODES.iter().map(|(c, _)| *c).collect();
                AppError::InvalidInput(format!(
                    "Area code '{code}' is not valid. Valid codes: {}",
                    valid.join(", ")
                ))
            })
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Returns a human-readable name for the area.
    pub fn display_name(&self) -> &'static str {
        self.name
    }
}

/// Variable requested from the climatological extremes endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremeParameter {
    /// Precipitation
    Precipitation,
    /// Temperature
    Temperature,
    /// Wind
    Wind,
}

impl ExtremeParameter {
    /// Code used in the endpoint path.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Precipitation => "P",
            Self::Temperature => "T",
            Self::Wind => "V",
        }
    }

    /// Parameters requested when the caller does not name any.
    pub fn defaults() -> Vec<Self> {
        DEFAULT_EXTREME_PARAMETERS
            .iter()
            .filter_map(|code| code.parse().ok())
            .collect()
    }
}

impl FromStr for ExtremeParameter {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "P" => Ok(Self::Precipitation),
            "T" => Ok(Self::Temperature),
            "V" => Ok(Self::Wind),
            other => Err(AppError::InvalidInput(format!(
                "Extreme parameter '{other}' is not valid. Valid parameters: P, T, V"
            ))),
        }
    }
}

impl fmt::Display for ExtremeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Checks a list of station identifiers (IDEMA) and returns them trimmed.
///
/// # Errors
///
/// Returns `InvalidInput` if the list is empty or contains a blank identifier.
pub fn validate_stations(stations: &[String]) -> AppResult<Vec<String>> {
    if stations.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one station (IDEMA) is required".to_string(),
        ));
    }
    stations
        .iter()
        .map(|s| {
            let s = s.trim();
            if s.is_empty() {
                Err(AppError::InvalidInput(
                    "Station identifiers must not be blank".to_string(),
                ))
            } else {
                Ok(s.to_string())
            }
        })
        .collect()
}
