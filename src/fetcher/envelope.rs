use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use serde_json::Value;

/// Metadata response returned by every OpenData endpoint.
///
/// A successful envelope has `estado == 200` and points at the actual data through
/// `datos`; failures carry a `descripcion`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Envelope {
    pub estado: i64,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub datos: Option<String>,
    #[serde(default)]
    pub metadatos: Option<String>,
}

impl Envelope {
    /// Interprets a decoded response body as an envelope.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the body is not an object with an integer `estado`.
    pub fn from_value(value: Value) -> AppResult<Self> {
        if !value.is_object() {
            return Err(AppError::ParseError(format!(
                "Unexpected AEMET response: {value}"
            )));
        }
        serde_json::from_value(value)
            .map_err(|e| AppError::ParseError(format!("Invalid AEMET envelope: {e}")))
    }

    /// Returns the data URL of a successful envelope.
    ///
    /// # Errors
    ///
    /// Returns `Upstream` when `estado` is not 200 and `MissingDataUrl` when `datos` is
    /// absent or empty.
    pub fn into_data_url(self) -> AppResult<String> {
        if self.estado != 200 {
            return Err(AppError::Upstream {
                status: self.estado,
                description: self
                    .descripcion
                    .unwrap_or_else(|| "Error desconocido".to_string()),
            });
        }
        match self.datos {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(AppError::MissingDataUrl),
        }
    }
}
