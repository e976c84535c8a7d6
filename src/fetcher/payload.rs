use crate::errors::{AppError, AppResult};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Body of a data URL, classified once when it is decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A JSON array, usually one record per station and period
    Records(Vec<Value>),
    /// A single JSON object
    Record(Map<String, Value>),
    /// Anything that is not a JSON array or object
    Text(String),
}

impl Payload {
    /// Classifies a text body.
    ///
    /// A body that decodes to a JSON string is decoded a second time, since some data
    /// URLs serve JSON wrapped in a string literal.
    pub fn from_text(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
                Ok(Value::Array(items)) => Payload::Records(items),
                Ok(Value::Object(map)) => Payload::Record(map),
                _ => Payload::Text(inner),
            },
            Ok(Value::Array(items)) => Payload::Records(items),
            Ok(Value::Object(map)) => Payload::Record(map),
            Ok(other) => Payload::Text(other.to_string()),
            Err(_) => Payload::Text(body.to_string()),
        }
    }

    /// Flattens the payload into a list of records.
    ///
    /// Text becomes a single `{"contenido": ...}` record.
    pub fn into_records(self) -> Vec<Value> {
        match self {
            Payload::Records(items) => items,
            Payload::Record(map) => vec![Value::Object(map)],
            Payload::Text(text) => {
                let mut map = Map::new();
                map.insert("contenido".to_string(), Value::String(text));
                vec![Value::Object(map)]
            }
        }
    }
}

/// Decodes a body as UTF-8, or as Latin-1 when it is not valid UTF-8.
///
/// Every byte maps to the char with the same code point (ISO-8859-1), so this never
/// fails. AEMET labels some files ISO-8859-15; the few bytes where the two differ
/// (0xA4 is `¤` here, not `€`) are kept as their Latin-1 chars.
pub fn decode_body(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Downloads the document behind a data URL.
///
/// This is a single request with no key rotation: data URLs are pre-signed by the
/// metadata call.
///
/// # Errors
///
/// Returns `NetworkError` on transport failures and non-success statuses.
pub async fn fetch_payload(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> AppResult<Payload> {
    info!(url = url, "Downloading data");

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| AppError::NetworkError(format!("Failed to download {url}: {e}")))?;

    let status = response.status();
    let response = response.error_for_status().map_err(|e| {
        AppError::NetworkError(format!("HTTP {}: Failed to download {url}: {e}", status.as_u16()))
    })?;

    let bytes = response.bytes().await?;
    debug!(url = url, bytes = bytes.len(), "Data downloaded");

    Ok(Payload::from_text(&decode_body(&bytes)))
}
