use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why a reported location was rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocationError {
    #[error("location payload must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("location payload is missing `{0}`")]
    MissingField(&'static str),

    #[error("location field `{field}` must be a number, got {found}")]
    NotANumber { field: &'static str, found: String },

    #[error("location field `{field}` is not finite")]
    NotFinite { field: &'static str },

    #[error("location field `{field}` = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// A validated (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Result<Self, LocationError> {
        check_coordinate("lat", lat, 90.0)?;
        check_coordinate("lng", lng, 180.0)?;
        Ok(Self { lat, lng })
    }

    /// Validates a raw `{lat, lng}` payload as sent by a browser client.
    ///
    /// Strings that look like numbers are rejected; the client is expected to
    /// send JSON numbers. Extra fields are ignored.
    pub fn from_payload(payload: &Value) -> Result<Self, LocationError> {
        let object = payload
            .as_object()
            .ok_or_else(|| LocationError::NotAnObject(kind_of(payload)))?;

        let lat = numeric_field(object, "lat")?;
        let lng = numeric_field(object, "lng")?;
        Self::new(lat, lng)
    }
}

fn numeric_field(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<f64, LocationError> {
    let value = object.get(field).ok_or(LocationError::MissingField(field))?;
    value.as_f64().ok_or_else(|| LocationError::NotANumber {
        field,
        found: kind_of(value),
    })
}

fn check_coordinate(field: &'static str, value: f64, limit: f64) -> Result<(), LocationError> {
    if !value.is_finite() {
        return Err(LocationError::NotFinite { field });
    }
    if !(-limit..=limit).contains(&value) {
        return Err(LocationError::OutOfRange {
            field,
            value,
            min: -limit,
            max: limit,
        });
    }
    Ok(())
}

fn kind_of(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(s) => format!("the string {s:?}"),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}
