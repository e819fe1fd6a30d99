use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

#[derive(Debug, Serialize, JsonSchema)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_SUCCESS,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DataResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> DataResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS,
            message: None,
            data,
        }
    }

    #[must_use]
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: STATUS_SUCCESS,
            message: Some(message.into()),
            data,
        }
    }
}

/// A number that clients sometimes send as a string.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value).filter(|v| v.is_finite()),
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }
}

/// Treats empty strings the same as a missing field.
#[must_use]
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_accepts_numbers_and_strings() {
        let values: Vec<Numeric> =
            serde_json::from_str(r#"[1.5, "2.25", " 3 ", "abc", ""]"#).expect("parse");
        let parsed: Vec<Option<f64>> = values.iter().map(Numeric::as_f64).collect();
        assert_eq!(parsed, vec![Some(1.5), Some(2.25), Some(3.0), None, None]);
    }

    #[test]
    fn non_empty_filters_blank() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" x ")), Some("x"));
        assert_eq!(non_empty(None), None);
    }
}
