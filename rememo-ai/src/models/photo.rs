//! Caller-supplied photo references

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque photo identifier
///
/// Callers send either integers or strings. The value is echoed back in the
/// same JSON type and only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhotoId {
    Int(i64),
    Text(String),
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoId::Int(id) => write!(f, "{}", id),
            PhotoId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for PhotoId {
    fn from(id: i64) -> Self {
        PhotoId::Int(id)
    }
}

impl From<&str> for PhotoId {
    fn from(id: &str) -> Self {
        PhotoId::Text(id.to_string())
    }
}

/// A photo to score: identifier plus download location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoInput {
    pub id: PhotoId,
    #[serde(rename = "photoUrl")]
    pub photo_url: String,
}

impl PhotoInput {
    pub fn new(id: impl Into<PhotoId>, photo_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            photo_url: photo_url.into(),
        }
    }
}
