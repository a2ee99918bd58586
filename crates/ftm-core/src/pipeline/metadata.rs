//! Track metadata as returned by the upstream `track-info` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::MetadataError;

/// The upstream's JSON object, kept verbatim so every field reaches the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackMetadata(Map<String, Value>);

impl TrackMetadata {
    /// Parses decoded body text. Anything but a JSON object is rejected.
    pub fn from_json_text(text: &str) -> Result<Self, MetadataError> {
        match serde_json::from_str::<Value>(text).map_err(MetadataError::Json)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(MetadataError::NotAnObject),
        }
    }

    /// A field that is present and not `null`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    /// A field rendered as text: strings as is, other JSON values in JSON form.
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.field(name).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn title(&self) -> Option<String> {
        self.field_text("title")
    }

    pub fn artist(&self) -> Option<String> {
        self.field_text("artist")
    }

    pub fn image(&self) -> Option<String> {
        self.field_text("image")
    }

    pub fn duration(&self) -> Option<String> {
        self.field_text("duration")
    }

    /// Direct media link carried in the metadata: `url`, else `link`.
    pub fn direct_link(&self) -> Option<&str> {
        ["url", "link"]
            .iter()
            .filter_map(|name| self.field(name).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    /// Fails unless both `title` and `artist` are present.
    pub fn require_title_and_artist(&self) -> Result<(), MetadataError> {
        for name in ["title", "artist"] {
            if self.field(name).is_none() {
                return Err(MetadataError::MissingField(name));
            }
        }
        Ok(())
    }
}
