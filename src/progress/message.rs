//! Typed shape of one progress object from a pull or build stream.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Byte counters for a single layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

/// Structured error attached to a failing event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Auxiliary payload; a finished build reports the image id here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aux {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Other aux keys, such as a pushed `Digest`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One decoded event. Every field is optional; fields the engine sends that
/// are not modelled here are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_detail: Option<ProgressDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<ErrorDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aux: Option<Aux>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgressMessage {
    /// Error text carried by the event, if it is an error event.
    ///
    /// `error` wins over `errorDetail.message`. An `errorDetail` with no
    /// message still marks the event as failed.
    pub fn error_message(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        self.error_detail.as_ref().map(|detail| {
            detail
                .message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string())
        })
    }

    /// The built image id, when this is the final `aux` event of a build.
    pub fn built_image_id(&self) -> Option<&str> {
        self.aux.as_ref().and_then(|aux| aux.id.as_deref())
    }
}
