//! Vertex AI wire types for long-running video generation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SynthError, SynthResult};
use crate::service::OperationStatus;

/// Shortest clip the model accepts, in seconds.
pub const MIN_CLIP_SECONDS: u32 = 4;
/// Longest clip the model accepts, in seconds.
pub const MAX_CLIP_SECONDS: u32 = 8;

/// Requested clip length for a scene duration.
pub fn clip_seconds(duration: f64) -> u32 {
    if !duration.is_finite() {
        return MIN_CLIP_SECONDS;
    }
    (duration.ceil().max(0.0) as u32).clamp(MIN_CLIP_SECONDS, MAX_CLIP_SECONDS)
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PredictLongRunningRequest {
    pub instances: Vec<Instance>,
    pub parameters: Parameters,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub prompt: String,
    pub image: InlineImage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_frame: Option<InlineImage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    pub duration_seconds: u32,
    pub aspect_ratio: String,
    pub sample_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOperationRequest {
    pub operation_name: String,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub name: String,
}

/// Long-running operation as returned by `fetchPredictOperation`.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub error: Option<OperationErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

impl OperationResponse {
    /// Interpret the operation.
    ///
    /// A finished operation carrying an error is a failure even when a
    /// response body is present as well.
    pub fn into_status(self) -> SynthResult<OperationStatus> {
        if let Some(error) = self.error {
            if self.done || self.response.is_none() {
                return Ok(OperationStatus::Failed {
                    code: error.code,
                    message: if error.message.is_empty() {
                        "operation reported an error without a message".to_string()
                    } else {
                        error.message
                    },
                });
            }
        }

        if !self.done {
            return Ok(OperationStatus::Pending);
        }

        match self.response {
            Some(body) => Ok(OperationStatus::Succeeded(OperationOutput::parse(&body)?)),
            None => Err(SynthError::invalid_response(format!(
                "operation {} is done but has neither response nor error",
                self.name
            ))),
        }
    }
}

/// One generated video as the service describes it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoBlob {
    #[serde(default, alias = "uri")]
    pub gcs_uri: Option<String>,
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Legacy prediction entry, with the video either inline or nested.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default)]
    pub video: Option<VideoBlob>,
    #[serde(flatten)]
    pub inline: VideoBlob,
}

/// Where a finished clip can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoReference {
    /// `gs://bucket/object`
    Gcs(String),
    /// Base64-encoded bytes returned in the response
    Inline(String),
}

impl VideoReference {
    fn from_blob(blob: &VideoBlob) -> Option<Self> {
        if let Some(uri) = blob.gcs_uri.as_deref().filter(|u| !u.is_empty()) {
            return Some(VideoReference::Gcs(uri.to_string()));
        }
        blob.bytes_base64_encoded
            .as_deref()
            .filter(|b| !b.is_empty())
            .map(|b| VideoReference::Inline(b.to_string()))
    }

    /// Split a `gs://bucket/object` reference.
    pub fn gcs_parts(uri: &str) -> SynthResult<(&str, &str)> {
        let rest = uri
            .strip_prefix("gs://")
            .ok_or_else(|| SynthError::invalid_response(format!("not a gs:// reference: {}", uri)))?;
        match rest.split_once('/') {
            Some((bucket, object)) if !bucket.is_empty() && !object.is_empty() => Ok((bucket, object)),
            _ => Err(SynthError::invalid_response(format!(
                "gs:// reference without bucket or object: {}",
                uri
            ))),
        }
    }
}

/// Result payload of a finished operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    /// Current shape: `{"videos": [...]}`
    Videos(Vec<VideoBlob>),
    /// Legacy shape: `{"predictions": [...]}`
    Predictions(Vec<Prediction>),
}

impl OperationOutput {
    /// Pick the shape by its discriminant key; `videos` wins when both are present.
    pub fn parse(body: &Value) -> SynthResult<Self> {
        let object = body
            .as_object()
            .ok_or_else(|| SynthError::invalid_response("operation response is not an object"))?;

        if let Some(videos) = object.get("videos") {
            let videos: Vec<VideoBlob> = serde_json::from_value(videos.clone())?;
            return Ok(OperationOutput::Videos(videos));
        }
        if let Some(predictions) = object.get("predictions") {
            let predictions: Vec<Prediction> = serde_json::from_value(predictions.clone())?;
            return Ok(OperationOutput::Predictions(predictions));
        }

        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        Err(SynthError::invalid_response(format!(
            "unrecognized operation response shape (keys: {})",
            keys.join(", ")
        )))
    }

    /// The first fetchable clip.
    pub fn first_reference(&self) -> SynthResult<VideoReference> {
        let found = match self {
            OperationOutput::Videos(videos) => videos.iter().find_map(VideoReference::from_blob),
            OperationOutput::Predictions(predictions) => predictions.iter().find_map(|p| {
                p.video
                    .as_ref()
                    .and_then(VideoReference::from_blob)
                    .or_else(|| VideoReference::from_blob(&p.inline))
            }),
        };
        found.ok_or_else(|| SynthError::invalid_response("operation finished without a video"))
    }
}
