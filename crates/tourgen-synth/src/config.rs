//! Vertex AI client configuration.

use std::time::Duration;

use crate::error::{SynthError, SynthResult};
use crate::retry::{PollConfig, RetryConfig};

pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_MODEL: &str = "veo-3.0-generate-001";
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";
pub const DEFAULT_STORAGE_BASE: &str = "https://storage.googleapis.com";

/// Configuration for the Veo client and its render controller.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// GCP project ID
    pub project_id: String,
    /// Vertex AI region
    pub location: String,
    /// Publisher model ID
    pub model: String,
    /// Override for the regional Vertex AI endpoint
    pub api_base: Option<String>,
    /// Cloud Storage JSON API endpoint
    pub storage_base: String,
    /// Bucket prefix the service writes clips to; inline bytes when unset
    pub output_gcs_uri: Option<String>,
    pub aspect_ratio: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub poll: PollConfig,
    pub retry: RetryConfig,
}

impl SynthConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: DEFAULT_LOCATION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_base: None,
            storage_base: DEFAULT_STORAGE_BASE.to_string(),
            output_gcs_uri: None,
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            poll: PollConfig::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> SynthResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .map_err(|_| SynthError::config("GCP_PROJECT_ID must be set to use Vertex AI"))?;
        if project_id.trim().is_empty() {
            return Err(SynthError::config("GCP_PROJECT_ID cannot be empty"));
        }

        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let timeout_secs: u64 = non_empty("VEO_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let mut config = Self::new(project_id);
        config.location = non_empty("VEO_LOCATION").unwrap_or(config.location);
        config.model = non_empty("VEO_MODEL").unwrap_or(config.model);
        config.api_base = non_empty("VEO_API_BASE");
        config.storage_base = non_empty("VEO_STORAGE_BASE").unwrap_or(config.storage_base);
        config.output_gcs_uri = non_empty("VEO_OUTPUT_GCS_URI");
        config.aspect_ratio = non_empty("VEO_ASPECT_RATIO").unwrap_or(config.aspect_ratio);
        config.timeout = Duration::from_secs(timeout_secs.max(1));
        config.poll = PollConfig::from_env();
        config.retry = RetryConfig::from_env();
        Ok(config)
    }

    /// Vertex AI endpoint, regional unless overridden.
    pub fn api_base(&self) -> String {
        match &self.api_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }

    /// URL of a model method such as `predictLongRunning`.
    pub fn model_url(&self, method: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
            self.api_base(),
            self.project_id,
            self.location,
            self.model,
            method
        )
    }

    /// Media download URL for a Cloud Storage object.
    pub fn storage_object_url(&self, bucket: &str, object: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.storage_base.trim_end_matches('/'),
            urlencoding::encode(bucket),
            urlencoding::encode(object)
        )
    }
}
