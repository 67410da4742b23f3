//! Vertex AI (Veo) REST client.
//!
//! Implements [`SynthesisService`] over the long-running prediction API:
//! `predictLongRunning` to submit, `fetchPredictOperation` to poll, and the
//! Cloud Storage JSON API to download finished clips.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::auth::{AccessTokenSource, TokenCache};
use crate::config::SynthConfig;
use crate::error::{SynthError, SynthResult};
use crate::metrics::record_submission;
use crate::service::{OperationHandle, OperationStatus, RenderRequest, SynthesisService};
use crate::types::{
    clip_seconds, FetchOperationRequest, InlineImage, Instance, OperationResponse, Parameters,
    PredictLongRunningRequest, SubmitResponse, VideoReference,
};

/// Vertex AI client for video generation.
#[derive(Clone)]
pub struct VeoClient {
    http: Client,
    config: SynthConfig,
    tokens: Arc<dyn AccessTokenSource>,
}

impl VeoClient {
    pub fn new(config: SynthConfig, tokens: Arc<dyn AccessTokenSource>) -> SynthResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("tourgen-synth/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config, tokens })
    }

    /// Create from environment variables and ambient GCP credentials.
    pub async fn from_env() -> SynthResult<Self> {
        let config = SynthConfig::from_env()?;
        let tokens = TokenCache::from_env().await?;
        Self::new(config, Arc::new(tokens))
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Assemble the request body for one scene.
    ///
    /// With a continuation frame the clip starts from that frame and is asked
    /// to end on the scene image.
    pub async fn build_request(&self, request: &RenderRequest) -> SynthResult<PredictLongRunningRequest> {
        let scene_image = encode_image(&request.image).await?;

        let (image, last_frame) = match &request.continuation_frame {
            Some(frame) => (encode_image(frame).await?, Some(scene_image)),
            None => (scene_image, None),
        };

        Ok(PredictLongRunningRequest {
            instances: vec![Instance {
                prompt: request.prompt.clone(),
                image,
                last_frame,
            }],
            parameters: Parameters {
                duration_seconds: clip_seconds(request.duration),
                aspect_ratio: self.config.aspect_ratio.clone(),
                sample_count: 1,
                storage_uri: self.config.output_gcs_uri.clone(),
            },
        })
    }

    /// POST JSON with a bearer token, retrying once on an expired token.
    async fn post_json<B, R>(&self, url: &str, body: &B) -> SynthResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut response = self.authorized_post(url, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(url = %url, "Access token rejected, refreshing");
            self.tokens.invalidate().await;
            response = self.authorized_post(url, body).await?;
        }

        let response = check_status(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn authorized_post<B: Serialize + Sync>(&self, url: &str, body: &B) -> SynthResult<Response> {
        let token = self.tokens.access_token().await?;
        Ok(self.http.post(url).bearer_auth(token).json(body).send().await?)
    }

    async fn download_gcs(&self, uri: &str, dest: &Path) -> SynthResult<()> {
        let (bucket, object) = VideoReference::gcs_parts(uri)?;
        let url = self.config.storage_object_url(bucket, object);

        let token = self.tokens.access_token().await?;
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let response = check_status(response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!(uri = %uri, bytes = written, "Downloaded clip");
        Ok(())
    }
}

#[async_trait]
impl SynthesisService for VeoClient {
    async fn submit(&self, request: &RenderRequest) -> SynthResult<OperationHandle> {
        let body = self.build_request(request).await?;
        let url = self.config.model_url("predictLongRunning");

        let result: SynthResult<SubmitResponse> = self.post_json(&url, &body).await;
        match result {
            Ok(submitted) if !submitted.name.is_empty() => {
                record_submission("accepted");
                info!(
                    scene_id = %request.scene_id,
                    operation = %submitted.name,
                    duration_seconds = body.parameters.duration_seconds,
                    "Submitted video generation"
                );
                Ok(OperationHandle::new(submitted.name))
            }
            Ok(_) => {
                record_submission("invalid_response");
                Err(SynthError::invalid_response("submission returned an empty operation name"))
            }
            Err(e) => {
                record_submission(e.external_class().map(|c| c.as_str()).unwrap_or("error"));
                Err(e)
            }
        }
    }

    async fn poll(&self, handle: &OperationHandle) -> SynthResult<OperationStatus> {
        let url = self.config.model_url("fetchPredictOperation");
        let body = FetchOperationRequest {
            operation_name: handle.as_str().to_string(),
        };

        let operation: OperationResponse = self.post_json(&url, &body).await?;
        operation.into_status()
    }

    async fn fetch(&self, reference: &VideoReference, dest: &Path) -> SynthResult<()> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        match reference {
            VideoReference::Gcs(uri) => self.download_gcs(uri, dest).await,
            VideoReference::Inline(encoded) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| SynthError::invalid_response(format!("inline video is not base64: {}", e)))?;
                tokio::fs::write(dest, &bytes).await?;
                debug!(bytes = bytes.len(), dest = %dest.display(), "Decoded inline clip");
                Ok(())
            }
        }
    }
}

async fn check_status(response: Response) -> SynthResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(SynthError::from_http_status(
        status.as_u16(),
        format!("{} failed: {}", url, body),
    ))
}

async fn encode_image(path: &Path) -> SynthResult<InlineImage> {
    let bytes = tokio::fs::read(path).await?;
    Ok(InlineImage {
        bytes_base64_encoded: base64::engine::general_purpose::STANDARD.encode(bytes),
        mime_type: image_mime_type(path).to_string(),
    })
}

/// MIME type from the file extension; JPEG when unknown.
pub fn image_mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
