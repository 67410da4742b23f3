//! Tests for the Veo client and the render job controller.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tourgen_models::{Room, SceneId};

use crate::auth::StaticToken;
use crate::client::{image_mime_type, VeoClient};
use crate::config::SynthConfig;
use crate::controller::RenderJobController;
use crate::error::{ExternalErrorClass, SynthError, SynthResult};
use crate::job::{RenderJob, RenderJobState};
use crate::retry::{PollConfig, RetryConfig};
use crate::service::{OperationHandle, OperationStatus, RenderRequest, SynthesisService};
use crate::types::{OperationOutput, VideoBlob, VideoReference};

// =============================================================================
// Test Helpers
// =============================================================================

const MODEL_PATH: &str = "/v1/projects/test-project/locations/us-central1/publishers/google/models/veo-3.0-generate-001";

fn test_config(server: &MockServer) -> SynthConfig {
    let mut config = SynthConfig::new("test-project");
    config.api_base = Some(server.uri());
    config.storage_base = server.uri();
    config.timeout = Duration::from_secs(5);
    config
}

fn test_client(server: &MockServer) -> VeoClient {
    VeoClient::new(test_config(server), Arc::new(StaticToken::new("test-token"))).unwrap()
}

fn fast_poll(max_attempts: u32) -> PollConfig {
    PollConfig {
        max_attempts,
        base_delay_ms: 1,
        factor: 1.5,
        max_delay_ms: 5,
        jitter_ms: 0,
    }
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_delay_ms: 1,
        max_delay_ms: 5,
    }
}

fn write_image(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"\xFF\xD8\xFFfake-jpeg").unwrap();
    path
}

fn kitchen_request(image: &Path) -> RenderRequest {
    RenderRequest::new(
        SceneId::for_room(Room::Kitchen, 1),
        image,
        "Slow push-in across the kitchen island",
        5.5,
    )
}

fn videos_output(uri: &str) -> OperationOutput {
    OperationOutput::Videos(vec![VideoBlob {
        gcs_uri: Some(uri.to_string()),
        bytes_base64_encoded: None,
        mime_type: Some("video/mp4".to_string()),
    }])
}

/// Scripted service: each call pops the next queued result.
#[derive(Default)]
struct ScriptedService {
    submits: Mutex<VecDeque<SynthResult<OperationHandle>>>,
    polls: Mutex<VecDeque<SynthResult<OperationStatus>>>,
    submit_calls: AtomicU32,
    poll_calls: AtomicU32,
    fetch_calls: AtomicU32,
}

impl ScriptedService {
    fn new() -> Self {
        Self::default()
    }

    fn submit_result(self, result: SynthResult<OperationHandle>) -> Self {
        self.submits.lock().unwrap().push_back(result);
        self
    }

    fn poll_result(self, result: SynthResult<OperationStatus>) -> Self {
        self.polls.lock().unwrap().push_back(result);
        self
    }
}

#[async_trait]
impl SynthesisService for ScriptedService {
    async fn submit(&self, _request: &RenderRequest) -> SynthResult<OperationHandle> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(OperationHandle::new("operations/default")))
    }

    async fn poll(&self, _handle: &OperationHandle) -> SynthResult<OperationStatus> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(OperationStatus::Pending))
    }

    async fn fetch(&self, _reference: &VideoReference, dest: &Path) -> SynthResult<()> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(dest, b"clip").await?;
        Ok(())
    }
}

fn controller(service: Arc<ScriptedService>, max_polls: u32) -> RenderJobController {
    RenderJobController::new(service, fast_poll(max_polls), fast_retry())
}

// =============================================================================
// Client Tests
// =============================================================================

#[tokio::test]
async fn test_submit_sends_image_and_parameters() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir, "kitchen.jpg");

    Mock::given(method("POST"))
        .and(path(format!("{}:predictLongRunning", MODEL_PATH)))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "instances": [{"prompt": "Slow push-in across the kitchen island",
                           "image": {"mimeType": "image/jpeg"}}],
            "parameters": {"durationSeconds": 6, "aspectRatio": "16:9", "sampleCount": 1}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let handle = test_client(&server).submit(&kitchen_request(&image)).await.unwrap();
    assert_eq!(handle.as_str(), "operations/abc");
}

#[tokio::test]
async fn test_continuation_frame_leads_the_clip() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir, "kitchen.jpg");
    let frame = dir.path().join("living-1_last.png");
    std::fs::write(&frame, b"png-bytes").unwrap();

    let client = test_client(&server);
    let request = kitchen_request(&image).with_continuation(Some(frame));
    let body = client.build_request(&request).await.unwrap();

    let instance = &body.instances[0];
    assert_eq!(instance.image.mime_type, "image/png");
    let last = instance.last_frame.as_ref().unwrap();
    assert_eq!(last.mime_type, "image/jpeg");
}

#[tokio::test]
async fn test_submit_quota_error_is_classified() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir, "kitchen.jpg");

    Mock::given(method("POST"))
        .and(path(format!("{}:predictLongRunning", MODEL_PATH)))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "status": "RESOURCE_EXHAUSTED", "message": "Quota exceeded"}
        })))
        .mount(&server)
        .await;

    let err = test_client(&server).submit(&kitchen_request(&image)).await.unwrap_err();
    assert_eq!(err.external_class(), Some(ExternalErrorClass::Quota));
}

#[tokio::test]
async fn test_poll_parses_finished_operation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}:fetchPredictOperation", MODEL_PATH)))
        .and(body_partial_json(json!({"operationName": "operations/abc"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/abc",
            "done": true,
            "response": {"videos": [{"gcsUri": "gs://tour-bucket/kitchen.mp4", "mimeType": "video/mp4"}]}
        })))
        .mount(&server)
        .await;

    let status = test_client(&server)
        .poll(&OperationHandle::new("operations/abc"))
        .await
        .unwrap();
    assert_eq!(status, OperationStatus::Succeeded(videos_output("gs://tour-bucket/kitchen.mp4")));
}

#[tokio::test]
async fn test_poll_server_error_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}:fetchPredictOperation", MODEL_PATH)))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .poll(&OperationHandle::new("operations/abc"))
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_fetch_downloads_from_storage() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/storage/v1/b/tour-bucket/o/kitchen.mp4"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dest = dir.path().join("clips").join("kitchen-1.mp4");
    test_client(&server)
        .fetch(&VideoReference::Gcs("gs://tour-bucket/kitchen.mp4".into()), &dest)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"mp4-bytes");
}

#[tokio::test]
async fn test_fetch_decodes_inline_video() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("inline.mp4");

    let client = test_client(&server);
    client
        .fetch(&VideoReference::Inline("bXA0LWJ5dGVz".into()), &dest)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"mp4-bytes");

    let err = client
        .fetch(&VideoReference::Inline("not base64!".into()), &dest)
        .await
        .unwrap_err();
    assert!(matches!(err, SynthError::InvalidResponse(_)));
}

#[test]
fn test_image_mime_type() {
    assert_eq!(image_mime_type(Path::new("a.JPG")), "image/jpeg");
    assert_eq!(image_mime_type(Path::new("a.png")), "image/png");
    assert_eq!(image_mime_type(Path::new("a.webp")), "image/webp");
    assert_eq!(image_mime_type(Path::new("noext")), "image/jpeg");
}

// =============================================================================
// Controller Tests
// =============================================================================

#[tokio::test]
async fn test_generate_polls_until_done() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(
        ScriptedService::new()
            .poll_result(Ok(OperationStatus::Pending))
            .poll_result(Ok(OperationStatus::Pending))
            .poll_result(Ok(OperationStatus::Succeeded(videos_output("gs://b/k.mp4")))),
    );

    let dest = dir.path().join("kitchen-1.mp4");
    let job = controller(Arc::clone(&service), 10)
        .generate(&kitchen_request(Path::new("kitchen.jpg")), &dest)
        .await
        .unwrap();

    assert_eq!(job.state(), RenderJobState::Done);
    assert_eq!(job.attempts(), 3);
    assert_eq!(service.poll_calls.load(Ordering::SeqCst), 3);
    assert_eq!(service.fetch_calls.load(Ordering::SeqCst), 1);
    assert!(dest.exists());
}

#[tokio::test]
async fn test_done_with_error_fails_without_fetch() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new().poll_result(Ok(OperationStatus::Failed {
        code: Some(3),
        message: "Image violates usage guidelines".into(),
    })));

    let err = controller(Arc::clone(&service), 10)
        .generate(&kitchen_request(Path::new("kitchen.jpg")), &dir.path().join("k.mp4"))
        .await
        .unwrap_err();

    assert!(matches!(err, SynthError::OperationFailed { code: Some(3), .. }));
    assert_eq!(service.poll_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.fetch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_poll_loop_times_out_after_max_attempts() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new());

    let err = controller(Arc::clone(&service), 4)
        .generate(&kitchen_request(Path::new("kitchen.jpg")), &dir.path().join("k.mp4"))
        .await
        .unwrap_err();

    assert!(matches!(err, SynthError::OperationTimedOut { attempts: 4 }));
    assert_eq!(service.poll_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_transient_poll_errors_consume_attempts() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(
        ScriptedService::new()
            .poll_result(Err(SynthError::transient("HTTP 503")))
            .poll_result(Err(SynthError::transient("HTTP 502")))
            .poll_result(Ok(OperationStatus::Succeeded(videos_output("gs://b/k.mp4")))),
    );

    let job = controller(Arc::clone(&service), 3)
        .generate(&kitchen_request(Path::new("kitchen.jpg")), &dir.path().join("k.mp4"))
        .await
        .unwrap();
    assert_eq!(job.attempts(), 3);

    let service = Arc::new(
        ScriptedService::new()
            .poll_result(Err(SynthError::transient("HTTP 503")))
            .poll_result(Err(SynthError::transient("HTTP 503"))),
    );
    let err = controller(Arc::clone(&service), 2)
        .generate(&kitchen_request(Path::new("kitchen.jpg")), &dir.path().join("k.mp4"))
        .await
        .unwrap_err();
    assert!(matches!(err, SynthError::OperationTimedOut { attempts: 2 }));
}

#[tokio::test]
async fn test_permanent_poll_error_aborts() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(
        ScriptedService::new()
            .poll_result(Ok(OperationStatus::Pending))
            .poll_result(Err(SynthError::external(ExternalErrorClass::Permission, "denied"))),
    );

    let err = controller(Arc::clone(&service), 10)
        .generate(&kitchen_request(Path::new("kitchen.jpg")), &dir.path().join("k.mp4"))
        .await
        .unwrap_err();
    assert_eq!(err.external_class(), Some(ExternalErrorClass::Permission));
    assert_eq!(service.poll_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_submit_retries_transient_but_not_terminal_errors() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(
        ScriptedService::new()
            .submit_result(Err(SynthError::transient("HTTP 500")))
            .submit_result(Ok(OperationHandle::new("operations/ok")))
            .poll_result(Ok(OperationStatus::Succeeded(videos_output("gs://b/k.mp4")))),
    );
    let job = controller(Arc::clone(&service), 5)
        .generate(&kitchen_request(Path::new("kitchen.jpg")), &dir.path().join("k.mp4"))
        .await
        .unwrap();
    assert_eq!(job.operation().as_str(), "operations/ok");
    assert_eq!(service.submit_calls.load(Ordering::SeqCst), 2);

    for class in [
        ExternalErrorClass::Quota,
        ExternalErrorClass::Permission,
        ExternalErrorClass::InvalidArgument,
    ] {
        let service = Arc::new(ScriptedService::new().submit_result(Err(SynthError::external(class, "no"))));
        let err = controller(Arc::clone(&service), 5)
            .generate(&kitchen_request(Path::new("kitchen.jpg")), &dir.path().join("k.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.external_class(), Some(class));
        assert_eq!(service.submit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.poll_calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_empty_result_list_is_invalid_response() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(
        ScriptedService::new().poll_result(Ok(OperationStatus::Succeeded(OperationOutput::Videos(vec![])))),
    );

    let err = controller(Arc::clone(&service), 5)
        .generate(&kitchen_request(Path::new("kitchen.jpg")), &dir.path().join("k.mp4"))
        .await
        .unwrap_err();
    assert!(matches!(err, SynthError::InvalidResponse(_)));
    assert_eq!(service.fetch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_finished_without_clip_marks_job_failed() {
    let service = Arc::new(
        ScriptedService::new()
            .poll_result(Ok(OperationStatus::Pending))
            .poll_result(Ok(OperationStatus::Succeeded(OperationOutput::Predictions(vec![])))),
    );
    let mut job = RenderJob::new(
        SceneId::for_room(Room::Kitchen, 1),
        OperationHandle::new("operations/empty"),
    );

    let err = controller(Arc::clone(&service), 5)
        .poll_until_done(&mut job)
        .await
        .unwrap_err();

    assert!(matches!(err, SynthError::InvalidResponse(_)));
    assert_eq!(job.state(), RenderJobState::Failed);
    assert_eq!(job.attempts(), 2);
}

#[tokio::test]
async fn test_end_to_end_against_mock_service() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir, "kitchen.jpg");

    Mock::given(method("POST"))
        .and(path(format!("{}:predictLongRunning", MODEL_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/e2e"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}:fetchPredictOperation", MODEL_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/e2e",
            "done": true,
            "response": {"predictions": [{"bytesBase64Encoded": "bXA0LWJ5dGVz"}]}
        })))
        .mount(&server)
        .await;

    let controller = RenderJobController::new(Arc::new(test_client(&server)), fast_poll(5), fast_retry());
    let dest = dir.path().join("kitchen-1.mp4");
    let job = controller.generate(&kitchen_request(&image), &dest).await.unwrap();

    assert_eq!(job.state(), RenderJobState::Done);
    assert_eq!(std::fs::read(&dest).unwrap(), b"mp4-bytes");
}
