//! Render job controller for AI video synthesis.
//!
//! Drives one long-running Vertex AI (Veo) generation per scene:
//! - Submission with bounded retry, failing fast on quota/permission/argument errors
//! - Polling with capped exponential backoff and jitter
//! - Response parsing for both the `videos` and legacy `predictions` shapes
//! - Clip download and final-frame extraction for continuity

pub mod auth;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod job;
pub mod metrics;
pub mod retry;
pub mod service;
pub mod types;

#[cfg(test)]
mod client_tests;

pub use auth::{AccessTokenSource, StaticToken, TokenCache};
pub use client::VeoClient;
pub use config::SynthConfig;
pub use controller::{RenderJobController, RenderedClip};
pub use error::{ExternalErrorClass, SynthError, SynthResult};
pub use job::{RenderJob, RenderJobState};
pub use retry::{PollConfig, RetryConfig};
pub use service::{OperationHandle, OperationStatus, RenderRequest, SynthesisService};
pub use types::{OperationOutput, VideoReference};
