//! Property tour generation worker.
//!
//! This crate provides:
//! - Tour generator running plan, render, assemble and branding end to end
//! - Scene rendering dispatch between AI synthesis and pan-zoom
//! - Render concurrency limiter
//! - Job status store and single-writer progress reporting
//! - Environment-driven configuration and job-scoped logging

pub mod branding;
pub mod config;
pub mod error;
pub mod generator;
pub mod limiter;
pub mod logging;
pub mod prompt;
pub mod renderer;
pub mod status;

pub use branding::{BrandingCompositor, PassthroughBranding};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use generator::{TourGenerator, TourOutcome};
pub use limiter::RenderLimiter;
pub use logging::JobLogger;
pub use renderer::{RenderedScene, SceneRenderer};
pub use status::{InMemoryJobStatusStore, JobStatusStore, StatusReporter};
