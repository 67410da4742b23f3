//! Shared data models for the property tour generator.
//!
//! This crate provides Serde-serializable types for:
//! - Rooms and image descriptors
//! - Scenes and scene plans
//! - Rendered video segments and audio tracks
//! - Output encoding profile
//! - Tour requests, job ids and job status

pub mod encoding;
pub mod image;
pub mod job;
pub mod job_status;
pub mod media;
pub mod room;
pub mod scene;

// Re-export common types
pub use encoding::OutputProfile;
pub use image::ImageDescriptor;
pub use job::{JobId, TourRequest};
pub use job_status::{TourJobState, TourJobStatus};
pub use media::{AudioKind, AudioTrack, VideoSegment};
pub use room::{Room, RoomParseError};
pub use scene::{Scene, SceneId, ScenePlan, Technique, TechniqueParseError};
