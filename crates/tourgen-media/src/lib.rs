//! FFmpeg CLI wrapper for tour rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner that captures diagnostics
//! - Structured filter graphs, validated before rendering
//! - Media probing and last-frame extraction
//! - Pan-zoom clips from still images
//! - Timeline assembly with crossfades, audio mixing and ducking
//! - Scoped scratch directories

pub mod command;
pub mod error;
pub mod filter_graph;
pub mod frames;
pub mod fs_utils;
pub mod pan_zoom;
pub mod probe;
pub mod progress;
pub mod scratch;
pub mod timeline;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use filter_graph::{Filter, FilterChain, FilterGraph, MixDuration, ScaleMode};
pub use frames::extract_last_frame;
pub use fs_utils::place_output;
pub use pan_zoom::{default_motion, render_pan_zoom, PanDirection, PanZoomParams, ZoomDirection};
pub use probe::{probe_video, VideoInfo};
pub use progress::FfmpegProgress;
pub use scratch::ScratchDir;
pub use timeline::{
    audio_stage, mux_command, AssemblyReport, AudioStage, TimelineAssembler, TimelineOptions, TransitionStrategy,
    MUSIC_DUCKING_FACTOR,
};
