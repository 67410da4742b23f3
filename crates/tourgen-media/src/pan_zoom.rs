//! Pan and zoom ("Ken Burns") effect over a still image.
//!
//! Parameters are derived from the room unless the caller overrides the
//! motion. Rendering builds a `zoompan` filter chain and runs FFmpeg once.

use std::path::Path;
use tracing::{debug, info};

use tourgen_models::encoding::PIXEL_FORMAT;
use tourgen_models::{OutputProfile, Room};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filter_graph::{Filter, FilterChain, ScaleMode};

/// Scale at the wide end of a zoom.
pub const ZOOM_MIN: f64 = 1.0;
/// Scale at the tight end of a zoom.
pub const ZOOM_MAX: f64 = 1.15;
/// Share of the available travel a pan covers.
pub const PAN_TRAVEL: f64 = 0.15;
/// The still is upscaled by this factor before zooming to avoid sub-pixel jitter.
pub const SUPERSAMPLE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Start and end scale.
    pub fn scale_range(&self) -> (f64, f64) {
        match self {
            ZoomDirection::In => (ZOOM_MIN, ZOOM_MAX),
            ZoomDirection::Out => (ZOOM_MAX, ZOOM_MIN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Left,
    Right,
    Up,
    Down,
    None,
}

impl PanDirection {
    /// Start and end crop offsets as fractions of the available travel, for x then y.
    pub fn offset_range(&self) -> ((f64, f64), (f64, f64)) {
        let centre = (0.5, 0.5);
        let forward = (0.5 - PAN_TRAVEL / 2.0, 0.5 + PAN_TRAVEL / 2.0);
        let backward = (forward.1, forward.0);
        match self {
            PanDirection::Left => (backward, centre),
            PanDirection::Right => (forward, centre),
            PanDirection::Up => (centre, backward),
            PanDirection::Down => (centre, forward),
            PanDirection::None => (centre, centre),
        }
    }
}

/// Default camera motion per room.
pub fn default_motion(room: Room) -> (ZoomDirection, PanDirection) {
    match room {
        Room::Exterior => (ZoomDirection::In, PanDirection::Right),
        Room::Entry => (ZoomDirection::In, PanDirection::None),
        Room::Living => (ZoomDirection::In, PanDirection::Right),
        Room::Kitchen => (ZoomDirection::In, PanDirection::Left),
        Room::Bedroom => (ZoomDirection::Out, PanDirection::None),
        Room::Bathroom => (ZoomDirection::In, PanDirection::Up),
        Room::Backyard => (ZoomDirection::Out, PanDirection::Right),
        Room::Unknown => (ZoomDirection::In, PanDirection::None),
    }
}

/// Fully resolved effect parameters for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct PanZoomParams {
    pub zoom: ZoomDirection,
    pub pan: PanDirection,
    pub zoom_start: f64,
    pub zoom_end: f64,
    pub x_start: f64,
    pub x_end: f64,
    pub y_start: f64,
    pub y_end: f64,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl PanZoomParams {
    /// Compute parameters for an explicit motion.
    pub fn new(
        zoom: ZoomDirection,
        pan: PanDirection,
        duration: f64,
        width: u32,
        height: u32,
        fps: u32,
    ) -> MediaResult<Self> {
        let (zoom_start, zoom_end) = zoom.scale_range();
        let ((x_start, x_end), (y_start, y_end)) = pan.offset_range();

        let params = Self {
            zoom,
            pan,
            zoom_start,
            zoom_end,
            x_start,
            x_end,
            y_start,
            y_end,
            duration,
            width,
            height,
            fps,
        };
        params.validate()?;
        Ok(params)
    }

    /// Compute parameters from the room's default motion and the output profile.
    pub fn for_room(room: Room, duration: f64, profile: &OutputProfile) -> MediaResult<Self> {
        let (zoom, pan) = default_motion(room);
        Self::new(zoom, pan, duration, profile.width, profile.height, profile.fps)
    }

    pub fn validate(&self) -> MediaResult<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(MediaError::invalid_parameters(format!(
                "pan-zoom duration must be finite and positive, got {}",
                self.duration
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(MediaError::invalid_parameters(format!(
                "pan-zoom size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(MediaError::invalid_parameters("pan-zoom fps must be positive"));
        }
        Ok(())
    }

    /// Frames in the clip.
    pub fn frames(&self) -> u32 {
        ((self.duration * self.fps as f64).round() as u32).max(1)
    }

    /// Expression interpolating linearly from `start` to `end` over the clip.
    fn lerp_expr(&self, start: f64, end: f64) -> String {
        let steps = self.frames().saturating_sub(1).max(1);
        format!("{:.4}+({:.4})*on/{}", start, end - start, steps)
    }

    /// Filters turning one still frame into the animated clip.
    pub fn filters(&self) -> Vec<Filter> {
        let (work_w, work_h) = (self.width * SUPERSAMPLE, self.height * SUPERSAMPLE);
        vec![
            Filter::Scale {
                width: work_w,
                height: work_h,
                mode: ScaleMode::Cover,
            },
            Filter::Crop {
                width: work_w,
                height: work_h,
            },
            Filter::ZoomPan {
                zoom: self.lerp_expr(self.zoom_start, self.zoom_end),
                x: format!("(iw-iw/zoom)*({})", self.lerp_expr(self.x_start, self.x_end)),
                y: format!("(ih-ih/zoom)*({})", self.lerp_expr(self.y_start, self.y_end)),
                frames: self.frames(),
                width: self.width,
                height: self.height,
                fps: self.fps,
            },
            Filter::SetSar,
            Filter::Format(PIXEL_FORMAT.to_string()),
        ]
    }
}

/// Build the FFmpeg command rendering `image` to `output`.
pub fn pan_zoom_command(
    image: &Path,
    output: &Path,
    params: &PanZoomParams,
    profile: &OutputProfile,
) -> MediaResult<FfmpegCommand> {
    params.validate()?;
    let filter = FilterChain::new().filters(params.filters()).to_simple()?;

    Ok(FfmpegCommand::new(image, output)
        .video_filter(filter)
        .output_arg("-frames:v")
        .output_arg(params.frames().to_string())
        .output_arg("-r")
        .output_arg(params.fps.to_string())
        .encode_video(profile)
        .no_audio())
}

/// Render a pan-zoom clip from a still image.
pub async fn render_pan_zoom(
    image: impl AsRef<Path>,
    output: impl AsRef<Path>,
    params: &PanZoomParams,
    profile: &OutputProfile,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let image = image.as_ref();
    let output = output.as_ref();

    let cmd = pan_zoom_command(image, output, params, profile)?;
    if !image.exists() {
        return Err(MediaError::FileNotFound(image.to_path_buf()));
    }

    debug!(
        zoom = ?params.zoom,
        pan = ?params.pan,
        frames = params.frames(),
        "Rendering pan-zoom clip"
    );
    runner.run(&cmd).await?;

    info!(
        image = %image.display(),
        output = %output.display(),
        duration = params.duration,
        "Rendered pan-zoom clip"
    );
    Ok(())
}
