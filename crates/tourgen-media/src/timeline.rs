//! Timeline assembly: segment sequencing, audio mixing and final mux.
//!
//! Stages run in order, each as one FFmpeg invocation inside a scratch
//! directory:
//!
//! 1. `video`: normalize every segment and join them with crossfades or cuts
//! 2. `audio_mix`: only with two or more tracks, mix them into one stream
//! 3. `mux`: combine picture and sound, copying the video stream
//!
//! The finished file is then moved to its destination.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use tourgen_models::encoding::PIXEL_FORMAT;
use tourgen_models::{AudioKind, AudioTrack, OutputProfile, VideoSegment};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filter_graph::{Filter, FilterChain, FilterGraph, MixDuration, ScaleMode};
use crate::fs_utils::place_output;
use crate::scratch::ScratchDir;

/// Default crossfade between adjacent segments, in seconds.
pub const DEFAULT_CROSSFADE_SECS: f64 = 0.75;
/// Music gain multiplier while a voiceover plays.
pub const MUSIC_DUCKING_FACTOR: f64 = 0.4;
/// xfade transition name.
const XFADE_TRANSITION: &str = "fade";

/// How adjacent segments are joined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionStrategy {
    Crossfade { duration: f64 },
    HardCut,
}

impl TransitionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionStrategy::Crossfade { .. } => "crossfade",
            TransitionStrategy::HardCut => "hard_cut",
        }
    }
}

/// Assembler settings.
#[derive(Debug, Clone)]
pub struct TimelineOptions {
    pub profile: OutputProfile,
    /// Crossfade length; zero requests hard cuts
    pub crossfade_duration: f64,
    /// Force hard cuts even when crossfades would fit
    pub hard_cuts: bool,
    pub ducking_factor: f64,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            profile: OutputProfile::default(),
            crossfade_duration: DEFAULT_CROSSFADE_SECS,
            hard_cuts: false,
            ducking_factor: MUSIC_DUCKING_FACTOR,
        }
    }
}

/// What the assembler produced.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub output: PathBuf,
    pub strategy: TransitionStrategy,
    /// Expected length of the picture in seconds
    pub duration: f64,
    pub segment_count: usize,
    pub audio_track_count: usize,
}

/// Pick one joining strategy for the whole run.
///
/// Crossfades are used unless disabled or some segment is not longer than
/// the crossfade itself.
pub fn choose_strategy(segments: &[VideoSegment], options: &TimelineOptions) -> TransitionStrategy {
    let c = options.crossfade_duration;
    if options.hard_cuts || segments.len() < 2 || c <= 0.0 {
        return TransitionStrategy::HardCut;
    }
    if segments.iter().any(|s| s.duration <= c) {
        return TransitionStrategy::HardCut;
    }
    TransitionStrategy::Crossfade { duration: c }
}

/// Absolute xfade offsets for each adjacent pair.
///
/// Pair `k` joins segment `k` onto everything before it; its offset is the
/// start of segment `k` on the output timeline.
pub fn crossfade_offsets(durations: &[f64], crossfade: f64) -> Vec<f64> {
    let mut offsets = Vec::with_capacity(durations.len().saturating_sub(1));
    let mut start = 0.0;
    for duration in durations.iter().take(durations.len().saturating_sub(1)) {
        start += (duration - crossfade).max(0.0);
        offsets.push(start);
    }
    offsets
}

/// Length of the joined picture.
pub fn timeline_duration(durations: &[f64], strategy: TransitionStrategy) -> f64 {
    let total: f64 = durations.iter().sum();
    match strategy {
        TransitionStrategy::Crossfade { duration } => {
            total - duration * durations.len().saturating_sub(1) as f64
        }
        TransitionStrategy::HardCut => total,
    }
}

fn normalize_chain(index: usize, segment: &VideoSegment, profile: &OutputProfile, output: &str) -> FilterChain {
    FilterChain::new()
        .input(format!("{}:v", index))
        .filter(Filter::Trim {
            duration: segment.duration,
        })
        .filter(Filter::ResetPts)
        .filter(Filter::Scale {
            width: profile.width,
            height: profile.height,
            mode: ScaleMode::Fit,
        })
        .filter(Filter::Pad {
            width: profile.width,
            height: profile.height,
        })
        .filter(Filter::SetSar)
        .filter(Filter::Fps(profile.fps))
        .filter(Filter::Format(PIXEL_FORMAT.to_string()))
        .output(output)
}

/// Video filter graph ending in `[vout]`.
pub fn build_video_graph(
    segments: &[VideoSegment],
    strategy: TransitionStrategy,
    profile: &OutputProfile,
) -> MediaResult<FilterGraph> {
    if segments.is_empty() {
        return Err(MediaError::invalid_parameters("timeline needs at least one segment"));
    }

    let mut graph = FilterGraph::new();
    if segments.len() == 1 {
        graph.push(normalize_chain(0, &segments[0], profile, "vout"));
        return Ok(graph);
    }

    for (i, segment) in segments.iter().enumerate() {
        graph.push(normalize_chain(i, segment, profile, &format!("v{}", i)));
    }

    match strategy {
        TransitionStrategy::HardCut => {
            let chain = (0..segments.len())
                .fold(FilterChain::new(), |chain, i| chain.input(format!("v{}", i)))
                .filter(Filter::Concat {
                    segments: segments.len(),
                })
                .output("vout");
            graph.push(chain);
        }
        TransitionStrategy::Crossfade { duration } => {
            let durations: Vec<f64> = segments.iter().map(|s| s.duration).collect();
            let offsets = crossfade_offsets(&durations, duration);
            let last = offsets.len();

            let mut previous = "v0".to_string();
            for (k, offset) in offsets.into_iter().enumerate() {
                let pair = k + 1;
                let output = if pair == last {
                    "vout".to_string()
                } else {
                    format!("x{}", pair)
                };
                graph.push(
                    FilterChain::new()
                        .input(previous)
                        .input(format!("v{}", pair))
                        .filter(Filter::XFade {
                            transition: XFADE_TRANSITION.to_string(),
                            duration,
                            offset,
                        })
                        .output(output.clone()),
                );
                previous = output;
            }
        }
    }

    Ok(graph)
}

/// Gain for each track after ducking music under overlapping voiceovers.
pub fn effective_volumes(tracks: &[AudioTrack], ducking_factor: f64) -> Vec<f64> {
    tracks
        .iter()
        .map(|track| {
            let ducked = track.kind == AudioKind::Music
                && tracks
                    .iter()
                    .any(|other| other.kind == AudioKind::Voiceover && track.overlaps(other));
            if ducked {
                track.volume * ducking_factor
            } else {
                track.volume
            }
        })
        .collect()
}

/// Audio mix graph ending in `[aout]`; track `i` is input `i`.
pub fn build_audio_graph(tracks: &[AudioTrack], ducking_factor: f64) -> MediaResult<FilterGraph> {
    if tracks.len() < 2 {
        return Err(MediaError::invalid_parameters(format!(
            "mixing needs at least two tracks, got {}",
            tracks.len()
        )));
    }

    let volumes = effective_volumes(tracks, ducking_factor);
    let mut graph = FilterGraph::new();

    for (i, (track, volume)) in tracks.iter().zip(volumes).enumerate() {
        let mut chain = FilterChain::new().input(format!("{}:a", i));
        if track.duration > 0.0 {
            chain = chain.filter(Filter::ATrim {
                duration: track.duration,
            });
        }
        chain = chain
            .filter(Filter::AResetPts)
            .filter(Filter::Volume(volume))
            .filter(Filter::ADelay {
                millis: (track.start_time.max(0.0) * 1000.0).round() as u64,
            })
            .output(format!("a{}", i));
        graph.push(chain);
    }

    let mix = (0..tracks.len())
        .fold(FilterChain::new(), |chain, i| chain.input(format!("a{}", i)))
        .filter(Filter::AMix {
            inputs: tracks.len(),
            duration: MixDuration::Longest,
        })
        .output("aout");
    graph.push(mix);

    Ok(graph)
}

/// How the tour's sound is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioStage {
    /// No tracks; the joined picture is the final output
    Silent,
    /// A single track, muxed as-is
    Passthrough(PathBuf),
    /// Two or more tracks, mixed into one stream before muxing
    Mix,
}

pub fn audio_stage(tracks: &[AudioTrack]) -> AudioStage {
    match tracks {
        [] => AudioStage::Silent,
        [single] => AudioStage::Passthrough(single.path.clone()),
        _ => AudioStage::Mix,
    }
}

/// Stage 1: normalize and join the segments into a silent picture.
pub fn video_command(
    segments: &[VideoSegment],
    strategy: TransitionStrategy,
    profile: &OutputProfile,
    output: &Path,
) -> MediaResult<FfmpegCommand> {
    let graph = build_video_graph(segments, strategy, profile)?;
    Ok(segments
        .iter()
        .fold(FfmpegCommand::with_output(output), |cmd, s| cmd.input(&s.path))
        .filter_graph(&graph)?
        .map("[vout]")
        .encode_video(profile)
        .no_audio())
}

/// Stage 2: mix two or more tracks into one PCM stream.
pub fn mix_command(tracks: &[AudioTrack], ducking_factor: f64, output: &Path) -> MediaResult<FfmpegCommand> {
    let graph = build_audio_graph(tracks, ducking_factor)?;
    Ok(tracks
        .iter()
        .fold(FfmpegCommand::with_output(output), |cmd, t| cmd.input(&t.path))
        .filter_graph(&graph)?
        .map("[aout]")
        .audio_codec("pcm_s16le"))
}

/// Stage 3: copy the picture, encode the sound, and stop at the end of the picture.
///
/// Audio shorter than the picture leaves the tail silent.
pub fn mux_command(video: &Path, audio: &Path, duration: f64, profile: &OutputProfile, output: &Path) -> FfmpegCommand {
    FfmpegCommand::with_output(output)
        .input(video)
        .input(audio)
        .map("0:v")
        .map("1:a")
        .copy_video()
        .encode_audio(profile)
        .duration(duration)
        .faststart()
}

fn check_exists(path: &Path) -> MediaResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(MediaError::FileNotFound(path.to_path_buf()))
    }
}

/// Reject anything that would make a stage fail before any process runs.
fn preflight(segments: &[VideoSegment], tracks: &[AudioTrack]) -> MediaResult<()> {
    if segments.is_empty() {
        return Err(MediaError::invalid_parameters("timeline needs at least one segment"));
    }
    for segment in segments {
        check_exists(&segment.path)?;
        if !segment.duration.is_finite() || segment.duration <= 0.0 {
            return Err(MediaError::invalid_parameters(format!(
                "segment {} has invalid duration {}",
                segment.scene_id, segment.duration
            )));
        }
    }
    for track in tracks {
        check_exists(&track.path)?;
        let finite = track.volume.is_finite() && track.start_time.is_finite() && track.duration.is_finite();
        if !finite || !(0.0..=1.0).contains(&track.volume) || track.start_time < 0.0 || track.duration < 0.0 {
            return Err(MediaError::invalid_parameters(format!(
                "audio track {} has invalid timing or volume",
                track.path.display()
            )));
        }
    }
    Ok(())
}

/// Joins rendered segments and audio tracks into the final video.
#[derive(Debug, Clone)]
pub struct TimelineAssembler {
    options: TimelineOptions,
    runner: FfmpegRunner,
    work_root: PathBuf,
}

impl TimelineAssembler {
    pub fn new(options: TimelineOptions, work_root: impl Into<PathBuf>) -> Self {
        Self {
            options,
            runner: FfmpegRunner::new(),
            work_root: work_root.into(),
        }
    }

    pub fn with_runner(mut self, runner: FfmpegRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn options(&self) -> &TimelineOptions {
        &self.options
    }

    /// Assemble `segments` (in order) with `tracks` into `output`.
    pub async fn assemble(
        &self,
        segments: &[VideoSegment],
        tracks: &[AudioTrack],
        output: impl AsRef<Path>,
    ) -> MediaResult<AssemblyReport> {
        let output = output.as_ref();
        preflight(segments, tracks)?;

        let scratch = ScratchDir::create(&self.work_root, "timeline").await?;
        let profile = &self.options.profile;

        let strategy = choose_strategy(segments, &self.options);
        let durations: Vec<f64> = segments.iter().map(|s| s.duration).collect();
        let duration = timeline_duration(&durations, strategy);
        if segments.len() > 1 && strategy == TransitionStrategy::HardCut && !self.options.hard_cuts {
            warn!(
                crossfade = self.options.crossfade_duration,
                "A segment is too short to crossfade, using hard cuts"
            );
        }
        info!(
            segments = segments.len(),
            tracks = tracks.len(),
            strategy = strategy.as_str(),
            duration,
            "Assembling timeline"
        );

        // Stage 1: picture
        let video_path = scratch.join("video.mp4");
        let cmd = video_command(segments, strategy, profile, &video_path)?;
        let expected_ms = (duration * 1000.0) as i64;
        self.runner
            .run_with_progress(&cmd, move |progress| {
                debug!(percent = progress.percentage(expected_ms), "Video stage progress");
            })
            .await
            .map_err(|e| e.at_stage("video"))?;

        // Stage 2: sound
        let audio_path = match audio_stage(tracks) {
            AudioStage::Silent => None,
            AudioStage::Passthrough(path) => Some(path),
            AudioStage::Mix => {
                let mix_path = scratch.join("mix.wav");
                let cmd = mix_command(tracks, self.options.ducking_factor, &mix_path)?;
                self.runner
                    .run(&cmd)
                    .await
                    .map_err(|e| e.at_stage("audio_mix"))?;
                Some(mix_path)
            }
        };

        // Stage 3: mux
        let final_path = match audio_path {
            None => video_path,
            Some(audio_path) => {
                let muxed = scratch.join("tour.mp4");
                let cmd = mux_command(&video_path, &audio_path, duration, profile, &muxed);
                self.runner.run(&cmd).await.map_err(|e| e.at_stage("mux"))?;
                muxed
            }
        };

        place_output(&final_path, output)
            .await
            .map_err(|e| e.at_stage("finalize"))?;

        info!(output = %output.display(), "Timeline assembled");
        Ok(AssemblyReport {
            output: output.to_path_buf(),
            strategy,
            duration,
            segment_count: segments.len(),
            audio_track_count: tracks.len(),
        })
    }
}
