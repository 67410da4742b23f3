//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use tourgen_models::OutputProfile;

use crate::error::{MediaError, MediaResult};
use crate::filter_graph::FilterGraph;
use crate::progress::{FfmpegProgress, ProgressParser, StderrLine};

/// Diagnostic lines kept from a failed run.
const MAX_DIAGNOSTIC_LINES: usize = 40;

/// One `-i` input with the arguments that precede it.
#[derive(Debug, Clone)]
struct FfmpegInput {
    args: Vec<String>,
    path: PathBuf,
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<FfmpegInput>,
    output: PathBuf,
    /// Output arguments (after the last -i)
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a command with a single input.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self::with_output(output).input(input)
    }

    /// Create a command with no inputs yet; add them with [`FfmpegCommand::input`].
    pub fn with_output(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Append an input file.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(FfmpegInput {
            args: Vec::new(),
            path: path.as_ref().to_path_buf(),
        });
        self
    }

    /// Add an argument before the most recently added input's `-i`.
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        if let Some(input) = self.inputs.last_mut() {
            input.args.push(arg.into());
        }
        self
    }

    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(input) = self.inputs.last_mut() {
            input.args.extend(args.into_iter().map(Into::into));
        }
        self
    }

    /// Add output arguments (after the last -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Seek the most recent input from its end (`-sseof`).
    pub fn seek_from_end(self, seconds: f64) -> Self {
        self.input_arg("-sseof").input_arg(format!("{:.3}", -seconds.abs()))
    }

    /// Limit the output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Set a single-chain video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set a validated filter graph.
    pub fn filter_graph(self, graph: &FilterGraph) -> MediaResult<Self> {
        let rendered = graph.to_ffmpeg()?;
        Ok(self.output_arg("-filter_complex").output_arg(rendered))
    }

    /// Select a stream or filter graph label for the output.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Copy the video stream without re-encoding.
    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Drop audio from the output.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// Encode video the way the output profile prescribes.
    pub fn encode_video(self, profile: &OutputProfile) -> Self {
        self.output_args(profile.video_args())
    }

    /// Encode audio the way the output profile prescribes.
    pub fn encode_audio(self, profile: &OutputProfile) -> Self {
        self.output_args(profile.audio_args())
    }

    /// Relocate the MP4 index to the front of the file.
    pub fn faststart(self) -> Self {
        self.output_arg("-movflags").output_arg("+faststart")
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Path> {
        self.inputs.iter().map(|i| i.path.as_path())
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking and an optional timeout.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Kill the process if it runs longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout_secs(&self) -> Option<u64> {
        self.timeout_secs
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command with progress callback.
    ///
    /// On failure the error carries the last lines FFmpeg printed outside its
    /// progress blocks.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, progress_callback: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr was not captured"))?;
        let mut reader = BufReader::new(stderr).lines();

        let stderr_handle = tokio::spawn(async move {
            let mut parser = ProgressParser::new();
            let mut diagnostics = VecDeque::with_capacity(MAX_DIAGNOSTIC_LINES);

            while let Ok(Some(line)) = reader.next_line().await {
                match parser.feed(&line) {
                    StderrLine::Progress(Some(progress)) => progress_callback(progress),
                    StderrLine::Progress(None) => {}
                    StderrLine::Diagnostic(text) if text.is_empty() => {}
                    StderrLine::Diagnostic(text) => {
                        if diagnostics.len() == MAX_DIAGNOSTIC_LINES {
                            diagnostics.pop_front();
                        }
                        diagnostics.push_back(text);
                    }
                }
            }

            diagnostics.into_iter().collect::<Vec<_>>().join("\n")
        });

        let result = self.wait_for_completion(&mut child).await;
        let diagnostic = stderr_handle.await.unwrap_or_default();

        match result {
            Err(MediaError::FfmpegFailed {
                message, exit_code, ..
            }) => Err(MediaError::ffmpeg_failed(
                message,
                (!diagnostic.is_empty()).then_some(diagnostic),
                exit_code,
            )),
            other => other,
        }
    }

    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<()> {
        let status = match self.timeout_secs {
            Some(timeout_secs) => {
                match tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), child.wait()).await {
                    Ok(status) => status?,
                    Err(_) => {
                        warn!("FFmpeg timed out after {} seconds, killing process", timeout_secs);
                        let _ = child.kill().await;
                        return Err(MediaError::Timeout(timeout_secs));
                    }
                }
            }
            None => child.wait().await?,
        };

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                format!("FFmpeg exited with status {}", status),
                None,
                status.code(),
            ))
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
