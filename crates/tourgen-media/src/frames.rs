//! Still-frame extraction.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// How far before the end of the clip decoding starts.
const LAST_FRAME_WINDOW_SECS: f64 = 0.5;

/// Build the command that writes the final frame of `video_path` to `output_path`.
///
/// Decoding starts shortly before the end and every decoded frame overwrites
/// the same image, so the file left behind is the last frame.
pub fn last_frame_command(video_path: &Path, output_path: &Path) -> FfmpegCommand {
    FfmpegCommand::with_output(output_path)
        .input(video_path)
        .seek_from_end(LAST_FRAME_WINDOW_SECS)
        .output_args(["-update", "1", "-q:v", "2"])
        .no_audio()
}

/// Extract the final frame of a video as an image.
pub async fn extract_last_frame(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let video_path = video_path.as_ref();
    let output_path = output_path.as_ref();

    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    runner.run(&last_frame_command(video_path, output_path)).await?;

    if !output_path.exists() {
        return Err(MediaError::InvalidVideo(format!(
            "no frame could be decoded from {}",
            video_path.display()
        )));
    }
    Ok(())
}
