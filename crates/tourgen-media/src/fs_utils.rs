//! Placing finished artifacts at their destination.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Create the parent directory of `path` if it is missing.
pub async fn ensure_parent_dir(path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Move `src` to `dst`, overwriting any existing file.
///
/// Scratch directories often live on a different filesystem than the final
/// output, so a failed rename across devices falls back to copying into a
/// `.partial` sibling of `dst` and renaming that into place.
pub async fn place_output(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !src.exists() {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }
    ensure_parent_dir(dst).await?;

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            tracing::debug!(
                src = %src.display(),
                dst = %dst.display(),
                "Rename crosses filesystems, copying instead"
            );
            copy_into_place(src, dst).await
        }
        Err(e) => Err(e.into()),
    }
}

/// EXDEV (18 on Linux and macOS).
fn is_cross_device(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

fn partial_path(dst: &Path) -> PathBuf {
    let mut name = dst.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    dst.with_file_name(name)
}

async fn copy_into_place(src: &Path, dst: &Path) -> MediaResult<()> {
    let partial = partial_path(dst);

    if let Err(e) = fs::copy(src, &partial).await {
        let _ = fs::remove_file(&partial).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&partial, dst).await {
        let _ = fs::remove_file(&partial).await;
        return Err(e.into());
    }

    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(src = %src.display(), error = %e, "Failed to remove source after copy");
    }
    Ok(())
}
