//! Filesystem helpers for writing clips in place.
//!
//! Clips are written to a `.partial` sibling and renamed over the final path
//! once verified, so a failed or interrupted cut never leaves a truncated file
//! under the final name.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Sibling path used while a clip is being written: `name.partial.ext`.
///
/// The real extension is kept last so FFmpeg still picks the right muxer.
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{stem}.partial.{}", ext.to_string_lossy()),
        None => format!("{stem}.partial"),
    };
    output.with_file_name(name)
}

/// Size of a file, or zero if it does not exist.
pub async fn file_size(path: &Path) -> MediaResult<u64> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Remove a file if present.
pub async fn remove_if_exists(path: &Path) -> MediaResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Check that `path` holds a non-empty file.
pub async fn ensure_non_empty(path: &Path) -> MediaResult<u64> {
    match file_size(path).await? {
        0 => Err(MediaError::EmptyOutput(path.to_path_buf())),
        size => Ok(size),
    }
}

/// Replace `dst` with `src`. Both live in the same directory.
pub async fn promote(src: &Path, dst: &Path) -> MediaResult<()> {
    fs::rename(src, dst).await.map_err(|e| {
        tracing::error!(
            "Failed to move finished clip into place: {} -> {}: {}",
            src.display(),
            dst.display(),
            e
        );
        MediaError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/out/001_intro.mp4")),
            PathBuf::from("/out/001_intro.partial.mp4")
        );
        assert_eq!(partial_path(Path::new("clip")), PathBuf::from("clip.partial"));
    }

    #[tokio::test]
    async fn test_promote_overwrites() {
        let dir = TempDir::new().unwrap();
        let final_path = dir.path().join("000_a.mp4");
        let partial = partial_path(&final_path);

        fs::write(&final_path, b"old").await.unwrap();
        fs::write(&partial, b"new clip").await.unwrap();

        assert_eq!(ensure_non_empty(&partial).await.unwrap(), 8);
        promote(&partial, &final_path).await.unwrap();

        assert_eq!(fs::read(&final_path).await.unwrap(), b"new clip");
        assert_eq!(file_size(&partial).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_and_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.mp4");
        assert!(matches!(ensure_non_empty(&path).await, Err(MediaError::EmptyOutput(_))));

        fs::write(&path, b"").await.unwrap();
        assert!(matches!(ensure_non_empty(&path).await, Err(MediaError::EmptyOutput(_))));

        remove_if_exists(&path).await.unwrap();
        remove_if_exists(&path).await.unwrap();
    }
}
