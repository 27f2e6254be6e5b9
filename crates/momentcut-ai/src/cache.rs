//! On-disk cache of extracted candidate moments.
//!
//! Entries are gzip-compressed JSON keyed by a SHA-256 of everything that
//! shapes the model's answer. Unreadable entries are treated as a miss.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use momentcut_models::CandidateMoment;

/// File-backed moment cache.
#[derive(Debug, Clone)]
pub struct MomentCache {
    dir: PathBuf,
}

impl MomentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache key for an extraction request.
    pub fn key(prompt: &str, models: &[String]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        for model in models {
            hasher.update([0u8]);
            hasher.update(model.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json.gz"))
    }

    /// Load cached moments. Returns `None` on a miss or a corrupt entry.
    pub async fn load(&self, key: &str) -> Option<Vec<CandidateMoment>> {
        let path = self.path_for(key);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) => {
                debug!(key, error = %e, "Moment cache miss");
                return None;
            }
        };

        let mut json = String::new();
        if let Err(e) = GzDecoder::new(data.as_slice()).read_to_string(&mut json) {
            warn!(key, error = %e, "Moment cache entry is corrupt, ignoring");
            return None;
        }

        match serde_json::from_str(&json) {
            Ok(moments) => {
                debug!(key, "Moment cache hit");
                Some(moments)
            }
            Err(e) => {
                warn!(key, error = %e, "Moment cache entry is unreadable, ignoring");
                None
            }
        }
    }

    /// Store moments. Failures are logged, never fatal.
    pub async fn store(&self, key: &str, moments: &[CandidateMoment]) {
        if let Err(e) = self.try_store(key, moments).await {
            warn!(key, error = %e, "Failed to write moment cache entry");
        }
    }

    async fn try_store(&self, key: &str, moments: &[CandidateMoment]) -> std::io::Result<()> {
        let json = serde_json::to_vec(moments)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        let compressed = encoder.finish()?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, compressed).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(key, path = %path.display(), "Stored moments in cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_depends_on_models() {
        let a = MomentCache::key("prompt", &["m1".to_string()]);
        let b = MomentCache::key("prompt", &["m2".to_string()]);
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(a, MomentCache::key("prompt", &["m1".to_string()]));
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = MomentCache::new(dir.path().join("cache"));
        let moments = vec![CandidateMoment::new(0, "Hook", 1.5, 12.0)];

        assert!(cache.load("k").await.is_none());
        cache.store("k", &moments).await;
        assert_eq!(cache.load("k").await, Some(moments));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = MomentCache::new(dir.path());
        tokio::fs::write(dir.path().join("bad.json.gz"), b"not gzip")
            .await
            .unwrap();
        assert!(cache.load("bad").await.is_none());
    }
}
