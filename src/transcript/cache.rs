//! Reading and writing the `.transcript_cache.json` sidecar file.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::model::TranscriptCache;

pub const CACHE_SUFFIX: &str = ".transcript_cache.json";

/// The cache path for a given media file, e.g. `clip.mp4.transcript_cache.json`.
pub fn cache_path(media_path: &Path) -> PathBuf {
    let mut name = media_path.as_os_str().to_os_string();
    name.push(CACHE_SUFFIX);
    PathBuf::from(name)
}

/// Load a cache only if it exists and its fingerprint matches the media file's
/// current length/mtime. A stale or missing cache returns `Ok(None)`, never an error.
pub fn load_cache(media_path: &Path) -> Result<Option<TranscriptCache>> {
    let path = cache_path(media_path);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)?;
    let cache: TranscriptCache = serde_json::from_str(&content)?;

    if cache.fingerprint != fingerprint(media_path)? {
        return Ok(None);
    }

    Ok(Some(cache))
}

pub fn save_cache(media_path: &Path, cache: &TranscriptCache) -> Result<()> {
    let path = cache_path(media_path);
    let content = serde_json::to_string_pretty(cache)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Cheap identity check: file length plus modification time, in seconds.
pub fn fingerprint(media_path: &Path) -> Result<String> {
    let meta = std::fs::metadata(media_path)?;
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Ok(format!("{}-{}", meta.len(), mtime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::model::Word;

    #[test]
    fn test_cache_roundtrip_preserves_words() {
        let dir = tempfile::tempdir().unwrap();
        let media_path = dir.path().join("clip.mp4");
        std::fs::write(&media_path, b"fake media bytes").unwrap();

        let words = vec![
            Word { text: "hello".into(), start_ms: 0, end_ms: 200, confidence: 0.9 },
            Word { text: "world".into(), start_ms: 200, end_ms: 400, confidence: 0.8 },
        ];
        let fp = fingerprint(&media_path).unwrap();
        let cache = TranscriptCache::new(fp, words.clone(), Some("en".into()));

        save_cache(&media_path, &cache).unwrap();
        let loaded = load_cache(&media_path).unwrap().expect("cache should load");

        assert_eq!(loaded.words, words);
        assert_eq!(loaded.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_stale_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let media_path = dir.path().join("clip.mp4");
        std::fs::write(&media_path, b"version one").unwrap();

        let cache = TranscriptCache::new("stale-fingerprint".into(), vec![], None);
        save_cache(&media_path, &cache).unwrap();

        // Rewriting the file changes its fingerprint (length differs here).
        std::fs::write(&media_path, b"a very different and longer version two").unwrap();

        assert!(load_cache(&media_path).unwrap().is_none());
    }

    #[test]
    fn test_missing_cache_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let media_path = dir.path().join("clip.mp4");
        std::fs::write(&media_path, b"x").unwrap();
        assert!(load_cache(&media_path).unwrap().is_none());
    }
}
