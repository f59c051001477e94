//! Content cache: raw page bodies on disk, keyed by the MD5 of the source URL.
//!
//! - One file per source: `<dir>/<md5-hex>.html`.
//! - The file modification time is the write timestamp; no separate metadata.
//! - Entries older than the freshness window (24h) read as absent. Expiry is
//!   lazy: nothing is swept, stale files stay until overwritten or `clear()`.
//! - Lookups fail closed. Missing, stale or unreadable entries are a miss,
//!   only storage failures surface as errors.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};

/// Cached content older than this is refetched.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(24 * 3600);

/// Deterministic fixed-length key for a source identifier (32 hex chars).
/// Shared with the summary store so documents line up with cache entries.
pub fn source_key(source: &str) -> String {
    format!("{:x}", md5::compute(source.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct ContentCache {
    dir: PathBuf,
    freshness: Duration,
}

impl ContentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            freshness: FRESHNESS_WINDOW,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, source: &str) -> PathBuf {
        self.dir.join(format!("{}.html", source_key(source)))
    }

    pub fn lookup(&self, source: &str) -> Result<Option<String>> {
        self.lookup_at(source, SystemTime::now())
    }

    /// Same as `lookup`, evaluated against the given clock.
    pub fn lookup_at(&self, source: &str, now: SystemTime) -> Result<Option<String>> {
        let path = self.path_for(source);
        let meta = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("stat cache entry {}", path.display()))
            }
        };

        let written = meta
            .modified()
            .with_context(|| format!("mtime of cache entry {}", path.display()))?;
        // A timestamp in the future (clock skew) counts as fresh.
        let age = now.duration_since(written).unwrap_or_default();
        if age > self.freshness {
            tracing::debug!(source, age_secs = age.as_secs(), "cache entry stale");
            return Ok(None);
        }

        match fs::read(&path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) => {
                tracing::warn!(source, error = %e, "unreadable cache entry treated as miss");
                Ok(None)
            }
        }
    }

    /// Write (or overwrite) the entry. The rename gives the entry a fresh mtime.
    pub fn store(&self, source: &str, content: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating cache dir {}", self.dir.display()))?;
        let path = self.path_for(source);
        let tmp = path.with_extension("html.tmp");
        write_then_rename(&tmp, &path, content.as_bytes())
            .with_context(|| format!("writing cache entry {}", path.display()))
    }

    /// Drop every entry and leave an empty directory behind.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("removing cache dir {}", self.dir.display()))
            }
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("recreating cache dir {}", self.dir.display()))
    }
}

pub(crate) fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut f = fs::File::create(tmp)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    fs::rename(tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> (tempfile::TempDir, ContentCache) {
        let tmp = tempfile::tempdir().unwrap();
        let c = ContentCache::new(tmp.path().join("cache"));
        (tmp, c)
    }

    #[test]
    fn key_is_stable_hex_digest() {
        let a = source_key("https://a.example");
        assert_eq!(a, source_key("https://a.example"));
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, source_key("https://b.example"));
        // md5("") is a well-known value; guards the on-disk naming scheme
        assert_eq!(source_key(""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn missing_entry_is_a_miss() {
        let (_tmp, c) = cache();
        assert_eq!(c.lookup("https://nowhere.example").unwrap(), None);
    }

    #[test]
    fn second_store_wins() {
        let (_tmp, c) = cache();
        c.store("https://a.example", "<p>first</p>").unwrap();
        c.store("https://a.example", "<p>second</p>").unwrap();
        assert_eq!(
            c.lookup("https://a.example").unwrap().as_deref(),
            Some("<p>second</p>")
        );
        assert!(!c.path_for("https://a.example").with_extension("html.tmp").exists());
    }

    #[test]
    fn entry_older_than_window_reads_as_absent_but_stays_on_disk() {
        let (_tmp, c) = cache();
        c.store("https://a.example", "body").unwrap();

        let in_23h = SystemTime::now() + Duration::from_secs(23 * 3600);
        assert!(c.lookup_at("https://a.example", in_23h).unwrap().is_some());

        let in_25h = SystemTime::now() + Duration::from_secs(25 * 3600);
        assert_eq!(c.lookup_at("https://a.example", in_25h).unwrap(), None);
        assert!(c.path_for("https://a.example").exists());
    }

    #[test]
    fn backdated_file_is_stale() {
        let (_tmp, c) = cache();
        c.store("https://a.example", "body").unwrap();
        let old = SystemTime::now() - Duration::from_secs(24 * 3600 + 60);
        fs::File::options()
            .write(true)
            .open(c.path_for("https://a.example"))
            .unwrap()
            .set_modified(old)
            .unwrap();
        assert_eq!(c.lookup("https://a.example").unwrap(), None);

        // Overwriting resets the clock.
        c.store("https://a.example", "fresh").unwrap();
        assert_eq!(c.lookup("https://a.example").unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn unreadable_fresh_entry_is_a_miss() {
        let (_tmp, c) = cache();
        // A directory in the entry's place stats as fresh but cannot be read.
        fs::create_dir_all(c.path_for("https://a.example")).unwrap();
        assert_eq!(c.lookup("https://a.example").unwrap(), None);
    }

    #[test]
    fn clear_is_safe_when_empty_and_leaves_dir_ready() {
        let (_tmp, c) = cache();
        c.clear().unwrap();
        assert!(c.dir().is_dir());

        c.store("https://a.example", "x").unwrap();
        c.clear().unwrap();
        assert!(c.dir().is_dir());
        assert_eq!(c.lookup("https://a.example").unwrap(), None);

        c.store("https://a.example", "y").unwrap();
        assert_eq!(c.lookup("https://a.example").unwrap().as_deref(), Some("y"));
    }
}
