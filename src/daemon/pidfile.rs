// src/daemon/pidfile.rs
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Fixed-path file holding the daemon's process id as decimal text.
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded pid; `None` when the file is missing, unreadable or not a positive number.
    pub fn read(&self) -> Option<u32> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let pid: i64 = raw.trim().parse().ok()?;
        if pid <= 0 {
            return None;
        }
        u32::try_from(pid).ok()
    }

    pub fn write(&self, pid: u32) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, pid.to_string())
    }

    /// Remove the record; a missing file is not an error.
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
