// src/daemon/supervisor.rs
//! Single-instance background process management.
//!
//! The PID file plus a liveness probe is the only record of a running daemon.
//! There is no lock file: two `start`s racing between the probe and the PID
//! write can both spawn. That window is accepted.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::pidfile::PidFile;
use super::DaemonError;

/// OS-level process operations, kept behind a trait so the lifecycle rules
/// can be exercised without real processes.
pub trait ProcessControl: Send + Sync {
    /// Start the daemon detached from the terminal with stdout/stderr on `log`.
    fn spawn_detached(&self, log: File) -> io::Result<u32>;
    /// Existence check that does not deliver a real signal.
    fn is_alive(&self, pid: u32) -> bool;
    /// Ask the process to terminate; does not wait for it.
    fn terminate(&self, pid: u32) -> io::Result<()>;
}

/// Spawns `program args..` as the daemon (normally this executable with the
/// hidden `daemon-child` command).
#[derive(Debug, Clone)]
pub struct OsProcess {
    program: PathBuf,
    args: Vec<OsString>,
}

impl OsProcess {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl ProcessControl for OsProcess {
    fn spawn_detached(&self, log: File) -> io::Result<u32> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log.try_clone()?))
            .stderr(Stdio::from(log));
        detach(&mut cmd);
        // The child is not waited on; dropping the handle leaves it running.
        let child = cmd.spawn()?;
        Ok(child.id())
    }

    fn is_alive(&self, pid: u32) -> bool {
        os::is_alive(pid)
    }

    fn terminate(&self, pid: u32) -> io::Result<()> {
        os::terminate(pid)
    }
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // New session: no controlling terminal, survives the parent's exit.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}

#[cfg(unix)]
mod os {
    use std::io;

    pub fn is_alive(pid: u32) -> bool {
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        // Signal 0 only performs the existence/permission check.
        unsafe { libc::kill(pid, 0) == 0 }
    }

    pub fn terminate(pid: u32) -> io::Result<()> {
        let pid = libc::pid_t::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
        if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(not(unix))]
mod os {
    use std::io;
    use sysinfo::{Pid, System};

    pub fn is_alive(pid: u32) -> bool {
        let mut sys = System::new();
        sys.refresh_process(Pid::from_u32(pid))
    }

    pub fn terminate(pid: u32) -> io::Result<()> {
        let pid = Pid::from_u32(pid);
        let mut sys = System::new();
        sys.refresh_process(pid);
        match sys.process(pid) {
            Some(p) if p.kill() => Ok(()),
            Some(_) => Err(io::Error::new(io::ErrorKind::Other, "kill request refused")),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such process")),
        }
    }
}

pub struct ProcessSupervisor<C: ProcessControl> {
    pid_file: PidFile,
    log_path: PathBuf,
    control: C,
}

impl<C: ProcessControl> ProcessSupervisor<C> {
    pub fn new(pid_path: impl Into<PathBuf>, log_path: impl Into<PathBuf>, control: C) -> Self {
        Self {
            pid_file: PidFile::new(pid_path),
            log_path: log_path.into(),
            control,
        }
    }

    pub fn pid_path(&self) -> &Path {
        self.pid_file.path()
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Pid of the live daemon, if any. A record pointing at a dead process
    /// is deleted on the way.
    pub fn status(&self) -> Option<u32> {
        let pid = self.pid_file.read()?;
        if self.control.is_alive(pid) {
            return Some(pid);
        }
        tracing::debug!(pid, "removing stale pid file");
        if let Err(e) = self.pid_file.remove() {
            tracing::warn!(pid, error = %e, "could not remove stale pid file");
        }
        None
    }

    pub fn start(&self) -> Result<u32, DaemonError> {
        if let Some(pid) = self.status() {
            return Err(DaemonError::AlreadyRunning { pid });
        }

        if let Some(dir) = self.log_path.parent() {
            fs::create_dir_all(dir).map_err(|source| DaemonError::LogFile {
                path: self.log_path.clone(),
                source,
            })?;
        }
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|source| DaemonError::LogFile {
                path: self.log_path.clone(),
                source,
            })?;

        let pid = self.control.spawn_detached(log).map_err(DaemonError::Spawn)?;

        if let Err(e) = self.pid_file.write(pid) {
            // Without a record nothing could ever stop this child.
            let _ = self.control.terminate(pid);
            return Err(DaemonError::PidFile(e));
        }
        tracing::info!(pid, log = %self.log_path.display(), "daemon started");
        Ok(pid)
    }

    /// Send the termination request and drop the record; does not wait.
    pub fn stop(&self) -> Result<u32, DaemonError> {
        let pid = self.status().ok_or(DaemonError::NotRunning)?;
        self.control
            .terminate(pid)
            .map_err(|source| DaemonError::Signal { pid, source })?;
        if let Err(e) = self.pid_file.remove() {
            tracing::warn!(pid, error = %e, "could not remove pid file");
        }
        tracing::info!(pid, "daemon stopped");
        Ok(pid)
    }
}
