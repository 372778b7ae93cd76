//! Locating and launching external programs.
//!
//! [`launch`] resolves an argument vector's program name and spawns it with
//! inherited standard streams, returning a [`ChildHandle`] immediately. The
//! handle is reaped at most once via [`ChildHandle::wait`], which move
//! semantics enforce at compile time.

use crate::env::Environment;
use anyhow::Result;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::debug;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Why a program could not be started.
#[derive(Debug)]
pub enum SpawnError {
    /// The program name resolves to no executable, through PATH or as a path.
    NotFound(String),
    /// The OS process-creation primitive failed.
    Io(String, std::io::Error),
}

impl std::fmt::Display for SpawnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpawnError::NotFound(name) => write!(f, "command not found: {}", name),
            SpawnError::Io(name, err) => write!(f, "cannot run {}: {}", name, err),
        }
    }
}

impl std::error::Error for SpawnError {}

/// A spawned child process paired with the command line that produced it.
///
/// The handle owns the OS process until [`ChildHandle::wait`] consumes it.
/// A dropped, unreaped handle leaves the child running detached.
pub struct ChildHandle {
    child: Child,
    command_line: String,
}

impl ChildHandle {
    /// The argument vector joined by single spaces.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// OS process id of the child.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Block until the child terminates and return its exit code.
    ///
    /// A child killed by a signal reports `128 + signal`.
    pub fn wait(mut self) -> Result<ExitCode> {
        let status = self.child.wait()?;
        Ok(match status.code() {
            Some(code) => code,
            None => terminated_by_signal(status),
        })
    }
}

/// Spawn `words` as an external process with inherited standard streams.
///
/// `words` is the full argument vector, program name first, and must be
/// non-empty. The call returns as soon as the child is running; the caller
/// owns the handle and must reap it exactly once.
pub fn launch(words: &[String], env: &Environment) -> std::result::Result<ChildHandle, SpawnError> {
    let name = &words[0];
    let search_paths = env.get_var("PATH").unwrap_or_default();
    let resolved = find_command_path(OsStr::new(&search_paths), Path::new(name))
        .ok_or_else(|| SpawnError::NotFound(name.clone()))?
        .into_owned();

    let child = Command::new(&resolved)
        .args(&words[1..])
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir)
        .spawn()
        .map_err(|e| SpawnError::Io(name.clone(), e))?;

    debug!(pid = child.id(), command = %words.join(" "), "spawned");

    Ok(ChildHandle {
        child,
        command_line: words.join(" "),
    })
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Absolute paths and relative paths with separators are checked directly;
/// a `./`-prefixed path resolves against the current directory; a single
/// bare component is searched through each directory in `search_paths`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.as_os_str().is_empty() {
        return None;
    }
    if path.is_absolute() {
        return path.exists().then(|| Cow::Borrowed(path));
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    if path.components().nth(1).is_some() {
        // Multiple components, e.g. bin/sh: resolve against the current dir.
        return path.exists().then(|| Cow::Borrowed(path));
    }

    find_in_path(search_paths, path.as_os_str()).map(Cow::Owned)
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| candidate.exists())
}
