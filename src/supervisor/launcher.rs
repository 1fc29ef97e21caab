use std::env;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use tokio::process::{Child, Command};

/// Resolves and spawns executables for the supervisor.
///
/// The system implementation searches `PATH`; tests substitute their own to
/// count or fail spawns.
pub trait Launcher: Send + Sync {
    /// Absolute path of `program`, or `None` if it can't be found.
    fn resolve(&self, program: &str) -> Option<PathBuf>;

    fn spawn(&self, command: &mut Command) -> io::Result<Child>;
}

/// Launcher backed by the host `PATH` and OS process creation
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        find_executable(program, env::var_os("PATH").as_deref())
    }

    fn spawn(&self, command: &mut Command) -> io::Result<Child> {
        command.spawn()
    }
}

/// Look `program` up the way a shell would.
///
/// A name containing a path separator is checked as-is; a bare name is
/// searched for in each entry of `search_path`.
pub fn find_executable(program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return executable_candidates(candidate)
            .into_iter()
            .find(|path| is_executable(path));
    }

    env::split_paths(search_path?)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| executable_candidates(&dir.join(program)))
        .find(|path| is_executable(path))
}

#[cfg(windows)]
fn executable_candidates(path: &Path) -> Vec<PathBuf> {
    if path.extension().is_some() {
        vec![path.to_path_buf()]
    } else {
        vec![path.with_extension("exe"), path.to_path_buf()]
    }
}

#[cfg(not(windows))]
fn executable_candidates(path: &Path) -> Vec<PathBuf> {
    vec![path.to_path_buf()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match path.metadata() {
        Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
