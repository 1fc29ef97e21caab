use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name used under the platform data directory.
const APP_DIR_NAME: &str = "Conduit";

/// Reports whether the named file or directory exists.
///
/// Only a `NotFound` error counts as missing; a path we can't stat for any
/// other reason (permissions, broken mount) is reported as existing so
/// callers never clobber it.
pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
    match fs::metadata(path.as_ref()) {
        Ok(_) => true,
        Err(e) => e.kind() != io::ErrorKind::NotFound,
    }
}

/// Returns `path` if it is free, otherwise the first `stem (n).ext` that is.
pub fn unique_file_name<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if !file_exists(path) {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u32;
    loop {
        let candidate = path.with_file_name(format!("{} ({}){}", stem, counter, extension));
        if !file_exists(&candidate) {
            debug!(
                "{} exists, using {} instead",
                path.display(),
                candidate.display()
            );
            return candidate;
        }
        counter += 1;
    }
}

/// Default application data directory for conduit.
pub fn default_conduit_dir() -> PathBuf {
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        if let Some(dir) = dirs::data_local_dir() {
            return dir.join(APP_DIR_NAME);
        }
    } else if let Some(home) = dirs::home_dir() {
        return home.join(format!(".{}", APP_DIR_NAME.to_lowercase()));
    }

    PathBuf::from(".").join(format!(".{}", APP_DIR_NAME.to_lowercase()))
}

/// Creates `dir` (and any parents) when it does not exist yet.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> io::Result<()> {
    let dir = dir.as_ref();
    if !file_exists(dir) {
        fs::create_dir_all(dir)?;
        debug!("Created directory {}", dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("present.txt");
        assert!(!file_exists(&path));

        fs::write(&path, b"x").unwrap();
        assert!(file_exists(&path));
        assert!(file_exists(dir.path()));
    }

    #[test]
    fn test_unique_file_name_returns_free_path_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conduit.toml");
        assert_eq!(unique_file_name(&path), path);
    }

    #[test]
    fn test_unique_file_name_counts_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conduit.toml");
        fs::write(&path, b"").unwrap();

        let first = unique_file_name(&path);
        assert_eq!(first, dir.path().join("conduit (1).toml"));

        fs::write(&first, b"").unwrap();
        for n in 2..=11 {
            fs::write(dir.path().join(format!("conduit ({}).toml", n)), b"").unwrap();
        }
        assert_eq!(unique_file_name(&path), dir.path().join("conduit (12).toml"));
    }

    #[test]
    fn test_unique_file_name_without_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logfile");
        fs::write(&path, b"").unwrap();
        assert_eq!(unique_file_name(&path), dir.path().join("logfile (1)"));
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // second call is a no-op
        ensure_dir(&nested).unwrap();
    }

    #[test]
    fn test_default_conduit_dir_is_named_for_app() {
        let dir = default_conduit_dir();
        let name = dir.file_name().unwrap().to_string_lossy().to_lowercase();
        assert!(name.ends_with("conduit"));
    }
}
