//! Detecting a running sync core through its lockfile.
//!
//! The core keeps its lockfile open for as long as it runs. Shell
//! integrations check it before connecting so that an Explorer or Finder
//! callback does not pay for a connect attempt when the core is not running.

use fs2::FileExt;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use tracing::debug;

/// Check whether the core is running, using the default lockfile location.
pub fn core_running() -> bool {
    match super::paths::lock_file_path() {
        Ok(path) => core_running_at(&path),
        Err(e) => {
            debug!("Cannot locate core lockfile: {}", e);
            false
        }
    }
}

/// Check whether the core holds the lockfile at `path`.
///
/// # Platform Behavior
/// - **Windows**: the file is opened without sharing; a sharing violation
///   means the core has it open
/// - **All platforms**: otherwise an exclusive lock is attempted; contention
///   means the core holds it
pub fn core_running_at(path: &Path) -> bool {
    debug!("Checking if lockfile can be opened exclusively: {}", path.display());

    let mut options = OpenOptions::new();
    options.read(true).write(true);
    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        options.share_mode(0);
    }

    let file = match options.open(path) {
        Ok(file) => file,
        Err(e) if is_sharing_violation(&e) => {
            debug!("Lockfile is opened by another process, core is running");
            return true;
        }
        Err(e) => {
            debug!("Lockfile not available ({}), core is not running", e);
            return false;
        }
    };

    match file.try_lock_exclusive() {
        Ok(()) => {
            let _ = file.unlock();
            debug!("Lockfile is not held, core is not running");
            false
        }
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            debug!("Lockfile is locked, core is running");
            true
        }
        Err(e) => {
            debug!("Unexpected error locking {}: {}", path.display(), e);
            false
        }
    }
}

fn is_sharing_violation(err: &io::Error) -> bool {
    #[cfg(windows)]
    {
        use windows_sys::Win32::Foundation::ERROR_SHARING_VIOLATION;
        err.raw_os_error() == Some(ERROR_SHARING_VIOLATION as i32)
    }

    #[cfg(not(windows))]
    {
        let _ = err;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_lockfile_means_not_running() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!core_running_at(&temp_dir.path().join("crosscloud.lock")));
    }

    #[test]
    fn test_unlocked_lockfile_means_not_running() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("crosscloud.lock");
        std::fs::write(&path, b"").unwrap();

        assert!(!core_running_at(&path));
    }

    #[cfg(unix)]
    #[test]
    fn test_locked_lockfile_means_running() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("crosscloud.lock");
        std::fs::write(&path, b"").unwrap();

        // flock locks belong to the open file description, so a second open
        // in the same process still sees contention.
        let holder = std::fs::File::open(&path).unwrap();
        holder.lock_exclusive().unwrap();

        assert!(core_running_at(&path));

        holder.unlock().unwrap();
        assert!(!core_running_at(&path));
    }
}
