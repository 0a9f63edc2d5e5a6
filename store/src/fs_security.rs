//! Owner-only permissions for the database file and its directory.

use std::fs::{self, OpenOptions};
use std::path::Path;
#[cfg(unix)]
use std::path::PathBuf;

use anyhow::{Context, Result};

#[cfg(unix)]
const DIR_MODE: u32 = 0o700;
#[cfg(unix)]
const FILE_MODE: u32 = 0o600;

/// Create the database file and its parent directory if missing, then limit
/// both, plus any SQLite `-wal`/`-shm` sidecars, to the current user.
pub(crate) fn prepare_database_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
        #[cfg(unix)]
        {
            restrict(parent, DIR_MODE)?;
        }
    }

    let mut options = OpenOptions::new();
    options.create(true).truncate(false).read(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    options
        .open(path)
        .with_context(|| format!("Failed to create database file: {}", path.display()))?;

    #[cfg(unix)]
    {
        restrict(path, FILE_MODE)?;
        for sidecar in sidecars(path) {
            if sidecar.exists() {
                restrict(&sidecar, FILE_MODE)?;
            }
        }
    }
    Ok(())
}

/// Set `mode` on `path` unless it is already exactly that. Paths owned by
/// another user are left untouched.
#[cfg(unix)]
fn restrict(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};

    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
    // SAFETY: getuid has no preconditions and cannot fail.
    let uid = unsafe { libc::getuid() };
    if metadata.uid() != uid {
        tracing::debug!(path = %path.display(), "Not restricting permissions on foreign path");
        return Ok(());
    }
    if metadata.permissions().mode() & 0o777 == mode {
        return Ok(());
    }
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to restrict permissions: {}", path.display()))
}

#[cfg(unix)]
fn sidecars(path: &Path) -> [PathBuf; 2] {
    ["-wal", "-shm"].map(|suffix| {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        name.into()
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::prepare_database_path;

    #[cfg(unix)]
    #[test]
    fn sidecar_names_follow_sqlite_convention() {
        let [wal, shm] = super::sidecars(Path::new("/tmp/a/store.db"));
        assert_eq!(wal, Path::new("/tmp/a/store.db-wal"));
        assert_eq!(shm, Path::new("/tmp/a/store.db-shm"));
    }

    #[test]
    fn creates_missing_directories_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");
        prepare_database_path(&path).unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn restricts_permissions_to_owner() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("state");
        let path = parent.join("store.db");
        fs::create_dir_all(&parent).unwrap();
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(parent.join("store.db-wal"), b"").unwrap();
        fs::set_permissions(parent.join("store.db-wal"), fs::Permissions::from_mode(0o644))
            .unwrap();

        prepare_database_path(&path).unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), 0o600);
        assert_eq!(mode(&parent), 0o700);
        assert_eq!(mode(&parent.join("store.db-wal")), 0o600);
    }
}
