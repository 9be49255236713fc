use super::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Mount namespace handle of the current process.
pub const SELF_MOUNT_NAMESPACE: &str = "/proc/self/ns/mnt";

/// Location of the init process' mount namespace relative to a proc mount.
const INIT_MOUNT_NAMESPACE: &str = "1/ns/mnt";

/// Returns the path of the host init process' mount namespace handle.
///
/// # Arguments
///
/// * `host_proc_dir` - Path where the host's `/proc` is mounted (e.g., `/rootfs/proc`).
pub fn host_mount_namespace(host_proc_dir: impl AsRef<Path>) -> PathBuf {
    host_proc_dir.as_ref().join(INIT_MOUNT_NAMESPACE)
}

/// Verifies that the host's mount namespace handle exists below `host_proc_dir`.
///
/// # Returns
///
/// The path of the namespace handle, as passed to `nsenter --mount`.
///
/// # Errors
///
/// * [`Error::ExistenceCheck`] if the existence check itself fails.
/// * [`Error::MissingMountNamespace`] if the handle does not exist.
pub fn check_host_mount_namespace(host_proc_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let path = host_mount_namespace(host_proc_dir);
    // Namespace handles are magic links, do not follow them.
    match fs::symlink_metadata(&path) {
        Ok(_) => Ok(path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::MissingMountNamespace { path })
        }
        Err(source) => Err(Error::ExistenceCheck { path, source }),
    }
}

/// Returns true if the namespace handles `self_ns` and `host_ns` point to
/// different mount namespaces.
///
/// # Errors
///
/// * Returns [`Error::ReadSymlink`] if reading either handle fails.
pub fn is_mount_namespace_isolated(
    self_ns: impl AsRef<Path>,
    host_ns: impl AsRef<Path>,
) -> Result<bool> {
    let read = |path: &Path| {
        fs::read_link(path).map_err(|source| Error::ReadSymlink {
            path: path.to_path_buf(),
            source,
        })
    };

    Ok(read(self_ns.as_ref())? != read(host_ns.as_ref())?)
}
