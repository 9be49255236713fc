//! Host environment checks.
//!
//! Locates the host's mount namespace under a host `/proc` mount and tells
//! whether the daemon shares it.
mod checks;
mod error;

pub use checks::{
    SELF_MOUNT_NAMESPACE, check_host_mount_namespace, host_mount_namespace,
    is_mount_namespace_isolated,
};
pub use error::{Error, Result};
