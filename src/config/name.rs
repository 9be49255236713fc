use std::fmt;
use std::str::FromStr;

use super::{Error, Result};

/// Grammar accepted for node group names, a Kubernetes DNS-1123 subdomain.
pub const DNS1123_SUBDOMAIN_FMT: &str =
    "[a-z0-9]([-a-z0-9]*[a-z0-9])?(\\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*";

/// The maximum allowed length for a [`NodeGroupName`].
pub const NODE_GROUP_NAME_MAX_LEN: usize = 253;

/// A validated node group name.
///
/// The name ends up inside double quotes in the generated udev rules and in
/// the rules file name, so it must not be able to escape the quotes with `\`
/// or leave `/dev/disk/kubernetes` with `..`. Restricting it to a DNS-1123
/// subdomain rules out both.
///
/// # Examples
///
/// ```
/// # use local_storage_udev_writer::config::NodeGroupName;
/// let name = NodeGroupName::new("local-storage.pool-a").unwrap();
/// assert_eq!(name.as_ref(), "local-storage.pool-a");
/// assert!(NodeGroupName::new("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeGroupName(String);

impl NodeGroupName {
    /// Creates a new `NodeGroupName` from the given raw name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingName`] for an empty input and
    /// [`Error::InvalidName`] if the input is not a DNS-1123 subdomain of at
    /// most [`NODE_GROUP_NAME_MAX_LEN`] characters.
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() {
            return Err(Error::MissingName);
        }
        if src.len() > NODE_GROUP_NAME_MAX_LEN || !src.split('.').all(is_dns1123_label) {
            return Err(Error::InvalidName {
                name: src.to_owned(),
                pattern: DNS1123_SUBDOMAIN_FMT,
                max_len: NODE_GROUP_NAME_MAX_LEN,
            });
        }

        Ok(Self(src.to_owned()))
    }
}

/// Returns true if `label` matches `[a-z0-9]([-a-z0-9]*[a-z0-9])?`.
fn is_dns1123_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            is_lowercase_alpha_numeric(*first)
                && is_lowercase_alpha_numeric(*last)
                && bytes
                    .iter()
                    .all(|b| is_lowercase_alpha_numeric(*b) || *b == b'-')
        }
        _ => false,
    }
}

fn is_lowercase_alpha_numeric(b: u8) -> bool {
    b.is_ascii_digit() || b.is_ascii_lowercase()
}

impl FromStr for NodeGroupName {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for NodeGroupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeGroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
