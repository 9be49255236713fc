//! Command-line configuration of the daemon.
mod error;
mod name;

use std::path::PathBuf;

use clap::Parser;

pub use error::{Error, Result};
pub use name::{DNS1123_SUBDOMAIN_FMT, NODE_GROUP_NAME_MAX_LEN, NodeGroupName};

/// Keeps udev rules for local storage devices in sync with a config file.
#[derive(Debug, Clone, Parser)]
#[command(name = "local-storage-udev-writer", version)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(long = "config", default_value = "/etc/local-storage-discoverer/rules.conf")]
    pub config_file: PathBuf,

    /// Unique name of the node group.
    #[arg(long)]
    pub name: Option<String>,

    /// Path to the udev rules.d directory where to put udev rules.
    ///
    /// Defaults to a directory under /run so the rules are gone after reboot.
    #[arg(long, default_value = "/run/udev/rules.d")]
    pub rules_dir: PathBuf,

    /// Use nsenter to enter the host's mount namespace to execute udev commands.
    #[arg(long)]
    pub use_nsenter: bool,

    /// Path to the host's /proc filesystem.
    #[arg(long, default_value = "/rootfs/proc")]
    pub host_proc_dir: PathBuf,
}

/// [`Args`] after validation.
#[derive(Debug, Clone)]
pub struct Config {
    pub config_file: PathBuf,
    pub name: NodeGroupName,
    pub rules_dir: PathBuf,
    /// Host `/proc` to enter the mount namespace from, `None` to run
    /// commands directly.
    pub nsenter_proc_dir: Option<PathBuf>,
}

impl Args {
    /// Validates the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingConfigFile`] for an empty config path and the
    /// errors of [`NodeGroupName::new`] for the name.
    pub fn validate(self) -> Result<Config> {
        if self.config_file.as_os_str().is_empty() {
            return Err(Error::MissingConfigFile);
        }
        let name = NodeGroupName::new(self.name.as_deref().unwrap_or_default())?;

        Ok(Config {
            config_file: self.config_file,
            name,
            rules_dir: self.rules_dir,
            nsenter_proc_dir: self.use_nsenter.then_some(self.host_proc_dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["local-storage-udev-writer", "--name", "pool-a"]).unwrap();
        assert_eq!(
            args.config_file,
            PathBuf::from("/etc/local-storage-discoverer/rules.conf")
        );
        assert_eq!(args.rules_dir, PathBuf::from("/run/udev/rules.d"));
        assert_eq!(args.host_proc_dir, PathBuf::from("/rootfs/proc"));
        assert!(!args.use_nsenter);

        let config = args.validate().unwrap();
        assert_eq!(config.name.as_ref(), "pool-a");
        assert_eq!(config.nsenter_proc_dir, None);
    }

    #[test]
    fn test_nsenter_flags() {
        let args = Args::try_parse_from([
            "local-storage-udev-writer",
            "--name=pool-a",
            "--config=/config/rules.conf",
            "--rules-dir=/host/run/udev/rules.d",
            "--use-nsenter",
            "--host-proc-dir=/host/proc",
        ])
        .unwrap();

        let config = args.validate().unwrap();
        assert_eq!(config.config_file, PathBuf::from("/config/rules.conf"));
        assert_eq!(config.rules_dir, PathBuf::from("/host/run/udev/rules.d"));
        assert_eq!(config.nsenter_proc_dir, Some(PathBuf::from("/host/proc")));
    }

    #[test]
    fn test_validate_rejects_missing_inputs() {
        let args = Args::try_parse_from(["local-storage-udev-writer"]).unwrap();
        assert!(matches!(args.validate(), Err(Error::MissingName)));

        let args = Args {
            config_file: PathBuf::new(),
            name: Some("a".to_owned()),
            rules_dir: PathBuf::from("/run/udev/rules.d"),
            use_nsenter: false,
            host_proc_dir: PathBuf::from("/rootfs/proc"),
        };
        assert!(matches!(args.validate(), Err(Error::MissingConfigFile)));
    }

    #[test]
    fn test_validate_rejects_invalid_name() {
        let args =
            Args::try_parse_from(["local-storage-udev-writer", "--name", "../../etc"]).unwrap();
        assert!(matches!(args.validate(), Err(Error::InvalidName { .. })));
    }
}
