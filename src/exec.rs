//! Execution of external commands, either directly or inside the host's
//! mount namespace.
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::environment;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("refusing to execute an empty command")]
    EmptyCommand,
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` failed with {status}")]
    Failed {
        command: String,
        status: ExitStatus,
        output: Vec<u8>,
    },
}

impl Error {
    /// Returns the output captured before the command failed.
    pub fn output(&self) -> &[u8] {
        match self {
            Error::Failed { output, .. } => output,
            Error::EmptyCommand | Error::Spawn { .. } => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Executes external commands on behalf of the reconcile loop.
pub trait Exec {
    /// Runs `cmd` to completion and returns its combined output.
    ///
    /// # Errors
    ///
    /// Fails if the command cannot be started or does not exit successfully.
    /// The captured output is kept in [`Error::Failed`].
    fn exec(&self, cmd: &[&str]) -> Result<Vec<u8>>;
}

/// The two ways of running udev commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRunner {
    /// Runs commands in the daemon's own mount namespace.
    Direct,
    /// Runs commands through `nsenter` in the mount namespace of PID 1 found
    /// under `host_proc_dir`. Needed when the daemon runs in a container
    /// that does not share the host's `/run/udev`.
    NsEnter { host_proc_dir: PathBuf },
}

impl CommandRunner {
    pub fn nsenter(host_proc_dir: impl AsRef<Path>) -> Self {
        Self::NsEnter {
            host_proc_dir: host_proc_dir.as_ref().to_path_buf(),
        }
    }

    /// Returns the argument vector that is actually executed for `cmd`.
    pub fn command_line(&self, cmd: &[&str]) -> Vec<String> {
        match self {
            CommandRunner::Direct => cmd.iter().map(|arg| (*arg).to_owned()).collect(),
            CommandRunner::NsEnter { host_proc_dir } => {
                let mount_ns = environment::host_mount_namespace(host_proc_dir);
                let mut out = Vec::with_capacity(cmd.len() + 3);
                out.push("nsenter".to_owned());
                out.push(format!("--mount={}", mount_ns.display()));
                out.push("--".to_owned());
                out.extend(cmd.iter().map(|arg| (*arg).to_owned()));
                out
            }
        }
    }
}

impl Exec for CommandRunner {
    fn exec(&self, cmd: &[&str]) -> Result<Vec<u8>> {
        run_command(&self.command_line(cmd))
    }
}

fn run_command(argv: &[String]) -> Result<Vec<u8>> {
    let (program, args) = argv.split_first().ok_or(Error::EmptyCommand)?;
    let command = argv.join(" ");

    let result = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| Error::Spawn {
            command: command.clone(),
            source,
        })
        .and_then(|output| {
            let mut combined = output.stdout;
            combined.extend_from_slice(&output.stderr);
            if output.status.success() {
                Ok(combined)
            } else {
                Err(Error::Failed {
                    command: command.clone(),
                    status: output.status,
                    output: combined,
                })
            }
        });

    match &result {
        Ok(out) => log::trace!(
            "executed {}: {} (success)",
            command,
            String::from_utf8_lossy(out)
        ),
        Err(err) => log::trace!(
            "executed {}: {} (error: {})",
            command,
            String::from_utf8_lossy(err.output()),
            err
        ),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_command_line_is_unchanged() {
        let runner = CommandRunner::Direct;
        assert_eq!(
            runner.command_line(&["udevadm", "control", "--reload"]),
            vec!["udevadm", "control", "--reload"]
        );
    }

    #[test]
    fn test_nsenter_command_line() {
        let runner = CommandRunner::nsenter("/rootfs/proc");
        assert_eq!(
            runner.command_line(&["udevadm", "settle", "--timeout=300"]),
            vec![
                "nsenter",
                "--mount=/rootfs/proc/1/ns/mnt",
                "--",
                "udevadm",
                "settle",
                "--timeout=300"
            ]
        );
    }

    #[test]
    fn test_direct_exec_combines_output() {
        let out = CommandRunner::Direct
            .exec(&["sh", "-c", "printf out; printf err >&2"])
            .unwrap();
        assert_eq!(out, b"outerr");
    }

    #[test]
    fn test_direct_exec_non_zero_exit() {
        let err = CommandRunner::Direct
            .exec(&["sh", "-c", "echo broken rule >&2; exit 3"])
            .unwrap_err();
        match &err {
            Error::Failed {
                command, status, ..
            } => {
                assert_eq!(command, "sh -c echo broken rule >&2; exit 3");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.output(), b"broken rule\n");
    }

    #[test]
    fn test_direct_exec_missing_binary() {
        let err = CommandRunner::Direct
            .exec(&["/definitely/not/a/binary", "--reload"])
            .unwrap_err();
        match err {
            Error::Spawn { command, source } => {
                assert_eq!(command, "/definitely/not/a/binary --reload");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_exec_empty_command() {
        let err = CommandRunner::Direct.exec(&[]).unwrap_err();
        assert!(matches!(err, Error::EmptyCommand));
    }
}
