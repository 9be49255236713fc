use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::NodeGroupName;
use crate::error::ResultOkLogExt;
use crate::exec::Exec;
use crate::{fsutil, rules};

use super::{Error, Result};

/// Period between two reads of the config file.
pub const SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Commands that make udev pick up a changed rules file, run in this order.
pub const RELOAD_COMMANDS: [&[&str]; 3] = [
    // Reload all rules files.
    &["udevadm", "control", "--reload"],
    // Pass all block devices through the newly loaded rules.
    &["udevadm", "trigger", "--subsystem-match=block"],
    // Block until all devices are processed.
    &["udevadm", "settle", "--timeout=300"],
];

/// Result of a successful [`UdevSync::sync_once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The config file did not change since it was last applied.
    Unchanged,
    /// The rules file was rewritten and udev reloaded.
    Applied,
}

/// Owns the generated rules file of one node group.
#[derive(Debug)]
pub struct UdevSync<E> {
    /// Unique name of the node group, reused in the rules file name.
    name: NodeGroupName,
    /// Config file with the operator's udev rules.
    config_file: PathBuf,
    /// Generated udev rules file.
    rules_file: PathBuf,
    /// Content of the config file at the last successful apply.
    last_applied: Vec<u8>,
    exec: E,
}

impl<E: Exec> UdevSync<E> {
    pub fn new(
        config_file: impl Into<PathBuf>,
        rules_dir: impl AsRef<Path>,
        name: NodeGroupName,
        exec: E,
    ) -> Self {
        let rules_file = rules_dir
            .as_ref()
            .join(rules::rules_file_name(name.as_ref()));
        log::debug!("using rules file {}", rules_file.display());

        Self {
            name,
            config_file: config_file.into(),
            rules_file,
            last_applied: Vec::new(),
            exec,
        }
    }

    /// Path of the generated udev rules file.
    pub fn rules_file(&self) -> &Path {
        &self.rules_file
    }

    #[cfg(test)]
    fn last_applied(&self) -> &[u8] {
        &self.last_applied
    }

    /// Returns true if `config` differs from the last applied config.
    pub fn needs_apply(&self, config: &[u8]) -> bool {
        config.len() != self.last_applied.len() || config != self.last_applied.as_slice()
    }

    /// Reads the config file and applies it if it changed.
    ///
    /// # Errors
    ///
    /// * [`Error::ReadConfig`] if the config file cannot be read. The rules
    ///   file is left untouched.
    /// * Errors of [`UdevSync::apply`].
    pub fn sync_once(&mut self) -> Result<Outcome> {
        let config = fsutil::read_file(&self.config_file).map_err(Error::ReadConfig)?;

        if !self.needs_apply(&config) {
            log::debug!("no change detected, skipping config update");
            return Ok(Outcome::Unchanged);
        }

        self.apply(config)?;
        Ok(Outcome::Applied)
    }

    /// Writes the rules file for `config` and reloads udev.
    ///
    /// `config` only becomes the last applied config when both steps
    /// succeed, so a failed apply is repeated by the next sync.
    ///
    /// # Errors
    ///
    /// * [`Error::WriteRules`] if the rules file cannot be written.
    /// * [`Error::Reload`] if any of the [`RELOAD_COMMANDS`] fails.
    pub fn apply(&mut self, config: Vec<u8>) -> Result<()> {
        let rendered = rules::render(self.name.as_ref(), &config);
        fsutil::write_file_truncate(&self.rules_file, &rendered).map_err(Error::WriteRules)?;
        log::debug!("configuration written to {}", self.rules_file.display());

        self.reload_udev()?;

        self.last_applied = config;
        log::info!("configuration applied");
        Ok(())
    }

    /// Runs the [`RELOAD_COMMANDS`], stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reload`] with the failed command and its output.
    pub fn reload_udev(&self) -> Result<()> {
        for cmd in RELOAD_COMMANDS {
            self.exec.exec(cmd).map_err(|source| {
                let output = String::from_utf8_lossy(source.output()).into_owned();
                Error::Reload {
                    command: cmd.join(" "),
                    output,
                    source,
                }
            })?;
        }
        Ok(())
    }

    /// Removes the rules file and reloads udev so the generated symlinks
    /// disappear. Errors are logged, never returned.
    pub fn cleanup(self) {
        match fsutil::remove_file(&self.rules_file) {
            Ok(()) => log::info!("udev rules file {} removed", self.rules_file.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("udev rules file {} already removed", self.rules_file.display())
            }
            Err(err) => log::warn!("error removing udev rules file: {}", err),
        }

        if self.reload_udev().ok_log("error reloading udev").is_some() {
            log::info!("udev reloaded");
        }
    }
}

impl<E: Exec + Send + 'static> UdevSync<E> {
    /// Syncs once immediately and then every [`SYNC_INTERVAL`] until `stop`
    /// fires or its sender is dropped, then runs [`UdevSync::cleanup`].
    ///
    /// Syncs run on tokio's blocking pool one at a time, a sync in progress
    /// is never interrupted.
    pub async fn run(self, mut stop: oneshot::Receiver<()>) {
        log::info!(
            "syncing {} into {}",
            self.config_file.display(),
            self.rules_file().display()
        );
        // TODO: watch the config file with inotify instead of polling.
        let Some(mut sync) = self.sync_blocking().await else {
            return;
        };

        let mut ticker = tokio::time::interval_at(Instant::now() + SYNC_INTERVAL, SYNC_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => break,
                _ = ticker.tick() => {
                    match sync.sync_blocking().await {
                        Some(next) => sync = next,
                        None => return,
                    }
                }
            }
        }

        log::info!("stopping");
        if let Err(err) = tokio::task::spawn_blocking(move || sync.cleanup()).await {
            resume_or_log(err);
        }
    }

    /// Runs [`UdevSync::sync_once`] on the blocking pool and hands the state
    /// back. Returns `None` only if the runtime cancelled the task.
    async fn sync_blocking(mut self) -> Option<Self> {
        let result = tokio::task::spawn_blocking(move || {
            self.sync_once().ok_log("failed to apply config");
            self
        })
        .await;

        match result {
            Ok(sync) => Some(sync),
            Err(err) => {
                resume_or_log(err);
                None
            }
        }
    }
}

/// Re-raises a panic of a blocking task, logs a cancellation.
fn resume_or_log(err: tokio::task::JoinError) {
    if err.is_panic() {
        std::panic::resume_unwind(err.into_panic());
    }
    log::error!("blocking sync task did not finish: {}", err);
}
