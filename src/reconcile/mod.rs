//! Reconciliation of the generated udev rules file with its config file.
//!
//! [`UdevSync`] polls the config file once per second. Whenever its content
//! differs from the last successfully applied content, the rules file is
//! rewritten and udev is told to reload its rules, re-trigger all block
//! devices and wait for them to settle. On shutdown the rules file is
//! removed and udev is reloaded once more.
mod error;
mod udev_sync;

pub use error::{Error, Result};
pub use udev_sync::{Outcome, RELOAD_COMMANDS, SYNC_INTERVAL, UdevSync};
