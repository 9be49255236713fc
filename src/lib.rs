//! Local Storage udev writer: keeps a generated udev rules file in sync with
//! the rules an operator puts into a config file.
//!
//! The rules select block devices for a node group and assign them a storage
//! class. The generated file turns every selected device into a stable
//! symlink below `/dev/disk/kubernetes/<name>/<storage class>/`, which a local
//! volume provisioner can then pick up.
use config::Config;
use error::StartupError;
use exec::CommandRunner;
use reconcile::UdevSync;

pub mod config;
pub mod environment;
pub mod error;
pub mod exec;
pub mod fsutil;
pub mod reconcile;
pub mod rules;
pub mod shutdown;

// When running in a container, udevadm must talk to the host's udev:
//  either share /run/udev with the host and run udevadm directly,
//  or mount the host's /proc (e.g. at /rootfs/proc) and use --use-nsenter,
//  which runs every udevadm command in the mount namespace of the host's PID 1.
//
// The rules directory must be the one the host's udev reads, /run/udev/rules.d
// by default so the rules do not survive a reboot of the node.

/// Runs the daemon until the first shutdown signal.
///
/// Validates `args`, prepares the rules directory, picks the command runner
/// and drives the reconcile loop. Returns after the loop removed the rules
/// file again.
///
/// # Errors
///
/// Possible errors include:
/// - Missing or invalid config file path or node group name.
/// - Failure to create the rules directory.
/// - Missing host mount namespace when nsenter is requested.
/// - Failure to install the signal handlers.
pub async fn run(args: config::Args) -> Result<(), StartupError> {
    log::info!("Local Storage udev writer {}", env!("CARGO_PKG_VERSION"));
    let Config {
        config_file,
        name,
        rules_dir,
        nsenter_proc_dir,
    } = args.validate()?;

    fsutil::create_dir_all(&rules_dir).map_err(StartupError::RulesDir)?;

    let runner = match nsenter_proc_dir {
        Some(host_proc_dir) => {
            let mount_ns = environment::check_host_mount_namespace(&host_proc_dir)
                .map_err(StartupError::NsEnter)?;
            log::debug!("using nsenter with mount namespace {}", mount_ns.display());
            CommandRunner::nsenter(host_proc_dir)
        }
        None => {
            warn_if_mount_namespace_isolated();
            CommandRunner::Direct
        }
    };

    let stop = shutdown::install_signal_handler().map_err(StartupError::Signal)?;

    UdevSync::new(config_file, rules_dir, name, runner)
        .run(stop)
        .await;
    Ok(())
}

/// Warns when udevadm would run in a different mount namespace than the
/// host's init process, where it most likely cannot reach the host's udev.
fn warn_if_mount_namespace_isolated() {
    match environment::is_mount_namespace_isolated(
        environment::SELF_MOUNT_NAMESPACE,
        environment::host_mount_namespace("/proc"),
    ) {
        Ok(true) => log::warn!(
            "running in a separate mount namespace without --use-nsenter, udevadm may not reach the host's udev"
        ),
        Ok(false) => {}
        Err(err) => log::debug!("failed to compare mount namespaces: {}", err),
    }
}
