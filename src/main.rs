use clap::Parser;

/// Entry point for the Local Storage udev writer.
///
/// Keeps `<rules-dir>/99-kubernetes-<name>.rules` in sync with the config
/// file until SIGINT or SIGTERM, then removes it again. A second signal exits
/// immediately without cleanup.
///
/// # Errors
///
/// Returns an error if startup fails (e.g., invalid name, rules directory
/// cannot be created, host mount namespace missing).
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug cargo run -- --name pool-a --config ./rules.conf --rules-dir /run/udev/rules.d
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = local_storage_udev_writer::config::Args::parse();
    local_storage_udev_writer::run(args).await?;
    Ok(())
}
