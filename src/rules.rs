//! Rendering of the generated udev rules file.
//!
//! The operator supplies only the matching rules, i.e. rules that set
//! `ENV{KUBERNETES_STORAGE_CLASS}` on the block devices they select. This
//! module wraps them into a complete rules file that skips non-block devices
//! and creates stable symlinks below `/dev/disk/kubernetes/<name>/<class>/`
//! for every matched device.

const PROLOGUE: &[u8] = b"
# Generated file, do not modify!

# Skip non-block devices.
SUBSYSTEM!=\"block\", GOTO=\"out\"

";

const MATCH_GUARD: &[u8] = b"

# Check if the device was matched by any of the rules above.
ENV{KUBERNETES_STORAGE_CLASS}==\"\", GOTO=\"out\"

# The device matched, create a symlink with stable device name if possible.
ENV{ID_SERIAL}!=\"\", SYMLINK+=\"disk/kubernetes/";

const SERIAL_LINK_SUFFIX: &[u8] = b"/$env{KUBERNETES_STORAGE_CLASS}/$env{ID_BUS}-$env{ID_SERIAL}\"

# Fall back to kernel name if stable device name does not exist.
ENV{ID_SERIAL}==\"\", SYMLINK+=\"disk/kubernetes/";

const EPILOGUE: &[u8] = b"/$env{KUBERNETES_STORAGE_CLASS}/$kernel\"

LABEL=\"out\"
";

/// Returns the file name of the rules file owned by the node group `name`.
///
/// The `99-` prefix makes udev evaluate it after all distribution rules, so
/// `ID_SERIAL` and `ID_BUS` are already populated.
pub fn rules_file_name(name: &str) -> String {
    format!("99-kubernetes-{name}.rules")
}

/// Renders the complete rules file for node group `name`.
///
/// `config` is embedded verbatim. It is neither parsed nor required to be
/// valid UTF-8; broken rule syntax is reported by udev, not here.
///
/// # Example
///
/// ```
/// # use local_storage_udev_writer::rules::render;
/// let out = render("pool-a", b"KERNEL==\"sda\", ENV{KUBERNETES_STORAGE_CLASS}=\"fast\"");
/// let out = String::from_utf8(out).unwrap();
/// assert!(out.contains("disk/kubernetes/pool-a/$env{KUBERNETES_STORAGE_CLASS}/$kernel"));
/// ```
pub fn render(name: &str, config: &[u8]) -> Vec<u8> {
    let name = name.as_bytes();
    let mut out = Vec::with_capacity(
        PROLOGUE.len()
            + config.len()
            + MATCH_GUARD.len()
            + SERIAL_LINK_SUFFIX.len()
            + EPILOGUE.len()
            + 2 * name.len(),
    );
    out.extend_from_slice(PROLOGUE);
    out.extend_from_slice(config);
    out.extend_from_slice(MATCH_GUARD);
    out.extend_from_slice(name);
    out.extend_from_slice(SERIAL_LINK_SUFFIX);
    out.extend_from_slice(name);
    out.extend_from_slice(EPILOGUE);
    out
}
