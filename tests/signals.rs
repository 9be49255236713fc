//! Runs the daemon binary against a fake `udevadm` and drives it with real
//! SIGTERMs.
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const POOL_A_CONFIG: &str = r#"KERNELS=="sda", ENV{KUBERNETES_STORAGE_CLASS}="fast""#;

const FAKE_UDEVADM: &str = r#"#!/bin/sh
echo "udevadm $*" >> "$UDEVADM_LOG"
if [ "$1" = settle ] && [ -n "$UDEVADM_SETTLE_DELAY" ]; then
    sleep "$UDEVADM_SETTLE_DELAY"
fi
"#;

const RELOAD_SEQUENCE: [&str; 3] = [
    "udevadm control --reload",
    "udevadm trigger --subsystem-match=block",
    "udevadm settle --timeout=300",
];

struct Daemon {
    dir: tempfile::TempDir,
    child: Child,
}

impl Daemon {
    fn start(settle_delay: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let udevadm = bin.join("udevadm");
        std::fs::write(&udevadm, FAKE_UDEVADM).unwrap();
        std::fs::set_permissions(&udevadm, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::fs::write(dir.path().join("rules.conf"), POOL_A_CONFIG).unwrap();

        let path = format!(
            "{}:{}",
            bin.display(),
            std::env::var("PATH").unwrap_or_default()
        );
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_local-storage-udev-writer"));
        cmd.arg("--name=pool-a")
            .arg(format!("--config={}", dir.path().join("rules.conf").display()))
            .arg(format!("--rules-dir={}", dir.path().join("rules.d").display()))
            .env("PATH", path)
            .env("UDEVADM_LOG", dir.path().join("udevadm.log"))
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(delay) = settle_delay {
            cmd.env("UDEVADM_SETTLE_DELAY", delay);
        }

        let child = cmd.spawn().unwrap();
        Self { dir, child }
    }

    fn rules_file(&self) -> PathBuf {
        self.dir.path().join("rules.d/99-kubernetes-pool-a.rules")
    }

    fn udevadm_calls(&self) -> Vec<String> {
        read_lines(&self.dir.path().join("udevadm.log"))
    }

    fn wait_for_calls(&self, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while self.udevadm_calls().len() < n {
            assert!(Instant::now() < deadline, "timed out waiting for udevadm calls");
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    fn terminate(&self) {
        let status = Command::new("kill")
            .args(["-TERM", self.child.id().to_string().as_str()])
            .status()
            .unwrap();
        assert!(status.success());
    }

    fn wait(&mut self) -> ExitStatus {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(status) = self.child.try_wait().unwrap() {
                return status;
            }
            if Instant::now() > deadline {
                self.child.kill().ok();
                panic!("daemon did not exit");
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_owned).collect())
        .unwrap_or_default()
}

#[test]
fn test_sigterm_removes_rules_and_reloads_once() {
    let mut daemon = Daemon::start(None);
    daemon.wait_for_calls(3);
    assert!(daemon.rules_file().exists());

    daemon.terminate();
    let status = daemon.wait();

    assert!(status.success(), "unexpected exit status {status}");
    assert!(!daemon.rules_file().exists());
    let calls = daemon.udevadm_calls();
    assert_eq!(calls.len(), 6);
    assert_eq!(calls[..3], RELOAD_SEQUENCE);
    assert_eq!(calls[3..], RELOAD_SEQUENCE);
}

#[test]
fn test_second_sigterm_exits_without_cleanup() {
    let mut daemon = Daemon::start(Some("10"));
    // The first sync is now blocked in `udevadm settle`.
    daemon.wait_for_calls(3);

    daemon.terminate();
    std::thread::sleep(Duration::from_millis(500));
    daemon.terminate();
    let status = daemon.wait();

    assert_eq!(status.code(), Some(1));
    assert!(daemon.rules_file().exists());
    assert_eq!(daemon.udevadm_calls(), RELOAD_SEQUENCE);
}
