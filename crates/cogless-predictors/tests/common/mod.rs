//! Spawns `cogless-file-runner` as a child of the test process and records
//! the signals it sends back.
//!
//! Signal handlers are process wide, so each test binary holds one test.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::signal::unix::{SignalKind, signal};

pub const TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sig {
    Ready,
    Busy,
}

pub struct FileRunner {
    pub dir: tempfile::TempDir,
    child: Child,
    signals: Arc<Mutex<Vec<Sig>>>,
}

impl FileRunner {
    /// Install the signal listeners, then start the child with `env` added.
    pub fn spawn(env: &[(&str, &str)]) -> Self {
        let signals = Arc::new(Mutex::new(Vec::new()));
        let mut ready = signal(SignalKind::user_defined1()).unwrap();
        let mut busy = signal(SignalKind::user_defined2()).unwrap();
        let recorded = Arc::clone(&signals);
        tokio::spawn(async move {
            loop {
                let sig = tokio::select! {
                    Some(()) = ready.recv() => Sig::Ready,
                    Some(()) = busy.recv() => Sig::Busy,
                    else => break,
                };
                recorded.lock().unwrap().push(sig);
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cogless-file-runner"));
        cmd.arg("--working-dir")
            .arg(dir.path())
            .args(["--module-name", "tests.runners.sleep", "--class-name", "Predictor"])
            .args(["--poll-interval-ms", "20"])
            .env_remove("SETUP_SLEEP")
            .env_remove("SETUP_FAILURE")
            .env_remove("PREDICTION_FAILURE");
        for (key, value) in env {
            cmd.env(key, value);
        }
        let child = cmd.spawn().unwrap();

        Self { dir, child, signals }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn signals(&self) -> Vec<Sig> {
        self.signals.lock().unwrap().clone()
    }

    pub async fn wait_for_signals(&self, expected: &[Sig]) {
        let deadline = tokio::time::Instant::now() + TIMEOUT;
        while self.signals() != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected signals {expected:?}, got {:?}",
                self.signals()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub fn read_json(&self, name: &str) -> Value {
        serde_json::from_slice(&std::fs::read(self.path(name)).unwrap()).unwrap()
    }

    pub fn submit(&self, id: &str, body: &Value) {
        let tmp = self.path(&format!(".request-{id}.json.tmp"));
        std::fs::write(&tmp, serde_json::to_vec(body).unwrap()).unwrap();
        std::fs::rename(&tmp, self.path(&format!("request-{id}.json"))).unwrap();
    }

    pub fn is_running(&mut self) -> bool {
        self.child.try_wait().unwrap().is_none()
    }

    pub async fn wait(&mut self) -> ExitStatus {
        let deadline = tokio::time::Instant::now() + TIMEOUT;
        loop {
            if let Some(status) = self.child.try_wait().unwrap() {
                return status;
            }
            assert!(tokio::time::Instant::now() < deadline, "runner did not exit");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for FileRunner {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn wait_for(path: &Path) {
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while !path.exists() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {}",
            path.display()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
