//! The working directory file protocol.
//!
//! | File                 | Writer | Reader |
//! |----------------------|--------|--------|
//! | `setup_result.json`  | worker | parent |
//! | `openapi.json`       | worker | parent |
//! | `request-<id>.json`  | parent | worker |
//! | `response-<id>.json` | worker | parent |
//! | `stop`               | parent | worker |
//!
//! Every file is published by writing `.<name>.tmp` and renaming it into
//! place, so a reader never sees a partial file. Parents must publish requests
//! the same way; temp names never match the request pattern.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub const SETUP_RESULT_FILE: &str = "setup_result.json";
pub const OPENAPI_FILE: &str = "openapi.json";
pub const STOP_FILE: &str = "stop";

const REQUEST_PREFIX: &str = "request-";
const RESPONSE_PREFIX: &str = "response-";
const JSON_SUFFIX: &str = ".json";

/// Prediction id of a request file name, if it is one.
///
/// `request-abc.json` → `abc`. The id is one or more non-whitespace characters.
pub fn request_id(file_name: &str) -> Option<&str> {
    let id = file_name
        .strip_prefix(REQUEST_PREFIX)?
        .strip_suffix(JSON_SUFFIX)?;
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        return None;
    }
    Some(id)
}

pub fn response_file_name(id: &str) -> String {
    format!("{RESPONSE_PREFIX}{id}{JSON_SUFFIX}")
}

/// A request file found by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: String,
    pub path: PathBuf,
}

/// Result of one directory listing.
#[derive(Debug, Default)]
pub struct Scan {
    /// Request files, sorted by file name.
    pub requests: Vec<PendingRequest>,
    /// The stop marker was among the entries.
    pub stop: bool,
}

#[derive(Debug, Clone)]
pub struct WorkingDir {
    root: PathBuf,
}

impl WorkingDir {
    /// Create the directory and remove files left by a previous run.
    ///
    /// Request and response files are left alone.
    pub async fn prepare(root: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = Self { root: root.into() };
        tokio::fs::create_dir_all(&dir.root).await?;
        for name in [SETUP_RESULT_FILE, STOP_FILE, OPENAPI_FILE] {
            dir.remove_if_exists(&dir.path(name)).await?;
        }
        Ok(dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub async fn stop_requested(&self) -> bool {
        tokio::fs::try_exists(self.path(STOP_FILE))
            .await
            .unwrap_or(false)
    }

    /// List the directory once.
    pub async fn scan(&self) -> io::Result<Scan> {
        let mut scan = Scan::default();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name == STOP_FILE {
                scan.stop = true;
            } else if let Some(id) = request_id(name) {
                scan.requests.push(PendingRequest {
                    id: id.to_string(),
                    path: entry.path(),
                });
            }
        }
        scan.requests.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(scan)
    }

    /// Serialize `value` to `name` atomically.
    pub async fn write_json<T: Serialize>(&self, name: &str, value: &T) -> io::Result<()> {
        let bytes = serde_json::to_vec(value).map_err(io::Error::other)?;
        let tmp = self.path(&format!(".{name}.tmp"));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, self.path(name)).await
    }

    pub async fn remove_if_exists(&self, path: &Path) -> io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
