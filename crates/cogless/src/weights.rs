//! Weights resolution for predictors whose `setup` takes weights.

use std::path::PathBuf;

use crate::predictor::Weights;

/// Environment variable carrying a weights URL.
pub const WEIGHTS_ENV: &str = "COG_WEIGHTS";

/// Conventional local weights location, relative to the working directory.
pub const WEIGHTS_PATH: &str = "weights";

/// Where weights may come from.
#[derive(Debug, Clone, Default)]
pub struct WeightsSource {
    pub url: Option<String>,
    /// Directory in which to look for `weights`.
    pub base_dir: PathBuf,
}

impl WeightsSource {
    /// `COG_WEIGHTS` and the process's current directory.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var(WEIGHTS_ENV).ok(),
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// URL first, then a local `weights` path, otherwise nothing.
    pub fn resolve(&self) -> Option<Weights> {
        if let Some(url) = self.url.as_deref()
            && !url.is_empty()
        {
            return Some(Weights::Url(url.to_string()));
        }
        if self.base_dir.join(WEIGHTS_PATH).exists() {
            return Some(Weights::Path(PathBuf::from(WEIGHTS_PATH)));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: Option<&str>, base_dir: PathBuf) -> WeightsSource {
        WeightsSource {
            url: url.map(String::from),
            base_dir,
        }
    }

    #[test]
    fn url_wins_over_local_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("weights")).unwrap();
        let weights = source(Some("https://example.com/w.tar"), dir.path().into()).resolve();
        assert_eq!(weights, Some(Weights::Url("https://example.com/w.tar".into())));
    }

    #[test]
    fn local_path_when_no_url() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("weights"), b"").unwrap();
        assert_eq!(
            source(Some(""), dir.path().into()).resolve(),
            Some(Weights::Path(PathBuf::from("weights")))
        );
    }

    #[test]
    fn nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(source(None, dir.path().into()).resolve(), None);
    }
}
