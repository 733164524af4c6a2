use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fl_core::Session;
use tracing::debug;

/// The signed-in session, kept between invocations as JSON.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// `<config dir>/fluent/session.json`, or next to the working directory
    /// when the platform has no config dir.
    pub fn default_location() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::at(base.join("fluent").join("session.json"))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).with_context(|| format!("reading {}", self.path.display())),
        };
        match serde_json::from_slice(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                debug!("Ignoring unreadable session file {}: {}", self.path.display(), err);
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let json = serde_json::to_vec_pretty(session)?;
        fs::write(&self.path, json).with_context(|| format!("writing {}", self.path.display()))?;
        debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}
