//! The signed-in teacher: a display name and an email kept in a small JSON
//! file.
//!
//! The store lives at `{config dir}/mentoring-report/profile.json` unless
//! `MENTOR_REPORT_PROFILE` names another file. Logging out deletes the file.

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Shown when nobody has logged in.
pub const DEFAULT_DISPLAY_NAME: &str = "Teacher";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub display_name: String,
    pub email: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            email: None,
        }
    }
}

/// Reads and writes the profile file.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store at `MENTOR_REPORT_PROFILE`, else under the platform config
    /// directory (falling back to the home directory, then the temp dir).
    pub fn default_location() -> Self {
        if let Ok(path) = std::env::var("MENTOR_REPORT_PROFILE") {
            return Self::at(path);
        }
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(std::env::temp_dir);
        Self::at(base.join("mentoring-report").join("profile.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, detail: impl ToString) -> ReportError {
        ReportError::ProfileStore {
            path: self.path.clone(),
            detail: detail.to_string(),
        }
    }

    /// The stored profile, or the default one when nothing is stored.
    pub fn load(&self) -> Result<Profile, ReportError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No profile at {}", self.path.display());
                return Ok(Profile::default());
            }
            Err(e) => return Err(self.error(e)),
        };
        let mut profile: Profile = serde_json::from_str(&text).map_err(|e| self.error(e))?;
        if profile.display_name.trim().is_empty() {
            profile.display_name = DEFAULT_DISPLAY_NAME.to_string();
        }
        Ok(profile)
    }

    pub fn save(&self, profile: &Profile) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        let json = serde_json::to_string_pretty(profile).map_err(|e| self.error(e))?;
        std::fs::write(&self.path, json).map_err(|e| self.error(e))?;
        Ok(())
    }

    /// Store a new profile. A blank name becomes the default name.
    pub fn login(&self, display_name: &str, email: Option<&str>) -> Result<Profile, ReportError> {
        let display_name = match display_name.trim() {
            "" => DEFAULT_DISPLAY_NAME.to_string(),
            name => name.to_string(),
        };
        let email = email.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(ReportError::InvalidConfig(format!(
                    "'{email}' is not an email address"
                )));
            }
        }
        let profile = Profile {
            display_name,
            email,
        };
        self.save(&profile)?;
        info!("Logged in as {}", profile.display_name);
        Ok(profile)
    }

    /// Delete the stored profile. Returns whether one existed.
    pub fn logout(&self) -> Result<bool, ReportError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Logged out");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.error(e)),
        }
    }
}
