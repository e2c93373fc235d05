// Client configuration: where the portal lives, how long to wait for it,
// and a small profile remembered between runs.

use crate::error::{Result, WhapiError};
use crate::transport::DEFAULT_TIMEOUT;
use anyhow::Context;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const PROFILE_FILE: &str = ".whapi_profile.json";

/// Endpoint URLs derived from the portal base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPaths {
    pub sign_in: String,
    pub school_context: String,
    pub context: String,
    pub term_list: String,
    pub academic_groups: String,
    pub gradebook_assignments: String,
}

impl ApiPaths {
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        ApiPaths {
            sign_in: format!("{}/api/SignIn", base),
            school_context: format!("{}/api/webapp/schoolcontext", base),
            context: format!("{}/api/webapp/context", base),
            term_list: format!("{}/api/DataDirect/StudentGroupTermList/", base),
            academic_groups: format!("{}/api/datadirect/ParentStudentUserAcademicGroupsGet", base),
            gradebook_assignments: format!(
                "{}/api/datadirect/GradeBookPerformanceAssignmentStudentList/",
                base
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(ClientConfig {
            base_url: normalize_base_url(base_url)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Build from `WHAPI_BASE_URL` and `WHAPI_TIMEOUT_SECS`. Returns `None`
    /// when no base URL is configured so the caller can ask for one.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_vars(
            std::env::var("WHAPI_BASE_URL").ok(),
            std::env::var("WHAPI_TIMEOUT_SECS").ok(),
        )
    }

    fn from_vars(base_url: Option<String>, timeout_secs: Option<String>) -> Result<Option<Self>> {
        let base_url = match base_url.filter(|u| !u.trim().is_empty()) {
            Some(u) => u,
            None => return Ok(None),
        };
        let mut config = ClientConfig::new(&base_url)?;
        if let Some(raw) = timeout_secs {
            config.timeout = parse_timeout(&raw)?;
        }
        Ok(Some(config))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(WhapiError::Config(format!(
            "WHAPI_TIMEOUT_SECS must be a positive number of seconds, got {:?}",
            raw
        ))),
    }
}

/// Validate a base URL and strip trailing slashes.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| WhapiError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(WhapiError::InvalidUrl {
            url: raw.to_string(),
            message: format!("unsupported scheme {}", url.scheme()),
        });
    }
    Ok(trimmed.to_string())
}

/// Values remembered between runs. The password is never stored.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Profile {
    pub base_url: Option<String>,
    pub username: Option<String>,
}

/// Profile location in the user's home directory.
pub fn profile_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(PROFILE_FILE)
}

impl Profile {
    /// Load the profile, or an empty one when the file doesn't exist yet.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Profile::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        let profile = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse profile {}", path.display()))?;
        Ok(profile)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("Failed to write profile {}", path.display()))?;
        Ok(())
    }
}
