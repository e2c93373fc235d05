// Error taxonomy for the portal client.
// Gating errors (`NotAuthenticated`, `ContextNotLoaded`, `MarkingPeriodUnset`)
// carry enough meaning for a caller to run the missing step and retry; see
// `WhapiError::remedy`.

use thiserror::Error;

/// The client operation that satisfies a gating error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SignIn,
    LoadContext,
    FetchGroups,
}

#[derive(Error, Debug)]
pub enum WhapiError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Already signed in as {username}. Build a new client to sign in again.")]
    AlreadyAuthenticated { username: String },

    #[error("Not signed in. Call sign_in before this operation.")]
    NotAuthenticated,

    #[error("Context hasn't been loaded. Call load_context before this operation.")]
    ContextNotLoaded,

    #[error("Context field missing or malformed: {field}")]
    ContextExtractionFailed { field: String },

    #[error("No current term in term list")]
    NoCurrentTerm,

    #[error("Marking period unknown. Fetch a non-empty group list first.")]
    MarkingPeriodUnset,

    #[error("Invalid max points: {0}")]
    InvalidMaxPoints(f64),

    #[error("Decode error{}: {message}", at_path(.path))]
    Decode {
        path: Option<String>,
        message: String,
    },

    #[error("Request to {url} timed out")]
    TransportTimeout { url: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl WhapiError {
    pub fn decode(path: Option<String>, message: impl Into<String>) -> Self {
        WhapiError::Decode {
            path,
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        WhapiError::ContextExtractionFailed {
            field: field.into(),
        }
    }

    /// The step a caller has to run before retrying, for gating errors only.
    pub fn remedy(&self) -> Option<Step> {
        match self {
            WhapiError::NotAuthenticated => Some(Step::SignIn),
            WhapiError::ContextNotLoaded => Some(Step::LoadContext),
            WhapiError::MarkingPeriodUnset => Some(Step::FetchGroups),
            _ => None,
        }
    }

    pub fn is_gating(&self) -> bool {
        self.remedy().is_some()
    }
}

fn at_path(path: &Option<String>) -> String {
    path.as_ref().map(|p| format!(" at {}", p)).unwrap_or_default()
}

impl From<serde_json::Error> for WhapiError {
    fn from(err: serde_json::Error) -> Self {
        WhapiError::decode(None, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WhapiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gating_errors_name_their_remedy() {
        assert_eq!(WhapiError::NotAuthenticated.remedy(), Some(Step::SignIn));
        assert_eq!(WhapiError::ContextNotLoaded.remedy(), Some(Step::LoadContext));
        assert_eq!(WhapiError::MarkingPeriodUnset.remedy(), Some(Step::FetchGroups));
        assert!(WhapiError::NoCurrentTerm.remedy().is_none());
        assert!(!WhapiError::InvalidMaxPoints(0.0).is_gating());
    }

    #[test]
    fn decode_error_mentions_path() {
        let err = WhapiError::decode(Some("UserInfo.UserId".into()), "expected id");
        assert_eq!(err.to_string(), "Decode error at UserInfo.UserId: expected id");

        let err = WhapiError::decode(None, "eof");
        assert_eq!(err.to_string(), "Decode error: eof");
    }
}
