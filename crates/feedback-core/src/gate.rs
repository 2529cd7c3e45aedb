use crate::error::{Error, Result};

/// Who is making the current request. Built once per request by the
/// session layer and handed to every operation that needs authorization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated { session_id: String, username: String },
}

impl Session {
    pub fn authenticated(session_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self::Authenticated {
            session_id: session_id.into(),
            username: username.into(),
        }
    }

    pub fn identity(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { username, .. } => Some(username),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { session_id, .. } => Some(session_id),
        }
    }
}

/// The only authorization rule: the caller must be the owner.
pub fn require_self(identity: Option<&str>, owner: &str) -> Result<()> {
    match identity {
        Some(me) if me == owner => Ok(()),
        _ => Err(Error::Unauthorized),
    }
}
