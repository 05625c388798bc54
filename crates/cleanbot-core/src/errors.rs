/// Core error type.
///
/// Adapter crates map their specific failures into this type (or into
/// [`ApiError`] for bot API calls) so the core can log and react consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single bot API call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect failure, timeout, reset).
    #[error("network error: {0}")]
    Transport(String),

    /// A response arrived but its body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The API answered with `ok: false`.
    #[error("telegram API error ({kind:?}): {description}")]
    Rejected {
        kind: RejectKind,
        description: String,
    },
}

impl ApiError {
    /// Build a rejection from the raw `description` of an `ok: false` envelope.
    pub fn rejected(description: impl Into<String>) -> Self {
        let description = description.into();
        Self::Rejected {
            kind: RejectKind::from_description(&description),
            description,
        }
    }

    /// True when retrying the same deletion can never succeed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected {
                kind: RejectKind::NotFound | RejectKind::Forbidden,
                ..
            }
        )
    }
}

/// Classification of an `ok: false` answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectKind {
    /// "message to delete not found": somebody else already removed it.
    NotFound,
    /// "message can't be deleted": too old, or the bot lacks the right.
    Forbidden,
    /// Anything else; assumed transient.
    Other,
}

impl RejectKind {
    /// Text-based fallback for descriptions the adapter could not map to a
    /// typed error.
    pub fn from_description(description: &str) -> Self {
        let d = description.to_ascii_lowercase();
        if d.contains("message to delete not found") {
            Self::NotFound
        } else if d.contains("message can't be deleted") {
            Self::Forbidden
        } else {
            Self::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_classify_like_the_bot_api_reports_them() {
        assert_eq!(
            RejectKind::from_description("Bad Request: message to delete not found"),
            RejectKind::NotFound
        );
        assert_eq!(
            RejectKind::from_description("Bad Request: message can't be deleted"),
            RejectKind::Forbidden
        );
        assert_eq!(
            RejectKind::from_description("Too Many Requests: retry after 5"),
            RejectKind::Other
        );
    }

    #[test]
    fn only_not_found_and_forbidden_are_terminal() {
        assert!(ApiError::rejected("Bad Request: message to delete not found").is_terminal());
        assert!(ApiError::rejected("Bad Request: message can't be deleted").is_terminal());
        assert!(!ApiError::rejected("Internal Server Error").is_terminal());
        assert!(!ApiError::Transport("connection reset".to_string()).is_terminal());
        assert!(!ApiError::Decode("expected value".to_string()).is_terminal());
    }
}
