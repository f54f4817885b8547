use std::time::Duration;

use thiserror::Error;

/// Failures of a single send-and-await-reply exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no reply within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("unauthorized")]
    Unauthorized,

    #[error("transport error: {0}")]
    Backend(String),
}

/// Errors from conversation lifecycle operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("not signed in")]
    NotAuthenticated,

    #[error("conversation has not been started")]
    NotStarted,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors from the auth collaborator.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,

    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("password hashing failed")]
    Hashing,

    #[error("storage error: {0}")]
    StorageError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = TransportError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "no reply within 30s");
    }

    #[test]
    fn test_chat_error_wraps_transport() {
        let err: ChatError = TransportError::Unauthorized.into();
        assert!(matches!(err, ChatError::Transport(TransportError::Unauthorized)));
        assert_eq!(err.to_string(), "unauthorized");
    }

    #[test]
    fn test_auth_error_display() {
        let err = AuthError::UsernameTaken("asha".to_string());
        assert_eq!(err.to_string(), "username 'asha' is already taken");
        let err = AuthError::UsernameTooLong { max: 50 };
        assert!(err.to_string().contains("50"));
    }
}
