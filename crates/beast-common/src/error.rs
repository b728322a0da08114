//! Error types shared by every crate in the workspace.
//!
//! [`BotError`] is the taxonomy command handlers and the scheduler speak in.
//! User-facing variants carry an already localized message; fault variants
//! carry operator detail and are logged before a generic reply is sent.

use crate::types::UserId;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

/// Platform JSON error code for "cannot send messages to this user".
pub const RECIPIENT_UNREACHABLE_CODE: isize = 50007;

/// Failure of an outbound call to the chat platform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutboundError {
    /// The user does not accept direct messages from the bot.
    #[error("user {0} cannot receive direct messages")]
    RecipientUnreachable(UserId),

    /// The target channel, member or message does not exist or is not visible.
    #[error("{0} not found")]
    NotFound(String),

    /// The platform refused the request for lack of permissions.
    #[error("missing permissions: {0}")]
    Forbidden(String),

    /// The call did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Any other transport or API failure.
    #[error("platform request failed: {0}")]
    Request(String),
}

impl OutboundError {
    /// Whether this is the dedicated "recipient unreachable" failure.
    #[must_use]
    pub const fn is_recipient_unreachable(&self) -> bool {
        matches!(self, Self::RecipientUnreachable(_))
    }
}

/// Main error type for command handling and background work.
#[derive(Error, Debug)]
pub enum BotError {
    /// Malformed or missing command arguments.
    #[error("{message}")]
    Validation {
        /// Option the problem was found in, if any.
        field: Option<String>,
        /// User-facing explanation.
        message: String,
    },

    /// The invoking user lacks a capability or owner status.
    #[error("{0}")]
    Permission(String),

    /// The command is disabled or a restricted mode is active.
    #[error("{0}")]
    GuardRejection(String),

    /// A downstream call failed.
    #[error("external service error: {0}")]
    ExternalService(#[from] OutboundError),

    /// The configuration store could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used for logging and reply selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`BotError::Validation`].
    Validation,
    /// See [`BotError::Permission`].
    Permission,
    /// See [`BotError::GuardRejection`].
    GuardRejection,
    /// A downstream failure other than an unreachable recipient.
    ExternalService,
    /// Direct message refused by the recipient.
    RecipientUnreachable,
    /// Store failure.
    Persistence,
}

impl BotError {
    /// Create a validation error for a specific option.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Create a validation error not tied to one option.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Create a permission error.
    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission(message.into())
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// The taxonomy bucket this error falls into.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Permission(_) => ErrorKind::Permission,
            Self::GuardRejection(_) => ErrorKind::GuardRejection,
            Self::ExternalService(OutboundError::RecipientUnreachable(_)) => {
                ErrorKind::RecipientUnreachable
            }
            Self::ExternalService(_) => ErrorKind::ExternalService,
            Self::Persistence(_) | Self::Io(_) => ErrorKind::Persistence,
        }
    }

    /// Whether the message may be shown to the user verbatim.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::Permission | ErrorKind::GuardRejection
        )
    }

    /// Whether this is a system fault that operators should see in the logs.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        !self.is_user_facing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(BotError::invalid("time", "bad").kind(), ErrorKind::Validation);
        assert!(BotError::permission("no").is_user_facing());
        assert!(BotError::GuardRejection("off".into()).is_user_facing());

        let unreachable = BotError::from(OutboundError::RecipientUnreachable(UserId(1)));
        assert_eq!(unreachable.kind(), ErrorKind::RecipientUnreachable);
        assert!(unreachable.is_fault());

        let generic = BotError::from(OutboundError::Request("boom".into()));
        assert_eq!(generic.kind(), ErrorKind::ExternalService);
        assert!(BotError::persistence("disk full").is_fault());
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = BotError::invalid("amount", "Anzahl zwischen 1 und 100.");
        assert_eq!(err.to_string(), "Anzahl zwischen 1 und 100.");
    }
}
