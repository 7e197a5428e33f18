//! # Client Error Taxonomy
//!
//! Every request a view makes ends in either a result or exactly one
//! [`ClientError`]. The four variants map onto distinct user-visible message
//! categories:
//!
//! - [`ClientError::Validation`]: local precondition failed, nothing was sent
//! - [`ClientError::Server`]: the backend answered with an error status
//! - [`ClientError::Connectivity`]: the request went out but no response came back
//! - [`ClientError::Unexpected`]: any other local failure
//!
//! None of them are retried automatically; the view returns to an interactive
//! state and the user triggers the next attempt.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed text shown for every connectivity failure.
pub const CONNECTIVITY_MESSAGE: &str = "Could not connect to the server.";

/// The user-facing operation a request belongs to. Selects the message prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Verification,
    Registration,
    AddStudent,
    LoadRoster,
}

impl Action {
    pub fn failure_prefix(self) -> &'static str {
        match self {
            Action::Verification => "Verification failed",
            Action::Registration => "Registration failed",
            Action::AddStudent => "Failed to add student",
            Action::LoadRoster => "Failed to load students",
        }
    }
}

/// Category of a [`ClientError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    Server,
    Connectivity,
    Unexpected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The backend responded with a non-success status.
    ///
    /// `reported` holds the `error` field of the payload when there was one;
    /// `status_text` is the canonical reason phrase of `status`.
    #[error("{}", .reported.as_deref().unwrap_or(.status_text))]
    Server {
        status: u16,
        reported: Option<String>,
        status_text: String,
    },

    #[error("{}", CONNECTIVITY_MESSAGE)]
    Connectivity,

    #[error("{0}")]
    Unexpected(String),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn unexpected(message: impl ToString) -> Self {
        ClientError::Unexpected(message.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Server { .. } => ErrorKind::Server,
            ClientError::Connectivity => ErrorKind::Connectivity,
            ClientError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Text to show the user for a failure of `action`.
    ///
    /// Server-reported messages and validation messages are shown verbatim;
    /// everything else is prefixed with the action's failure prefix.
    pub fn user_message(&self, action: Action) -> String {
        let prefix = action.failure_prefix();
        match self {
            ClientError::Validation(message) => message.clone(),
            ClientError::Server {
                reported: Some(message),
                ..
            } => message.clone(),
            ClientError::Server {
                reported: None,
                status_text,
                ..
            } => format!("{}: {}", prefix, status_text),
            ClientError::Connectivity => format!("{}: {}", prefix, CONNECTIVITY_MESSAGE),
            ClientError::Unexpected(message) => format!("{}: {}", prefix, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_verbatim() {
        let err = ClientError::Server {
            status: 404,
            reported: Some("Could not find students with IDs: [9]".into()),
            status_text: "Not Found".into(),
        };
        assert_eq!(
            err.user_message(Action::Registration),
            "Could not find students with IDs: [9]"
        );
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[test]
    fn server_without_payload_falls_back_to_status_text() {
        let err = ClientError::Server {
            status: 502,
            reported: None,
            status_text: "Bad Gateway".into(),
        };
        assert_eq!(
            err.user_message(Action::Verification),
            "Verification failed: Bad Gateway"
        );
        assert_eq!(err.to_string(), "Bad Gateway");
    }

    #[test]
    fn connectivity_message_is_fixed_per_action() {
        assert_eq!(
            ClientError::Connectivity.user_message(Action::AddStudent),
            "Failed to add student: Could not connect to the server."
        );
        assert_eq!(
            ClientError::Connectivity.user_message(Action::Registration),
            "Registration failed: Could not connect to the server."
        );
    }

    #[test]
    fn validation_and_unexpected_render_differently() {
        let validation = ClientError::validation("Please enter the guardian's name.");
        assert_eq!(
            validation.user_message(Action::Registration),
            "Please enter the guardian's name."
        );

        let unexpected = ClientError::unexpected("builder error");
        assert_eq!(
            unexpected.user_message(Action::Registration),
            "Registration failed: builder error"
        );
    }
}
