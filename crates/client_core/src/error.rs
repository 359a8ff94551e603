use shared::error::ServerError;
use thiserror::Error;

use crate::session::SessionStoreError;

/// Which part of the taxonomy a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Blocked locally before any request was sent.
    Validation,
    Transport,
    Server,
    Session,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid {0} id")]
    InvalidId(&'static str),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("You need to be invited to join this private channel.")]
    InvitationRequired,
    #[error("invalid server url: {0}")]
    InvalidServerUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("session storage failed: {0}")]
    Session(#[from] SessionStoreError),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidId(_) | Self::InvalidServerUrl(_) => {
                ErrorKind::Validation
            }
            Self::NotLoggedIn | Self::Session(_) => ErrorKind::Session,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Server(_) | Self::InvitationRequired => ErrorKind::Server,
        }
    }

    pub fn server(&self) -> Option<&ServerError> {
        match self {
            Self::Server(err) => Some(err),
            _ => None,
        }
    }

    pub fn denies_membership(&self) -> bool {
        self.server().is_some_and(ServerError::denies_membership)
    }

    pub fn reports_already_member(&self) -> bool {
        self.server().is_some_and(ServerError::reports_already_member)
    }

    pub fn requires_invite(&self) -> bool {
        self.server().is_some_and(ServerError::requires_invite)
    }
}
