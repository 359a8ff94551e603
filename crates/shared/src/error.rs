use serde::Deserialize;
use thiserror::Error;

use crate::lenient;

/// The `{error: "..."}` body the server attaches to failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default, deserialize_with = "lenient::text")]
    pub error: Option<String>,
}

/// A failure reported by the server, either through a non-2xx status or an `error`
/// field in an auth response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServerError {
    pub status: u16,
    pub message: String,
}

impl ServerError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    // The server only reports these cases in prose, so the wording checks live here
    // and nowhere else.
    fn lowered(&self) -> String {
        self.message.to_lowercase()
    }

    /// The caller is not allowed to see the channel because they have not joined it.
    pub fn denies_membership(&self) -> bool {
        let message = self.lowered();
        (message.contains("not") && message.contains("member"))
            || message.contains("403")
            || message.contains("forbidden")
    }

    pub fn reports_already_member(&self) -> bool {
        let message = self.lowered();
        message.contains("already") && message.contains("member")
    }

    pub fn requires_invite(&self) -> bool {
        let message = self.lowered();
        message.contains("private") || message.contains("invite") || message.contains("403")
    }
}
