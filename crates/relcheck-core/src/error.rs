use thiserror::Error;

use crate::json_stream::JsonStreamError;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("HTTP client could not be initialized: {0}")]
    Initialization(#[source] reqwest::Error),
    #[error("Checking for updates failed: {0}.")]
    Transport(#[source] reqwest::Error),
    #[error("Checking for updates failed with HTTP {status}{body_snippet}.")]
    HttpStatus {
        status: reqwest::StatusCode,
        body_snippet: String,
    },
    #[error("Parsing update json failed: {0}.")]
    Parse(#[from] JsonStreamError),
    #[error("Update json has an unexpected shape: {0}.")]
    MalformedRecord(String),
}

impl CheckError {
    pub(crate) fn malformed(details: impl std::fmt::Display) -> Self {
        Self::MalformedRecord(details.to_string())
    }
}
