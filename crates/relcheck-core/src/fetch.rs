use async_trait::async_trait;
use futures_util::StreamExt;
use log::debug;

use crate::error::CheckError;
use crate::json_stream::JsonStreamParser;
use crate::manifest::{UpdateDescription, filter_releases};

/// Release manifest location, fixed at build time.
pub const UPDATE_ENDPOINT: &str = match option_env!("RELCHECK_UPDATE_ENDPOINT") {
    Some(endpoint) => endpoint,
    None => "https://updates.relcheck.org/releases.json",
};

pub const USER_AGENT: &str = "relcheck";

const MAX_REDIRECTS: usize = 10;

/// Source of release descriptions newer than the running build.
#[async_trait]
pub trait ReleaseFeed: Send + Sync {
    async fn fetch_updates(
        &self,
        current_revision: i64,
    ) -> Result<Vec<UpdateDescription>, CheckError>;
}

/// Fetches the manifest over HTTP. A fresh client is built for every check,
/// so a transport that cannot be initialized fails that check only.
#[derive(Debug, Clone)]
pub struct HttpReleaseFeed {
    endpoint: String,
    user_agent: String,
}

impl HttpReleaseFeed {
    pub fn new(endpoint: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Feed pointed at the build-time endpoint.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(UPDATE_ENDPOINT, USER_AGENT)
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn client(&self) -> Result<reqwest::Client, CheckError> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(CheckError::Initialization)
    }
}

#[async_trait]
impl ReleaseFeed for HttpReleaseFeed {
    async fn fetch_updates(
        &self,
        current_revision: i64,
    ) -> Result<Vec<UpdateDescription>, CheckError> {
        debug!("Fetching release manifest from {}", self.endpoint);

        let response = self
            .client()?
            .get(&self.endpoint)
            .send()
            .await
            .map_err(CheckError::Transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body_snippet = response
                .text()
                .await
                .ok()
                .map(|body| response_snippet(&body, 160))
                .unwrap_or_default();
            return Err(CheckError::HttpStatus {
                status,
                body_snippet,
            });
        }

        let mut parser = JsonStreamParser::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(CheckError::Transport)?;
            parser.write(&chunk)?;
        }
        debug!("Release manifest received ({} bytes)", parser.bytes_consumed());

        filter_releases(parser.finish()?, current_revision)
    }
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.trim().chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpReleaseFeed, UPDATE_ENDPOINT, response_snippet};

    #[test]
    fn response_snippet_truncates_and_prefixes() {
        assert_eq!(response_snippet("  not found \n", 160), ": not found");
        assert_eq!(response_snippet("abcdef", 3), ": abc");
        assert_eq!(response_snippet("   ", 160), "");
    }

    #[test]
    fn default_feed_targets_build_endpoint() {
        let feed = HttpReleaseFeed::with_defaults();
        assert_eq!(feed.endpoint(), UPDATE_ENDPOINT);
        assert!(feed.client().is_ok());
    }
}
