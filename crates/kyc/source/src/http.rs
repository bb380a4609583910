//! HTTP adapter for the hosted identity backend.

use kyc_types::{StatusReport, UserId};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::wire::RawStatusReport;
use crate::StatusSource;

/// Default client-level request timeout.
///
/// The coordinator applies its own, usually tighter, fetch timeout; this
/// is the hard backstop so a misconfigured coordinator still cannot hold a
/// connection open forever.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status source backed by the hosted verification backend.
pub struct HttpStatusSource {
    client: Client,
    base: Url,
}

impl HttpStatusSource {
    /// Create a new source against the given backend endpoint.
    pub fn new(endpoint: &str) -> SourceResult<Self> {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a new source with an explicit request timeout.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> SourceResult<Self> {
        let base = Url::parse(endpoint)
            .map_err(|e| SourceError::Transport(format!("invalid endpoint: {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(Self { client, base })
    }

    /// Build the verification URL with the user id as an encoded path
    /// segment. Ids are opaque; one containing `/` or `?` must not be able
    /// to change the request path.
    fn verification_url(&self, user_id: &UserId) -> SourceResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Transport("endpoint cannot be a base url".to_string()))?
            .pop_if_empty()
            .extend(["api", "v1", "users", user_id.as_str(), "verification"]);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self, user_id: &UserId) -> SourceResult<StatusReport> {
        let url = self.verification_url(user_id)?;
        debug!(user_id = %user_id, url = %url, "fetching verification status");

        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SourceError::UnknownUser(user_id.to_string())),
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                Err(SourceError::Backend {
                    status: status.as_u16(),
                    message,
                })
            }
            _ => {
                let raw: RawStatusReport = response.json().await?;
                Ok(raw.normalize())
            }
        }
    }
}
