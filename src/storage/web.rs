//! Remote fetch tier.
//!
//! Every read issues one GET against a fixed endpoint. The tier is always
//! read-only and never expires; freshness is whatever the remote returns.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::storage::{Payload, Storage, StorageError};

/// Query parameter carrying the access token.
const APP_ID_PARAM: &str = "app_id";

/// HTTP GET tier.
pub struct WebServiceStorage<T> {
    client: Client,
    /// Endpoint without credentials, safe to log.
    endpoint: Url,
    /// Endpoint with the access token attached.
    request_url: Url,
    _payload: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for WebServiceStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebServiceStorage")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl<T: Payload> WebServiceStorage<T> {
    /// Create a tier fetching from `url`.
    ///
    /// `app_id`, when given, is appended as the `app_id` query parameter.
    /// `timeout` bounds each request end to end.
    pub fn new(url: &str, app_id: Option<&str>, timeout: Duration) -> Result<Self, StorageError> {
        if timeout.is_zero() {
            return Err(StorageError::InvalidConfig(
                "web tier timeout must be non-zero".to_string(),
            ));
        }

        let endpoint = Url::parse(url)
            .map_err(|e| StorageError::InvalidConfig(format!("invalid web tier URL {url:?}: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(StorageError::InvalidConfig(format!(
                "web tier URL must be http or https, got {}",
                endpoint.scheme()
            )));
        }

        let mut request_url = endpoint.clone();
        if let Some(app_id) = app_id.filter(|id| !id.is_empty()) {
            request_url
                .query_pairs_mut()
                .append_pair(APP_ID_PARAM, app_id);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            request_url,
            _payload: PhantomData,
        })
    }

    /// Endpoint this tier fetches from, without credentials.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl<T: Payload> Storage<T> for WebServiceStorage<T> {
    fn name(&self) -> &str {
        "web"
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn expiration(&self) -> Option<Duration> {
        None
    }

    async fn is_expired(&self) -> bool {
        false
    }

    async fn read(&self) -> Result<Option<T>, StorageError> {
        let response = self.client.get(self.request_url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Status {
                status,
                url: self.endpoint.to_string(),
            });
        }

        let body = response.bytes().await?;
        let value = serde_json::from_slice(&body)?;

        debug!(endpoint = %self.endpoint, size = body.len(), "Fetched remote value");
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_invalid_url_rejected() {
        let result = WebServiceStorage::<f64>::new("not a url", None, TIMEOUT);
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));

        let result = WebServiceStorage::<f64>::new("ftp://example.com/rates", None, TIMEOUT);
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result =
            WebServiceStorage::<f64>::new("https://example.com/latest.json", None, Duration::ZERO);
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn test_app_id_kept_out_of_endpoint() {
        let tier = WebServiceStorage::<f64>::new(
            "https://example.com/latest.json",
            Some("secret"),
            TIMEOUT,
        )
        .unwrap();

        assert_eq!(tier.endpoint().as_str(), "https://example.com/latest.json");
        assert_eq!(
            tier.request_url.as_str(),
            "https://example.com/latest.json?app_id=secret"
        );
        assert!(!format!("{tier:?}").contains("secret"));
    }

    #[tokio::test]
    async fn test_write_always_rejected() {
        let tier =
            WebServiceStorage::<f64>::new("https://example.com/latest.json", None, TIMEOUT).unwrap();

        assert!(tier.is_read_only());
        assert!(!tier.is_expired().await);
        assert!(matches!(
            tier.write(&1.0).await,
            Err(StorageError::ReadOnly { tier }) if tier == "web"
        ));
    }
}
