// crates/trawl-cli/src/client.rs
//
// Thin HTTP client for the trawl-daemon API.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use trawl_rpc::error::ErrorBody;

/// Failure talking to the daemon.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The daemon answered with a non-2xx status.
    #[error("daemon returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Client bound to one daemon base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url, source })?;
        decode(resp).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.url(path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url, source })?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))?;

    if !status.is_success() {
        return Err(api_error(status.as_u16(), &bytes));
    }
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Build an [`ClientError::Api`] from an error response, falling back to the raw body.
fn api_error(status: u16, body: &[u8]) -> ClientError {
    let message = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(err) => err.error,
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    };
    ClientError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_cleanly() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.url("/health"), "http://localhost:8000/health");
        assert_eq!(client.url("labels/x"), "http://localhost:8000/labels/x");
    }

    #[test]
    fn api_error_prefers_error_field() {
        let err = api_error(400, br#"{"status":"error","error":"Invalid source: foo"}"#);
        assert_eq!(err.to_string(), "daemon returned 400: Invalid source: foo");
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let err = api_error(502, b"bad gateway");
        assert_eq!(err.to_string(), "daemon returned 502: bad gateway");
    }
}
