use super::error::{Error, Result};
use super::Transport;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Send requests to the API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Shared HTTP client, for connection reuse.
    http: reqwest::Client,

    /// Where the API lives, e.g. `https://api.example.com/api/v1/`. Endpoint
    /// paths are resolved relative to this.
    base: Url,
}

impl HttpTransport {
    /// Construct a transport for the API at `server`. Without a timeout,
    /// requests may wait forever.
    ///
    /// ## Errors
    ///
    /// Fails if `server` is not a valid URL or the HTTP client can't be built
    /// (for example if TLS could not be initialized.)
    pub fn new(server: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base: base_url(server)?,
        })
    }

    /// Where a given endpoint lives.
    ///
    /// ## Errors
    ///
    /// Fails if the endpoint can't be joined onto the base URL.
    pub fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base.join(endpoint.trim_start_matches('/'))?)
    }

    /// Convert an HTTP response into a payload. Only 2xx counts as success.
    async fn handle_response(req: reqwest::RequestBuilder) -> Result<Value> {
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status(status));
        }

        Ok(parse_body(resp.text().await?))
    }
}

impl Transport for HttpTransport {
    async fn get(&self, endpoint: &str) -> Result<Value> {
        let url = self.url(endpoint)?;

        Self::handle_response(self.http.get(url)).await
    }

    async fn post(&self, endpoint: &str, body: String) -> Result<Value> {
        let url = self.url(endpoint)?;

        Self::handle_response(
            self.http
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body),
        )
        .await
    }
}

/// Parse a base URL so that endpoints join *under* its path instead of
/// replacing the last segment.
fn base_url(server: &str) -> Result<Url> {
    let mut base = Url::parse(server.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    Ok(base)
}

/// Bodies are JSON when they can be; otherwise we keep the text.
fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    }
}
