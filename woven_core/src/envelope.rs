use crate::api::{connectors, login, models, signup, verify_code};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;

/// Things that can go wrong in the transport
pub mod error;
pub use error::Error;

/// The reqwest-backed transport
pub mod http;
pub use http::HttpTransport;

/// The result of every call through the `EnvelopeClient`. Callers only ever
/// see these two cases; the reason for a failure is logged, not returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The server accepted the request. Holds the response body.
    Success(Value),

    /// Something went wrong (network, status, encoding.)
    Failure,
}

impl Outcome {
    /// Did the call succeed?
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Something that can send requests to the API. Endpoints are paths like
/// `/login`; the transport decides where they live.
pub trait Transport {
    /// Fetch an endpoint without a body.
    fn get(&self, endpoint: &str) -> impl Future<Output = error::Result<Value>> + Send;

    /// Submit an already-serialized JSON body to an endpoint.
    fn post(&self, endpoint: &str, body: String)
        -> impl Future<Output = error::Result<Value>> + Send;
}

/// Wraps a `Transport` so that every call resolves to an `Outcome` instead of
/// an error.
#[derive(Debug, Clone)]
pub struct EnvelopeClient<T> {
    transport: T,
}

impl<T: Transport + Sync> EnvelopeClient<T> {
    /// Construct a new client
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request. With no payload this is a read (GET); with a payload,
    /// the payload is serialized to JSON and submitted (POST).
    pub async fn send<B>(&self, endpoint: &str, payload: Option<&B>) -> Outcome
    where
        B: Serialize + Sync + ?Sized,
    {
        match self.send_inner(endpoint, payload).await {
            Ok(payload) => Outcome::Success(payload),
            Err(err) => {
                tracing::error!(endpoint, ?err, "API request failed");
                Outcome::Failure
            }
        }
    }

    /// The actual implementation of `send`, but with a `Result` wrapper to make
    /// it more ergonomic to write.
    async fn send_inner<B>(&self, endpoint: &str, payload: Option<&B>) -> error::Result<Value>
    where
        B: Serialize + Sync + ?Sized,
    {
        match payload {
            None => self.transport.get(endpoint).await,
            Some(payload) => {
                let body = serde_json::to_string(payload)?;
                self.transport.post(endpoint, body).await
            }
        }
    }

    /// Log in with credentials (or anything shaped like them.)
    #[tracing::instrument(skip_all)]
    pub async fn login<B>(&self, values: &B) -> Outcome
    where
        B: Serialize + Sync + ?Sized,
    {
        self.send(login::PATH, Some(values)).await
    }

    /// Create a new account.
    #[tracing::instrument(skip_all)]
    pub async fn sign_up<B>(&self, values: &B) -> Outcome
    where
        B: Serialize + Sync + ?Sized,
    {
        self.send(signup::PATH, Some(values)).await
    }

    /// Submit an account verification code.
    #[tracing::instrument(skip_all)]
    pub async fn verify_account<B>(&self, values: &B) -> Outcome
    where
        B: Serialize + Sync + ?Sized,
    {
        self.send(verify_code::PATH, Some(values)).await
    }

    /// Fetch every available model.
    pub async fn models(&self) -> Outcome {
        self.send::<()>(models::PATH, None).await
    }

    /// Fetch every available connector.
    pub async fn connectors(&self) -> Outcome {
        self.send::<()>(connectors::PATH, None).await
    }
}
