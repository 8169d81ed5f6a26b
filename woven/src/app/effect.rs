use super::{Action, Catalog};
use crate::config::Config;
use tokio::io;
use woven_core::{
    api::login,
    envelope::{self, EnvelopeClient, HttpTransport},
    session::{self, FileStore, SessionStore, SessionToken},
};

/// Connections to external services that effects use. We keep these around
/// to have some level of connection sharing for the app as a whole.
pub struct EffectContext {
    /// API client. Every call through it resolves to an `Outcome`.
    client: EnvelopeClient<HttpTransport>,

    /// Where the session token goes
    store: FileStore,
}

impl EffectContext {
    /// Get a new `EffectContext` for the configured server and data directory.
    ///
    /// ## Errors
    ///
    /// Fails if the server URL is invalid or the HTTP client can't be built.
    pub fn new(config: &Config) -> Result<Self, Problem> {
        Ok(Self {
            client: EnvelopeClient::new(HttpTransport::new(
                &config.server,
                config.request_timeout,
            )?),
            store: FileStore::in_dir(&config.data_dir()),
        })
    }
}

/// Things that can happen as a result of user input. Side effects!
#[derive(Debug)]
pub enum Effect {
    /// See whether a session token was stored by an earlier run
    CheckSession,

    /// Log in with the submitted credentials
    LogIn(login::Req),

    /// Persist the session token
    SaveSessionToken(SessionToken),

    /// Fetch a read-only catalog
    Fetch(Catalog),
}

impl Effect {
    /// Perform the side-effectful portions of this effect, returning the next
    /// `Action` the application needs to handle
    pub async fn run(self, context: &EffectContext) -> Option<Action> {
        match self.run_inner(context).await {
            Ok(action) => action,
            Err(problem) => {
                tracing::error!(?problem, "problem running effect");
                Some(Action::Problem(problem.to_string()))
            }
        }
    }

    /// The actual implementation of `run`, but with a `Result` wrapper to make
    /// it more ergonomic to write.
    async fn run_inner(self, context: &EffectContext) -> Result<Option<Action>, Problem> {
        match self {
            Self::CheckSession => {
                tracing::debug!(path = ?context.store.path(), "checking for a stored session");

                let found = context.store.get().await?.is_some();

                Ok(Some(Action::CheckedSession(found)))
            }

            Self::LogIn(req) => {
                tracing::info!("logging in");

                let outcome = context.client.login(&req).await;

                Ok(Some(Action::LoginFinished(outcome)))
            }

            Self::SaveSessionToken(token) => {
                tracing::info!("saving session token");

                // Signing in goes ahead whether or not this works, so the
                // problem is logged here instead of being returned.
                let saved = match context.store.set(&token).await {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::error!(?err, "could not save session token");
                        false
                    }
                };

                Ok(Some(Action::SavedSessionToken(saved)))
            }

            Self::Fetch(catalog) => {
                tracing::info!(catalog = catalog.title(), "fetching catalog");

                let outcome = match catalog {
                    Catalog::Models => context.client.models().await,
                    Catalog::Connectors => context.client.connectors().await,
                };

                Ok(Some(Action::Fetched(catalog, outcome)))
            }
        }
    }
}

/// Problems that can happen while starting up or running an `Effect`.
#[derive(Debug, thiserror::Error)]
pub enum Problem {
    /// We had a problem with the terminal or the disk.
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// We couldn't read or write the stored session.
    #[error("Problem with the stored session: {0}")]
    Session(#[from] session::Error),

    /// We couldn't set up the API client, for example due to a bad server
    /// URL.
    #[error("Problem setting up the API client: {0}")]
    Client(#[from] envelope::Error),
}
