//! The client-side sign-in pipeline, independent of any particular UI:
//! form validation, a uniform envelope around API calls, session token
//! storage, and the state machine tying them together.

/// Declarative per-field validation and touched/blur bookkeeping.
pub mod form;
pub use form::{FormState, Rule, Schema};

/// What the sign-in form collects and the rules it follows.
pub mod credentials;
pub use credentials::{Credentials, Field};

/// Endpoint paths.
pub mod api;

/// Talk to the API without ever surfacing an error to the caller.
pub mod envelope;
pub use envelope::{EnvelopeClient, HttpTransport, Outcome, Transport};

/// Where the session token comes from and where it goes.
pub mod session;
pub use session::{FileStore, MemoryStore, SessionStore, SessionToken};

/// The sign-in state machine.
pub mod signin;
pub use signin::{MissingTokenPolicy, SignIn};
