//! The sign-in flow: validate credentials, submit them, and on success store
//! the session token and move on to the authenticated landing route.
//!
//! `SignIn` is a pure state machine. Callers feed it `Action`s and carry out
//! the `Effect`s it returns, feeding the results back in. `submit` does that
//! loop for callers that can simply await the whole thing.

use crate::api::login;
use crate::credentials::{login_schema, Credentials, Field};
use crate::envelope::{EnvelopeClient, Outcome, Transport};
use crate::form::FormState;
use crate::session::{extract_token, SessionStore, SessionToken};

/// Label on the submit control when it can be pressed.
pub const SUBMIT_LABEL: &str = "Sign in";

/// Label on the submit control while a submission is in flight.
pub const SUBMITTING_LABEL: &str = "Logging In";

/// Views the flow can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The authenticated landing route.
    Home,
}

impl Route {
    /// The path for this route
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
        }
    }
}

/// What to do when a login succeeds but the payload has no token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingTokenPolicy {
    /// Navigate anyway, without storing anything. The token may have been
    /// set some other way (e.g. by the server as a cookie), so this is the
    /// current behavior.
    #[default]
    Proceed,

    /// Stay on the form.
    Block,
}

/// Where the flow is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the user
    Idle,

    /// A login request is in flight
    Submitting,
}

/// Things that can happen to the sign-in flow
#[derive(Debug, Clone)]
pub enum Action {
    /// The user changed a field's value
    Changed(Field, String),

    /// The user left a field
    Blurred(Field),

    /// The user asked to submit the form
    Submit,

    /// The login request finished
    LoginFinished(Outcome),
}

/// Side effects the sign-in flow needs carried out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send the credentials to the login endpoint, then report back with
    /// `Action::LoginFinished`.
    LogIn(login::Req),

    /// Persist the session token.
    StoreToken(SessionToken),

    /// Leave the form for another route.
    Navigate(Route),
}

/// The sign-in form and its submission state.
#[derive(Debug, Clone)]
pub struct SignIn {
    form: FormState<Credentials>,
    phase: Phase,
    policy: MissingTokenPolicy,
}

impl SignIn {
    /// A fresh, empty sign-in form.
    pub fn new(policy: MissingTokenPolicy) -> Self {
        Self {
            form: FormState::new(login_schema(), Credentials::default()),
            phase: Phase::Idle,
            policy,
        }
    }

    /// The form, for displaying values and errors.
    pub fn form(&self) -> &FormState<Credentials> {
        &self.form
    }

    /// Where we are in the lifecycle
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Is a submission in flight? While busy, the submit control is disabled.
    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Submitting
    }

    /// What the submit control should say right now.
    pub fn submit_label(&self) -> &'static str {
        if self.is_busy() {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    /// Handle an `Action`, updating state and producing any side effects.
    pub fn handle(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Changed(field, value) => {
                self.form.change(field, value);

                vec![]
            }
            Action::Blurred(field) => {
                self.form.blur(field);

                vec![]
            }
            Action::Submit => {
                if self.is_busy() {
                    tracing::debug!("ignoring submit while a login is in flight");
                    return vec![];
                }

                match self.form.submit() {
                    Ok(credentials) => {
                        tracing::debug!("submitting credentials");
                        self.phase = Phase::Submitting;

                        vec![Effect::LogIn(credentials)]
                    }
                    Err(errors) => {
                        tracing::debug!(fields = ?errors.keys().collect::<Vec<_>>(), "form is invalid");

                        vec![]
                    }
                }
            }
            Action::LoginFinished(outcome) => {
                if !self.is_busy() {
                    tracing::warn!("got a login result without a login in flight");
                    return vec![];
                }

                self.phase = Phase::Idle;

                match outcome {
                    Outcome::Success(payload) => self.logged_in(&payload),
                    Outcome::Failure => {
                        tracing::debug!("login failed; staying on the form");

                        vec![]
                    }
                }
            }
        }
    }

    fn logged_in(&self, payload: &serde_json::Value) -> Vec<Effect> {
        match extract_token(payload) {
            Some(token) => vec![Effect::StoreToken(token), Effect::Navigate(Route::Home)],
            None => {
                tracing::warn!(policy = ?self.policy, "login succeeded without a session token");

                match self.policy {
                    MissingTokenPolicy::Proceed => vec![Effect::Navigate(Route::Home)],
                    MissingTokenPolicy::Block => vec![],
                }
            }
        }
    }
}

/// Submit the form and carry out every resulting effect, returning the route
/// to navigate to, if any. A store failure is logged and does not stop
/// navigation.
pub async fn submit<T, S>(flow: &mut SignIn, client: &EnvelopeClient<T>, store: &S) -> Option<Route>
where
    T: Transport + Sync,
    S: SessionStore,
{
    let mut pending = flow.handle(Action::Submit);
    let mut route = None;

    while !pending.is_empty() {
        let mut next = Vec::new();

        for effect in pending {
            match effect {
                Effect::LogIn(credentials) => {
                    let outcome = client.login(&credentials).await;
                    next.extend(flow.handle(Action::LoginFinished(outcome)));
                }
                Effect::StoreToken(token) => {
                    if let Err(err) = store.set(&token).await {
                        tracing::error!(?err, "could not store session token");
                    }
                }
                Effect::Navigate(to) => route = Some(to),
            }
        }

        pending = next;
    }

    route
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::envelope::{self, Error};
    use crate::session::MemoryStore;
    use crate::test::{invalid_email, short_password, valid_credentials};
    use proptest::prelude::*;
    use secrecy::ExposeSecret;
    use serde_json::{json, Value};

    /// A transport whose every call resolves the same way.
    struct Fixed(Option<Value>);

    impl Transport for Fixed {
        async fn get(&self, _: &str) -> envelope::error::Result<Value> {
            self.answer()
        }

        async fn post(&self, _: &str, _: String) -> envelope::error::Result<Value> {
            self.answer()
        }
    }

    impl Fixed {
        fn answer(&self) -> envelope::error::Result<Value> {
            self.0
                .clone()
                .ok_or(Error::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
        }
    }

    fn token_payload(token: &str) -> Value {
        json!({ "data": { "data": { "attributes": { "token": token } } } })
    }

    fn filled(creds: &Credentials) -> SignIn {
        let mut flow = SignIn::new(MissingTokenPolicy::default());
        flow.handle(Action::Changed(Field::Email, creds.email.clone()));
        flow.handle(Action::Changed(
            Field::Password,
            creds.password.expose_secret().to_string(),
        ));
        flow
    }

    fn example() -> Credentials {
        Credentials::new("someone@example.com", "correct horse")
    }

    #[test]
    fn invalid_submit_is_blocked_and_shows_errors() {
        let mut flow = SignIn::new(MissingTokenPolicy::default());

        let effects = flow.handle(Action::Submit);

        assert!(effects.is_empty());
        assert!(!flow.is_busy());
        assert_eq!(flow.form().visible_error(Field::Email), Some("Email is required"));
        assert_eq!(
            flow.form().visible_error(Field::Password),
            Some("Password is required")
        );
    }

    #[test]
    fn valid_submit_goes_busy_and_logs_in() {
        let mut flow = filled(&example());

        let effects = flow.handle(Action::Submit);

        assert_eq!(effects, vec![Effect::LogIn(example())]);
        assert!(flow.is_busy());
        assert_eq!(flow.submit_label(), SUBMITTING_LABEL);
    }

    #[test]
    fn submit_while_busy_is_ignored() {
        let mut flow = filled(&example());
        flow.handle(Action::Submit);

        assert!(flow.handle(Action::Submit).is_empty());
        assert!(flow.is_busy());
    }

    #[test]
    fn success_stores_token_before_navigating() {
        let mut flow = filled(&example());
        flow.handle(Action::Submit);

        let effects = flow.handle(Action::LoginFinished(Outcome::Success(token_payload("T1"))));

        assert_eq!(
            effects,
            vec![
                Effect::StoreToken(SessionToken::new("T1")),
                Effect::Navigate(Route::Home)
            ]
        );
        assert!(!flow.is_busy());
        assert_eq!(flow.submit_label(), SUBMIT_LABEL);
    }

    #[test]
    fn success_without_token_still_navigates() {
        let mut flow = filled(&example());
        flow.handle(Action::Submit);

        let effects = flow.handle(Action::LoginFinished(Outcome::Success(json!({}))));

        assert_eq!(effects, vec![Effect::Navigate(Route::Home)]);
        assert!(!flow.is_busy());
    }

    #[test]
    fn success_without_token_can_be_blocked() {
        let mut flow = filled(&example());
        flow.policy = MissingTokenPolicy::Block;
        flow.handle(Action::Submit);

        let effects = flow.handle(Action::LoginFinished(Outcome::Success(json!({}))));

        assert!(effects.is_empty());
        assert!(!flow.is_busy());
    }

    #[test]
    fn failure_clears_busy_without_effects() {
        let mut flow = filled(&example());
        flow.handle(Action::Submit);

        let effects = flow.handle(Action::LoginFinished(Outcome::Failure));

        assert!(effects.is_empty());
        assert_eq!(flow.phase(), Phase::Idle);
    }

    #[test]
    fn stray_result_is_ignored() {
        let mut flow = filled(&example());

        let effects = flow.handle(Action::LoginFinished(Outcome::Success(token_payload("T1"))));

        assert!(effects.is_empty());
        assert_eq!(flow.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn submit_round_trips_token_into_store() {
        let client = EnvelopeClient::new(Fixed(Some(token_payload("T1"))));
        let store = MemoryStore::new();
        let mut flow = filled(&example());

        let route = submit(&mut flow, &client, &store).await;

        assert_eq!(route, Some(Route::Home));
        assert_eq!(store.get().await.unwrap(), Some(SessionToken::new("T1")));
        assert!(!flow.is_busy());
    }

    #[tokio::test]
    async fn submit_navigates_without_token() {
        let client = EnvelopeClient::new(Fixed(Some(json!({ "data": {} }))));
        let store = MemoryStore::new();
        let mut flow = filled(&example());

        let route = submit(&mut flow, &client, &store).await;

        assert_eq!(route, Some(Route::Home));
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn submit_failure_stays_put() {
        let client = EnvelopeClient::new(Fixed(None));
        let store = MemoryStore::new();
        let mut flow = filled(&example());

        let route = submit(&mut flow, &client, &store).await;

        assert_eq!(route, None);
        assert!(!flow.is_busy());
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn repeated_failures_never_touch_the_store() {
        let client = EnvelopeClient::new(Fixed(None));
        let store = MemoryStore::new();
        store.set(&SessionToken::new("existing")).await.unwrap();
        let mut flow = filled(&example());

        for _ in 0..5 {
            assert_eq!(submit(&mut flow, &client, &store).await, None);
        }

        assert_eq!(store.writes(), 1);
        assert_eq!(
            store.get().await.unwrap(),
            Some(SessionToken::new("existing"))
        );
    }

    #[tokio::test]
    async fn invalid_form_never_calls_the_server() {
        let client = EnvelopeClient::new(Fixed(Some(token_payload("T1"))));
        let store = MemoryStore::new();
        let mut flow = SignIn::new(MissingTokenPolicy::default());

        assert_eq!(submit(&mut flow, &client, &store).await, None);
        assert_eq!(store.writes(), 0);
    }

    proptest! {
        #[test]
        fn busy_sets_on_submit_and_clears_once(
            creds in valid_credentials(),
            succeed in any::<bool>(),
            extra_results in 0..3usize,
        ) {
            let mut flow = filled(&creds);

            let effects = flow.handle(Action::Submit);
            prop_assert_eq!(effects, vec![Effect::LogIn(creds)]);
            prop_assert!(flow.is_busy());

            let outcome = if succeed {
                Outcome::Success(token_payload("T1"))
            } else {
                Outcome::Failure
            };
            flow.handle(Action::LoginFinished(outcome.clone()));
            prop_assert!(!flow.is_busy());

            // Duplicate results must not produce more effects.
            for _ in 0..extra_results {
                prop_assert!(flow.handle(Action::LoginFinished(outcome.clone())).is_empty());
                prop_assert!(!flow.is_busy());
            }
        }

        #[test]
        fn invalid_email_never_submits(email in invalid_email(), creds in valid_credentials()) {
            let mut flow = filled(&Credentials { email, ..creds });

            prop_assert!(flow.handle(Action::Submit).is_empty());
            prop_assert!(!flow.is_busy());
            prop_assert!(flow.form().visible_error(Field::Email).is_some());
        }

        #[test]
        fn short_password_never_submits(password in short_password(), creds in valid_credentials()) {
            let mut flow = filled(&Credentials::new(creds.email, password));

            prop_assert!(flow.handle(Action::Submit).is_empty());
            prop_assert!(!flow.is_busy());
            prop_assert!(flow.form().visible_error(Field::Password).is_some());
        }

        #[test]
        fn field_edits_never_change_phase(
            edits in proptest::collection::vec((any::<Field>(), ".{0,16}"), 0..10),
        ) {
            let mut flow = filled(&example());
            flow.handle(Action::Submit);

            for (field, value) in edits {
                prop_assert!(flow.handle(Action::Changed(field, value)).is_empty());
                prop_assert!(flow.handle(Action::Blurred(field)).is_empty());
            }

            prop_assert!(flow.is_busy());
        }
    }
}
