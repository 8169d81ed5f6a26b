use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::process::ExitCode;
use woven_core::{
    signin::{self, Route},
    MissingTokenPolicy, Outcome,
};

/// Things that can happen to this app
mod action;
pub use action::{Action, Catalog};

/// The sign-in form
mod auth_form;
use auth_form::AuthForm;

/// Side effects
mod effect;
pub use effect::{Effect, EffectContext, Problem};

/// The "functional core" of the app.
pub struct App {
    /// Status to display (visible at the bottom of the screen)
    status_line: Option<String>,

    /// Where the app is in its lifecycle
    state: AppState,

    /// Where to go once the session token has been saved
    after_save: Option<Route>,
}

impl App {
    /// Create a new instance of the app, starting on the sign-in form.
    pub fn new(policy: MissingTokenPolicy) -> Self {
        Self {
            status_line: None,
            state: AppState::SigningIn(AuthForm::new(policy)),
            after_save: None,
        }
    }

    /// Render the app's UI to the screen
    pub fn render(&mut self, frame: &mut Frame) {
        let vertical = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]);
        let [body_area, status_area] = vertical.areas(frame.area());

        match &self.state {
            AppState::SigningIn(form) => form.render(body_area, frame),
            AppState::Home(home) => home.render(body_area, frame),
            AppState::Exiting(_) => frame.render_widget(Paragraph::new("Exiting…"), body_area),
        }

        let status = Paragraph::new(match &self.status_line {
            Some(line) => line.as_str(),
            None => "Tab: next field · Enter: sign in · Esc: quit",
        });

        frame.render_widget(status, status_area);
    }

    /// Produce any side effects as needed to initialize the app.
    #[expect(clippy::unused_self)]
    pub fn init(&self) -> Effect {
        Effect::CheckSession
    }

    /// Handle an `Action`, updating the app's state and producing some side effect(s)
    pub fn handle(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::CheckedSession(found) => {
                if found {
                    self.status_line = Some("Found a saved session".to_owned());
                }

                vec![]
            }
            Action::LoginFinished(outcome) => match &mut self.state {
                AppState::SigningIn(form) => {
                    let effects = form.handle(signin::Action::LoginFinished(outcome));
                    self.apply(effects)
                }
                _ => vec![],
            },
            Action::SavedSessionToken(saved) => {
                if let Some(route) = self.after_save.take() {
                    self.navigate(route);
                }

                self.status_line = Some(if saved {
                    "Signed in".to_owned()
                } else {
                    "Signed in, but the session could not be saved".to_owned()
                });

                vec![]
            }
            Action::Fetched(catalog, outcome) => {
                if let AppState::Home(home) = &mut self.state {
                    home.loading = None;
                    home.showing = Some((catalog, outcome));
                }

                vec![]
            }
            Action::Key(key) => self.handle_key(key),
            Action::Problem(problem) => {
                self.status_line = Some(problem);

                vec![]
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.kind != KeyEventKind::Press {
            return vec![];
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return self.exit();
        }

        match &mut self.state {
            AppState::SigningIn(form) => {
                if key.code == KeyCode::Esc {
                    return self.exit();
                }

                if self.after_save.is_some() {
                    return vec![];
                }

                let effects = form.handle_key(key);
                self.apply(effects)
            }
            AppState::Home(home) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.exit(),
                KeyCode::Char('m') => home.fetch(Catalog::Models),
                KeyCode::Char('c') => home.fetch(Catalog::Connectors),
                _ => {
                    self.status_line = Some(format!("Unknown key {:?}", key.code));

                    vec![]
                }
            },
            AppState::Exiting(_) => vec![],
        }
    }

    /// Carry out the sign-in flow's effects. Navigation happens right here,
    /// unless a token is being saved, in which case it waits for the save to
    /// finish. Everything else is handed to the effect runner.
    fn apply(&mut self, effects: Vec<signin::Effect>) -> Vec<Effect> {
        let mut out = Vec::with_capacity(effects.len());
        let mut saving = false;

        for effect in effects {
            match effect {
                signin::Effect::LogIn(req) => out.push(Effect::LogIn(req)),
                signin::Effect::StoreToken(token) => {
                    saving = true;
                    out.push(Effect::SaveSessionToken(token));
                }
                signin::Effect::Navigate(route) if saving => {
                    self.after_save = Some(route);
                    self.status_line = Some("Saving session…".to_owned());
                }
                signin::Effect::Navigate(route) => {
                    self.navigate(route);
                    self.status_line = Some("Signed in".to_owned());
                }
            }
        }

        out
    }

    fn navigate(&mut self, route: Route) {
        tracing::info!(path = route.path(), "navigating");

        match route {
            Route::Home => self.state = AppState::Home(Home::default()),
        }
    }

    fn exit(&mut self) -> Vec<Effect> {
        self.state = AppState::Exiting(ExitCode::SUCCESS);

        vec![]
    }

    /// Let the TUI manager know whether we're all wrapped up and can exit.
    pub fn should_exit(&self) -> Option<ExitCode> {
        if let AppState::Exiting(code) = &self.state {
            Some(*code)
        } else {
            None
        }
    }
}

/// App lifecycle
#[derive(Debug)]
enum AppState {
    /// Collecting credentials
    SigningIn(AuthForm),

    /// Signed in, on the landing view
    Home(Home),

    /// We're done and want the following exit code after final effects
    Exiting(ExitCode),
}

/// The authenticated landing view
#[derive(Debug, Default)]
struct Home {
    /// A catalog fetch in flight
    loading: Option<Catalog>,

    /// The last catalog we fetched and how it went
    showing: Option<(Catalog, Outcome)>,
}

impl Home {
    fn fetch(&mut self, catalog: Catalog) -> Vec<Effect> {
        if self.loading.is_some() {
            return vec![];
        }

        self.loading = Some(catalog);

        vec![Effect::Fetch(catalog)]
    }

    fn render(&self, body_area: Rect, frame: &mut Frame) {
        let (title, body) = match (&self.loading, &self.showing) {
            (Some(catalog), _) => (catalog.title(), "Loading…".to_owned()),
            (None, Some((catalog, Outcome::Success(payload)))) => (
                catalog.title(),
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string()),
            ),
            (None, Some((catalog, Outcome::Failure))) => {
                (catalog.title(), "Could not load. Try again?".to_owned())
            }
            (None, None) => (
                "Welcome",
                "m: models · c: connectors · q: quit".to_owned(),
            ),
        };

        frame.render_widget(
            Paragraph::new(body)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(title)),
            body_area,
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use woven_core::SessionToken;

    fn press(code: KeyCode) -> Action {
        Action::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            assert!(app.handle(press(KeyCode::Char(c))).is_empty());
        }
    }

    fn submitted(policy: MissingTokenPolicy) -> App {
        let mut app = App::new(policy);
        type_str(&mut app, "someone@example.com");
        app.handle(press(KeyCode::Tab));
        type_str(&mut app, "correct horse");

        let effects = app.handle(press(KeyCode::Enter));
        assert!(matches!(effects.as_slice(), [Effect::LogIn(_)]));

        app
    }

    fn token_payload() -> serde_json::Value {
        json!({ "data": { "data": { "attributes": { "token": "T1" } } } })
    }

    #[test]
    fn successful_login_saves_token_before_going_home() {
        let mut app = submitted(MissingTokenPolicy::default());

        let effects = app.handle(Action::LoginFinished(Outcome::Success(token_payload())));

        assert!(matches!(
            effects.as_slice(),
            [Effect::SaveSessionToken(token)] if *token == SessionToken::new("T1")
        ));
        assert!(matches!(app.state, AppState::SigningIn(_)));

        assert!(app.handle(Action::SavedSessionToken(true)).is_empty());
        assert!(matches!(app.state, AppState::Home(_)));
    }

    #[test]
    fn unsaved_token_still_goes_home() {
        let mut app = submitted(MissingTokenPolicy::default());
        app.handle(Action::LoginFinished(Outcome::Success(token_payload())));

        app.handle(Action::SavedSessionToken(false));

        assert!(matches!(app.state, AppState::Home(_)));
        assert_eq!(
            app.status_line.as_deref(),
            Some("Signed in, but the session could not be saved")
        );
    }

    #[test]
    fn form_ignores_keys_while_saving() {
        let mut app = submitted(MissingTokenPolicy::default());
        app.handle(Action::LoginFinished(Outcome::Success(token_payload())));

        assert!(app.handle(press(KeyCode::Enter)).is_empty());
        assert!(matches!(app.state, AppState::SigningIn(_)));
    }

    #[test]
    fn login_without_token_still_goes_home() {
        let mut app = submitted(MissingTokenPolicy::Proceed);

        let effects = app.handle(Action::LoginFinished(Outcome::Success(json!({}))));

        assert!(effects.is_empty());
        assert!(matches!(app.state, AppState::Home(_)));
    }

    #[test]
    fn failed_login_stays_on_the_form() {
        let mut app = submitted(MissingTokenPolicy::default());

        let effects = app.handle(Action::LoginFinished(Outcome::Failure));

        assert!(effects.is_empty());
        match &app.state {
            AppState::SigningIn(form) => assert!(!form.flow().is_busy()),
            other => panic!("expected to stay on the form, got {other:?}"),
        }
    }

    #[test]
    fn home_fetches_one_catalog_at_a_time() {
        let mut app = submitted(MissingTokenPolicy::default());
        app.handle(Action::LoginFinished(Outcome::Success(json!({}))));

        assert!(matches!(
            app.handle(press(KeyCode::Char('m'))).as_slice(),
            [Effect::Fetch(Catalog::Models)]
        ));
        assert!(app.handle(press(KeyCode::Char('c'))).is_empty());

        app.handle(Action::Fetched(Catalog::Models, Outcome::Failure));

        assert!(matches!(
            app.handle(press(KeyCode::Char('c'))).as_slice(),
            [Effect::Fetch(Catalog::Connectors)]
        ));
    }

    #[test]
    fn escape_exits_from_the_form() {
        let mut app = App::new(MissingTokenPolicy::default());

        app.handle(press(KeyCode::Esc));

        assert_eq!(app.should_exit(), Some(ExitCode::SUCCESS));
    }
}
