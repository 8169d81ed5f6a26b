use crossterm::event::KeyEvent;
use woven_core::Outcome;

/// Things that can happen to this app
#[derive(Debug)]
pub enum Action {
    /// We checked for a stored session token at startup
    CheckedSession(bool),

    /// The login request finished
    LoginFinished(Outcome),

    /// We tried to save the session token. Holds whether it worked.
    SavedSessionToken(bool),

    /// A catalog fetch finished
    Fetched(Catalog, Outcome),

    /// The user did something on the keyboard
    Key(KeyEvent),

    /// Something bad happened; display it to the user
    Problem(String),
}

/// The read-only listings available after signing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    /// Available models
    Models,

    /// Available connectors
    Connectors,
}

impl Catalog {
    /// A title for displaying this catalog
    pub fn title(self) -> &'static str {
        match self {
            Self::Models => "Models",
            Self::Connectors => "Connectors",
        }
    }
}
