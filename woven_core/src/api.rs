//! Where the API's endpoints live. Paths are relative to the configured
//! server, so `/login` on `https://example.com/api/v1` is
//! `https://example.com/api/v1/login`.

/// Log in with email and password
pub mod login;

/// Create an account
pub mod signup;

/// Confirm an account with a verification code
pub mod verify_code;

/// The model catalog
pub mod models;

/// The connector catalog
pub mod connectors;
