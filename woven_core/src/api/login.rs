use crate::credentials::Credentials;

/// The request to log into the server.
pub type Req = Credentials;

/// Where the login endpoint lives. A successful response carries the session
/// token at `data.data.attributes.token`; see `session::extract_token`.
pub const PATH: &str = "/login";
