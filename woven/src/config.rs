use clap::Parser;
use std::{path::PathBuf, time::Duration};
use woven_core::MissingTokenPolicy;

/// A terminal client for signing in to a woven server
#[derive(Debug, Parser)]
#[clap(version)]
pub struct Config {
    /// Where the API lives. Endpoint paths are added to the end of this.
    #[clap(long, env = "WOVEN_SERVER", default_value = "http://localhost:3000/api/v1")]
    pub server: String,

    /// Where should we store the session and logs?
    #[clap(long, env = "WOVEN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Stay on the sign-in form if a successful login doesn't include a
    /// session token, instead of continuing without one.
    #[clap(long, env = "WOVEN_BLOCK_WITHOUT_TOKEN")]
    block_without_token: bool,

    /// Give up on requests after this many seconds. Requests wait forever if
    /// this is not set.
    #[clap(long, env = "WOVEN_REQUEST_TIMEOUT", value_parser = duration_parser)]
    pub request_timeout: Option<Duration>,
}

fn duration_parser(s: &str) -> Result<Duration, std::num::ParseIntError> {
    s.parse().map(Duration::from_secs)
}

impl Config {
    /// Get either the configured or a default data directory. If no data
    /// directory can be found (e.g. because `$HOME` is unset) we will use the
    /// current directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| {
                directories::ProjectDirs::from("com", "woven", "woven")
                    .map(|dirs| dirs.data_local_dir().to_owned())
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// What to do when a login succeeds without a token.
    pub fn missing_token_policy(&self) -> MissingTokenPolicy {
        if self.block_without_token {
            MissingTokenPolicy::Block
        } else {
            MissingTokenPolicy::Proceed
        }
    }
}
