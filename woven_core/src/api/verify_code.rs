/// Where the account verification endpoint lives.
pub const PATH: &str = "/verify_code";
