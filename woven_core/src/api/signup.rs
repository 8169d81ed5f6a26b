/// Where the account creation endpoint lives.
pub const PATH: &str = "/signup";
