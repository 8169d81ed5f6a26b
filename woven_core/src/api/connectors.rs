/// Where the connector catalog lives. Read-only; requests carry no body.
pub const PATH: &str = "/connectors";
