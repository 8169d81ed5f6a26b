/// Where the model catalog lives. Read-only; requests carry no body.
pub const PATH: &str = "/models";
