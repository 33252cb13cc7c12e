pub mod deploy;
pub mod manifest;
