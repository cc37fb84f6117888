use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to locate home directory: neither HOME nor USERPROFILE is set")]
    HomeNotFound,

    #[error("source profile and mfa profile must differ (both are `{0}`)")]
    SameProfile(String),

    #[error("failed to load credentials file {path}: {source}")]
    LoadCredentials {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("failed to write credentials file {path}: {source}")]
    WriteCredentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid expiration `{value}` in profile `{profile}`: {source}")]
    InvalidExpiration {
        profile: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("empty mfa device serial number in profile `{0}` (set aws_mfa_device)")]
    MissingMfaDevice(String),

    #[error("empty device code")]
    EmptyTokenCode,

    #[error("invalid device code: expected 6 digits")]
    InvalidTokenCode,

    #[error("failed to read device code: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("`{0}` was not found in PATH")]
    CommandNotFound(String),

    #[error("failed to run {command}: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("aws cli failed {command} ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("invalid get-session-token response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}
