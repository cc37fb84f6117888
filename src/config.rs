use crate::error::{Error, Result};
use std::path::PathBuf;

const DEFAULT_AWS_CLI: &str = "aws";

/// Settings for a single refresh run, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub credentials_file: PathBuf,
    pub default_profile: String,
    pub mfa_profile: String,
    pub token_code: Option<String>,
    pub duration_seconds: Option<u32>,
    pub force: bool,
    pub aws_cli: String,
}

impl Config {
    pub fn new(credentials_file: PathBuf, default_profile: String, mfa_profile: String) -> Self {
        Self {
            credentials_file,
            default_profile,
            mfa_profile,
            token_code: None,
            duration_seconds: None,
            force: false,
            aws_cli: String::from(DEFAULT_AWS_CLI),
        }
    }

    /// Resolves the credentials file from the process environment unless an
    /// explicit path is given.
    pub fn load_from_env(
        credentials_file: Option<PathBuf>,
        default_profile: String,
        mfa_profile: String,
    ) -> Result<Self> {
        let credentials_file = match credentials_file {
            Some(path) => path,
            None => Self::credentials_file_from(|name| std::env::var(name).ok())?,
        };
        if default_profile == mfa_profile {
            return Err(Error::SameProfile(mfa_profile));
        }
        Ok(Self::new(credentials_file, default_profile, mfa_profile))
    }

    fn credentials_file_from<F>(var: F) -> Result<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| var(name).filter(|value| !value.trim().is_empty());
        if let Some(path) = non_empty("AWS_SHARED_CREDENTIALS_FILE") {
            return Ok(PathBuf::from(path));
        }
        // legacy override, kept for existing setups
        if let Some(path) = non_empty("AWS_CONFIG_FILE") {
            return Ok(PathBuf::from(path));
        }
        let home = non_empty("HOME")
            .or_else(|| non_empty("USERPROFILE"))
            .ok_or(Error::HomeNotFound)?;
        Ok(PathBuf::from(home).join(".aws").join("credentials"))
    }

    pub fn set_token_code(mut self, value: Option<String>) -> Self {
        self.token_code = value;
        self
    }

    pub fn set_duration_seconds(mut self, value: Option<u32>) -> Self {
        self.duration_seconds = value;
        self
    }

    pub fn set_force(mut self, value: bool) -> Self {
        self.force = value;
        self
    }

    pub fn set_aws_cli(mut self, value: String) -> Self {
        self.aws_cli = value;
        self
    }
}
