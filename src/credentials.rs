use crate::aws_mfa::SessionCredentials;
use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use ini::{EscapePolicy, Ini, ParseOption, Properties};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const MFA_DEVICE_KEY: &str = "aws_mfa_device";
pub const ACCESS_KEY_ID_KEY: &str = "aws_access_key_id";
pub const SECRET_ACCESS_KEY_KEY: &str = "aws_secret_access_key";
pub const SESSION_TOKEN_KEY: &str = "aws_session_token";
pub const EXPIRATION_KEY: &str = "expiration";

/// The shared credentials file, held in memory between load and write.
#[derive(Debug, Clone)]
pub struct CredentialsFile {
    path: PathBuf,
    credentials: Ini,
}

impl CredentialsFile {
    /// Values are kept verbatim: no escape or quote processing on load, and
    /// none on write. Comments are not retained by the parser and are lost on
    /// the first write.
    pub fn load(path: PathBuf) -> Result<Self> {
        debug!("Loading credentials from {}", path.display());
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let credentials =
            Ini::load_from_file_opt(&path, opt).map_err(|source| Error::LoadCredentials {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, credentials })
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.credentials.section(Some(name)).is_some()
    }

    /// Creates `name` as an empty section and writes the file if it was
    /// missing. Returns whether the section had to be created.
    pub fn ensure_section(&mut self, name: &str) -> Result<bool> {
        if self.has_section(name) {
            return Ok(false);
        }
        self.credentials
            .entry(Some(String::from(name)))
            .or_insert(Properties::new());
        self.write()?;
        info!("Created profile `{}` in {}", name, self.path.display());
        Ok(true)
    }

    /// Cached expiration of `profile`. A missing or blank value yields `None`.
    pub fn expiration(&self, profile: &str) -> Result<Option<DateTime<Utc>>> {
        let value = match self.get(profile, EXPIRATION_KEY) {
            Some(value) => value,
            None => return Ok(None),
        };
        DateTime::parse_from_rfc3339(value)
            .map(|expires| Some(expires.with_timezone(&Utc)))
            .map_err(|source| Error::InvalidExpiration {
                profile: String::from(profile),
                value: String::from(value),
                source,
            })
    }

    pub fn mfa_device(&self, profile: &str) -> Option<&str> {
        self.get(profile, MFA_DEVICE_KEY)
    }

    fn get(&self, profile: &str, key: &str) -> Option<&str> {
        self.credentials
            .section(Some(profile))?
            .get(key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn set_credentials(&mut self, name: &str, credentials: &SessionCredentials) {
        self.credentials
            .with_section(Some(name))
            .set(ACCESS_KEY_ID_KEY, credentials.access_key_id.as_str())
            .set(SECRET_ACCESS_KEY_KEY, credentials.secret_access_key.as_str())
            .set(SESSION_TOKEN_KEY, credentials.session_token.as_str())
            .set(EXPIRATION_KEY, format_expiration(&credentials.expiration));
    }

    /// Writes through a temporary file in the same directory and renames it
    /// over the original, so a failed write leaves the file untouched.
    pub fn write(&self) -> Result<()> {
        self.write_atomic().map_err(|source| Error::WriteCredentials {
            path: self.path.clone(),
            source,
        })
    }

    fn write_atomic(&self) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        self.credentials
            .write_to_policy(&mut file, EscapePolicy::Nothing)?;
        file.flush()?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

pub fn format_expiration(expiration: &DateTime<Utc>) -> String {
    expiration.to_rfc3339_opts(SecondsFormat::Secs, true)
}
