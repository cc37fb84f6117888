use crate::config::Config;
use crate::credentials::{format_expiration, CredentialsFile};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use dialoguer::Input;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::sync::LazyLock;
use tracing::{debug, info};

static TOKEN_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("Unable to compile token code regex"));

/// Output of `aws sts get-session-token`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionTokenResponse {
    pub credentials: SessionCredentials,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl SessionTokenResponse {
    pub fn from_slice(stdout: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(stdout)?)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct SessionTokenRequest<'a> {
    pub serial_number: &'a str,
    pub token_code: &'a str,
    pub profile: Option<&'a str>,
    pub duration_seconds: Option<u32>,
}

impl SessionTokenRequest<'_> {
    fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "sts".into(),
            "get-session-token".into(),
            "--serial-number".into(),
            self.serial_number.into(),
            "--token-code".into(),
            self.token_code.into(),
        ];
        if let Some(profile) = self.profile {
            args.push("--profile".into());
            args.push(profile.into());
        }
        if let Some(duration) = self.duration_seconds {
            args.push("--duration-seconds".into());
            args.push(duration.to_string());
        }
        args.push("--output".into());
        args.push("json".into());
        args
    }
}

/// Something that exchanges an MFA code for temporary credentials.
#[allow(async_fn_in_trait)]
pub trait SessionTokenIssuer {
    async fn get_session_token(
        &self,
        request: &SessionTokenRequest<'_>,
    ) -> Result<SessionTokenResponse>;
}

/// Calls the aws cli as a child process.
pub struct AwsCli {
    program: String,
}

impl AwsCli {
    pub fn new(program: String) -> Self {
        Self { program }
    }
}

impl SessionTokenIssuer for AwsCli {
    async fn get_session_token(
        &self,
        request: &SessionTokenRequest<'_>,
    ) -> Result<SessionTokenResponse> {
        let args = request.args();
        // the token code is single use, but keep it out of the logs anyway
        let command = format!(
            "{} {}",
            self.program,
            args.iter()
                .map(|arg| if arg == request.token_code {
                    "******"
                } else {
                    arg.as_str()
                })
                .collect::<Vec<_>>()
                .join(" ")
        );
        debug!("Running {}", command);

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => Error::CommandNotFound(self.program.clone()),
                _ => Error::CommandSpawn {
                    command: command.clone(),
                    source,
                },
            })?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        SessionTokenResponse::from_slice(&output.stdout)
    }
}

/// Source of the one-time device code.
pub trait TokenCodePrompt {
    fn token_code(&self) -> Result<String>;
}

pub struct TerminalPrompt;

impl TokenCodePrompt for TerminalPrompt {
    fn token_code(&self) -> Result<String> {
        let code: String = Input::new()
            .with_prompt("DEVICE CODE")
            .allow_empty(true)
            .interact_text()?;
        Ok(code)
    }
}

pub fn validate_token_code(code: &str) -> Result<&str> {
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::EmptyTokenCode);
    }
    if !TOKEN_CODE.is_match(code) {
        return Err(Error::InvalidTokenCode);
    }
    Ok(code)
}

#[derive(Debug, PartialEq, Clone)]
pub enum RefreshOutcome {
    StillValid { expires_at: DateTime<Utc> },
    Refreshed { expires_at: DateTime<Utc> },
}

pub struct MfaSession<I, P> {
    config: Config,
    issuer: I,
    prompt: P,
}

impl MfaSession<AwsCli, TerminalPrompt> {
    pub fn from_config(config: Config) -> Self {
        let issuer = AwsCli::new(config.aws_cli.clone());
        Self::new(config, issuer, TerminalPrompt)
    }
}

impl<I, P> MfaSession<I, P>
where
    I: SessionTokenIssuer,
    P: TokenCodePrompt,
{
    pub fn new(config: Config, issuer: I, prompt: P) -> Self {
        Self {
            config,
            issuer,
            prompt,
        }
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let config = &self.config;
        let mut credentials = CredentialsFile::load(config.credentials_file.clone())?;
        credentials.ensure_section(&config.mfa_profile)?;

        // a section without expiration has never been refreshed
        if let Some(expires_at) = credentials.expiration(&config.mfa_profile)? {
            if Utc::now() < expires_at && !config.force {
                info!(
                    "OK: There is no need to update the session token (expires at {}).",
                    format_expiration(&expires_at)
                );
                return Ok(RefreshOutcome::StillValid { expires_at });
            }
        }

        let serial_number = credentials
            .mfa_device(&config.default_profile)
            .ok_or_else(|| Error::MissingMfaDevice(config.default_profile.clone()))?;

        let token_code = match &config.token_code {
            Some(code) => code.clone(),
            None => self.prompt.token_code()?,
        };
        let token_code = validate_token_code(&token_code)?;

        let response = self
            .issuer
            .get_session_token(&SessionTokenRequest {
                serial_number,
                token_code,
                profile: Some(config.default_profile.as_str()),
                duration_seconds: config.duration_seconds,
            })
            .await?;

        let expires_at = response.credentials.expiration;
        credentials.set_credentials(&config.mfa_profile, &response.credentials);
        credentials.write()?;
        info!(
            "OK: Successfully updated the session token (expires at {}).",
            format_expiration(&expires_at)
        );
        Ok(RefreshOutcome::Refreshed { expires_at })
    }
}
