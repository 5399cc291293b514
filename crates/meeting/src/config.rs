//! Platform credential loading
//!
//! Supports loading API credentials from (in order of priority):
//! 1. JSON file (~/.config/vela/platform.json)
//! 2. Runtime environment variables
//!
//! Only credential *storage* lives here; protocol mechanics (token
//! refresh, OAuth) are the platform's problem, not this library's.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::api::Credential;

/// Credentials filename in the Vela config directory
const CREDENTIALS_FILE: &str = "platform.json";

/// Environment variable names for the fallback path
const ENV_BASE_URL: &str = "VELA_BASE_URL";
const ENV_TOKEN: &str = "VELA_API_TOKEN";
const ENV_SCHEME: &str = "VELA_AUTH_SCHEME";

/// Connection details for the meeting platform
#[derive(Debug, Clone)]
pub struct PlatformCredentials {
    pub base_url: String,
    pub auth_scheme: String,
    pub token: String,
}

/// Credential file format
#[derive(Deserialize)]
struct CredentialFile {
    base_url: String,
    #[serde(default = "default_scheme")]
    auth_scheme: String,
    token: String,
}

fn default_scheme() -> String {
    "Bearer".to_string()
}

impl PlatformCredentials {
    /// Load credentials using the following priority:
    /// 1. JSON file (~/.config/vela/platform.json)
    /// 2. Runtime environment variables
    pub fn load() -> Result<Self> {
        if config::config_exists(CREDENTIALS_FILE) {
            let file: CredentialFile = config::load_json(CREDENTIALS_FILE)?;
            return Self::from_credential_file(file);
        }
        Self::from_env()
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: CredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(file)
    }

    /// Parse credentials from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(file)
    }

    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_BASE_URL)
            .with_context(|| format!("{ENV_BASE_URL} environment variable not set"))?;
        let token = std::env::var(ENV_TOKEN)
            .with_context(|| format!("{ENV_TOKEN} environment variable not set"))?;
        let auth_scheme = std::env::var(ENV_SCHEME).unwrap_or_else(|_| default_scheme());

        Self::validated(Self {
            base_url,
            auth_scheme,
            token,
        })
    }

    fn from_credential_file(file: CredentialFile) -> Result<Self> {
        Self::validated(Self {
            base_url: file.base_url,
            auth_scheme: file.auth_scheme,
            token: file.token,
        })
    }

    fn validated(creds: Self) -> Result<Self> {
        url::Url::parse(&creds.base_url)
            .with_context(|| format!("Invalid base URL: {}", creds.base_url))?;
        Ok(creds)
    }

    /// Check if credentials are available (file or env vars)
    pub fn is_available() -> bool {
        if config::config_exists(CREDENTIALS_FILE) {
            return true;
        }
        std::env::var(ENV_BASE_URL).is_ok() && std::env::var(ENV_TOKEN).is_ok()
    }

    /// The credential the request executor injects; None when the token is
    /// empty (an empty token must inject nothing)
    pub fn credential(&self) -> Option<Credential> {
        if self.token.is_empty() {
            return None;
        }
        Some(Credential {
            scheme: self.auth_scheme.clone(),
            token: self.token.clone(),
        })
    }
}
