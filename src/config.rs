//! # Store Configuration
//!
//! Connection settings read from the process environment:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SHEET_RECORDS_CREDENTIALS` | `credentials.json` |
//! | `SHEET_RECORDS_SPREADSHEET` | required |
//! | `SHEET_RECORDS_TIMEOUT_SECS` | `30` |
//! | `SHEET_RECORDS_API_BASE` | `https://sheets.googleapis.com/v4/` |
use crate::error::{ResultMessage, SheetRecordsError};
use crate::spreadsheet::auth::ServiceAccountKey;
use crate::spreadsheet::google::{GoogleOptions, DEFAULT_API_BASE, DEFAULT_TIMEOUT};
use crate::store::{self, ConnectionHandle};
use anyhow::Context;
use log::debug;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const CREDENTIALS_VAR: &str = "SHEET_RECORDS_CREDENTIALS";
pub const SPREADSHEET_VAR: &str = "SHEET_RECORDS_SPREADSHEET";
pub const TIMEOUT_VAR: &str = "SHEET_RECORDS_TIMEOUT_SECS";
pub const API_BASE_VAR: &str = "SHEET_RECORDS_API_BASE";

pub const DEFAULT_CREDENTIALS: &str = "credentials.json";

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Path of the service-account key file.
    pub credentials: PathBuf,
    /// Spreadsheet URL or bare id.
    pub spreadsheet: String,
    pub timeout: Duration,
    pub api_base: Url,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, SheetRecordsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SheetRecordsError> {
        let get = |name: &str| lookup(name).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty());

        let credentials = get(CREDENTIALS_VAR).unwrap_or_else(|| DEFAULT_CREDENTIALS.to_owned());
        let spreadsheet = get(SPREADSHEET_VAR)
            .ok_or_else(|| SheetRecordsError::WithContextError(format!("{} is not set", SPREADSHEET_VAR)))?;
        let timeout = match get(TIMEOUT_VAR) {
            Some(seconds) => {
                let seconds = seconds.parse::<u64>().map_err(SheetRecordsError::from).with_prefix(TIMEOUT_VAR)?;
                Duration::from_secs(seconds)
            }
            None => DEFAULT_TIMEOUT,
        };
        let mut api_base = get(API_BASE_VAR).unwrap_or_else(|| DEFAULT_API_BASE.to_owned());
        if !api_base.ends_with('/') {
            api_base.push('/');
        }
        let api_base = Url::parse(&api_base).map_err(SheetRecordsError::from).with_prefix(API_BASE_VAR)?;

        Ok(Self {
            credentials: PathBuf::from(credentials),
            spreadsheet,
            timeout,
            api_base,
        })
    }

    pub fn options(&self) -> GoogleOptions {
        GoogleOptions {
            timeout: self.timeout,
            api_base: self.api_base.clone(),
        }
    }

    /// Reads and validates the key file, returning its JSON text.
    pub fn load_credentials(&self) -> Result<String, SheetRecordsError> {
        let prefix = format!("Failed to read credentials '{}'", self.credentials.display());
        let json = std::fs::read_to_string(&self.credentials)
            .map_err(SheetRecordsError::from)
            .with_prefix(&prefix)?;
        ServiceAccountKey::from_json(&json)
            .map_err(SheetRecordsError::from)
            .with_prefix(&prefix)?;
        Ok(json)
    }

    pub fn connect(&self) -> Result<ConnectionHandle, SheetRecordsError> {
        let credentials = self.load_credentials()?;
        debug!("Connecting to '{}' with timeout {:?}", self.spreadsheet, self.timeout);
        Ok(store::connect_with_options(&credentials, &self.spreadsheet, self.options())?)
    }
}

/// Connects using [`StoreConfig::from_env`].
pub fn connect_from_env() -> anyhow::Result<ConnectionHandle> {
    let config = StoreConfig::from_env().context("Invalid record store configuration")?;
    config
        .connect()
        .with_context(|| format!("Failed to connect to spreadsheet '{}'", config.spreadsheet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[(SPREADSHEET_VAR, "1AbCdEfGhIjKlMnOpQrStUvWxYz")])).unwrap();
        assert_eq!(config.credentials, PathBuf::from("credentials.json"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_base.as_str(), "https://sheets.googleapis.com/v4/");
        assert_eq!(config.options().timeout, config.timeout);
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            (SPREADSHEET_VAR, " sheet-id "),
            (CREDENTIALS_VAR, "/etc/keys/bot.json"),
            (TIMEOUT_VAR, "5"),
            (API_BASE_VAR, "http://localhost:8080/v4"),
        ]))
        .unwrap();
        assert_eq!(config.spreadsheet, "sheet-id");
        assert_eq!(config.credentials, PathBuf::from("/etc/keys/bot.json"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.api_base.as_str(), "http://localhost:8080/v4/");
    }

    #[test]
    fn test_invalid_values() {
        let missing = StoreConfig::from_lookup(lookup(&[(SPREADSHEET_VAR, "  ")])).unwrap_err();
        assert!(missing.to_string().contains(SPREADSHEET_VAR));

        let timeout = StoreConfig::from_lookup(lookup(&[(SPREADSHEET_VAR, "id"), (TIMEOUT_VAR, "soon")])).unwrap_err();
        assert!(timeout.to_string().starts_with(TIMEOUT_VAR));

        let base = StoreConfig::from_lookup(lookup(&[(SPREADSHEET_VAR, "id"), (API_BASE_VAR, "not a url")])).unwrap_err();
        assert!(base.to_string().starts_with(API_BASE_VAR));
    }

    #[test]
    fn test_load_credentials() {
        let mut config = StoreConfig::from_lookup(lookup(&[(SPREADSHEET_VAR, "id")])).unwrap();

        config.credentials = PathBuf::from("/nonexistent/credentials.json");
        let error = config.load_credentials().unwrap_err();
        assert!(error.to_string().starts_with("Failed to read credentials"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"type": "authorized_user", "client_email": "x"}}"#).unwrap();
        config.credentials = file.path().to_path_buf();
        let error = config.load_credentials().unwrap_err();
        assert!(error.to_string().contains("Invalid service account credentials"));
        assert!(config.connect().is_err());
    }
}
