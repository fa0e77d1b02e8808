//! Run configuration for the CMDB harness
//!
//! The configuration is read once per process from environment variables and
//! stays immutable for the lifetime of the run.

use std::path::PathBuf;
use url::Url;

use crate::{CmdbError, Result};

/// Default application origin
pub const DEFAULT_BASE_URL: &str = "https://demo.u-system.tech";

/// Default artifact root (log files and screenshots)
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Environment variable names
pub mod env {
    pub const BASE_URL: &str = "BASE_URL";
    pub const LOGIN: &str = "LOGIN";
    pub const PASSWORD: &str = "PASSWORD";
    pub const CERT_PFX_PATH: &str = "CERT_PFX_PATH";
    pub const CERT_PFX_PASSWORD: &str = "CERT_PFX_PASSWORD";
    pub const HEADLESS: &str = "HEADLESS";
    pub const ARTIFACTS_DIR: &str = "ARTIFACTS_DIR";
}

/// PKCS#12 client certificate used for certificate login
#[derive(Clone)]
pub struct ClientCertificateConfig {
    /// Path to the `.pfx` / `.p12` bundle
    pub pfx_path: PathBuf,
    /// Passphrase protecting the bundle (may be empty)
    pub passphrase: String,
}

impl std::fmt::Debug for ClientCertificateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCertificateConfig")
            .field("pfx_path", &self.pfx_path)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Form-login credentials
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Process-wide run configuration
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Application origin every page is bound to
    pub base_url: Url,
    /// Login from `LOGIN`, if set and non-empty
    pub login: Option<String>,
    /// Password from `PASSWORD`, if set and non-empty
    pub password: Option<String>,
    /// Client certificate, present only when `CERT_PFX_PATH` is set
    pub certificate: Option<ClientCertificateConfig>,
    /// Run the browser without a window
    pub headless: bool,
    /// Root directory for run logs and screenshots
    pub artifacts_dir: PathBuf,
}

impl RunConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_base_url = non_empty(env::BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw_base_url).map_err(|e| {
            CmdbError::Config(format!("{} is not a valid URL ({}): {}", env::BASE_URL, raw_base_url, e))
        })?;
        if base_url.host_str().is_none() {
            return Err(CmdbError::Config(format!(
                "{} has no host: {}",
                env::BASE_URL,
                raw_base_url
            )));
        }

        let certificate = non_empty(env::CERT_PFX_PATH).map(|path| ClientCertificateConfig {
            pfx_path: PathBuf::from(path),
            passphrase: lookup(env::CERT_PFX_PASSWORD).unwrap_or_default(),
        });

        let headless = match non_empty(env::HEADLESS) {
            Some(value) => parse_bool(env::HEADLESS, &value)?,
            None => true,
        };

        let artifacts_dir = non_empty(env::ARTIFACTS_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR));

        Ok(Self {
            base_url,
            login: non_empty(env::LOGIN),
            password: non_empty(env::PASSWORD),
            certificate,
            headless,
            artifacts_dir,
        })
    }

    /// Credentials for form login
    ///
    /// Missing either value is a configuration error for the calling test,
    /// not for the whole run.
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.login, &self.password) {
            (Some(login), Some(password)) => Ok(Credentials {
                login: login.clone(),
                password: password.clone(),
            }),
            _ => Err(CmdbError::Config(format!(
                "Set {}/{} to use form login",
                env::LOGIN,
                env::PASSWORD
            ))),
        }
    }

    /// Whether certificate login is available for this run
    pub fn has_certificate(&self) -> bool {
        self.certificate.is_some()
    }

    /// Resolve a path or absolute URL against the base URL
    pub fn resolve(&self, target: &str) -> Result<Url> {
        self.base_url
            .join(target)
            .map_err(|e| CmdbError::Config(format!("Cannot resolve {} against {}: {}", target, self.base_url, e)))
    }

    /// `host:port` of the base origin, with the scheme's default port filled in
    pub fn origin_authority(&self) -> String {
        let host = self.base_url.host_str().unwrap_or_default();
        let port = self.base_url.port_or_known_default().unwrap_or(443);
        format!("{}:{}", host, port)
    }

    /// Directory for failure screenshots
    pub fn screenshots_dir(&self) -> PathBuf {
        self.artifacts_dir.join("screenshots")
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CmdbError::Config(format!("{} must be a boolean, got {:?}", key, other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.base_url.as_str(), "https://demo.u-system.tech/");
        assert!(config.login.is_none());
        assert!(config.certificate.is_none());
        assert!(config.headless);
        assert_eq!(config.artifacts_dir, PathBuf::from("artifacts"));
        assert_eq!(config.screenshots_dir(), PathBuf::from("artifacts/screenshots"));
    }

    #[test]
    fn test_credentials_require_both_values() {
        let only_login = RunConfig::from_lookup(lookup_from(&[("LOGIN", "admin")])).unwrap();
        let err = only_login.credentials().unwrap_err();
        assert!(matches!(err, CmdbError::Config(_)));

        let blank_password =
            RunConfig::from_lookup(lookup_from(&[("LOGIN", "admin"), ("PASSWORD", "  ")])).unwrap();
        assert!(blank_password.credentials().is_err());

        let both =
            RunConfig::from_lookup(lookup_from(&[("LOGIN", "admin"), ("PASSWORD", "secret")])).unwrap();
        let creds = both.credentials().unwrap();
        assert_eq!(creds.login, "admin");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_certificate_enabled_by_path() {
        let config = RunConfig::from_lookup(lookup_from(&[
            ("CERT_PFX_PATH", "/certs/qa.pfx"),
            ("CERT_PFX_PASSWORD", "pfx-pass"),
        ]))
        .unwrap();
        assert!(config.has_certificate());
        let cert = config.certificate.unwrap();
        assert_eq!(cert.pfx_path, PathBuf::from("/certs/qa.pfx"));
        assert_eq!(cert.passphrase, "pfx-pass");

        let no_path = RunConfig::from_lookup(lookup_from(&[("CERT_PFX_PASSWORD", "x")])).unwrap();
        assert!(!no_path.has_certificate());
    }

    #[test]
    fn test_passphrase_defaults_to_empty() {
        let config = RunConfig::from_lookup(lookup_from(&[("CERT_PFX_PATH", "qa.pfx")])).unwrap();
        assert_eq!(config.certificate.unwrap().passphrase, "");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = RunConfig::from_lookup(lookup_from(&[("BASE_URL", "not a url")])).unwrap_err();
        assert!(matches!(err, CmdbError::Config(_)));
    }

    #[test]
    fn test_headless_parsing() {
        let headed = RunConfig::from_lookup(lookup_from(&[("HEADLESS", "false")])).unwrap();
        assert!(!headed.headless);
        let err = RunConfig::from_lookup(lookup_from(&[("HEADLESS", "maybe")])).unwrap_err();
        assert!(matches!(err, CmdbError::Config(_)));
    }

    #[test]
    fn test_resolve_and_authority() {
        let config =
            RunConfig::from_lookup(lookup_from(&[("BASE_URL", "https://cmdb.internal:8443")])).unwrap();
        assert_eq!(config.resolve("/").unwrap().as_str(), "https://cmdb.internal:8443/");
        assert_eq!(config.origin_authority(), "cmdb.internal:8443");

        let default_port = RunConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(default_port.origin_authority(), "demo.u-system.tech:443");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = RunConfig::from_lookup(lookup_from(&[
            ("CERT_PFX_PATH", "qa.pfx"),
            ("CERT_PFX_PASSWORD", "top-secret"),
        ]))
        .unwrap();
        let rendered = format!("{:?}", config.certificate.unwrap());
        assert!(!rendered.contains("top-secret"));
    }
}
