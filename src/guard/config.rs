//! Configuration of the guard.
use std::error;
use std::fmt;
use std::time::Duration;

/// The credential protocols a guard accepts.
///
/// Only OAuth 2.0 bearer tokens are accepted by default. When both are enabled, the protocol is
/// chosen by the credential the request presents. A credential of a disabled protocol is treated
/// like no credential at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Protocols {
    /// Accept OAuth 1.0 signed requests.
    pub oauth1: bool,

    /// Accept OAuth 2.0 bearer tokens.
    pub oauth2: bool,
}

/// Settings of a guard, usually deserialized from a configuration file.
///
/// ```
/// # use std::time::Duration;
/// # use oxide_guard::guard::{GuardConfig, Protocols};
/// let config = GuardConfig::from_json(r#"{
///     "protocols": { "oauth1": true },
///     "realm": "photos",
///     "timestamp_skew_secs": 300
/// }"#).unwrap();
///
/// assert_eq!(config.protocols(), Protocols::both());
/// assert_eq!(config.realm(), Some("photos"));
/// assert_eq!(config.timestamp_skew(), Some(Duration::from_secs(300)));
/// assert_eq!(config.lookup_timeout(), Duration::from_millis(5000));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    protocols: Protocols,
    realm: Option<String>,
    timestamp_skew_secs: Option<u64>,
    lookup_timeout_ms: u64,
}

/// The configuration could not be parsed.
#[derive(Debug)]
pub struct ConfigError(serde_json::Error);

const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5000;

impl Protocols {
    /// Bearer tokens only, the default.
    pub fn oauth2_only() -> Self {
        Protocols {
            oauth1: false,
            oauth2: true,
        }
    }

    /// Signed requests only.
    pub fn oauth1_only() -> Self {
        Protocols {
            oauth1: true,
            oauth2: false,
        }
    }

    /// Both protocols, selected by the presented credential.
    pub fn both() -> Self {
        Protocols {
            oauth1: true,
            oauth2: true,
        }
    }

    /// The authentication schemes to challenge clients with, in order of preference.
    pub fn schemes(&self) -> Vec<&'static str> {
        let mut schemes = Vec::new();
        if self.oauth2 {
            schemes.push("Bearer");
        }
        if self.oauth1 {
            schemes.push("OAuth");
        }
        schemes
    }
}

impl Default for Protocols {
    fn default() -> Self {
        Protocols::oauth2_only()
    }
}

impl GuardConfig {
    /// Parse the configuration from json, all fields are optional.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError)
    }

    /// Choose the accepted protocols.
    pub fn with_protocols(mut self, protocols: Protocols) -> Self {
        self.protocols = protocols;
        self
    }

    /// Name the protection realm announced in challenges.
    pub fn with_realm<R: Into<String>>(mut self, realm: R) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// Reject signed requests whose timestamp deviates from the server clock by more than `skew`.
    pub fn with_timestamp_skew(mut self, skew: Duration) -> Self {
        self.timestamp_skew_secs = Some(skew.as_secs());
        self
    }

    /// Bound the time a store lookup may take in the asynchronous guard.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// The accepted protocols.
    pub fn protocols(&self) -> Protocols {
        self.protocols
    }

    /// The protection realm.
    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    /// The allowed deviation of timestamps, if they are checked at all.
    pub fn timestamp_skew(&self) -> Option<Duration> {
        self.timestamp_skew_secs.map(Duration::from_secs)
    }

    /// The time a store lookup may take.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig {
            protocols: Protocols::default(),
            realm: None,
            timestamp_skew_secs: None,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "invalid guard configuration: {}", self.0)
    }
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.0)
    }
}
