//! Credentials of OAuth 1.0 consumers and their access tokens.
//!
//! A signed request names a consumer key and a token. The server needs both secrets to recompute
//! the signature and the record of whom the token was granted to. This module provides the
//! interface to that storage and a simple in-memory implementation.
use std::collections::HashMap;
use std::error;
use std::fmt;
use std::sync::Arc;

use crate::signature::SigningKey;
use super::scope::Scope;

/// Everything on record for a consumer and token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Secret shared with the consumer application.
    pub consumer_secret: String,

    /// Secret of the access token.
    pub token_secret: String,

    /// The resource owner who authorized the token.
    pub owner_id: String,

    /// The operations granted with the token.
    pub scope: Scope,
}

/// A token issued to a consumer, as recorded in a `ConsumerMap`.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Secret of the access token.
    pub secret: String,

    /// The resource owner who authorized the token.
    pub owner_id: String,

    /// The operations granted with the token.
    pub scope: Scope,
}

/// The credential store could not answer.
///
/// This is distinct from an unknown consumer or token, which is answered with `Ok(None)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The backing storage failed, with a description safe for logging.
    Unavailable(String),

    /// The lookup did not complete within the configured timeout.
    TimedOut,
}

/// Storage of consumer and token secrets.
pub trait ConsumerStore {
    /// Look up the credentials for a token of a consumer.
    ///
    /// Returns `Ok(None)` if either is unknown or the token was not issued to that consumer.
    fn lookup(&self, consumer_key: &str, token: &str) -> Result<Option<Credentials>, StoreError>;
}

/// An in-memory store of consumers and their tokens.
#[derive(Default)]
pub struct ConsumerMap {
    consumers: HashMap<String, Consumer>,
}

#[derive(Default)]
struct Consumer {
    secret: String,
    tokens: HashMap<String, TokenRecord>,
}

impl Credentials {
    /// The key the request signature is computed with.
    pub fn signing_key(&self) -> SigningKey {
        SigningKey::new(self.consumer_secret.as_str(), self.token_secret.as_str())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Credentials")
            .field("consumer_secret", &"<redacted>")
            .field("token_secret", &"<redacted>")
            .field("owner_id", &self.owner_id)
            .field("scope", &self.scope)
            .finish()
    }
}

impl TokenRecord {
    /// Record a token granted by `owner_id`.
    pub fn new<S, O>(secret: S, owner_id: O, scope: Scope) -> Self
    where
        S: Into<String>,
        O: Into<String>,
    {
        TokenRecord {
            secret: secret.into(),
            owner_id: owner_id.into(),
            scope,
        }
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("TokenRecord")
            .field("secret", &"<redacted>")
            .field("owner_id", &self.owner_id)
            .field("scope", &self.scope)
            .finish()
    }
}

impl ConsumerMap {
    /// Create an empty map.
    pub fn new() -> Self {
        ConsumerMap::default()
    }

    /// Register a consumer, replacing its secret and dropping its tokens if it already existed.
    pub fn register_consumer<K, S>(&mut self, consumer_key: K, secret: S)
    where
        K: Into<String>,
        S: Into<String>,
    {
        let consumer = Consumer {
            secret: secret.into(),
            tokens: HashMap::new(),
        };
        self.consumers.insert(consumer_key.into(), consumer);
    }

    /// Record a token issued to a registered consumer.
    ///
    /// Returns `false` and records nothing if the consumer is unknown.
    pub fn register_token<T: Into<String>>(
        &mut self, consumer_key: &str, token: T, record: TokenRecord,
    ) -> bool {
        match self.consumers.get_mut(consumer_key) {
            Some(consumer) => {
                consumer.tokens.insert(token.into(), record);
                true
            }
            None => false,
        }
    }

    /// Revoke a token, returning whether it existed.
    pub fn revoke(&mut self, consumer_key: &str, token: &str) -> bool {
        self.consumers
            .get_mut(consumer_key)
            .and_then(|consumer| consumer.tokens.remove(token))
            .is_some()
    }
}

impl ConsumerStore for ConsumerMap {
    fn lookup(&self, consumer_key: &str, token: &str) -> Result<Option<Credentials>, StoreError> {
        let consumer = match self.consumers.get(consumer_key) {
            Some(consumer) => consumer,
            None => return Ok(None),
        };

        Ok(consumer.tokens.get(token).map(|record| Credentials {
            consumer_secret: consumer.secret.clone(),
            token_secret: record.secret.clone(),
            owner_id: record.owner_id.clone(),
            scope: record.scope.clone(),
        }))
    }
}

impl<'a, S: ConsumerStore + ?Sized> ConsumerStore for &'a S {
    fn lookup(&self, consumer_key: &str, token: &str) -> Result<Option<Credentials>, StoreError> {
        (**self).lookup(consumer_key, token)
    }
}

impl<S: ConsumerStore + ?Sized> ConsumerStore for Box<S> {
    fn lookup(&self, consumer_key: &str, token: &str) -> Result<Option<Credentials>, StoreError> {
        (**self).lookup(consumer_key, token)
    }
}

impl<S: ConsumerStore + ?Sized> ConsumerStore for Arc<S> {
    fn lookup(&self, consumer_key: &str, token: &str) -> Result<Option<Credentials>, StoreError> {
        (**self).lookup(consumer_key, token)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Unavailable(reason) => write!(fmt, "credential store unavailable: {}", reason),
            StoreError::TimedOut => fmt.write_str("credential store lookup timed out"),
        }
    }
}

impl error::Error for StoreError {}
