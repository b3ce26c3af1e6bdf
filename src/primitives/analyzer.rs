//! Verification of OAuth 2.0 bearer tokens.
//!
//! Bearer tokens are self-contained assertions: the token itself carries the grant it represents
//! together with a signature over it by the issuer's private key. Checking a token therefore
//! requires no store lookup, only the public key, and a forged or altered token is detected before
//! any of its claims are looked at.
//!
//! The token format is the url-safe base64 (without padding) of a msgpack encoded pair of
//! `payload` and `signature`. The payload is itself msgpack of a usage counter, the grant claims
//! and the usage tag `"access"`.
use std::error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::{decode_config, encode_config, URL_SAFE_NO_PAD};
use chrono::Utc;

use super::keys::{KeyError, ServerKeys};
use super::scope::Scope;
use super::Time;

/// The claims of a verified access token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessGrant {
    /// The resource owner the token was issued to.
    pub owner_id: String,

    /// The client application acting on behalf of the owner.
    pub client_id: String,

    /// The granted operations.
    pub scope: Scope,

    /// Expiry of the token.
    pub until: Time,
}

/// Reasons a bearer token is rejected.
///
/// All of them are reported to the client identically, as failed authentication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationError {
    /// The token could not be decoded at all.
    Malformed,

    /// The signature did not match the payload.
    Signature,

    /// The token was authentic but is past its expiry.
    Expired,
}

/// Validates bearer tokens and recovers the grant they represent.
///
/// Implementations must verify authenticity before trusting any claim in the token and must
/// reject expired tokens.
pub trait AccessTokenAnalyzer {
    /// Check the token and extract its claims.
    fn analyze(&self, token: &str) -> Result<AccessGrant, VerificationError>;
}

/// The analyzer for tokens signed with `ServerKeys`.
///
/// When the keys contain a private half the analyzer can also issue tokens, which is mostly
/// useful for tests and for deployments where the guard and the issuer share one process.
pub struct StandardAnalyzer {
    keys: Arc<ServerKeys>,
    counter: AtomicU64,
}

const ACCESS_TAG: &str = "access";

#[derive(Serialize, Deserialize)]
struct AssertGrant(Vec<u8>, Vec<u8>);

#[derive(Serialize, Deserialize)]
struct SerdeAccessGrant {
    owner_id: String,
    client_id: String,
    scope: Scope,
    #[serde(with = "time_serde")]
    until: Time,
}

impl StandardAnalyzer {
    /// Verify tokens with the given keys.
    pub fn new(keys: Arc<ServerKeys>) -> Self {
        StandardAnalyzer {
            keys,
            counter: AtomicU64::new(0),
        }
    }

    /// Sign a grant into a bearer token.
    ///
    /// Fails if the keys do not contain a signing half.
    pub fn issue(&self, grant: &AccessGrant) -> Result<String, KeyError> {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);
        let serde_grant = SerdeAccessGrant::from(grant);
        let payload = rmp_serde::to_vec(&(counter, serde_grant, ACCESS_TAG))
            .map_err(|_| KeyError::Unspecified)?;
        let signature = self.keys.sign(&payload)?;
        let token = rmp_serde::to_vec(&AssertGrant(payload, signature)).map_err(|_| KeyError::Unspecified)?;
        Ok(encode_config(&token, URL_SAFE_NO_PAD))
    }

    fn extract(&self, token: &str) -> Result<AccessGrant, VerificationError> {
        let decoded = decode_config(token, URL_SAFE_NO_PAD).map_err(|_| VerificationError::Malformed)?;
        let AssertGrant(payload, signature) =
            rmp_serde::from_slice(&decoded).map_err(|_| VerificationError::Malformed)?;

        if !self.keys.verify(&payload, &signature) {
            return Err(VerificationError::Signature);
        }

        let (_, grant, tag): (u64, SerdeAccessGrant, String) =
            rmp_serde::from_slice(&payload).map_err(|_| VerificationError::Malformed)?;
        if tag != ACCESS_TAG {
            return Err(VerificationError::Malformed);
        }

        Ok(grant.into())
    }
}

impl AccessTokenAnalyzer for StandardAnalyzer {
    fn analyze(&self, token: &str) -> Result<AccessGrant, VerificationError> {
        let grant = self.extract(token)?;
        if grant.until <= Utc::now() {
            return Err(VerificationError::Expired);
        }
        Ok(grant)
    }
}

impl fmt::Debug for StandardAnalyzer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("StandardAnalyzer").field("keys", &self.keys).finish()
    }
}

impl<'a, A: AccessTokenAnalyzer + ?Sized> AccessTokenAnalyzer for &'a A {
    fn analyze(&self, token: &str) -> Result<AccessGrant, VerificationError> {
        (**self).analyze(token)
    }
}

impl<A: AccessTokenAnalyzer + ?Sized> AccessTokenAnalyzer for Box<A> {
    fn analyze(&self, token: &str) -> Result<AccessGrant, VerificationError> {
        (**self).analyze(token)
    }
}

impl<A: AccessTokenAnalyzer + ?Sized> AccessTokenAnalyzer for Arc<A> {
    fn analyze(&self, token: &str) -> Result<AccessGrant, VerificationError> {
        (**self).analyze(token)
    }
}

impl<'a> From<&'a AccessGrant> for SerdeAccessGrant {
    fn from(grant: &'a AccessGrant) -> Self {
        SerdeAccessGrant {
            owner_id: grant.owner_id.clone(),
            client_id: grant.client_id.clone(),
            scope: grant.scope.clone(),
            until: grant.until,
        }
    }
}

impl From<SerdeAccessGrant> for AccessGrant {
    fn from(grant: SerdeAccessGrant) -> Self {
        AccessGrant {
            owner_id: grant.owner_id,
            client_id: grant.client_id,
            scope: grant.scope,
            until: grant.until,
        }
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VerificationError::Malformed => fmt.write_str("token is malformed"),
            VerificationError::Signature => fmt.write_str("token signature is invalid"),
            VerificationError::Expired => fmt.write_str("token has expired"),
        }
    }
}

impl error::Error for VerificationError {}

mod time_serde {
    use super::Time;
    use chrono::{TimeZone, Utc};

    use serde::de::{Deserialize, Deserializer, Error};
    use serde::ser::Serializer;

    pub fn serialize<S: Serializer>(time: &Time, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(time.timestamp())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Time, D::Error> {
        let as_timestamp: i64 = <i64>::deserialize(deserializer)?;
        Utc.timestamp_opt(as_timestamp, 0)
            .single()
            .ok_or_else(|| D::Error::custom("timestamp out of range"))
    }
}
