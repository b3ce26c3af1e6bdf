//! Async versions of the primitive traits.
//!
//! Every blocking primitive is also usable as its async counterpart, it simply completes
//! immediately.
use async_trait::async_trait;

use crate::primitives::analyzer::{self, AccessGrant, VerificationError};
use crate::primitives::consumer::{self, Credentials, StoreError};

/// Looks up consumer and token secrets of signed requests.
#[async_trait]
pub trait ConsumerStore: Send + Sync {
    /// Find the credentials for a consumer and token pair, `Ok(None)` if either is unknown.
    async fn lookup(&self, consumer_key: &str, token: &str) -> Result<Option<Credentials>, StoreError>;
}

/// Validates bearer tokens.
#[async_trait]
pub trait AccessTokenAnalyzer: Send + Sync {
    /// Check the token and extract its claims.
    async fn analyze(&self, token: &str) -> Result<AccessGrant, VerificationError>;
}

#[async_trait]
impl<T> ConsumerStore for T
where
    T: consumer::ConsumerStore + Send + Sync + ?Sized,
{
    async fn lookup(&self, consumer_key: &str, token: &str) -> Result<Option<Credentials>, StoreError> {
        consumer::ConsumerStore::lookup(self, consumer_key, token)
    }
}

#[async_trait]
impl<T> AccessTokenAnalyzer for T
where
    T: analyzer::AccessTokenAnalyzer + Send + Sync + ?Sized,
{
    async fn analyze(&self, token: &str) -> Result<AccessGrant, VerificationError> {
        analyzer::AccessTokenAnalyzer::analyze(self, token)
    }
}
