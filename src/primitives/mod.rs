//! A collection of primitives the guard is built from.
//!
//! A primitive is the smallest independent unit of policy or storage. The [`analyzer`] verifies
//! bearer tokens with the [`keys`] of the server, the [`consumer`] store holds the secrets of
//! signed requests, and both yield a [`principal`] whose [`scope`] decides access. Abstracting
//! these makes it possible to provide, for example, a database backed consumer store.
//!
//! These should be used to instantiate an `Endpoint`, for example [`Generic`] or your own.
//!
//! ```
//! # use std::sync::Arc;
//! use oxide_guard::primitives::{
//!     analyzer::StandardAnalyzer,
//!     consumer::ConsumerMap,
//!     keys::ServerKeys,
//! };
//!
//! let keys = Arc::new(ServerKeys::ephemeral().unwrap());
//! let analyzer = StandardAnalyzer::new(keys);
//! let consumers = ConsumerMap::new();
//! # let _ = (analyzer, consumers);
//! ```
//!
//! [`analyzer`]: analyzer/index.html
//! [`keys`]: keys/index.html
//! [`consumer`]: consumer/index.html
//! [`principal`]: principal/index.html
//! [`scope`]: scope/index.html
//! [`Generic`]: ../frontends/simple/endpoint/struct.Generic.html

use chrono::DateTime;
use chrono::Utc;

pub mod analyzer;
pub mod consumer;
pub mod keys;
pub mod principal;
pub mod scope;

type Time = DateTime<Utc>;

/// Commonly used primitives for frontends and backends.
pub mod prelude {
    pub use super::analyzer::{AccessGrant, AccessTokenAnalyzer, StandardAnalyzer};
    pub use super::consumer::{ConsumerMap, ConsumerStore, Credentials, TokenRecord};
    pub use super::keys::{KeyAlgorithm, KeyConfig, ServerKeys};
    pub use super::principal::Principal;
    pub use super::scope::Scope;
}
