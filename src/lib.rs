//! # oxide-guard
//!
//! A resource server guard deciding whether an incoming request may perform an operation, based
//! on OAuth credentials that accompany it. Two credential protocols are understood:
//!
//! * OAuth 1.0 signed requests, where the client signs a canonical description of the request
//!   with a shared secret (`HMAC-SHA1` by default) and the server recomputes that signature.
//! * OAuth 2.0 bearer tokens, which the guard does not issue itself but verifies with a server
//!   held asymmetric key before trusting any of the claims they carry.
//!
//! Either protocol produces a [`Principal`]: the authenticated resource owner together with the
//! [`Scope`] granted to them. Access is allowed if and only if the operation requested is one of
//! the scope tokens of that principal.
//!
//! ## Components
//!
//! The crate is layered the same way in both directions. At the bottom, the [`primitives`] hold
//! the policies and storage: scopes, principals, server keys, the bearer token analyzer and the
//! consumer credential store. The [`signature`] module is the pure OAuth 1.0 canonicalization and
//! signing logic. The [`guard`] module wires both into a state machine that consumes an immutable
//! [`RequestDescriptor`] and produces an [`Outcome`]. Finally, the [`endpoint`] module adapts
//! arbitrary web request types through the [`WebRequest`] trait, and [`frontends::simple`]
//! provides a request type and a generic endpoint that need no web framework at all.
//!
//! With the `async` feature (enabled by default), the [`asynchronous`] module offers the same
//! guard over asynchronous primitives, bounding every store lookup with a timeout.
//!
//! ## Outcomes
//!
//! Every evaluation ends in exactly one of four outcomes:
//!
//! * `Allowed`, carrying the principal.
//! * `Denied`, the credentials were valid but the operation is not within scope.
//! * `AuthenticationFailed`, credentials were missing, unknown, expired, or forged.
//! * `ProtocolError`, the request or a backend component was malformed or failed.
//!
//! No other outcome exists and evaluation never panics on malformed input.
//!
//! [`Principal`]: primitives/principal/struct.Principal.html
//! [`Scope`]: primitives/scope/struct.Scope.html
//! [`primitives`]: primitives/index.html
//! [`signature`]: signature/index.html
//! [`guard`]: guard/index.html
//! [`RequestDescriptor`]: guard/struct.RequestDescriptor.html
//! [`Outcome`]: guard/enum.Outcome.html
//! [`endpoint`]: endpoint/index.html
//! [`WebRequest`]: endpoint/trait.WebRequest.html
//! [`frontends::simple`]: frontends/simple/index.html
//! [`asynchronous`]: asynchronous/index.html
#![warn(missing_docs)]

extern crate base64;
extern crate chrono;
extern crate percent_encoding;
extern crate ring;
extern crate rmp_serde;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate subtle;
extern crate tracing;
extern crate url;

#[cfg(feature = "async")]
extern crate async_trait;
#[cfg(feature = "async")]
extern crate tokio;

pub mod endpoint;
pub mod frontends;
pub mod guard;
pub mod primitives;
pub mod signature;

#[cfg(feature = "async")]
pub mod asynchronous;
