//! Polymorphic guard over web request types.
//!
//! This module connects the `guard` state machine to arbitrary web frameworks. Requests are
//! accessed through the [`WebRequest`] trait, and an [`Endpoint`] bundles the primitives and
//! settings with a way to determine the operation each request wants to perform. A
//! [`GuardFlow`] then evaluates requests one after another.
//!
//! The [`frontends::simple`] module contains a request type and a generic endpoint that are
//! useful for testing or for servers without a dedicated frontend.
//!
//! [`WebRequest`]: trait.WebRequest.html
//! [`Endpoint`]: trait.Endpoint.html
//! [`GuardFlow`]: struct.GuardFlow.html
//! [`frontends::simple`]: ../frontends/simple/index.html
mod error;
mod guard;
mod query;

#[cfg(test)]
mod tests;

use std::borrow::Cow;

pub use crate::guard::{GuardConfig, Outcome, Protocols, Rejection, RejectionStatus};
use crate::primitives::analyzer::AccessTokenAnalyzer;
use crate::primitives::consumer::ConsumerStore;
use crate::signature::SignatureMethods;

pub use self::error::OAuthError;
pub use self::guard::GuardFlow;
#[cfg(feature = "async")]
pub(crate) use self::guard::describe;
pub use self::query::{NormalizedParameter, ParameterValues, QueryParameter};

/// Required functionality to guard requests of a particular type.
///
/// Either primitive may return `None` when the protocol using it is disabled in the
/// configuration. Preparing a flow fails otherwise.
pub trait Endpoint<Request: WebRequest> {
    /// The error typed used as the error representation of each flow.
    type Error;

    /// The settings of the guard.
    fn config(&self) -> &GuardConfig;

    /// The accepted signature methods for signed requests.
    fn methods(&self) -> &SignatureMethods;

    /// An analyzer for bearer tokens, used when OAuth 2.0 is enabled.
    fn analyzer(&self) -> Option<&dyn AccessTokenAnalyzer>;

    /// A store of consumer credentials, used when OAuth 1.0 is enabled.
    fn consumers(&self) -> Option<&dyn ConsumerStore>;

    /// Determines the operation a request wants to perform.
    fn operation(&mut self) -> Option<&mut dyn Operation<Request>>;

    /// Wrap an error.
    fn error(&mut self, err: OAuthError) -> Self::Error;
}

/// The operation requested by a request, for example derived from its method and path.
///
/// The returned operation is compared to the scope tokens of the authenticated principal. Returning
/// `None` makes the request fail with a protocol error, no principal is allowed to perform an
/// unknown operation.
pub trait Operation<Request: WebRequest> {
    /// The operation of the request, if it has one.
    fn operation(&mut self, request: &mut Request) -> Option<String>;
}

/// Abstraction of web requests with several different abstractions and constructors needed by the
/// guard. It is assumed to originate from an HTTP request, as defined in the scope of the rfc,
/// but theoretically other requests are possible.
pub trait WebRequest {
    /// The error generated from access of malformed or invalid requests.
    type Error;

    /// The http method of the request, in any case.
    fn method(&mut self) -> Result<Cow<'_, str>, Self::Error>;

    /// The absolute url the request was received at, including the query.
    ///
    /// Signed requests cover scheme, host, port, path and query, so this should reconstruct what
    /// the client sent and not what a proxy forwarded.
    fn url(&mut self) -> Result<Cow<'_, str>, Self::Error>;

    /// Retrieve the parsed `application/x-form-urlencoded` body of the request.
    ///
    /// An Err value indicates a malformed body. A request with a different Content-Type should
    /// return an empty set of parameters instead since its body is never signed.
    fn urlbody(&mut self) -> Result<Cow<'_, dyn QueryParameter + 'static>, Self::Error>;

    /// Contents of the authorization header or none if none exists. An Err value indicates a
    /// malformed header or request.
    fn authheader(&mut self) -> Result<Option<Cow<'_, str>>, Self::Error>;
}

impl<R: WebRequest> Operation<R> for String {
    fn operation(&mut self, _: &mut R) -> Option<String> {
        Some(self.clone())
    }
}

impl<'a, R: WebRequest> Operation<R> for &'a str {
    fn operation(&mut self, _: &mut R) -> Option<String> {
        Some((*self).to_string())
    }
}

impl<'a, R: WebRequest, O: Operation<R> + ?Sized> Operation<R> for &'a mut O {
    fn operation(&mut self, request: &mut R) -> Option<String> {
        (**self).operation(request)
    }
}

impl<R: WebRequest, O: Operation<R> + ?Sized> Operation<R> for Box<O> {
    fn operation(&mut self, request: &mut R) -> Option<String> {
        (**self).operation(request)
    }
}

impl<'a, R: WebRequest, E: Endpoint<R>> Endpoint<R> for &'a mut E {
    type Error = E::Error;

    fn config(&self) -> &GuardConfig {
        (**self).config()
    }

    fn methods(&self) -> &SignatureMethods {
        (**self).methods()
    }

    fn analyzer(&self) -> Option<&dyn AccessTokenAnalyzer> {
        (**self).analyzer()
    }

    fn consumers(&self) -> Option<&dyn ConsumerStore> {
        (**self).consumers()
    }

    fn operation(&mut self) -> Option<&mut dyn Operation<R>> {
        (**self).operation()
    }

    fn error(&mut self, err: OAuthError) -> Self::Error {
        (**self).error(err)
    }
}
