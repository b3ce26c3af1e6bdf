//! An ad-hoc endpoint.
//!
//! Provides a simple struct with public members – [`Generic`] – that implements the central
//! [`Endpoint`] trait implementation. Tries to implement the least amount of policies and logic
//! while providing the biggest possible customizability (priority in this order).
//!
//! [`Generic`]: ./struct.Generic.html
//! [`Endpoint`]: ../../endpoint/trait.Endpoint.html

use crate::endpoint::{Endpoint, GuardFlow, OAuthError, Operation, WebRequest};
use crate::guard::GuardConfig;
use crate::primitives::analyzer::AccessTokenAnalyzer;
use crate::primitives::consumer::ConsumerStore;
use crate::signature::SignatureMethods;

/// Errors either caused by the underlying web types or the library.
#[derive(Debug)]
pub enum Error<W: WebRequest> {
    /// An operation on a request failed.
    ///
    /// Typically, this should be represented as a `500–Internal Server Error`.
    Web(W::Error),

    /// Some part of the library signaled failure.
    OAuth(OAuthError),
}

/// A rather basic [`Endpoint`] implementation.
///
/// Substitute all primitives that are not provided with the marker struct [`Vacant`]. Preparing a
/// [`GuardFlow`] fails when a protocol is enabled whose primitive is vacant, so this can never
/// silently accept requests of a protocol it can not verify.
///
/// All attributes are public, so there is no inner invariant.
///
/// ## Example
///
/// Guard requests with bearer tokens signed by ephemeral keys, allowing the operation `read`.
///
/// ```
/// # use std::sync::Arc;
/// use oxide_guard::frontends::simple::endpoint::{Generic, Vacant};
/// use oxide_guard::frontends::simple::request::Request;
/// use oxide_guard::guard::GuardConfig;
/// use oxide_guard::primitives::analyzer::{AccessGrant, StandardAnalyzer};
/// use oxide_guard::primitives::keys::ServerKeys;
/// use oxide_guard::signature::SignatureMethods;
///
/// let keys = Arc::new(ServerKeys::ephemeral().unwrap());
/// let analyzer = StandardAnalyzer::new(keys);
/// let token = analyzer.issue(&AccessGrant {
///     owner_id: "alice".into(),
///     client_id: "photos".into(),
///     scope: "read".parse().unwrap(),
///     until: chrono::Utc::now() + chrono::Duration::minutes(5),
/// }).unwrap();
///
/// let endpoint = Generic {
///     config: GuardConfig::default(),
///     methods: SignatureMethods::default(),
///     analyzer,
///     consumers: Vacant,
///     operation: "read",
/// };
///
/// let mut flow = endpoint.guard_flow().unwrap();
/// let request = Request::new("GET", "https://api.example.com/photos")
///     .with_auth(format!("Bearer {}", token));
/// assert!(flow.execute(request).is_allowed());
/// ```
///
/// [`Endpoint`]: ../../../endpoint/trait.Endpoint.html
/// [`Vacant`]: struct.Vacant.html
/// [`GuardFlow`]: ../../../endpoint/struct.GuardFlow.html
pub struct Generic<A, C, O> {
    /// The settings of the guard.
    pub config: GuardConfig,

    /// The accepted signature methods of signed requests.
    pub methods: SignatureMethods,

    /// The bearer token analyzer, or `Vacant` if OAuth 2.0 is disabled.
    pub analyzer: A,

    /// The consumer store, or `Vacant` if OAuth 1.0 is disabled.
    pub consumers: C,

    /// Determines the operation of each request.
    pub operation: O,
}

/// Marker struct if some primitive is not provided.
///
/// Used in place of other primitives when those are not provided. Returns `Option::None` in the
/// implementations for `OptAnalyzer` and `OptConsumers`, so preparing a flow that would need it
/// fails.
pub struct Vacant;

/// A simple wrapper for functions and lambdas to determine the operation of requests.
pub struct FnOperation<F>(pub F);

/// Like `AsRef<AccessTokenAnalyzer + '_>` but in a way that is expressible.
///
/// You are not supposed to need to implement this.
///
/// The `std` trait implies the trait lifetime bound be independent of the lifetime of `&self`,
/// while `opt_ref` should have unsugared signature:
///
/// > `fn opt_ref<'a>(&'a self) -> Option<&'a (Trait + 'a)>`
pub trait OptAnalyzer {
    /// Reference this as an `AccessTokenAnalyzer` or `Option::None`.
    fn opt_ref(&self) -> Option<&dyn AccessTokenAnalyzer>;
}

/// Like `AsRef<ConsumerStore + '_>` but in a way that is expressible.
///
/// You are not supposed to need to implement this. See `OptAnalyzer` for the reasoning.
pub trait OptConsumers {
    /// Reference this as a `ConsumerStore` or `Option::None`.
    fn opt_ref(&self) -> Option<&dyn ConsumerStore>;
}

impl<A, C, O> Generic<A, C, O> {
    /// Create a guard flow for requests of type `W`.
    ///
    /// Fails if a protocol is enabled whose primitive is `Vacant`.
    pub fn guard_flow<W: WebRequest>(self) -> Result<GuardFlow<Self, W>, Error<W>>
    where
        Self: Endpoint<W, Error = Error<W>>,
    {
        GuardFlow::prepare(self)
    }

    /// Replace the operation of the endpoint.
    pub fn with_operation<P>(self, operation: P) -> Generic<A, C, P> {
        Generic {
            config: self.config,
            methods: self.methods,
            analyzer: self.analyzer,
            consumers: self.consumers,
            operation,
        }
    }
}

impl<W, A, C, O> Endpoint<W> for Generic<A, C, O>
where
    W: WebRequest,
    A: OptAnalyzer,
    C: OptConsumers,
    O: Operation<W>,
{
    type Error = Error<W>;

    fn config(&self) -> &GuardConfig {
        &self.config
    }

    fn methods(&self) -> &SignatureMethods {
        &self.methods
    }

    fn analyzer(&self) -> Option<&dyn AccessTokenAnalyzer> {
        self.analyzer.opt_ref()
    }

    fn consumers(&self) -> Option<&dyn ConsumerStore> {
        self.consumers.opt_ref()
    }

    fn operation(&mut self) -> Option<&mut dyn Operation<W>> {
        Some(&mut self.operation)
    }

    fn error(&mut self, err: OAuthError) -> Error<W> {
        Error::OAuth(err)
    }
}

impl<T: AccessTokenAnalyzer> OptAnalyzer for T {
    fn opt_ref(&self) -> Option<&dyn AccessTokenAnalyzer> {
        Some(self)
    }
}

impl OptAnalyzer for Vacant {
    fn opt_ref(&self) -> Option<&dyn AccessTokenAnalyzer> {
        Option::None
    }
}

impl<T: ConsumerStore> OptConsumers for T {
    fn opt_ref(&self) -> Option<&dyn ConsumerStore> {
        Some(self)
    }
}

impl OptConsumers for Vacant {
    fn opt_ref(&self) -> Option<&dyn ConsumerStore> {
        Option::None
    }
}

impl<W, F> Operation<W> for FnOperation<F>
where
    W: WebRequest,
    F: FnMut(&mut W) -> Option<String>,
{
    fn operation(&mut self, request: &mut W) -> Option<String> {
        (self.0)(request)
    }
}
