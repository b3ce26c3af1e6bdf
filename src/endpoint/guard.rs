use std::borrow::Cow;
use std::marker::PhantomData;

use crate::guard::{self, Error, GuardConfig, Outcome, RequestDescriptor};
use crate::primitives::analyzer::AccessTokenAnalyzer;
use crate::primitives::consumer::ConsumerStore;
use crate::signature::SignatureMethods;

use super::{Endpoint, OAuthError, Operation, WebRequest};

/// Guards protected resources of an endpoint.
///
/// Each request is described once, by reading its method, url, form body and authorization
/// header, and then handed to the guard state machine. The result is one `Outcome` per request.
/// Failing to read a request is itself a protocol error, the request is never let through.
///
/// The flow can be reused for any number of requests.
pub struct GuardFlow<E, R>
where
    E: Endpoint<R>,
    R: WebRequest,
{
    endpoint: WrappedGuard<E, R>,
}

struct WrappedGuard<E: Endpoint<R>, R: WebRequest>(E, PhantomData<fn(R)>);

impl<E, R> GuardFlow<E, R>
where
    E: Endpoint<R>,
    R: WebRequest,
{
    /// Check that the endpoint supports the protocols it enables.
    ///
    /// Enabling OAuth 2.0 requires an analyzer, enabling OAuth 1.0 requires a consumer store. The
    /// endpoint must always be able to determine an operation.
    pub fn prepare(mut endpoint: E) -> Result<Self, E::Error> {
        let protocols = endpoint.config().protocols();

        if protocols.oauth2 && endpoint.analyzer().is_none() {
            return Err(endpoint.error(OAuthError::PrimitiveError));
        }

        if protocols.oauth1 && endpoint.consumers().is_none() {
            return Err(endpoint.error(OAuthError::PrimitiveError));
        }

        if endpoint.operation().is_none() {
            return Err(endpoint.error(OAuthError::MissingOperation));
        }

        Ok(GuardFlow {
            endpoint: WrappedGuard(endpoint, PhantomData),
        })
    }

    /// The settings the flow evaluates with.
    pub fn config(&self) -> &GuardConfig {
        self.endpoint.0.config()
    }

    /// Evaluate a request.
    pub fn execute(&mut self, mut request: R) -> Outcome {
        let operation = self.endpoint.0.operation();
        match describe(&mut request, operation) {
            Ok(descriptor) => guard::evaluate(&self.endpoint, &descriptor),
            Err(err) => {
                let result = Err(err);
                guard::trace(&result);
                result.into()
            }
        }
    }
}

impl<E: Endpoint<R>, R: WebRequest> guard::Endpoint for WrappedGuard<E, R> {
    fn config(&self) -> &GuardConfig {
        self.0.config()
    }

    fn methods(&self) -> &SignatureMethods {
        self.0.methods()
    }

    fn analyzer(&self) -> Option<&dyn AccessTokenAnalyzer> {
        self.0.analyzer()
    }

    fn consumers(&self) -> Option<&dyn ConsumerStore> {
        self.0.consumers()
    }
}

/// Read everything the guard needs from a request.
///
/// Failing to read any part is a protocol error. The request is never let through on partial
/// information since a signature covers all of it.
pub(crate) fn describe<R: WebRequest>(
    request: &mut R, operation: Option<&mut dyn Operation<R>>,
) -> Result<RequestDescriptor, Error> {
    let method = request
        .method()
        .map_err(|_| Error::protocol("request method could not be read"))?
        .into_owned();
    let url = request
        .url()
        .map_err(|_| Error::protocol("request url could not be read"))?
        .into_owned();
    let form = request
        .urlbody()
        .map_err(|_| Error::protocol("request body is not a valid form"))?
        .into_owned()
        .into_pairs();
    let authorization = request
        .authheader()
        .map_err(|_| Error::protocol("authorization header could not be read"))?
        .map(Cow::into_owned);

    let mut descriptor = RequestDescriptor::new(method, url).with_form(form);
    if let Some(authorization) = authorization {
        descriptor = descriptor.with_authorization(authorization);
    }

    if let Some(operation) = operation.and_then(|operation| operation.operation(request)) {
        descriptor = descriptor.with_operation(operation);
    }

    Ok(descriptor)
}
