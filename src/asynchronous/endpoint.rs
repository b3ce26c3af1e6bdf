//! Guarding web requests with asynchronous primitives.
use std::marker::PhantomData;

use crate::endpoint::{describe, OAuthError, Operation, WebRequest};
use crate::guard::{self, GuardConfig, Outcome};

use super::guard::{evaluate, Endpoint};

/// Guards protected resources of an asynchronous endpoint.
///
/// The counterpart of `endpoint::GuardFlow`. The operation of requests is determined separately
/// from the primitives, since only the latter need to be shared across tasks.
pub struct GuardFlow<E, O, R>
where
    E: Endpoint,
    O: Operation<R>,
    R: WebRequest,
{
    endpoint: E,
    operation: O,
    request: PhantomData<fn(R)>,
}

impl<E, O, R> GuardFlow<E, O, R>
where
    E: Endpoint,
    O: Operation<R>,
    R: WebRequest,
{
    /// Check that the endpoint supports the protocols it enables.
    pub fn prepare(endpoint: E, operation: O) -> Result<Self, OAuthError> {
        let protocols = endpoint.config().protocols();

        if protocols.oauth2 && endpoint.analyzer().is_none() {
            return Err(OAuthError::PrimitiveError);
        }

        if protocols.oauth1 && endpoint.consumers().is_none() {
            return Err(OAuthError::PrimitiveError);
        }

        Ok(GuardFlow {
            endpoint,
            operation,
            request: PhantomData,
        })
    }

    /// The settings the flow evaluates with.
    pub fn config(&self) -> &GuardConfig {
        self.endpoint.config()
    }

    /// Evaluate a request.
    pub async fn execute(&mut self, mut request: R) -> Outcome {
        let described = describe(&mut request, Some(&mut self.operation));
        match described {
            Ok(descriptor) => evaluate(&self.endpoint, &descriptor).await,
            Err(err) => {
                let result = Err(err);
                guard::trace(&result);
                result.into()
            }
        }
    }
}
