//! Provides the handling of protected resource requests.
//!
//! The guard is a state machine that is fed a [`RequestDescriptor`] and asks its executor for the
//! data it needs in turn: the credentials of a consumer for a signed request, or the analysis of
//! a bearer token. This keeps it independent of whether those primitives are blocking or
//! asynchronous. The [`protect`] function drives it with blocking primitives, the `asynchronous`
//! module with futures.
//!
//! The stages of one evaluation are always the same. First the protocol is selected by the
//! credential the request presents. Then the credential is verified, either by recomputing the
//! request signature or by analyzing the token, and turned into a `Principal`. Finally the
//! requested operation is checked against the scope of that principal.
//!
//! [`RequestDescriptor`]: struct.RequestDescriptor.html
//! [`protect`]: fn.protect.html
use std::collections::HashSet;
use std::mem;

use chrono::Utc;

use crate::primitives::analyzer::{AccessGrant, AccessTokenAnalyzer, VerificationError};
use crate::primitives::consumer::{ConsumerStore, Credentials, StoreError};
use crate::primitives::principal::{Principal, VerifiedCredential};
use crate::signature::{base_string, Signature, SignatureMethods};

mod config;
mod decision;
mod error;
mod request;

pub use self::config::{ConfigError, GuardConfig, Protocols};
pub use self::decision::{authorize, Decision};
pub use self::error::{AuthFailure, Error, Outcome, Rejection, RejectionStatus};
pub use self::request::RequestDescriptor;

pub(crate) use self::error::trace;
use self::request::{Presented, SignedParams};

type Result<T> = std::result::Result<T, Error>;

/// Protocol parameters every signed request must carry.
const REQUIRED: [&str; 6] = [
    "oauth_consumer_key",
    "oauth_token",
    "oauth_signature_method",
    "oauth_signature",
    "oauth_timestamp",
    "oauth_nonce",
];

/// Required functionality to evaluate protected requests.
///
/// Either primitive may be absent if the corresponding protocol is disabled.
pub trait Endpoint {
    /// The settings of the guard.
    fn config(&self) -> &GuardConfig;

    /// The accepted signature methods of signed requests.
    fn methods(&self) -> &SignatureMethods;

    /// The analyzer of bearer tokens.
    fn analyzer(&self) -> Option<&dyn AccessTokenAnalyzer>;

    /// The store of consumer credentials for signed requests.
    fn consumers(&self) -> Option<&dyn ConsumerStore>;
}

/// The state machine evaluating a single request.
pub struct Guard<'a> {
    config: &'a GuardConfig,
    methods: &'a SignatureMethods,
    operation: Option<String>,
    state: GuardState,
}

enum GuardState {
    /// The initial state.
    New,
    /// A signed request awaiting the credentials of its consumer.
    Lookup(SignedRequest),
    /// A bearer token awaiting its analysis.
    Analyze { token: String },
    /// The principal was returned.
    Finished,
    /// State after an error occurred.
    Err(Error),
}

struct SignedRequest {
    consumer_key: String,
    token: String,
    method: String,
    base_string: String,
    signature: Signature,
}

/// An input injected by the executor into the state machine.
pub enum Input<'req> {
    /// Provides the request to evaluate.
    Request(&'req RequestDescriptor),

    /// The result of a consumer store lookup.
    Credentials(std::result::Result<Option<Credentials>, StoreError>),

    /// The result of analyzing a bearer token.
    Analyzed(std::result::Result<AccessGrant, VerificationError>),

    /// Advance without input as far as possible, or just retrieve the output again.
    None,
}

/// A request by the state machine to the executor.
///
/// The output of most states is simply repeated if `Input::None` is provided instead but note
/// that the principal of an allowed request is **not** repeated.
///
/// This borrows data from the underlying state machine, so you need to drop it before advancing it
/// with newly provided input.
#[derive(Debug)]
pub enum Output<'machine> {
    /// The state requires the request to advance.
    GetRequest,

    /// The consumer store should be queried.
    ///
    /// Fulfilled by `Input::Credentials`.
    LookupConsumer {
        /// The consumer key of the request.
        consumer_key: &'machine str,
        /// The token of the request.
        token: &'machine str,
    },

    /// The analyzer should check the bearer token.
    ///
    /// Fulfilled by `Input::Analyzed`.
    Analyze {
        /// The token presented by the client.
        token: &'machine str,
    },

    /// The state machine finished and access was allowed.
    ///
    /// This output **can not** be requested repeatedly, any future `Input` will yield a protocol
    /// error instead.
    Ok(Principal),

    /// The state machine finished in an error.
    ///
    /// The error will be repeated on *any* following input.
    Err(Error),
}

impl<'a> Guard<'a> {
    /// Create a guard state machine at the start of an evaluation.
    pub fn new(config: &'a GuardConfig, methods: &'a SignatureMethods) -> Self {
        Guard {
            config,
            methods,
            operation: None,
            state: GuardState::New,
        }
    }

    /// Progress the state machine to the next step, taking in the needed `Input`.
    pub fn advance(&mut self, input: Input) -> Output<'_> {
        self.state = match (self.take(), input) {
            (any, Input::None) => any,
            (GuardState::New, Input::Request(request)) => {
                self.select(request).unwrap_or_else(GuardState::Err)
            }
            (GuardState::Lookup(signed), Input::Credentials(credentials)) => {
                match self.verify_signed(signed, credentials) {
                    Ok(verified) => return self.conclude(verified),
                    Err(err) => GuardState::Err(err),
                }
            }
            (GuardState::Analyze { .. }, Input::Analyzed(grant)) => match analyzed(grant) {
                Ok(verified) => return self.conclude(verified),
                Err(err) => GuardState::Err(err),
            },
            (GuardState::Err(err), _) => GuardState::Err(err),
            _ => return Output::Err(Error::protocol("guard advanced with unexpected input")),
        };

        self.output()
    }

    fn output(&self) -> Output<'_> {
        match &self.state {
            GuardState::New => Output::GetRequest,
            GuardState::Lookup(signed) => Output::LookupConsumer {
                consumer_key: &signed.consumer_key,
                token: &signed.token,
            },
            GuardState::Analyze { token } => Output::Analyze { token },
            GuardState::Finished => Output::Err(Error::protocol("guard already finished")),
            GuardState::Err(error) => Output::Err(error.clone()),
        }
    }

    fn take(&mut self) -> GuardState {
        mem::replace(&mut self.state, GuardState::Finished)
    }

    fn select(&mut self, request: &RequestDescriptor) -> Result<GuardState> {
        self.operation = request.operation().map(str::to_string);
        let protocols = self.config.protocols();

        match request.presented()? {
            None => Err(Error::AuthenticationFailed(AuthFailure::NoCredential)),
            Some(Presented::Bearer(token)) if protocols.oauth2 => Ok(GuardState::Analyze { token }),
            Some(Presented::Signed(params)) if protocols.oauth1 => {
                self.signed(request, params).map(GuardState::Lookup)
            }
            Some(_) => Err(Error::AuthenticationFailed(AuthFailure::ProtocolDisabled)),
        }
    }

    fn signed(&self, request: &RequestDescriptor, params: SignedParams) -> Result<SignedRequest> {
        let mut seen = HashSet::new();
        if let Some((name, _)) = params.protocol.iter().find(|(name, _)| !seen.insert(name.as_str())) {
            return Err(Error::protocol(format!("repeated protocol parameter `{}`", name)));
        }

        let lookup = |name: &str| {
            params
                .protocol
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        if let Some(missing) = REQUIRED
            .iter()
            .find(|&&name| lookup(name).map_or(true, str::is_empty))
        {
            return Err(Error::protocol(format!("missing protocol parameter `{}`", missing)));
        }

        // All of these are present after the check above.
        let consumer_key = lookup("oauth_consumer_key").unwrap_or_default();
        let token = lookup("oauth_token").unwrap_or_default();
        let method = lookup("oauth_signature_method").unwrap_or_default();
        let signature = lookup("oauth_signature").unwrap_or_default();
        let timestamp = lookup("oauth_timestamp").unwrap_or_default();

        match lookup("oauth_version") {
            None | Some("1.0") => (),
            Some(other) => {
                return Err(Error::protocol(format!("unsupported protocol version `{}`", other)))
            }
        }

        if self.methods.find(method).is_none() {
            return Err(Error::protocol(format!("unsupported signature method `{}`", method)));
        }

        let timestamp: u64 = timestamp
            .parse()
            .map_err(|_| Error::protocol("timestamp is not a number of seconds"))?;
        if let Some(skew) = self.config.timestamp_skew() {
            let now = Utc::now().timestamp().max(0) as u64;
            let drift = if now > timestamp { now - timestamp } else { timestamp - now };
            if drift > skew.as_secs() {
                return Err(Error::AuthenticationFailed(AuthFailure::StaleTimestamp));
            }
        }

        let signed = params.signed.iter().map(|(name, value)| (name.as_str(), value.as_str()));
        let base_string = base_string(request.method(), request.url(), signed)
            .map_err(|err| Error::protocol(err.to_string()))?;

        Ok(SignedRequest {
            consumer_key: consumer_key.to_string(),
            token: token.to_string(),
            method: method.to_string(),
            base_string,
            signature: Signature::from_base64(signature),
        })
    }

    fn verify_signed(
        &self, signed: SignedRequest,
        credentials: std::result::Result<Option<Credentials>, StoreError>,
    ) -> Result<VerifiedCredential> {
        let credentials = credentials
            .map_err(|err| Error::protocol(err.to_string()))?
            .ok_or(Error::AuthenticationFailed(AuthFailure::UnknownCredentials))?;

        let method = self
            .methods
            .find(&signed.method)
            .ok_or_else(|| Error::protocol("signature method disappeared"))?;

        if !method.verify(&signed.base_string, &credentials.signing_key(), &signed.signature) {
            return Err(Error::AuthenticationFailed(AuthFailure::InvalidSignature));
        }

        Ok(VerifiedCredential {
            subject: credentials.owner_id,
            scope: credentials.scope,
        })
    }

    fn conclude(&mut self, verified: VerifiedCredential) -> Output<'_> {
        match self.authorized(verified) {
            Ok(principal) => Output::Ok(principal),
            Err(err) => {
                self.state = GuardState::Err(err.clone());
                Output::Err(err)
            }
        }
    }

    fn authorized(&self, verified: VerifiedCredential) -> Result<Principal> {
        let principal = Principal::from_credential(verified).map_err(|err| Error::protocol(err.to_string()))?;
        let operation = self
            .operation
            .as_deref()
            .ok_or_else(|| Error::protocol("no operation determined for the request"))?;

        match authorize(&principal, operation) {
            Decision::Allow => Ok(principal),
            Decision::Deny => Err(Error::Denied {
                owner: principal.name().to_string(),
                operation: operation.to_string(),
            }),
        }
    }
}

fn analyzed(grant: std::result::Result<AccessGrant, VerificationError>) -> Result<VerifiedCredential> {
    grant
        .map(|grant| VerifiedCredential {
            subject: grant.owner_id,
            scope: grant.scope,
        })
        .map_err(|err| Error::AuthenticationFailed(AuthFailure::InvalidToken(err)))
}

/// Evaluate a request with blocking primitives.
///
/// Store lookups happen inline and can not be interrupted, so a blocking store should bound its
/// own latency. Use the asynchronous guard for a lookup timeout.
pub fn protect(endpoint: &dyn Endpoint, request: &RequestDescriptor) -> Result<Principal> {
    enum Requested {
        None,
        Request,
        Lookup { consumer_key: String, token: String },
        Analyze(String),
    }

    let mut guard = Guard::new(endpoint.config(), endpoint.methods());
    let mut requested = Requested::None;
    loop {
        let input = match requested {
            Requested::None => Input::None,
            Requested::Request => Input::Request(request),
            Requested::Lookup { consumer_key, token } => {
                let consumers = endpoint
                    .consumers()
                    .ok_or_else(|| Error::protocol("no consumer store configured"))?;
                Input::Credentials(consumers.lookup(&consumer_key, &token))
            }
            Requested::Analyze(token) => {
                let analyzer = endpoint
                    .analyzer()
                    .ok_or_else(|| Error::protocol("no token analyzer configured"))?;
                Input::Analyzed(analyzer.analyze(&token))
            }
        };

        requested = match guard.advance(input) {
            Output::Err(error) => return Err(error),
            Output::Ok(principal) => return Ok(principal),
            Output::GetRequest => Requested::Request,
            Output::LookupConsumer { consumer_key, token } => Requested::Lookup {
                consumer_key: consumer_key.to_string(),
                token: token.to_string(),
            },
            Output::Analyze { token } => Requested::Analyze(token.to_string()),
        };
    }
}

/// Evaluate a request and log the result.
pub fn evaluate(endpoint: &dyn Endpoint, request: &RequestDescriptor) -> Outcome {
    let result = protect(endpoint, request);
    trace(&result);
    result.into()
}
