//! Outcomes of an evaluation and the errors leading to them.
use std::error;
use std::fmt;

use tracing::{debug, warn};

use crate::primitives::analyzer::VerificationError;
use crate::primitives::principal::Principal;
use super::config::GuardConfig;

/// The decision about one request.
///
/// Exactly one outcome is produced for each evaluated request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The credentials are valid and the operation is within their scope.
    Allowed(Principal),

    /// The credentials are valid but do not grant the operation.
    Denied,

    /// Credentials are missing, unknown, expired, or not authentic.
    ///
    /// Deliberately carries no reason, all of these cases look identical to the client.
    AuthenticationFailed,

    /// The request was malformed or a component of the server failed.
    ///
    /// The description is meant for logs and never contains secrets, though it may still be
    /// prudent not to forward it to clients verbatim.
    ProtocolError(String),
}

/// Why the guard did not allow a request, with the details that are only logged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The request was malformed or a primitive failed.
    Protocol(String),

    /// The request could not be authenticated.
    AuthenticationFailed(AuthFailure),

    /// The authenticated owner is not allowed to perform the operation.
    Denied {
        /// The name of the principal.
        owner: String,

        /// The requested operation.
        operation: String,
    },
}

/// The internal reason for failed authentication.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthFailure {
    /// The request did not carry any credential.
    NoCredential,

    /// The credential belongs to a protocol that is not enabled.
    ProtocolDisabled,

    /// The consumer or the token of a signed request is unknown.
    UnknownCredentials,

    /// The recomputed signature did not match.
    InvalidSignature,

    /// The timestamp of a signed request is outside the accepted window.
    StaleTimestamp,

    /// The bearer token was rejected by the analyzer.
    InvalidToken(VerificationError),
}

/// The response to send for a request that was not allowed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    status: RejectionStatus,
    www_authenticate: String,
}

/// The http status of a rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionStatus {
    /// `400 Bad Request`, for protocol errors.
    BadRequest,

    /// `401 Unauthorized`, for failed authentication and denied operations alike.
    Unauthorized,
}

impl Outcome {
    /// Whether the request may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Outcome::Allowed(_))
    }

    /// The principal of an allowed request.
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Outcome::Allowed(principal) => Some(principal),
            _ => None,
        }
    }

    /// Take the principal of an allowed request.
    pub fn into_principal(self) -> Option<Principal> {
        match self {
            Outcome::Allowed(principal) => Some(principal),
            _ => None,
        }
    }

    /// The response for a request that was not allowed, or `None` if it was.
    ///
    /// Denied operations and failed authentication produce identical responses.
    pub fn rejection(&self, config: &GuardConfig) -> Option<Rejection> {
        let (status, error) = match self {
            Outcome::Allowed(_) => return None,
            Outcome::Denied | Outcome::AuthenticationFailed => (RejectionStatus::Unauthorized, None),
            Outcome::ProtocolError(_) => (RejectionStatus::BadRequest, Some("invalid_request")),
        };

        let challenges = config
            .protocols()
            .schemes()
            .into_iter()
            .map(|scheme| {
                let mut header = ChallengeHeader::new(scheme);
                header.add_kvp("realm", config.realm());
                header.add_kvp("error", error);
                header.finalize()
            })
            .collect::<Vec<_>>();

        Some(Rejection {
            status,
            www_authenticate: challenges.join(", "),
        })
    }
}

impl From<Result<Principal, Error>> for Outcome {
    fn from(result: Result<Principal, Error>) -> Self {
        match result {
            Ok(principal) => Outcome::Allowed(principal),
            Err(Error::Protocol(detail)) => Outcome::ProtocolError(detail),
            Err(Error::AuthenticationFailed(_)) => Outcome::AuthenticationFailed,
            Err(Error::Denied { .. }) => Outcome::Denied,
        }
    }
}

impl Rejection {
    /// The http status to respond with.
    pub fn status(&self) -> RejectionStatus {
        self.status
    }

    /// The value of the `WWW-Authenticate` header.
    pub fn www_authenticate(&self) -> &str {
        &self.www_authenticate
    }
}

impl RejectionStatus {
    /// The numeric status code.
    pub fn code(self) -> u16 {
        match self {
            RejectionStatus::BadRequest => 400,
            RejectionStatus::Unauthorized => 401,
        }
    }
}

impl Error {
    /// A protocol error with a description for logs.
    pub fn protocol<D: Into<String>>(detail: D) -> Self {
        Error::Protocol(detail.into())
    }
}

/// Log the result of one evaluation.
///
/// Protocol errors are warnings since they hint at broken clients or a failing backend, while
/// rejected credentials are business as usual.
pub(crate) fn trace(result: &Result<Principal, Error>) {
    match result {
        Ok(principal) => debug!(owner = %principal.name(), "request allowed"),
        Err(Error::Protocol(detail)) => warn!(%detail, "request rejected with protocol error"),
        Err(Error::AuthenticationFailed(reason)) => debug!(%reason, "request failed authentication"),
        Err(Error::Denied { owner, operation }) => {
            debug!(%owner, %operation, "operation not within granted scope")
        }
    }
}

struct ChallengeHeader {
    content: String,
    first_option: bool,
}

impl ChallengeHeader {
    fn new(scheme: &str) -> Self {
        ChallengeHeader {
            content: scheme.to_string(),
            first_option: true,
        }
    }

    fn add_option(&mut self, args: fmt::Arguments) {
        if self.first_option {
            self.content.push(' ');
            self.first_option = false;
        } else {
            self.content.push(',');
        }
        // Writing to a `String` can not fail.
        let _ = fmt::write(&mut self.content, args);
    }

    fn add_kvp(&mut self, key: &'static str, value: Option<impl fmt::Display>) {
        if let Some(value) = value {
            let quoted = quoted_string(&value.to_string());
            self.add_option(format_args!("{}=\"{}\"", key, quoted));
        }
    }

    fn finalize(self) -> String {
        self.content
    }
}

/// Escape the content of an http `quoted-string`.
fn quoted_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Protocol(detail) => write!(fmt, "protocol error: {}", detail),
            Error::AuthenticationFailed(reason) => write!(fmt, "authentication failed: {}", reason),
            Error::Denied { owner, operation } => {
                write!(fmt, "`{}` may not perform `{}`", owner, operation)
            }
        }
    }
}

impl error::Error for Error {}

impl fmt::Display for AuthFailure {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthFailure::NoCredential => fmt.write_str("no credential presented"),
            AuthFailure::ProtocolDisabled => fmt.write_str("credential protocol is disabled"),
            AuthFailure::UnknownCredentials => fmt.write_str("unknown consumer or token"),
            AuthFailure::InvalidSignature => fmt.write_str("signature mismatch"),
            AuthFailure::StaleTimestamp => fmt.write_str("timestamp outside accepted window"),
            AuthFailure::InvalidToken(err) => write!(fmt, "bearer token rejected, {}", err),
        }
    }
}
