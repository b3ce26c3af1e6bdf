use std::error;
use std::fmt;

/// Errors which should not or need not be communicated to the requesting party but which are of
/// interest to the server.
///
/// These are only produced while preparing a flow, before any request has been seen. Anything
/// going wrong with an individual request is reported through its `Outcome` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OAuthError {
    /// One of the primitives needed by an enabled protocol is missing.
    ///
    /// This indicates a problem in the server configuration, for example enabling OAuth 1.0
    /// signed requests without providing a consumer store.
    PrimitiveError,

    /// The endpoint can not determine the operation of requests.
    ///
    /// Without an operation no request could ever be allowed.
    MissingOperation,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            OAuthError::PrimitiveError => fmt.write_str("OAuthError: Server component missing"),
            OAuthError::MissingOperation => fmt.write_str("OAuthError: No operation for requests"),
        }
    }
}

impl error::Error for OAuthError {}
