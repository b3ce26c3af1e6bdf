//! Simple, owning request and response types.
use crate::endpoint::{QueryParameter, WebRequest};
use crate::guard::{GuardConfig, Outcome, RejectionStatus};

use std::borrow::Cow;

/// Open and simple implementation of `WebRequest`.
#[derive(Clone, Debug, Default)]
pub struct Request {
    /// The http method.
    pub method: String,

    /// The absolute url, with the query component.
    pub url: String,

    /// The key-value pairs of a `x-www-form-urlencoded` body, in order.
    pub urlbody: Vec<(String, String)>,

    /// Provided authorization header.
    pub auth: Option<String>,
}

/// Open and simple response to a guarded request.
#[derive(Clone, Debug, Default)]
pub struct Response {
    /// HTTP status code.
    pub status: Status,

    /// Indicates how the client should have authenticated.
    ///
    /// Only set when the request was not allowed.
    pub www_authenticate: Option<String>,
}

/// An enum containing the necessary HTTP status codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Status {
    /// Http status code 200.
    Ok,

    /// Http status code 400.
    BadRequest,

    /// Http status code 401.
    Unauthorized,
}

/// An uninhabited error type for simple requests.
///
/// Since these types are built to never error on their operation, and `!` is not the stable unique
/// representation for uninhabited types, this simple enum without variants is used instead.
#[derive(Clone, Copy, Debug)]
pub enum NoError {}

impl Request {
    /// A request without body or authorization.
    pub fn new<M, U>(method: M, url: U) -> Self
    where
        M: Into<String>,
        U: Into<String>,
    {
        Request {
            method: method.into(),
            url: url.into(),
            urlbody: Vec::new(),
            auth: None,
        }
    }

    /// Set the authorization header.
    pub fn with_auth<A: Into<String>>(mut self, auth: A) -> Self {
        self.auth = Some(auth.into());
        self
    }

    /// Add a parameter of the form body.
    pub fn with_body_param<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.urlbody.push((key.into(), value.into()));
        self
    }
}

impl WebRequest for Request {
    type Error = NoError;

    fn method(&mut self) -> Result<Cow<'_, str>, Self::Error> {
        Ok(Cow::Borrowed(self.method.as_str()))
    }

    fn url(&mut self) -> Result<Cow<'_, str>, Self::Error> {
        Ok(Cow::Borrowed(self.url.as_str()))
    }

    fn urlbody(&mut self) -> Result<Cow<'_, dyn QueryParameter + 'static>, Self::Error> {
        Ok(Cow::Borrowed(&self.urlbody))
    }

    fn authheader(&mut self) -> Result<Option<Cow<'_, str>>, Self::Error> {
        Ok(self.auth.as_ref().map(|string| Cow::Borrowed(string.as_str())))
    }
}

impl Response {
    /// The response for the outcome of a guarded request.
    ///
    /// Allowed requests get an empty `200` response for the application to fill in.
    pub fn from_outcome(outcome: &Outcome, config: &GuardConfig) -> Self {
        match outcome.rejection(config) {
            None => Response::default(),
            Some(rejection) => Response {
                status: match rejection.status() {
                    RejectionStatus::BadRequest => Status::BadRequest,
                    RejectionStatus::Unauthorized => Status::Unauthorized,
                },
                www_authenticate: Some(rejection.www_authenticate().to_string()),
            },
        }
    }
}

impl NoError {
    /// Turn this into any type.
    ///
    /// Since `NoError` is uninhabited, this always works but is never executed.
    pub fn into<T>(self) -> T {
        match self {}
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Ok
    }
}
