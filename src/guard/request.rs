//! The request as seen by the guard, and the credentials it presents.
use std::fmt;

use url::Url;

use crate::signature::{form_pairs, parse_authorization, OAuthHeader};
use super::error::Error;

/// An immutable description of an incoming request.
///
/// Built once by the transport and never modified afterwards. The url must be the absolute url
/// the request was received at, including its query, since signatures cover both. Form
/// parameters are only those of an `application/x-www-form-urlencoded` body, any other body is
/// not represented at all.
///
/// ```
/// # use oxide_guard::guard::RequestDescriptor;
/// let request = RequestDescriptor::new("GET", "https://api.example.com/photos?size=large")
///     .with_authorization("Bearer abc")
///     .with_operation("read");
/// assert_eq!(request.operation(), Some("read"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: String,
    url: String,
    form: Vec<(String, String)>,
    authorization: Option<String>,
    operation: Option<String>,
}

/// The single credential a request carries.
pub(crate) enum Presented {
    /// An OAuth 2.0 bearer token, from the header, the form or the query.
    Bearer(String),

    /// OAuth 1.0 protocol parameters.
    Signed(SignedParams),
}

/// Parameters of a signed request.
pub(crate) struct SignedParams {
    /// All `oauth_` parameters, wherever they were transmitted.
    pub protocol: Vec<(String, String)>,

    /// The signed parameters besides those of the query, that is form and header parameters.
    pub signed: Vec<(String, String)>,
}

const ACCESS_TOKEN: &str = "access_token";
const BEARER: &str = "Bearer";
const SIGNATURE: &str = "oauth_signature";

impl RequestDescriptor {
    /// Describe a request by its method and absolute url.
    pub fn new<M, U>(method: M, url: U) -> Self
    where
        M: Into<String>,
        U: Into<String>,
    {
        RequestDescriptor {
            method: method.into(),
            url: url.into(),
            form: Vec::new(),
            authorization: None,
            operation: None,
        }
    }

    /// Add the decoded parameters of a form encoded body.
    pub fn with_form<I, K, V>(mut self, form: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.form
            .extend(form.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    /// Set the value of the `Authorization` header.
    pub fn with_authorization<A: Into<String>>(mut self, authorization: A) -> Self {
        self.authorization = Some(authorization.into());
        self
    }

    /// Set the operation the request wants to perform.
    pub fn with_operation<O: Into<String>>(mut self, operation: O) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// The request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The absolute request url.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Decoded form parameters, in order of appearance.
    pub fn form(&self) -> &[(String, String)] {
        &self.form
    }

    /// The `Authorization` header.
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// The requested operation.
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Decoded query parameters, in order of appearance.
    ///
    /// Parameters that are not utf-8 are left out, they still count towards the signature through
    /// the url. A credential parameter that is not utf-8 is an error.
    pub(crate) fn query(&self) -> Result<Vec<(String, String)>, Error> {
        let url = Url::parse(&self.url)
            .map_err(|err| Error::protocol(format!("request url is invalid: {}", err)))?;

        let mut query = Vec::new();
        for (name, value) in form_pairs(url.query().unwrap_or("")) {
            match (String::from_utf8(name), String::from_utf8(value)) {
                (Ok(name), Ok(value)) => query.push((name, value)),
                (Ok(name), Err(_)) if is_credential(&name) => {
                    return Err(Error::protocol("credential parameter is not valid utf-8"))
                }
                _ => (),
            }
        }

        Ok(query)
    }

    /// Find the credential of the request.
    ///
    /// Returns `Ok(None)` if there is none. Presenting more than one credential, through
    /// different transmission methods or repeated within one, is an error.
    pub(crate) fn presented(&self) -> Result<Option<Presented>, Error> {
        let query = self.query()?;
        let mut bearer = Vec::new();
        let mut header = None;
        let mut signatures = 0;

        if let Some(authorization) = self.authorization() {
            if let Some(token) = bearer_token(authorization)? {
                bearer.push(token);
            } else {
                header = parse_authorization(authorization).map_err(|err| Error::protocol(err.to_string()))?;
            }
        }

        for (name, value) in query.iter().chain(&self.form) {
            if name == ACCESS_TOKEN {
                if value.is_empty() {
                    return Err(Error::protocol("empty access token parameter"));
                }
                bearer.push(value.clone());
            } else if name == SIGNATURE {
                signatures += 1;
            }
        }

        let presented = bearer.len() + signatures + header.is_some() as usize;
        if presented > 1 {
            return Err(Error::protocol("more than one credential presented"));
        }

        if let Some(token) = bearer.pop() {
            return Ok(Some(Presented::Bearer(token)));
        }

        if header.is_none() && signatures == 0 {
            return Ok(None);
        }

        Ok(Some(Presented::Signed(self.signed_params(header, &query))))
    }

    fn signed_params(&self, header: Option<OAuthHeader>, query: &[(String, String)]) -> SignedParams {
        let header = header.map(|header| header.params).unwrap_or_default();
        let protocol = header
            .iter()
            .chain(query)
            .chain(&self.form)
            .filter(|(name, _)| name.starts_with("oauth_"))
            .cloned()
            .collect();
        let signed = self.form.iter().chain(&header).cloned().collect();
        SignedParams { protocol, signed }
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let form = self.form.iter().map(|(name, _)| name).collect::<Vec<_>>();
        fmt.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("form", &form)
            .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
            .field("operation", &self.operation)
            .finish()
    }
}

/// Extract the token of a `Bearer` authorization header.
///
/// Returns `Ok(None)` for other schemes.
fn bearer_token(authorization: &str) -> Result<Option<String>, Error> {
    let authorization = authorization.trim();
    let (scheme, token) = match authorization.find(char::is_whitespace) {
        Some(idx) => authorization.split_at(idx),
        None => (authorization, ""),
    };

    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Ok(None);
    }

    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(Error::protocol("malformed bearer authorization header"));
    }

    Ok(Some(token.to_string()))
}

fn is_credential(name: &str) -> bool {
    name == ACCESS_TOKEN || name.starts_with("oauth_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RequestDescriptor {
        RequestDescriptor::new("GET", "https://api.example.com/data")
    }

    fn bearer(request: RequestDescriptor) -> String {
        match request.presented() {
            Ok(Some(Presented::Bearer(token))) => token,
            _ => panic!("expected a bearer token"),
        }
    }

    fn signed(request: RequestDescriptor) -> SignedParams {
        match request.presented() {
            Ok(Some(Presented::Signed(params))) => params,
            _ => panic!("expected signed parameters"),
        }
    }

    #[test]
    fn no_credentials() {
        assert!(matches!(request().presented(), Ok(None)));
        let basic = request().with_authorization("Basic dXNlcjpwYXNz");
        assert!(matches!(basic.presented(), Ok(None)));
    }

    #[test]
    fn bearer_transmissions() {
        assert_eq!(bearer(request().with_authorization("Bearer abc")), "abc");
        assert_eq!(bearer(request().with_authorization("bearer   abc ")), "abc");
        assert_eq!(bearer(request().with_form(vec![("access_token", "def")])), "def");
        let query = RequestDescriptor::new("GET", "https://api.example.com/data?access_token=ghi");
        assert_eq!(bearer(query), "ghi");
    }

    #[test]
    fn bearer_malformed() {
        let empty = request().with_authorization("Bearer");
        assert!(empty.presented().is_err());
        let spaced = request().with_authorization("Bearer a b");
        assert!(spaced.presented().is_err());
        let form = request().with_form(vec![("access_token", "")]);
        assert!(form.presented().is_err());
    }

    #[test]
    fn multiple_credentials() {
        let twice = request()
            .with_authorization("Bearer abc")
            .with_form(vec![("access_token", "abc")]);
        assert!(twice.presented().is_err());

        let mixed = request()
            .with_authorization("OAuth oauth_signature=\"x\"")
            .with_form(vec![("access_token", "abc")]);
        assert!(mixed.presented().is_err());

        let repeated = RequestDescriptor::new(
            "GET",
            "https://api.example.com/data?oauth_signature=a&oauth_signature=b",
        );
        assert!(repeated.presented().is_err());
    }

    #[test]
    fn signed_from_header() {
        let params = signed(
            request()
                .with_authorization("OAuth realm=\"r\", oauth_token=\"t\", oauth_signature=\"s\"")
                .with_form(vec![("a", "1")]),
        );
        assert_eq!(params.protocol.len(), 2);
        assert!(params.signed.contains(&("a".to_string(), "1".to_string())));
        assert!(params.signed.contains(&("oauth_token".to_string(), "t".to_string())));
        assert!(!params.signed.iter().any(|(name, _)| name == "realm"));
    }

    #[test]
    fn signed_from_query() {
        let request = RequestDescriptor::new(
            "GET",
            "https://api.example.com/data?oauth_token=t&oauth_signature=s&b=2",
        );
        let params = signed(request);
        assert_eq!(params.protocol.len(), 2);
        assert!(params.signed.is_empty());
    }

    #[test]
    fn query_octets() {
        let request = RequestDescriptor::new("GET", "https://api.example.com/data?a=%FF&b=2+3");
        assert_eq!(request.query().unwrap(), vec![("b".to_string(), "2 3".to_string())]);

        let token = RequestDescriptor::new("GET", "https://api.example.com/data?access_token=%FF");
        assert!(token.presented().is_err());
    }

    #[test]
    fn malformed_url() {
        let request = RequestDescriptor::new("GET", "/data").with_authorization("Bearer abc");
        assert!(request.presented().is_err());
    }

    #[test]
    fn debug_hides_credentials() {
        let request = request()
            .with_authorization("Bearer secret-token")
            .with_form(vec![("access_token", "secret-form")]);
        let debug = format!("{:?}", request);
        assert!(!debug.contains("secret-token"));
        assert!(!debug.contains("secret-form"));
    }
}
