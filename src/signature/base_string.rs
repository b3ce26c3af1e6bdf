//! Construction of the signature base string.
//!
//! The base string is the concatenation of three percent-encoded parts joined by `&`: the
//! uppercase request method, the normalized request url, and the normalized parameter string.
//! Both parties compute it independently, so any divergence in normalization makes an otherwise
//! valid signature fail. Everything here is therefore deterministic and free of side effects.
use std::error;
use std::fmt;

use url::Url;

use super::{form_pairs, percent_encode, percent_encode_bytes};

/// The parameter carrying the signature itself, never part of the signed parameters.
pub const SIGNATURE_PARAMETER: &str = "oauth_signature";

/// The request could not be canonicalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CanonicalError {
    /// The request url was not absolute or not a url at all.
    InvalidUrl(url::ParseError),

    /// Only `http` and `https` urls can be signed.
    UnsupportedScheme(String),

    /// The url has no host component.
    MissingHost,

    /// The request method was empty or contained characters outside the visible ascii range.
    InvalidMethod,
}

/// Normalize an absolute url for inclusion in the base string.
///
/// Scheme and host are lowercased, the port is dropped when it is the default for the scheme,
/// and query as well as fragment are removed. The path is kept exactly as received.
///
/// ```
/// # use oxide_guard::signature::normalize_url;
/// let url = normalize_url("HTTP://Example.COM:80/r%20v/X?id=123#frag").unwrap();
/// assert_eq!(url, "http://example.com/r%20v/X");
/// ```
pub fn normalize_url(url: &str) -> Result<String, CanonicalError> {
    let url = Url::parse(url).map_err(CanonicalError::InvalidUrl)?;
    normalized(&url)
}

fn normalized(url: &Url) -> Result<String, CanonicalError> {
    match url.scheme() {
        "http" | "https" => (),
        other => return Err(CanonicalError::UnsupportedScheme(other.to_string())),
    }

    let host = url.host_str().ok_or(CanonicalError::MissingHost)?;
    let mut normal = format!("{}://{}", url.scheme(), host.to_ascii_lowercase());

    // `port` is already `None` for the default port of the scheme.
    if let Some(port) = url.port() {
        normal.push(':');
        normal.push_str(&port.to_string());
    }

    normal.push_str(url.path());
    Ok(normal)
}

/// Build the normalized parameter string from decoded name and value pairs.
///
/// Each name and value is percent-encoded, then the pairs are sorted by encoded name and, for
/// equal names, by encoded value. Pairs are joined as `name=value` with `&` between them. The
/// `oauth_signature` parameter is skipped. A `realm` must not be passed here, it is only ever
/// part of the authorization header and never signed.
pub fn normalized_parameters<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let encoded = params
        .into_iter()
        .map(|(name, value)| (percent_encode(name), percent_encode(value)))
        .collect();
    join_encoded(encoded)
}

fn join_encoded(mut encoded: Vec<(String, String)>) -> String {
    encoded.retain(|(name, _)| name != SIGNATURE_PARAMETER);
    encoded.sort();

    encoded
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the signature base string of a request.
///
/// The parameters of the query component are taken from `url` itself while `params` supplies all
/// others, that is form encoded body parameters and the protocol parameters from the header. All
/// of them are expected in decoded form.
///
/// ```
/// # use oxide_guard::signature::base_string;
/// let base = base_string("get", "https://api.example.com/data?b=2&a=1", None).unwrap();
/// assert_eq!(base, "GET&https%3A%2F%2Fapi.example.com%2Fdata&a%3D1%26b%3D2");
/// ```
pub fn base_string<'a, I>(method: &str, url: &str, params: I) -> Result<String, CanonicalError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(CanonicalError::InvalidMethod);
    }

    let url = Url::parse(url).map_err(CanonicalError::InvalidUrl)?;
    let normal_url = normalized(&url)?;

    // Query octets are encoded as received, they need not be utf-8.
    let mut encoded = form_pairs(url.query().unwrap_or(""))
        .iter()
        .map(|(name, value)| (percent_encode_bytes(name), percent_encode_bytes(value)))
        .collect::<Vec<_>>();
    encoded.extend(
        params
            .into_iter()
            .map(|(name, value)| (percent_encode(name), percent_encode(value))),
    );
    let parameters = join_encoded(encoded);

    Ok(format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(&normal_url),
        percent_encode(&parameters)
    ))
}

impl fmt::Display for CanonicalError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CanonicalError::InvalidUrl(err) => write!(fmt, "request url is invalid: {}", err),
            CanonicalError::UnsupportedScheme(scheme) => {
                write!(fmt, "request url scheme `{}` can not be signed", scheme)
            }
            CanonicalError::MissingHost => fmt.write_str("request url has no host"),
            CanonicalError::InvalidMethod => fmt.write_str("request method is not a valid token"),
        }
    }
}

impl error::Error for CanonicalError {}
