//! Parsing of the `Authorization: OAuth ..` header.
use std::error;
use std::fmt;

use super::{percent_decode, DecodeError};

/// The authorization scheme of signed requests, compared case-insensitively.
pub const SCHEME: &str = "OAuth";

/// Protocol parameters transmitted in the authorization header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OAuthHeader {
    /// The protection realm, if stated. It is not part of the signature.
    pub realm: Option<String>,

    /// All `oauth_` parameters in decoded form and in order of appearance.
    pub params: Vec<(String, String)>,
}

/// The header used the `OAuth` scheme but was not well-formed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderError {
    /// A parameter was not of the form `name="value"`.
    Malformed,

    /// A parameter value was not enclosed in double quotes.
    Unquoted,

    /// The realm was given more than once.
    DuplicateRealm,

    /// Only the realm and `oauth_` parameters may appear in the header.
    UnexpectedParameter(String),

    /// A name or value was not correctly percent-encoded.
    Encoding(DecodeError),
}

/// Parse an authorization header value.
///
/// Returns `Ok(None)` if the header uses a scheme other than `OAuth`, which leaves it to other
/// protocols. Names and values are percent-decoded.
///
/// ```
/// # use oxide_guard::signature::parse_authorization;
/// let header = parse_authorization(r#"OAuth realm="Photos", oauth_token="a%20b""#)
///     .unwrap()
///     .unwrap();
/// assert_eq!(header.realm.as_deref(), Some("Photos"));
/// assert_eq!(header.params, vec![("oauth_token".to_string(), "a b".to_string())]);
///
/// assert_eq!(parse_authorization("Bearer abc"), Ok(None));
/// ```
pub fn parse_authorization(header: &str) -> Result<Option<OAuthHeader>, HeaderError> {
    let header = header.trim();
    let (scheme, rest) = match header.find(char::is_whitespace) {
        Some(idx) => header.split_at(idx),
        None => (header, ""),
    };

    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return Ok(None);
    }

    let mut parsed = OAuthHeader::default();
    let mut rest = rest.trim_start();
    while !rest.is_empty() {
        let eq = rest.find('=').ok_or(HeaderError::Malformed)?;
        let name = rest[..eq].trim();
        if name.is_empty() {
            return Err(HeaderError::Malformed);
        }

        let quoted = rest[eq + 1..].trim_start();
        let quoted = quoted.strip_prefix('"').ok_or(HeaderError::Unquoted)?;
        let close = quoted.find('"').ok_or(HeaderError::Unquoted)?;
        let value = &quoted[..close];

        rest = quoted[close + 1..].trim_start();
        match rest.strip_prefix(',') {
            Some(next) => rest = next.trim_start(),
            None if rest.is_empty() => (),
            None => return Err(HeaderError::Malformed),
        }

        let name = percent_decode(name)?;
        let value = percent_decode(value)?;
        if name == "realm" {
            if parsed.realm.is_some() {
                return Err(HeaderError::DuplicateRealm);
            }
            parsed.realm = Some(value);
        } else if name.starts_with("oauth_") {
            parsed.params.push((name, value));
        } else {
            return Err(HeaderError::UnexpectedParameter(name));
        }
    }

    Ok(Some(parsed))
}

impl From<DecodeError> for HeaderError {
    fn from(err: DecodeError) -> Self {
        HeaderError::Encoding(err)
    }
}

impl fmt::Display for HeaderError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HeaderError::Malformed => fmt.write_str("authorization header parameter is malformed"),
            HeaderError::Unquoted => fmt.write_str("authorization header value is not quoted"),
            HeaderError::DuplicateRealm => fmt.write_str("authorization header repeats the realm"),
            HeaderError::UnexpectedParameter(name) => {
                write!(fmt, "authorization header contains unexpected parameter `{}`", name)
            }
            HeaderError::Encoding(err) => write!(fmt, "authorization header: {}", err),
        }
    }
}

impl error::Error for HeaderError {}

#[cfg(test)]
mod tests {
    use super::*;

    const PHOTOS: &str = "OAuth realm=\"http://photos.example.net/\",\
        oauth_consumer_key=\"dpf43f3p2l4k3l03\",\
        oauth_token=\"nnch734d00sl2jdk\",\
        oauth_signature_method=\"HMAC-SHA1\",\
        oauth_signature=\"tR3%2BTy81lMeYAr%2FFid0kMTYa%2FWM%3D\",\
        oauth_timestamp=\"1191242096\",\
        oauth_nonce=\"kllo9940pd9333jh\",\
        oauth_version=\"1.0\"";

    #[test]
    fn photos_header() {
        let header = parse_authorization(PHOTOS).unwrap().unwrap();
        assert_eq!(header.realm.as_deref(), Some("http://photos.example.net/"));
        assert_eq!(header.params.len(), 7);
        assert_eq!(
            header.params[3],
            ("oauth_signature".to_string(), "tR3+Ty81lMeYAr/Fid0kMTYa/WM=".to_string())
        );
    }

    #[test]
    fn whitespace_and_case() {
        let header = parse_authorization("  oauth   oauth_nonce = \"n\" ,  oauth_token=\"t\" , ")
            .unwrap()
            .unwrap();
        assert_eq!(header.realm, None);
        assert_eq!(
            header.params,
            vec![
                ("oauth_nonce".to_string(), "n".to_string()),
                ("oauth_token".to_string(), "t".to_string()),
            ]
        );
    }

    #[test]
    fn empty_parameter_list() {
        assert_eq!(parse_authorization("OAuth"), Ok(Some(OAuthHeader::default())));
    }

    #[test]
    fn other_schemes_are_ignored() {
        assert_eq!(parse_authorization("Basic dXNlcjpwYXNz"), Ok(None));
        assert_eq!(parse_authorization("Bearer token"), Ok(None));
        assert_eq!(parse_authorization("OAuthX a=\"b\""), Ok(None));
    }

    #[test]
    fn malformed_headers() {
        assert_eq!(parse_authorization("OAuth oauth_token"), Err(HeaderError::Malformed));
        assert_eq!(parse_authorization("OAuth oauth_token=t"), Err(HeaderError::Unquoted));
        assert_eq!(parse_authorization("OAuth oauth_token=\"t"), Err(HeaderError::Unquoted));
        assert_eq!(
            parse_authorization("OAuth oauth_token=\"t\" oauth_nonce=\"n\""),
            Err(HeaderError::Malformed)
        );
        assert_eq!(parse_authorization("OAuth =\"t\""), Err(HeaderError::Malformed));
        assert_eq!(
            parse_authorization("OAuth realm=\"a\", realm=\"b\""),
            Err(HeaderError::DuplicateRealm)
        );
        assert_eq!(
            parse_authorization("OAuth user=\"root\""),
            Err(HeaderError::UnexpectedParameter("user".into()))
        );
        assert_eq!(
            parse_authorization("OAuth oauth_token=\"%FF\""),
            Err(HeaderError::Encoding(DecodeError))
        );
    }
}
