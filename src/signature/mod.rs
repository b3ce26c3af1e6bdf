//! OAuth 1.0 request signatures.
//!
//! A signed request carries its protocol parameters either in an `Authorization: OAuth ..`
//! header or among the query and form parameters. The server rebuilds the signature base string
//! from the request it actually received, see [`base_string`], and signs it with the secrets it
//! has on record for the consumer and the token. Only if both signatures agree is the request
//! considered authentic.
//!
//! All encoding in this module is the strict RFC 3986 percent-encoding: every octet outside the
//! unreserved set `ALPHA / DIGIT / "-" / "." / "_" / "~"` is escaped with uppercase hex digits.
//! Note that this differs from `application/x-www-form-urlencoded`, a space is always `%20`.
//!
//! [`base_string`]: base_string/fn.base_string.html
use std::borrow::Cow;
use std::error;
use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

pub mod base_string;
pub mod header;
pub mod method;

pub use self::base_string::{base_string, normalize_url, normalized_parameters, CanonicalError};
pub use self::header::{parse_authorization, HeaderError, OAuthHeader};
pub use self::method::{HmacMethod, Signature, SignatureMethod, SignatureMethods, SigningKey};

/// Characters escaped by `percent_encode`, everything except the unreserved set.
const ESCAPED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Encode a string according to RFC 3986, with uppercase hexadecimal digits.
///
/// The input is encoded as utf-8 first, so multi-byte characters become several escapes.
///
/// ```
/// # use oxide_guard::signature::percent_encode;
/// assert_eq!(percent_encode("a b+c"), "a%20b%2Bc");
/// assert_eq!(percent_encode("snow\u{2603}"), "snow%E2%98%83");
/// assert_eq!(percent_encode("-._~"), "-._~");
/// ```
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, ESCAPED).to_string()
}

/// Encode raw octets the way `percent_encode` encodes strings.
pub(crate) fn percent_encode_bytes(input: &[u8]) -> String {
    percent_encoding::percent_encode(input, ESCAPED).to_string()
}

/// Split an `application/x-www-form-urlencoded` string, such as a url query, into decoded pairs.
///
/// A `+` decodes to a space. The results are octets since nothing requires the client to send
/// utf-8, and a signature covers them exactly as sent.
pub(crate) fn form_pairs(input: &str) -> Vec<(Vec<u8>, Vec<u8>)> {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let name = parts.next().unwrap_or("");
            let value = parts.next().unwrap_or("");
            (form_decode(name), form_decode(value))
        })
        .collect()
}

fn form_decode(input: &str) -> Vec<u8> {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced).collect()
}

/// Reverse `percent_encode`.
///
/// Lower case hex digits are accepted as well. A plus sign is left untouched since header values
/// are not form encoded.
pub fn percent_decode(input: &str) -> Result<String, DecodeError> {
    percent_decode_str(input)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| DecodeError)
}

/// A percent-encoded value did not decode to valid utf-8.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeError;

impl fmt::Display for DecodeError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str("percent-encoded value is not valid utf-8")
    }
}

impl error::Error for DecodeError {}
