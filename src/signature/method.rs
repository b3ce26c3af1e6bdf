//! Signature methods and the secrets they are keyed with.
use std::fmt;

use ring::hmac;
use subtle::ConstantTimeEq;

use super::percent_encode;

/// The pair of secrets a request signature is keyed with.
///
/// The consumer secret is shared between the server and the client application while the token
/// secret belongs to the access token the request was made with. Either may be empty, the key
/// string is still formed with the separating `&`.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    consumer_secret: String,
    token_secret: String,
}

/// A signature in its transmitted form, the percent-encoded base64 of the raw digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(String);

/// An algorithm turning a base string and a signing key into a signature.
///
/// The method is named by the `oauth_signature_method` parameter of the request. Implementations
/// must be deterministic for identical inputs.
pub trait SignatureMethod {
    /// The name used in the `oauth_signature_method` parameter.
    fn name(&self) -> &str;

    /// Sign a base string.
    fn sign(&self, base_string: &str, key: &SigningKey) -> Signature;

    /// Check a presented signature against the one computed from base string and key.
    ///
    /// The comparison of encoded signatures must not short-circuit on the first differing byte,
    /// the default implementation uses a constant time comparison.
    fn verify(&self, base_string: &str, key: &SigningKey, candidate: &Signature) -> bool {
        self.sign(base_string, key).matches(candidate)
    }
}

/// Keyed hash based signatures, `HMAC-SHA1` in particular.
#[derive(Clone, Copy, Debug)]
pub struct HmacMethod {
    name: &'static str,
    algorithm: hmac::Algorithm,
}

/// The signature methods a server accepts, looked up by name.
pub struct SignatureMethods {
    methods: Vec<Box<dyn SignatureMethod + Send + Sync>>,
}

impl SigningKey {
    /// Construct the key from the two secrets, both in their decoded form.
    pub fn new<C, T>(consumer_secret: C, token_secret: T) -> Self
    where
        C: Into<String>,
        T: Into<String>,
    {
        SigningKey {
            consumer_secret: consumer_secret.into(),
            token_secret: token_secret.into(),
        }
    }

    /// A key for requests that are not associated with a token.
    pub fn consumer_only<C: Into<String>>(consumer_secret: C) -> Self {
        SigningKey::new(consumer_secret, String::new())
    }

    /// The key string used by the keyed hash, `enc(consumer_secret)&enc(token_secret)`.
    pub fn hmac_key(&self) -> String {
        format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(&self.token_secret)
        )
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("SigningKey")
            .field("consumer_secret", &"<redacted>")
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl Signature {
    /// Wrap a signature that is already percent-encoded.
    pub fn from_encoded<S: Into<String>>(encoded: S) -> Self {
        Signature(encoded.into())
    }

    /// Wrap a signature in plain base64 by percent-encoding it.
    pub fn from_base64(base64: &str) -> Self {
        Signature(percent_encode(base64))
    }

    /// The percent-encoded form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare two signatures in time independent of their content.
    pub fn matches(&self, other: &Signature) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

impl HmacMethod {
    /// `HMAC-SHA1`, the method every OAuth 1.0 deployment is expected to support.
    pub fn sha1() -> Self {
        HmacMethod::with_algorithm("HMAC-SHA1", hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY)
    }

    /// `HMAC-SHA256`, a common extension of the standard methods.
    pub fn sha256() -> Self {
        HmacMethod::with_algorithm("HMAC-SHA256", hmac::HMAC_SHA256)
    }

    /// Register a keyed hash under a custom method name.
    pub fn with_algorithm(name: &'static str, algorithm: hmac::Algorithm) -> Self {
        HmacMethod { name, algorithm }
    }
}

impl SignatureMethod for HmacMethod {
    fn name(&self) -> &str {
        self.name
    }

    fn sign(&self, base_string: &str, key: &SigningKey) -> Signature {
        let key = hmac::Key::new(self.algorithm, key.hmac_key().as_bytes());
        let tag = hmac::sign(&key, base_string.as_bytes());
        Signature::from_base64(&base64::encode(tag.as_ref()))
    }
}

impl SignatureMethods {
    /// A registry without any methods, every signed request would be rejected.
    pub fn new() -> Self {
        SignatureMethods { methods: Vec::new() }
    }

    /// Accept an additional method.
    ///
    /// A method registered earlier takes precedence when two share the same name.
    pub fn register<M>(&mut self, method: M)
    where
        M: SignatureMethod + Send + Sync + 'static,
    {
        self.methods.push(Box::new(method))
    }

    /// Find the method with exactly the given name.
    pub fn find(&self, name: &str) -> Option<&dyn SignatureMethod> {
        self.methods
            .iter()
            .find(|method| method.name() == name)
            .map(|method| &**method as &dyn SignatureMethod)
    }

    /// The names of all registered methods.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|method| method.name())
    }
}

impl Default for SignatureMethods {
    /// Only `HMAC-SHA1`.
    fn default() -> Self {
        let mut methods = SignatureMethods::new();
        methods.register(HmacMethod::sha1());
        methods
    }
}

impl fmt::Debug for SignatureMethods {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHOTOS_BASE: &str = "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg\
        %26oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3Dkllo9940pd9333jh\
        %26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1191242096\
        %26oauth_token%3Dnnch734d00sl2jdk%26oauth_version%3D1.0%26size%3Doriginal";

    fn photos_key() -> SigningKey {
        SigningKey::new("kd94hf93k423kf44", "pfkkdhi9sl3r4s00")
    }

    #[test]
    fn hmac_sha1_known_signature() {
        let signature = HmacMethod::sha1().sign(PHOTOS_BASE, &photos_key());
        assert_eq!(signature.as_str(), "tR3%2BTy81lMeYAr%2FFid0kMTYa%2FWM%3D");
    }

    #[test]
    fn signing_is_deterministic() {
        let method = HmacMethod::sha1();
        let first = method.sign("POST&https%3A%2F%2Fexample.com%2F&", &photos_key());
        let second = method.sign("POST&https%3A%2F%2Fexample.com%2F&", &photos_key());
        assert_eq!(first, second);
    }

    #[test]
    fn verify_detects_changes() {
        let method = HmacMethod::sha1();
        let key = photos_key();
        let signature = method.sign(PHOTOS_BASE, &key);
        assert!(method.verify(PHOTOS_BASE, &key, &signature));

        let altered = PHOTOS_BASE.replace("vacation", "vacatioN");
        assert!(!method.verify(&altered, &key, &signature));

        let other_key = SigningKey::new("kd94hf93k423kf44", "pfkkdhi9sl3r4s01");
        assert!(!method.verify(PHOTOS_BASE, &other_key, &signature));

        let truncated = Signature::from_encoded(&signature.as_str()[1..]);
        assert!(!method.verify(PHOTOS_BASE, &key, &truncated));
    }

    #[test]
    fn key_string_is_encoded() {
        assert_eq!(SigningKey::new("a b", "c&d").hmac_key(), "a%20b&c%26d");
        assert_eq!(SigningKey::consumer_only("secret").hmac_key(), "secret&");
        assert_eq!(SigningKey::new("", "").hmac_key(), "&");
    }

    #[test]
    fn key_debug_is_redacted() {
        let debug = format!("{:?}", photos_key());
        assert!(!debug.contains("kd94hf93k423kf44"));
        assert!(!debug.contains("pfkkdhi9sl3r4s00"));
    }

    #[test]
    fn registry_lookup() {
        let mut methods = SignatureMethods::default();
        assert!(methods.find("HMAC-SHA1").is_some());
        assert!(methods.find("hmac-sha1").is_none());
        assert!(methods.find("HMAC-SHA256").is_none());

        methods.register(HmacMethod::sha256());
        let sha256 = methods.find("HMAC-SHA256").unwrap();
        assert_eq!(sha256.name(), "HMAC-SHA256");
        assert_ne!(
            sha256.sign(PHOTOS_BASE, &photos_key()),
            HmacMethod::sha1().sign(PHOTOS_BASE, &photos_key())
        );
    }
}
