//! Server key material for signing and verifying bearer tokens.
//!
//! Keys are loaded once at startup, usually from a [`KeyConfig`], and are immutable afterwards.
//! Signing and verification halves are configured separately. A resource server that only checks
//! tokens issued elsewhere needs nothing but the public verification key, an issuer additionally
//! holds the private key.
//!
//! Private keys are expected as base64 encoded PKCS#8 documents, public keys in the raw form
//! `ring` verifies against: the 32 byte point for Ed25519, the uncompressed point for ECDSA, and
//! the DER encoded `RSAPublicKey` for RSA. The `hmac-sha256` algorithm uses one shared secret for
//! both and is only suitable where issuer and guard are the same party.
//!
//! [`KeyConfig`]: struct.KeyConfig.html
use std::error;
use std::fmt;

use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{self, EcdsaKeyPair, Ed25519KeyPair, KeyPair, RsaKeyPair};

/// Signature algorithms usable for bearer tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAlgorithm {
    /// EdDSA over curve25519.
    Ed25519,

    /// ECDSA over P-256 with SHA-256, fixed length signatures.
    EcdsaP256Sha256,

    /// RSA PKCS#1 1.5 padding with SHA-256, 2048 to 8192 bit moduli.
    RsaPkcs1Sha256,

    /// Symmetric HMAC with SHA-256.
    HmacSha256,
}

/// Serialized key configuration.
///
/// ```
/// # use oxide_guard::primitives::keys::{KeyAlgorithm, KeyConfig};
/// let config = KeyConfig::from_json(r#"{
///     "algorithm": "ed25519",
///     "verification_key": "11qYAYKxCrfVS/7TyWQHOg7hcvPapiMlrwIaaPcHURo="
/// }"#).unwrap();
/// assert_eq!(config.algorithm, KeyAlgorithm::Ed25519);
/// assert!(config.signing_key.is_none());
/// ```
#[derive(Clone, Deserialize)]
pub struct KeyConfig {
    /// The algorithm both key halves belong to.
    pub algorithm: KeyAlgorithm,

    /// Base64 of the PKCS#8 private key, or of the shared secret for `hmac-sha256`.
    #[serde(default)]
    pub signing_key: Option<String>,

    /// Base64 of the public key. Derived from the signing key when absent.
    #[serde(default)]
    pub verification_key: Option<String>,
}

/// Loaded and validated key material.
pub struct ServerKeys {
    algorithm: KeyAlgorithm,
    signing: Option<SigningHalf>,
    verifying: VerifyingHalf,
    rng: SystemRandom,
}

enum SigningHalf {
    Ed25519(Ed25519KeyPair),
    Ecdsa(EcdsaKeyPair),
    Rsa(RsaKeyPair),
    Hmac(hmac::Key),
}

enum VerifyingHalf {
    Public {
        algorithm: &'static dyn signature::VerificationAlgorithm,
        key: Vec<u8>,
    },
    Hmac(hmac::Key),
}

/// Key material could not be loaded or used.
#[derive(Debug)]
pub enum KeyError {
    /// The configuration was not valid json or missed fields.
    Config(serde_json::Error),

    /// A key was not valid base64.
    Encoding,

    /// `ring` refused the key, with its description of the reason.
    Rejected(String),

    /// Neither a signing nor a verification key was configured.
    Missing,

    /// Signing was requested but only a verification key is present.
    NoSigningKey,

    /// The algorithm does not support the requested operation, for example generation of RSA keys.
    Unsupported,

    /// The underlying cryptographic operation failed.
    Unspecified,
}

impl KeyConfig {
    /// Parse the configuration from json.
    pub fn from_json(json: &str) -> Result<Self, KeyError> {
        serde_json::from_str(json).map_err(KeyError::Config)
    }

    /// Generate a fresh private key and return its configuration.
    ///
    /// Useful for provisioning, the result can be serialized by the operator. RSA keys can not be
    /// generated.
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self, KeyError> {
        let rng = SystemRandom::new();
        let secret = match algorithm {
            KeyAlgorithm::Ed25519 => Ed25519KeyPair::generate_pkcs8(&rng)?.as_ref().to_vec(),
            KeyAlgorithm::EcdsaP256Sha256 => {
                EcdsaKeyPair::generate_pkcs8(&signature::ECDSA_P256_SHA256_FIXED_SIGNING, &rng)?
                    .as_ref()
                    .to_vec()
            }
            KeyAlgorithm::HmacSha256 => {
                let mut secret = vec![0; 32];
                rng.fill(&mut secret)?;
                secret
            }
            KeyAlgorithm::RsaPkcs1Sha256 => return Err(KeyError::Unsupported),
        };

        Ok(KeyConfig {
            algorithm,
            signing_key: Some(base64::encode(&secret)),
            verification_key: None,
        })
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("KeyConfig")
            .field("algorithm", &self.algorithm)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .field("verification_key", &self.verification_key)
            .finish()
    }
}

impl ServerKeys {
    /// Load and validate the configured keys.
    ///
    /// Fails if any configured key is not accepted by the algorithm, which should abort startup.
    pub fn from_config(config: &KeyConfig) -> Result<Self, KeyError> {
        let rng = SystemRandom::new();
        let signing_key = config.signing_key.as_deref().map(decode).transpose()?;
        let verification_key = config.verification_key.as_deref().map(decode).transpose()?;

        let (signing, verifying) = match config.algorithm {
            KeyAlgorithm::HmacSha256 => {
                let secret = signing_key.or(verification_key).ok_or(KeyError::Missing)?;
                let key = hmac::Key::new(hmac::HMAC_SHA256, &secret);
                (Some(SigningHalf::Hmac(key.clone())), VerifyingHalf::Hmac(key))
            }
            algorithm => {
                let signing = signing_key
                    .map(|der| SigningHalf::from_pkcs8(algorithm, &der, &rng))
                    .transpose()?;
                let key = match (verification_key, &signing) {
                    (Some(key), _) => key,
                    (None, Some(signing)) => signing.public_key(),
                    (None, None) => return Err(KeyError::Missing),
                };
                let verifying = VerifyingHalf::Public {
                    algorithm: verification_algorithm(algorithm).ok_or(KeyError::Unsupported)?,
                    key,
                };
                (signing, verifying)
            }
        };

        Ok(ServerKeys {
            algorithm: config.algorithm,
            signing,
            verifying,
            rng,
        })
    }

    /// Keys with a freshly generated Ed25519 key pair.
    ///
    /// The keys are lost when dropped, so any token signed with them can not be verified by
    /// another instance. Intended for tests and single process deployments.
    pub fn ephemeral() -> Result<Self, KeyError> {
        ServerKeys::from_config(&KeyConfig::generate(KeyAlgorithm::Ed25519)?)
    }

    /// The configured algorithm.
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Whether a private key is available.
    pub fn can_sign(&self) -> bool {
        self.signing.is_some()
    }

    /// The public verification key, encoded in base64.
    ///
    /// Returns `None` for symmetric keys which must not be published.
    pub fn public_key(&self) -> Option<String> {
        match &self.verifying {
            VerifyingHalf::Public { key, .. } => Some(base64::encode(key)),
            VerifyingHalf::Hmac(_) => None,
        }
    }

    /// Sign a message with the private key.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        match self.signing.as_ref().ok_or(KeyError::NoSigningKey)? {
            SigningHalf::Ed25519(pair) => Ok(pair.sign(message).as_ref().to_vec()),
            SigningHalf::Ecdsa(pair) => Ok(pair.sign(&self.rng, message)?.as_ref().to_vec()),
            SigningHalf::Rsa(pair) => {
                let mut signature = vec![0; pair.public().modulus_len()];
                pair.sign(&signature::RSA_PKCS1_SHA256, &self.rng, message, &mut signature)?;
                Ok(signature)
            }
            SigningHalf::Hmac(key) => Ok(hmac::sign(key, message).as_ref().to_vec()),
        }
    }

    /// Check a signature with the verification key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match &self.verifying {
            VerifyingHalf::Public { algorithm, key } => {
                signature::UnparsedPublicKey::new(*algorithm, key)
                    .verify(message, signature)
                    .is_ok()
            }
            VerifyingHalf::Hmac(key) => hmac::verify(key, message, signature).is_ok(),
        }
    }
}

impl fmt::Debug for ServerKeys {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("ServerKeys")
            .field("algorithm", &self.algorithm)
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

impl SigningHalf {
    fn from_pkcs8(
        algorithm: KeyAlgorithm, der: &[u8], rng: &SystemRandom,
    ) -> Result<Self, KeyError> {
        let half = match algorithm {
            KeyAlgorithm::Ed25519 => SigningHalf::Ed25519(Ed25519KeyPair::from_pkcs8_maybe_unchecked(der)?),
            KeyAlgorithm::EcdsaP256Sha256 => SigningHalf::Ecdsa(EcdsaKeyPair::from_pkcs8(
                &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
                der,
                rng,
            )?),
            KeyAlgorithm::RsaPkcs1Sha256 => SigningHalf::Rsa(RsaKeyPair::from_pkcs8(der)?),
            KeyAlgorithm::HmacSha256 => SigningHalf::Hmac(hmac::Key::new(hmac::HMAC_SHA256, der)),
        };
        Ok(half)
    }

    fn public_key(&self) -> Vec<u8> {
        match self {
            SigningHalf::Ed25519(pair) => pair.public_key().as_ref().to_vec(),
            SigningHalf::Ecdsa(pair) => pair.public_key().as_ref().to_vec(),
            SigningHalf::Rsa(pair) => pair.public_key().as_ref().to_vec(),
            SigningHalf::Hmac(_) => Vec::new(),
        }
    }
}

fn verification_algorithm(
    algorithm: KeyAlgorithm,
) -> Option<&'static dyn signature::VerificationAlgorithm> {
    match algorithm {
        KeyAlgorithm::Ed25519 => Some(&signature::ED25519),
        KeyAlgorithm::EcdsaP256Sha256 => Some(&signature::ECDSA_P256_SHA256_FIXED),
        KeyAlgorithm::RsaPkcs1Sha256 => Some(&signature::RSA_PKCS1_2048_8192_SHA256),
        KeyAlgorithm::HmacSha256 => None,
    }
}

fn decode(encoded: &str) -> Result<Vec<u8>, KeyError> {
    base64::decode(encoded.trim()).map_err(|_| KeyError::Encoding)
}

impl From<ring::error::KeyRejected> for KeyError {
    fn from(err: ring::error::KeyRejected) -> Self {
        KeyError::Rejected(err.to_string())
    }
}

impl From<ring::error::Unspecified> for KeyError {
    fn from(_: ring::error::Unspecified) -> Self {
        KeyError::Unspecified
    }
}

impl fmt::Display for KeyError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyError::Config(err) => write!(fmt, "invalid key configuration: {}", err),
            KeyError::Encoding => fmt.write_str("key is not valid base64"),
            KeyError::Rejected(reason) => write!(fmt, "key rejected: {}", reason),
            KeyError::Missing => fmt.write_str("no key configured"),
            KeyError::NoSigningKey => fmt.write_str("no signing key configured"),
            KeyError::Unsupported => fmt.write_str("operation not supported for this algorithm"),
            KeyError::Unspecified => fmt.write_str("cryptographic operation failed"),
        }
    }
}

impl error::Error for KeyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519_roundtrip() {
        let keys = ServerKeys::ephemeral().unwrap();
        assert_eq!(keys.algorithm(), KeyAlgorithm::Ed25519);
        assert!(keys.can_sign());

        let signature = keys.sign(b"payload").unwrap();
        assert!(keys.verify(b"payload", &signature));
        assert!(!keys.verify(b"payloaD", &signature));
    }

    #[test]
    fn ecdsa_roundtrip() {
        let config = KeyConfig::generate(KeyAlgorithm::EcdsaP256Sha256).unwrap();
        let keys = ServerKeys::from_config(&config).unwrap();
        let signature = keys.sign(b"payload").unwrap();
        assert!(keys.verify(b"payload", &signature));

        let mut tampered = signature.clone();
        tampered[0] ^= 1;
        assert!(!keys.verify(b"payload", &tampered));
    }

    #[test]
    fn hmac_roundtrip() {
        let config = KeyConfig::generate(KeyAlgorithm::HmacSha256).unwrap();
        let keys = ServerKeys::from_config(&config).unwrap();
        assert!(keys.public_key().is_none());
        let signature = keys.sign(b"payload").unwrap();
        assert!(keys.verify(b"payload", &signature));
        assert!(!keys.verify(b"other", &signature));
    }

    #[test]
    fn verification_only() {
        let issuer = ServerKeys::ephemeral().unwrap();
        let config = KeyConfig {
            algorithm: KeyAlgorithm::Ed25519,
            signing_key: None,
            verification_key: issuer.public_key(),
        };
        let guard = ServerKeys::from_config(&config).unwrap();
        assert!(!guard.can_sign());
        assert!(matches!(guard.sign(b"payload"), Err(KeyError::NoSigningKey)));

        let signature = issuer.sign(b"payload").unwrap();
        assert!(guard.verify(b"payload", &signature));
    }

    #[test]
    fn separate_keys_do_not_verify() {
        let first = ServerKeys::ephemeral().unwrap();
        let second = ServerKeys::ephemeral().unwrap();
        let signature = first.sign(b"payload").unwrap();
        assert!(!second.verify(b"payload", &signature));
    }

    #[test]
    fn invalid_configurations() {
        let missing = KeyConfig::from_json(r#"{ "algorithm": "ed25519" }"#).unwrap();
        assert!(matches!(ServerKeys::from_config(&missing), Err(KeyError::Missing)));

        let garbage = KeyConfig::from_json(
            r#"{ "algorithm": "ecdsa-p256-sha256", "signing_key": "bm90IGEga2V5" }"#,
        )
        .unwrap();
        assert!(matches!(ServerKeys::from_config(&garbage), Err(KeyError::Rejected(_))));

        let encoding = KeyConfig::from_json(r#"{ "algorithm": "ed25519", "signing_key": "!!" }"#)
            .unwrap();
        assert!(matches!(ServerKeys::from_config(&encoding), Err(KeyError::Encoding)));

        assert!(matches!(
            KeyConfig::from_json(r#"{ "algorithm": "dsa" }"#),
            Err(KeyError::Config(_))
        ));
        assert!(matches!(
            KeyConfig::generate(KeyAlgorithm::RsaPkcs1Sha256),
            Err(KeyError::Unsupported)
        ));
    }

    #[test]
    fn config_debug_is_redacted() {
        let config = KeyConfig::generate(KeyAlgorithm::Ed25519).unwrap();
        let secret = config.signing_key.clone().unwrap();
        assert!(!format!("{:?}", config).contains(&secret));
    }
}
