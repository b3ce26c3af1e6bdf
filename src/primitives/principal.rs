//! The authenticated identity attached to an allowed request.
use std::error;
use std::fmt;

use super::scope::Scope;

/// The subject and scope extracted from a credential whose authenticity has been established.
///
/// This is the common result of both protocols, regardless of whether a signature or a bearer
/// token was checked. It only exists between verification and the construction of the
/// `Principal`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedCredential {
    /// The resource owner, a user name.
    pub subject: String,

    /// The operations granted to the credential.
    pub scope: Scope,
}

/// An authenticated resource owner and the operations they were granted.
///
/// A principal can only be constructed with a non-empty name and can not be modified afterwards.
/// It is never cached across requests, each evaluation builds its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    name: String,
    scope: Scope,
}

/// The principal could not be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrincipalError {
    /// The credential did not name a subject.
    EmptyName,
}

impl Principal {
    /// Construct a principal from a name and its scope.
    ///
    /// ```
    /// # use oxide_guard::primitives::principal::Principal;
    /// let principal = Principal::build("alice", "read write".parse().unwrap()).unwrap();
    /// assert_eq!(principal.name(), "alice");
    /// assert!(principal.is_in_scope("write"));
    /// assert!(!principal.is_in_scope("admin"));
    ///
    /// assert!(Principal::build("", "read".parse().unwrap()).is_err());
    /// ```
    pub fn build<N: Into<String>>(name: N, scope: Scope) -> Result<Self, PrincipalError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PrincipalError::EmptyName);
        }

        Ok(Principal { name, scope })
    }

    /// Construct the principal of a verified credential.
    pub fn from_credential(credential: VerifiedCredential) -> Result<Self, PrincipalError> {
        Principal::build(credential.subject, credential.scope)
    }

    /// The name of the resource owner.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All granted operations.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Whether the operation is one of the granted scope tokens.
    pub fn is_in_scope(&self, operation: &str) -> bool {
        self.scope.contains(operation)
    }
}

impl fmt::Display for PrincipalError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrincipalError::EmptyName => fmt.write_str("credential does not name a subject"),
        }
    }
}

impl error::Error for PrincipalError {}
