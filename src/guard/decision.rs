//! The authorization decision.
use crate::primitives::principal::Principal;

/// Whether an operation may be performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The operation is one of the granted scope tokens.
    Allow,

    /// It is not.
    Deny,
}

/// Decide whether the principal may perform the operation.
///
/// The operation is compared against each scope token exactly. There is no hierarchy between
/// tokens, a principal holding `write` is not allowed to `read` unless granted both.
///
/// ```
/// # use oxide_guard::guard::{authorize, Decision};
/// # use oxide_guard::primitives::principal::Principal;
/// let principal = Principal::build("alice", "read write".parse().unwrap()).unwrap();
/// assert_eq!(authorize(&principal, "write"), Decision::Allow);
/// assert_eq!(authorize(&principal, "admin"), Decision::Deny);
/// ```
pub fn authorize(principal: &Principal, operation: &str) -> Decision {
    if principal.is_in_scope(operation) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_tokens_only() {
        let principal = Principal::build("alice", "read write".parse().unwrap()).unwrap();
        assert_eq!(authorize(&principal, "read"), Decision::Allow);
        assert_eq!(authorize(&principal, "Read"), Decision::Deny);
        assert_eq!(authorize(&principal, "rea"), Decision::Deny);
        assert_eq!(authorize(&principal, "read write"), Decision::Deny);
        assert_eq!(authorize(&principal, ""), Decision::Deny);
    }
}
