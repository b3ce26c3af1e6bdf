//! Defines the Scope type, the set of operations a credential grants.
use std::{cmp, fmt, str};

use std::collections::HashSet;
use serde::{Deserialize, Serialize};

/// Scope of a verified credential, a set of scope-tokens separated by spaces.
///
/// Each token names one operation the holder may perform. Tokens are matched exactly, so
/// comparison is case sensitive and a token never matches a prefix or substring of another.
/// Scopes are partially ordered by inclusion where scope `A` is less or equal than scope `B` if
/// all scope tokens of `A` are also found in `B`.
///
/// Example
/// ------
///
/// ```
/// # use oxide_guard::primitives::scope::Scope;
/// let granted = "read write".parse::<Scope>().unwrap();
///
/// assert!(granted.contains("write"));
/// assert!(!granted.contains("Write"));
/// assert!(!granted.contains("rea"));
///
/// let required = "read".parse::<Scope>().unwrap();
/// assert!(required <= granted);
/// assert!(required.allow_access(&granted));
/// assert!(granted.privileged_to(&required));
/// ```
///
/// Scope-tokens are restricted to the following subset of ascii:
///   - The character '!'
///   - The character range '\x23' to '\x5b' which includes numbers and upper case letters
///   - The character range '\x5d' to '\x7e' which includes lower case letters
/// Individual scope-tokens are separated by spaces.
///
/// In particular, the characters '\x22' (`"`) and '\x5c' (`\`)  are not allowed.
///
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Scope {
    tokens: HashSet<String>,
}

impl Serialize for Scope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let string: String = Deserialize::deserialize(deserializer)?;
        core::str::FromStr::from_str(&string).map_err(serde::de::Error::custom)
    }
}

impl Scope {
    fn invalid_scope_char(ch: char) -> bool {
        match ch {
            '\x21' => false,
            ch if ('\x23'..='\x5b').contains(&ch) => false,
            ch if ('\x5d'..='\x7e').contains(&ch) => false,
            ' ' => false, // Space separator is a valid char
            _ => true,
        }
    }

    /// Whether the scope grants exactly this token.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Determines if this scope has enough privileges to access some resource requiring the scope
    /// on the right side. This operation is equivalent to comparison via `>=`.
    pub fn privileged_to(&self, rhs: &Scope) -> bool {
        rhs <= self
    }

    /// Determines if a resource protected by this scope should allow access to a credential with
    /// the scope on the right side. This operation is equivalent to comparison via `<=`.
    pub fn allow_access(&self, rhs: &Scope) -> bool {
        self <= rhs
    }

    /// Create an iterator over the individual scope tokens.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(AsRef::as_ref)
    }

    /// The number of distinct tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// A scope without tokens grants nothing.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Error returned from parsing a scope claim or a configured scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseScopeErr {
    /// A character was encountered which is not allowed to appear in scope strings.
    ///
    /// See the documentation of [`Scope`] for the allowed characters.
    ///
    /// [`Scope`]: struct.Scope.html
    InvalidCharacter(char),
}

impl str::FromStr for Scope {
    type Err = ParseScopeErr;

    fn from_str(string: &str) -> Result<Scope, ParseScopeErr> {
        if let Some(ch) = string.chars().find(|&ch| Scope::invalid_scope_char(ch)) {
            return Err(ParseScopeErr::InvalidCharacter(ch));
        }
        let tokens = string.split(' ').filter(|s| !s.is_empty());
        Ok(Scope {
            tokens: tokens.map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for ParseScopeErr {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            ParseScopeErr::InvalidCharacter(chr) => {
                write!(fmt, "Encountered invalid character in scope: {}", chr)
            }
        }
    }
}

impl std::error::Error for ParseScopeErr {}

impl fmt::Debug for Scope {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_tuple("Scope").field(&self.tokens).finish()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut tokens = self.tokens.iter().map(String::as_str).collect::<Vec<_>>();
        tokens.sort_unstable();
        fmt.write_str(&tokens.join(" "))
    }
}

impl PartialOrd for Scope {
    fn partial_cmp(&self, rhs: &Self) -> Option<cmp::Ordering> {
        let intersect_count = self.tokens.intersection(&rhs.tokens).count();
        if intersect_count == self.tokens.len() && intersect_count == rhs.tokens.len() {
            Some(cmp::Ordering::Equal)
        } else if intersect_count == self.tokens.len() {
            Some(cmp::Ordering::Less)
        } else if intersect_count == rhs.tokens.len() {
            Some(cmp::Ordering::Greater)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsing() {
        let scope = Scope {
            tokens: ["read", "write", "admin"].iter().map(|s| s.to_string()).collect(),
        };
        let formatted = scope.to_string();
        assert_eq!(formatted, "admin read write");
        let parsed = formatted.parse::<Scope>().unwrap();
        assert_eq!(scope, parsed);

        let from_string = "write  admin read".parse::<Scope>().unwrap();
        assert_eq!(scope, from_string);
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            "read \"write\"".parse::<Scope>(),
            Err(ParseScopeErr::InvalidCharacter('"'))
        );
        assert_eq!(
            "a\\b".parse::<Scope>(),
            Err(ParseScopeErr::InvalidCharacter('\\'))
        );
        assert_eq!(
            "read\twrite".parse::<Scope>(),
            Err(ParseScopeErr::InvalidCharacter('\t'))
        );
    }

    #[test]
    fn test_empty() {
        let scope = "".parse::<Scope>().unwrap();
        assert!(scope.is_empty());
        assert!(!scope.contains(""));
        assert_eq!(scope, Scope::default());
        assert_eq!("   ".parse::<Scope>().unwrap().len(), 0);
    }

    #[test]
    fn test_membership() {
        let scope = "read write".parse::<Scope>().unwrap();
        assert!(scope.contains("read"));
        assert!(scope.contains("write"));
        assert!(!scope.contains("admin"));
        assert!(!scope.contains("READ"));
        assert!(!scope.contains("read write"));
        assert!(!scope.contains("writer"));
    }

    #[test]
    fn test_compare() {
        let scope_base = "cap1 cap2".parse::<Scope>().unwrap();
        let scope_less = "cap1".parse::<Scope>().unwrap();
        let scope_uncmp = "cap1 cap3".parse::<Scope>().unwrap();

        assert_eq!(scope_base.partial_cmp(&scope_less), Some(cmp::Ordering::Greater));
        assert_eq!(scope_less.partial_cmp(&scope_base), Some(cmp::Ordering::Less));

        assert_eq!(scope_base.partial_cmp(&scope_uncmp), None);
        assert_eq!(scope_uncmp.partial_cmp(&scope_base), None);

        assert_eq!(scope_base.partial_cmp(&scope_base), Some(cmp::Ordering::Equal));

        assert!(scope_base.privileged_to(&scope_less));
        assert!(scope_less.allow_access(&scope_base));
        assert!(!scope_less.privileged_to(&scope_base));
        assert!(!scope_uncmp.allow_access(&scope_base));
    }

    #[test]
    fn test_iterating() {
        let scope = "cap1 cap2 cap3".parse::<Scope>().unwrap();
        let all = scope.iter().collect::<Vec<_>>();
        assert_eq!(all.len(), 3);
        assert!(all.contains(&"cap1"));
        assert!(all.contains(&"cap2"));
        assert!(all.contains(&"cap3"));
    }

    #[test]
    fn deserialize_invalid_scope() {
        let scope = "\x22";
        let serialized = rmp_serde::to_vec(&scope).unwrap();
        let deserialized = rmp_serde::from_slice::<Scope>(&serialized);
        assert!(deserialized.is_err());
    }

    #[test]
    fn deserialize_from_json() {
        let scope: Scope = serde_json::from_str("\"read write\"").unwrap();
        assert!(scope.contains("write"));
    }
}
