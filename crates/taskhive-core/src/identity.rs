//! Caller identity model.
//!
//! The surrounding app historically treated "guest" as an implicit concept
//! (a session id with no account behind it). Here it is first-class: a
//! [`GuestId`] can own records but never holds a credential; a [`UserId`] is
//! an authenticated principal. Record ownership columns store the opaque
//! owner string, obtained via [`Identity::owner_key`].

use serde::{Deserialize, Serialize};

/// Pre-authentication session identifier. Owns records until migration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestId(String);

impl GuestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Authenticated principal identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Tagged owner identity. Guests and authenticated users share the owner
/// column keyspace, so the tag exists to keep checks unambiguous in code,
/// not in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum Identity {
    Guest(GuestId),
    Authenticated(UserId),
}

impl Identity {
    /// The opaque string written to record owner columns.
    pub fn owner_key(&self) -> &str {
        match self {
            Identity::Guest(g) => g.as_str(),
            Identity::Authenticated(u) => u.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_trimmed() {
        assert_eq!(GuestId::new("  g-1  ").as_str(), "g-1");
        assert_eq!(UserId::new("\tu-1\n").as_str(), "u-1");
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(GuestId::new("   ").is_empty());
        assert!(UserId::new("").is_empty());
    }

    #[test]
    fn owner_key_matches_either_variant() {
        let g = Identity::Guest(GuestId::new("g-1"));
        let u = Identity::Authenticated(UserId::new("u-1"));
        assert_eq!(g.owner_key(), "g-1");
        assert_eq!(u.owner_key(), "u-1");
    }
}
