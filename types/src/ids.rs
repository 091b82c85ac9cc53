//! Opaque member and channel identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A workspace member, stable per user per workspace (e.g. `U0123ABCD`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this looks like a platform user id: a `U` or `W` prefix
    /// followed by at least two uppercase alphanumerics.
    pub fn is_well_formed(&self) -> bool {
        let mut chars = self.0.chars();
        matches!(chars.next(), Some('U' | 'W'))
            && self.0.len() >= 3
            && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A channel in the workspace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_member_ids() {
        assert!(MemberId::from("U0123ABCD").is_well_formed());
        assert!(MemberId::from("W12").is_well_formed());
        assert!(!MemberId::from("U1").is_well_formed());
        assert!(!MemberId::from("C0123ABCD").is_well_formed());
        assert!(!MemberId::from("U01abc").is_well_formed());
        assert!(!MemberId::from("").is_well_formed());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&MemberId::from("U42AB")).unwrap();
        assert_eq!(json, "\"U42AB\"");
        let channel: ChannelId = serde_json::from_str("\"C999\"").unwrap();
        assert_eq!(channel.as_str(), "C999");
    }
}
