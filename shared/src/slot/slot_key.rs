use std::fmt;

use super::SlotId;

/// Human-readable key a [`SlotId`] is derived from.
///
/// Nested properties extend their parent's *key* (`"Player.stats"` →
/// `"Player.stats.strength"`), never the parent's id, so a key stays readable
/// in logs and stable as long as the leaf keeps its name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    key: String,
}

impl SlotKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// `"TypeName.MemberName"`
    pub fn member(type_name: &str, member: &str) -> Self {
        Self::new(type_name).child(member)
    }

    pub fn child(&self, name: &str) -> Self {
        Self {
            key: format!("{}.{}", self.key, name),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn id(&self) -> SlotId {
        SlotId::from_key(&self.key)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl From<&str> for SlotKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SlotKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}
