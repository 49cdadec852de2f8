//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for save identifiers. Each newtype ensures data
//! validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Key uniquely naming one save-capable model's persisted state.
///
/// Doubles as the remote cloud-save file name, so it must be non-empty and
/// must not be whitespace-only. Stable for the lifetime of the model type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveKey(String);

impl SaveKey {
    /// Creates a validated save key
    pub fn new(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(DomainError::InvalidSaveKey(key));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns the inner string
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for SaveKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SaveKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for SaveKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier for one reconciliation batch, used to correlate log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    /// Create a new random BatchId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for BatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidBatchId(format!("Invalid UUID: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_key_valid() {
        let key = SaveKey::new("player_profile").unwrap();
        assert_eq!(key.as_str(), "player_profile");
        assert_eq!(key.to_string(), "player_profile");
    }

    #[test]
    fn test_save_key_rejects_empty() {
        assert!(matches!(
            SaveKey::new(""),
            Err(DomainError::InvalidSaveKey(_))
        ));
        assert!(matches!(
            SaveKey::new("   "),
            Err(DomainError::InvalidSaveKey(_))
        ));
    }

    #[test]
    fn test_save_key_from_str() {
        let key: SaveKey = "settings".parse().unwrap();
        assert_eq!(key.as_str(), "settings");
        assert!("".parse::<SaveKey>().is_err());
    }

    #[test]
    fn test_save_key_serde_transparent() {
        let key = SaveKey::new("level_3").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"level_3\"");

        let back: SaveKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_batch_id_unique() {
        assert_ne!(BatchId::new(), BatchId::new());
    }

    #[test]
    fn test_batch_id_roundtrip() {
        let id = BatchId::new();
        let parsed: BatchId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<BatchId>().is_err());
    }
}
