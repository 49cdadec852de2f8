//! Cloud capability precondition flags
//!
//! Before any cloud operation is attempted, the engine evaluates the
//! session's capabilities and combines every failed precondition into one
//! [`CapabilityFlags`] value. A file whose flags are non-empty
//! short-circuits to `Failed` with that single combined value; the error
//! handler is invoked once, not once per flag.

use std::fmt::{self, Display, Formatter};
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Bitset of failed cloud-save preconditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityFlags(u8);

impl CapabilityFlags {
    /// No precondition failed
    pub const NONE: Self = Self(0);
    /// Reserved bit for a timed-out capability probe
    pub const TIMEOUT: Self = Self(1);
    /// The user session is not authenticated
    pub const NOT_AUTHENTICATED: Self = Self(2);
    /// The backend does not have cloud saves enabled
    pub const CLOUD_SAVE_DISABLED: Self = Self(4);
    /// The remote file name is empty or unset
    pub const NAME_NOT_SET: Self = Self(8);

    /// Returns true when no flag is set
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true when every flag in `other` is set in `self`
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw bit representation
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for CapabilityFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CapabilityFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Display for CapabilityFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }

        let mut first = true;
        let mut write_flag = |name: &str, f: &mut Formatter<'_>| -> fmt::Result {
            if !first {
                write!(f, "|")?;
            }
            first = false;
            write!(f, "{name}")
        };

        if self.contains(Self::TIMEOUT) {
            write_flag("timeout", f)?;
        }
        if self.contains(Self::NOT_AUTHENTICATED) {
            write_flag("not_authenticated", f)?;
        }
        if self.contains(Self::CLOUD_SAVE_DISABLED) {
            write_flag("cloud_save_disabled", f)?;
        }
        if self.contains(Self::NAME_NOT_SET) {
            write_flag("name_not_set", f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(CapabilityFlags::default().is_empty());
        assert_eq!(CapabilityFlags::default(), CapabilityFlags::NONE);
    }

    #[test]
    fn test_combine_flags() {
        let flags = CapabilityFlags::NOT_AUTHENTICATED | CapabilityFlags::NAME_NOT_SET;

        assert!(!flags.is_empty());
        assert!(flags.contains(CapabilityFlags::NOT_AUTHENTICATED));
        assert!(flags.contains(CapabilityFlags::NAME_NOT_SET));
        assert!(!flags.contains(CapabilityFlags::CLOUD_SAVE_DISABLED));
    }

    #[test]
    fn test_bitor_assign() {
        let mut flags = CapabilityFlags::NONE;
        flags |= CapabilityFlags::CLOUD_SAVE_DISABLED;
        flags |= CapabilityFlags::NOT_AUTHENTICATED;

        assert_eq!(flags.bits(), 6);
    }

    #[test]
    fn test_or_with_none_is_identity() {
        let flags = CapabilityFlags::NOT_AUTHENTICATED;
        assert_eq!(flags | CapabilityFlags::NONE, flags);
        assert!(!(flags | CapabilityFlags::NONE).is_empty());
        assert!((CapabilityFlags::NONE | CapabilityFlags::NONE).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(CapabilityFlags::NONE.to_string(), "none");
        assert_eq!(
            CapabilityFlags::NOT_AUTHENTICATED.to_string(),
            "not_authenticated"
        );
        assert_eq!(
            (CapabilityFlags::NOT_AUTHENTICATED | CapabilityFlags::NAME_NOT_SET).to_string(),
            "not_authenticated|name_not_set"
        );
    }

    #[test]
    fn test_serde_transparent() {
        let flags = CapabilityFlags::NOT_AUTHENTICATED | CapabilityFlags::NAME_NOT_SET;
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, "10");

        let back: CapabilityFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }
}
