//! SensorName - Cheap-to-clone sensor/CCD identifier
//!
//! Uses Arc<str> internally for O(1) clone operations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Sensor identifier with cheap cloning.
///
/// Internally uses `Arc<str>` so cloning only increments a reference count
/// instead of allocating new memory. Sensor names are created once when the
/// run is configured and cloned into every worker, log line, and staged file
/// name afterwards.
///
/// # Examples
/// ```
/// use contracts::SensorName;
///
/// let name: SensorName = "R22_S11".into();
/// let name2 = name.clone();  // O(1) - just increments ref count
/// assert_eq!(name, name2);
/// assert_eq!(name.as_str(), "R22_S11");
/// assert_eq!(name.short_tag(), "S11");
/// ```
#[derive(Clone, Default)]
pub struct SensorName(Arc<str>);

impl SensorName {
    /// Create a new SensorName from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing segment of a raft-sensor composite name.
    ///
    /// `"R22_S11"` yields `"S11"`; a name without underscores yields itself.
    /// Used by the source-image fallback search.
    pub fn short_tag(&self) -> &str {
        self.0.rsplit('_').next().unwrap_or(&self.0)
    }
}

// Deref to &str for easy string operations
impl Deref for SensorName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for SensorName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SensorName {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Conversions
impl From<&str> for SensorName {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for SensorName {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<Arc<str>> for SensorName {
    #[inline]
    fn from(s: Arc<str>) -> Self {
        Self(s)
    }
}

// Display and Debug
impl fmt::Display for SensorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SensorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensorName({:?})", self.0)
    }
}

// Equality - can compare with &str, String, etc.
impl PartialEq for SensorName {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for SensorName {}

impl PartialEq<str> for SensorName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for SensorName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl PartialEq<String> for SensorName {
    #[inline]
    fn eq(&self, other: &String) -> bool {
        self.0.as_ref() == other
    }
}

// Hash - same as str hash for HashMap compatibility
impl Hash for SensorName {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

// Serde support
impl Serialize for SensorName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SensorName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_cheap() {
        let name1: SensorName = "R22_S11".into();
        let name2 = name1.clone();

        // Both should point to same underlying data (Arc clone is O(1))
        assert_eq!(name1.as_str().as_ptr(), name2.as_str().as_ptr());
    }

    #[test]
    fn test_equality() {
        let name: SensorName = "S00".into();
        assert_eq!(name, "S00");
        assert_eq!(name, String::from("S00"));
        assert_eq!(name, SensorName::from("S00"));
    }

    #[test]
    fn test_short_tag() {
        assert_eq!(SensorName::from("R22_S11").short_tag(), "S11");
        assert_eq!(SensorName::from("S00").short_tag(), "S00");
        assert_eq!(SensorName::from("12-0").short_tag(), "12-0");
    }

    #[test]
    fn test_serde() {
        let name: SensorName = "S00".into();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"S00\"");

        let parsed: SensorName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }
}
