//! Mnemonic identifier type.
//!
//! A mnemonic is the human-assigned, immutable identifier of a registry
//! entity (organization, source, collection, concept code, version label).
//! It is unique within its namespace and restricted to ASCII letters,
//! digits, and hyphens.

use std::fmt;

/// A human-assigned, immutable identifier.
///
/// Mnemonics must be non-empty and match `[A-Za-z0-9-]+`. Once assigned to
/// an entity they never change; renaming an entity means creating a new one.
///
/// # Examples
///
/// ```
/// use termreg_types::Mnemonic;
///
/// let m = Mnemonic::new("CIEL-2024").unwrap();
/// assert_eq!(m.as_str(), "CIEL-2024");
///
/// assert!(Mnemonic::new("no spaces").is_err());
/// assert!(Mnemonic::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Mnemonic(String);

impl Mnemonic {
    /// Creates a mnemonic, validating the namespace pattern.
    ///
    /// Returns `MnemonicError` if the value is empty or contains a
    /// character outside `[A-Za-z0-9-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, MnemonicError> {
        let value = value.into();
        if value.is_empty() {
            return Err(MnemonicError { value });
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(MnemonicError { value });
        }
        Ok(Self(value))
    }

    /// Returns the mnemonic as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Mnemonic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error returned when a string is not a valid mnemonic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnemonicError {
    /// The rejected value.
    pub value: String,
}

impl fmt::Display for MnemonicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid mnemonic '{}': must be non-empty and contain only letters, digits, and hyphens",
            self.value
        )
    }
}

impl std::error::Error for MnemonicError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_mnemonics() {
        for value in ["HEAD", "v1-0", "ICD-10", "abc123", "A"] {
            assert!(Mnemonic::new(value).is_ok(), "{value} should be valid");
        }
    }

    #[test]
    fn test_invalid_mnemonics() {
        for value in ["", "has space", "under_score", "slash/", "dot.", "é"] {
            assert!(Mnemonic::new(value).is_err(), "{value:?} should be invalid");
        }
    }

    #[test]
    fn test_display_roundtrip() {
        let m = Mnemonic::new("My-Source-1").unwrap();
        assert_eq!(m.to_string(), "My-Source-1");
        assert_eq!(m.as_ref(), "My-Source-1");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_transparent() {
        let m = Mnemonic::new("HEAD").unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"HEAD\"");
        let parsed: Mnemonic = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, m);
    }
}
