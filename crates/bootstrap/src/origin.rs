//! Mod origin identifier handed to the in-game handler

use std::fmt;

use crate::error::{BootstrapError, Result};

/// Largest origin the handler accepts, in bytes
pub const MAX_ORIGIN_LEN: usize = 127;

/// Origin used when nothing is configured
pub const DEFAULT_ORIGIN: &str = "dvmod://mod/couplers-overhaul";

/// Opaque ASCII identifier of the mod source to install
///
/// The value is passed verbatim on the game's command line, so it must be
/// printable ASCII without whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin(String);

impl Origin {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let reason = if value.is_empty() {
            Some("origin must not be empty".to_string())
        } else if value.len() > MAX_ORIGIN_LEN {
            Some(format!("origin is {} bytes, limit is {}", value.len(), MAX_ORIGIN_LEN))
        } else if !value.bytes().all(|b| b.is_ascii_graphic()) {
            Some("origin must be printable ASCII without whitespace".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(BootstrapError::InvalidOrigin { origin: value, reason }),
            None => Ok(Self(value)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URI scheme of the origin, if it looks like one (`dvmod`, `https`, ...)
    pub fn scheme(&self) -> Option<&str> {
        let (scheme, _) = self.0.split_once("://")?;
        let valid = scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        valid.then_some(scheme)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_default_origin() {
        let origin = Origin::parse(DEFAULT_ORIGIN).unwrap();
        assert_eq!(origin.as_str(), DEFAULT_ORIGIN);
        assert_eq!(origin.scheme(), Some("dvmod"));
    }

    #[test]
    fn test_enforces_length_bound() {
        let exact = "a".repeat(MAX_ORIGIN_LEN);
        assert!(Origin::parse(exact).is_ok());

        let over = "a".repeat(MAX_ORIGIN_LEN + 1);
        let err = Origin::parse(over).unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidOrigin { .. }));
    }

    #[test]
    fn test_rejects_empty_whitespace_and_non_ascii() {
        assert!(Origin::parse("").is_err());
        assert!(Origin::parse("dvmod://mod/two words").is_err());
        assert!(Origin::parse("dvmod://mod/caf\u{e9}").is_err());
    }

    #[test]
    fn test_scheme_is_optional() {
        assert_eq!(Origin::parse("couplers-overhaul").unwrap().scheme(), None);
        assert_eq!(Origin::parse("https://example.com/m.zip").unwrap().scheme(), Some("https"));
        assert_eq!(Origin::parse("://nothing").unwrap().scheme(), None);
    }
}
