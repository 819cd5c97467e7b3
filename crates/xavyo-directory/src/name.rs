//! LDAP schema element name validation.
//!
//! Attribute type and object class names are either a keystring
//! (`ALPHA *( ALPHA / DIGIT / HYPHEN )`) or a numeric OID, per RFC 4512.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DirectoryError, DirectoryResult};

static KEYSTRING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("KEYSTRING_RE is a valid regex pattern")
});

static NUMERIC_OID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))+$")
        .expect("NUMERIC_OID_RE is a valid regex pattern")
});

/// Check whether `name` may be used as an attribute type or object class name.
///
/// Returns the reason the name was rejected.
pub fn validate_ldap_name(name: &str) -> DirectoryResult<()> {
    if name.is_empty() {
        return Err(DirectoryError::invalid_name(name, "the name is empty"));
    }

    if KEYSTRING_RE.is_match(name) || NUMERIC_OID_RE.is_match(name) {
        return Ok(());
    }

    let first = name.chars().next().unwrap_or_default();
    let reason = if first.is_ascii_digit() {
        "a name beginning with a digit must be a numeric OID".to_string()
    } else if !first.is_ascii_alphabetic() {
        format!("the name must begin with a letter, not '{first}'")
    } else {
        let bad = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
            .unwrap_or_default();
        format!("the character '{bad}' is not allowed in a name")
    };

    Err(DirectoryError::invalid_name(name, reason))
}

/// Convenience wrapper returning whether the name is valid.
#[must_use]
pub fn is_valid_ldap_name(name: &str) -> bool {
    validate_ldap_name(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["person", "inetOrgPerson", "x-custom-attr", "cn", "c1", "2.5.4.3"] {
            assert!(is_valid_ldap_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_ldap_name(""));
        assert!(!is_valid_ldap_name("-person"));
        assert!(!is_valid_ldap_name("has space"));
        assert!(!is_valid_ldap_name("under_score"));
        assert!(!is_valid_ldap_name("2.5.04.3"));
        assert!(!is_valid_ldap_name("123"));
    }

    #[test]
    fn test_rejection_reasons() {
        let err = validate_ldap_name("bad name").unwrap_err();
        assert!(err.to_string().contains("' ' is not allowed"));

        let err = validate_ldap_name("9abc").unwrap_err();
        assert!(err.to_string().contains("numeric OID"));

        let err = validate_ldap_name("_abc").unwrap_err();
        assert!(err.to_string().contains("must begin with a letter"));
    }
}
