//! Search filters.
//!
//! A structured filter tree that renders to the RFC 4515 string form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Filter for search operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Match entries where attribute equals value.
    Equals { attribute: String, value: Vec<u8> },

    /// Match entries where attribute contains value (substring).
    Contains { attribute: String, value: String },

    /// Match entries where attribute starts with value.
    StartsWith { attribute: String, value: String },

    /// Match entries where attribute ends with value.
    EndsWith { attribute: String, value: String },

    /// Match entries where attribute is greater than or equal to value.
    GreaterOrEqual { attribute: String, value: Vec<u8> },

    /// Match entries where attribute is less than or equal to value.
    LessOrEqual { attribute: String, value: Vec<u8> },

    /// Match entries where attribute is approximately equal to value.
    ApproximatelyEqual { attribute: String, value: Vec<u8> },

    /// Match entries where attribute exists (has any value).
    Present { attribute: String },

    /// Logical AND of multiple filters.
    And { filters: Vec<Filter> },

    /// Logical OR of multiple filters.
    Or { filters: Vec<Filter> },

    /// Logical NOT of a filter.
    Not { filter: Box<Filter> },
}

impl Filter {
    /// Create an equality filter.
    pub fn eq(attribute: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Filter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a contains filter.
    pub fn contains(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Contains {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a starts-with filter.
    pub fn starts_with(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::StartsWith {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create an ends-with filter.
    pub fn ends_with(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::EndsWith {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a greater-or-equal filter.
    pub fn greater_or_equal(attribute: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Filter::GreaterOrEqual {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a less-or-equal filter.
    pub fn less_or_equal(attribute: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Filter::LessOrEqual {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create an approximate-match filter.
    pub fn approximately_equal(attribute: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Filter::ApproximatelyEqual {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a present (attribute exists) filter.
    pub fn present(attribute: impl Into<String>) -> Self {
        Filter::Present {
            attribute: attribute.into(),
        }
    }

    /// Create an AND filter.
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And { filters }
    }

    /// Create an OR filter.
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or { filters }
    }

    /// Create a NOT filter (negation).
    pub fn negate(filter: Filter) -> Self {
        Filter::Not {
            filter: Box::new(filter),
        }
    }

    /// Build the filter component for a match type.
    ///
    /// Presence ignores `value`.
    pub fn for_match_type(
        match_type: MatchType,
        attribute: impl Into<String>,
        value: &str,
    ) -> Self {
        match match_type {
            MatchType::Presence => Filter::present(attribute),
            MatchType::Equality => Filter::eq(attribute, value),
            MatchType::StartsWith => Filter::starts_with(attribute, value),
            MatchType::EndsWith => Filter::ends_with(attribute, value),
            MatchType::Contains => Filter::contains(attribute, value),
            MatchType::GreaterOrEqual => Filter::greater_or_equal(attribute, value),
            MatchType::LessOrEqual => Filter::less_or_equal(attribute, value),
            MatchType::ApproximatelyEqual => Filter::approximately_equal(attribute, value),
        }
    }

    /// Combine this filter with another using AND.
    pub fn and_with(self, other: Filter) -> Self {
        match self {
            Filter::And { mut filters } => {
                filters.push(other);
                Filter::And { filters }
            }
            _ => Filter::And {
                filters: vec![self, other],
            },
        }
    }

    /// Combine this filter with another using OR.
    pub fn or_with(self, other: Filter) -> Self {
        match self {
            Filter::Or { mut filters } => {
                filters.push(other);
                Filter::Or { filters }
            }
            _ => Filter::Or {
                filters: vec![self, other],
            },
        }
    }

    /// Get the components of an AND or OR filter.
    pub fn components(&self) -> &[Filter] {
        match self {
            Filter::And { filters } | Filter::Or { filters } => filters,
            _ => &[],
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::And { filters } => {
                f.write_str("(&")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
            Filter::Or { filters } => {
                f.write_str("(|")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
            Filter::Not { filter } => write!(f, "(!{filter})"),
            Filter::Equals { attribute, value } => {
                write!(f, "({}={})", attribute, escape_filter_value(value))
            }
            Filter::Contains { attribute, value } => write!(
                f,
                "({}=*{}*)",
                attribute,
                escape_filter_value(value.as_bytes())
            ),
            Filter::StartsWith { attribute, value } => write!(
                f,
                "({}={}*)",
                attribute,
                escape_filter_value(value.as_bytes())
            ),
            Filter::EndsWith { attribute, value } => write!(
                f,
                "({}=*{})",
                attribute,
                escape_filter_value(value.as_bytes())
            ),
            Filter::GreaterOrEqual { attribute, value } => {
                write!(f, "({}>={})", attribute, escape_filter_value(value))
            }
            Filter::LessOrEqual { attribute, value } => {
                write!(f, "({}<={})", attribute, escape_filter_value(value))
            }
            Filter::ApproximatelyEqual { attribute, value } => {
                write!(f, "({}~={})", attribute, escape_filter_value(value))
            }
            Filter::Present { attribute } => write!(f, "({attribute}=*)"),
        }
    }
}

/// Escape special characters in filter assertion values (RFC 4515).
///
/// Values that are not valid UTF-8 have every non-printable byte hex-escaped.
pub fn escape_filter_value(value: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(value) {
        return text
            .replace('\\', "\\5c")
            .replace('*', "\\2a")
            .replace('(', "\\28")
            .replace(')', "\\29")
            .replace('\0', "\\00");
    }

    let mut escaped = String::with_capacity(value.len() * 3);
    for &b in value {
        match b {
            b'\\' | b'*' | b'(' | b')' => escaped.push_str(&format!("\\{b:02x}")),
            0x20..=0x7e => escaped.push(b as char),
            _ => escaped.push_str(&format!("\\{b:02x}")),
        }
    }
    escaped
}

/// How an attribute value is matched when building a filter component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// The attribute has any value.
    Presence,
    /// The attribute has the given value.
    #[default]
    Equality,
    /// A value starts with the given substring.
    StartsWith,
    /// A value ends with the given substring.
    EndsWith,
    /// A value contains the given substring.
    Contains,
    /// A value is greater than or equal to the given value.
    GreaterOrEqual,
    /// A value is less than or equal to the given value.
    LessOrEqual,
    /// A value approximately matches the given value.
    ApproximatelyEqual,
}

impl MatchType {
    /// Parse a match type name.
    ///
    /// Accepts compact, hyphenated and underscored spellings in any case
    /// (`startsWith`, `starts-with`, `starts_with`).
    #[must_use]
    pub fn for_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "presence" => Some(MatchType::Presence),
            "equality" => Some(MatchType::Equality),
            "startswith" | "starts-with" | "starts_with" => Some(MatchType::StartsWith),
            "endswith" | "ends-with" | "ends_with" => Some(MatchType::EndsWith),
            "contains" => Some(MatchType::Contains),
            "greaterorequal" | "greater-or-equal" | "greater_or_equal" => {
                Some(MatchType::GreaterOrEqual)
            }
            "lessorequal" | "less-or-equal" | "less_or_equal" => Some(MatchType::LessOrEqual),
            "approximatelyequalto" | "approximately-equal-to" | "approximately_equal_to" => {
                Some(MatchType::ApproximatelyEqual)
            }
            _ => None,
        }
    }

    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Presence => "presence",
            MatchType::Equality => "equality",
            MatchType::StartsWith => "starts_with",
            MatchType::EndsWith => "ends_with",
            MatchType::Contains => "contains",
            MatchType::GreaterOrEqual => "greater_or_equal",
            MatchType::LessOrEqual => "less_or_equal",
            MatchType::ApproximatelyEqual => "approximately_equal_to",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_equals() {
        let filter = Filter::eq("uid", "jdoe");
        assert_eq!(filter.to_string(), "(uid=jdoe)");
    }

    #[test]
    fn test_render_and() {
        let filter = Filter::eq("objectClass", "person").and_with(Filter::eq("employeeNumber", "12345"));
        assert_eq!(
            filter.to_string(),
            "(&(objectClass=person)(employeeNumber=12345))"
        );
        assert_eq!(filter.components().len(), 2);
    }

    #[test]
    fn test_render_or_and_not() {
        let filter = Filter::or(vec![Filter::eq("cn", "a"), Filter::eq("cn", "b")]);
        assert_eq!(filter.to_string(), "(|(cn=a)(cn=b))");

        let filter = Filter::negate(Filter::eq("status", "deleted"));
        assert_eq!(filter.to_string(), "(!(status=deleted))");
    }

    #[test]
    fn test_render_substrings_and_ordering() {
        assert_eq!(Filter::contains("cn", "oh").to_string(), "(cn=*oh*)");
        assert_eq!(Filter::starts_with("cn", "Jo").to_string(), "(cn=Jo*)");
        assert_eq!(Filter::ends_with("cn", "hn").to_string(), "(cn=*hn)");
        assert_eq!(
            Filter::greater_or_equal("uidNumber", "1000").to_string(),
            "(uidNumber>=1000)"
        );
        assert_eq!(
            Filter::less_or_equal("uidNumber", "2000").to_string(),
            "(uidNumber<=2000)"
        );
        assert_eq!(
            Filter::approximately_equal("cn", "jon").to_string(),
            "(cn~=jon)"
        );
        assert_eq!(Filter::present("mail").to_string(), "(mail=*)");
    }

    #[test]
    fn test_escape_filter_value() {
        assert_eq!(escape_filter_value(b"John Doe"), "John Doe");
        assert_eq!(escape_filter_value(b"John*"), "John\\2a");
        assert_eq!(escape_filter_value(b"(admin)"), "\\28admin\\29");
        assert_eq!(escape_filter_value(b"a\\b"), "a\\5cb");
        assert_eq!(escape_filter_value(&[0xff, b'a', 0x00]), "\\ffa\\00");
    }

    #[test]
    fn test_match_type_for_name() {
        assert_eq!(MatchType::for_name("startsWith"), Some(MatchType::StartsWith));
        assert_eq!(MatchType::for_name("ends-with"), Some(MatchType::EndsWith));
        assert_eq!(
            MatchType::for_name("GREATER_OR_EQUAL"),
            Some(MatchType::GreaterOrEqual)
        );
        assert_eq!(
            MatchType::for_name("approximately-equal-to"),
            Some(MatchType::ApproximatelyEqual)
        );
        assert_eq!(MatchType::for_name("fuzzy"), None);
    }

    #[test]
    fn test_filter_for_match_type() {
        assert_eq!(
            Filter::for_match_type(MatchType::Presence, "mail", "ignored").to_string(),
            "(mail=*)"
        );
        assert_eq!(
            Filter::for_match_type(MatchType::StartsWith, "cn", "Jo").to_string(),
            "(cn=Jo*)"
        );
        assert_eq!(
            Filter::for_match_type(MatchType::Equality, "uid", "jdoe"),
            Filter::eq("uid", "jdoe")
        );
    }

    #[test]
    fn test_filter_serialization() {
        let filter = Filter::present("mail");
        let json = serde_json::to_string(&filter).unwrap();
        assert_eq!(json, r#"{"type":"present","attribute":"mail"}"#);
    }
}
