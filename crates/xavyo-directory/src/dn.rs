//! Distinguished names.
//!
//! Parsing and rendering follow RFC 4514. Attribute values are held as raw
//! bytes; values that are valid UTF-8 render as escaped text, anything else
//! renders with `\XX` hex escapes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DirectoryError, DirectoryResult};
use crate::name::validate_ldap_name;

/// One `type=value` pair within an RDN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeTypeAndValue {
    name: String,
    value: Vec<u8>,
}

impl AttributeTypeAndValue {
    /// Attribute type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw attribute value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Attribute value as a string, replacing invalid UTF-8.
    pub fn value_string(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }

    fn normalized(&self) -> (String, Vec<u8>) {
        (self.name.to_ascii_lowercase(), self.value.to_ascii_lowercase())
    }
}

/// A relative distinguished name: one or more `type=value` pairs joined by `+`.
#[derive(Debug, Clone)]
pub struct Rdn {
    components: Vec<AttributeTypeAndValue>,
}

impl Rdn {
    /// Build a (possibly multi-valued) RDN from name/value pairs.
    ///
    /// Component order is preserved.
    pub fn new<N: Into<String>>(pairs: Vec<(N, Vec<u8>)>) -> DirectoryResult<Self> {
        if pairs.is_empty() {
            return Err(DirectoryError::invalid_rdn(
                "",
                "an RDN must contain at least one attribute value",
            ));
        }

        let mut components = Vec::with_capacity(pairs.len());
        for (name, value) in pairs {
            let name = name.into();
            validate_ldap_name(&name)
                .map_err(|e| DirectoryError::invalid_rdn(name.clone(), e.to_string()))?;
            components.push(AttributeTypeAndValue { name, value });
        }

        Ok(Self { components })
    }

    /// Build a single-valued RDN.
    pub fn single(name: impl Into<String>, value: impl Into<Vec<u8>>) -> DirectoryResult<Self> {
        Self::new(vec![(name.into(), value.into())])
    }

    /// Get the components of this RDN.
    pub fn components(&self) -> &[AttributeTypeAndValue] {
        &self.components
    }

    /// Check whether this RDN has more than one component.
    pub fn is_multi_valued(&self) -> bool {
        self.components.len() > 1
    }

    /// Get the value for the given attribute name (case-insensitive).
    pub fn value_of(&self, name: &str) -> Option<&[u8]> {
        self.components
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.value.as_slice())
    }

    fn normalized(&self) -> Vec<(String, Vec<u8>)> {
        let mut pairs: Vec<_> = self.components.iter().map(|c| c.normalized()).collect();
        pairs.sort();
        pairs
    }
}

impl PartialEq for Rdn {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Rdn {}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{}={}", component.name, escape_dn_value(&component.value))?;
        }
        Ok(())
    }
}

impl FromStr for Rdn {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rdns = Dn::parse(s)
            .map_err(|e| DirectoryError::invalid_rdn(s, e.to_string()))?
            .rdns;
        if rdns.len() > 1 {
            return Err(DirectoryError::invalid_rdn(
                s,
                "the value contains more than one RDN",
            ));
        }
        rdns.pop()
            .ok_or_else(|| DirectoryError::invalid_rdn(s, "the RDN is empty"))
    }
}

/// A distinguished name. The root DN has no RDNs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    /// The root (empty) DN.
    pub fn root() -> Self {
        Self { rdns: Vec::new() }
    }

    /// Parse a DN from its string representation.
    ///
    /// An empty or all-whitespace string yields the root DN.
    pub fn parse(s: &str) -> DirectoryResult<Self> {
        if s.trim().is_empty() {
            return Ok(Self::root());
        }
        Parser::new(s).parse_dn()
    }

    /// Compose an RDN with a parent DN.
    pub fn from_rdn_and_parent(rdn: Rdn, parent: &Dn) -> Self {
        let mut rdns = Vec::with_capacity(parent.rdns.len() + 1);
        rdns.push(rdn);
        rdns.extend(parent.rdns.iter().cloned());
        Self { rdns }
    }

    /// Check whether this is the root DN.
    pub fn is_root(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Get the RDNs, leftmost first.
    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// Get the leftmost RDN.
    pub fn rdn(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    /// Get the parent DN. The root DN has no parent.
    pub fn parent(&self) -> Option<Dn> {
        if self.is_root() {
            None
        } else {
            Some(Self {
                rdns: self.rdns[1..].to_vec(),
            })
        }
    }

    /// Check whether this DN is subordinate to `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &Dn) -> bool {
        self.rdns.len() > ancestor.rdns.len()
            && self.rdns[self.rdns.len() - ancestor.rdns.len()..] == ancestor.rdns[..]
    }
}

impl PartialEq for Dn {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

impl Eq for Dn {}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}

impl FromStr for Dn {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dn::parse(s)
    }
}

impl TryFrom<String> for Dn {
    type Error = DirectoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Dn::parse(&value)
    }
}

impl From<Dn> for String {
    fn from(dn: Dn) -> Self {
        dn.to_string()
    }
}

/// Escape an attribute value for use in a DN string (RFC 4514).
///
/// Characters that must be escaped:
/// - Leading or trailing SPACE (escaped as \20)
/// - Leading # (escaped as \23)
/// - Characters: , + " \ < > ; = (escaped with backslash prefix)
/// - NUL character (escaped as \00)
pub fn escape_dn_value(value: &[u8]) -> String {
    let Ok(text) = std::str::from_utf8(value) else {
        return value.iter().map(|b| format!("\\{b:02x}")).collect();
    };

    let mut result = String::with_capacity(text.len() * 2);
    let last = text.char_indices().last().map(|(i, _)| i);

    for (i, ch) in text.char_indices() {
        let is_first = i == 0;
        let is_last = Some(i) == last;

        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                result.push('\\');
                result.push(ch);
            }
            '\0' => result.push_str("\\00"),
            ' ' if is_first || is_last => result.push_str("\\20"),
            '#' if is_first => result.push_str("\\23"),
            _ => result.push(ch),
        }
    }

    result
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> DirectoryError {
        DirectoryError::invalid_dn(self.input, reason)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn parse_dn(mut self) -> DirectoryResult<Dn> {
        let mut rdns = Vec::new();
        let mut components = Vec::new();

        loop {
            components.push(self.parse_type_and_value()?);
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                }
                Some(b',') | Some(b';') => {
                    self.pos += 1;
                    rdns.push(Rdn {
                        components: std::mem::take(&mut components),
                    });
                }
                None => {
                    rdns.push(Rdn { components });
                    return Ok(Dn { rdns });
                }
                Some(other) => {
                    return Err(self.error(format!(
                        "unexpected character '{}' at position {}",
                        other as char, self.pos
                    )))
                }
            }
        }
    }

    fn parse_type_and_value(&mut self) -> DirectoryResult<AttributeTypeAndValue> {
        self.skip_spaces();
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'=' || b == b',' || b == b'+' {
                break;
            }
            self.pos += 1;
        }

        if self.peek() != Some(b'=') {
            return Err(self.error(format!(
                "no '=' found after attribute type at position {start}"
            )));
        }

        let name = self.input[start..self.pos].trim().to_string();
        validate_ldap_name(&name).map_err(|e| self.error(e.to_string()))?;
        self.pos += 1;
        self.skip_spaces();

        let value = match self.peek() {
            Some(b'#') => self.parse_hex_value()?,
            Some(b'"') => self.parse_quoted_value()?,
            _ => self.parse_string_value()?,
        };

        Ok(AttributeTypeAndValue { name, value })
    }

    fn parse_hex_value(&mut self) -> DirectoryResult<Vec<u8>> {
        self.pos += 1;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !b.is_ascii_hexdigit() {
                break;
            }
            self.pos += 1;
        }
        let hex = &self.input[start..self.pos];
        if hex.is_empty() || hex.len() % 2 != 0 {
            return Err(self.error("a '#' value must contain an even number of hex digits"));
        }
        self.skip_spaces();
        Ok((0..hex.len())
            .step_by(2)
            .filter_map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
            .collect())
    }

    fn parse_quoted_value(&mut self) -> DirectoryResult<Vec<u8>> {
        self.pos += 1;
        let mut value = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated quoted value")),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => value.push(self.parse_escape()?),
                Some(b) => {
                    value.push(b);
                    self.pos += 1;
                }
            }
        }
        self.skip_spaces();
        Ok(value)
    }

    fn parse_string_value(&mut self) -> DirectoryResult<Vec<u8>> {
        let mut value = Vec::new();
        // Length of the value up to and including the last escaped byte, so
        // an escaped trailing space is not trimmed.
        let mut keep = 0;
        while let Some(b) = self.peek() {
            match b {
                b',' | b'+' | b';' => break,
                b'\\' => {
                    value.push(self.parse_escape()?);
                    keep = value.len();
                }
                b'"' | b'<' | b'>' | b'=' => {
                    return Err(self.error(format!(
                        "the character '{}' must be escaped at position {}",
                        b as char, self.pos
                    )))
                }
                _ => {
                    value.push(b);
                    self.pos += 1;
                }
            }
        }

        while value.len() > keep && value.last() == Some(&b' ') {
            value.pop();
        }

        Ok(value)
    }

    fn parse_escape(&mut self) -> DirectoryResult<u8> {
        self.pos += 1;
        let Some(next) = self.peek() else {
            return Err(self.error("the DN ends with an incomplete escape"));
        };

        if next.is_ascii_hexdigit() {
            let hex = self
                .input
                .get(self.pos..self.pos + 2)
                .ok_or_else(|| self.error("incomplete hex escape"))?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|_| self.error(format!("invalid hex escape '\\{hex}'")))?;
            self.pos += 2;
            return Ok(byte);
        }

        match next {
            b' ' | b'"' | b'#' | b'+' | b',' | b';' | b'<' | b'=' | b'>' | b'\\' => {
                self.pos += 1;
                Ok(next)
            }
            _ => Err(self.error(format!(
                "invalid escape '\\{}' at position {}",
                next as char, self.pos
            ))),
        }
    }
}
