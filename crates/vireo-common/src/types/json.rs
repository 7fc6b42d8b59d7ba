//! JSON path expressions.
//!
//! One fixed grammar is supported:
//!
//! ```text
//! path := '$' leg*
//! leg  := '.' ident | '.' '"' chars '"' | '[' digits ']'
//! ```
//!
//! Extraction distinguishes a NULL input (handled by the caller before it ever
//! gets here) from a path that does not resolve, which is an
//! [`Error::PathNotFound`].

use std::fmt;
use std::str::FromStr;

use serde_json::Value as JsonValue;

use crate::utils::error::{Error, Result};

/// One step of a [`JsonPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JsonLeg {
    /// Object member lookup.
    Key(String),
    /// Array element lookup.
    Index(usize),
}

/// A parsed JSON path such as `$.key` or `$."a b"[2]`.
///
/// # Examples
///
/// ```
/// use vireo_common::types::JsonPath;
///
/// let path: JsonPath = "$.key".parse().unwrap();
/// let doc = serde_json::json!({"key": 7});
/// assert_eq!(path.extract(&doc).unwrap(), &serde_json::json!(7));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonPath {
    text: String,
    legs: Vec<JsonLeg>,
}

impl JsonPath {
    /// Parses a path expression.
    pub fn parse(text: &str) -> Result<Self> {
        let fail = |reason: &str| Error::InvalidJsonPath {
            path: text.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = text.trim();
        let mut chars = trimmed.char_indices().peekable();
        match chars.next() {
            Some((_, '$')) => {}
            _ => return Err(fail("must start with '$'")),
        }

        let mut legs = Vec::new();
        while let Some((pos, c)) = chars.next() {
            match c {
                '.' => match chars.peek() {
                    Some((_, '"')) => {
                        chars.next();
                        let mut key = String::new();
                        let mut closed = false;
                        while let Some((_, c)) = chars.next() {
                            match c {
                                '"' => {
                                    closed = true;
                                    break;
                                }
                                '\\' => match chars.next() {
                                    Some((_, escaped)) => key.push(escaped),
                                    None => return Err(fail("dangling escape")),
                                },
                                other => key.push(other),
                            }
                        }
                        if !closed {
                            return Err(fail("unterminated quoted key"));
                        }
                        legs.push(JsonLeg::Key(key));
                    }
                    _ => {
                        let mut key = String::new();
                        while let Some((_, c)) = chars.peek() {
                            if c.is_alphanumeric() || *c == '_' || *c == '$' {
                                key.push(*c);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        if key.is_empty() {
                            return Err(fail(&format!("empty member name at offset {pos}")));
                        }
                        legs.push(JsonLeg::Key(key));
                    }
                },
                '[' => {
                    let mut digits = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        digits.push(c);
                    }
                    if !closed {
                        return Err(fail("unterminated array index"));
                    }
                    let index = digits
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| fail(&format!("invalid array index '{digits}'")))?;
                    legs.push(JsonLeg::Index(index));
                }
                c if c.is_whitespace() => {}
                other => {
                    return Err(fail(&format!("unexpected '{other}' at offset {pos}")));
                }
            }
        }

        Ok(Self {
            text: trimmed.to_string(),
            legs,
        })
    }

    /// The path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The parsed legs.
    #[must_use]
    pub fn legs(&self) -> &[JsonLeg] {
        &self.legs
    }

    /// Follows the path into `doc`.
    ///
    /// Returns [`Error::PathNotFound`] when any leg does not resolve.
    pub fn extract<'a>(&self, doc: &'a JsonValue) -> Result<&'a JsonValue> {
        let mut current = doc;
        for leg in &self.legs {
            let next = match (leg, current) {
                (JsonLeg::Key(key), JsonValue::Object(map)) => map.get(key),
                (JsonLeg::Index(i), JsonValue::Array(items)) => items.get(*i),
                _ => None,
            };
            current = next.ok_or_else(|| Error::PathNotFound {
                path: self.text.clone(),
            })?;
        }
        Ok(current)
    }
}

impl FromStr for JsonPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
