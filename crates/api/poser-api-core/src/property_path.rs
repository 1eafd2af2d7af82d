//! PropertyPath parsing, formatting and resolution.
//!
//! Grammar (host data-path subset):
//!   segment ( '.' ident | '[' index ']' | '[' "key" ']' )*
//! - a path starts with an identifier or a bracket selector
//! - identifiers are `[A-Za-z_][A-Za-z0-9_]*`
//! - keys are single or double quoted, with `\` escaping the quote and itself
//!   Examples:
//!   "pose.bones[\"Arm.L\"].location[0]" -> [Field(pose), Field(bones), Key(Arm.L), Field(location), Index(0)]
//!   "[\"smile\"]" -> [Key(smile)]
//!   "data.shape_keys.key_blocks[2].value"
//!
//! Paths are only ever resolved against a [`PropertySource`]; nothing is
//! executed, so an unknown segment is a plain lookup failure.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::Value;

/// One selector in a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// `.name` attribute access
    Field(String),
    /// `[n]` positional access
    Index(usize),
    /// `["name"]` keyed access (collection item or custom property)
    Key(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    pub segments: Vec<PathSegment>,
}

/// Reflective accessor implemented by anything a path can start from.
///
/// Attribute and keyed access are distinct: `obj.influence` is an attribute,
/// `obj["influence"]` is a custom property.
pub trait PropertySource {
    fn field(&self, name: &str) -> Option<Value>;
    fn key(&self, key: &str) -> Option<Value>;
    fn index(&self, _index: usize) -> Option<Value> {
        None
    }
}

impl PropertySource for Value {
    fn field(&self, name: &str) -> Option<Value> {
        self.member(name).cloned()
    }

    fn key(&self, key: &str) -> Option<Value> {
        self.member(key).cloned()
    }

    fn index(&self, index: usize) -> Option<Value> {
        self.component(index)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl PropertyPath {
    /// Construct a path from segments.
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Parse a path string according to the grammar described above.
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.trim().is_empty() {
            return Err("empty path".to_string());
        }
        let chars: Vec<char> = s.chars().collect();
        let mut pos = 0;
        let mut segments = Vec::new();

        while pos < chars.len() {
            let c = chars[pos];
            if c == '[' {
                let (segment, next) = parse_bracket(&chars, pos)?;
                segments.push(segment);
                pos = next;
                continue;
            }
            if c == '.' {
                if segments.is_empty() {
                    return Err("invalid property path: leading '.'".to_string());
                }
                pos += 1;
            } else if !segments.is_empty() {
                return Err(format!("invalid property path: unexpected '{c}' at {pos}"));
            }
            let start = pos;
            match chars.get(pos) {
                Some(&c) if is_ident_start(c) => pos += 1,
                Some(&c) => {
                    return Err(format!(
                        "invalid property path: expected identifier, found '{c}' at {pos}"
                    ))
                }
                None => return Err("invalid property path: path ends with '.'".to_string()),
            }
            while pos < chars.len() && is_ident_char(chars[pos]) {
                pos += 1;
            }
            segments.push(PathSegment::Field(chars[start..pos].iter().collect()));
        }

        Ok(PropertyPath { segments })
    }

    /// Append an attribute selector.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Field(name.into()));
        self
    }

    /// Append a keyed selector.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append a positional selector.
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    /// Resolve the path against `root`, walking every segment.
    pub fn resolve(&self, root: &dyn PropertySource) -> Result<Value, String> {
        let mut segments = self.segments.iter();
        let first = segments
            .next()
            .ok_or_else(|| "empty path".to_string())?;
        let mut current = lookup(root, first).ok_or_else(|| self.missing(first))?;
        for segment in segments {
            current = lookup(&current, segment).ok_or_else(|| self.missing(segment))?;
        }
        Ok(current)
    }

    fn missing(&self, segment: &PathSegment) -> String {
        let sel = PropertyPath::new(vec![segment.clone()]);
        format!("'{}' does not resolve at '{}'", self, sel)
    }
}

fn lookup(source: &dyn PropertySource, segment: &PathSegment) -> Option<Value> {
    match segment {
        PathSegment::Field(name) => source.field(name),
        PathSegment::Key(key) => source.key(key),
        PathSegment::Index(i) => source.index(*i),
    }
}

fn parse_bracket(chars: &[char], open: usize) -> Result<(PathSegment, usize), String> {
    let mut pos = open + 1;
    match chars.get(pos) {
        Some(&quote) if quote == '"' || quote == '\'' => {
            pos += 1;
            let mut key = String::new();
            loop {
                match chars.get(pos) {
                    Some('\\') => {
                        let escaped = chars
                            .get(pos + 1)
                            .ok_or_else(|| "invalid property path: dangling escape".to_string())?;
                        key.push(*escaped);
                        pos += 2;
                    }
                    Some(&c) if c == quote => {
                        pos += 1;
                        break;
                    }
                    Some(&c) => {
                        key.push(c);
                        pos += 1;
                    }
                    None => return Err("invalid property path: unterminated key".to_string()),
                }
            }
            if chars.get(pos) != Some(&']') {
                return Err("invalid property path: expected ']' after key".to_string());
            }
            Ok((PathSegment::Key(key), pos + 1))
        }
        Some(c) if c.is_ascii_digit() => {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let digits: String = chars[start..pos].iter().collect();
            if chars.get(pos) != Some(&']') {
                return Err("invalid property path: expected ']' after index".to_string());
            }
            let index = digits
                .parse::<usize>()
                .map_err(|e| format!("invalid property path: bad index '{digits}': {e}"))?;
            Ok((PathSegment::Index(index), pos + 1))
        }
        _ => Err(format!("invalid property path: bad selector at {open}")),
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(i) => write!(f, "[{i}]"),
            PathSegment::Key(key) => {
                let escaped = key.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "[\"{escaped}\"]")
            }
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Field(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for PropertyPath {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyPath::parse(s)
    }
}

// Serde support: serialize as string, deserialize from string
impl Serialize for PropertyPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PropertyPath {
    fn deserialize<D>(deserializer: D) -> Result<PropertyPath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PropertyPath::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bone_channel() {
        let p = PropertyPath::parse("pose.bones[\"Arm.L\"].location[0]").unwrap();
        assert_eq!(
            p.segments,
            vec![
                PathSegment::Field("pose".into()),
                PathSegment::Field("bones".into()),
                PathSegment::Key("Arm.L".into()),
                PathSegment::Field("location".into()),
                PathSegment::Index(0),
            ]
        );
        assert_eq!(p.to_string(), "pose.bones[\"Arm.L\"].location[0]");
    }

    #[test]
    fn parse_custom_property() {
        let p = PropertyPath::parse("['smile']").unwrap();
        assert_eq!(p.segments, vec![PathSegment::Key("smile".into())]);
        assert_eq!(p.to_string(), "[\"smile\"]");
    }

    #[test]
    fn escaped_quotes_round_trip() {
        let p = PropertyPath::new(vec![]).key("a\"b");
        let text = p.to_string();
        assert_eq!(text, "[\"a\\\"b\"]");
        assert_eq!(PropertyPath::parse(&text).unwrap(), p);
    }

    #[test]
    fn parse_rejects_expressions() {
        assert!(PropertyPath::parse("").is_err());
        assert!(PropertyPath::parse("location; import os").is_err());
        assert!(PropertyPath::parse("a..b").is_err());
        assert!(PropertyPath::parse("a.").is_err());
        assert!(PropertyPath::parse(".a").is_err());
        assert!(PropertyPath::parse("a[").is_err());
        assert!(PropertyPath::parse("a[\"x\"").is_err());
        assert!(PropertyPath::parse("a[x]").is_err());
        assert!(PropertyPath::parse("f()").is_err());
    }

    #[test]
    fn resolve_walks_values() {
        let root = Value::record([(
            "pose",
            Value::record([("loc", Value::vec3(1.0, 2.0, 3.0))]),
        )]);
        let p = PropertyPath::parse("pose.loc[2]").unwrap();
        assert_eq!(p.resolve(&root), Ok(Value::Float(3.0)));

        let missing = PropertyPath::parse("pose.rot[0]").unwrap();
        let err = missing.resolve(&root).unwrap_err();
        assert!(err.contains("does not resolve"));
    }
}
