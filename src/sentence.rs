//! Field extraction shared by every sentence grammar.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

use err::PatternError;

/// Raw field values of one matched sentence, by field name.
///
/// Every field of the grammar has an entry once a sentence matched; fields
/// that did not take part in the match hold an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        FieldMap(BTreeMap::new())
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A compiled sentence grammar with named capture groups.
#[derive(Clone)]
pub struct SentencePattern {
    regex: Regex,
}

impl SentencePattern {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        Ok(SentencePattern {
            regex: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.regex.capture_names().filter_map(|n| n)
    }

    /// Match `line` and collect every named group, `None` if it does not
    /// match at all.
    pub fn capture(&self, line: &str) -> Option<FieldMap> {
        let caps = self.regex.captures(line)?;
        let mut fields = FieldMap::new();
        for name in self.group_names() {
            fields.insert(name, caps.name(name).map_or("", |m| m.as_str()));
        }
        Some(fields)
    }
}

impl fmt::Debug for SentencePattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("SentencePattern").field(&self.as_str()).finish()
    }
}

/// One sentence grammar: how to pick fields out of a line and how to turn
/// them into a reading.
///
/// Implementations are plugged into a
/// [SentenceParser](../parser/struct.SentenceParser.html); the framing and
/// timeout machinery does not depend on them.
pub trait Sentence {
    /// What a decoded line turns into.
    type Reading: Clone;

    /// Short identifier used in log lines.
    fn kind(&self) -> &'static str;

    /// Extract the raw fields of `line`, `None` if it does not follow this
    /// grammar.
    fn capture(&self, line: &str) -> Option<FieldMap>;

    /// Build a reading from the current fields. `None` yields a reading with
    /// every value absent.
    fn decode(&self, fields: Option<&FieldMap>) -> Self::Reading;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_fills_every_group() {
        let p = SentencePattern::new(r"^(?P<a>\d+)(?:\.(?P<b>\d+))?,(?P<c>\w*)$").unwrap();
        let f = p.capture("12,x").unwrap();
        assert_eq!(f.len(), 3);
        assert_eq!(f.get("a"), Some("12"));
        assert_eq!(f.get("b"), Some(""));
        assert_eq!(f.get("c"), Some("x"));
        assert_eq!(f.get("d"), None);
    }

    #[test]
    fn mismatch_is_none() {
        let p = SentencePattern::new(r"^(?P<a>\d+)$").unwrap();
        assert_eq!(p.capture("abc"), None);
    }

    #[test]
    fn group_names_in_order() {
        let p = SentencePattern::new(r"(?P<x>a)(b)(?P<y>c)").unwrap();
        assert_eq!(p.group_names().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert_matches!(SentencePattern::new(r"(?P<x>"), Err(PatternError::Regex(_)));
    }

    #[test]
    fn fields_macro_rejects_missing_and_empty() {
        fn pair(f: &FieldMap) -> Option<String> {
            let (a, b) = fields!(f; "a", "b");
            Some(format!("{}{}", a, b))
        }
        let mut f = FieldMap::new();
        f.insert("a", "1");
        assert_eq!(pair(&f), None);
        f.insert("b", "");
        assert_eq!(pair(&f), None);
        f.insert("b", "2");
        assert_eq!(pair(&f), Some("12".to_string()));
    }
}
