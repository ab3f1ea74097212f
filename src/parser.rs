//! This module provides the matching engine shared by all sentence grammars.
//!
//! A [SentenceParser](struct.SentenceParser.html) owns one grammar and the
//! fields of the last line it matched. Grammar-specific getters live next to
//! each grammar (see [rmc](../rmc/index.html) and [dbs](../dbs/index.html)).

use err::ReadError;
use reader;
use sentence::{FieldMap, Sentence};

/// Matches lines against a grammar and keeps the fields of the most recent
/// one.
#[derive(Debug, Clone)]
pub struct SentenceParser<S> {
    sentence: S,
    fields: Option<FieldMap>,
}

impl<S: Sentence> SentenceParser<S> {
    /// Create a parser with no current fields.
    pub fn new(sentence: S) -> Self {
        SentenceParser {
            sentence,
            fields: None,
        }
    }

    pub fn sentence(&self) -> &S {
        &self.sentence
    }

    /// Fields of the last line, `None` if it did not match or nothing was
    /// parsed yet.
    #[inline]
    pub fn fields(&self) -> Option<&FieldMap> {
        self.fields.as_ref()
    }

    /// Match `line`. The current fields are replaced on a match and cleared
    /// otherwise. Returns whether the line matched.
    pub fn parse(&mut self, line: &str) -> bool {
        self.fields = self.sentence.capture(line);
        if self.fields.is_none() {
            debug!(sentence = self.sentence.kind(), line, "line does not match");
        }
        self.fields.is_some()
    }

    /// Decode `raw` as ASCII and match it. Undecodable input is an error and
    /// leaves the current fields untouched.
    pub fn parse_bytes(&mut self, raw: &[u8]) -> Result<bool, ReadError> {
        let line = reader::decode_ascii(raw)?;
        Ok(self.parse(line))
    }

    /// Forget the current fields.
    pub fn clear(&mut self) {
        self.fields = None;
    }

    /// Reading built from the current fields.
    pub fn reading(&self) -> S::Reading {
        self.sentence.decode(self.fields.as_ref())
    }

    /// Reading with every value absent.
    pub fn absent(&self) -> S::Reading {
        self.sentence.decode(None)
    }
}
