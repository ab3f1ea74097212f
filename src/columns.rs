//! Whitespace separated instrument lines (CTD and thermosalinograph
//! real-time output), mapped positionally onto configured column names.

use err::PatternError;
use parser::SentenceParser;
use reading::ColumnReading;
use sentence::{FieldMap, Sentence};

/// A fixed column layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Columns {
    names: Vec<String>,
}

impl Columns {
    /// Only the first word of each name is used, so `"Temp [ITS-90]"` becomes
    /// `Temp`. Those first words must be unique.
    pub fn new<I, N>(names: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let mut columns = Vec::new();
        for (index, name) in names.into_iter().enumerate() {
            match name.as_ref().split_whitespace().next() {
                Some(word) if columns.iter().any(|c| c == word) => {
                    return Err(PatternError::DuplicateColumn(index))
                }
                Some(word) => columns.push(word.to_string()),
                None => return Err(PatternError::BlankColumn(index)),
            }
        }
        if columns.is_empty() {
            return Err(PatternError::NoColumns);
        }
        Ok(Columns { names: columns })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Sentence for Columns {
    type Reading = ColumnReading;

    fn kind(&self) -> &'static str {
        "columns"
    }

    /// Blank lines do not match. Tokens beyond the last column are dropped;
    /// columns without a token are left empty.
    fn capture(&self, line: &str) -> Option<FieldMap> {
        let mut tokens = line.split_whitespace().peekable();
        tokens.peek()?;

        let mut fields = FieldMap::new();
        for name in &self.names {
            fields.insert(name, tokens.next().unwrap_or(""));
        }
        let extra = tokens.count();
        if extra > 0 {
            trace!(extra, "dropping tokens beyond the configured columns");
        }
        Some(fields)
    }

    fn decode(&self, fields: Option<&FieldMap>) -> ColumnReading {
        ColumnReading::new(
            self.names
                .iter()
                .map(|name| {
                    let value = fields
                        .and_then(|f| f.get(name))
                        .filter(|v| !v.is_empty())
                        .map(str::to_string);
                    (name.clone(), value)
                })
                .collect(),
        )
    }
}

impl SentenceParser<Columns> {
    /// Value of `column` in the last matched line.
    pub fn column(&self, column: &str) -> Option<String> {
        self.fields()
            .and_then(|f| f.get(column))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}
