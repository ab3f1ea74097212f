//! The *DBS* sentence (depth below surface).
//!
//! ```text
//! $SDDBS,40.49,f,12.34,M,06.75,F*3C
//! ```
//!
//! Three depth pairs are sent, each as `whole.decimal` followed by a unit
//! marker: feet (`f`), meters (`M`) and a third pair marked `F`.

use decode;
use err::PatternError;
use parser::SentenceParser;
use reading::DepthReading;
use sentence::{FieldMap, Sentence, SentencePattern};

const FEET: &str = "feet";
const FEET_DEC: &str = "feet_dec";
const METERS: &str = "meters";
const METERS_DEC: &str = "meters_dec";

/// Decimal marks accept `.`, `|` or a space.
const PATTERN: &str = concat!(
    start!(),
    r"(?P<sentence>.*?)",
    sep!(),
    r"(?P<feet>\d+)[.| ](?P<feet_dec>\d+)",
    sep!(),
    r"(?P<feet_unit>f)",
    sep!(),
    r"(?P<meters>\d+)[.| ](?P<meters_dec>\d+)",
    sep!(),
    r"(?P<meters_unit>M)",
    sep!(),
    r"(?P<feet_alt>\d+)[.| ](?P<feet_alt_dec>\d+)",
    sep!(),
    r"(?P<feet_alt_unit>F)",
    rest!()
);

/// The DBS grammar.
#[derive(Debug, Clone)]
pub struct Dbs {
    pattern: SentencePattern,
}

impl Dbs {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Dbs {
            pattern: SentencePattern::new(PATTERN)?,
        })
    }
}

impl Sentence for Dbs {
    type Reading = DepthReading;

    fn kind(&self) -> &'static str {
        "DBS"
    }

    fn capture(&self, line: &str) -> Option<FieldMap> {
        self.pattern.capture(line)
    }

    fn decode(&self, fields: Option<&FieldMap>) -> DepthReading {
        match fields {
            Some(f) => DepthReading {
                meters: depth_meters(f),
                feet: depth_feet(f),
            },
            None => DepthReading::default(),
        }
    }
}

/// Depth in meters, `whole + decimal / 100`.
pub fn depth_meters(fields: &FieldMap) -> Option<String> {
    let (whole, dec) = fields!(fields; METERS, METERS_DEC);
    decode::hundredths(whole, dec).map(decode::format_number)
}

/// Depth in feet from the first pair, `whole + decimal / 100`.
pub fn depth_feet(fields: &FieldMap) -> Option<String> {
    let (whole, dec) = fields!(fields; FEET, FEET_DEC);
    decode::hundredths(whole, dec).map(decode::format_number)
}

impl SentenceParser<Dbs> {
    pub fn depth_meters(&self) -> Option<String> {
        self.fields().and_then(depth_meters)
    }

    pub fn depth_feet(&self) -> Option<String> {
        self.fields().and_then(depth_feet)
    }
}
