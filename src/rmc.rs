//! The *RMC* sentence (recommended minimum: position, speed, course, UTC
//! time and date).
//!
//! ```text
//! $GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A
//! ```

use chrono::NaiveDateTime;

use decode::{self, CardDir};
use err::PatternError;
use parser::SentenceParser;
use reading::PositionReading;
use sentence::{FieldMap, Sentence, SentencePattern};

const SENTENCE: &str = "sentence";
const HOUR: &str = "hour";
const MINUTE: &str = "minute";
const SECOND: &str = "second";
const LAT_DEG: &str = "lat_deg";
const LAT_MIN: &str = "lat_min";
const LAT_DIR: &str = "lat_dir";
const LON_DEG: &str = "lon_deg";
const LON_MIN: &str = "lon_min";
const LON_DIR: &str = "lon_dir";
const SPEED: &str = "speed";
const DAY: &str = "day";
const MONTH: &str = "month";
const YEAR: &str = "year";

/// Time, status, position, speed, course and date, each field separated by
/// `,`, `|` or a space. Minutes accept `.` or `,` as decimal mark.
const PATTERN: &str = concat!(
    start!(),
    r"(?P<sentence>.*?)",
    sep!(),
    r"(?P<hour>\d{1,2})(?P<minute>\d{1,2})(?P<second>\d{1,2})(?:\.(?P<millis>\d{1,3}))?",
    sep!(),
    r"(?P<status>.*?)",
    sep!(),
    r"(?P<lat_deg>\d{1,2})(?P<lat_min>\d{1,2}[.,]\d{1,6})",
    sep!(),
    r"(?P<lat_dir>[NnSs])",
    sep!(),
    r"(?P<lon_deg>\d{1,3})(?P<lon_min>\d{1,2}[.,]\d{1,6})",
    sep!(),
    r"(?P<lon_dir>[WwEe])",
    sep!(),
    r"(?P<speed>\d{1,3}\.\d{1,2})",
    sep!(),
    r"(?P<course>\d{1,3}\.\d{1,2})",
    sep!(),
    r"(?P<day>\d{1,2})(?P<month>\d{1,2})(?P<year>\d{1,4})",
    sep!(),
    rest!()
);

/// The RMC grammar.
#[derive(Debug, Clone)]
pub struct Rmc {
    pattern: SentencePattern,
}

impl Rmc {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Rmc {
            pattern: SentencePattern::new(PATTERN)?,
        })
    }
}

impl Sentence for Rmc {
    type Reading = PositionReading;

    fn kind(&self) -> &'static str {
        "RMC"
    }

    fn capture(&self, line: &str) -> Option<FieldMap> {
        self.pattern.capture(line)
    }

    fn decode(&self, fields: Option<&FieldMap>) -> PositionReading {
        let fields = match fields {
            Some(f) => f,
            None => return PositionReading::default(),
        };
        PositionReading {
            latitude: latitude(fields),
            longitude: longitude(fields),
            latitude_dm: latitude_dm(fields),
            longitude_dm: longitude_dm(fields),
            time: time(fields, ":"),
            date: date(fields, ""),
            speed: speed(fields),
        }
    }
}

/// Talker and sentence id, e.g. `GPRMC`.
pub fn sentence_id(fields: &FieldMap) -> Option<String> {
    Some(fields!(fields; SENTENCE).to_string())
}

/// `HH<sep>MM<sep>SS`, each part zero-padded to two digits.
pub fn time(fields: &FieldMap, sep: &str) -> Option<String> {
    let (h, m, s) = fields!(fields; HOUR, MINUTE, SECOND);
    Some(decode::join_padded(&[h, m, s], sep))
}

/// `DD<sep>MM<sep>YY`, each part zero-padded to two digits. The year is not
/// widened.
pub fn date(fields: &FieldMap, sep: &str) -> Option<String> {
    let (d, m, y) = fields!(fields; DAY, MONTH, YEAR);
    Some(decode::join_padded(&[d, m, y], sep))
}

/// Date and time, reading the year as a year in the 2000s.
pub fn date_time(fields: &FieldMap) -> Option<NaiveDateTime> {
    let (y, mo, d) = fields!(fields; YEAR, MONTH, DAY);
    let (h, mi, s) = fields!(fields; HOUR, MINUTE, SECOND);
    decode::date_time_2000s(y, mo, d, h, mi, s)
}

pub fn latitude(fields: &FieldMap) -> Option<String> {
    let (deg, min, dir) = fields!(fields; LAT_DEG, LAT_MIN, LAT_DIR);
    decode::decimal_degrees(deg, min, CardDir::latitude(dir)).map(decode::format_number)
}

pub fn longitude(fields: &FieldMap) -> Option<String> {
    let (deg, min, dir) = fields!(fields; LON_DEG, LON_MIN, LON_DIR);
    decode::decimal_degrees(deg, min, CardDir::longitude(dir)).map(decode::format_number)
}

pub fn latitude_dm(fields: &FieldMap) -> Option<String> {
    let (deg, min, dir) = fields!(fields; LAT_DEG, LAT_MIN, LAT_DIR);
    Some(format!("{} {} {}", deg, min, dir))
}

pub fn longitude_dm(fields: &FieldMap) -> Option<String> {
    let (deg, min, dir) = fields!(fields; LON_DEG, LON_MIN, LON_DIR);
    Some(format!("{} {} {}", deg, min, dir))
}

pub fn speed(fields: &FieldMap) -> Option<String> {
    Some(fields!(fields; SPEED).to_string())
}

/// Getters over the most recently matched RMC sentence. All of them are
/// `None` until a sentence matched and after a line failed to match.
impl SentenceParser<Rmc> {
    pub fn time(&self, sep: &str) -> Option<String> {
        self.fields().and_then(|f| time(f, sep))
    }

    pub fn date(&self, sep: &str) -> Option<String> {
        self.fields().and_then(|f| date(f, sep))
    }

    pub fn date_time(&self) -> Option<NaiveDateTime> {
        self.fields().and_then(date_time)
    }

    /// Decimal degrees, negative south of the equator.
    pub fn latitude(&self) -> Option<String> {
        self.fields().and_then(latitude)
    }

    /// Decimal degrees, negative west of Greenwich.
    pub fn longitude(&self) -> Option<String> {
        self.fields().and_then(longitude)
    }

    pub fn latitude_dm(&self) -> Option<String> {
        self.fields().and_then(latitude_dm)
    }

    pub fn longitude_dm(&self) -> Option<String> {
        self.fields().and_then(longitude_dm)
    }

    pub fn speed(&self) -> Option<String> {
        self.fields().and_then(speed)
    }

    pub fn sentence_id(&self) -> Option<String> {
        self.fields().and_then(sentence_id)
    }
}
