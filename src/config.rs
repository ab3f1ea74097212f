//! TOML description of the instruments to read from.
//!
//! ```toml
//! [[connection]]
//! name = "gps"
//! kind = "rmc"
//! port = "/dev/ttyUSB0"
//! baud_rate = 4800
//! ```
//!
//! Every other key is optional and falls back to the defaults of the
//! connection's kind.

use serde::Deserialize;
use serialport::{DataBits, Parity, StopBits};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use toml;

use columns::Columns;
use connection::{Connection, FailurePolicy};
use err::ConfigError;
use reader::{LineReader, Terminator};
use sentence::Sentence;
use transport::{SerialSettings, SerialTransport, Transport};

/// All configured connections.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(rename = "connection", default)]
    pub connections: Vec<ConnectionConfig>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Config::parse(&content)
    }

    /// Parse and validate a configuration document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for conn in &self.connections {
            if !names.insert(conn.name.as_str()) {
                return Err(invalid(conn, "duplicate connection name"));
            }
            conn.validate()?;
        }
        Ok(())
    }
}

/// Instrument family, which selects the grammar and the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// NMEA RMC position fixes.
    Rmc,
    /// NMEA DBS depth below surface.
    Dbs,
    /// CTD real-time output: columns, closed on timeout, input flushed
    /// before every cycle.
    Ctd,
    /// Thermosalinograph output: columns, input flushed before every cycle.
    Tsg,
    /// Any other whitespace separated feed.
    Columns,
}

impl Kind {
    pub fn default_timeout(self) -> Duration {
        match self {
            Kind::Rmc => Duration::from_secs(2),
            Kind::Dbs => Duration::from_secs(3),
            Kind::Ctd | Kind::Tsg | Kind::Columns => Duration::from_secs(5),
        }
    }

    pub fn default_on_timeout(self) -> FailurePolicy {
        match self {
            Kind::Dbs | Kind::Ctd => FailurePolicy::Close,
            Kind::Rmc | Kind::Tsg | Kind::Columns => FailurePolicy::KeepOpen,
        }
    }

    pub fn default_reset_input(self) -> bool {
        match self {
            Kind::Ctd | Kind::Tsg => true,
            Kind::Rmc | Kind::Dbs | Kind::Columns => false,
        }
    }

    /// Whether lines are split into configured columns.
    pub fn is_columnar(self) -> bool {
        match self {
            Kind::Ctd | Kind::Tsg | Kind::Columns => true,
            Kind::Rmc | Kind::Dbs => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParityConfig {
    None,
    Odd,
    Even,
}

impl Default for ParityConfig {
    fn default() -> Self {
        ParityConfig::None
    }
}

impl From<ParityConfig> for Parity {
    fn from(p: ParityConfig) -> Parity {
        match p {
            ParityConfig::None => Parity::None,
            ParityConfig::Odd => Parity::Odd,
            ParityConfig::Even => Parity::Even,
        }
    }
}

fn default_data_bits() -> u8 {
    8
}

fn default_stop_bits() -> u8 {
    1
}

fn default_interval_ms() -> u64 {
    50
}

fn default_terminator() -> String {
    "\n".to_string()
}

/// One `[[connection]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    pub name: String,
    pub kind: Kind,
    pub port: String,
    pub baud_rate: u32,
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    #[serde(default)]
    pub parity: ParityConfig,
    /// Seconds to wait for a byte; `0` polls.
    pub timeout_secs: Option<f64>,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_terminator")]
    pub terminator: String,
    pub max_size: Option<usize>,
    pub on_timeout: Option<FailurePolicy>,
    pub on_transport_error: Option<FailurePolicy>,
    /// Column names for columnar kinds; only the first word of each is used.
    #[serde(default)]
    pub columns: Vec<String>,
    pub reset_input: Option<bool>,
}

fn invalid(conn: &ConnectionConfig, msg: &'static str) -> ConfigError {
    ConfigError::InvalidValue(conn.name.clone(), msg)
}

impl ConnectionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(invalid(self, "name must not be empty"));
        }
        if self.port.trim().is_empty() {
            return Err(invalid(self, "port must not be empty"));
        }
        if self.baud_rate == 0 {
            return Err(invalid(self, "baud_rate must be positive"));
        }
        self.serial_settings()?;
        self.timeout()?;
        self.line_reader()?;
        if self.kind.is_columnar() {
            self.column_layout()?;
        } else if !self.columns.is_empty() {
            return Err(invalid(self, "columns only apply to columnar kinds"));
        }
        Ok(())
    }

    pub fn serial_settings(&self) -> Result<SerialSettings, ConfigError> {
        let data_bits = match self.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            _ => return Err(invalid(self, "data_bits must be between 5 and 8")),
        };
        let stop_bits = match self.stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            _ => return Err(invalid(self, "stop_bits must be 1 or 2")),
        };
        Ok(SerialSettings {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            data_bits,
            parity: self.parity.into(),
            stop_bits,
        })
    }

    /// Per-read timeout; the kind's default when not configured.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        match self.timeout_secs {
            None => Ok(self.kind.default_timeout()),
            Some(secs) if secs.is_finite() && secs >= 0.0 => {
                Duration::try_from_secs_f64(secs).map_err(|_| invalid(self, "timeout_secs out of range"))
            }
            Some(_) => Err(invalid(self, "timeout_secs must be a non-negative number")),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn line_reader(&self) -> Result<LineReader, ConfigError> {
        let terminator = Terminator::new(self.terminator.as_bytes())?;
        Ok(LineReader::new(terminator, self.max_size)?)
    }

    pub fn on_timeout_policy(&self) -> FailurePolicy {
        self.on_timeout.unwrap_or_else(|| self.kind.default_on_timeout())
    }

    pub fn on_transport_error_policy(&self) -> FailurePolicy {
        self.on_transport_error.unwrap_or_default()
    }

    pub fn resets_input(&self) -> bool {
        self.reset_input.unwrap_or_else(|| self.kind.default_reset_input())
    }

    pub fn column_layout(&self) -> Result<Columns, ConfigError> {
        Ok(Columns::new(&self.columns)?)
    }

    /// The serial transport described by this table. It is not opened yet.
    pub fn transport(&self) -> Result<SerialTransport, ConfigError> {
        Ok(SerialTransport::new(self.serial_settings()?, Some(self.timeout()?)))
    }

    /// A connection over `transport` with the configured framing and
    /// policies.
    pub fn connection<T: Transport, S: Sentence>(
        &self,
        transport: T,
        sentence: S,
    ) -> Result<Connection<T, S>, ConfigError> {
        Ok(Connection::new(&self.name, transport, sentence)
            .with_reader(self.line_reader()?)
            .on_timeout(self.on_timeout_policy())
            .on_transport_error(self.on_transport_error_policy())
            .reset_input(self.resets_input()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use err::PatternError;

    const FULL: &str = r#"
        [[connection]]
        name = "gps"
        kind = "rmc"
        port = "/dev/ttyUSB0"
        baud_rate = 4800

        [[connection]]
        name = "sounder"
        kind = "dbs"
        port = "COM4"
        baud_rate = 9600
        parity = "even"
        data_bits = 7
        stop_bits = 2
        timeout_secs = 0.5
        terminator = "\r\n"
        max_size = 256
        on_timeout = "keep_open"
        on_transport_error = "close"

        [[connection]]
        name = "ctd"
        kind = "ctd"
        port = "/dev/ttyS1"
        baud_rate = 19200
        columns = ["Scan", "Pres [db]", "Temp [ITS-90]"]
    "#;

    #[test]
    fn parses_and_applies_defaults() {
        let config = Config::parse(FULL).unwrap();
        assert_eq!(config.connections.len(), 3);

        let gps = &config.connections[0];
        assert_eq!(gps.kind, Kind::Rmc);
        assert_eq!(gps.timeout().unwrap(), Duration::from_secs(2));
        assert_eq!(gps.interval(), Duration::from_millis(50));
        assert_eq!(gps.on_timeout_policy(), FailurePolicy::KeepOpen);
        assert_eq!(gps.on_transport_error_policy(), FailurePolicy::KeepOpen);
        assert!(!gps.resets_input());
        let settings = gps.serial_settings().unwrap();
        assert_eq!(settings, SerialSettings::new("/dev/ttyUSB0", 4800));
        assert_eq!(gps.line_reader().unwrap().terminator().as_bytes(), b"\n");
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::parse(FULL).unwrap();
        let sounder = &config.connections[1];
        assert_eq!(sounder.timeout().unwrap(), Duration::from_millis(500));
        assert_eq!(sounder.on_timeout_policy(), FailurePolicy::KeepOpen);
        assert_eq!(sounder.on_transport_error_policy(), FailurePolicy::Close);
        let settings = sounder.serial_settings().unwrap();
        assert_eq!(settings.parity, Parity::Even);
        assert_eq!(settings.data_bits, DataBits::Seven);
        assert_eq!(settings.stop_bits, StopBits::Two);
        let reader = sounder.line_reader().unwrap();
        assert_eq!(reader.terminator().as_bytes(), b"\r\n");
        assert_eq!(reader.max_size(), Some(256));
    }

    #[test]
    fn ctd_preset() {
        let config = Config::parse(FULL).unwrap();
        let ctd = &config.connections[2];
        assert_eq!(ctd.timeout().unwrap(), Duration::from_secs(5));
        assert_eq!(ctd.on_timeout_policy(), FailurePolicy::Close);
        assert!(ctd.resets_input());
        assert_eq!(ctd.column_layout().unwrap().names(), &["Scan", "Pres", "Temp"]);
    }

    #[test]
    fn zero_timeout_polls() {
        let config = Config::parse(
            r#"
            [[connection]]
            name = "tsg"
            kind = "tsg"
            port = "/dev/ttyS2"
            baud_rate = 9600
            timeout_secs = 0
            columns = ["Temp", "Cond"]
            "#,
        )
        .unwrap();
        assert_eq!(config.connections[0].timeout().unwrap(), Duration::from_secs(0));
        assert_eq!(config.connections[0].on_timeout_policy(), FailurePolicy::KeepOpen);
    }

    #[test]
    fn very_long_timeout_reads_normally() {
        use transport::ReplayTransport;

        let config = Config::parse(&single("timeout_secs = 1e19")).unwrap();
        let timeout = config.connections[0].timeout().unwrap();
        let mut t = ReplayTransport::new().with_timeout(Some(timeout)).feed(b"abc\n");
        let line = config.connections[0].line_reader().unwrap().read_line(&mut t).unwrap();
        assert_eq!(line.content(), b"abc");
    }

    #[test]
    fn empty_document_has_no_connections() {
        assert!(Config::parse("").unwrap().connections.is_empty());
    }

    fn single(extra: &str) -> String {
        format!(
            "[[connection]]\nname = \"x\"\nkind = \"rmc\"\nport = \"COM1\"\nbaud_rate = 4800\n{}",
            extra
        )
    }

    #[test]
    fn rejects_invalid_values() {
        assert_matches!(
            Config::parse(&single("data_bits = 9")),
            Err(ConfigError::InvalidValue(_, "data_bits must be between 5 and 8"))
        );
        assert_matches!(
            Config::parse(&single("stop_bits = 3")),
            Err(ConfigError::InvalidValue(_, "stop_bits must be 1 or 2"))
        );
        assert_matches!(
            Config::parse(&single("timeout_secs = -1.0")),
            Err(ConfigError::InvalidValue(_, "timeout_secs must be a non-negative number"))
        );
        assert_matches!(
            Config::parse(&single("timeout_secs = 1e30")),
            Err(ConfigError::InvalidValue(_, "timeout_secs out of range"))
        );
        assert_matches!(
            Config::parse(&single("columns = [\"a\"]")),
            Err(ConfigError::InvalidValue(_, "columns only apply to columnar kinds"))
        );
        assert_matches!(Config::parse(&single("terminator = \"\"")), Err(ConfigError::Framing(_)));
        assert_matches!(Config::parse(&single("max_size = 0")), Err(ConfigError::Framing(_)));
        assert_matches!(Config::parse(&single("parity = \"mark\"")), Err(ConfigError::Toml(_)));
        assert_matches!(Config::parse(&single("bogus = 1")), Err(ConfigError::Toml(_)));
    }

    #[test]
    fn columnar_kinds_need_columns() {
        let doc = "[[connection]]\nname = \"c\"\nkind = \"columns\"\nport = \"COM1\"\nbaud_rate = 9600\n";
        assert_matches!(Config::parse(doc), Err(ConfigError::Pattern(_)));
    }

    #[test]
    fn columns_sharing_a_first_word_are_rejected() {
        let doc = "[[connection]]\nname = \"t\"\nkind = \"tsg\"\nport = \"COM1\"\nbaud_rate = 9600\n\
                   columns = [\"Temp [ITS-90]\", \"Temp [IPTS-68]\"]\n";
        assert_matches!(
            Config::parse(doc),
            Err(ConfigError::Pattern(PatternError::DuplicateColumn(1)))
        );
    }

    #[test]
    fn duplicate_names() {
        let doc = format!("{}\n{}", single(""), single(""));
        assert_matches!(
            Config::parse(&doc),
            Err(ConfigError::InvalidValue(ref name, "duplicate connection name")) if name == "x"
        );
    }

    #[test]
    fn builds_connection() {
        use rmc::Rmc;
        use transport::ReplayTransport;

        let config = Config::parse(&single("terminator = \"\\r\\n\"")).unwrap();
        let mut conn = config.connections[0]
            .connection(
                ReplayTransport::new().feed(b"$GPRMC,090503,A,3430.0000,S,05830.0000,W,000.0,000.0,050124,,*1F\r\n"),
                Rmc::new().unwrap(),
            )
            .unwrap();
        assert_eq!(conn.name(), "x");
        assert_eq!(conn.read_one_cycle().unwrap().date, Some("050124".to_string()));
    }
}
