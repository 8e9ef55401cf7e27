use std::fmt;
use std::io;

/// Error type shared by the bill engine
#[derive(Debug)]
pub enum WattlyticsError {
    /// File I/O error
    Io(io::Error),
    /// Invalid tariff or settings. Must be fixed before any bill is computed.
    Configuration { message: String },
    /// Rejected manual entry; the history is left as it was
    Validation { field: String, message: String },
    /// Unreadable tabular input
    Parse { line: Option<usize>, message: String },
    /// Analysis requested on a history that is too small
    InsufficientData { required: usize, available: usize },
    /// CSV reader/writer failure
    Csv(csv::Error),
    /// Settings file failure
    Yaml(serde_yaml::Error),
    /// JSON serialization failure
    Json(serde_json::Error),
}

impl fmt::Display for WattlyticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WattlyticsError::Io(err) => write!(f, "I/O error: {}", err),
            WattlyticsError::Configuration { message } => {
                write!(f, "Configuration error: {}", message)
            }
            WattlyticsError::Validation { field, message } => {
                write!(f, "Validation error in field '{}': {}", field, message)
            }
            WattlyticsError::Parse {
                line: Some(line),
                message,
            } => write!(f, "Parse error at line {}: {}", line, message),
            WattlyticsError::Parse {
                line: None,
                message,
            } => write!(f, "Parse error: {}", message),
            WattlyticsError::InsufficientData {
                required,
                available,
            } => write!(
                f,
                "Insufficient data: need at least {} bill record(s), have {}",
                required, available
            ),
            WattlyticsError::Csv(err) => write!(f, "CSV error: {}", err),
            WattlyticsError::Yaml(err) => write!(f, "Settings file error: {}", err),
            WattlyticsError::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for WattlyticsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WattlyticsError::Io(err) => Some(err),
            WattlyticsError::Csv(err) => Some(err),
            WattlyticsError::Yaml(err) => Some(err),
            WattlyticsError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for WattlyticsError {
    fn from(err: io::Error) -> Self {
        WattlyticsError::Io(err)
    }
}

impl From<csv::Error> for WattlyticsError {
    fn from(err: csv::Error) -> Self {
        WattlyticsError::Csv(err)
    }
}

impl From<serde_yaml::Error> for WattlyticsError {
    fn from(err: serde_yaml::Error) -> Self {
        WattlyticsError::Yaml(err)
    }
}

impl From<serde_json::Error> for WattlyticsError {
    fn from(err: serde_json::Error) -> Self {
        WattlyticsError::Json(err)
    }
}

pub type Result<T> = std::result::Result<T, WattlyticsError>;

impl WattlyticsError {
    pub fn config_error(message: &str) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    pub fn validation_error(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn parse_error(line: Option<usize>, message: &str) -> Self {
        Self::Parse {
            line,
            message: message.to_string(),
        }
    }

    pub fn insufficient_data(required: usize, available: usize) -> Self {
        Self::InsufficientData {
            required,
            available,
        }
    }

    /// Longer message with a hint on how to recover
    pub fn detailed_message(&self) -> String {
        match self {
            WattlyticsError::Configuration { message } => format!(
                "Invalid tariff or settings: {}\nFix the slab table (ascending, contiguous, non-negative rates, last slab unbounded) before computing bills.",
                message
            ),
            WattlyticsError::InsufficientData { .. } => format!(
                "{}\nAdd bills with --entry, load a CSV with --file, or try --sample.",
                self
            ),
            WattlyticsError::Parse { .. } => format!(
                "{}\nExpected a CSV header of: month,units,amount",
                self
            ),
            _ => self.to_string(),
        }
    }
}
