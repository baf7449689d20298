use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Total order over severities, from most to least verbose.
///
/// `Off` is special: it is greater than every real level, so comparing a
/// record's level against `Off` never passes, and an override of `Off`
/// silences a module entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Most verbose, lowest severity.
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    /// Greater than every real level. Disables output for whatever it is
    /// compared against.
    Off,
}

impl Level {
    /// All real levels, lowest to highest severity. Does not include `Off`.
    pub const ALL: [Level; 5] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
    ];

    fn ordinal(self) -> u8 {
        match self {
            Level::Trace => 0,
            Level::Debug => 1,
            Level::Info => 2,
            Level::Warning => 3,
            Level::Error => 4,
            Level::Off => 5,
        }
    }

    /// Short fixed-width token used by the `{level}` format token.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal().cmp(&other.ordinal())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by [`Level::from_str`] for an unrecognized severity name.
#[derive(Debug, Clone)]
pub struct ParseLevelError(String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a valid level: {:?}", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Level::Trace),
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARNING" | "WARN" => Ok(Level::Warning),
            "ERROR" | "SEVERE" => Ok(Level::Error),
            "OFF" => Ok(Level::Off),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}
