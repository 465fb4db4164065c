//! Run configuration contracts shared across crates.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{HarnessError, SensorName};

/// Immutable configuration for one simulation run
///
/// Parsed once at startup (from a config file, CLI flags, or both) and shared
/// read-only with every worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Destination descriptor, e.g. `gsapi://bucket/prefix`
    pub destination: String,

    /// Local wall-clock baseline for exposure zero
    pub starttime: StartTime,

    /// Exposures per sensor
    pub numexp: u32,

    /// Sensor selection
    #[serde(default)]
    pub sensors: SensorSelection,

    /// Seconds between exposure due times
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Explicit source image; bypasses the `inputdir` search
    #[serde(default)]
    pub inputfile: Option<PathBuf>,

    /// Root searched for per-sensor source images
    #[serde(default = "default_inputdir")]
    pub inputdir: PathBuf,

    /// Scratch root under which each worker creates its staging directory
    #[serde(default = "default_tempdir")]
    pub tempdir: PathBuf,

    /// Staging-time compression, `None` to stage verbatim copies
    #[serde(default)]
    pub compress: Option<Compression>,

    /// Camera family tag embedded in staged file names
    #[serde(default = "default_camera")]
    pub camera: String,

    /// Route object-store traffic over the private interconnect
    #[serde(default)]
    pub private: bool,
}

impl RunConfig {
    /// Minimal configuration with the documented defaults for everything
    /// optional.
    pub fn new(destination: impl Into<String>, starttime: StartTime, numexp: u32) -> Self {
        Self {
            destination: destination.into(),
            starttime,
            numexp,
            sensors: SensorSelection::default(),
            interval: default_interval(),
            inputfile: None,
            inputdir: default_inputdir(),
            tempdir: default_tempdir(),
            compress: None,
            camera: default_camera(),
            private: false,
        }
    }
}

fn default_interval() -> u64 {
    17
}

fn default_inputdir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_tempdir() -> PathBuf {
    std::env::temp_dir()
}

fn default_camera() -> String {
    "MC".to_string()
}

/// How the sensor identities for a run are chosen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SensorSelection {
    /// Explicit sensor names, one worker each
    Names(Vec<SensorName>),
    /// N homogeneous sensors, named `<node>-<index>`
    Count(u32),
}

impl Default for SensorSelection {
    fn default() -> Self {
        Self::Count(1)
    }
}

impl SensorSelection {
    /// Materialize the worker sensor names.
    ///
    /// `node` seeds the derived names for count-based selection so two hosts
    /// in the same fleet produce distinct output files.
    pub fn resolve(&self, node: u32) -> Vec<SensorName> {
        match self {
            Self::Names(names) => names.clone(),
            Self::Count(n) => (0..*n)
                .map(|i| SensorName::from(format!("{node}-{i}")))
                .collect(),
        }
    }

    /// Number of workers this selection will spawn.
    pub fn len(&self) -> usize {
        match self {
            Self::Names(names) => names.len(),
            Self::Count(n) => *n as usize,
        }
    }

    /// True when the selection names no sensor at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Local wall-clock start time, parsed from `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTime {
    pub hour: u8,
    pub minute: u8,
}

impl StartTime {
    /// Sequence number for exposure `index`.
    ///
    /// `"14:05"` with index 3 yields `(14 * 100 + 5) * 10 + 3 = 14053`.
    pub fn sequence_number(&self, index: u32) -> u32 {
        (self.hour as u32 * 100 + self.minute as u32) * 10 + index
    }
}

impl FromStr for StartTime {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s.split_once(':').ok_or_else(|| {
            HarnessError::config_validation("starttime", format!("expected HH:MM, got '{s}'"))
        })?;
        let hour: u8 = h.parse().map_err(|_| {
            HarnessError::config_validation("starttime", format!("invalid hour '{h}'"))
        })?;
        let minute: u8 = m.parse().map_err(|_| {
            HarnessError::config_validation("starttime", format!("invalid minute '{m}'"))
        })?;
        if hour > 23 {
            return Err(HarnessError::config_validation(
                "starttime",
                format!("hour {hour} out of range"),
            ));
        }
        if minute > 59 {
            return Err(HarnessError::config_validation(
                "starttime",
                format!("minute {minute} out of range"),
            ));
        }
        Ok(Self { hour, minute })
    }
}

impl fmt::Display for StartTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for StartTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for StartTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Staging-time compression strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// In-process gzip, staged as `.fits.gz`
    Gzip,
    /// External astronomy packer (`fpack`), staged as `.fits.fz`
    Fpack,
}

impl Compression {
    /// Extension of the staged artifact, replacing `.fits`.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => "fits.gz",
            Self::Fpack => "fits.fz",
        }
    }
}

impl FromStr for Compression {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gzip" => Ok(Self::Gzip),
            "fpack" => Ok(Self::Fpack),
            other => Err(HarnessError::config_validation(
                "compress",
                format!("unknown compressor '{other}'"),
            )),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gzip => write!(f, "gzip"),
            Self::Fpack => write!(f, "fpack"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_time_parse() {
        let t: StartTime = "14:05".parse().unwrap();
        assert_eq!(t.hour, 14);
        assert_eq!(t.minute, 5);
        assert_eq!(t.to_string(), "14:05");
    }

    #[test]
    fn test_start_time_rejects_garbage() {
        assert!("1405".parse::<StartTime>().is_err());
        assert!("25:00".parse::<StartTime>().is_err());
        assert!("12:60".parse::<StartTime>().is_err());
        assert!("aa:bb".parse::<StartTime>().is_err());
    }

    #[test]
    fn test_sequence_number() {
        let t: StartTime = "14:05".parse().unwrap();
        assert_eq!(t.sequence_number(3), 14053);
        assert_eq!(t.sequence_number(0), 14050);

        let midnight: StartTime = "00:00".parse().unwrap();
        assert_eq!(midnight.sequence_number(0), 0);
        assert_eq!(midnight.sequence_number(1), 1);
    }

    #[test]
    fn test_sensor_selection_resolve() {
        let count = SensorSelection::Count(2);
        let names = count.resolve(12);
        assert_eq!(names, vec!["12-0".into(), "12-1".into()] as Vec<SensorName>);

        let explicit = SensorSelection::Names(vec!["R22_S11".into(), "S00".into()]);
        assert_eq!(
            explicit.resolve(99),
            vec!["R22_S11".into(), "S00".into()] as Vec<SensorName>
        );
    }

    #[test]
    fn test_selection_default_is_single_sensor() {
        let selection = SensorSelection::default();
        assert_eq!(selection.resolve(7), vec!["7-0".into()] as Vec<SensorName>);
    }

    #[test]
    fn test_config_defaults() {
        let json = r#"{
            "destination": "gsapi://bucket/prefix",
            "starttime": "14:05",
            "numexp": 10
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.interval, 17);
        assert_eq!(config.camera, "MC");
        assert_eq!(config.sensors.len(), 1);
        assert!(config.compress.is_none());
        assert!(!config.private);
    }

    #[test]
    fn test_config_sensor_list_from_json() {
        let json = r#"{
            "destination": "scp://host/export",
            "starttime": "02:30",
            "numexp": 5,
            "sensors": ["R22_S11", "R22_S12"],
            "compress": "fpack"
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sensors.len(), 2);
        assert_eq!(config.compress, Some(Compression::Fpack));
    }
}
