use serde::{Deserialize, Serialize};

/// Signal parameters a client edits before triggering a mode
///
/// Values are kept exactly as received from the client. The `dds` program
/// is the only place they are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Carrier frequency in Hz
    #[serde(default = "default_frequency")]
    pub frequency: String,

    /// Modulating tone in Hz (fm mode only)
    #[serde(default = "default_tone")]
    pub tone: String,

    /// Alternate tone in Hz; when set, fm mode alternates between both tones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone2: Option<String>,

    /// Output level in dB
    #[serde(default = "default_power")]
    pub power: String,
}

fn default_frequency() -> String {
    "0.0".to_string()
}

fn default_tone() -> String {
    "0.0".to_string()
}

fn default_power() -> String {
    "-100.0".to_string()
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            tone: default_tone(),
            tone2: None,
            power: default_power(),
        }
    }
}

impl SignalConfig {
    /// Set the alternate tone; an empty value clears it
    pub fn set_tone2(&mut self, value: String) {
        self.tone2 = if value.is_empty() { None } else { Some(value) };
    }
}

/// Output mode requested by a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Single continuous frequency
    Rf,
    /// Frequency-modulated tone
    Fm,
}

impl Mode {
    /// Parse a trigger command; unknown commands yield `None`
    pub fn parse(command: &str) -> Option<Self> {
        match command {
            "rf" => Some(Mode::Rf),
            "fm" => Some(Mode::Fm),
            _ => None,
        }
    }

    /// Value passed to `dds --mode`
    pub fn dds_name(&self) -> &'static str {
        match self {
            Mode::Rf => "single-freq",
            Mode::Fm => "fmtone",
        }
    }
}

/// How the power value is interpreted by `dds`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelUnit {
    /// Relative to maximum output (0.0 is max)
    #[default]
    Rel,
    /// Absolute level in dBm
    Dbm,
}

impl LevelUnit {
    /// Command line flag carrying the power value
    pub fn flag(&self) -> &'static str {
        match self {
            LevelUnit::Rel => "--rel-level",
            LevelUnit::Dbm => "--dbm-level",
        }
    }
}
