use std::fmt;

use crate::signal::{LevelUnit, Mode, SignalConfig};

/// How `dds` is invoked, independent of the signal values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdsOptions {
    /// Path to the `dds` executable
    pub program: String,
    /// Pass `--brief` to suppress debug output
    pub brief: bool,
    /// Flag used for the power value
    pub level: LevelUnit,
}

impl Default for DdsOptions {
    fn default() -> Self {
        Self {
            program: "./dds".to_string(),
            brief: false,
            level: LevelUnit::Rel,
        }
    }
}

/// A ready-to-run `dds` command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdsCommand {
    program: String,
    args: Vec<String>,
    continuous: bool,
}

impl DdsCommand {
    /// Create a command from a program and its arguments
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            continuous: false,
        }
    }

    /// Build the command for `mode` from a signal snapshot
    ///
    /// rf: `--mode single-freq --freq F <level> P`
    /// fm: `--mode fmtone --freq F --tone T [--tone2 T2] <level> P`
    pub fn build(options: &DdsOptions, mode: Mode, signal: &SignalConfig) -> Self {
        let mut args = Vec::with_capacity(11);
        if options.brief {
            args.push("--brief".to_string());
        }
        args.push("--mode".to_string());
        args.push(mode.dds_name().to_string());
        args.push("--freq".to_string());
        args.push(signal.frequency.clone());

        if mode == Mode::Fm {
            args.push("--tone".to_string());
            args.push(signal.tone.clone());
            if let Some(ref tone2) = signal.tone2 {
                args.push("--tone2".to_string());
                args.push(tone2.clone());
            }
        }

        args.push(options.level.flag().to_string());
        args.push(signal.power.clone());

        Self {
            program: options.program.clone(),
            args,
            // fmtone with an alternate tone keeps switching tones until killed
            continuous: mode == Mode::Fm && signal.tone2.is_some(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Whether `dds` keeps running instead of exiting once the board is set
    pub fn is_continuous(&self) -> bool {
        self.continuous
    }
}

impl fmt::Display for DdsCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
