mod types;

pub use types::{LevelUnit, Mode, SignalConfig};
