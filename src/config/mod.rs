mod settings;

pub use settings::{Config, DdsSettings, ScopeArg, SessionSettings, Settings, WebSettings};
