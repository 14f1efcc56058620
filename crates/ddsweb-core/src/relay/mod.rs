//! Control relay: applies client events to a session and triggers `dds`

mod dispatcher;
mod protocol;

pub use dispatcher::Relay;
pub use protocol::{ClientEvent, CommandPayload, ServerEvent, Stat, StatusPayload};
