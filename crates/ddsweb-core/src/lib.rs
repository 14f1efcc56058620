//! Core library for ddsweb
//!
//! Holds everything between the socket and the `dds` program: the signal
//! configuration a client edits, how that configuration is scoped across
//! connections, the event wire format, and the invocation of `dds` itself.

pub mod dds;
pub mod error;
pub mod relay;
pub mod session;
pub mod signal;

pub use error::RelayError;
