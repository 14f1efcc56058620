//! Web server module for browser control of the signal generator
//!
//! Serves the control page on every path and a WebSocket channel at
//! [`SOCKET_PATH`] that carries relay events.

mod page;
mod server;
mod socket;

pub use page::PAGE_ERROR;
pub use server::WebServer;
pub use socket::SOCKET_PATH;
