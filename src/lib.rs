//! ddsweb - browser front end for a DDS signal generator
//!
//! Serves a single control page and relays commands from connected
//! browsers to the `dds` program.

pub mod config;
pub mod web;
