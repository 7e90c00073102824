//! Shared library for the SimpleChat client.
//!
//! Holds the WebSocket wire protocol types plus the logging and clock
//! utilities used by the client crate.

pub mod logger;
pub mod protocol;
pub mod time;
