//! Chat client library.
//!
//! Splits the client into a realtime connection layer ([`connection`]),
//! a REST channel directory ([`directory`]), timeline assembly
//! ([`timeline`]), and the terminal view ([`app`]). The connection layer
//! owns lifecycle and frame dispatch; everything channel- and
//! view-specific sits above it.

pub mod app;
pub mod connection;
pub mod directory;
pub mod session;
pub mod timeline;
