//! Chat view layer: controller, notifications, formatting, CLI runner.

pub mod controller;
pub mod formatter;
pub mod notify;
pub mod runner;
