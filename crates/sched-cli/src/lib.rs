//! CLI library components for the schedule converter.

pub mod commands;
pub mod logging;
