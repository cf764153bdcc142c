//! Schedule conversion pipeline.
//!
//! [`ScheduleConverter`] parses a schedule, settles its column mapping through
//! the tiered decision stages of `sched-map`, and serializes the rows with
//! `sched-output`.

pub mod config;
pub mod converter;
pub mod error;
pub mod request;
pub mod result;

pub use config::ConverterConfig;
pub use converter::{Decision, ScheduleConverter};
pub use error::{ConvertError, Result};
pub use request::ConvertRequest;
pub use result::{ConversionResult, DecidedBy, StructureReport};
