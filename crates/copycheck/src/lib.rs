//! Copywriting analysis: score a text against ten criteria with a language model and
//! deliver the resulting report.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
