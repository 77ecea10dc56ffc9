//! QMaker: Weighted Exam Question Generation
//!
//! Plans how many questions each syllabus topic receives from its weightage, then
//! drives an external question generator slot by slot with pacing, retries and
//! pause / resume / stop control.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod telemetry;
pub mod types;
