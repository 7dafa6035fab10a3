//! Diagnosis engine for French energy-performance (DPE) recalculation
//! under the January 2026 conversion-factor decree, combined with a
//! multi-signal investment recommendation synthesizer.

pub mod collaborators;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod telemetry;
