//! Energy-regulation recalculation and multi-signal recommendation
//! synthesis: the deterministic DPE chain (classifier, compliance
//! calendar, financial tables), the degradable external signals, and
//! the orchestrator joining them into one report.

pub mod classifier;
pub mod compliance;
pub mod domain;
pub mod financial;
pub mod orchestrator;
pub mod recalculation;
pub mod recommendation;
pub mod report;
pub mod scoring;
pub mod signals;

pub use domain::{DpeClass, EnergyConsumption, EnergyMixPolicy, InvalidInput, PropertyFacts};
pub use orchestrator::{DiagnosisOrchestrator, DiagnosisRequest, OrchestratorConfig};
pub use report::DiagnosisReport;

use classifier::ClassificationScale;
use compliance::RestrictionCalendar;
use financial::FinancialTables;
use recalculation::ConversionPolicy;
use recommendation::RecommendationConfig;
use scoring::ScoringConfig;
use serde::{Deserialize, Serialize};

/// Resolved configuration for one diagnosis pipeline. Every regulatory
/// table is data here; the pure functions never read ambient state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisConfig {
    pub conversion: ConversionPolicy,
    pub scale: ClassificationScale,
    pub calendar: RestrictionCalendar,
    pub financial: FinancialTables,
    pub scoring: ScoringConfig,
    pub recommendation: RecommendationConfig,
    pub orchestrator: OrchestratorConfig,
}

/// Failures of the diagnosis pipeline itself. Signal degradation is not
/// an error; it is disclosed inside the report instead.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("internal computation error: {0}")]
    Internal(String),
}

impl DiagnosisError {
    pub(crate) fn internal(fault: impl std::fmt::Display) -> Self {
        tracing::error!(%fault, "invariant violation inside the diagnosis pipeline");
        Self::Internal(fault.to_string())
    }
}
