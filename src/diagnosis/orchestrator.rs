use super::recalculation::{RecalculationEngine, RecalculationInput};
use super::recommendation::RecommendationSynthesizer;
use super::report::DiagnosisReport;
use super::scoring::SignalAggregator;
use super::signals::{
    CollaboratorError, DegradedReason, MarketForecaster, Signal, SignalKind, SignalSet,
    ValuationModel, VisionAnalyzer,
};
use super::{DiagnosisConfig, DiagnosisError};
use crate::diagnosis::domain::{DpeClass, EnergyConsumption, EnergyMixPolicy, PropertyFacts};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::warn;

/// Timeout policy for the external signal branches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Independent budget per collaborator call.
    pub signal_timeout: Duration,
    /// Hard ceiling for the whole fan-out; per-call deadlines are
    /// clamped to it.
    pub overall_budget: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            signal_timeout: Duration::from_secs(10),
            overall_budget: Duration::from_secs(30),
        }
    }
}

/// One diagnosis request as received from the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    pub property: PropertyFacts,
    pub consumption: EnergyConsumption,
    pub energy_mix: EnergyMixPolicy,
    #[serde(default)]
    pub original_classification: Option<DpeClass>,
    #[serde(default)]
    pub original_intensity: Option<f64>,
    /// Reference date for compliance deadlines; defaults to today.
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// Sequences the deterministic recalculation chain alongside the three
/// concurrent collaborator calls and joins everything into one report.
///
/// The deterministic branch is pure and cheap, so it runs inline; only
/// the collaborator calls suspend. Dropping the returned future cancels
/// any in-flight collaborator calls.
pub struct DiagnosisOrchestrator<V, M, F> {
    vision: Arc<V>,
    valuation: Arc<M>,
    forecaster: Arc<F>,
    engine: RecalculationEngine,
    aggregator: SignalAggregator,
    synthesizer: RecommendationSynthesizer,
    timeouts: OrchestratorConfig,
}

impl<V, M, F> DiagnosisOrchestrator<V, M, F>
where
    V: VisionAnalyzer,
    M: ValuationModel,
    F: MarketForecaster,
{
    pub fn new(
        config: DiagnosisConfig,
        vision: Arc<V>,
        valuation: Arc<M>,
        forecaster: Arc<F>,
    ) -> Result<Self, DiagnosisError> {
        let DiagnosisConfig {
            conversion,
            scale,
            calendar,
            financial,
            scoring,
            recommendation,
            orchestrator,
        } = config;

        let engine = RecalculationEngine::new(conversion, scale, calendar, financial)?;

        Ok(Self {
            vision,
            valuation,
            forecaster,
            engine,
            aggregator: SignalAggregator::new(scoring),
            synthesizer: RecommendationSynthesizer::new(recommendation),
            timeouts: orchestrator,
        })
    }

    pub async fn diagnose(
        &self,
        request: &DiagnosisRequest,
    ) -> Result<DiagnosisReport, DiagnosisError> {
        let today = request
            .today
            .unwrap_or_else(|| Local::now().date_naive());

        // Deterministic chain first: invalid input fails fast, before
        // any collaborator is contacted.
        let recalculation = self.engine.recalculate(
            &RecalculationInput {
                consumption: request.consumption,
                energy_mix: request.energy_mix.clone(),
                surface_m2: request.property.surface_m2,
                original_classification: request.original_classification,
                original_intensity: request.original_intensity,
            },
            today,
        )?;

        let deadline = Instant::now() + self.timeouts.overall_budget;
        let per_call = self.timeouts.signal_timeout;
        let property = &request.property;

        let (visual, value, forecast) = tokio::join!(
            resolve_signal(
                SignalKind::Visual,
                per_call,
                deadline,
                self.vision.assess(property)
            ),
            resolve_signal(
                SignalKind::Value,
                per_call,
                deadline,
                self.valuation.estimate(property)
            ),
            resolve_signal(
                SignalKind::Forecast,
                per_call,
                deadline,
                self.forecaster.forecast(property)
            ),
        );

        let signals = SignalSet {
            recalculation,
            visual,
            value,
            forecast,
        };

        if signals.all_degraded() {
            warn!(
                address = %request.property.address,
                "all external signals unavailable; serving energy-only scoring"
            );
        }

        let scores = self.aggregator.aggregate(&signals);
        let recommendation = self.synthesizer.synthesize(&scores, &signals);

        Ok(DiagnosisReport::assemble(&signals, &recommendation))
    }
}

async fn resolve_signal<T, Fut>(
    kind: SignalKind,
    per_call: Duration,
    overall_deadline: Instant,
    call: Fut,
) -> Signal<T>
where
    Fut: Future<Output = Result<T, CollaboratorError>>,
{
    let cutoff = cmp::min(Instant::now() + per_call, overall_deadline);
    match timeout_at(cutoff, call).await {
        Ok(Ok(value)) => Signal::Present(value),
        Ok(Err(CollaboratorError::Unavailable(reason))) => {
            warn!(signal = %kind, %reason, "signal degraded: collaborator unavailable");
            Signal::Degraded(DegradedReason::Unavailable)
        }
        Ok(Err(CollaboratorError::Upstream(reason))) => {
            warn!(signal = %kind, %reason, "signal degraded by upstream failure");
            Signal::Degraded(DegradedReason::Upstream(reason))
        }
        Err(_) => {
            warn!(signal = %kind, "signal degraded by timeout");
            Signal::Degraded(DegradedReason::TimedOut)
        }
    }
}
