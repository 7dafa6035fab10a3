use super::domain::PropertyFacts;
use super::recalculation::RecalculationResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Output of the image-based visual-condition analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualConditionReport {
    /// 0-100, higher means better visible energy condition.
    pub energy_efficiency_score: f64,
    #[serde(default)]
    pub detected_features: BTreeMap<String, String>,
    #[serde(default)]
    pub thermal_risks: Vec<String>,
}

/// Output of the statistical value-estimation model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueEstimate {
    pub market_value_eur: f64,
    /// 0-100, higher means more undervalued relative to comparables.
    pub undervalued_score: f64,
}

/// Output of the time-series market forecaster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendForecast {
    pub forecast_3years_eur: f64,
    pub growth_percentage_3y: f64,
}

/// Why a signal fell back to its documented substitute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    Unavailable,
    TimedOut,
    Upstream(String),
}

/// An external signal is either present or explicitly degraded; no
/// sentinel values stand in for missing data.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<T> {
    Present(T),
    Degraded(DegradedReason),
}

impl<T> Signal<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Signal::Present(value) => Some(value),
            Signal::Degraded(_) => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Signal::Degraded(_))
    }
}

/// Identifies one of the three external signal branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Visual,
    Value,
    Forecast,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalKind::Visual => "visual",
            SignalKind::Value => "value",
            SignalKind::Forecast => "forecast",
        };
        f.write_str(label)
    }
}

/// The four joined inputs to aggregation: the deterministic
/// recalculation plus the three independently produced signals.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    pub recalculation: RecalculationResult,
    pub visual: Signal<VisualConditionReport>,
    pub value: Signal<ValueEstimate>,
    pub forecast: Signal<TrendForecast>,
}

impl SignalSet {
    pub fn degraded_kinds(&self) -> Vec<SignalKind> {
        let mut kinds = Vec::new();
        if self.visual.is_degraded() {
            kinds.push(SignalKind::Visual);
        }
        if self.value.is_degraded() {
            kinds.push(SignalKind::Value);
        }
        if self.forecast.is_degraded() {
            kinds.push(SignalKind::Forecast);
        }
        kinds
    }

    pub fn all_degraded(&self) -> bool {
        self.visual.is_degraded() && self.value.is_degraded() && self.forecast.is_degraded()
    }
}

/// Failure of an external collaborator call. Always recovered locally
/// via a degraded fallback, never surfaced as a request error.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("collaborator failed upstream: {0}")]
    Upstream(String),
}

#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn assess(&self, property: &PropertyFacts)
        -> Result<VisualConditionReport, CollaboratorError>;
}

#[async_trait]
pub trait ValuationModel: Send + Sync {
    async fn estimate(&self, property: &PropertyFacts) -> Result<ValueEstimate, CollaboratorError>;
}

#[async_trait]
pub trait MarketForecaster: Send + Sync {
    async fn forecast(&self, property: &PropertyFacts) -> Result<TrendForecast, CollaboratorError>;
}
