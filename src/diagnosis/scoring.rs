use super::signals::SignalSet;
use serde::{Deserialize, Serialize};

/// Monotonic growth-to-score breakpoint: forecast growth at or above
/// `min_growth_percent` earns at least `score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthBreakpoint {
    pub min_growth_percent: f64,
    pub score: f64,
}

/// Calibration for the sub-score aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Value-loss percentage that maps to a DPE score of zero.
    pub max_loss_reference: f64,
    /// Substitute used when a score-bearing signal is degraded.
    pub neutral_score: f64,
    /// Ascending breakpoints mapping 3-year growth to a market score.
    pub market_breakpoints: Vec<GrowthBreakpoint>,
}

impl ScoringConfig {
    pub fn calibrated() -> Self {
        Self {
            max_loss_reference: 20.0,
            neutral_score: 50.0,
            market_breakpoints: vec![
                GrowthBreakpoint {
                    min_growth_percent: f64::NEG_INFINITY,
                    score: 20.0,
                },
                GrowthBreakpoint {
                    min_growth_percent: -2.0,
                    score: 35.0,
                },
                GrowthBreakpoint {
                    min_growth_percent: 0.0,
                    score: 50.0,
                },
                GrowthBreakpoint {
                    min_growth_percent: 3.0,
                    score: 70.0,
                },
                GrowthBreakpoint {
                    min_growth_percent: 8.0,
                    score: 85.0,
                },
            ],
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::calibrated()
    }
}

/// The four sub-scores feeding the recommendation, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub energy_score: f64,
    pub value_score: f64,
    pub market_score: f64,
    pub dpe_score: f64,
}

/// Collapses the joined signal set into sub-scores, substituting
/// documented fallbacks for degraded branches.
pub struct SignalAggregator {
    config: ScoringConfig,
}

impl SignalAggregator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(&self, signals: &SignalSet) -> SubScores {
        let dpe_score = self.dpe_score(signals.recalculation.financial.value_loss_percent);

        // Fallback is the DPE-derived score, never a silent zero.
        let energy_score = signals
            .visual
            .value()
            .map(|report| report.energy_efficiency_score.clamp(0.0, 100.0))
            .unwrap_or(dpe_score);

        let value_score = signals
            .value
            .value()
            .map(|estimate| estimate.undervalued_score.clamp(0.0, 100.0))
            .unwrap_or(self.config.neutral_score);

        let market_score = signals
            .forecast
            .value()
            .map(|forecast| self.market_score(forecast.growth_percentage_3y))
            .unwrap_or(self.config.neutral_score);

        SubScores {
            energy_score,
            value_score,
            market_score,
            dpe_score,
        }
    }

    fn dpe_score(&self, value_loss_percent: f64) -> f64 {
        if self.config.max_loss_reference <= 0.0 {
            return self.config.neutral_score;
        }
        let scaled = value_loss_percent / self.config.max_loss_reference * 100.0;
        (100.0 - scaled).clamp(0.0, 100.0)
    }

    fn market_score(&self, growth_percent: f64) -> f64 {
        self.config
            .market_breakpoints
            .iter()
            .rev()
            .find(|breakpoint| growth_percent >= breakpoint.min_growth_percent)
            .map(|breakpoint| breakpoint.score)
            .unwrap_or(self.config.neutral_score)
            .clamp(0.0, 100.0)
    }
}
