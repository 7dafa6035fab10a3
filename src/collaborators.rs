//! Deterministic stand-ins for the three external predictors, used by
//! the demo CLI and the HTTP service until live models are wired in.
//! Each one produces the same simplified figures the upstream models
//! fall back to, so reports stay reproducible end to end.

use crate::diagnosis::domain::PropertyFacts;
use crate::diagnosis::signals::{
    CollaboratorError, MarketForecaster, TrendForecast, ValuationModel, ValueEstimate,
    VisionAnalyzer, VisualConditionReport,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsulationQuality {
    Poor,
    Average,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowGlazing {
    Single,
    Double,
    Triple,
}

/// Vision stand-in scoring a property from its declared condition
/// rather than from photos.
#[derive(Debug, Clone, Copy)]
pub struct DeclaredConditionVision {
    pub insulation: InsulationQuality,
    pub glazing: WindowGlazing,
}

impl Default for DeclaredConditionVision {
    fn default() -> Self {
        Self {
            insulation: InsulationQuality::Average,
            glazing: WindowGlazing::Double,
        }
    }
}

#[async_trait]
impl VisionAnalyzer for DeclaredConditionVision {
    async fn assess(
        &self,
        _property: &PropertyFacts,
    ) -> Result<VisualConditionReport, CollaboratorError> {
        let base: f64 = match self.insulation {
            InsulationQuality::Poor => 35.0,
            InsulationQuality::Average => 55.0,
            InsulationQuality::Good => 70.0,
            InsulationQuality::Excellent => 85.0,
        };
        let glazing_adjustment = match self.glazing {
            WindowGlazing::Single => -10.0,
            WindowGlazing::Double => 0.0,
            WindowGlazing::Triple => 10.0,
        };

        let mut thermal_risks = Vec::new();
        if self.insulation == InsulationQuality::Poor {
            thermal_risks.push("wall and roof insulation below standard".to_string());
        }
        if self.glazing == WindowGlazing::Single {
            thermal_risks.push("single glazing causes significant heat loss".to_string());
        }

        let mut detected_features = BTreeMap::new();
        detected_features.insert(
            "insulation".to_string(),
            format!("{:?}", self.insulation).to_lowercase(),
        );
        detected_features.insert(
            "glazing".to_string(),
            format!("{:?}", self.glazing).to_lowercase(),
        );

        Ok(VisualConditionReport {
            energy_efficiency_score: (base + glazing_adjustment).clamp(0.0, 100.0),
            detected_features,
            thermal_risks,
        })
    }
}

/// Valuation stand-in pricing from a flat EUR/m² comparable.
#[derive(Debug, Clone, Copy)]
pub struct ComparableSalesValuation {
    pub price_per_m2: f64,
    pub undervalued_score: f64,
}

impl Default for ComparableSalesValuation {
    fn default() -> Self {
        Self {
            price_per_m2: 7_000.0,
            undervalued_score: 50.0,
        }
    }
}

#[async_trait]
impl ValuationModel for ComparableSalesValuation {
    async fn estimate(&self, property: &PropertyFacts) -> Result<ValueEstimate, CollaboratorError> {
        Ok(ValueEstimate {
            market_value_eur: property.surface_m2 * self.price_per_m2,
            undervalued_score: self.undervalued_score,
        })
    }
}

/// Forecast stand-in projecting a constant annual growth rate.
#[derive(Debug, Clone, Copy)]
pub struct TrendTableForecaster {
    pub price_per_m2: f64,
    pub annual_growth_percent: f64,
}

impl Default for TrendTableForecaster {
    fn default() -> Self {
        Self {
            price_per_m2: 7_000.0,
            annual_growth_percent: 3.0,
        }
    }
}

#[async_trait]
impl MarketForecaster for TrendTableForecaster {
    async fn forecast(&self, property: &PropertyFacts) -> Result<TrendForecast, CollaboratorError> {
        let growth_factor = (1.0 + self.annual_growth_percent / 100.0).powi(3);
        let current_value = property.surface_m2 * self.price_per_m2;
        Ok(TrendForecast {
            forecast_3years_eur: current_value * growth_factor,
            growth_percentage_3y: (growth_factor - 1.0) * 100.0,
        })
    }
}
