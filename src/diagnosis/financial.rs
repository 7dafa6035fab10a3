use super::domain::{DpeClass, EnergyConsumption};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Renovation cost bounds per m² for one classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenovationBand {
    pub min_per_m2: f64,
    pub max_per_m2: f64,
}

/// Financial consequences of a classification, all derived from
/// classification + consumption + surface with no hidden state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialImpact {
    pub annual_energy_cost: f64,
    pub value_loss_percent: f64,
    pub renovation_cost_min: f64,
    pub renovation_cost_max: f64,
}

/// Calibration tables for the financial estimator. Values are
/// configuration, not law: the defaults track the Notaires de France
/// depreciation study and ANAH renovation averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialTables {
    /// Blended average tariff in EUR per kWh of final energy.
    pub unit_price_per_kwh: f64,
    /// Depreciation percentage per classification; absent classes lose nothing.
    pub value_loss_percent: BTreeMap<DpeClass, f64>,
    /// Renovation cost bands per classification; absent classes need none.
    pub renovation_cost_per_m2: BTreeMap<DpeClass, RenovationBand>,
}

impl FinancialTables {
    pub fn calibrated() -> Self {
        let mut value_loss_percent = BTreeMap::new();
        value_loss_percent.insert(DpeClass::E, 6.5);
        value_loss_percent.insert(DpeClass::F, 12.0);
        value_loss_percent.insert(DpeClass::G, 16.0);

        let mut renovation_cost_per_m2 = BTreeMap::new();
        renovation_cost_per_m2.insert(
            DpeClass::E,
            RenovationBand {
                min_per_m2: 150.0,
                max_per_m2: 250.0,
            },
        );
        renovation_cost_per_m2.insert(
            DpeClass::F,
            RenovationBand {
                min_per_m2: 300.0,
                max_per_m2: 500.0,
            },
        );
        renovation_cost_per_m2.insert(
            DpeClass::G,
            RenovationBand {
                min_per_m2: 500.0,
                max_per_m2: 800.0,
            },
        );

        Self {
            unit_price_per_kwh: 0.197,
            value_loss_percent,
            renovation_cost_per_m2,
        }
    }

    /// Pure estimate: annual cost from total final energy, value loss and
    /// renovation bounds from the per-class tables.
    pub fn estimate(
        &self,
        classification: DpeClass,
        consumption: &EnergyConsumption,
        surface_m2: f64,
    ) -> FinancialImpact {
        let annual_energy_cost =
            consumption.total_final_energy() * surface_m2 * self.unit_price_per_kwh;

        let value_loss_percent = self
            .value_loss_percent
            .get(&classification)
            .copied()
            .unwrap_or(0.0);

        let band = self.renovation_cost_per_m2.get(&classification);
        let renovation_cost_min = band.map_or(0.0, |band| band.min_per_m2 * surface_m2);
        let renovation_cost_max = band.map_or(0.0, |band| band.max_per_m2 * surface_m2);

        FinancialImpact {
            annual_energy_cost,
            value_loss_percent,
            renovation_cost_min,
            renovation_cost_max,
        }
    }
}

impl Default for FinancialTables {
    fn default() -> Self {
        Self::calibrated()
    }
}
