use super::classifier::{ClassificationError, ClassificationScale};
use super::compliance::{ComplianceOutcome, RestrictionCalendar};
use super::domain::{DpeClass, EnergyConsumption, EnergyMixPolicy, InvalidInput};
use super::financial::{FinancialImpact, FinancialTables};
use super::DiagnosisError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Which electricity conversion factor a result was computed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyVersion {
    /// Pre-2026 factor (2.3).
    Legacy,
    /// Factor in force since the January 2026 decree (1.9).
    Current,
}

/// Carrier-to-primary-energy conversion factors for both policy versions.
///
/// Only electricity changes between versions; other carriers keep a
/// factor of 1.0 unless overridden (wood is 0.6 under the 3CL method).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionPolicy {
    pub electricity_factor_legacy: f64,
    pub electricity_factor_current: f64,
    pub carrier_factors: BTreeMap<String, f64>,
    pub default_carrier_factor: f64,
}

impl ConversionPolicy {
    pub fn decree_2026() -> Self {
        let mut carrier_factors = BTreeMap::new();
        carrier_factors.insert("wood".to_string(), 0.6);
        Self {
            electricity_factor_legacy: 2.3,
            electricity_factor_current: 1.9,
            carrier_factors,
            default_carrier_factor: 1.0,
        }
    }

    /// Weighted-average conversion coefficient for an energy mix: one
    /// blended factor applied to total consumption, matching the
    /// regulatory model, rather than per-component factors.
    pub fn blended_factor(&self, mix: &EnergyMixPolicy, version: PolicyVersion) -> f64 {
        let electricity_factor = match version {
            PolicyVersion::Legacy => self.electricity_factor_legacy,
            PolicyVersion::Current => self.electricity_factor_current,
        };

        let mut factor = mix.electricity_share * electricity_factor;
        for (carrier, share) in &mix.other_carriers {
            let carrier_factor = self
                .carrier_factors
                .get(carrier)
                .copied()
                .unwrap_or(self.default_carrier_factor);
            factor += share * carrier_factor;
        }
        factor
    }
}

impl Default for ConversionPolicy {
    fn default() -> Self {
        Self::decree_2026()
    }
}

/// Inputs for one recalculation. Supplied original values pass through
/// unchanged; missing ones are reconstructed under the legacy policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalculationInput {
    pub consumption: EnergyConsumption,
    pub energy_mix: EnergyMixPolicy,
    pub surface_m2: f64,
    #[serde(default)]
    pub original_classification: Option<DpeClass>,
    #[serde(default)]
    pub original_intensity: Option<f64>,
}

/// Immutable outcome of a recalculation, created once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalculationResult {
    pub original_classification: DpeClass,
    pub original_intensity: f64,
    pub recalculated_classification: DpeClass,
    pub recalculated_intensity: f64,
    pub compliance: ComplianceOutcome,
    pub financial: FinancialImpact,
    pub policy_version: PolicyVersion,
}

/// Recalculates primary energy under the current conversion policy and
/// derives classification, compliance, and financial impact.
pub struct RecalculationEngine {
    conversion: ConversionPolicy,
    scale: ClassificationScale,
    calendar: RestrictionCalendar,
    financial: FinancialTables,
}

impl RecalculationEngine {
    pub fn new(
        conversion: ConversionPolicy,
        scale: ClassificationScale,
        calendar: RestrictionCalendar,
        financial: FinancialTables,
    ) -> Result<Self, DiagnosisError> {
        scale.validate().map_err(DiagnosisError::internal)?;
        Ok(Self {
            conversion,
            scale,
            calendar,
            financial,
        })
    }

    pub fn recalculate(
        &self,
        input: &RecalculationInput,
        today: NaiveDate,
    ) -> Result<RecalculationResult, DiagnosisError> {
        input.consumption.validate()?;
        input.energy_mix.validate()?;
        if !input.surface_m2.is_finite() || input.surface_m2 <= 0.0 {
            return Err(InvalidInput::SurfaceNotPositive {
                surface_m2: input.surface_m2,
            }
            .into());
        }
        if let Some(intensity) = input.original_intensity {
            if !intensity.is_finite() || intensity < 0.0 {
                return Err(InvalidInput::InvalidIntensity { value: intensity }.into());
            }
        }

        let total_final = input.consumption.total_final_energy();

        let current_factor = self
            .conversion
            .blended_factor(&input.energy_mix, PolicyVersion::Current);
        let recalculated_intensity = total_final * current_factor;
        let recalculated_classification = self.classify(recalculated_intensity)?;

        let original_intensity = match input.original_intensity {
            Some(intensity) => intensity,
            None => {
                total_final
                    * self
                        .conversion
                        .blended_factor(&input.energy_mix, PolicyVersion::Legacy)
            }
        };
        let original_classification = match input.original_classification {
            Some(classification) => classification,
            None => self.classify(original_intensity)?,
        };

        let compliance = self.calendar.schedule(recalculated_classification, today);
        let financial =
            self.financial
                .estimate(recalculated_classification, &input.consumption, input.surface_m2);

        info!(
            total_final,
            blended_factor = current_factor,
            original = %original_classification,
            recalculated = %recalculated_classification,
            intensity = recalculated_intensity,
            "primary energy recalculated under current policy"
        );

        Ok(RecalculationResult {
            original_classification,
            original_intensity,
            recalculated_classification,
            recalculated_intensity,
            compliance,
            financial,
            policy_version: PolicyVersion::Current,
        })
    }

    fn classify(&self, intensity: f64) -> Result<DpeClass, DiagnosisError> {
        self.scale.classify(intensity).map_err(|err| match err {
            ClassificationError::Input(input) => DiagnosisError::InvalidInput(input),
            fault => DiagnosisError::internal(fault),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::compliance::UrgencyTier;

    fn engine() -> RecalculationEngine {
        RecalculationEngine::new(
            ConversionPolicy::decree_2026(),
            ClassificationScale::statutory(),
            RestrictionCalendar::loi_climat(),
            FinancialTables::calibrated(),
        )
        .expect("statutory tables are valid")
    }

    fn worked_example() -> RecalculationInput {
        let mut other = BTreeMap::new();
        other.insert("gas".to_string(), 0.05);
        RecalculationInput {
            consumption: EnergyConsumption {
                heating: 200.0,
                hot_water: 40.0,
                cooling: 5.0,
                lighting: 10.0,
                auxiliary: 15.0,
            },
            energy_mix: EnergyMixPolicy {
                electricity_share: 0.95,
                other_carriers: other,
            },
            surface_m2: 65.0,
            original_classification: Some(DpeClass::F),
            original_intensity: Some(621.0),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date")
    }

    #[test]
    fn blended_factor_weights_carriers() {
        let policy = ConversionPolicy::decree_2026();
        let mix = worked_example().energy_mix;
        let current = policy.blended_factor(&mix, PolicyVersion::Current);
        let legacy = policy.blended_factor(&mix, PolicyVersion::Legacy);
        assert!((current - 1.855).abs() < 1e-9);
        assert!((legacy - 2.235).abs() < 1e-9);
    }

    #[test]
    fn wood_override_lowers_the_blend() {
        let policy = ConversionPolicy::decree_2026();
        let mut other = BTreeMap::new();
        other.insert("wood".to_string(), 0.5);
        let mix = EnergyMixPolicy {
            electricity_share: 0.5,
            other_carriers: other,
        };
        let factor = policy.blended_factor(&mix, PolicyVersion::Current);
        assert!((factor - (0.5 * 1.9 + 0.5 * 0.6)).abs() < 1e-9);
    }

    #[test]
    fn supplied_original_values_pass_through() {
        let result = engine()
            .recalculate(&worked_example(), today())
            .expect("recalculates");
        assert_eq!(result.original_classification, DpeClass::F);
        assert_eq!(result.original_intensity, 621.0);
    }

    #[test]
    fn missing_original_values_come_from_legacy_policy() {
        let mut input = worked_example();
        input.original_classification = None;
        input.original_intensity = None;
        let result = engine().recalculate(&input, today()).expect("recalculates");
        // 270 * (0.95 * 2.3 + 0.05 * 1.0)
        assert!((result.original_intensity - 603.45).abs() < 1e-9);
        assert_eq!(result.original_classification, DpeClass::G);
    }

    #[test]
    fn recalculated_side_uses_current_factor() {
        let result = engine()
            .recalculate(&worked_example(), today())
            .expect("recalculates");
        assert!((result.recalculated_intensity - 500.85).abs() < 1e-9);
        assert_eq!(result.recalculated_classification, DpeClass::G);
        assert!(result.compliance.is_restricted);
        assert_eq!(result.compliance.urgency, UrgencyTier::Critical);
        assert_eq!(result.policy_version, PolicyVersion::Current);
    }

    #[test]
    fn current_intensity_never_exceeds_legacy_when_electric() {
        let engine = engine();
        for electricity_share in [0.2, 0.5, 0.8, 1.0] {
            let mut other = BTreeMap::new();
            if electricity_share < 1.0 {
                other.insert("gas".to_string(), 1.0 - electricity_share);
            }
            let mut input = worked_example();
            input.energy_mix = EnergyMixPolicy {
                electricity_share,
                other_carriers: other,
            };
            input.original_classification = None;
            input.original_intensity = None;
            let result = engine.recalculate(&input, today()).expect("recalculates");
            assert!(result.recalculated_intensity < result.original_intensity);
        }
    }

    #[test]
    fn zero_electricity_share_leaves_intensity_unchanged() {
        let mut other = BTreeMap::new();
        other.insert("gas".to_string(), 1.0);
        let mut input = worked_example();
        input.energy_mix = EnergyMixPolicy {
            electricity_share: 0.0,
            other_carriers: other,
        };
        input.original_classification = None;
        input.original_intensity = None;
        let result = engine().recalculate(&input, today()).expect("recalculates");
        assert_eq!(result.recalculated_intensity, result.original_intensity);
    }

    #[test]
    fn rejects_non_positive_surface() {
        let mut input = worked_example();
        input.surface_m2 = 0.0;
        assert!(matches!(
            engine().recalculate(&input, today()),
            Err(DiagnosisError::InvalidInput(
                InvalidInput::SurfaceNotPositive { .. }
            ))
        ));
    }

    #[test]
    fn rejects_denormalized_mix() {
        let mut input = worked_example();
        input.energy_mix.electricity_share = 0.5;
        assert!(matches!(
            engine().recalculate(&input, today()),
            Err(DiagnosisError::InvalidInput(
                InvalidInput::SharesNotNormalized { .. }
            ))
        ));
    }

    #[test]
    fn rejects_non_finite_supplied_intensity() {
        let mut input = worked_example();
        input.original_intensity = Some(f64::INFINITY);
        assert!(matches!(
            engine().recalculate(&input, today()),
            Err(DiagnosisError::InvalidInput(
                InvalidInput::InvalidIntensity { .. }
            ))
        ));
    }

    #[test]
    fn recalculation_is_idempotent() {
        let engine = engine();
        let input = worked_example();
        let first = engine.recalculate(&input, today()).expect("recalculates");
        let second = engine.recalculate(&input, today()).expect("recalculates");
        assert_eq!(first, second);
    }
}
