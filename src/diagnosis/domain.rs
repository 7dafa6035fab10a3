use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Shares of an energy mix must sum to 1.0 within this tolerance.
pub const MIX_SHARE_TOLERANCE: f64 = 0.001;

/// DPE energy-performance classes, best (A) to worst (G).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DpeClass {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl DpeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DpeClass::A => "A",
            DpeClass::B => "B",
            DpeClass::C => "C",
            DpeClass::D => "D",
            DpeClass::E => "E",
            DpeClass::F => "F",
            DpeClass::G => "G",
        }
    }

    /// Classes legally barred from new leases under the restriction calendar.
    pub fn is_restricted(&self) -> bool {
        matches!(self, DpeClass::F | DpeClass::G)
    }
}

impl fmt::Display for DpeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DpeClass {
    type Err = InvalidInput;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(DpeClass::A),
            "B" => Ok(DpeClass::B),
            "C" => Ok(DpeClass::C),
            "D" => Ok(DpeClass::D),
            "E" => Ok(DpeClass::E),
            "F" => Ok(DpeClass::F),
            "G" => Ok(DpeClass::G),
            _ => Err(InvalidInput::UnknownClassification {
                value: value.to_string(),
            }),
        }
    }
}

/// Final-energy consumption breakdown in kWh per m² per year.
///
/// Missing components default to zero; every component must be finite
/// and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyConsumption {
    #[serde(default)]
    pub heating: f64,
    #[serde(default)]
    pub hot_water: f64,
    #[serde(default)]
    pub cooling: f64,
    #[serde(default)]
    pub lighting: f64,
    #[serde(default)]
    pub auxiliary: f64,
}

impl EnergyConsumption {
    pub fn total_final_energy(&self) -> f64 {
        self.heating + self.hot_water + self.cooling + self.lighting + self.auxiliary
    }

    pub fn validate(&self) -> Result<(), InvalidInput> {
        for (component, value) in self.components() {
            if !value.is_finite() {
                return Err(InvalidInput::NonFiniteComponent { component });
            }
            if value < 0.0 {
                return Err(InvalidInput::NegativeComponent { component, value });
            }
        }
        Ok(())
    }

    fn components(&self) -> [(&'static str, f64); 5] {
        [
            ("heating", self.heating),
            ("hot_water", self.hot_water),
            ("cooling", self.cooling),
            ("lighting", self.lighting),
            ("auxiliary", self.auxiliary),
        ]
    }
}

/// Energy-carrier mix of a dwelling: electricity share plus named other
/// carriers (gas, fuel_oil, wood, ...) with their shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyMixPolicy {
    pub electricity_share: f64,
    #[serde(default)]
    pub other_carriers: BTreeMap<String, f64>,
}

impl EnergyMixPolicy {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        self.check_share("electricity", self.electricity_share)?;
        for (carrier, share) in &self.other_carriers {
            self.check_share(carrier, *share)?;
        }

        let sum: f64 = self.electricity_share + self.other_carriers.values().sum::<f64>();
        if (sum - 1.0).abs() > MIX_SHARE_TOLERANCE {
            return Err(InvalidInput::SharesNotNormalized { sum });
        }
        Ok(())
    }

    fn check_share(&self, carrier: &str, share: f64) -> Result<(), InvalidInput> {
        if !share.is_finite() || !(0.0..=1.0).contains(&share) {
            return Err(InvalidInput::ShareOutOfRange {
                carrier: carrier.to_string(),
                share,
            });
        }
        Ok(())
    }
}

/// Property attributes shared with the external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFacts {
    pub address: String,
    pub surface_m2: f64,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub photo_reference: Option<String>,
}

/// Input rejections raised before any computation runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("consumption component '{component}' is negative ({value})")]
    NegativeComponent { component: &'static str, value: f64 },
    #[error("consumption component '{component}' is not a finite number")]
    NonFiniteComponent { component: &'static str },
    #[error("intensity must be a finite non-negative number, got {value}")]
    InvalidIntensity { value: f64 },
    #[error("surface must be strictly positive, got {surface_m2} m²")]
    SurfaceNotPositive { surface_m2: f64 },
    #[error("energy mix share for '{carrier}' must be within [0, 1], got {share}")]
    ShareOutOfRange { carrier: String, share: f64 },
    #[error("energy mix shares must sum to 1.0 (±{MIX_SHARE_TOLERANCE}), got {sum}")]
    SharesNotNormalized { sum: f64 },
    #[error("'{value}' is not a DPE classification (expected A-G)")]
    UnknownClassification { value: String },
}
