use super::domain::{DpeClass, InvalidInput};
use serde::{Deserialize, Serialize};

/// One band of the classification scale: every intensity up to and
/// including `upper_kwh_ep` (kWh EP/m²/year) belongs to `class`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassBand {
    pub upper_kwh_ep: f64,
    pub class: DpeClass,
}

/// Ordered lookup scale mapping primary-energy intensity to a DPE class.
///
/// Bands are held sorted by ascending threshold; the final band must be
/// unbounded so every non-negative intensity classifies. Boundary values
/// map to the better class (comparison is `<=`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationScale {
    bands: Vec<ClassBand>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassificationError {
    #[error(transparent)]
    Input(#[from] InvalidInput),
    #[error("classification scale thresholds are not strictly increasing")]
    NonIncreasingThresholds,
    #[error("classification scale has no unbounded final band")]
    UnboundedBandMissing,
    #[error("classification scale does not cover intensity {0}")]
    ScaleGap(f64),
}

impl ClassificationScale {
    pub fn new(bands: Vec<ClassBand>) -> Result<Self, ClassificationError> {
        if !bands
            .windows(2)
            .all(|pair| pair[0].upper_kwh_ep < pair[1].upper_kwh_ep)
        {
            return Err(ClassificationError::NonIncreasingThresholds);
        }
        match bands.last() {
            Some(last) if last.upper_kwh_ep.is_infinite() => Ok(Self { bands }),
            _ => Err(ClassificationError::UnboundedBandMissing),
        }
    }

    /// The statutory A-G scale in force since the 3CL-2021 method.
    pub fn statutory() -> Self {
        Self {
            bands: vec![
                ClassBand {
                    upper_kwh_ep: 70.0,
                    class: DpeClass::A,
                },
                ClassBand {
                    upper_kwh_ep: 110.0,
                    class: DpeClass::B,
                },
                ClassBand {
                    upper_kwh_ep: 180.0,
                    class: DpeClass::C,
                },
                ClassBand {
                    upper_kwh_ep: 250.0,
                    class: DpeClass::D,
                },
                ClassBand {
                    upper_kwh_ep: 330.0,
                    class: DpeClass::E,
                },
                ClassBand {
                    upper_kwh_ep: 420.0,
                    class: DpeClass::F,
                },
                ClassBand {
                    upper_kwh_ep: f64::INFINITY,
                    class: DpeClass::G,
                },
            ],
        }
    }

    /// Re-checks the invariants after an external (deserialized) scale
    /// replaces the statutory one.
    pub fn validate(&self) -> Result<(), ClassificationError> {
        Self::new(self.bands.clone()).map(|_| ())
    }

    pub fn classify(&self, intensity: f64) -> Result<DpeClass, ClassificationError> {
        if !intensity.is_finite() || intensity < 0.0 {
            return Err(InvalidInput::InvalidIntensity { value: intensity }.into());
        }

        self.bands
            .iter()
            .find(|band| intensity <= band.upper_kwh_ep)
            .map(|band| band.class)
            .ok_or(ClassificationError::ScaleGap(intensity))
    }
}

impl Default for ClassificationScale {
    fn default() -> Self {
        Self::statutory()
    }
}
