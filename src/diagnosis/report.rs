use super::domain::DpeClass;
use super::recommendation::{
    ActionStep, OpportunityTier, Recommendation, RiskTier, StepPriority, Verdict,
};
use super::signals::{SignalKind, SignalSet};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How much of the multi-signal evidence backed this report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLabel {
    High,
    Reduced,
    Minimal,
}

/// Field-stable recalculation block of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalculationView {
    pub original_classification: DpeClass,
    pub original_intensity: f64,
    pub recalculated_classification: DpeClass,
    pub recalculated_intensity: f64,
    pub is_restricted: bool,
    pub restriction_effective_date: Option<NaiveDate>,
    pub annual_energy_cost: f64,
    pub value_loss_percent: f64,
    pub renovation_cost_min: f64,
    pub renovation_cost_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStepView {
    pub rank: u8,
    pub title: String,
    pub cost: Option<f64>,
    pub duration_days: Option<u32>,
    pub priority: StepPriority,
}

impl From<&ActionStep> for ActionStepView {
    fn from(step: &ActionStep) -> Self {
        Self {
            rank: step.rank,
            title: step.title.clone(),
            cost: step.estimated_cost_eur,
            duration_days: step.estimated_duration_days,
            priority: step.priority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationView {
    pub overall_score: f64,
    pub verdict: Verdict,
    pub risk_tier: RiskTier,
    pub opportunity_tier: OpportunityTier,
    pub key_reasons: Vec<String>,
    pub action_plan: Vec<ActionStepView>,
}

/// The aggregate result returned to the presentation layer. Field names
/// and shapes are a published contract; change them only deliberately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub recalculation: RecalculationView,
    pub recommendation: RecommendationView,
    pub degraded_signals: Vec<SignalKind>,
    pub confidence: ConfidenceLabel,
}

impl DiagnosisReport {
    pub fn assemble(signals: &SignalSet, recommendation: &Recommendation) -> Self {
        let result = &signals.recalculation;
        let degraded_signals = signals.degraded_kinds();
        let confidence = match degraded_signals.len() {
            0 => ConfidenceLabel::High,
            3 => ConfidenceLabel::Minimal,
            _ => ConfidenceLabel::Reduced,
        };

        Self {
            recalculation: RecalculationView {
                original_classification: result.original_classification,
                original_intensity: result.original_intensity,
                recalculated_classification: result.recalculated_classification,
                recalculated_intensity: result.recalculated_intensity,
                is_restricted: result.compliance.is_restricted,
                restriction_effective_date: result.compliance.restriction_effective_date,
                annual_energy_cost: result.financial.annual_energy_cost,
                value_loss_percent: result.financial.value_loss_percent,
                renovation_cost_min: result.financial.renovation_cost_min,
                renovation_cost_max: result.financial.renovation_cost_max,
            },
            recommendation: RecommendationView {
                overall_score: recommendation.overall_score,
                verdict: recommendation.verdict,
                risk_tier: recommendation.risk_tier,
                opportunity_tier: recommendation.opportunity_tier,
                key_reasons: recommendation.key_reasons.clone(),
                action_plan: recommendation.action_plan.iter().map(Into::into).collect(),
            },
            degraded_signals,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::compliance::{ComplianceOutcome, UrgencyTier};
    use crate::diagnosis::financial::FinancialImpact;
    use crate::diagnosis::recalculation::{PolicyVersion, RecalculationResult};
    use crate::diagnosis::signals::{DegradedReason, Signal};

    fn sample_signals(degrade_all: bool) -> SignalSet {
        let signal = |kind: SignalKind| -> bool { degrade_all || kind == SignalKind::Forecast };
        SignalSet {
            recalculation: RecalculationResult {
                original_classification: DpeClass::F,
                original_intensity: 621.0,
                recalculated_classification: DpeClass::E,
                recalculated_intensity: 320.0,
                compliance: ComplianceOutcome {
                    classification: DpeClass::E,
                    is_restricted: false,
                    restriction_effective_date: NaiveDate::from_ymd_opt(2034, 1, 1),
                    urgency: UrgencyTier::None,
                },
                financial: FinancialImpact {
                    annual_energy_cost: 3457.35,
                    value_loss_percent: 6.5,
                    renovation_cost_min: 9_750.0,
                    renovation_cost_max: 16_250.0,
                },
                policy_version: PolicyVersion::Current,
            },
            visual: if signal(SignalKind::Visual) {
                Signal::Degraded(DegradedReason::Unavailable)
            } else {
                Signal::Present(crate::diagnosis::signals::VisualConditionReport {
                    energy_efficiency_score: 70.0,
                    detected_features: Default::default(),
                    thermal_risks: vec![],
                })
            },
            value: if signal(SignalKind::Value) {
                Signal::Degraded(DegradedReason::Unavailable)
            } else {
                Signal::Present(crate::diagnosis::signals::ValueEstimate {
                    market_value_eur: 455_000.0,
                    undervalued_score: 55.0,
                })
            },
            forecast: Signal::Degraded(DegradedReason::TimedOut),
        }
    }

    fn sample_recommendation() -> Recommendation {
        Recommendation {
            overall_score: 61.3,
            verdict: Verdict::Favorable,
            risk_tier: RiskTier::Moderate,
            opportunity_tier: OpportunityTier::Standard,
            key_reasons: vec!["example".to_string()],
            action_plan: vec![ActionStep {
                rank: 1,
                title: "Commission a certified DPE audit".to_string(),
                estimated_cost_eur: Some(200.0),
                estimated_duration_days: Some(7),
                priority: StepPriority::Medium,
            }],
        }
    }

    #[test]
    fn report_flattens_compliance_and_financial_fields() {
        let report = DiagnosisReport::assemble(&sample_signals(false), &sample_recommendation());
        assert_eq!(report.recalculation.recalculated_classification, DpeClass::E);
        assert!(!report.recalculation.is_restricted);
        assert_eq!(
            report.recalculation.restriction_effective_date,
            NaiveDate::from_ymd_opt(2034, 1, 1)
        );
        assert_eq!(report.recalculation.renovation_cost_max, 16_250.0);
    }

    #[test]
    fn confidence_reflects_degradation_level() {
        let partial = DiagnosisReport::assemble(&sample_signals(false), &sample_recommendation());
        assert_eq!(partial.degraded_signals, vec![SignalKind::Forecast]);
        assert_eq!(partial.confidence, ConfidenceLabel::Reduced);

        let minimal = DiagnosisReport::assemble(&sample_signals(true), &sample_recommendation());
        assert_eq!(minimal.degraded_signals.len(), 3);
        assert_eq!(minimal.confidence, ConfidenceLabel::Minimal);
    }

    #[test]
    fn wire_format_uses_contracted_field_names() {
        let report = DiagnosisReport::assemble(&sample_signals(false), &sample_recommendation());
        let json = serde_json::to_value(&report).expect("serializes");
        assert!(json["recalculation"]["original_classification"].is_string());
        assert!(json["recommendation"]["action_plan"][0]["duration_days"].is_number());
        assert_eq!(json["degraded_signals"][0], "forecast");
    }
}
