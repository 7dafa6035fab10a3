use super::compliance::UrgencyTier;
use super::domain::DpeClass;
use super::recalculation::RecalculationResult;
use super::scoring::SubScores;
use super::signals::SignalSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Final investment verdict, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Excellent,
    Favorable,
    Conditional,
    Unfavorable,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Excellent => "excellent investment",
            Verdict::Favorable => "good purchase",
            Verdict::Conditional => "acceptable with renovation",
            Verdict::Unfavorable => "avoid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Moderate,
    Elevated,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityTier {
    Exceptional,
    Strong,
    Standard,
    Limited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPriority {
    Low,
    Medium,
    High,
}

/// One entry of the prioritized remediation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    pub rank: u8,
    pub title: String,
    pub estimated_cost_eur: Option<f64>,
    pub estimated_duration_days: Option<u32>,
    pub priority: StepPriority,
}

/// The synthesized verdict, read-only after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub overall_score: f64,
    pub verdict: Verdict,
    pub risk_tier: RiskTier,
    pub opportunity_tier: OpportunityTier,
    pub key_reasons: Vec<String>,
    pub action_plan: Vec<ActionStep>,
}

/// Weight applied to each sub-score. Uniform by default, kept
/// configurable so a future calibration needs only a data edit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub energy: f64,
    pub value: f64,
    pub market: f64,
    pub dpe: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            energy: 1.0,
            value: 1.0,
            market: 1.0,
            dpe: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub weights: ScoreWeights,
    /// Inclusive lower bounds of the verdict buckets.
    pub excellent_floor: f64,
    pub favorable_floor: f64,
    pub conditional_floor: f64,
    /// Flat cost assumed for a certified audit.
    pub audit_cost_eur: f64,
    /// Renovation budgets above this trigger the subsidy-simulation step.
    pub subsidy_threshold_eur: f64,
    /// Works named in the renovation-quotes step, per classification.
    pub priority_works: BTreeMap<DpeClass, Vec<String>>,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        let mut priority_works = BTreeMap::new();
        priority_works.insert(
            DpeClass::E,
            vec![
                "attic and wall insulation".to_string(),
                "heat pump heating".to_string(),
                "thermodynamic water heater".to_string(),
            ],
        );
        // Thermal sieves additionally need the building envelope treated.
        for class in [DpeClass::F, DpeClass::G] {
            priority_works.insert(
                class,
                vec![
                    "attic and wall insulation".to_string(),
                    "heat pump heating".to_string(),
                    "double or triple glazing".to_string(),
                    "dual-flow ventilation".to_string(),
                ],
            );
        }

        Self {
            weights: ScoreWeights::default(),
            excellent_floor: 75.0,
            favorable_floor: 60.0,
            conditional_floor: 45.0,
            audit_cost_eur: 200.0,
            subsidy_threshold_eur: 10_000.0,
            priority_works,
        }
    }
}

/// Combines the sub-scores into a single explainable verdict with a
/// prioritized action plan.
pub struct RecommendationSynthesizer {
    config: RecommendationConfig,
}

impl RecommendationSynthesizer {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    pub fn synthesize(&self, scores: &SubScores, signals: &SignalSet) -> Recommendation {
        let overall_score = self.overall_score(scores);
        let verdict = self.bucket(overall_score, |floor| match floor {
            0 => Verdict::Excellent,
            1 => Verdict::Favorable,
            2 => Verdict::Conditional,
            _ => Verdict::Unfavorable,
        });

        let risk_blend = (scores.energy_score + scores.dpe_score) / 2.0;
        let risk_tier = self.bucket(risk_blend, |floor| match floor {
            0 => RiskTier::Low,
            1 => RiskTier::Moderate,
            2 => RiskTier::Elevated,
            _ => RiskTier::High,
        });

        let opportunity_blend = (scores.value_score + scores.market_score) / 2.0;
        let opportunity_tier = self.bucket(opportunity_blend, |floor| match floor {
            0 => OpportunityTier::Exceptional,
            1 => OpportunityTier::Strong,
            2 => OpportunityTier::Standard,
            _ => OpportunityTier::Limited,
        });

        Recommendation {
            overall_score,
            verdict,
            risk_tier,
            opportunity_tier,
            key_reasons: self.key_reasons(signals),
            action_plan: self.action_plan(&signals.recalculation, scores),
        }
    }

    fn overall_score(&self, scores: &SubScores) -> f64 {
        let weights = self.config.weights;
        let total_weight = weights.energy + weights.value + weights.market + weights.dpe;
        if total_weight <= 0.0 {
            return 0.0;
        }
        let weighted = scores.energy_score * weights.energy
            + scores.value_score * weights.value
            + scores.market_score * weights.market
            + scores.dpe_score * weights.dpe;
        (weighted / total_weight).clamp(0.0, 100.0)
    }

    fn bucket<T>(&self, score: f64, pick: impl Fn(u8) -> T) -> T {
        if score >= self.config.excellent_floor {
            pick(0)
        } else if score >= self.config.favorable_floor {
            pick(1)
        } else if score >= self.config.conditional_floor {
            pick(2)
        } else {
            pick(3)
        }
    }

    fn key_reasons(&self, signals: &SignalSet) -> Vec<String> {
        let recalculation = &signals.recalculation;
        let mut reasons = Vec::new();

        if recalculation.compliance.is_restricted {
            reasons.push(format!(
                "thermal sieve classification {}: rental restriction applies",
                recalculation.recalculated_classification
            ));
        } else if recalculation.recalculated_classification <= DpeClass::C {
            reasons.push(format!(
                "strong energy classification {} protects resale value",
                recalculation.recalculated_classification
            ));
        }

        if recalculation.recalculated_classification < recalculation.original_classification {
            reasons.push(format!(
                "2026 conversion factor improves the classification ({} to {})",
                recalculation.original_classification, recalculation.recalculated_classification
            ));
        }

        if recalculation.financial.value_loss_percent > 10.0 {
            reasons.push(format!(
                "energy-driven depreciation of {:.1}% weighs on the asking price",
                recalculation.financial.value_loss_percent
            ));
        }

        if let Some(estimate) = signals.value.value() {
            if estimate.undervalued_score > 70.0 {
                reasons.push(format!(
                    "priced below comparables (undervalued score {:.0})",
                    estimate.undervalued_score
                ));
            }
        }

        if let Some(forecast) = signals.forecast.value() {
            if forecast.growth_percentage_3y < 0.0 {
                reasons.push(format!(
                    "local market projected to contract {:.1}% over 3 years",
                    forecast.growth_percentage_3y.abs()
                ));
            } else if forecast.growth_percentage_3y >= 3.0 {
                reasons.push(format!(
                    "local market projected to grow {:.1}% over 3 years",
                    forecast.growth_percentage_3y
                ));
            }
        }

        if let Some(report) = signals.visual.value() {
            if let Some(risk) = report.thermal_risks.first() {
                reasons.push(format!("visual inspection flagged: {risk}"));
            }
        }

        reasons.truncate(5);
        reasons
    }

    /// Fixed ordered template; inclusion and priority depend on the
    /// recalculated classification and urgency. Template order is the
    /// tie-break, so ranks are stable across runs.
    fn action_plan(&self, recalculation: &RecalculationResult, scores: &SubScores) -> Vec<ActionStep> {
        let restricted = recalculation.compliance.is_restricted;
        let urgent = recalculation.compliance.urgency >= UrgencyTier::Warning;
        let financial = &recalculation.financial;
        let mut steps = Vec::new();

        steps.push(draft_step(
            "Commission a certified DPE audit",
            Some(self.config.audit_cost_eur),
            Some(7),
            if restricted {
                StepPriority::High
            } else {
                StepPriority::Medium
            },
        ));

        if financial.renovation_cost_max > 0.0 || scores.energy_score < 60.0 {
            let cost = if financial.renovation_cost_max > 0.0 {
                Some((financial.renovation_cost_min + financial.renovation_cost_max) / 2.0)
            } else {
                None
            };
            let title = match self
                .config
                .priority_works
                .get(&recalculation.recalculated_classification)
                .filter(|works| !works.is_empty())
            {
                Some(works) => format!("Collect renovation quotes: {}", works.join(", ")),
                None => "Collect renovation quotes for the priority works".to_string(),
            };
            steps.push(draft_step(
                &title,
                cost,
                Some(21),
                if urgent {
                    StepPriority::High
                } else {
                    StepPriority::Medium
                },
            ));
        }

        if financial.renovation_cost_max > self.config.subsidy_threshold_eur {
            steps.push(draft_step(
                "Simulate MaPrimeRenov and eco-loan subsidies",
                None,
                Some(7),
                StepPriority::Medium,
            ));
        }

        if financial.value_loss_percent > 0.0 {
            steps.push(draft_step(
                &format!(
                    "Negotiate the price down by {:.0}%",
                    financial.value_loss_percent
                ),
                None,
                None,
                if restricted {
                    StepPriority::High
                } else {
                    StepPriority::Medium
                },
            ));
        }

        steps.push(draft_step(
            "Monitor classification and market conditions",
            None,
            None,
            StepPriority::Low,
        ));

        for (index, step) in steps.iter_mut().enumerate() {
            step.rank = index as u8 + 1;
        }
        steps
    }
}

fn draft_step(
    title: &str,
    estimated_cost_eur: Option<f64>,
    estimated_duration_days: Option<u32>,
    priority: StepPriority,
) -> ActionStep {
    ActionStep {
        rank: 0,
        title: title.to_string(),
        estimated_cost_eur,
        estimated_duration_days,
        priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::compliance::ComplianceOutcome;
    use crate::diagnosis::financial::FinancialImpact;
    use crate::diagnosis::recalculation::PolicyVersion;
    use crate::diagnosis::signals::{DegradedReason, Signal, TrendForecast, ValueEstimate};
    use chrono::NaiveDate;

    fn recalculation(class: DpeClass, value_loss: f64) -> RecalculationResult {
        let restricted = class.is_restricted();
        let (cost_min, cost_max) = match class {
            DpeClass::E => (9_750.0, 16_250.0),
            DpeClass::F => (19_500.0, 32_500.0),
            DpeClass::G => (32_500.0, 52_000.0),
            _ => (0.0, 0.0),
        };
        RecalculationResult {
            original_classification: DpeClass::F,
            original_intensity: 621.0,
            recalculated_classification: class,
            recalculated_intensity: 320.0,
            compliance: ComplianceOutcome {
                classification: class,
                is_restricted: restricted,
                restriction_effective_date: restricted
                    .then(|| NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")),
                urgency: if restricted {
                    UrgencyTier::Critical
                } else {
                    UrgencyTier::None
                },
            },
            financial: FinancialImpact {
                annual_energy_cost: 3457.35,
                value_loss_percent: value_loss,
                renovation_cost_min: cost_min,
                renovation_cost_max: cost_max,
            },
            policy_version: PolicyVersion::Current,
        }
    }

    fn signals(class: DpeClass, value_loss: f64) -> SignalSet {
        SignalSet {
            recalculation: recalculation(class, value_loss),
            visual: Signal::Degraded(DegradedReason::Unavailable),
            value: Signal::Present(ValueEstimate {
                market_value_eur: 455_000.0,
                undervalued_score: 75.0,
            }),
            forecast: Signal::Present(TrendForecast {
                forecast_3years_eur: 495_000.0,
                growth_percentage_3y: 9.3,
            }),
        }
    }

    fn scores(energy: f64, value: f64, market: f64, dpe: f64) -> SubScores {
        SubScores {
            energy_score: energy,
            value_score: value,
            market_score: market,
            dpe_score: dpe,
        }
    }

    fn synthesizer() -> RecommendationSynthesizer {
        RecommendationSynthesizer::new(RecommendationConfig::default())
    }

    #[test]
    fn overall_score_is_uniform_mean_by_default() {
        let recommendation =
            synthesizer().synthesize(&scores(80.0, 60.0, 70.0, 90.0), &signals(DpeClass::C, 0.0));
        assert!((recommendation.overall_score - 75.0).abs() < 1e-9);
        assert_eq!(recommendation.verdict, Verdict::Excellent);
    }

    #[test]
    fn verdict_boundaries_are_inclusive_lower_bounds() {
        let synthesizer = synthesizer();
        let set = signals(DpeClass::C, 0.0);
        for (score, expected) in [
            (75.0, Verdict::Excellent),
            (74.99, Verdict::Favorable),
            (60.0, Verdict::Favorable),
            (59.99, Verdict::Conditional),
            (45.0, Verdict::Conditional),
            (44.99, Verdict::Unfavorable),
        ] {
            let recommendation =
                synthesizer.synthesize(&scores(score, score, score, score), &set);
            assert_eq!(recommendation.verdict, expected, "at score {score}");
        }
    }

    #[test]
    fn overall_score_is_monotonic_in_each_sub_score() {
        let synthesizer = synthesizer();
        let set = signals(DpeClass::C, 0.0);
        let base = synthesizer.synthesize(&scores(50.0, 50.0, 50.0, 50.0), &set);
        for bumped in [
            scores(70.0, 50.0, 50.0, 50.0),
            scores(50.0, 70.0, 50.0, 50.0),
            scores(50.0, 50.0, 70.0, 50.0),
            scores(50.0, 50.0, 50.0, 70.0),
        ] {
            let recommendation = synthesizer.synthesize(&bumped, &set);
            assert!(recommendation.overall_score > base.overall_score);
        }
    }

    #[test]
    fn custom_weights_shift_the_overall_score() {
        let config = RecommendationConfig {
            weights: ScoreWeights {
                energy: 3.0,
                value: 0.0,
                market: 0.0,
                dpe: 1.0,
            },
            ..RecommendationConfig::default()
        };
        let recommendation = RecommendationSynthesizer::new(config)
            .synthesize(&scores(80.0, 10.0, 10.0, 40.0), &signals(DpeClass::C, 0.0));
        assert!((recommendation.overall_score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn risk_tier_follows_energy_and_dpe_blend() {
        let recommendation =
            synthesizer().synthesize(&scores(30.0, 90.0, 90.0, 40.0), &signals(DpeClass::G, 16.0));
        assert_eq!(recommendation.risk_tier, RiskTier::High);
        assert_eq!(recommendation.opportunity_tier, OpportunityTier::Exceptional);
    }

    #[test]
    fn restricted_class_escalates_negotiation_priority() {
        let recommendation =
            synthesizer().synthesize(&scores(40.0, 50.0, 50.0, 20.0), &signals(DpeClass::G, 16.0));
        let negotiation = recommendation
            .action_plan
            .iter()
            .find(|step| step.title.starts_with("Negotiate"))
            .expect("negotiation step present");
        assert_eq!(negotiation.priority, StepPriority::High);
    }

    #[test]
    fn clean_property_gets_minimal_plan() {
        let recommendation =
            synthesizer().synthesize(&scores(85.0, 60.0, 70.0, 100.0), &signals(DpeClass::B, 0.0));
        let titles: Vec<&str> = recommendation
            .action_plan
            .iter()
            .map(|step| step.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec![
                "Commission a certified DPE audit",
                "Monitor classification and market conditions",
            ]
        );
    }

    #[test]
    fn ranks_follow_template_order() {
        let recommendation =
            synthesizer().synthesize(&scores(40.0, 50.0, 50.0, 20.0), &signals(DpeClass::G, 16.0));
        let ranks: Vec<u8> = recommendation
            .action_plan
            .iter()
            .map(|step| step.rank)
            .collect();
        assert_eq!(ranks, (1..=ranks.len() as u8).collect::<Vec<_>>());
        assert_eq!(recommendation.action_plan[0].title, "Commission a certified DPE audit");
    }

    #[test]
    fn renovation_step_names_class_specific_works() {
        let sieve =
            synthesizer().synthesize(&scores(40.0, 50.0, 50.0, 20.0), &signals(DpeClass::G, 16.0));
        let quotes = sieve
            .action_plan
            .iter()
            .find(|step| step.title.starts_with("Collect renovation quotes"))
            .expect("renovation step present");
        assert!(quotes.title.contains("insulation"));
        assert!(quotes.title.contains("glazing"));

        let light =
            synthesizer().synthesize(&scores(55.0, 50.0, 50.0, 67.5), &signals(DpeClass::E, 6.5));
        let quotes = light
            .action_plan
            .iter()
            .find(|step| step.title.starts_with("Collect renovation quotes"))
            .expect("renovation step present");
        assert!(quotes.title.contains("insulation"));
        assert!(!quotes.title.contains("glazing"));
    }

    #[test]
    fn subsidy_step_requires_large_renovation_budget() {
        let favorable =
            synthesizer().synthesize(&scores(85.0, 60.0, 70.0, 100.0), &signals(DpeClass::B, 0.0));
        assert!(!favorable
            .action_plan
            .iter()
            .any(|step| step.title.starts_with("Simulate")));

        let heavy =
            synthesizer().synthesize(&scores(40.0, 50.0, 50.0, 20.0), &signals(DpeClass::G, 16.0));
        assert!(heavy
            .action_plan
            .iter()
            .any(|step| step.title.starts_with("Simulate")));
    }

    #[test]
    fn key_reasons_mention_restriction_and_market() {
        let recommendation =
            synthesizer().synthesize(&scores(40.0, 50.0, 50.0, 20.0), &signals(DpeClass::G, 16.0));
        assert!(recommendation
            .key_reasons
            .iter()
            .any(|reason| reason.contains("rental restriction")));
        assert!(recommendation.key_reasons.len() <= 5);
    }
}
