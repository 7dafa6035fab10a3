use super::domain::DpeClass;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How pressing renovation is, derived from the restriction calendar.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    None,
    Watch,
    Warning,
    Critical,
}

/// Regulatory compliance status for a recalculated classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceOutcome {
    pub classification: DpeClass,
    pub is_restricted: bool,
    pub restriction_effective_date: Option<NaiveDate>,
    pub urgency: UrgencyTier,
}

/// Rental-restriction dates of the Loi Climat, keyed by classification.
///
/// The table encodes law as of the policy's effective date and is not
/// caller-configurable per request; recalibration is a data edit. Class
/// E carries a calendar date but is not a restricted class today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestrictionCalendar {
    restriction_dates: BTreeMap<DpeClass, NaiveDate>,
    near_term_years: u32,
}

impl RestrictionCalendar {
    /// Loi Climat timeline: G barred since 2025, F from 2028, E from 2034.
    pub fn loi_climat() -> Self {
        let mut restriction_dates = BTreeMap::new();
        restriction_dates.insert(DpeClass::G, date(2025, 1, 1));
        restriction_dates.insert(DpeClass::F, date(2028, 1, 1));
        restriction_dates.insert(DpeClass::E, date(2034, 1, 1));
        Self {
            restriction_dates,
            near_term_years: 5,
        }
    }

    /// Maps a classification to its compliance outcome, judged against a
    /// caller-supplied `today` so results stay reproducible.
    pub fn schedule(&self, classification: DpeClass, today: NaiveDate) -> ComplianceOutcome {
        let is_restricted = classification.is_restricted();
        let restriction_effective_date = self.restriction_dates.get(&classification).copied();

        let urgency = match (is_restricted, restriction_effective_date) {
            (true, Some(effective)) if effective <= today => UrgencyTier::Critical,
            (true, Some(effective)) if effective <= self.near_term_horizon(today) => {
                UrgencyTier::Warning
            }
            (true, _) => UrgencyTier::Watch,
            (false, _) => UrgencyTier::None,
        };

        ComplianceOutcome {
            classification,
            is_restricted,
            restriction_effective_date,
            urgency,
        }
    }

    fn near_term_horizon(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_months(Months::new(self.near_term_years * 12))
            .unwrap_or(NaiveDate::MAX)
    }
}

impl Default for RestrictionCalendar {
    fn default() -> Self {
        Self::loi_climat()
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        date(2026, 3, 1)
    }

    #[test]
    fn g_is_already_restricted_and_critical() {
        let outcome = RestrictionCalendar::loi_climat().schedule(DpeClass::G, today());
        assert!(outcome.is_restricted);
        assert_eq!(outcome.restriction_effective_date, Some(date(2025, 1, 1)));
        assert_eq!(outcome.urgency, UrgencyTier::Critical);
    }

    #[test]
    fn f_within_near_term_window_is_warning() {
        let outcome = RestrictionCalendar::loi_climat().schedule(DpeClass::F, today());
        assert!(outcome.is_restricted);
        assert_eq!(outcome.restriction_effective_date, Some(date(2028, 1, 1)));
        assert_eq!(outcome.urgency, UrgencyTier::Warning);
    }

    #[test]
    fn f_far_from_deadline_is_watch() {
        let outcome = RestrictionCalendar::loi_climat().schedule(DpeClass::F, date(2020, 1, 1));
        assert_eq!(outcome.urgency, UrgencyTier::Watch);
    }

    #[test]
    fn e_has_a_date_but_is_not_restricted() {
        let outcome = RestrictionCalendar::loi_climat().schedule(DpeClass::E, today());
        assert!(!outcome.is_restricted);
        assert_eq!(outcome.restriction_effective_date, Some(date(2034, 1, 1)));
        assert_eq!(outcome.urgency, UrgencyTier::None);
    }

    #[test]
    fn a_through_d_have_no_restriction_date() {
        let calendar = RestrictionCalendar::loi_climat();
        for class in [DpeClass::A, DpeClass::B, DpeClass::C, DpeClass::D] {
            let outcome = calendar.schedule(class, today());
            assert!(!outcome.is_restricted);
            assert_eq!(outcome.restriction_effective_date, None);
            assert_eq!(outcome.urgency, UrgencyTier::None);
        }
    }

    #[test]
    fn dates_depend_only_on_classification() {
        let calendar = RestrictionCalendar::loi_climat();
        let first = calendar.schedule(DpeClass::F, date(2024, 6, 1));
        let second = calendar.schedule(DpeClass::F, date(2031, 6, 1));
        assert_eq!(
            first.restriction_effective_date,
            second.restriction_effective_date
        );
    }

    #[test]
    fn urgency_tiers_are_ordered() {
        assert!(UrgencyTier::None < UrgencyTier::Watch);
        assert!(UrgencyTier::Watch < UrgencyTier::Warning);
        assert!(UrgencyTier::Warning < UrgencyTier::Critical);
    }
}
