//! Proximity classification for reporting.
//!
//! Two independent schemes are in use and are deliberately not reconciled:
//!
//! - due-date countdown (`days_until_due`): near term within 30 days,
//!   critical period within 14 days;
//! - absolute gestation-day bands used by dashboard listings: near
//!   253–269, critical 269–283. Day 269 belongs to both bands.

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::GestationRecord;

/// Upper bound of the near-term countdown.
pub const NEAR_TERM_WINDOW_DAYS: i64 = 30;
/// Upper bound of the critical-period countdown.
pub const CRITICAL_WINDOW_DAYS: i64 = 14;

/// Gestation-day band listed as "near calving" on the dashboard.
pub const NEAR_DAY_BAND: RangeInclusive<u32> = 253..=269;
/// Gestation-day band listed as "critical" on the dashboard.
pub const CRITICAL_DAY_BAND: RangeInclusive<u32> = 269..=283;

/// Position of a pregnancy relative to its due date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DueProximity {
    /// Due date already passed
    Overdue,
    /// 0..=14 days left
    CriticalPeriod,
    /// 15..=30 days left
    NearTerm,
    /// More than 30 days left
    Distant,
}

impl DueProximity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueProximity::Overdue => "overdue",
            DueProximity::CriticalPeriod => "critical_period",
            DueProximity::NearTerm => "near_term",
            DueProximity::Distant => "distant",
        }
    }
}

/// Whole days from `today` to the estimated due date.
pub fn days_until_due(record: &GestationRecord, today: NaiveDate) -> Option<i64> {
    record
        .estimated_due_date
        .map(|due| due.signed_duration_since(today).num_days())
}

pub fn is_near_term(days_until_due: i64) -> bool {
    (0..=NEAR_TERM_WINDOW_DAYS).contains(&days_until_due)
}

pub fn is_critical_period(days_until_due: i64) -> bool {
    (0..=CRITICAL_WINDOW_DAYS).contains(&days_until_due)
}

/// Classify a countdown. Critical takes precedence over near term.
pub fn due_proximity(days_until_due: i64) -> DueProximity {
    if days_until_due < 0 {
        DueProximity::Overdue
    } else if is_critical_period(days_until_due) {
        DueProximity::CriticalPeriod
    } else if is_near_term(days_until_due) {
        DueProximity::NearTerm
    } else {
        DueProximity::Distant
    }
}

pub fn in_near_day_band(gestation_days: u32) -> bool {
    NEAR_DAY_BAND.contains(&gestation_days)
}

pub fn in_critical_day_band(gestation_days: u32) -> bool {
    CRITICAL_DAY_BAND.contains(&gestation_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gestation::derive;
    use crate::models::ServiceType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_until_due() {
        let record = GestationRecord::new(
            "animal-1".into(),
            ServiceType::NaturalMating,
            Some(date(2024, 1, 1)),
        );
        assert_eq!(days_until_due(&record, date(2024, 9, 30)), None);

        let record = derive(&record, date(2024, 9, 30));
        assert_eq!(days_until_due(&record, date(2024, 9, 30)), Some(10));
        assert_eq!(days_until_due(&record, date(2024, 10, 12)), Some(-2));
    }

    #[test]
    fn test_countdown_windows() {
        assert!(is_near_term(0));
        assert!(is_near_term(30));
        assert!(!is_near_term(31));
        assert!(!is_near_term(-1));

        assert!(is_critical_period(14));
        assert!(!is_critical_period(15));
        assert!(!is_critical_period(-1));
    }

    #[test]
    fn test_due_proximity() {
        assert_eq!(due_proximity(-3), DueProximity::Overdue);
        assert_eq!(due_proximity(0), DueProximity::CriticalPeriod);
        assert_eq!(due_proximity(14), DueProximity::CriticalPeriod);
        assert_eq!(due_proximity(15), DueProximity::NearTerm);
        assert_eq!(due_proximity(30), DueProximity::NearTerm);
        assert_eq!(due_proximity(31), DueProximity::Distant);
    }

    #[test]
    fn test_day_bands_overlap_at_269() {
        assert!(!in_near_day_band(252));
        assert!(in_near_day_band(253));
        assert!(in_near_day_band(269));
        assert!(in_critical_day_band(269));
        assert!(!in_near_day_band(270));
        assert!(in_critical_day_band(283));
        assert!(!in_critical_day_band(284));
    }
}
