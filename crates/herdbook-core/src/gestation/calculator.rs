//! Basis-date resolution and derived-field recomputation.

use chrono::{Days, NaiveDate};
use tracing::trace;

use crate::models::{GestationRecord, GestationUpdate, Trimester};

/// Typical bovine gestation length.
pub const GESTATION_LENGTH_DAYS: u64 = 283;
/// Last gestation day of the first trimester.
pub const FIRST_TRIMESTER_LAST_DAY: u32 = 94;
/// Last gestation day of the second trimester.
pub const SECOND_TRIMESTER_LAST_DAY: u32 = 189;

/// Which inputs produced the basis service date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisSource {
    /// Back-computed from confirmation date and confirmed days
    Confirmation,
    /// Recorded service date
    Service,
}

/// Resolved basis for the date arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestationBasis {
    pub service_date: NaiveDate,
    pub source: BasisSource,
    /// Gestation days elapsed as of `today`, clamped at zero
    pub current_days: u32,
}

impl GestationBasis {
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.service_date
            .checked_add_days(Days::new(GESTATION_LENGTH_DAYS))
    }

    pub fn trimester(&self) -> Trimester {
        trimester_for(self.current_days)
    }
}

/// Resolve the basis service date. Confirmation data wins over the
/// recorded service date.
pub fn resolve_basis(record: &GestationRecord, today: NaiveDate) -> Option<GestationBasis> {
    if let (Some(confirmed_on), Some(days)) =
        (record.confirmation_date, record.confirmed_gestation_days)
    {
        let service_date = confirmed_on.checked_sub_days(Days::new(u64::from(days)))?;
        let elapsed = i64::from(days) + days_between(confirmed_on, today);
        return Some(GestationBasis {
            service_date,
            source: BasisSource::Confirmation,
            current_days: clamp_days(elapsed),
        });
    }

    let service_date = record.service_date?;
    Some(GestationBasis {
        service_date,
        source: BasisSource::Service,
        current_days: clamp_days(days_between(service_date, today)),
    })
}

/// Trimester for a gestation-day count.
pub fn trimester_for(days: u32) -> Trimester {
    if days <= FIRST_TRIMESTER_LAST_DAY {
        Trimester::First
    } else if days <= SECOND_TRIMESTER_LAST_DAY {
        Trimester::Second
    } else {
        Trimester::Third
    }
}

/// `current − initial` when both weights are known.
pub fn weight_gain(initial: Option<f64>, current: Option<f64>) -> Option<f64> {
    Some(current? - initial?)
}

/// Recompute due date, gestation days and trimester in place.
///
/// Returns `false` (and leaves the fields untouched) when no basis date can
/// be resolved.
pub fn recompute_dates(record: &mut GestationRecord, today: NaiveDate) -> bool {
    let Some(basis) = resolve_basis(record, today) else {
        trace!(record_id = %record.record_id, "no basis date, derived fields unchanged");
        return false;
    };
    let Some(due) = basis.due_date() else {
        return false;
    };

    record.estimated_due_date = Some(due);
    record.current_gestation_days = Some(basis.current_days);
    record.trimester = Some(basis.trimester());
    trace!(
        record_id = %record.record_id,
        source = ?basis.source,
        due = %due,
        days = basis.current_days,
        "recomputed gestation dates"
    );
    true
}

/// Recompute the weight gain in place.
pub fn recompute_weight_gain(record: &mut GestationRecord) {
    record.weight_gain = weight_gain(record.initial_weight, record.current_weight);
}

/// All derived fields of `record` as of `today`.
pub fn derive(record: &GestationRecord, today: NaiveDate) -> GestationRecord {
    let mut derived = record.clone();
    recompute_dates(&mut derived, today);
    recompute_weight_gain(&mut derived);
    derived
}

/// Merge `update` into `record` and recompute what the change set affects.
///
/// Date fields are recomputed only when a date input changed; weight gain
/// only when a weight changed.
pub fn apply_update(
    record: &GestationRecord,
    update: &GestationUpdate,
    today: NaiveDate,
) -> GestationRecord {
    let mut next = record.clone();

    if let Some(date) = update.service_date {
        next.service_date = Some(date);
    }
    if let Some(service_type) = update.service_type {
        next.service_type = service_type;
    }
    if let Some(sire) = &update.sire {
        next.sire = Some(sire.clone());
    }
    if let Some(technician) = &update.technician {
        next.technician = Some(technician.clone());
    }
    if let Some(date) = update.confirmation_date {
        next.confirmation_date = Some(date);
    }
    if let Some(days) = update.confirmed_gestation_days {
        next.confirmed_gestation_days = Some(days);
    }
    if let Some(weight) = update.initial_weight {
        next.initial_weight = Some(weight);
    }
    if let Some(weight) = update.current_weight {
        next.current_weight = Some(weight);
    }
    if let Some(entry) = &update.tracking_entry {
        if let Some(weight) = entry.weight_kg {
            // First weighing doubles as the baseline
            if next.initial_weight.is_none() {
                next.initial_weight = Some(weight);
            }
            next.current_weight = Some(weight);
        }
        next.tracking.push(entry.clone());
    }
    if let Some(state) = update.outcome_state {
        next.outcome_state = state;
    }
    if let Some(date) = update.outcome_date {
        next.outcome_date = Some(date);
    }
    if let Some(notes) = &update.notes {
        next.notes = Some(notes.clone());
    }

    if update.touches_dates() {
        recompute_dates(&mut next, today);
    }
    if update.touches_weights() {
        recompute_weight_gain(&mut next);
    }
    next
}

fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

fn clamp_days(days: i64) -> u32 {
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OutcomeState, ServiceType, TrackingEntry};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn serviced_on(d: NaiveDate) -> GestationRecord {
        GestationRecord::new("animal-1".into(), ServiceType::ArtificialInsemination, Some(d))
    }

    #[test]
    fn test_service_date_basis() {
        let record = serviced_on(date(2024, 1, 1));
        let derived = derive(&record, date(2024, 4, 15));

        assert_eq!(derived.estimated_due_date, Some(date(2024, 10, 10)));
        assert_eq!(derived.current_gestation_days, Some(105));
        assert_eq!(derived.trimester, Some(Trimester::Second));
    }

    #[test]
    fn test_confirmation_basis() {
        let mut record = GestationRecord::new("animal-1".into(), ServiceType::NaturalMating, None);
        record.confirmation_date = Some(date(2024, 3, 1));
        record.confirmed_gestation_days = Some(60);

        let basis = resolve_basis(&record, date(2024, 3, 1)).unwrap();
        assert_eq!(basis.source, BasisSource::Confirmation);
        assert_eq!(basis.service_date, date(2024, 1, 1));
        assert_eq!(basis.current_days, 60);

        let derived = derive(&record, date(2024, 3, 1));
        assert_eq!(derived.estimated_due_date, Some(date(2024, 10, 10)));
        assert_eq!(derived.current_gestation_days, Some(60));
        assert_eq!(derived.trimester, Some(Trimester::First));
    }

    #[test]
    fn test_confirmation_wins_over_service_date() {
        let mut record = serviced_on(date(2024, 2, 1));
        record.confirmation_date = Some(date(2024, 3, 1));
        record.confirmed_gestation_days = Some(60);

        let basis = resolve_basis(&record, date(2024, 3, 11)).unwrap();
        assert_eq!(basis.source, BasisSource::Confirmation);
        assert_eq!(basis.service_date, date(2024, 1, 1));
        assert_eq!(basis.current_days, 70);
    }

    #[test]
    fn test_partial_confirmation_falls_back_to_service_date() {
        let mut record = serviced_on(date(2024, 2, 1));
        record.confirmation_date = Some(date(2024, 3, 1));

        let basis = resolve_basis(&record, date(2024, 3, 1)).unwrap();
        assert_eq!(basis.source, BasisSource::Service);
        assert_eq!(basis.current_days, 29);
    }

    #[test]
    fn test_days_clamped_before_service() {
        let record = serviced_on(date(2024, 6, 1));
        let derived = derive(&record, date(2024, 5, 1));
        assert_eq!(derived.current_gestation_days, Some(0));
        assert_eq!(derived.trimester, Some(Trimester::First));
    }

    #[test]
    fn test_no_basis_leaves_fields_unchanged() {
        let mut record = GestationRecord::new("animal-1".into(), ServiceType::NaturalMating, None);
        record.confirmation_date = Some(date(2024, 3, 1));
        record.estimated_due_date = Some(date(2030, 1, 1));

        let changed = recompute_dates(&mut record, date(2024, 4, 1));
        assert!(!changed);
        assert_eq!(record.estimated_due_date, Some(date(2030, 1, 1)));
        assert_eq!(record.current_gestation_days, None);
        assert_eq!(record.trimester, None);
    }

    #[test]
    fn test_trimester_boundaries() {
        assert_eq!(trimester_for(0), Trimester::First);
        assert_eq!(trimester_for(94), Trimester::First);
        assert_eq!(trimester_for(95), Trimester::Second);
        assert_eq!(trimester_for(189), Trimester::Second);
        assert_eq!(trimester_for(190), Trimester::Third);
        assert_eq!(trimester_for(400), Trimester::Third);
    }

    #[test]
    fn test_weight_gain() {
        let gain = weight_gain(Some(450.0), Some(475.2)).unwrap();
        assert!((gain - 25.2).abs() < 1e-9);
        assert_eq!(weight_gain(None, Some(475.2)), None);
        assert_eq!(weight_gain(Some(450.0), None), None);
    }

    #[test]
    fn test_outcome_update_does_not_recompute() {
        let record = derive(&serviced_on(date(2024, 1, 1)), date(2024, 2, 1));
        assert_eq!(record.current_gestation_days, Some(31));

        let update = GestationUpdate {
            outcome_state: Some(OutcomeState::Complications),
            notes: Some("vet visit".into()),
            ..Default::default()
        };
        let next = apply_update(&record, &update, date(2024, 5, 1));
        assert_eq!(next.outcome_state, OutcomeState::Complications);
        assert_eq!(next.current_gestation_days, Some(31));
    }

    #[test]
    fn test_confirmation_update_recomputes() {
        let record = derive(&serviced_on(date(2024, 2, 1)), date(2024, 3, 1));
        assert_eq!(record.estimated_due_date, Some(date(2024, 11, 10)));

        let update = GestationUpdate {
            confirmation_date: Some(date(2024, 3, 1)),
            confirmed_gestation_days: Some(60),
            ..Default::default()
        };
        let next = apply_update(&record, &update, date(2024, 3, 1));
        assert_eq!(next.estimated_due_date, Some(date(2024, 10, 10)));
        assert_eq!(next.current_gestation_days, Some(60));
    }

    #[test]
    fn test_tracking_entry_updates_weights() {
        let record = serviced_on(date(2024, 1, 1));
        let first = GestationUpdate {
            tracking_entry: Some(TrackingEntry {
                date: date(2024, 2, 1),
                weight_kg: Some(450.0),
                notes: None,
            }),
            ..Default::default()
        };
        let record = apply_update(&record, &first, date(2024, 2, 1));
        assert_eq!(record.initial_weight, Some(450.0));
        assert_eq!(record.weight_gain, Some(0.0));

        let second = GestationUpdate {
            tracking_entry: Some(TrackingEntry {
                date: date(2024, 3, 1),
                weight_kg: Some(475.2),
                notes: Some("good condition".into()),
            }),
            ..Default::default()
        };
        let record = apply_update(&record, &second, date(2024, 3, 1));
        assert_eq!(record.tracking.len(), 2);
        assert_eq!(record.current_weight, Some(475.2));
        assert!((record.weight_gain.unwrap() - 25.2).abs() < 1e-9);
    }

    #[test]
    fn test_terminal_state_can_be_reopened() {
        let mut record = serviced_on(date(2024, 1, 1));
        record.outcome_state = OutcomeState::SuccessfulBirth;
        let update = GestationUpdate {
            outcome_state: Some(OutcomeState::InGestation),
            ..Default::default()
        };
        let next = apply_update(&record, &update, date(2024, 11, 1));
        assert_eq!(next.outcome_state, OutcomeState::InGestation);
    }
}
