//! Farm dashboard: counts, sums and calving listings.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::{Database, DbResult};
use crate::gestation::{
    self, days_until_due, due_proximity, in_critical_day_band, in_near_day_band, DueProximity,
};
use crate::models::{
    AnimalMilkTotal, GestationRecord, HealthProcedure, PastureOccupancy, Sex, Trimester,
};

/// Days covered by the rolling milk total, including today.
pub const MILK_TREND_DAYS: u64 = 7;

/// A pregnancy listed on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GestationAlert {
    pub record_id: String,
    pub animal_id: String,
    pub tag: String,
    pub estimated_due_date: Option<NaiveDate>,
    pub current_gestation_days: Option<u32>,
    pub days_until_due: Option<i64>,
}

/// Counts of in-progress pregnancies by trimester.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrimesterCounts {
    pub first: u32,
    pub second: u32,
    pub third: u32,
    /// No basis date recorded yet
    pub unknown: u32,
}

/// Herd overview as of one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    pub as_of: NaiveDate,
    pub active_animals: u32,
    pub animals_by_species: BTreeMap<String, u32>,
    pub females: u32,
    pub males: u32,
    pub gestations_in_progress: u32,
    pub trimesters: TrimesterCounts,
    /// Due within 30 days (countdown)
    pub near_term: Vec<GestationAlert>,
    /// Due within 14 days (countdown)
    pub critical_period: Vec<GestationAlert>,
    /// Past the estimated due date and still open
    pub overdue: Vec<GestationAlert>,
    /// Gestation day 253–269
    pub near_by_day_count: Vec<GestationAlert>,
    /// Gestation day 269–283
    pub critical_by_day_count: Vec<GestationAlert>,
    pub milk_liters_today: f64,
    pub milk_liters_last_7_days: f64,
    pub upcoming_procedures: Vec<HealthProcedure>,
    pub pastures: Vec<PastureOccupancy>,
}

impl DashboardSummary {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Dashboard builder.
pub struct Dashboard<'a> {
    db: &'a Database,
    health_window_days: u32,
}

impl<'a> Dashboard<'a> {
    /// Create a dashboard with a 7-day health reminder window.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            health_window_days: 7,
        }
    }

    /// Set how far ahead health repeats are listed.
    pub fn with_health_window(mut self, days: u32) -> Self {
        self.health_window_days = days;
        self
    }

    /// Build the overview as of `today`.
    ///
    /// Derived gestation fields are refreshed against `today` first, so a
    /// record saved weeks ago is classified by its current day count.
    pub fn summary(&self, today: NaiveDate) -> DbResult<DashboardSummary> {
        let animals = self.db.list_active_animals()?;
        let tags: BTreeMap<&str, &str> = animals
            .iter()
            .map(|a| (a.local_id.as_str(), a.tag.as_str()))
            .collect();

        let mut animals_by_species = BTreeMap::new();
        let (mut females, mut males) = (0, 0);
        for animal in &animals {
            *animals_by_species.entry(animal.canonical_species()).or_insert(0) += 1;
            match animal.sex {
                Sex::Female => females += 1,
                Sex::Male => males += 1,
            }
        }

        // Pregnancies of deactivated animals are not listed
        let gestations: Vec<GestationRecord> = self
            .db
            .list_in_progress_gestations()?
            .iter()
            .filter(|g| tags.contains_key(g.animal_id.as_str()))
            .map(|g| gestation::derive(g, today))
            .collect();

        let mut trimesters = TrimesterCounts::default();
        let mut near_term = Vec::new();
        let mut critical_period = Vec::new();
        let mut overdue = Vec::new();
        let mut near_by_day_count = Vec::new();
        let mut critical_by_day_count = Vec::new();

        for record in &gestations {
            match record.trimester {
                Some(Trimester::First) => trimesters.first += 1,
                Some(Trimester::Second) => trimesters.second += 1,
                Some(Trimester::Third) => trimesters.third += 1,
                None => trimesters.unknown += 1,
            }

            let tag = tags.get(record.animal_id.as_str()).copied().unwrap_or_default();
            let alert = alert_for(record, tag, today);

            if let Some(days) = alert.days_until_due {
                match due_proximity(days) {
                    DueProximity::CriticalPeriod => {
                        critical_period.push(alert.clone());
                        near_term.push(alert.clone());
                    }
                    DueProximity::NearTerm => near_term.push(alert.clone()),
                    DueProximity::Overdue => overdue.push(alert.clone()),
                    DueProximity::Distant => {}
                }
            }
            if let Some(days) = record.current_gestation_days {
                if in_near_day_band(days) {
                    near_by_day_count.push(alert.clone());
                }
                if in_critical_day_band(days) {
                    critical_by_day_count.push(alert.clone());
                }
            }
        }

        for list in [
            &mut near_term,
            &mut critical_period,
            &mut overdue,
            &mut near_by_day_count,
            &mut critical_by_day_count,
        ] {
            list.sort_by(|a, b| a.estimated_due_date.cmp(&b.estimated_due_date));
        }

        let week_start = today
            .checked_sub_days(Days::new(MILK_TREND_DAYS - 1))
            .unwrap_or(today);

        let summary = DashboardSummary {
            as_of: today,
            active_animals: count(&animals),
            animals_by_species,
            females,
            males,
            gestations_in_progress: count(&gestations),
            trimesters,
            near_term,
            critical_period,
            overdue,
            near_by_day_count,
            critical_by_day_count,
            milk_liters_today: self.db.total_liters_between(today, today)?,
            milk_liters_last_7_days: self.db.total_liters_between(week_start, today)?,
            upcoming_procedures: self
                .db
                .list_upcoming_procedures(today, self.health_window_days)?,
            pastures: self.db.pasture_occupancy()?,
        };

        debug!(
            as_of = %today,
            animals = summary.active_animals,
            gestations = summary.gestations_in_progress,
            "built dashboard"
        );
        Ok(summary)
    }

    /// Milk totals per animal between `from` and `to` (inclusive).
    pub fn milk_by_animal(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<AnimalMilkTotal>> {
        self.db.liters_by_animal_between(from, to)
    }
}

fn alert_for(record: &GestationRecord, tag: &str, today: NaiveDate) -> GestationAlert {
    GestationAlert {
        record_id: record.record_id.clone(),
        animal_id: record.animal_id.clone(),
        tag: tag.to_string(),
        estimated_due_date: record.estimated_due_date,
        current_gestation_days: record.current_gestation_days,
        days_until_due: days_until_due(record, today),
    }
}

fn count<T>(items: &[T]) -> u32 {
    u32::try_from(items.len()).unwrap_or(u32::MAX)
}
