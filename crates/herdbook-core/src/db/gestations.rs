//! Gestation database operations.
//!
//! Writes go through the calculator first so derived columns always match
//! their inputs.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use super::{stored, timestamp, Database, DbError, DbResult};
use crate::gestation;
use crate::models::{
    GestationRecord, GestationUpdate, OutcomeState, ServiceType, TrackingEntry, Trimester,
};

const GESTATION_COLUMNS: &str = "record_id, animal_id, service_date, service_type, sire, \
    technician, confirmation_date, confirmed_gestation_days, estimated_due_date, \
    current_gestation_days, trimester, initial_weight, current_weight, weight_gain, tracking, \
    outcome_state, outcome_date, notes, active, created_at, updated_at";

/// Details of a service event.
#[derive(Debug, Clone)]
pub struct ServiceEvent {
    pub service_type: ServiceType,
    pub service_date: Option<NaiveDate>,
    pub sire: Option<String>,
    pub technician: Option<String>,
}

impl Database {
    /// Insert a gestation record as given.
    ///
    /// Prefer [`Database::log_service`], which derives the computed fields.
    pub fn insert_gestation(&self, record: &GestationRecord) -> DbResult<()> {
        record.validate()?;
        self.require_active_animal(&record.animal_id)?;
        let tracking_json = serde_json::to_string(&record.tracking)?;

        self.conn.execute(
            &format!(
                "INSERT INTO gestations ({}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
                GESTATION_COLUMNS
            ),
            params![
                record.record_id,
                record.animal_id,
                record.service_date,
                record.service_type.as_str(),
                record.sire,
                record.technician,
                record.confirmation_date,
                record.confirmed_gestation_days,
                record.estimated_due_date,
                record.current_gestation_days,
                record.trimester.map(|t| t.number()),
                record.initial_weight,
                record.current_weight,
                record.weight_gain,
                tracking_json,
                record.outcome_state.as_str(),
                record.outcome_date,
                record.notes,
                record.active,
                record.created_at,
                record.updated_at,
            ],
        )?;
        debug!(record_id = %record.record_id, animal_id = %record.animal_id, "inserted gestation");
        Ok(())
    }

    /// Write every field of an existing gestation record.
    pub fn update_gestation(&self, record: &GestationRecord) -> DbResult<bool> {
        record.validate()?;
        let tracking_json = serde_json::to_string(&record.tracking)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE gestations SET
                service_date = ?2,
                service_type = ?3,
                sire = ?4,
                technician = ?5,
                confirmation_date = ?6,
                confirmed_gestation_days = ?7,
                estimated_due_date = ?8,
                current_gestation_days = ?9,
                trimester = ?10,
                initial_weight = ?11,
                current_weight = ?12,
                weight_gain = ?13,
                tracking = ?14,
                outcome_state = ?15,
                outcome_date = ?16,
                notes = ?17,
                updated_at = ?18
            WHERE record_id = ?1
            "#,
            params![
                record.record_id,
                record.service_date,
                record.service_type.as_str(),
                record.sire,
                record.technician,
                record.confirmation_date,
                record.confirmed_gestation_days,
                record.estimated_due_date,
                record.current_gestation_days,
                record.trimester.map(|t| t.number()),
                record.initial_weight,
                record.current_weight,
                record.weight_gain,
                tracking_json,
                record.outcome_state.as_str(),
                record.outcome_date,
                record.notes,
                record.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Create a gestation record for a service event on an active animal.
    pub fn log_service(
        &self,
        animal_id: &str,
        event: ServiceEvent,
        today: NaiveDate,
    ) -> DbResult<GestationRecord> {
        let mut record =
            GestationRecord::new(animal_id.to_string(), event.service_type, event.service_date);
        record.sire = event.sire;
        record.technician = event.technician;

        let record = gestation::derive(&record, today);
        self.insert_gestation(&record)?;
        info!(
            record_id = %record.record_id,
            animal_id = %animal_id,
            due = ?record.estimated_due_date,
            "logged service"
        );
        Ok(record)
    }

    /// Apply a partial update, recompute affected fields and persist.
    pub fn save_gestation_update(
        &self,
        record_id: &str,
        update: &GestationUpdate,
        today: NaiveDate,
    ) -> DbResult<GestationRecord> {
        update.validate()?;
        let current = self
            .get_gestation(record_id)?
            .filter(|r| r.active)
            .ok_or_else(|| DbError::NotFound(format!("gestation {}", record_id)))?;

        let mut next = gestation::apply_update(&current, update, today);
        next.touch();
        self.update_gestation(&next)?;

        if current.outcome_state != next.outcome_state {
            info!(
                record_id = %record_id,
                from = current.outcome_state.as_str(),
                to = next.outcome_state.as_str(),
                "gestation outcome changed"
            );
        }
        Ok(next)
    }

    /// Get a gestation record by ID, active or not.
    pub fn get_gestation(&self, record_id: &str) -> DbResult<Option<GestationRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM gestations WHERE record_id = ?",
                    GESTATION_COLUMNS
                ),
                [record_id],
                read_gestation_row,
            )
            .optional()?
            .map(GestationRecord::try_from)
            .transpose()
    }

    /// List active gestation records, newest service first.
    pub fn list_active_gestations(&self) -> DbResult<Vec<GestationRecord>> {
        self.query_gestations(
            &format!(
                "SELECT {} FROM gestations WHERE active = 1 \
                 ORDER BY service_date DESC, created_at DESC",
                GESTATION_COLUMNS
            ),
            [],
        )
    }

    /// List active pregnancies still in progress.
    pub fn list_in_progress_gestations(&self) -> DbResult<Vec<GestationRecord>> {
        self.query_gestations(
            &format!(
                "SELECT {} FROM gestations WHERE active = 1 AND outcome_state = ? \
                 ORDER BY estimated_due_date",
                GESTATION_COLUMNS
            ),
            [OutcomeState::InGestation.as_str()],
        )
    }

    /// List active gestation records of one animal.
    pub fn list_gestations_for_animal(&self, animal_id: &str) -> DbResult<Vec<GestationRecord>> {
        self.query_gestations(
            &format!(
                "SELECT {} FROM gestations WHERE animal_id = ? AND active = 1 \
                 ORDER BY service_date DESC, created_at DESC",
                GESTATION_COLUMNS
            ),
            [animal_id],
        )
    }

    /// Soft-delete a gestation record.
    pub fn deactivate_gestation(&self, record_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE gestations SET active = 0, updated_at = ?2
             WHERE record_id = ?1 AND active = 1",
            params![record_id, timestamp()],
        )?;
        if rows_affected > 0 {
            debug!(record_id = %record_id, "deactivated gestation");
        }
        Ok(rows_affected > 0)
    }

    fn query_gestations<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> DbResult<Vec<GestationRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, read_gestation_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }
}

/// Intermediate row struct for database mapping.
struct GestationRow {
    record_id: String,
    animal_id: String,
    service_date: Option<NaiveDate>,
    service_type: String,
    sire: Option<String>,
    technician: Option<String>,
    confirmation_date: Option<NaiveDate>,
    confirmed_gestation_days: Option<u32>,
    estimated_due_date: Option<NaiveDate>,
    current_gestation_days: Option<u32>,
    trimester: Option<u8>,
    initial_weight: Option<f64>,
    current_weight: Option<f64>,
    weight_gain: Option<f64>,
    tracking: String,
    outcome_state: String,
    outcome_date: Option<NaiveDate>,
    notes: Option<String>,
    active: bool,
    created_at: String,
    updated_at: String,
}

fn read_gestation_row(row: &Row<'_>) -> rusqlite::Result<GestationRow> {
    Ok(GestationRow {
        record_id: row.get(0)?,
        animal_id: row.get(1)?,
        service_date: row.get(2)?,
        service_type: row.get(3)?,
        sire: row.get(4)?,
        technician: row.get(5)?,
        confirmation_date: row.get(6)?,
        confirmed_gestation_days: row.get(7)?,
        estimated_due_date: row.get(8)?,
        current_gestation_days: row.get(9)?,
        trimester: row.get(10)?,
        initial_weight: row.get(11)?,
        current_weight: row.get(12)?,
        weight_gain: row.get(13)?,
        tracking: row.get(14)?,
        outcome_state: row.get(15)?,
        outcome_date: row.get(16)?,
        notes: row.get(17)?,
        active: row.get(18)?,
        created_at: row.get(19)?,
        updated_at: row.get(20)?,
    })
}

impl TryFrom<GestationRow> for GestationRecord {
    type Error = DbError;

    fn try_from(row: GestationRow) -> Result<Self, Self::Error> {
        let tracking: Vec<TrackingEntry> = serde_json::from_str(&row.tracking)?;
        let trimester = row
            .trimester
            .map(|n| stored(Trimester::try_from(n)))
            .transpose()?;

        Ok(GestationRecord {
            record_id: row.record_id,
            animal_id: row.animal_id,
            service_date: row.service_date,
            service_type: stored(row.service_type.parse::<ServiceType>())?,
            sire: row.sire,
            technician: row.technician,
            confirmation_date: row.confirmation_date,
            confirmed_gestation_days: row.confirmed_gestation_days,
            estimated_due_date: row.estimated_due_date,
            current_gestation_days: row.current_gestation_days,
            trimester,
            initial_weight: row.initial_weight,
            current_weight: row.current_weight,
            weight_gain: row.weight_gain,
            tracking,
            outcome_state: stored(row.outcome_state.parse::<OutcomeState>())?,
            outcome_date: row.outcome_date,
            notes: row.notes,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
