//! Health procedure database operations.

use chrono::{Days, NaiveDate};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{stored, Database, DbError, DbResult};
use crate::models::{HealthProcedure, ProcedureKind};

const PROCEDURE_COLUMNS: &str = "procedure_id, animal_id, date, kind, description, product, dose, \
                                 veterinarian, next_due_date, notes, active, created_at";

impl Database {
    /// Record a procedure for an active animal.
    pub fn insert_health_procedure(&self, procedure: &HealthProcedure) -> DbResult<()> {
        procedure.validate()?;
        self.require_active_animal(&procedure.animal_id)?;
        self.conn.execute(
            &format!(
                "INSERT INTO health_procedures ({}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                PROCEDURE_COLUMNS
            ),
            params![
                procedure.procedure_id,
                procedure.animal_id,
                procedure.date,
                procedure.kind.as_str(),
                procedure.description,
                procedure.product,
                procedure.dose,
                procedure.veterinarian,
                procedure.next_due_date,
                procedure.notes,
                procedure.active,
                procedure.created_at,
            ],
        )?;
        debug!(
            procedure_id = %procedure.procedure_id,
            animal_id = %procedure.animal_id,
            kind = procedure.kind.as_str(),
            "inserted health procedure"
        );
        Ok(())
    }

    /// Update an active procedure.
    pub fn update_health_procedure(&self, procedure: &HealthProcedure) -> DbResult<bool> {
        procedure.validate()?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE health_procedures SET
                date = ?2,
                kind = ?3,
                description = ?4,
                product = ?5,
                dose = ?6,
                veterinarian = ?7,
                next_due_date = ?8,
                notes = ?9
            WHERE procedure_id = ?1 AND active = 1
            "#,
            params![
                procedure.procedure_id,
                procedure.date,
                procedure.kind.as_str(),
                procedure.description,
                procedure.product,
                procedure.dose,
                procedure.veterinarian,
                procedure.next_due_date,
                procedure.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn get_health_procedure(&self, procedure_id: &str) -> DbResult<Option<HealthProcedure>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM health_procedures WHERE procedure_id = ?",
                    PROCEDURE_COLUMNS
                ),
                [procedure_id],
                read_procedure_row,
            )
            .optional()?
            .map(HealthProcedure::try_from)
            .transpose()
    }

    /// Active procedures of one animal, most recent first.
    pub fn list_procedures_for_animal(&self, animal_id: &str) -> DbResult<Vec<HealthProcedure>> {
        self.query_procedures(
            &format!(
                "SELECT {} FROM health_procedures WHERE animal_id = ?1 AND active = 1 \
                 ORDER BY date DESC",
                PROCEDURE_COLUMNS
            ),
            params![animal_id],
        )
    }

    /// Procedures due for a repeat within `window_days` of `today`, on
    /// active animals, soonest first.
    pub fn list_upcoming_procedures(
        &self,
        today: NaiveDate,
        window_days: u32,
    ) -> DbResult<Vec<HealthProcedure>> {
        let until = today.checked_add_days(Days::new(u64::from(window_days)));
        self.query_procedures(
            &format!(
                r#"
                SELECT {} FROM health_procedures
                WHERE active = 1
                  AND next_due_date >= ?1
                  AND (?2 IS NULL OR next_due_date <= ?2)
                  AND animal_id IN (SELECT local_id FROM animals WHERE active = 1)
                ORDER BY next_due_date
                "#,
                PROCEDURE_COLUMNS
            ),
            params![today, until],
        )
    }

    /// Soft-delete a procedure.
    pub fn deactivate_health_procedure(&self, procedure_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE health_procedures SET active = 0 WHERE procedure_id = ? AND active = 1",
            [procedure_id],
        )?;
        Ok(rows_affected > 0)
    }

    fn query_procedures<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> DbResult<Vec<HealthProcedure>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, read_procedure_row)?;

        let mut procedures = Vec::new();
        for row in rows {
            procedures.push(row?.try_into()?);
        }
        Ok(procedures)
    }
}

/// Intermediate row struct for database mapping.
struct ProcedureRow {
    procedure_id: String,
    animal_id: String,
    date: NaiveDate,
    kind: String,
    description: String,
    product: Option<String>,
    dose: Option<String>,
    veterinarian: Option<String>,
    next_due_date: Option<NaiveDate>,
    notes: Option<String>,
    active: bool,
    created_at: String,
}

fn read_procedure_row(row: &Row<'_>) -> rusqlite::Result<ProcedureRow> {
    Ok(ProcedureRow {
        procedure_id: row.get(0)?,
        animal_id: row.get(1)?,
        date: row.get(2)?,
        kind: row.get(3)?,
        description: row.get(4)?,
        product: row.get(5)?,
        dose: row.get(6)?,
        veterinarian: row.get(7)?,
        next_due_date: row.get(8)?,
        notes: row.get(9)?,
        active: row.get(10)?,
        created_at: row.get(11)?,
    })
}

impl TryFrom<ProcedureRow> for HealthProcedure {
    type Error = DbError;

    fn try_from(row: ProcedureRow) -> Result<Self, Self::Error> {
        Ok(HealthProcedure {
            procedure_id: row.procedure_id,
            animal_id: row.animal_id,
            date: row.date,
            kind: stored(row.kind.parse::<ProcedureKind>())?,
            description: row.description,
            product: row.product,
            dose: row.dose,
            veterinarian: row.veterinarian,
            next_due_date: row.next_due_date,
            notes: row.notes,
            active: row.active,
            created_at: row.created_at,
        })
    }
}
