//! Milk production database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{stored, Database, DbError, DbResult};
use crate::models::{AnimalMilkTotal, MilkRecord, MilkSession};

const MILK_COLUMNS: &str = "record_id, animal_id, date, session, liters, notes, active, created_at";

impl Database {
    /// Record a milking for an active animal.
    pub fn insert_milk_record(&self, record: &MilkRecord) -> DbResult<()> {
        record.validate()?;
        self.require_active_animal(&record.animal_id)?;
        self.conn.execute(
            &format!(
                "INSERT INTO milk_records ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                MILK_COLUMNS
            ),
            params![
                record.record_id,
                record.animal_id,
                record.date,
                record.session.as_str(),
                record.liters,
                record.notes,
                record.active,
                record.created_at,
            ],
        )?;
        debug!(record_id = %record.record_id, animal_id = %record.animal_id, liters = record.liters, "inserted milk record");
        Ok(())
    }

    /// Correct the yield or notes of a milking.
    pub fn update_milk_record(&self, record: &MilkRecord) -> DbResult<bool> {
        record.validate()?;
        let rows_affected = self.conn.execute(
            "UPDATE milk_records SET date = ?2, session = ?3, liters = ?4, notes = ?5
             WHERE record_id = ?1 AND active = 1",
            params![
                record.record_id,
                record.date,
                record.session.as_str(),
                record.liters,
                record.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn get_milk_record(&self, record_id: &str) -> DbResult<Option<MilkRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM milk_records WHERE record_id = ?", MILK_COLUMNS),
                [record_id],
                read_milk_row,
            )
            .optional()?
            .map(MilkRecord::try_from)
            .transpose()
    }

    /// Active milkings of one animal between `from` and `to` (inclusive).
    pub fn list_milk_for_animal(
        &self,
        animal_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<MilkRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM milk_records
            WHERE animal_id = ?1 AND active = 1 AND date BETWEEN ?2 AND ?3
            ORDER BY date,
                CASE session WHEN 'morning' THEN 0 WHEN 'afternoon' THEN 1 ELSE 2 END
            "#,
            MILK_COLUMNS
        ))?;
        let rows = stmt.query_map(params![animal_id, from, to], read_milk_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }

    /// Total liters over active records between `from` and `to` (inclusive).
    pub fn total_liters_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<f64> {
        let total: f64 = self.conn.query_row(
            "SELECT COALESCE(SUM(liters), 0.0) FROM milk_records
             WHERE active = 1 AND date BETWEEN ?1 AND ?2",
            params![from, to],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Per-animal totals between `from` and `to`, highest producer first.
    pub fn liters_by_animal_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<AnimalMilkTotal>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT m.animal_id, a.tag, SUM(m.liters), COUNT(*)
            FROM milk_records m
            JOIN animals a ON a.local_id = m.animal_id
            WHERE m.active = 1 AND m.date BETWEEN ?1 AND ?2
            GROUP BY m.animal_id, a.tag
            ORDER BY SUM(m.liters) DESC, a.tag
            "#,
        )?;
        let rows = stmt.query_map(params![from, to], |row| {
            Ok(AnimalMilkTotal {
                animal_id: row.get(0)?,
                tag: row.get(1)?,
                liters: row.get(2)?,
                milkings: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Soft-delete a milking.
    pub fn deactivate_milk_record(&self, record_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE milk_records SET active = 0 WHERE record_id = ? AND active = 1",
            [record_id],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct MilkRow {
    record_id: String,
    animal_id: String,
    date: NaiveDate,
    session: String,
    liters: f64,
    notes: Option<String>,
    active: bool,
    created_at: String,
}

fn read_milk_row(row: &Row<'_>) -> rusqlite::Result<MilkRow> {
    Ok(MilkRow {
        record_id: row.get(0)?,
        animal_id: row.get(1)?,
        date: row.get(2)?,
        session: row.get(3)?,
        liters: row.get(4)?,
        notes: row.get(5)?,
        active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl TryFrom<MilkRow> for MilkRecord {
    type Error = DbError;

    fn try_from(row: MilkRow) -> Result<Self, Self::Error> {
        Ok(MilkRecord {
            record_id: row.record_id,
            animal_id: row.animal_id,
            date: row.date,
            session: stored(row.session.parse::<MilkSession>())?,
            liters: row.liters,
            notes: row.notes,
            active: row.active,
            created_at: row.created_at,
        })
    }
}
