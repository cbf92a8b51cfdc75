//! Animal database operations.

use chrono::NaiveDate;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use tracing::debug;

use super::{stored, timestamp, Database, DbError, DbResult};
use crate::models::{Animal, Sex};

const ANIMAL_COLUMNS: &str = "local_id, tag, name, species, breed, sex, birth_date, weight_kg, \
                              pasture_id, notes, active, created_at, updated_at";

impl Database {
    /// Insert a new animal.
    pub fn insert_animal(&self, animal: &Animal) -> DbResult<()> {
        animal.validate()?;
        self.conn
            .execute(
                r#"
                INSERT INTO animals (
                    local_id, tag, name, species, breed, sex, birth_date, weight_kg,
                    pasture_id, notes, active, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
                params![
                    animal.local_id,
                    animal.tag,
                    animal.name,
                    animal.species,
                    animal.breed,
                    animal.sex.as_str(),
                    animal.birth_date,
                    animal.weight_kg,
                    animal.pasture_id,
                    animal.notes,
                    animal.active,
                    animal.created_at,
                    animal.updated_at,
                ],
            )
            .map_err(|e| tag_conflict(e, &animal.tag))?;
        debug!(animal_id = %animal.local_id, tag = %animal.tag, "inserted animal");
        Ok(())
    }

    /// Update descriptive fields of an animal.
    ///
    /// Pasture and active flag are managed by their own operations.
    pub fn update_animal(&self, animal: &Animal) -> DbResult<bool> {
        animal.validate()?;
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE animals SET
                    tag = ?2,
                    name = ?3,
                    species = ?4,
                    breed = ?5,
                    sex = ?6,
                    birth_date = ?7,
                    weight_kg = ?8,
                    notes = ?9,
                    updated_at = ?10
                WHERE local_id = ?1
                "#,
                params![
                    animal.local_id,
                    animal.tag,
                    animal.name,
                    animal.species,
                    animal.breed,
                    animal.sex.as_str(),
                    animal.birth_date,
                    animal.weight_kg,
                    animal.notes,
                    timestamp(),
                ],
            )
            .map_err(|e| tag_conflict(e, &animal.tag))?;
        Ok(rows_affected > 0)
    }

    /// Get an animal by local ID, active or not.
    pub fn get_animal(&self, local_id: &str) -> DbResult<Option<Animal>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM animals WHERE local_id = ?", ANIMAL_COLUMNS),
                [local_id],
                read_animal_row,
            )
            .optional()?
            .map(Animal::try_from)
            .transpose()
    }

    /// Get an active animal, or `NotFound`.
    pub fn require_active_animal(&self, local_id: &str) -> DbResult<Animal> {
        match self.get_animal(local_id)? {
            Some(animal) if animal.active => Ok(animal),
            _ => Err(DbError::NotFound(format!("animal {}", local_id))),
        }
    }

    /// Get the active animal carrying a tag.
    pub fn get_animal_by_tag(&self, tag: &str) -> DbResult<Option<Animal>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM animals WHERE tag = ? AND active = 1",
                    ANIMAL_COLUMNS
                ),
                [tag],
                read_animal_row,
            )
            .optional()?
            .map(Animal::try_from)
            .transpose()
    }

    /// List active animals ordered by tag.
    pub fn list_active_animals(&self) -> DbResult<Vec<Animal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM animals WHERE active = 1 ORDER BY tag",
            ANIMAL_COLUMNS
        ))?;
        let rows = stmt.query_map([], read_animal_row)?;

        let mut animals = Vec::new();
        for row in rows {
            animals.push(row?.try_into()?);
        }
        Ok(animals)
    }

    /// Search active animals by tag or name (prefix match).
    pub fn search_animals(&self, query: &str, limit: usize) -> DbResult<Vec<Animal>> {
        let pattern = format!("{}%", escape_like(query));
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM animals
            WHERE active = 1 AND (tag LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\')
            ORDER BY tag
            LIMIT ?2
            "#,
            ANIMAL_COLUMNS
        ))?;
        let rows = stmt.query_map(params![pattern, limit as i64], read_animal_row)?;

        let mut animals = Vec::new();
        for row in rows {
            animals.push(row?.try_into()?);
        }
        Ok(animals)
    }

    /// Soft-delete an animal, closing its open pasture assignment on `on`.
    pub fn deactivate_animal(&self, local_id: &str, on: NaiveDate) -> DbResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE pasture_assignments SET end_date = MAX(start_date, ?2)
             WHERE animal_id = ?1 AND end_date IS NULL",
            params![local_id, on],
        )?;
        let rows_affected = tx.execute(
            "UPDATE animals SET active = 0, pasture_id = NULL, updated_at = ?2
             WHERE local_id = ?1 AND active = 1",
            params![local_id, timestamp()],
        )?;
        tx.commit()?;

        if rows_affected > 0 {
            debug!(animal_id = %local_id, "deactivated animal");
        }
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct AnimalRow {
    local_id: String,
    tag: String,
    name: Option<String>,
    species: String,
    breed: Option<String>,
    sex: String,
    birth_date: Option<NaiveDate>,
    weight_kg: Option<f64>,
    pasture_id: Option<String>,
    notes: Option<String>,
    active: bool,
    created_at: String,
    updated_at: String,
}

fn read_animal_row(row: &Row<'_>) -> rusqlite::Result<AnimalRow> {
    Ok(AnimalRow {
        local_id: row.get(0)?,
        tag: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        breed: row.get(4)?,
        sex: row.get(5)?,
        birth_date: row.get(6)?,
        weight_kg: row.get(7)?,
        pasture_id: row.get(8)?,
        notes: row.get(9)?,
        active: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl TryFrom<AnimalRow> for Animal {
    type Error = DbError;

    fn try_from(row: AnimalRow) -> Result<Self, Self::Error> {
        Ok(Animal {
            local_id: row.local_id,
            tag: row.tag,
            name: row.name,
            species: row.species,
            breed: row.breed,
            sex: stored(row.sex.parse::<Sex>())?,
            birth_date: row.birth_date,
            weight_kg: row.weight_kg,
            pasture_id: row.pasture_id,
            notes: row.notes,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Escape LIKE wildcards so the query matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn tag_conflict(e: rusqlite::Error, tag: &str) -> DbError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _) if err.code == ErrorCode::ConstraintViolation => {
            DbError::Constraint(format!("Tag already in use: {}", tag))
        }
        other => DbError::Sqlite(other),
    }
}
