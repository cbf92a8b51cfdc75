//! Pasture and assignment database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};

use super::{timestamp, Database, DbError, DbResult};
use crate::models::{Pasture, PastureAssignment, PastureOccupancy};

const PASTURE_COLUMNS: &str = "pasture_id, name, area_hectares, capacity, notes, active, created_at";
const ASSIGNMENT_COLUMNS: &str = "assignment_id, animal_id, pasture_id, start_date, end_date";

impl Database {
    /// Insert a new pasture.
    pub fn insert_pasture(&self, pasture: &Pasture) -> DbResult<()> {
        pasture.validate()?;
        self.conn.execute(
            &format!(
                "INSERT INTO pastures ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                PASTURE_COLUMNS
            ),
            params![
                pasture.pasture_id,
                pasture.name,
                pasture.area_hectares,
                pasture.capacity,
                pasture.notes,
                pasture.active,
                pasture.created_at,
            ],
        )?;
        debug!(pasture_id = %pasture.pasture_id, name = %pasture.name, "inserted pasture");
        Ok(())
    }

    /// Update an active pasture.
    pub fn update_pasture(&self, pasture: &Pasture) -> DbResult<bool> {
        pasture.validate()?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE pastures SET
                name = ?2,
                area_hectares = ?3,
                capacity = ?4,
                notes = ?5,
                updated_at = ?6
            WHERE pasture_id = ?1 AND active = 1
            "#,
            params![
                pasture.pasture_id,
                pasture.name,
                pasture.area_hectares,
                pasture.capacity,
                pasture.notes,
                timestamp(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn get_pasture(&self, pasture_id: &str) -> DbResult<Option<Pasture>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pastures WHERE pasture_id = ?", PASTURE_COLUMNS),
                [pasture_id],
                read_pasture_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List active pastures by name.
    pub fn list_active_pastures(&self) -> DbResult<Vec<Pasture>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pastures WHERE active = 1 ORDER BY name",
            PASTURE_COLUMNS
        ))?;
        let rows = stmt.query_map([], read_pasture_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Soft-delete a pasture. Fails while animals still graze on it.
    pub fn deactivate_pasture(&self, pasture_id: &str) -> DbResult<bool> {
        let head: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM animals WHERE pasture_id = ? AND active = 1",
            [pasture_id],
            |row| row.get(0),
        )?;
        if head > 0 {
            return Err(DbError::Constraint(format!(
                "Pasture {} still holds {} animal(s)",
                pasture_id, head
            )));
        }

        let rows_affected = self.conn.execute(
            "UPDATE pastures SET active = 0, updated_at = ?2
             WHERE pasture_id = ?1 AND active = 1",
            params![pasture_id, timestamp()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Move an animal onto a pasture starting `on`.
    ///
    /// Closes the current assignment, opens a new one and updates the
    /// animal's current pasture in one transaction. Moving an animal onto
    /// the pasture it is already on returns the open assignment unchanged.
    pub fn move_animal_to_pasture(
        &self,
        animal_id: &str,
        pasture_id: &str,
        on: NaiveDate,
    ) -> DbResult<PastureAssignment> {
        self.require_active_animal(animal_id)?;
        match self.get_pasture(pasture_id)? {
            Some(p) if p.active => {}
            _ => return Err(DbError::NotFound(format!("pasture {}", pasture_id))),
        }

        if let Some(open) = self.current_assignment(animal_id)? {
            if open.pasture_id == pasture_id {
                return Ok(open);
            }
            if on < open.start_date {
                return Err(DbError::Constraint(format!(
                    "Move date {} precedes current assignment start {}",
                    on, open.start_date
                )));
            }
        }

        let assignment =
            PastureAssignment::open(animal_id.to_string(), pasture_id.to_string(), on);

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE pasture_assignments SET end_date = ?2 WHERE animal_id = ?1 AND end_date IS NULL",
            params![animal_id, on],
        )?;
        tx.execute(
            &format!(
                "INSERT INTO pasture_assignments ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
                ASSIGNMENT_COLUMNS
            ),
            params![
                assignment.assignment_id,
                assignment.animal_id,
                assignment.pasture_id,
                assignment.start_date,
                assignment.end_date,
            ],
        )?;
        tx.execute(
            "UPDATE animals SET pasture_id = ?2, updated_at = ?3 WHERE local_id = ?1",
            params![animal_id, pasture_id, timestamp()],
        )?;
        tx.commit()?;

        info!(animal_id = %animal_id, pasture_id = %pasture_id, on = %on, "moved animal");
        Ok(assignment)
    }

    /// Take an animal off its pasture without assigning a new one.
    pub fn remove_animal_from_pasture(&self, animal_id: &str, on: NaiveDate) -> DbResult<bool> {
        let Some(open) = self.current_assignment(animal_id)? else {
            return Ok(false);
        };
        if on < open.start_date {
            return Err(DbError::Constraint(format!(
                "Removal date {} precedes assignment start {}",
                on, open.start_date
            )));
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE pasture_assignments SET end_date = ?2 WHERE assignment_id = ?1",
            params![open.assignment_id, on],
        )?;
        tx.execute(
            "UPDATE animals SET pasture_id = NULL, updated_at = ?2 WHERE local_id = ?1",
            params![animal_id, timestamp()],
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// The open assignment of an animal, if any.
    pub fn current_assignment(&self, animal_id: &str) -> DbResult<Option<PastureAssignment>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM pasture_assignments WHERE animal_id = ? AND end_date IS NULL",
                    ASSIGNMENT_COLUMNS
                ),
                [animal_id],
                read_assignment_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Every assignment of an animal, oldest first.
    pub fn assignment_history(&self, animal_id: &str) -> DbResult<Vec<PastureAssignment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pasture_assignments WHERE animal_id = ? ORDER BY start_date, rowid",
            ASSIGNMENT_COLUMNS
        ))?;
        let rows = stmt.query_map([animal_id], read_assignment_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Active head count on every active pasture.
    pub fn pasture_occupancy(&self) -> DbResult<Vec<PastureOccupancy>> {
        let pastures = self.list_active_pastures()?;
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*) FROM animals WHERE pasture_id = ? AND active = 1",
        )?;

        let mut occupancy = Vec::with_capacity(pastures.len());
        for pasture in &pastures {
            let head: u32 = stmt.query_row([&pasture.pasture_id], |row| row.get(0))?;
            occupancy.push(PastureOccupancy::new(pasture, head));
        }
        Ok(occupancy)
    }
}

fn read_pasture_row(row: &Row<'_>) -> rusqlite::Result<Pasture> {
    Ok(Pasture {
        pasture_id: row.get(0)?,
        name: row.get(1)?,
        area_hectares: row.get(2)?,
        capacity: row.get(3)?,
        notes: row.get(4)?,
        active: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn read_assignment_row(row: &Row<'_>) -> rusqlite::Result<PastureAssignment> {
    Ok(PastureAssignment {
        assignment_id: row.get(0)?,
        animal_id: row.get(1)?,
        pasture_id: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Animal, Sex};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup_db() -> (Database, Animal, Pasture, Pasture) {
        let db = Database::open_in_memory().unwrap();
        let animal = Animal::new("MX-001".into(), "bovine".into(), Sex::Female);
        db.insert_animal(&animal).unwrap();

        let mut north = Pasture::new("North".into(), 12.0);
        north.capacity = Some(1);
        let south = Pasture::new("South".into(), 8.5);
        db.insert_pasture(&north).unwrap();
        db.insert_pasture(&south).unwrap();
        (db, animal, north, south)
    }

    #[test]
    fn test_update_pasture() {
        let (db, _, mut north, _) = setup_db();

        north.area_hectares = 14.25;
        north.capacity = Some(20);
        north.notes = Some("Reseeded with ryegrass".into());
        assert!(db.update_pasture(&north).unwrap());
        assert_eq!(db.get_pasture(&north.pasture_id).unwrap().unwrap(), north);

        north.area_hectares = 0.0;
        assert!(matches!(db.update_pasture(&north), Err(DbError::Validation(_))));
    }

    #[test]
    fn test_move_closes_previous_assignment() {
        let (db, animal, north, south) = setup_db();

        db.move_animal_to_pasture(&animal.local_id, &north.pasture_id, date(2024, 3, 1))
            .unwrap();
        let second = db
            .move_animal_to_pasture(&animal.local_id, &south.pasture_id, date(2024, 5, 1))
            .unwrap();

        let history = db.assignment_history(&animal.local_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].pasture_id, north.pasture_id);
        assert_eq!(history[0].end_date, Some(date(2024, 5, 1)));
        assert!(history[1].is_open());

        let current = db.current_assignment(&animal.local_id).unwrap().unwrap();
        assert_eq!(current.assignment_id, second.assignment_id);

        let stored = db.get_animal(&animal.local_id).unwrap().unwrap();
        assert_eq!(stored.pasture_id, Some(south.pasture_id));
    }

    #[test]
    fn test_move_to_same_pasture_is_noop() {
        let (db, animal, north, _) = setup_db();

        let first = db
            .move_animal_to_pasture(&animal.local_id, &north.pasture_id, date(2024, 3, 1))
            .unwrap();
        let again = db
            .move_animal_to_pasture(&animal.local_id, &north.pasture_id, date(2024, 4, 1))
            .unwrap();
        assert_eq!(first, again);
        assert_eq!(db.assignment_history(&animal.local_id).unwrap().len(), 1);
    }

    #[test]
    fn test_backdated_move_rejected() {
        let (db, animal, north, south) = setup_db();
        db.move_animal_to_pasture(&animal.local_id, &north.pasture_id, date(2024, 3, 1))
            .unwrap();
        let result =
            db.move_animal_to_pasture(&animal.local_id, &south.pasture_id, date(2024, 2, 1));
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_occupancy_and_deactivation() {
        let (db, animal, north, south) = setup_db();
        let other = Animal::new("MX-002".into(), "bovine".into(), Sex::Female);
        db.insert_animal(&other).unwrap();

        db.move_animal_to_pasture(&animal.local_id, &north.pasture_id, date(2024, 3, 1))
            .unwrap();
        db.move_animal_to_pasture(&other.local_id, &north.pasture_id, date(2024, 3, 1))
            .unwrap();

        let occupancy = db.pasture_occupancy().unwrap();
        let north_row = occupancy.iter().find(|o| o.name == "North").unwrap();
        assert_eq!(north_row.head_count, 2);
        assert!(north_row.over_capacity);
        let south_row = occupancy.iter().find(|o| o.name == "South").unwrap();
        assert_eq!(south_row.head_count, 0);

        assert!(matches!(
            db.deactivate_pasture(&north.pasture_id),
            Err(DbError::Constraint(_))
        ));
        assert!(db.deactivate_pasture(&south.pasture_id).unwrap());
        assert_eq!(db.list_active_pastures().unwrap().len(), 1);

        // Moving onto an inactive pasture is refused
        let result =
            db.move_animal_to_pasture(&animal.local_id, &south.pasture_id, date(2024, 4, 1));
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_deactivated_animal_leaves_pasture() {
        let (db, animal, north, _) = setup_db();
        db.move_animal_to_pasture(&animal.local_id, &north.pasture_id, date(2024, 3, 1))
            .unwrap();

        db.deactivate_animal(&animal.local_id, date(2024, 6, 1)).unwrap();
        assert!(db.current_assignment(&animal.local_id).unwrap().is_none());
        let history = db.assignment_history(&animal.local_id).unwrap();
        assert_eq!(history[0].end_date, Some(date(2024, 6, 1)));
        assert_eq!(db.pasture_occupancy().unwrap()[0].head_count, 0);
    }

    #[test]
    fn test_remove_from_pasture() {
        let (db, animal, north, _) = setup_db();
        assert!(!db.remove_animal_from_pasture(&animal.local_id, date(2024, 3, 1)).unwrap());

        db.move_animal_to_pasture(&animal.local_id, &north.pasture_id, date(2024, 3, 1))
            .unwrap();
        assert!(db.remove_animal_from_pasture(&animal.local_id, date(2024, 3, 20)).unwrap());
        assert_eq!(db.get_animal(&animal.local_id).unwrap().unwrap().pasture_id, None);
    }
}
