//! SQLite schema definition.

/// Complete database schema for herdbook.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Pastures
-- ============================================================================

CREATE TABLE IF NOT EXISTS pastures (
    pasture_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    area_hectares REAL NOT NULL CHECK (area_hectares > 0),
    capacity INTEGER CHECK (capacity IS NULL OR capacity >= 0),
    notes TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

-- ============================================================================
-- Animals
-- ============================================================================

CREATE TABLE IF NOT EXISTS animals (
    local_id TEXT PRIMARY KEY,
    tag TEXT NOT NULL,
    name TEXT,
    species TEXT NOT NULL,
    breed TEXT,
    sex TEXT NOT NULL CHECK (sex IN ('female', 'male')),
    birth_date TEXT,                             -- YYYY-MM-DD
    weight_kg REAL,
    pasture_id TEXT REFERENCES pastures(pasture_id),
    notes TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

-- Tags may be reused once the previous holder is deactivated
CREATE UNIQUE INDEX IF NOT EXISTS idx_animals_active_tag ON animals(tag) WHERE active = 1;
CREATE INDEX IF NOT EXISTS idx_animals_pasture ON animals(pasture_id);

-- ============================================================================
-- Gestations (derived columns written by the calculator, never edited directly)
-- ============================================================================

CREATE TABLE IF NOT EXISTS gestations (
    record_id TEXT PRIMARY KEY,
    animal_id TEXT NOT NULL REFERENCES animals(local_id),
    service_date TEXT,
    service_type TEXT NOT NULL,                  -- natural_mating, artificial_insemination, embryo_transfer
    sire TEXT,
    technician TEXT,
    confirmation_date TEXT,
    confirmed_gestation_days INTEGER
        CHECK (confirmed_gestation_days IS NULL OR confirmed_gestation_days BETWEEN 1 AND 300),
    estimated_due_date TEXT,
    current_gestation_days INTEGER CHECK (current_gestation_days IS NULL OR current_gestation_days >= 0),
    trimester INTEGER CHECK (trimester IS NULL OR trimester IN (1, 2, 3)),
    initial_weight REAL,
    current_weight REAL,
    weight_gain REAL,
    tracking TEXT NOT NULL DEFAULT '[]',         -- JSON array of TrackingEntry
    outcome_state TEXT NOT NULL DEFAULT 'in_gestation',
    outcome_date TEXT,
    notes TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_gestations_animal ON gestations(animal_id);
CREATE INDEX IF NOT EXISTS idx_gestations_outcome ON gestations(outcome_state, active);

-- ============================================================================
-- Milk production
-- ============================================================================

CREATE TABLE IF NOT EXISTS milk_records (
    record_id TEXT PRIMARY KEY,
    animal_id TEXT NOT NULL REFERENCES animals(local_id),
    date TEXT NOT NULL,
    session TEXT NOT NULL CHECK (session IN ('morning', 'afternoon', 'evening')),
    liters REAL NOT NULL CHECK (liters >= 0),
    notes TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_milk_animal_date ON milk_records(animal_id, date);
CREATE INDEX IF NOT EXISTS idx_milk_date ON milk_records(date);

-- ============================================================================
-- Health procedures
-- ============================================================================

CREATE TABLE IF NOT EXISTS health_procedures (
    procedure_id TEXT PRIMARY KEY,
    animal_id TEXT NOT NULL REFERENCES animals(local_id),
    date TEXT NOT NULL,
    kind TEXT NOT NULL,
    description TEXT NOT NULL,
    product TEXT,
    dose TEXT,
    veterinarian TEXT,
    next_due_date TEXT,
    notes TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_health_animal ON health_procedures(animal_id, date);
CREATE INDEX IF NOT EXISTS idx_health_next_due ON health_procedures(next_due_date);

-- ============================================================================
-- Pasture assignments (history of moves)
-- ============================================================================

CREATE TABLE IF NOT EXISTS pasture_assignments (
    assignment_id TEXT PRIMARY KEY,
    animal_id TEXT NOT NULL REFERENCES animals(local_id),
    pasture_id TEXT NOT NULL REFERENCES pastures(pasture_id),
    start_date TEXT NOT NULL,
    end_date TEXT,
    CHECK (end_date IS NULL OR end_date >= start_date)
);

-- At most one open assignment per animal
CREATE UNIQUE INDEX IF NOT EXISTS idx_assignments_open
    ON pasture_assignments(animal_id) WHERE end_date IS NULL;
CREATE INDEX IF NOT EXISTS idx_assignments_pasture ON pasture_assignments(pasture_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_confirmed_days_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO animals (local_id, tag, species, sex) VALUES ('a1', 'T1', 'bovine', 'female')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO gestations (record_id, animal_id, service_type, confirmed_gestation_days)
             VALUES ('g1', 'a1', 'natural_mating', 301)",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO gestations (record_id, animal_id, service_type, confirmed_gestation_days)
             VALUES ('g1', 'a1', 'natural_mating', 300)",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_active_tag_unique() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO animals (local_id, tag, species, sex) VALUES ('a1', 'T1', 'bovine', 'female')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO animals (local_id, tag, species, sex) VALUES ('a2', 'T1', 'bovine', 'female')",
            [],
        );
        assert!(dup.is_err());

        // Reusable once the first holder is soft-deleted
        conn.execute("UPDATE animals SET active = 0 WHERE local_id = 'a1'", [])
            .unwrap();
        let reuse = conn.execute(
            "INSERT INTO animals (local_id, tag, species, sex) VALUES ('a2', 'T1', 'bovine', 'female')",
            [],
        );
        assert!(reuse.is_ok());
    }
}
