//! Opening the database from environment configuration.
//!
//! Kept in its own test binary: it sets process environment variables and
//! installs the global log subscriber.

use chrono::{Days, Local};
use herdbook_core::config::{HERDBOOK_DB_PATH, HERDBOOK_HEALTH_WINDOW_DAYS, HERDBOOK_LOG};
use herdbook_core::{init_logging, open_database_from_config, FfiNewAnimal, FfiNewProcedure};

#[test]
fn test_open_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configured.sqlite3");
    std::env::set_var(HERDBOOK_DB_PATH, &path);
    std::env::set_var(HERDBOOK_LOG, "herdbook_core=debug");
    std::env::set_var(HERDBOOK_HEALTH_WINDOW_DAYS, "30");

    let core = open_database_from_config().unwrap();
    assert!(path.exists());

    // The configured filter was installed, so a second install is refused
    assert!(!init_logging("info".into()));

    let animal = core
        .create_animal(FfiNewAnimal {
            tag: "CFG-1".into(),
            species: "caprine".into(),
            sex: "female".into(),
            name: None,
            breed: None,
            birth_date: None,
            weight_kg: None,
            notes: None,
        })
        .unwrap();

    let today = Local::now().date_naive();
    let next = today.checked_add_days(Days::new(20)).unwrap();
    core.record_procedure(FfiNewProcedure {
        animal_id: animal.local_id,
        date: today.format("%Y-%m-%d").to_string(),
        kind: "vaccination".into(),
        description: "CDT booster".into(),
        product: None,
        dose: None,
        veterinarian: None,
        next_due_date: Some(next.format("%Y-%m-%d").to_string()),
        notes: None,
    })
    .unwrap();

    // 20 days out: inside the configured 30-day window, outside the default 7
    assert_eq!(core.upcoming_procedures(None).unwrap().len(), 1);
    assert!(core.upcoming_procedures(Some(7)).unwrap().is_empty());
}
