//! Herdbook Core Library
//!
//! Local-first livestock records: animals, gestation cycles, milk production,
//! health procedures and pasture assignments, with a herd dashboard.
//!
//! # Architecture
//!
//! ```text
//!   Host app (mobile / desktop)
//!            │  uniffi
//!            ▼
//!   ┌─────────────────────┐
//!   │    HerdbookCore     │  Arc<Mutex<Database>>
//!   └─────────┬───────────┘
//!             │
//!     ┌───────┼──────────────────────┐
//!     │       │                      │
//!     ▼       ▼                      ▼
//!  models   gestation ──────▶ db (SQLite) ──▶ reports
//!  (validate) (derive dates)  (soft delete)   (dashboard JSON)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence, one [`Database`] per process
//! - [`models`]: Domain types (Animal, GestationRecord, MilkRecord, ...)
//! - [`gestation`]: Due date, day count, trimester and proximity
//! - [`reports`]: Dashboard aggregation
//! - [`config`]: Environment / JSON configuration
//! - [`logging`]: `tracing` subscriber setup

pub mod config;
pub mod db;
pub mod gestation;
pub mod logging;
pub mod models;
pub mod reports;

// Re-export commonly used types
pub use config::HerdbookConfig;
pub use db::{Database, ServiceEvent};
pub use models::{
    Animal, GestationRecord, GestationUpdate, HealthProcedure, MilkRecord, OutcomeState, Pasture,
    PastureAssignment, ServiceType, Sex, TrackingEntry, Trimester,
};
pub use reports::{Dashboard, DashboardSummary};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use models::{
    format_date, parse_date, parse_optional_date, AnimalMilkTotal, MilkSession, PastureOccupancy,
    ProcedureKind, ValidationError,
};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum HerdbookError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for HerdbookError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => HerdbookError::NotFound(what),
            db::DbError::Validation(v) => HerdbookError::InvalidInput(v.to_string()),
            db::DbError::Constraint(msg) => HerdbookError::InvalidInput(msg),
            db::DbError::Json(j) => HerdbookError::SerializationError(j.to_string()),
            other => HerdbookError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ValidationError> for HerdbookError {
    fn from(e: ValidationError) -> Self {
        HerdbookError::InvalidInput(e.to_string())
    }
}

impl From<config::ConfigError> for HerdbookError {
    fn from(e: config::ConfigError) -> Self {
        HerdbookError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for HerdbookError {
    fn from(e: serde_json::Error) -> Self {
        HerdbookError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for HerdbookError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        HerdbookError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<HerdbookCore>, HerdbookError> {
    let config = HerdbookConfig {
        database_path: path,
        ..HerdbookConfig::default()
    };
    HerdbookCore::with_config(config)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<HerdbookCore>, HerdbookError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(HerdbookCore {
        db: Arc::new(Mutex::new(db)),
        config: HerdbookConfig::default(),
    }))
}

/// Open the database named by `HERDBOOK_DB_PATH`, installing logging with
/// the `HERDBOOK_LOG` filter.
#[uniffi::export]
pub fn open_database_from_config() -> Result<Arc<HerdbookCore>, HerdbookError> {
    let config = HerdbookConfig::from_env()?;
    logging::init_logging(&config.log_filter);
    HerdbookCore::with_config(config)
}

/// Install the stderr log subscriber. Returns false if one already exists.
#[uniffi::export]
pub fn init_logging(filter: String) -> bool {
    logging::init_logging(&filter)
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn date_or_today(field: &'static str, value: Option<String>) -> Result<NaiveDate, HerdbookError> {
    Ok(parse_optional_date(field, value.as_deref())?.unwrap_or_else(today))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct HerdbookCore {
    db: Arc<Mutex<Database>>,
    config: HerdbookConfig,
}

impl HerdbookCore {
    fn with_config(config: HerdbookConfig) -> Result<Arc<Self>, HerdbookError> {
        let db = Database::open(&config.database_path)?;
        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        }))
    }

    /// Derived fields are refreshed so the day count agrees with the countdown.
    fn gestation_view(record: &GestationRecord, today: NaiveDate) -> FfiGestationRecord {
        let current = gestation::derive(record, today);
        let days = gestation::days_until_due(&current, today);
        FfiGestationRecord::from_record(current, days)
    }
}

#[uniffi::export]
impl HerdbookCore {
    // =========================================================================
    // Animal Operations
    // =========================================================================

    /// Register a new animal.
    pub fn create_animal(&self, input: FfiNewAnimal) -> Result<FfiAnimal, HerdbookError> {
        let animal = Animal::try_from(input)?;
        let db = self.db.lock()?;
        db.insert_animal(&animal)?;
        Ok(animal.into())
    }

    /// Get an animal by local ID, active or not.
    pub fn get_animal(&self, local_id: String) -> Result<Option<FfiAnimal>, HerdbookError> {
        let db = self.db.lock()?;
        let animal = db.get_animal(&local_id)?;
        Ok(animal.map(|a| a.into()))
    }

    /// Look up an active animal by ear tag.
    pub fn get_animal_by_tag(&self, tag: String) -> Result<Option<FfiAnimal>, HerdbookError> {
        let db = self.db.lock()?;
        let animal = db.get_animal_by_tag(&tag)?;
        Ok(animal.map(|a| a.into()))
    }

    /// All active animals.
    pub fn list_animals(&self) -> Result<Vec<FfiAnimal>, HerdbookError> {
        let db = self.db.lock()?;
        let animals = db.list_active_animals()?;
        Ok(animals.into_iter().map(|a| a.into()).collect())
    }

    /// Search active animals by tag or name.
    pub fn search_animals(&self, query: String, limit: u32) -> Result<Vec<FfiAnimal>, HerdbookError> {
        let db = self.db.lock()?;
        let animals = db.search_animals(&query, limit as usize)?;
        Ok(animals.into_iter().map(|a| a.into()).collect())
    }

    /// Edit the descriptive fields of an animal.
    ///
    /// Pasture and active flag are changed through their own operations.
    pub fn update_animal(&self, animal: FfiAnimal) -> Result<FfiAnimal, HerdbookError> {
        let db = self.db.lock()?;
        let mut stored = db.require_active_animal(&animal.local_id)?;
        stored.tag = animal.tag;
        stored.name = animal.name;
        stored.species = animal.species;
        stored.breed = animal.breed;
        stored.sex = animal.sex.parse()?;
        stored.birth_date = parse_optional_date("birth_date", animal.birth_date.as_deref())?;
        stored.weight_kg = animal.weight_kg;
        stored.notes = animal.notes;
        stored.touch();
        db.update_animal(&stored)?;
        Ok(stored.into())
    }

    /// Soft-delete an animal; its pasture assignment closes on `on` (default today).
    pub fn deactivate_animal(&self, local_id: String, on: Option<String>) -> Result<bool, HerdbookError> {
        let on = date_or_today("on", on)?;
        let db = self.db.lock()?;
        Ok(db.deactivate_animal(&local_id, on)?)
    }

    // =========================================================================
    // Gestation Operations
    // =========================================================================

    /// Open a gestation record for a breeding, insemination or transfer.
    pub fn log_service(
        &self,
        animal_id: String,
        service_type: String,
        service_date: Option<String>,
        sire: Option<String>,
        technician: Option<String>,
    ) -> Result<FfiGestationRecord, HerdbookError> {
        let event = ServiceEvent {
            service_type: service_type.parse()?,
            service_date: parse_optional_date("service_date", service_date.as_deref())?,
            sire,
            technician,
        };
        let today = today();
        let db = self.db.lock()?;
        let record = db.log_service(&animal_id, event, today)?;
        Ok(Self::gestation_view(&record, today))
    }

    /// Get a gestation record by ID.
    pub fn get_gestation(&self, record_id: String) -> Result<Option<FfiGestationRecord>, HerdbookError> {
        let today = today();
        let db = self.db.lock()?;
        let record = db.get_gestation(&record_id)?;
        Ok(record.map(|r| Self::gestation_view(&r, today)))
    }

    /// Gestation records of one animal, newest first.
    pub fn list_gestations_for_animal(
        &self,
        animal_id: String,
    ) -> Result<Vec<FfiGestationRecord>, HerdbookError> {
        let today = today();
        let db = self.db.lock()?;
        let records = db.list_gestations_for_animal(&animal_id)?;
        Ok(records
            .iter()
            .map(|r| Self::gestation_view(r, today))
            .collect())
    }

    /// Pregnancies still in gestation, refreshed against today.
    pub fn list_in_progress_gestations(&self) -> Result<Vec<FfiGestationRecord>, HerdbookError> {
        let today = today();
        let db = self.db.lock()?;
        let records = db.list_in_progress_gestations()?;
        Ok(records
            .iter()
            .map(|r| Self::gestation_view(r, today))
            .collect())
    }

    /// Apply a partial update and recompute the derived fields it affects.
    pub fn update_gestation(
        &self,
        record_id: String,
        update: FfiGestationUpdate,
    ) -> Result<FfiGestationRecord, HerdbookError> {
        let update = GestationUpdate::try_from(update)?;
        if update.is_empty() {
            return Err(HerdbookError::InvalidInput("empty gestation update".into()));
        }
        let today = today();
        let db = self.db.lock()?;
        let record = db.save_gestation_update(&record_id, &update, today)?;
        Ok(Self::gestation_view(&record, today))
    }

    /// Record a veterinary pregnancy confirmation.
    pub fn confirm_pregnancy(
        &self,
        record_id: String,
        confirmation_date: String,
        confirmed_gestation_days: u32,
    ) -> Result<FfiGestationRecord, HerdbookError> {
        let update = GestationUpdate {
            confirmation_date: Some(parse_date("confirmation_date", &confirmation_date)?),
            confirmed_gestation_days: Some(confirmed_gestation_days),
            ..GestationUpdate::default()
        };
        let today = today();
        let db = self.db.lock()?;
        let record = db.save_gestation_update(&record_id, &update, today)?;
        Ok(Self::gestation_view(&record, today))
    }

    /// Append a check-up, optionally weighing the dam.
    pub fn add_tracking_entry(
        &self,
        record_id: String,
        entry: FfiTrackingEntry,
    ) -> Result<FfiGestationRecord, HerdbookError> {
        let update = GestationUpdate {
            tracking_entry: Some(TrackingEntry::try_from(entry)?),
            ..GestationUpdate::default()
        };
        let today = today();
        let db = self.db.lock()?;
        let record = db.save_gestation_update(&record_id, &update, today)?;
        Ok(Self::gestation_view(&record, today))
    }

    /// Set the outcome of a pregnancy (birth, abortion, ...).
    pub fn record_outcome(
        &self,
        record_id: String,
        outcome_state: String,
        outcome_date: Option<String>,
    ) -> Result<FfiGestationRecord, HerdbookError> {
        let update = GestationUpdate {
            outcome_state: Some(outcome_state.parse()?),
            outcome_date: Some(date_or_today("outcome_date", outcome_date)?),
            ..GestationUpdate::default()
        };
        let today = today();
        let db = self.db.lock()?;
        let record = db.save_gestation_update(&record_id, &update, today)?;
        Ok(Self::gestation_view(&record, today))
    }

    /// Soft-delete a gestation record.
    pub fn deactivate_gestation(&self, record_id: String) -> Result<bool, HerdbookError> {
        let db = self.db.lock()?;
        Ok(db.deactivate_gestation(&record_id)?)
    }

    // =========================================================================
    // Milk Operations
    // =========================================================================

    /// Record one milking.
    pub fn record_milking(
        &self,
        animal_id: String,
        date: String,
        session: String,
        liters: f64,
        notes: Option<String>,
    ) -> Result<FfiMilkRecord, HerdbookError> {
        let session: MilkSession = session.parse()?;
        let mut record = MilkRecord::new(animal_id, parse_date("date", &date)?, session, liters);
        record.notes = notes;
        let db = self.db.lock()?;
        db.require_active_animal(&record.animal_id)?;
        db.insert_milk_record(&record)?;
        Ok(record.into())
    }

    /// Milkings of one animal between two dates (inclusive).
    pub fn list_milk_for_animal(
        &self,
        animal_id: String,
        from: String,
        to: String,
    ) -> Result<Vec<FfiMilkRecord>, HerdbookError> {
        let from = parse_date("from", &from)?;
        let to = parse_date("to", &to)?;
        let db = self.db.lock()?;
        let records = db.list_milk_for_animal(&animal_id, from, to)?;
        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    /// Herd total in liters between two dates (inclusive).
    pub fn milk_total(&self, from: String, to: String) -> Result<f64, HerdbookError> {
        let from = parse_date("from", &from)?;
        let to = parse_date("to", &to)?;
        let db = self.db.lock()?;
        Ok(db.total_liters_between(from, to)?)
    }

    /// Per-animal totals between two dates, highest producer first.
    pub fn milk_by_animal(&self, from: String, to: String) -> Result<Vec<FfiMilkTotal>, HerdbookError> {
        let from = parse_date("from", &from)?;
        let to = parse_date("to", &to)?;
        let db = self.db.lock()?;
        let totals = Dashboard::new(&db).milk_by_animal(from, to)?;
        Ok(totals.into_iter().map(|t| t.into()).collect())
    }

    /// Soft-delete a milking.
    pub fn deactivate_milk_record(&self, record_id: String) -> Result<bool, HerdbookError> {
        let db = self.db.lock()?;
        Ok(db.deactivate_milk_record(&record_id)?)
    }

    // =========================================================================
    // Health Operations
    // =========================================================================

    /// Record a vaccination, treatment or other procedure.
    pub fn record_procedure(
        &self,
        input: FfiNewProcedure,
    ) -> Result<FfiHealthProcedure, HerdbookError> {
        let procedure = HealthProcedure::try_from(input)?;
        let db = self.db.lock()?;
        db.require_active_animal(&procedure.animal_id)?;
        db.insert_health_procedure(&procedure)?;
        Ok(procedure.into())
    }

    /// Procedures of one animal, most recent first.
    pub fn list_procedures_for_animal(
        &self,
        animal_id: String,
    ) -> Result<Vec<FfiHealthProcedure>, HerdbookError> {
        let db = self.db.lock()?;
        let procedures = db.list_procedures_for_animal(&animal_id)?;
        Ok(procedures.into_iter().map(|p| p.into()).collect())
    }

    /// Correct a recorded procedure.
    pub fn update_health_procedure(
        &self,
        procedure: FfiHealthProcedure,
    ) -> Result<FfiHealthProcedure, HerdbookError> {
        let db = self.db.lock()?;
        let mut stored = db
            .get_health_procedure(&procedure.procedure_id)?
            .filter(|p| p.active)
            .ok_or_else(|| HerdbookError::NotFound(format!("procedure {}", procedure.procedure_id)))?;
        stored.date = parse_date("date", &procedure.date)?;
        stored.kind = procedure.kind.parse()?;
        stored.description = procedure.description;
        stored.product = procedure.product;
        stored.dose = procedure.dose;
        stored.veterinarian = procedure.veterinarian;
        stored.next_due_date =
            parse_optional_date("next_due_date", procedure.next_due_date.as_deref())?;
        stored.notes = procedure.notes;
        db.update_health_procedure(&stored)?;
        Ok(stored.into())
    }

    /// Repeats due within `window_days` (default from configuration).
    pub fn upcoming_procedures(
        &self,
        window_days: Option<u32>,
    ) -> Result<Vec<FfiHealthProcedure>, HerdbookError> {
        let window = window_days.unwrap_or(self.config.health_reminder_window_days);
        let db = self.db.lock()?;
        let procedures = db.list_upcoming_procedures(today(), window)?;
        Ok(procedures.into_iter().map(|p| p.into()).collect())
    }

    /// Soft-delete a procedure.
    pub fn deactivate_health_procedure(&self, procedure_id: String) -> Result<bool, HerdbookError> {
        let db = self.db.lock()?;
        Ok(db.deactivate_health_procedure(&procedure_id)?)
    }

    // =========================================================================
    // Pasture Operations
    // =========================================================================

    /// Create a pasture.
    pub fn create_pasture(
        &self,
        name: String,
        area_hectares: f64,
        capacity: Option<u32>,
        notes: Option<String>,
    ) -> Result<FfiPasture, HerdbookError> {
        let mut pasture = Pasture::new(name, area_hectares);
        pasture.capacity = capacity;
        pasture.notes = notes;
        let db = self.db.lock()?;
        db.insert_pasture(&pasture)?;
        Ok(pasture.into())
    }

    /// All active pastures.
    pub fn list_pastures(&self) -> Result<Vec<FfiPasture>, HerdbookError> {
        let db = self.db.lock()?;
        let pastures = db.list_active_pastures()?;
        Ok(pastures.into_iter().map(|p| p.into()).collect())
    }

    /// Rename or resize a pasture.
    pub fn update_pasture(&self, pasture: FfiPasture) -> Result<FfiPasture, HerdbookError> {
        let db = self.db.lock()?;
        let mut stored = db
            .get_pasture(&pasture.pasture_id)?
            .filter(|p| p.active)
            .ok_or_else(|| HerdbookError::NotFound(format!("pasture {}", pasture.pasture_id)))?;
        stored.name = pasture.name;
        stored.area_hectares = pasture.area_hectares;
        stored.capacity = pasture.capacity;
        stored.notes = pasture.notes;
        db.update_pasture(&stored)?;
        Ok(stored.into())
    }

    /// Soft-delete an empty pasture.
    pub fn deactivate_pasture(&self, pasture_id: String) -> Result<bool, HerdbookError> {
        let db = self.db.lock()?;
        Ok(db.deactivate_pasture(&pasture_id)?)
    }

    /// Move an animal onto a pasture from `on` (default today).
    pub fn move_animal(
        &self,
        animal_id: String,
        pasture_id: String,
        on: Option<String>,
    ) -> Result<FfiPastureAssignment, HerdbookError> {
        let on = date_or_today("on", on)?;
        let db = self.db.lock()?;
        let assignment = db.move_animal_to_pasture(&animal_id, &pasture_id, on)?;
        Ok(assignment.into())
    }

    /// Take an animal off its pasture.
    pub fn remove_animal_from_pasture(
        &self,
        animal_id: String,
        on: Option<String>,
    ) -> Result<bool, HerdbookError> {
        let on = date_or_today("on", on)?;
        let db = self.db.lock()?;
        Ok(db.remove_animal_from_pasture(&animal_id, on)?)
    }

    /// Every pasture an animal has been on, oldest first.
    pub fn assignment_history(
        &self,
        animal_id: String,
    ) -> Result<Vec<FfiPastureAssignment>, HerdbookError> {
        let db = self.db.lock()?;
        let history = db.assignment_history(&animal_id)?;
        Ok(history.into_iter().map(|a| a.into()).collect())
    }

    /// Head count against capacity for every active pasture.
    pub fn pasture_occupancy(&self) -> Result<Vec<FfiPastureOccupancy>, HerdbookError> {
        let db = self.db.lock()?;
        let occupancy = db.pasture_occupancy()?;
        Ok(occupancy.into_iter().map(|o| o.into()).collect())
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Herd overview as JSON, as of today.
    pub fn dashboard_json(&self) -> Result<String, HerdbookError> {
        self.dashboard_json_as_of(format_date(today()))
    }

    /// Herd overview as JSON, as of a given `YYYY-MM-DD` date.
    pub fn dashboard_json_as_of(&self, date: String) -> Result<String, HerdbookError> {
        let as_of = parse_date("date", &date)?;
        let db = self.db.lock()?;
        let summary = Dashboard::new(&db)
            .with_health_window(self.config.health_reminder_window_days)
            .summary(as_of)?;
        Ok(summary.to_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe input for a new animal.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewAnimal {
    pub tag: String,
    pub species: String,
    /// "female" or "male"
    pub sex: String,
    pub name: Option<String>,
    pub breed: Option<String>,
    pub birth_date: Option<String>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

impl TryFrom<FfiNewAnimal> for Animal {
    type Error = ValidationError;

    fn try_from(input: FfiNewAnimal) -> Result<Self, Self::Error> {
        let mut animal = Animal::new(input.tag, input.species, input.sex.parse()?);
        animal.name = input.name;
        animal.breed = input.breed;
        animal.birth_date = parse_optional_date("birth_date", input.birth_date.as_deref())?;
        animal.weight_kg = input.weight_kg;
        animal.notes = input.notes;
        Ok(animal)
    }
}

/// FFI-safe animal.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAnimal {
    pub local_id: String,
    pub tag: String,
    pub name: Option<String>,
    pub species: String,
    pub breed: Option<String>,
    pub sex: String,
    pub birth_date: Option<String>,
    pub weight_kg: Option<f64>,
    pub pasture_id: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
}

impl From<Animal> for FfiAnimal {
    fn from(animal: Animal) -> Self {
        Self {
            local_id: animal.local_id,
            tag: animal.tag,
            name: animal.name,
            species: animal.species,
            breed: animal.breed,
            sex: animal.sex.as_str().to_string(),
            birth_date: animal.birth_date.map(format_date),
            weight_kg: animal.weight_kg,
            pasture_id: animal.pasture_id,
            notes: animal.notes,
            active: animal.active,
        }
    }
}

/// FFI-safe tracking entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTrackingEntry {
    pub date: String,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

impl From<TrackingEntry> for FfiTrackingEntry {
    fn from(entry: TrackingEntry) -> Self {
        Self {
            date: format_date(entry.date),
            weight_kg: entry.weight_kg,
            notes: entry.notes,
        }
    }
}

impl TryFrom<FfiTrackingEntry> for TrackingEntry {
    type Error = ValidationError;

    fn try_from(entry: FfiTrackingEntry) -> Result<Self, Self::Error> {
        Ok(TrackingEntry {
            date: parse_date("tracking.date", &entry.date)?,
            weight_kg: entry.weight_kg,
            notes: entry.notes,
        })
    }
}

/// FFI-safe gestation record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGestationRecord {
    pub record_id: String,
    pub animal_id: String,
    pub service_date: Option<String>,
    pub service_type: String,
    pub sire: Option<String>,
    pub technician: Option<String>,
    pub confirmation_date: Option<String>,
    pub confirmed_gestation_days: Option<u32>,
    pub estimated_due_date: Option<String>,
    pub current_gestation_days: Option<u32>,
    pub trimester: Option<u8>,
    pub initial_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub weight_gain: Option<f64>,
    pub tracking: Vec<FfiTrackingEntry>,
    pub outcome_state: String,
    pub outcome_date: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    /// Countdown to the due date as of the call
    pub days_until_due: Option<i64>,
    /// "overdue", "critical_period", "near_term" or "distant"
    pub proximity: Option<String>,
}

impl FfiGestationRecord {
    fn from_record(record: GestationRecord, days_until_due: Option<i64>) -> Self {
        Self {
            record_id: record.record_id,
            animal_id: record.animal_id,
            service_date: record.service_date.map(format_date),
            service_type: record.service_type.as_str().to_string(),
            sire: record.sire,
            technician: record.technician,
            confirmation_date: record.confirmation_date.map(format_date),
            confirmed_gestation_days: record.confirmed_gestation_days,
            estimated_due_date: record.estimated_due_date.map(format_date),
            current_gestation_days: record.current_gestation_days,
            trimester: record.trimester.map(|t| t.number()),
            initial_weight: record.initial_weight,
            current_weight: record.current_weight,
            weight_gain: record.weight_gain,
            tracking: record.tracking.into_iter().map(|e| e.into()).collect(),
            outcome_state: record.outcome_state.as_str().to_string(),
            outcome_date: record.outcome_date.map(format_date),
            notes: record.notes,
            active: record.active,
            days_until_due,
            proximity: days_until_due
                .map(|d| gestation::due_proximity(d).as_str().to_string()),
        }
    }
}

/// FFI-safe partial gestation update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiGestationUpdate {
    pub service_date: Option<String>,
    pub service_type: Option<String>,
    pub sire: Option<String>,
    pub technician: Option<String>,
    pub confirmation_date: Option<String>,
    pub confirmed_gestation_days: Option<u32>,
    pub initial_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub tracking_entry: Option<FfiTrackingEntry>,
    pub outcome_state: Option<String>,
    pub outcome_date: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<FfiGestationUpdate> for GestationUpdate {
    type Error = ValidationError;

    fn try_from(update: FfiGestationUpdate) -> Result<Self, Self::Error> {
        Ok(GestationUpdate {
            service_date: parse_optional_date("service_date", update.service_date.as_deref())?,
            service_type: update.service_type.map(|s| s.parse()).transpose()?,
            sire: update.sire,
            technician: update.technician,
            confirmation_date: parse_optional_date(
                "confirmation_date",
                update.confirmation_date.as_deref(),
            )?,
            confirmed_gestation_days: update.confirmed_gestation_days,
            initial_weight: update.initial_weight,
            current_weight: update.current_weight,
            tracking_entry: update.tracking_entry.map(TrackingEntry::try_from).transpose()?,
            outcome_state: update.outcome_state.map(|s| s.parse()).transpose()?,
            outcome_date: parse_optional_date("outcome_date", update.outcome_date.as_deref())?,
            notes: update.notes,
        })
    }
}

/// FFI-safe milk record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMilkRecord {
    pub record_id: String,
    pub animal_id: String,
    pub date: String,
    pub session: String,
    pub liters: f64,
    pub notes: Option<String>,
}

impl From<MilkRecord> for FfiMilkRecord {
    fn from(record: MilkRecord) -> Self {
        Self {
            record_id: record.record_id,
            animal_id: record.animal_id,
            date: format_date(record.date),
            session: record.session.as_str().to_string(),
            liters: record.liters,
            notes: record.notes,
        }
    }
}

/// FFI-safe per-animal milk total.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMilkTotal {
    pub animal_id: String,
    pub tag: String,
    pub liters: f64,
    pub milkings: u32,
}

impl From<AnimalMilkTotal> for FfiMilkTotal {
    fn from(total: AnimalMilkTotal) -> Self {
        Self {
            animal_id: total.animal_id,
            tag: total.tag,
            liters: total.liters,
            milkings: total.milkings,
        }
    }
}

/// FFI-safe input for a health procedure.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewProcedure {
    pub animal_id: String,
    pub date: String,
    /// "vaccination", "deworming", "treatment", "checkup", "surgery" or "other"
    pub kind: String,
    pub description: String,
    pub product: Option<String>,
    pub dose: Option<String>,
    pub veterinarian: Option<String>,
    pub next_due_date: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<FfiNewProcedure> for HealthProcedure {
    type Error = ValidationError;

    fn try_from(input: FfiNewProcedure) -> Result<Self, Self::Error> {
        let kind: ProcedureKind = input.kind.parse()?;
        let mut procedure = HealthProcedure::new(
            input.animal_id,
            parse_date("date", &input.date)?,
            kind,
            input.description,
        );
        procedure.product = input.product;
        procedure.dose = input.dose;
        procedure.veterinarian = input.veterinarian;
        procedure.next_due_date =
            parse_optional_date("next_due_date", input.next_due_date.as_deref())?;
        procedure.notes = input.notes;
        procedure.validate()?;
        Ok(procedure)
    }
}

/// FFI-safe health procedure.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHealthProcedure {
    pub procedure_id: String,
    pub animal_id: String,
    pub date: String,
    pub kind: String,
    pub description: String,
    pub product: Option<String>,
    pub dose: Option<String>,
    pub veterinarian: Option<String>,
    pub next_due_date: Option<String>,
    pub notes: Option<String>,
}

impl From<HealthProcedure> for FfiHealthProcedure {
    fn from(procedure: HealthProcedure) -> Self {
        Self {
            procedure_id: procedure.procedure_id,
            animal_id: procedure.animal_id,
            date: format_date(procedure.date),
            kind: procedure.kind.as_str().to_string(),
            description: procedure.description,
            product: procedure.product,
            dose: procedure.dose,
            veterinarian: procedure.veterinarian,
            next_due_date: procedure.next_due_date.map(format_date),
            notes: procedure.notes,
        }
    }
}

/// FFI-safe pasture.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPasture {
    pub pasture_id: String,
    pub name: String,
    pub area_hectares: f64,
    pub capacity: Option<u32>,
    pub notes: Option<String>,
}

impl From<Pasture> for FfiPasture {
    fn from(pasture: Pasture) -> Self {
        Self {
            pasture_id: pasture.pasture_id,
            name: pasture.name,
            area_hectares: pasture.area_hectares,
            capacity: pasture.capacity,
            notes: pasture.notes,
        }
    }
}

/// FFI-safe pasture assignment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPastureAssignment {
    pub assignment_id: String,
    pub animal_id: String,
    pub pasture_id: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

impl From<PastureAssignment> for FfiPastureAssignment {
    fn from(assignment: PastureAssignment) -> Self {
        Self {
            assignment_id: assignment.assignment_id,
            animal_id: assignment.animal_id,
            pasture_id: assignment.pasture_id,
            start_date: format_date(assignment.start_date),
            end_date: assignment.end_date.map(format_date),
        }
    }
}

/// FFI-safe pasture occupancy.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPastureOccupancy {
    pub pasture_id: String,
    pub name: String,
    pub head_count: u32,
    pub capacity: Option<u32>,
    pub stocking_density: f64,
    pub over_capacity: bool,
}

impl From<PastureOccupancy> for FfiPastureOccupancy {
    fn from(occupancy: PastureOccupancy) -> Self {
        Self {
            pasture_id: occupancy.pasture_id,
            name: occupancy.name,
            head_count: occupancy.head_count,
            capacity: occupancy.capacity,
            stocking_density: occupancy.stocking_density,
            over_capacity: occupancy.over_capacity,
        }
    }
}
