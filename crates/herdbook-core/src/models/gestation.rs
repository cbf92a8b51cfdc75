//! Gestation models: one record per tracked pregnancy cycle.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{require_non_empty, require_non_negative, ValidationError, ValidationResult};

/// Smallest gestation-day count a confirmation may assert.
pub const MIN_CONFIRMED_GESTATION_DAYS: u32 = 1;
/// Largest gestation-day count a confirmation may assert.
pub const MAX_CONFIRMED_GESTATION_DAYS: u32 = 300;

/// How the pregnancy was started.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    NaturalMating,
    ArtificialInsemination,
    EmbryoTransfer,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::NaturalMating => "natural_mating",
            ServiceType::ArtificialInsemination => "artificial_insemination",
            ServiceType::EmbryoTransfer => "embryo_transfer",
        }
    }
}

impl FromStr for ServiceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "natural_mating" => Ok(ServiceType::NaturalMating),
            "artificial_insemination" => Ok(ServiceType::ArtificialInsemination),
            "embryo_transfer" => Ok(ServiceType::EmbryoTransfer),
            other => Err(ValidationError::UnknownVariant {
                kind: "service type",
                value: other.to_string(),
            }),
        }
    }
}

/// Outcome of a gestation.
///
/// Transitions are free-form: any state may be set from any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeState {
    /// Pregnancy in progress (initial state)
    InGestation,
    SuccessfulBirth,
    Abortion,
    DifficultBirth,
    Complications,
}

impl OutcomeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeState::InGestation => "in_gestation",
            OutcomeState::SuccessfulBirth => "successful_birth",
            OutcomeState::Abortion => "abortion",
            OutcomeState::DifficultBirth => "difficult_birth",
            OutcomeState::Complications => "complications",
        }
    }

    /// Birth and abortion close the cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutcomeState::SuccessfulBirth | OutcomeState::Abortion)
    }
}

impl FromStr for OutcomeState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in_gestation" => Ok(OutcomeState::InGestation),
            "successful_birth" => Ok(OutcomeState::SuccessfulBirth),
            "abortion" => Ok(OutcomeState::Abortion),
            "difficult_birth" => Ok(OutcomeState::DifficultBirth),
            "complications" => Ok(OutcomeState::Complications),
            other => Err(ValidationError::UnknownVariant {
                kind: "outcome state",
                value: other.to_string(),
            }),
        }
    }
}

/// One of three day-count bands over the gestation term.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Trimester {
    First,
    Second,
    Third,
}

impl Trimester {
    /// 1, 2 or 3.
    pub fn number(&self) -> u8 {
        match self {
            Trimester::First => 1,
            Trimester::Second => 2,
            Trimester::Third => 3,
        }
    }
}

impl TryFrom<u8> for Trimester {
    type Error = ValidationError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Trimester::First),
            2 => Ok(Trimester::Second),
            3 => Ok(Trimester::Third),
            other => Err(ValidationError::OutOfRange {
                field: "trimester",
                detail: format!("{} is not 1, 2 or 3", other),
            }),
        }
    }
}

/// A dated observation taken during the pregnancy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingEntry {
    pub date: NaiveDate,
    /// Dam weight in kg at this check, if weighed
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

/// A gestation record for one animal.
///
/// `estimated_due_date`, `current_gestation_days`, `trimester` and
/// `weight_gain` are derived; see [`crate::gestation`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GestationRecord {
    /// Unique record ID
    pub record_id: String,
    /// Local ID of the dam
    pub animal_id: String,
    /// Breeding, insemination or transfer date
    pub service_date: Option<NaiveDate>,
    pub service_type: ServiceType,
    /// Bull, semen straw or embryo reference
    pub sire: Option<String>,
    /// Who performed the service
    pub technician: Option<String>,
    /// Date a veterinarian confirmed the pregnancy
    pub confirmation_date: Option<NaiveDate>,
    /// Gestation-day count asserted at confirmation
    pub confirmed_gestation_days: Option<u32>,
    pub estimated_due_date: Option<NaiveDate>,
    pub current_gestation_days: Option<u32>,
    pub trimester: Option<Trimester>,
    /// Dam weight in kg when tracking started
    pub initial_weight: Option<f64>,
    /// Latest dam weight in kg
    pub current_weight: Option<f64>,
    pub weight_gain: Option<f64>,
    /// Check-ups in the order they were recorded
    pub tracking: Vec<TrackingEntry>,
    pub outcome_state: OutcomeState,
    pub outcome_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Soft-delete flag
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl GestationRecord {
    /// Create a record for a newly logged service event.
    pub fn new(animal_id: String, service_type: ServiceType, service_date: Option<NaiveDate>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            animal_id,
            service_date,
            service_type,
            sire: None,
            technician: None,
            confirmation_date: None,
            confirmed_gestation_days: None,
            estimated_due_date: None,
            current_gestation_days: None,
            trimester: None,
            initial_weight: None,
            current_weight: None,
            weight_gain: None,
            tracking: Vec::new(),
            outcome_state: OutcomeState::InGestation,
            outcome_date: None,
            notes: None,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Check field ranges on caller-supplied inputs.
    pub fn validate(&self) -> ValidationResult<()> {
        require_non_empty("animal_id", &self.animal_id)?;
        validate_confirmed_days(self.confirmed_gestation_days)?;
        require_non_negative("initial_weight", self.initial_weight)?;
        require_non_negative("current_weight", self.current_weight)?;
        for entry in &self.tracking {
            require_non_negative("tracking.weight_kg", entry.weight_kg)?;
        }
        Ok(())
    }

    /// True once the cycle ended in birth or abortion.
    pub fn is_terminal(&self) -> bool {
        self.outcome_state.is_terminal()
    }

    /// Still pregnant and not soft-deleted.
    pub fn is_in_progress(&self) -> bool {
        self.active && self.outcome_state == OutcomeState::InGestation
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// A partial change to a gestation record.
///
/// `None` leaves the stored value as it is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GestationUpdate {
    pub service_date: Option<NaiveDate>,
    pub service_type: Option<ServiceType>,
    pub sire: Option<String>,
    pub technician: Option<String>,
    pub confirmation_date: Option<NaiveDate>,
    pub confirmed_gestation_days: Option<u32>,
    pub initial_weight: Option<f64>,
    pub current_weight: Option<f64>,
    /// Appended to `tracking`; a weighed entry also becomes the current weight
    pub tracking_entry: Option<TrackingEntry>,
    pub outcome_state: Option<OutcomeState>,
    pub outcome_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl GestationUpdate {
    /// Whether the change set includes a date input of the calculator.
    pub fn touches_dates(&self) -> bool {
        self.service_date.is_some()
            || self.confirmation_date.is_some()
            || self.confirmed_gestation_days.is_some()
    }

    /// Whether the change set alters either weight field.
    pub fn touches_weights(&self) -> bool {
        self.initial_weight.is_some()
            || self.current_weight.is_some()
            || self
                .tracking_entry
                .as_ref()
                .is_some_and(|entry| entry.weight_kg.is_some())
    }

    pub fn is_empty(&self) -> bool {
        *self == GestationUpdate::default()
    }

    /// Check field ranges before the update is applied.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_confirmed_days(self.confirmed_gestation_days)?;
        require_non_negative("initial_weight", self.initial_weight)?;
        require_non_negative("current_weight", self.current_weight)?;
        if let Some(entry) = &self.tracking_entry {
            require_non_negative("tracking.weight_kg", entry.weight_kg)?;
        }
        Ok(())
    }
}

fn validate_confirmed_days(days: Option<u32>) -> ValidationResult<()> {
    match days {
        Some(d) if !(MIN_CONFIRMED_GESTATION_DAYS..=MAX_CONFIRMED_GESTATION_DAYS).contains(&d) => {
            Err(ValidationError::OutOfRange {
                field: "confirmed_gestation_days",
                detail: format!(
                    "{} is outside {}..={}",
                    d, MIN_CONFIRMED_GESTATION_DAYS, MAX_CONFIRMED_GESTATION_DAYS
                ),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_record_starts_in_gestation() {
        let record = GestationRecord::new(
            "animal-1".into(),
            ServiceType::ArtificialInsemination,
            Some(date(2024, 1, 1)),
        );
        assert_eq!(record.outcome_state, OutcomeState::InGestation);
        assert!(record.active);
        assert!(record.is_in_progress());
        assert!(!record.is_terminal());
        assert!(record.estimated_due_date.is_none());
        assert_eq!(record.record_id.len(), 36);
    }

    #[test]
    fn test_terminal_states() {
        assert!(OutcomeState::SuccessfulBirth.is_terminal());
        assert!(OutcomeState::Abortion.is_terminal());
        assert!(!OutcomeState::InGestation.is_terminal());
        assert!(!OutcomeState::DifficultBirth.is_terminal());
        assert!(!OutcomeState::Complications.is_terminal());
    }

    #[test]
    fn test_confirmed_days_range() {
        let mut record = GestationRecord::new("animal-1".into(), ServiceType::NaturalMating, None);
        record.confirmed_gestation_days = Some(0);
        assert!(record.validate().is_err());
        record.confirmed_gestation_days = Some(301);
        assert!(record.validate().is_err());
        record.confirmed_gestation_days = Some(1);
        assert!(record.validate().is_ok());
        record.confirmed_gestation_days = Some(300);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_enum_string_forms() {
        for state in [
            OutcomeState::InGestation,
            OutcomeState::SuccessfulBirth,
            OutcomeState::Abortion,
            OutcomeState::DifficultBirth,
            OutcomeState::Complications,
        ] {
            assert_eq!(state.as_str().parse::<OutcomeState>().unwrap(), state);
        }
        assert_eq!(
            "embryo_transfer".parse::<ServiceType>().unwrap(),
            ServiceType::EmbryoTransfer
        );
        assert!("cloning".parse::<ServiceType>().is_err());
    }

    #[test]
    fn test_trimester_numbers() {
        assert_eq!(Trimester::try_from(2).unwrap(), Trimester::Second);
        assert_eq!(Trimester::Third.number(), 3);
        assert!(Trimester::try_from(4).is_err());
    }

    #[test]
    fn test_update_change_detection() {
        let update = GestationUpdate {
            notes: Some("calm".into()),
            outcome_state: Some(OutcomeState::Complications),
            ..Default::default()
        };
        assert!(!update.touches_dates());
        assert!(!update.touches_weights());

        let update = GestationUpdate {
            confirmed_gestation_days: Some(60),
            ..Default::default()
        };
        assert!(update.touches_dates());

        let update = GestationUpdate {
            tracking_entry: Some(TrackingEntry {
                date: date(2024, 2, 1),
                weight_kg: Some(470.0),
                notes: None,
            }),
            ..Default::default()
        };
        assert!(update.touches_weights());
        assert!(!update.is_empty());
        assert!(GestationUpdate::default().is_empty());
    }
}
