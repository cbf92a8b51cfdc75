//! Health procedure models.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{require_non_empty, ValidationError, ValidationResult};

/// Kind of veterinary procedure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureKind {
    Vaccination,
    Deworming,
    Treatment,
    Checkup,
    Surgery,
    Other,
}

impl ProcedureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureKind::Vaccination => "vaccination",
            ProcedureKind::Deworming => "deworming",
            ProcedureKind::Treatment => "treatment",
            ProcedureKind::Checkup => "checkup",
            ProcedureKind::Surgery => "surgery",
            ProcedureKind::Other => "other",
        }
    }
}

impl FromStr for ProcedureKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vaccination" => Ok(ProcedureKind::Vaccination),
            "deworming" => Ok(ProcedureKind::Deworming),
            "treatment" => Ok(ProcedureKind::Treatment),
            "checkup" => Ok(ProcedureKind::Checkup),
            "surgery" => Ok(ProcedureKind::Surgery),
            "other" => Ok(ProcedureKind::Other),
            other => Err(ValidationError::UnknownVariant {
                kind: "procedure kind",
                value: other.to_string(),
            }),
        }
    }
}

/// A health procedure applied to an animal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthProcedure {
    pub procedure_id: String,
    pub animal_id: String,
    pub date: NaiveDate,
    pub kind: ProcedureKind,
    pub description: String,
    /// Product or drug administered
    pub product: Option<String>,
    /// Free-text dose (e.g. "5 mL IM")
    pub dose: Option<String>,
    pub veterinarian: Option<String>,
    /// When the procedure should be repeated
    pub next_due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: String,
}

impl HealthProcedure {
    pub fn new(animal_id: String, date: NaiveDate, kind: ProcedureKind, description: String) -> Self {
        Self {
            procedure_id: uuid::Uuid::new_v4().to_string(),
            animal_id,
            date,
            kind,
            description,
            product: None,
            dose: None,
            veterinarian: None,
            next_due_date: None,
            notes: None,
            active: true,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        require_non_empty("animal_id", &self.animal_id)?;
        require_non_empty("description", &self.description)?;
        if let Some(next) = self.next_due_date {
            if next < self.date {
                return Err(ValidationError::OutOfRange {
                    field: "next_due_date",
                    detail: format!("{} is before the procedure date {}", next, self.date),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_next_due_before_date_rejected() {
        let mut procedure = HealthProcedure::new(
            "animal-1".into(),
            date(2024, 5, 1),
            ProcedureKind::Vaccination,
            "Clostridial booster".into(),
        );
        procedure.next_due_date = Some(date(2024, 4, 1));
        assert!(procedure.validate().is_err());

        procedure.next_due_date = Some(date(2025, 5, 1));
        assert!(procedure.validate().is_ok());
    }
}
