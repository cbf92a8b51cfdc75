//! Milk production models.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{require_non_empty, require_non_negative, ValidationError, ValidationResult};

/// Milking session within a day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MilkSession {
    Morning,
    Afternoon,
    Evening,
}

impl MilkSession {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilkSession::Morning => "morning",
            MilkSession::Afternoon => "afternoon",
            MilkSession::Evening => "evening",
        }
    }
}

impl FromStr for MilkSession {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(MilkSession::Morning),
            "afternoon" => Ok(MilkSession::Afternoon),
            "evening" => Ok(MilkSession::Evening),
            other => Err(ValidationError::UnknownVariant {
                kind: "milk session",
                value: other.to_string(),
            }),
        }
    }
}

/// Yield of one animal at one milking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilkRecord {
    pub record_id: String,
    pub animal_id: String,
    pub date: NaiveDate,
    pub session: MilkSession,
    pub liters: f64,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: String,
}

impl MilkRecord {
    pub fn new(animal_id: String, date: NaiveDate, session: MilkSession, liters: f64) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            animal_id,
            date,
            session,
            liters,
            notes: None,
            active: true,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        require_non_empty("animal_id", &self.animal_id)?;
        require_non_negative("liters", Some(self.liters))
    }
}

/// Summed production for one animal over a period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimalMilkTotal {
    pub animal_id: String,
    pub tag: String,
    pub liters: f64,
    pub milkings: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_yield_rejected() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let record = MilkRecord::new("animal-1".into(), date, MilkSession::Morning, -0.5);
        assert!(record.validate().is_err());

        let record = MilkRecord::new("animal-1".into(), date, MilkSession::Morning, 12.5);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_session_parsing() {
        assert_eq!("Evening".parse::<MilkSession>().unwrap(), MilkSession::Evening);
        assert!("midnight".parse::<MilkSession>().is_err());
    }
}
