//! Animal models.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::validation::{require_non_empty, require_non_negative, ValidationError, ValidationResult};

/// Sex of an animal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
        }
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "female" | "f" => Ok(Sex::Female),
            "male" | "m" => Ok(Sex::Male),
            other => Err(ValidationError::UnknownVariant {
                kind: "sex",
                value: other.to_string(),
            }),
        }
    }
}

/// A tracked animal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Animal {
    /// Local UUID
    pub local_id: String,
    /// Ear tag or registry number, unique among active animals
    pub tag: String,
    /// Display name
    pub name: Option<String>,
    /// Species (e.g., "bovine", "ovine", "caprine")
    pub species: String,
    /// Breed
    pub breed: Option<String>,
    pub sex: Sex,
    pub birth_date: Option<NaiveDate>,
    /// Last recorded weight in kg
    pub weight_kg: Option<f64>,
    /// Pasture the animal currently grazes
    pub pasture_id: Option<String>,
    pub notes: Option<String>,
    /// Soft-delete flag
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Animal {
    /// Create a new animal with required fields.
    pub fn new(tag: String, species: String, sex: Sex) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            local_id: uuid::Uuid::new_v4().to_string(),
            tag,
            name: None,
            species,
            breed: None,
            sex,
            birth_date: None,
            weight_kg: None,
            pasture_id: None,
            notes: None,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Check required fields and numeric ranges.
    pub fn validate(&self) -> ValidationResult<()> {
        require_non_empty("tag", &self.tag)?;
        require_non_empty("species", &self.species)?;
        require_non_negative("weight_kg", self.weight_kg)
    }

    /// Get the canonical species name (lowercase).
    pub fn canonical_species(&self) -> String {
        self.species.trim().to_lowercase()
    }

    /// Age in whole months as of `today`, if the birth date is known.
    pub fn age_in_months(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        if today < birth {
            return Some(0);
        }
        let mut months = (today.year() - birth.year()) * 12 + today.month() as i32
            - birth.month() as i32;
        if today.day() < birth.day() {
            months -= 1;
        }
        u32::try_from(months.max(0)).ok()
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_animal() {
        let animal = Animal::new("MX-001".into(), "bovine".into(), Sex::Female);
        assert_eq!(animal.tag, "MX-001");
        assert!(animal.active);
        assert_eq!(animal.local_id.len(), 36); // UUID format
        assert!(animal.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_tag() {
        let animal = Animal::new("  ".into(), "bovine".into(), Sex::Female);
        assert_eq!(animal.validate(), Err(ValidationError::Missing("tag")));
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let mut animal = Animal::new("MX-001".into(), "bovine".into(), Sex::Male);
        animal.weight_kg = Some(-3.0);
        assert!(matches!(
            animal.validate(),
            Err(ValidationError::OutOfRange { field: "weight_kg", .. })
        ));
    }

    #[test]
    fn test_sex_parsing() {
        assert_eq!("Female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!("m".parse::<Sex>().unwrap(), Sex::Male);
        assert!("heifer".parse::<Sex>().is_err());
        assert_eq!(Sex::Female.as_str().parse::<Sex>().unwrap(), Sex::Female);
    }

    #[test]
    fn test_age_in_months() {
        let mut animal = Animal::new("MX-001".into(), "bovine".into(), Sex::Female);
        assert_eq!(animal.age_in_months(date(2024, 6, 1)), None);

        animal.birth_date = Some(date(2022, 3, 15));
        assert_eq!(animal.age_in_months(date(2024, 3, 15)), Some(24));
        assert_eq!(animal.age_in_months(date(2024, 3, 14)), Some(23));
        assert_eq!(animal.age_in_months(date(2021, 1, 1)), Some(0));
    }

    #[test]
    fn test_canonical_species() {
        let animal = Animal::new("MX-001".into(), " Bovine ".into(), Sex::Female);
        assert_eq!(animal.canonical_species(), "bovine");
    }
}
