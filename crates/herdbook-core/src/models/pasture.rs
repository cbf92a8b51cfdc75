//! Pasture and grazing assignment models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{require_non_empty, ValidationError, ValidationResult};

/// A paddock or field animals are assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pasture {
    pub pasture_id: String,
    pub name: String,
    /// Surface in hectares, as measured by the operator
    pub area_hectares: f64,
    /// Maximum head count, if known
    pub capacity: Option<u32>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: String,
}

impl Pasture {
    pub fn new(name: String, area_hectares: f64) -> Self {
        Self {
            pasture_id: uuid::Uuid::new_v4().to_string(),
            name,
            area_hectares,
            capacity: None,
            notes: None,
            active: true,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        require_non_empty("name", &self.name)?;
        if !self.area_hectares.is_finite() || self.area_hectares <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "area_hectares",
                detail: format!("{} must be positive", self.area_hectares),
            });
        }
        Ok(())
    }

    /// Head per hectare for a given head count.
    pub fn stocking_density(&self, head: u32) -> f64 {
        f64::from(head) / self.area_hectares
    }
}

/// A period an animal spent (or is spending) on a pasture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PastureAssignment {
    pub assignment_id: String,
    pub animal_id: String,
    pub pasture_id: String,
    pub start_date: NaiveDate,
    /// None while the animal is still on this pasture
    pub end_date: Option<NaiveDate>,
}

impl PastureAssignment {
    pub fn open(animal_id: String, pasture_id: String, start_date: NaiveDate) -> Self {
        Self {
            assignment_id: uuid::Uuid::new_v4().to_string(),
            animal_id,
            pasture_id,
            start_date,
            end_date: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }
}

/// Head count on a pasture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PastureOccupancy {
    pub pasture_id: String,
    pub name: String,
    pub head_count: u32,
    pub capacity: Option<u32>,
    pub stocking_density: f64,
    pub over_capacity: bool,
}

impl PastureOccupancy {
    pub fn new(pasture: &Pasture, head_count: u32) -> Self {
        Self {
            pasture_id: pasture.pasture_id.clone(),
            name: pasture.name.clone(),
            head_count,
            capacity: pasture.capacity,
            stocking_density: pasture.stocking_density(head_count),
            over_capacity: pasture.capacity.is_some_and(|cap| head_count > cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_must_be_positive() {
        assert!(Pasture::new("North".into(), 0.0).validate().is_err());
        assert!(Pasture::new("North".into(), -2.0).validate().is_err());
        assert!(Pasture::new("".into(), 2.0).validate().is_err());
        assert!(Pasture::new("North".into(), 12.5).validate().is_ok());
    }

    #[test]
    fn test_occupancy() {
        let mut pasture = Pasture::new("North".into(), 4.0);
        pasture.capacity = Some(6);

        let occupancy = PastureOccupancy::new(&pasture, 8);
        assert_eq!(occupancy.stocking_density, 2.0);
        assert!(occupancy.over_capacity);

        let occupancy = PastureOccupancy::new(&pasture, 6);
        assert!(!occupancy.over_capacity);
    }
}
