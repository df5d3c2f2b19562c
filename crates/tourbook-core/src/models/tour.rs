use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Tour {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Transporter {
    pub id: i64,
    pub name: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Start date must be before end date")]
    DateOrder,

    #[error("Price must be a positive amount")]
    Price,

    #[error("Booked seats ({booked}) exceed available seats ({available})")]
    Overbooked { booked: u32, available: u32 },
}

/// A scheduled departure of a tour, as posted by an administrator.
/// Field names follow the backend's form keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DetailTourRequest {
    pub tour_id: i64,
    pub startday: NaiveDate,
    pub endday: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub numerseatunoccupied: u32,
    #[serde(default)]
    pub numberpeoplebooked: u32,
    pub transportertourid: i64,
    pub price: f64,
}

impl DetailTourRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.startday >= self.endday {
            return Err(ValidationError::DateOrder);
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(ValidationError::Price);
        }
        if self.numberpeoplebooked > self.numerseatunoccupied {
            return Err(ValidationError::Overbooked {
                booked: self.numberpeoplebooked,
                available: self.numerseatunoccupied,
            });
        }
        Ok(())
    }

    /// Length of the departure in days.
    pub fn duration_days(&self) -> i64 {
        (self.endday - self.startday).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: &str, end: &str) -> DetailTourRequest {
        DetailTourRequest {
            tour_id: 3,
            startday: start.parse().unwrap(),
            endday: end.parse().unwrap(),
            description: "Ha Long Bay, 3 days".to_string(),
            numerseatunoccupied: 20,
            numberpeoplebooked: 0,
            transportertourid: 1,
            price: 250.0,
        }
    }

    #[test]
    fn test_validate_ok() {
        let req = request("2026-11-01", "2026-11-04");
        assert_eq!(req.validate(), Ok(()));
        assert_eq!(req.duration_days(), 3);
    }

    #[test]
    fn test_validate_date_order() {
        assert_eq!(request("2026-11-04", "2026-11-01").validate(), Err(ValidationError::DateOrder));
        assert_eq!(request("2026-11-04", "2026-11-04").validate(), Err(ValidationError::DateOrder));
    }

    #[test]
    fn test_validate_price_and_seats() {
        let mut req = request("2026-11-01", "2026-11-04");
        req.price = 0.0;
        assert_eq!(req.validate(), Err(ValidationError::Price));

        let mut req = request("2026-11-01", "2026-11-04");
        req.numberpeoplebooked = 21;
        assert_eq!(
            req.validate(),
            Err(ValidationError::Overbooked { booked: 21, available: 20 })
        );
    }

    #[test]
    fn test_parse_form_json() {
        let json = r#"{
            "tour_id": 7,
            "startday": "2026-12-20",
            "endday": "2026-12-27",
            "numerseatunoccupied": 12,
            "transportertourid": 2,
            "price": 1200.5
        }"#;
        let req: DetailTourRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.numberpeoplebooked, 0);
        assert_eq!(req.description, "");
        assert!(req.validate().is_ok());
    }
}
