//! Transaction input model

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const VEHICLE_TYPES: &[&str] = &["Motorcycle", "Car", "Sedan", "SUV", "Van", "Bus", "Truck"];
pub const VEHICLE_DIMENSIONS: &[&str] = &["Small", "Medium", "Large"];
pub const LANE_TYPES: &[&str] = &["Regular", "Express"];

/// Amount field that failed to parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedAmount {
    pub field: &'static str,
    pub value: String,
}

/// Raw form submission. Every field arrives as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionForm {
    pub vehicle_plate: String,
    pub fastag_id: String,
    pub toll_booth_id: String,
    pub vehicle_type: String,
    pub vehicle_dimensions: String,
    pub lane_type: String,
    pub transaction_amount: String,
    pub amount_paid: String,
    pub geographical_location: String,
}

impl TransactionForm {
    /// Parse the numeric fields. An empty amount reads as 0, like an
    /// untouched numeric input.
    pub fn parse(&self) -> Result<TransactionInput, MalformedAmount> {
        Ok(TransactionInput {
            vehicle_plate: self.vehicle_plate.clone(),
            fastag_id: self.fastag_id.clone(),
            toll_booth_id: self.toll_booth_id.clone(),
            vehicle_type: self.vehicle_type.clone(),
            vehicle_dimensions: self.vehicle_dimensions.clone(),
            lane_type: self.lane_type.clone(),
            transaction_amount: parse_amount("transaction_amount", &self.transaction_amount)?,
            amount_paid: parse_amount("amount_paid", &self.amount_paid)?,
            geographical_location: self.geographical_location.clone(),
        })
    }
}

fn parse_amount(field: &'static str, raw: &str) -> Result<f64, MalformedAmount> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }

    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(MalformedAmount {
            field,
            value: raw.to_string(),
        }),
    }
}

/// Typed transaction, as consumed by the form controller
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransactionInput {
    #[serde(default)]
    pub vehicle_plate: String,

    #[serde(default)]
    pub fastag_id: String,

    #[serde(default)]
    pub toll_booth_id: String,

    #[validate(custom(function = "validate_vehicle_type"))]
    pub vehicle_type: String,

    #[validate(custom(function = "validate_vehicle_dimensions"))]
    pub vehicle_dimensions: String,

    #[validate(custom(function = "validate_lane_type"))]
    pub lane_type: String,

    pub transaction_amount: f64,

    pub amount_paid: f64,

    #[serde(default)]
    pub geographical_location: String,
}

fn one_of(value: &str, options: &[&str], code: &'static str) -> Result<(), ValidationError> {
    if options.contains(&value) {
        Ok(())
    } else {
        let mut err = ValidationError::new(code);
        err.message = Some(format!("'{}' is not one of {}", value, options.join(", ")).into());
        Err(err)
    }
}

fn validate_vehicle_type(value: &str) -> Result<(), ValidationError> {
    one_of(value, VEHICLE_TYPES, "vehicle_type")
}

fn validate_vehicle_dimensions(value: &str) -> Result<(), ValidationError> {
    one_of(value, VEHICLE_DIMENSIONS, "vehicle_dimensions")
}

fn validate_lane_type(value: &str) -> Result<(), ValidationError> {
    one_of(value, LANE_TYPES, "lane_type")
}

#[cfg(test)]
pub(crate) fn sample_form() -> TransactionForm {
    TransactionForm {
        vehicle_plate: "KA11AB1234".to_string(),
        fastag_id: "FTG-001-ABC-121".to_string(),
        toll_booth_id: "A-101".to_string(),
        vehicle_type: "Car".to_string(),
        vehicle_dimensions: "Small".to_string(),
        lane_type: "Regular".to_string(),
        transaction_amount: "100".to_string(),
        amount_paid: "100".to_string(),
        geographical_location: "13.05, 77.77".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amounts() {
        let input = sample_form().parse().unwrap();
        assert_eq!(input.transaction_amount, 100.0);
        assert_eq!(input.amount_paid, 100.0);
    }

    #[test]
    fn test_negative_and_empty_amounts_are_accepted() {
        let form = TransactionForm {
            transaction_amount: " -12.5 ".to_string(),
            amount_paid: String::new(),
            ..sample_form()
        };

        let input = form.parse().unwrap();
        assert_eq!(input.transaction_amount, -12.5);
        assert_eq!(input.amount_paid, 0.0);
    }

    #[test]
    fn test_malformed_amount() {
        let form = TransactionForm {
            amount_paid: "12,50".to_string(),
            ..sample_form()
        };

        let err = form.parse().unwrap_err();
        assert_eq!(err.field, "amount_paid");
        assert_eq!(err.value, "12,50");
    }

    #[test]
    fn test_non_finite_amount_is_malformed() {
        for raw in ["NaN", "inf", "-infinity"] {
            let form = TransactionForm {
                transaction_amount: raw.to_string(),
                ..sample_form()
            };
            assert!(form.parse().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_validation_accepts_every_option() {
        for vehicle in VEHICLE_TYPES {
            for lane in LANE_TYPES {
                let mut input = sample_form().parse().unwrap();
                input.vehicle_type = vehicle.to_string();
                input.lane_type = lane.to_string();
                assert!(input.validate().is_ok());
            }
        }
    }

    #[test]
    fn test_validation_rejects_unknown_option() {
        let mut input = sample_form().parse().unwrap();
        input.lane_type = "Toll-Free".to_string();

        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("lane_type"));
    }

    #[test]
    fn test_free_text_is_not_validated() {
        let mut input = sample_form().parse().unwrap();
        input.vehicle_plate = "X".repeat(65);
        input.fastag_id = String::new();
        input.geographical_location = "1".repeat(129);

        assert!(input.validate().is_ok());
    }
}
