use serde_json::Value;

use crate::error::ValidationError;
use super::models::{GenerationRequest, TripRequestBody};

pub const MIN_BUDGET: i64 = 100;
pub const MIN_DAYS: i64 = 1;
pub const MAX_DAYS: i64 = 30;
pub const MIN_INTERESTS_CHARS: usize = 10;

/// Parses a raw body into the untyped request shape.
pub fn parse_body(bytes: &[u8]) -> Result<TripRequestBody, ValidationError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ Value::Object(_)) => {
            serde_json::from_value(value).map_err(|_| ValidationError::MalformedBody)
        }
        _ => Err(ValidationError::MalformedBody),
    }
}

fn present<'a>(field: &'static str, value: &'a Option<Value>) -> Result<&'a Value, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::Missing(field)),
        Some(value) => Ok(value),
    }
}

fn check_budget(value: &Value) -> Result<f64, ValidationError> {
    let budget = value.as_f64().ok_or(ValidationError::NotANumber("budget"))?;
    if budget < MIN_BUDGET as f64 {
        return Err(ValidationError::BelowMinimum { field: "budget", min: MIN_BUDGET });
    }
    Ok(budget)
}

fn check_days(value: &Value) -> Result<u32, ValidationError> {
    let number = match value {
        Value::Number(number) => number,
        _ => return Err(ValidationError::NotANumber("days")),
    };
    let days = match number.as_i64() {
        Some(days) => days,
        None => match number.as_f64() {
            Some(days) if days.fract() == 0.0 && days.abs() < i64::MAX as f64 => days as i64,
            _ => return Err(ValidationError::NotAnInteger("days")),
        },
    };
    if !(MIN_DAYS..=MAX_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange { field: "days", min: MIN_DAYS, max: MAX_DAYS });
    }
    Ok(days as u32)
}

fn check_interests(value: &Value) -> Result<String, ValidationError> {
    let interests = value.as_str().ok_or(ValidationError::NotText("interests"))?;
    if interests.trim().chars().count() < MIN_INTERESTS_CHARS {
        return Err(ValidationError::TooShort { field: "interests", min: MIN_INTERESTS_CHARS });
    }
    Ok(interests.to_string())
}

fn check_uid(value: &Value) -> Result<String, ValidationError> {
    match value.as_str() {
        Some(uid) if !uid.is_empty() => Ok(uid.to_string()),
        Some(_) => Err(ValidationError::Missing("uid")),
        None => Err(ValidationError::NotText("uid")),
    }
}

/// Checks every field and builds a [`GenerationRequest`].
///
/// Presence of all four fields is checked before any type or range check,
/// then budget, days, interests and uid in that order, so the first error
/// for a given body is always the same.
pub fn validate(body: &TripRequestBody) -> Result<GenerationRequest, ValidationError> {
    let budget_value = present("budget", &body.budget)?;
    let days_value = present("days", &body.days)?;
    let interests_value = present("interests", &body.interests)?;
    let uid_value = present("uid", &body.uid)?;

    let budget = check_budget(budget_value)?;
    let days = check_days(days_value)?;
    let interests = check_interests(interests_value)?;
    let uid = check_uid(uid_value)?;

    Ok(GenerationRequest::new(budget, days, interests, uid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> TripRequestBody {
        serde_json::from_value(value).unwrap()
    }

    fn valid() -> Value {
        json!({
            "budget": 1500,
            "days": 5,
            "interests": "hiking, local food, museums",
            "uid": "user-1"
        })
    }

    fn with(field: &str, value: Value) -> TripRequestBody {
        let mut raw = valid();
        raw[field] = value;
        body(raw)
    }

    #[test]
    fn test_valid_request() {
        let request = validate(&body(valid())).unwrap();
        assert_eq!(request.budget(), 1500.0);
        assert_eq!(request.days(), 5);
        assert_eq!(request.interests(), "hiking, local food, museums");
        assert_eq!(request.subject_id(), "user-1");
    }

    #[test]
    fn test_presence_checked_before_ranges() {
        // budget is out of range but days is missing: presence wins
        let err = validate(&body(json!({
            "budget": 5,
            "interests": "hiking, local food, museums",
            "uid": "user-1"
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::Missing("days"));
        assert_eq!(err.to_string(), "Missing required field: days");

        let err = validate(&with("uid", Value::Null)).unwrap_err();
        assert_eq!(err, ValidationError::Missing("uid"));
    }

    #[test]
    fn test_budget_rules() {
        assert_eq!(
            validate(&with("budget", json!(99.99))).unwrap_err(),
            ValidationError::BelowMinimum { field: "budget", min: 100 }
        );
        assert_eq!(
            validate(&with("budget", json!("1500"))).unwrap_err(),
            ValidationError::NotANumber("budget")
        );
        assert_eq!(
            validate(&with("budget", json!(0))).unwrap_err(),
            ValidationError::BelowMinimum { field: "budget", min: 100 }
        );
        assert!(validate(&with("budget", json!(100))).is_ok());
    }

    #[test]
    fn test_days_rules() {
        for days in [json!(0), json!(31), json!(-3)] {
            assert_eq!(
                validate(&with("days", days)).unwrap_err(),
                ValidationError::OutOfRange { field: "days", min: 1, max: 30 }
            );
        }
        assert_eq!(
            validate(&with("days", json!(2.5))).unwrap_err(),
            ValidationError::NotAnInteger("days")
        );
        assert_eq!(
            validate(&with("days", json!("5"))).unwrap_err(),
            ValidationError::NotANumber("days")
        );
        assert_eq!(validate(&with("days", json!(3.0))).unwrap().days(), 3);
        assert_eq!(validate(&with("days", json!(30))).unwrap().days(), 30);
    }

    #[test]
    fn test_interests_rules() {
        assert_eq!(
            validate(&with("interests", json!("beach"))).unwrap_err(),
            ValidationError::TooShort { field: "interests", min: 10 }
        );
        assert_eq!(
            validate(&with("interests", json!("   food    "))).unwrap_err(),
            ValidationError::TooShort { field: "interests", min: 10 }
        );
        assert_eq!(
            validate(&with("interests", json!(["hiking", "food"]))).unwrap_err(),
            ValidationError::NotText("interests")
        );
        assert!(validate(&with("interests", json!("0123456789"))).is_ok());
    }

    #[test]
    fn test_uid_must_be_text() {
        assert_eq!(validate(&with("uid", json!(42))).unwrap_err(), ValidationError::NotText("uid"));
        assert_eq!(validate(&with("uid", json!(""))).unwrap_err(), ValidationError::Missing("uid"));
    }

    #[test]
    fn test_parse_body() {
        assert!(parse_body(br#"{"budget": 100}"#).is_ok());
        assert_eq!(parse_body(b"not json").unwrap_err(), ValidationError::MalformedBody);
        assert_eq!(parse_body(b"[1, 2]").unwrap_err(), ValidationError::MalformedBody);
        assert_eq!(parse_body(b"").unwrap_err(), ValidationError::MalformedBody);
    }
}
