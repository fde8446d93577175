//! Search criteria and the coercion rules applied to loosely typed input.
//!
//! Criteria usually arrive from a query string or a form, so every numeric
//! field accepts either a number or a numeric string. Empty strings and
//! nulls mean "no constraint on this dimension".

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    #[serde(default, deserialize_with = "lenient_int")]
    pub owner_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city: Option<String>,
    /// Major currency unit (dollars).
    #[serde(default, deserialize_with = "lenient_float")]
    pub minimum_price_per_night: Option<f64>,
    /// Major currency unit (dollars).
    #[serde(default, deserialize_with = "lenient_float")]
    pub maximum_price_per_night: Option<f64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub minimum_rating: Option<i64>,
}

impl SearchCriteria {
    pub fn from_json(input: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Both bounds in cents, or `None` unless both are present.
    pub fn price_range_cents(&self) -> Option<(i64, i64)> {
        match (self.minimum_price_per_night, self.maximum_price_per_night) {
            (Some(min), Some(max)) => Some((to_cents(min), to_cents(max))),
            _ => None,
        }
    }
}

/// Parses a row limit given as text. Zero and non-numeric input are rejected.
pub fn parse_limit(raw: &str) -> crate::Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(crate::AppError::ValidationError(format!(
            "limit must be a positive integer, got {:?}",
            raw
        ))),
        Ok(limit) => Ok(limit),
    }
}

fn to_cents(dollars: f64) -> i64 {
    (dollars * 100.0).round() as i64
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Int(v)) => Ok(Some(v)),
        Some(Loose::Float(v)) => Ok(Some(v.trunc() as i64)),
        Some(Loose::Text(s)) => parse_leading_int(&s).map_err(D::Error::custom),
    }
}

fn lenient_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Int(v)) => Ok(Some(v as f64)),
        Some(Loose::Float(v)) => Ok(Some(v)),
        Some(Loose::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid number: {:?}", s)))
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

/// Reads the leading integer of `s`, ignoring anything after it ("4.5" is 4).
fn parse_leading_int(s: &str) -> Result<Option<i64>, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }

    let digits_start = usize::from(s.starts_with(['-', '+']));
    let digits_len = s[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();

    if digits_len == 0 {
        return Err(format!("invalid integer: {:?}", s));
    }

    s[..digits_start + digits_len]
        .parse::<i64>()
        .map(Some)
        .map_err(|e| format!("invalid integer {:?}: {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_fields_are_coerced() {
        let criteria: SearchCriteria = serde_json::from_value(json!({
            "owner_id": "3",
            "city": "nyc",
            "minimum_rating": "4",
            "minimum_price_per_night": "50",
            "maximum_price_per_night": 150,
        }))
        .unwrap();

        assert_eq!(criteria.owner_id, Some(3));
        assert_eq!(criteria.city.as_deref(), Some("nyc"));
        assert_eq!(criteria.minimum_rating, Some(4));
        assert_eq!(criteria.minimum_price_per_night, Some(50.0));
        assert_eq!(criteria.maximum_price_per_night, Some(150.0));
    }

    #[test]
    fn test_blank_and_missing_fields_are_absent() {
        let criteria: SearchCriteria = serde_json::from_value(json!({
            "owner_id": "",
            "city": "",
            "minimum_price_per_night": null,
        }))
        .unwrap();

        assert_eq!(criteria, SearchCriteria::default());
    }

    #[test]
    fn test_integer_fields_keep_leading_integer() {
        let criteria: SearchCriteria =
            serde_json::from_value(json!({ "minimum_rating": "4.5", "owner_id": 7.9 })).unwrap();
        assert_eq!(criteria.minimum_rating, Some(4));
        assert_eq!(criteria.owner_id, Some(7));
    }

    #[test]
    fn test_non_numeric_text_is_rejected() {
        let result = SearchCriteria::from_json(r#"{"owner_id": "abc"}"#);
        assert!(matches!(result, Err(crate::AppError::ValidationError(_))));

        let result = SearchCriteria::from_json(r#"{"maximum_price_per_night": "cheap"}"#);
        assert!(matches!(result, Err(crate::AppError::ValidationError(_))));
    }

    #[test]
    fn test_price_range_requires_both_bounds() {
        let criteria = SearchCriteria {
            minimum_price_per_night: Some(50.0),
            ..Default::default()
        };
        assert_eq!(criteria.price_range_cents(), None);

        let criteria = SearchCriteria {
            minimum_price_per_night: Some(50.0),
            maximum_price_per_night: Some(150.25),
            ..Default::default()
        };
        assert_eq!(criteria.price_range_cents(), Some((5000, 15025)));
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit("5").unwrap(), 5);
        assert_eq!(parse_limit(" 25 ").unwrap(), 25);
        assert!(matches!(parse_limit("0"), Err(crate::AppError::ValidationError(_))));
        assert!(matches!(parse_limit("-1"), Err(crate::AppError::ValidationError(_))));
        assert!(matches!(parse_limit("ten"), Err(crate::AppError::ValidationError(_))));
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int(" 12 "), Ok(Some(12)));
        assert_eq!(parse_leading_int("-3x"), Ok(Some(-3)));
        assert_eq!(parse_leading_int(""), Ok(None));
        assert!(parse_leading_int("x3").is_err());
        assert!(parse_leading_int("-").is_err());
    }
}
