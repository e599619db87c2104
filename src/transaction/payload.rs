//! Parsing and validating the request bodies for creating, updating and
//! previewing transactions.
//!
//! Browser forms post numbers as strings, so numeric fields accept either a
//! JSON number or a string holding one. Fields that are not listed here, such
//! as `ownerId` or any derived field, are ignored.

use serde::Deserialize;
use serde_json::Value;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    derivation::{DEFAULT_KAPAT_PER_BAG, DerivationInputs},
    transaction::NewTransaction,
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The body of a create, update or preview request, before validation.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub date: Option<Value>,
    pub party: Option<Value>,
    pub rate: Option<Value>,
    pub bag: Option<Value>,
    pub gross_weight: Option<Value>,
    pub kapat_per_bag: Option<Value>,
}

impl TransactionPayload {
    /// Validate every field needed to record a new transaction.
    ///
    /// `kapatPerBag` falls back to [DEFAULT_KAPAT_PER_BAG] when it is missing or blank.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] naming the first field that is missing or
    /// cannot be parsed.
    pub fn validate(&self) -> Result<NewTransaction, Error> {
        let inputs = self.derivation_inputs()?;

        Ok(NewTransaction {
            date: parse_date("date", required("date", &self.date)?)?,
            party: parse_party(required("party", &self.party)?)?,
            rate: inputs.rate,
            bag: inputs.bag,
            gross_weight: inputs.gross_weight,
            kapat_per_bag: inputs.kapat_per_bag,
        })
    }

    /// Validate only the numeric fields, e.g. for previewing the derived fields.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] naming the first numeric field that is
    /// missing or cannot be parsed.
    pub fn derivation_inputs(&self) -> Result<DerivationInputs, Error> {
        Ok(DerivationInputs {
            rate: parse_number("rate", required("rate", &self.rate)?)?,
            bag: parse_bag(required("bag", &self.bag)?)?,
            gross_weight: parse_number(
                "grossWeight",
                required("grossWeight", &self.gross_weight)?,
            )?,
            kapat_per_bag: self.kapat_per_bag()?,
        })
    }

    /// Merge the fields present in this payload over `current`.
    ///
    /// Fields that are missing or null keep their current value. Fields that
    /// are present must be valid, except `kapatPerBag` which resets to
    /// [DEFAULT_KAPAT_PER_BAG] when blank.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] naming the first present field that cannot be parsed.
    pub fn apply_update(&self, current: &NewTransaction) -> Result<NewTransaction, Error> {
        let mut merged = current.clone();

        if let Some(date) = present(&self.date) {
            merged.date = parse_date("date", date)?;
        }
        if let Some(party) = present(&self.party) {
            merged.party = parse_party(party)?;
        }
        if let Some(rate) = present(&self.rate) {
            merged.rate = parse_number("rate", rate)?;
        }
        if let Some(bag) = present(&self.bag) {
            merged.bag = parse_bag(bag)?;
        }
        if let Some(gross_weight) = present(&self.gross_weight) {
            merged.gross_weight = parse_number("grossWeight", gross_weight)?;
        }
        if present(&self.kapat_per_bag).is_some() {
            merged.kapat_per_bag = self.kapat_per_bag()?;
        }

        Ok(merged)
    }

    fn kapat_per_bag(&self) -> Result<f64, Error> {
        match present(&self.kapat_per_bag) {
            Some(value) if !is_blank(value) => parse_number("kapatPerBag", value),
            _ => Ok(DEFAULT_KAPAT_PER_BAG),
        }
    }
}

fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|value| !value.is_null())
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::String(string) if string.trim().is_empty())
}

fn required<'a>(field: &str, value: &'a Option<Value>) -> Result<&'a Value, Error> {
    present(value)
        .filter(|value| !is_blank(value))
        .ok_or_else(|| Error::Validation(format!("{field} is required")))
}

fn parse_number(field: &str, value: &Value) -> Result<f64, Error> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(string) => string.trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .filter(|number| number.is_finite())
        .ok_or_else(|| Error::Validation(format!("{field} must be a number")))
}

fn parse_bag(value: &Value) -> Result<i64, Error> {
    let bag = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(whole_number)),
        Value::String(string) => {
            let string = string.trim();
            string
                .parse::<i64>()
                .ok()
                .or_else(|| string.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    };

    bag.ok_or_else(|| Error::Validation("bag must be a whole number".to_owned()))
}

fn whole_number(number: f64) -> Option<i64> {
    (number.is_finite() && number.fract() == 0.0 && number.abs() < i64::MAX as f64)
        .then_some(number as i64)
}

fn parse_date(field: &str, value: &Value) -> Result<Date, Error> {
    match value {
        Value::String(string) => parse_date_str(field, string),
        _ => Err(invalid_date(field)),
    }
}

/// Parse a plain date or the date part of an RFC 3339 timestamp, which is
/// what clients send back after reading a transaction.
///
/// # Errors
///
/// Returns an [Error::Validation] naming `field` if `string` is not a date.
pub fn parse_date_str(field: &str, string: &str) -> Result<Date, Error> {
    let string = string.trim();
    let date_part = string.split_once('T').map_or(string, |(date, _)| date);

    Date::parse(date_part, DATE_FORMAT).map_err(|_| invalid_date(field))
}

fn invalid_date(field: &str) -> Error {
    Error::Validation(format!("{field} must be a date like 2024-01-31"))
}

fn parse_party(value: &Value) -> Result<String, Error> {
    match value {
        Value::String(party) if !party.trim().is_empty() => Ok(party.trim().to_owned()),
        Value::String(_) => Err(Error::Validation("party is required".to_owned())),
        _ => Err(Error::Validation("party must be text".to_owned())),
    }
}

#[cfg(test)]
mod payload_tests {
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        Error,
        derivation::{DEFAULT_KAPAT_PER_BAG, DerivationInputs},
        transaction::NewTransaction,
    };

    use super::TransactionPayload;

    fn payload(value: Value) -> TransactionPayload {
        serde_json::from_value(value).expect("could not deserialize payload")
    }

    fn valid_body() -> Value {
        json!({
            "date": "2024-01-01",
            "party": "Acme",
            "rate": 1,
            "bag": 1,
            "grossWeight": 1,
        })
    }

    fn with_field(field: &str, value: Value) -> Value {
        let mut body = valid_body();
        body[field] = value;
        body
    }

    fn without_field(field: &str) -> Value {
        let mut body = valid_body();
        body.as_object_mut()
            .expect("body is an object")
            .remove(field);
        body
    }

    fn acme_sale() -> NewTransaction {
        NewTransaction {
            date: date!(2024 - 01 - 01),
            party: "Acme".to_owned(),
            rate: 1000.0,
            bag: 10,
            gross_weight: 500.0,
            kapat_per_bag: 1.75,
        }
    }

    #[test]
    fn validate_accepts_numbers() {
        let body = payload(json!({
            "date": "2024-01-01",
            "party": "Acme",
            "rate": 1000,
            "bag": 10,
            "grossWeight": 500,
            "kapatPerBag": 1.75,
        }));

        assert_eq!(body.validate(), Ok(acme_sale()));
    }

    #[test]
    fn validate_accepts_numeric_strings() {
        let body = payload(json!({
            "date": "2024-01-01",
            "party": " Acme ",
            "rate": "1000",
            "bag": "10",
            "grossWeight": "500.0",
            "kapatPerBag": "1.75",
        }));

        assert_eq!(body.validate(), Ok(acme_sale()));
    }

    #[test]
    fn validate_accepts_timestamp_dates() {
        let body = payload(json!({
            "date": "2024-01-01T00:00:00.000Z",
            "party": "Acme",
            "rate": 1000,
            "bag": 10,
            "grossWeight": 500,
        }));

        assert_eq!(body.validate(), Ok(acme_sale()));
    }

    #[test]
    fn kapat_per_bag_defaults_when_missing_or_blank() {
        for kapat_per_bag in [json!(null), json!(""), json!("  ")] {
            let body = payload(json!({
                "rate": 1000,
                "bag": 10,
                "grossWeight": 500,
                "kapatPerBag": kapat_per_bag,
            }));

            assert_eq!(
                body.derivation_inputs().map(|inputs| inputs.kapat_per_bag),
                Ok(DEFAULT_KAPAT_PER_BAG)
            );
        }

        let body = payload(json!({ "rate": 1000, "bag": 10, "grossWeight": 500 }));
        assert_eq!(
            body.derivation_inputs(),
            Ok(DerivationInputs {
                rate: 1000.0,
                bag: 10,
                gross_weight: 500.0,
                kapat_per_bag: DEFAULT_KAPAT_PER_BAG,
            })
        );
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let cases = [
            (without_field("date"), "date is required"),
            (without_field("party"), "party is required"),
            (without_field("rate"), "rate is required"),
            (with_field("rate", json!("")), "rate is required"),
            (without_field("bag"), "bag is required"),
            (without_field("grossWeight"), "grossWeight is required"),
        ];

        for (body, want_message) in cases {
            assert_eq!(
                payload(body.clone()).validate(),
                Err(Error::Validation(want_message.to_owned())),
                "unexpected result for {body}"
            );
        }
    }

    #[test]
    fn validate_rejects_malformed_fields() {
        let cases = [
            (
                with_field("date", json!("01/02/2024")),
                "date must be a date like 2024-01-31",
            ),
            (with_field("party", json!(42)), "party must be text"),
            (with_field("rate", json!("abc")), "rate must be a number"),
            (with_field("rate", json!("NaN")), "rate must be a number"),
            (with_field("bag", json!(1.5)), "bag must be a whole number"),
            (
                with_field("grossWeight", json!(true)),
                "grossWeight must be a number",
            ),
        ];

        for (body, want_message) in cases {
            assert_eq!(
                payload(body.clone()).validate(),
                Err(Error::Validation(want_message.to_owned())),
                "unexpected result for {body}"
            );
        }
    }

    #[test]
    fn validate_accepts_negative_values() {
        let body = payload(json!({
            "date": "2024-01-01",
            "party": "Acme",
            "rate": -5,
            "bag": "-2",
            "grossWeight": 0,
        }));

        let new_transaction = body.validate().unwrap();

        assert_eq!(new_transaction.rate, -5.0);
        assert_eq!(new_transaction.bag, -2);
    }

    #[test]
    fn update_merges_present_fields_only() {
        let body = payload(json!({
            "bag": "20",
            "party": null,
            "ownerId": 99,
            "total": 1,
        }));

        let merged = body.apply_update(&acme_sale()).unwrap();

        assert_eq!(
            merged,
            NewTransaction {
                bag: 20,
                ..acme_sale()
            }
        );
    }

    #[test]
    fn update_resets_blank_kapat_per_bag() {
        let current = NewTransaction {
            kapat_per_bag: 2.5,
            ..acme_sale()
        };
        let body = payload(json!({ "kapatPerBag": "" }));

        let merged = body.apply_update(&current).unwrap();

        assert_eq!(merged.kapat_per_bag, DEFAULT_KAPAT_PER_BAG);
    }

    #[test]
    fn update_rejects_blank_required_field() {
        let body = payload(json!({ "party": "" }));

        assert_eq!(
            body.apply_update(&acme_sale()),
            Err(Error::Validation("party is required".to_owned()))
        );
    }
}
