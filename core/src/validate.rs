//! Request schemas, checked before anything is sent.
//!
//! Each request type implements `Schema`: its typed fields rule out most
//! shape errors, and `validate` checks the value constraints the types
//! cannot express. Validation stops at the first violation, in field
//! declaration order.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use ureq::http::Uri;
use uuid::{Uuid, Variant, Version};

use crate::error::{Rule, ValidationError};
use crate::types::{CreateInvoice, CreatePayout, Currency, UpdateInvoice};

/// JSON shape of a schema field, used when coercing untyped input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Whole number; numeric strings are accepted.
    Integer,
    /// Decimal amount given as a number or a numeric string.
    Amount,
    Currency,
}

/// A request body with a fixed set of fields and value constraints.
pub trait Schema: DeserializeOwned {
    /// Every field the schema accepts, with its JSON shape.
    const FIELDS: &'static [(&'static str, FieldKind)];

    /// Fields that must be present.
    const REQUIRED: &'static [&'static str] = &[];

    fn validate(&self) -> Result<(), ValidationError>;
}

impl Schema for CreateInvoice {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("reference_id", FieldKind::Text),
        ("customer_id", FieldKind::Text),
        ("description", FieldKind::Text),
        ("confirmations_required", FieldKind::Integer),
        ("notification_url", FieldKind::Text),
        ("confirmation_url", FieldKind::Text),
        ("redirect_url", FieldKind::Text),
        ("currency", FieldKind::Currency),
        ("amount", FieldKind::Amount),
        ("payment_window", FieldKind::Integer),
    ];

    fn validate(&self) -> Result<(), ValidationError> {
        non_empty("reference_id", self.reference_id.as_deref())?;
        non_empty("customer_id", self.customer_id.as_deref())?;
        non_empty("description", self.description.as_deref())?;
        positive_integer("confirmations_required", self.confirmations_required)?;
        uri("notification_url", self.notification_url.as_deref())?;
        uri("confirmation_url", self.confirmation_url.as_deref())?;
        uri("redirect_url", self.redirect_url.as_deref())?;
        if let Some(amount) = self.amount {
            positive_amount("amount", amount)?;
        }
        positive_integer("payment_window", self.payment_window)
    }
}

impl Schema for UpdateInvoice {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("reference_id", FieldKind::Text),
        ("customer_id", FieldKind::Text),
        ("description", FieldKind::Text),
    ];

    fn validate(&self) -> Result<(), ValidationError> {
        non_empty("reference_id", self.reference_id.as_deref())?;
        non_empty("customer_id", self.customer_id.as_deref())?;
        non_empty("description", self.description.as_deref())
    }
}

impl Schema for CreatePayout {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("currency", FieldKind::Currency),
        ("amount", FieldKind::Amount),
        ("address", FieldKind::Text),
        ("reference_id", FieldKind::Text),
        ("customer_id", FieldKind::Text),
        ("description", FieldKind::Text),
    ];
    const REQUIRED: &'static [&'static str] = &["currency", "amount", "address"];

    fn validate(&self) -> Result<(), ValidationError> {
        positive_amount("amount", self.amount)?;
        non_empty("address", Some(self.address.as_str()))?;
        non_empty("reference_id", self.reference_id.as_deref())?;
        non_empty("customer_id", self.customer_id.as_deref())?;
        non_empty("description", self.description.as_deref())
    }
}

/// Build a request body from untyped JSON.
///
/// The value must be an object holding only the schema's fields. Each field
/// is checked against its kind and coerced the way a lenient JSON schema
/// would (`"900"` is an integer, `22.5` is an amount), so a bad value is
/// reported against its own key. The result is then validated like a typed
/// request.
pub fn parse_request<T: Schema>(value: Value) -> Result<T, ValidationError> {
    let Value::Object(map) = value else {
        return Err(ValidationError::new(
            "value",
            Rule::Malformed("expected a JSON object".to_string()),
        ));
    };
    let mut coerced = Map::with_capacity(map.len());
    for (key, value) in map {
        let Some(&(_, kind)) = T::FIELDS.iter().find(|(name, _)| *name == key) else {
            return Err(ValidationError::new(key, Rule::UnknownField));
        };
        let value = coerce(&key, kind, value)?;
        coerced.insert(key, value);
    }
    if let Some(field) = T::REQUIRED.iter().find(|field| !coerced.contains_key(**field)) {
        return Err(ValidationError::new(*field, Rule::Required));
    }

    let parsed: T = serde_json::from_value(Value::Object(coerced))
        .map_err(|e| ValidationError::new("value", Rule::Malformed(e.to_string())))?;
    parsed.validate()?;
    Ok(parsed)
}

fn coerce(field: &str, kind: FieldKind, value: Value) -> Result<Value, ValidationError> {
    let malformed = |msg: &str| ValidationError::new(field, Rule::Malformed(msg.to_string()));
    match (kind, value) {
        (FieldKind::Text, value @ Value::String(_)) => Ok(value),
        (FieldKind::Text, _) => Err(malformed("expected a string")),
        (FieldKind::Currency, Value::String(code)) => {
            code.parse::<Currency>()?;
            Ok(Value::String(code))
        }
        (FieldKind::Currency, _) => Err(ValidationError::new(field, Rule::OneOf(Currency::CODES))),
        (FieldKind::Integer, value) => {
            let n = match &value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| malformed("expected an integer"))?;
            if n < 1 {
                return Err(ValidationError::new(field, Rule::Positive));
            }
            let n = u32::try_from(n).map_err(|_| malformed("integer is out of range"))?;
            Ok(Value::from(n))
        }
        (FieldKind::Amount, value) => {
            let text = match value {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.trim().to_string(),
                _ => return Err(malformed("expected a decimal amount")),
            };
            let amount = text
                .parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(&text))
                .map_err(|_| malformed("expected a decimal amount"))?;
            Ok(Value::String(amount.to_string()))
        }
    }
}

/// Parse an invoice or payout identifier, which must be a hyphenated UUID v4.
pub fn identifier(field: &str, value: &str) -> Result<Uuid, ValidationError> {
    let invalid = || ValidationError::new(field, Rule::UuidV4);
    if value.len() != 36 {
        return Err(invalid());
    }
    let id = Uuid::try_parse(value).map_err(|_| invalid())?;
    if id.get_version() != Some(Version::Random) || id.get_variant() != Variant::RFC4122 {
        return Err(invalid());
    }
    Ok(id)
}

fn non_empty(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(s) if s.is_empty() => Err(ValidationError::new(field, Rule::NotEmpty)),
        _ => Ok(()),
    }
}

fn positive_integer(field: &str, value: Option<u32>) -> Result<(), ValidationError> {
    match value {
        Some(0) => Err(ValidationError::new(field, Rule::Positive)),
        _ => Ok(()),
    }
}

fn positive_amount(field: &str, value: Decimal) -> Result<(), ValidationError> {
    if value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new(field, Rule::Positive))
    }
}

fn uri(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    let Some(value) = value else {
        return Ok(());
    };
    let parsed = value
        .parse::<Uri>()
        .map_err(|_| ValidationError::new(field, Rule::Uri))?;
    match (parsed.scheme(), parsed.host()) {
        (Some(_), Some(host)) if !host.is_empty() => Ok(()),
        _ => Err(ValidationError::new(field, Rule::Uri)),
    }
}
