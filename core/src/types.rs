//! Request payloads and typed response views for the RapidCoin API.
//!
//! # Design
//! Request types are what callers construct; each implements `Schema` (see
//! `crate::validate`) and is checked before it is serialized. Response
//! types mirror the mock-server's representations but are defined
//! independently; the integration tests catch drift between the two.
//! Amounts are `Decimal` and travel as decimal strings.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Rule, ValidationError};

/// Currencies accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Btc,
    Usd,
}

impl Currency {
    pub const CODES: &'static [&'static str] = &["BTC", "USD"];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Btc => "BTC",
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BTC" => Ok(Currency::Btc),
            "USD" => Ok(Currency::Usd),
            _ => Err(ValidationError::new("currency", Rule::OneOf(Self::CODES))),
        }
    }
}

/// Parameters for `POST /invoices`. Every field is optional; an invoice
/// without `amount` is an open invoice and is sent with amount 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateInvoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations_required: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_window: Option<u32>,
}

/// Parameters for `PATCH /invoices/{id}`. Omitted fields stay unchanged on
/// the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateInvoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parameters for `POST /payouts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePayout {
    pub currency: Currency,
    pub amount: Decimal,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreatePayout {
    pub fn new(currency: Currency, amount: Decimal, address: impl Into<String>) -> Self {
        Self {
            currency,
            amount,
            address: address.into(),
            reference_id: None,
            customer_id: None,
            description: None,
        }
    }
}

/// An invoice as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub status: String,
    pub currency: Currency,
    pub rate: Decimal,
    pub amount: Decimal,
    pub amount_btc: Decimal,
    pub address: String,
    #[serde(default)]
    pub confirmations_required: Option<u32>,
    #[serde(default)]
    pub payment_window: Option<u32>,
    #[serde(default)]
    pub notification_url: Option<String>,
    #[serde(default)]
    pub confirmation_url: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub invoice_time: String,
    pub expiration_time: String,
}

impl Invoice {
    /// An open invoice has no fixed amount.
    pub fn is_open(&self) -> bool {
        self.amount.is_zero()
    }
}

/// A payout as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub id: Uuid,
    pub status: String,
    pub address: String,
    pub currency: Currency,
    pub amount: Decimal,
    pub amount_btc: Decimal,
    pub rate: Decimal,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: String,
}

/// Exchange rate from BTC to `currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub currency: Currency,
    pub rate: f64,
}

/// Organization balance per currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub btc: f64,
    pub usd: f64,
}
