//! RapidCoin API client.
//!
//! # Design
//! `RapidCoinClient` holds its `ClientConfig` and a `Transport` and carries
//! no mutable state between calls. Each operation is split into a
//! `build_*` method that validates the input and produces an `HttpRequest`,
//! and an operation method that sends it once and normalizes the outcome
//! into an `ApiResult`. Only validation (and the unreachable serialization
//! case) is returned as `Err`; everything after the request leaves is data.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::result::ApiResult;
use crate::transport::{Transport, UreqTransport};
use crate::types::{CreateInvoice, CreatePayout, Currency, UpdateInvoice};
use crate::validate::{self, Schema};

/// Client for the RapidCoin invoices, payouts, rates and balance API.
#[derive(Debug, Clone)]
pub struct RapidCoinClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl RapidCoinClient<UreqTransport> {
    /// Client using the default blocking transport with a 30 second timeout.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T> RapidCoinClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `POST /invoices`. A missing amount is sent as 0, creating an open
    /// invoice.
    pub fn build_create_invoice(&self, input: &CreateInvoice) -> Result<HttpRequest, ApiError> {
        input.validate()?;
        let mut body = input.clone();
        body.amount.get_or_insert(rust_decimal::Decimal::ZERO);
        self.request(HttpMethod::Post, "/invoices".to_string(), Some(&body))
    }

    /// `GET /invoices/{id}`.
    pub fn build_read_invoice(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let id = validate::identifier("id", id)?;
        self.request::<()>(HttpMethod::Get, format!("/invoices/{id}"), None)
    }

    /// `PATCH /invoices/{id}`.
    pub fn build_update_invoice(&self, id: &str, input: &UpdateInvoice) -> Result<HttpRequest, ApiError> {
        let id = validate::identifier("id", id)?;
        input.validate()?;
        self.request(HttpMethod::Patch, format!("/invoices/{id}"), Some(input))
    }

    /// `POST /payouts`.
    pub fn build_create_payout(&self, input: &CreatePayout) -> Result<HttpRequest, ApiError> {
        input.validate()?;
        self.request(HttpMethod::Post, "/payouts".to_string(), Some(input))
    }

    /// `GET /payouts/{id}`.
    pub fn build_read_payout(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let id = validate::identifier("id", id)?;
        self.request::<()>(HttpMethod::Get, format!("/payouts/{id}"), None)
    }

    /// `GET /rates/{currency}`.
    pub fn build_get_rate(&self, currency: Currency) -> Result<HttpRequest, ApiError> {
        self.request::<()>(HttpMethod::Get, format!("/rates/{currency}"), None)
    }

    /// `GET /organization/balance`.
    pub fn build_get_organization_balance(&self) -> Result<HttpRequest, ApiError> {
        self.request::<()>(HttpMethod::Get, "/organization/balance".to_string(), None)
    }

    fn request<B: Serialize>(&self, method: HttpMethod, path: String, body: Option<&B>) -> Result<HttpRequest, ApiError> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            url: format!("{}{path}", self.config.base_url()),
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("x-api-key".to_string(), self.config.api_key().to_string()),
                ("x-api-version".to_string(), self.config.api_version().to_string()),
            ],
            body,
        })
    }
}

impl<T: Transport> RapidCoinClient<T> {
    pub fn create_invoice(&self, input: &CreateInvoice) -> Result<ApiResult, ApiError> {
        let request = self.build_create_invoice(input)?;
        Ok(self.execute(&request))
    }

    pub fn read_invoice(&self, id: &str) -> Result<ApiResult, ApiError> {
        let request = self.build_read_invoice(id)?;
        Ok(self.execute(&request))
    }

    pub fn update_invoice(&self, id: &str, input: &UpdateInvoice) -> Result<ApiResult, ApiError> {
        let request = self.build_update_invoice(id, input)?;
        Ok(self.execute(&request))
    }

    pub fn create_payout(&self, input: &CreatePayout) -> Result<ApiResult, ApiError> {
        let request = self.build_create_payout(input)?;
        Ok(self.execute(&request))
    }

    pub fn read_payout(&self, id: &str) -> Result<ApiResult, ApiError> {
        let request = self.build_read_payout(id)?;
        Ok(self.execute(&request))
    }

    pub fn get_rate(&self, currency: Currency) -> Result<ApiResult, ApiError> {
        let request = self.build_get_rate(currency)?;
        Ok(self.execute(&request))
    }

    pub fn get_organization_balance(&self) -> Result<ApiResult, ApiError> {
        let request = self.build_get_organization_balance()?;
        Ok(self.execute(&request))
    }

    /// Send a prepared request once and normalize whatever comes back.
    pub fn execute(&self, request: &HttpRequest) -> ApiResult {
        debug!(method = %request.method, url = %request.url, "sending request");
        let outcome = self.transport.execute(request);
        match &outcome {
            Ok(response) => debug!(status = response.status, url = %request.url, "response received"),
            Err(err) => warn!(method = %request.method, url = %request.url, error = %err, "request got no response"),
        }
        ApiResult::from(outcome)
    }
}
