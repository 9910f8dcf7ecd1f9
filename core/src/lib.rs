//! Client core for the RapidCoin payment-processing API.
//!
//! # Overview
//! Validates caller input against a fixed schema per operation, builds
//! `HttpRequest` values, sends them through a `Transport`, and normalizes
//! every outcome into an `ApiResult`: the decoded payload on success, or a
//! `FailureEnvelope { status, error }` for remote and transport failures.
//!
//! # Design
//! - `RapidCoinClient` holds only its `ClientConfig` and transport, so it is
//!   safe to share and to instantiate many times with different settings.
//! - Validation errors are the only `Err` a call can produce, and they are
//!   raised before any I/O.
//! - Each operation has a pure `build_*` counterpart so callers can run the
//!   request on their own HTTP stack and feed the response to
//!   `ApiResult::from_response`.
//! - Response DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod result;
pub mod transport;
pub mod types;
pub mod validate;

pub use client::RapidCoinClient;
pub use config::ClientConfig;
pub use error::{ApiError, Rule, TransportError, TransportErrorKind, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use result::{ApiResult, FailureEnvelope, TRANSPORT_FAILURE_STATUS};
pub use transport::{Transport, UreqTransport, REQUEST_TIMEOUT};
pub use types::{Balance, CreateInvoice, CreatePayout, Currency, Invoice, Payout, Rate, UpdateInvoice};
pub use validate::{parse_request, FieldKind, Schema};
