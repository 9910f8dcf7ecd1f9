use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "api-key-test-0000";

const BTC_RATE: Decimal = dec!(1);
const USD_RATE: Decimal = dec!(8186.22);
const DEFAULT_PAYMENT_WINDOW_SECS: u64 = 900;
const INVOICE_LIFETIME_MS: u128 = 7 * 24 * 60 * 60 * 1000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub status: String,
    pub currency: String,
    pub rate: Decimal,
    pub amount: Decimal,
    pub amount_btc: Decimal,
    pub address: String,
    pub confirmations_required: Option<u32>,
    pub payment_window: Option<u32>,
    pub notification_url: Option<String>,
    pub confirmation_url: Option<String>,
    pub redirect_url: Option<String>,
    pub reference_id: Option<String>,
    pub customer_id: Option<String>,
    pub description: Option<String>,
    pub invoice_time: String,
    pub payment_time: String,
    pub expiration_time: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payout {
    pub id: Uuid,
    pub status: String,
    pub address: String,
    pub currency: String,
    pub amount: Decimal,
    pub amount_btc: Decimal,
    pub rate: Decimal,
    pub reference_id: Option<String>,
    pub customer_id: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct CreateInvoice {
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub confirmations_required: Option<u32>,
    pub payment_window: Option<u32>,
    pub notification_url: Option<String>,
    pub confirmation_url: Option<String>,
    pub redirect_url: Option<String>,
    pub reference_id: Option<String>,
    pub customer_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateInvoice {
    pub reference_id: Option<String>,
    pub customer_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreatePayout {
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub address: Option<String>,
    pub reference_id: Option<String>,
    pub customer_id: Option<String>,
    pub description: Option<String>,
}

/// Funds available for payouts, per currency.
#[derive(Clone, Debug)]
pub struct Balance {
    pub btc: Decimal,
    pub usd: Decimal,
}

impl Default for Balance {
    fn default() -> Self {
        Self {
            btc: dec!(0.22648),
            usd: dec!(5200),
        }
    }
}

#[derive(Default)]
pub struct Store {
    invoices: HashMap<Uuid, Invoice>,
    payouts: HashMap<Uuid, Payout>,
    balance: Balance,
}

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    store: Arc<RwLock<Store>>,
}

/// Error response in the service's JSON shape.
pub struct Rejection(StatusCode, Value);

impl Rejection {
    fn message(status: StatusCode, message: &str) -> Self {
        Rejection(status, json!({ "message": message }))
    }

    fn validation(field: &str, message: &str) -> Self {
        Rejection(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "message": "validation error", "errors": { field: [message] } }),
        )
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        store: Arc::new(RwLock::new(Store::default())),
    };
    let authenticated = Router::new()
        .route("/invoices", post(create_invoice))
        .route("/invoices/{id}", get(read_invoice).patch(update_invoice))
        .route("/payouts", post(create_payout))
        .route("/payouts/{id}", get(read_payout))
        .route("/organization/balance", get(organization_balance))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));
    Router::new()
        .route("/rates/{currency}", get(get_rate))
        .merge(authenticated)
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(api_key)).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if key.is_empty() {
        return Rejection::message(StatusCode::UNAUTHORIZED, "Missing API key").into_response();
    }
    if key != &*state.api_key {
        return Rejection::message(StatusCode::UNAUTHORIZED, "Invalid API key").into_response();
    }
    next.run(request).await
}

async fn create_invoice(
    State(state): State<AppState>,
    Json(input): Json<CreateInvoice>,
) -> Result<(StatusCode, Json<Invoice>), Rejection> {
    let (currency, rate) = currency_rate(input.currency.as_deref())?;
    // Zero is an open invoice.
    let amount = input.amount.unwrap_or_default();
    if amount < Decimal::ZERO {
        return Err(Rejection::validation("amount", "The amount must not be negative."));
    }
    let id = Uuid::new_v4();
    let now = now_millis();
    let window = input
        .payment_window
        .map(u64::from)
        .unwrap_or(DEFAULT_PAYMENT_WINDOW_SECS);

    let invoice = Invoice {
        id,
        status: "new".to_string(),
        currency: currency.to_string(),
        rate,
        amount,
        amount_btc: (amount / rate).round_dp(8),
        address: deposit_address(id),
        confirmations_required: input.confirmations_required,
        payment_window: input.payment_window,
        notification_url: input.notification_url,
        confirmation_url: input.confirmation_url,
        redirect_url: input.redirect_url,
        reference_id: input.reference_id,
        customer_id: input.customer_id,
        description: input.description,
        invoice_time: now.to_string(),
        payment_time: (now + u128::from(window) * 1000).to_string(),
        expiration_time: (now + INVOICE_LIFETIME_MS).to_string(),
    };
    state.store.write().await.invoices.insert(id, invoice.clone());
    info!(%id, %currency, %amount, "invoice created");
    Ok((StatusCode::CREATED, Json(invoice)))
}

async fn read_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, Rejection> {
    let store = state.store.read().await;
    store
        .invoices
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(invoice_not_found)
}

async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateInvoice>,
) -> Result<Json<Invoice>, Rejection> {
    let mut store = state.store.write().await;
    let invoice = store.invoices.get_mut(&id).ok_or_else(invoice_not_found)?;
    if let Some(reference_id) = input.reference_id {
        invoice.reference_id = Some(reference_id);
    }
    if let Some(customer_id) = input.customer_id {
        invoice.customer_id = Some(customer_id);
    }
    if let Some(description) = input.description {
        invoice.description = Some(description);
    }
    info!(%id, "invoice updated");
    Ok(Json(invoice.clone()))
}

async fn create_payout(
    State(state): State<AppState>,
    Json(input): Json<CreatePayout>,
) -> Result<Json<Payout>, Rejection> {
    let (currency, rate) = currency_rate(input.currency.as_deref())?;
    let amount = input
        .amount
        .filter(|amount| *amount > Decimal::ZERO)
        .ok_or_else(|| Rejection::validation("amount", "The amount must be greater than 0."))?;
    let address = input
        .address
        .filter(|address| !address.is_empty())
        .ok_or_else(|| Rejection::validation("address", "The address field is required."))?;

    let mut store = state.store.write().await;
    let available = match currency {
        "BTC" => &mut store.balance.btc,
        _ => &mut store.balance.usd,
    };
    if amount > *available {
        info!(%currency, %amount, available = %*available, "payout refused");
        return Err(Rejection(
            StatusCode::FORBIDDEN,
            json!({ "error": { "message": "Insufficient funds" } }),
        ));
    }
    *available -= amount;

    let payout = Payout {
        id: Uuid::new_v4(),
        status: "new".to_string(),
        address,
        currency: currency.to_string(),
        amount,
        amount_btc: (amount / rate).round_dp(8),
        rate,
        reference_id: input.reference_id,
        customer_id: input.customer_id,
        description: input.description,
        created_at: now_millis().to_string(),
    };
    store.payouts.insert(payout.id, payout.clone());
    info!(id = %payout.id, %currency, %amount, "payout created");
    Ok(Json(payout))
}

async fn read_payout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payout>, Rejection> {
    let store = state.store.read().await;
    store
        .payouts
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Rejection::message(StatusCode::NOT_FOUND, "Payout not found."))
}

async fn get_rate(Path(currency): Path<String>) -> Result<Json<Value>, Rejection> {
    let (currency, rate) = currency_rate(Some(&currency))?;
    Ok(Json(json!({ "currency": currency, "rate": decimal_number(rate) })))
}

async fn organization_balance(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read().await;
    Json(json!({
        "btc": decimal_number(store.balance.btc),
        "usd": decimal_number(store.balance.usd),
    }))
}

fn invoice_not_found() -> Rejection {
    Rejection::message(StatusCode::NOT_FOUND, "Invoice not found.")
}

fn currency_rate(code: Option<&str>) -> Result<(&'static str, Decimal), Rejection> {
    match code {
        Some("BTC") => Ok(("BTC", BTC_RATE)),
        Some("USD") => Ok(("USD", USD_RATE)),
        _ => Err(Rejection::validation("currency", "Currency code is invalid.")),
    }
}

/// Render a decimal as a JSON number, integral values without a fraction.
fn decimal_number(value: Decimal) -> Value {
    value
        .normalize()
        .to_string()
        .parse::<Number>()
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn deposit_address(id: Uuid) -> String {
    format!("mock{}", id.simple())
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}
