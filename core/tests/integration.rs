//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port, then drives the
//! client over real HTTP through the default `UreqTransport`. This checks
//! request building, header handling and response normalization together,
//! and catches drift between the core DTOs and the server's JSON.

use rapidcoin_core::{
    ApiError, ApiResult, Balance, ClientConfig, CreateInvoice, CreatePayout, Currency, Invoice, Payout,
    RapidCoinClient, Rate, UpdateInvoice,
};
use rust_decimal::Decimal;
use serde_json::json;

const API_KEY: &str = "api-key-test-0000";
const UNKNOWN_ID: &str = "8122e413-7246-4874-ad1c-15261d32c2cf";

/// Start the mock server on a random port and return its base URL.
fn spawn_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, API_KEY).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client(base_url: &str) -> RapidCoinClient {
    RapidCoinClient::new(ClientConfig::new(base_url, API_KEY, "1.0"))
}

fn client_with_key(base_url: &str, api_key: &str) -> RapidCoinClient {
    RapidCoinClient::new(ClientConfig::new(base_url, api_key, "1.0"))
}

fn invoice_params() -> CreateInvoice {
    CreateInvoice {
        reference_id: Some("reference_id".to_string()),
        customer_id: Some("customer_id".to_string()),
        description: Some("Test Product".to_string()),
        confirmations_required: Some(1),
        notification_url: Some("https://www.rapidcoin.com/notification".to_string()),
        confirmation_url: Some("https://www.rapidcoin.com/confirmation".to_string()),
        redirect_url: Some("https://www.rapidcoin.com".to_string()),
        currency: Some(Currency::Usd),
        amount: Some(Decimal::from(22)),
        payment_window: Some(900),
    }
}

fn payout_params(amount: &str) -> CreatePayout {
    CreatePayout {
        reference_id: Some("1".to_string()),
        customer_id: Some("1234".to_string()),
        description: Some("Test".to_string()),
        ..CreatePayout::new(Currency::Btc, amount.parse().unwrap(), "mfkXHJnvyS9bXp29rowWVyUDrDxJoq6YFC")
    }
}

fn assert_failure(result: ApiResult, status: u16, error: serde_json::Value) {
    let envelope = result.into_result().unwrap_err();
    assert_eq!(envelope.status, status);
    assert_eq!(envelope.error, error);
}

#[test]
fn wrong_api_key_is_rejected_for_every_authenticated_operation() {
    let base = spawn_server();
    let c = client_with_key(&base, "some-api-key");
    let invalid = json!({"message": "Invalid API key"});

    assert_failure(c.create_invoice(&invoice_params()).unwrap(), 401, invalid.clone());
    assert_failure(c.read_invoice(UNKNOWN_ID).unwrap(), 401, invalid.clone());
    assert_failure(c.update_invoice(UNKNOWN_ID, &UpdateInvoice::default()).unwrap(), 401, invalid.clone());
    assert_failure(c.create_payout(&payout_params("0.012")).unwrap(), 401, invalid.clone());
    assert_failure(c.read_payout(UNKNOWN_ID).unwrap(), 401, invalid.clone());
    assert_failure(c.get_organization_balance().unwrap(), 401, invalid);
}

#[test]
fn empty_api_key_is_reported_as_missing() {
    let base = spawn_server();
    let c = client_with_key(&base, "");
    assert_failure(
        c.get_organization_balance().unwrap(),
        401,
        json!({"message": "Missing API key"}),
    );
}

#[test]
fn create_invoice_with_fixed_amount() {
    let base = spawn_server();
    let invoice: Invoice = client(&base)
        .create_invoice(&invoice_params())
        .unwrap()
        .decode()
        .unwrap();

    assert_eq!(invoice.status, "new");
    assert_eq!(invoice.currency, Currency::Usd);
    assert_eq!(invoice.amount, Decimal::from(22));
    assert_eq!(invoice.amount_btc.to_string(), "0.00268744");
    assert_eq!(invoice.payment_window, Some(900));
    assert_eq!(invoice.reference_id.as_deref(), Some("reference_id"));
    assert!(!invoice.is_open());
}

#[test]
fn create_open_invoice() {
    let base = spawn_server();
    let params = CreateInvoice {
        amount: None,
        ..invoice_params()
    };
    let payload = client(&base)
        .create_invoice(&params)
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(payload["amount"], "0");
    let invoice: Invoice = serde_json::from_value(payload).unwrap();
    assert!(invoice.is_open());
}

#[test]
fn invoice_without_currency_is_refused_by_the_service() {
    let base = spawn_server();
    let params = CreateInvoice {
        currency: None,
        ..invoice_params()
    };
    assert_failure(
        client(&base).create_invoice(&params).unwrap(),
        422,
        json!({"message": "validation error", "errors": {"currency": ["Currency code is invalid."]}}),
    );
}

#[test]
fn invalid_currency_never_leaves_the_client() {
    let err = "EUR".parse::<Currency>().unwrap_err();
    assert_eq!(err.field, "currency");

    let err = rapidcoin_core::parse_request::<CreatePayout>(json!({
        "currency": "EUR",
        "amount": "1",
        "address": "addr"
    }))
    .unwrap_err();
    assert_eq!(err.field, "currency");
}

#[test]
fn read_invoice() {
    let base = spawn_server();
    let c = client(&base);
    let created: Invoice = c.create_invoice(&invoice_params()).unwrap().decode().unwrap();

    let fetched: Invoice = c.read_invoice(&created.id.to_string()).unwrap().decode().unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn read_unknown_invoice_returns_404() {
    let base = spawn_server();
    let result = client(&base).read_invoice(UNKNOWN_ID).unwrap();
    assert_eq!(result.failure_status(), Some(404));
    assert_failure(
        result,
        404,
        json!({"message": "Invoice not found."}),
    );
}

#[test]
fn malformed_id_is_a_validation_error() {
    // Nothing listens here; a validation error must come back before any I/O.
    let c = client("http://127.0.0.1:9");
    for result in [c.read_invoice("1234"), c.read_payout("not-a-uuid")] {
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}

#[test]
fn update_invoice_merges_fields() {
    let base = spawn_server();
    let c = client(&base);
    let created: Invoice = c.create_invoice(&invoice_params()).unwrap().decode().unwrap();

    let update = UpdateInvoice {
        reference_id: Some("new-reference-id".to_string()),
        ..Default::default()
    };
    let updated: Invoice = c
        .update_invoice(&created.id.to_string(), &update)
        .unwrap()
        .decode()
        .unwrap();

    assert_eq!(updated.reference_id.as_deref(), Some("new-reference-id"));
    assert_eq!(updated.customer_id, created.customer_id);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.amount, created.amount);
}

#[test]
fn update_unknown_invoice_returns_404() {
    let base = spawn_server();
    assert_failure(
        client(&base).update_invoice(UNKNOWN_ID, &UpdateInvoice::default()).unwrap(),
        404,
        json!({"message": "Invoice not found."}),
    );
}

#[test]
fn create_and_read_payout() {
    let base = spawn_server();
    let c = client(&base);
    let payout: Payout = c.create_payout(&payout_params("0.012")).unwrap().decode().unwrap();

    assert_eq!(payout.status, "new");
    assert_eq!(payout.currency, Currency::Btc);
    assert_eq!(payout.amount.to_string(), "0.012");
    assert_eq!(payout.address, "mfkXHJnvyS9bXp29rowWVyUDrDxJoq6YFC");

    let fetched: Payout = c.read_payout(&payout.id.to_string()).unwrap().decode().unwrap();
    assert_eq!(fetched, payout);
}

#[test]
fn payout_over_available_funds_returns_403() {
    let base = spawn_server();
    let result = client(&base).create_payout(&payout_params("1.2")).unwrap();
    let envelope = result.clone().into_result().unwrap_err();
    assert_eq!(envelope.message(), Some("Insufficient funds"));
    assert_failure(result, 403, json!({"error": {"message": "Insufficient funds"}}));
}

#[test]
fn read_unknown_payout_returns_404() {
    let base = spawn_server();
    assert_failure(
        client(&base).read_payout(UNKNOWN_ID).unwrap(),
        404,
        json!({"message": "Payout not found."}),
    );
}

#[test]
fn rates() {
    let base = spawn_server();
    let c = client(&base);

    let btc = c.get_rate(Currency::Btc).unwrap();
    assert_eq!(btc, ApiResult::Success(json!({"currency": "BTC", "rate": 1})));

    let usd: Rate = c.get_rate(Currency::Usd).unwrap().decode().unwrap();
    assert_eq!(usd, Rate { currency: Currency::Usd, rate: 8186.22 });
}

#[test]
fn organization_balance() {
    let base = spawn_server();
    let result = client(&base).get_organization_balance().unwrap();
    assert_eq!(result, ApiResult::Success(json!({"btc": 0.22648, "usd": 5200})));

    let balance: Balance = result.decode().unwrap();
    assert_eq!(balance.usd, 5200.0);
}

#[test]
fn unreachable_service_yields_transport_failure() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let c = client(&format!("http://127.0.0.1:{port}"));
    let envelope = c.get_organization_balance().unwrap().into_result().unwrap_err();
    assert!(envelope.is_transport());
    assert_eq!(envelope.status, 0);
    assert!(envelope.error["transport"].is_string());
}

#[test]
fn client_is_shareable_across_threads() {
    let base = spawn_server();
    let c = std::sync::Arc::new(client(&base));
    let handles: Vec<_> = [Currency::Btc, Currency::Usd, Currency::Btc, Currency::Usd]
        .into_iter()
        .map(|currency| {
            let c = std::sync::Arc::clone(&c);
            std::thread::spawn(move || c.get_rate(currency).unwrap().decode::<Rate>().unwrap())
        })
        .collect();
    for handle in handles {
        let rate = handle.join().unwrap();
        assert!(rate.rate >= 1.0);
    }
}
