//! HTTP API tests over the full router with the in-memory store.
//!
//! Exercises the purchase -> confirmation -> history flow end to end,
//! plus the error mapping the presentation layer depends on.

#![allow(clippy::unwrap_used)]

use axum_test::TestServer;
use metro_ticketing::payment_gateway::SimulatedGateway;
use metro_ticketing::store::{FailNext, InMemoryTicketStore};
use metro_ticketing::types::{Money, RouteId};
use metro_ticketing::{AppState, build_router};
use serde_json::{Value, json};
use std::sync::Arc;

struct TestApp {
    server: TestServer,
    store: InMemoryTicketStore,
    route_id: RouteId,
}

fn spawn_app() -> TestApp {
    let store = InMemoryTicketStore::new();
    let quitumbe = store.add_station("Quitumbe", "Av. Condor Nan");
    let labrador = store.add_station("El Labrador", "Av. Galo Plaza");
    let route_id = store.add_route("L1 Sur-Norte", Money::from_cents(55), quitumbe, labrador);

    let state = AppState::new(Arc::new(store.clone()), Arc::new(SimulatedGateway));
    let server = TestServer::new(build_router(state)).unwrap();
    TestApp {
        server,
        store,
        route_id,
    }
}

fn purchase_body(route_id: RouteId, quantity: u32) -> Value {
    json!({
        "user_id": 1,
        "route_id": route_id,
        "quantity": quantity,
        "payment_method": "cash",
        "fare_class": "standard",
    })
}

#[tokio::test]
async fn purchase_creates_batch_and_confirmation_totals_match() {
    let app = spawn_app();

    let response = app
        .server
        .post("/api/purchase")
        .json(&purchase_body(app.route_id, 3))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["ticket_ids"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["total"], json!(165));
    assert_eq!(body["total_display"], json!("1.65"));

    let token = body["confirmation_token"].as_str().unwrap();
    let confirmation = app
        .server
        .get("/api/purchase-confirmation")
        .add_query_param("token", token)
        .await;
    confirmation.assert_status_ok();

    let summary: Value = confirmation.json();
    assert_eq!(summary["tickets"].as_array().map(Vec::len), Some(3));
    assert_eq!(summary["total"], json!(165));
}

#[tokio::test]
async fn ticket_view_joins_route_and_stations() {
    let app = spawn_app();

    let response = app
        .server
        .post("/api/purchase")
        .json(&purchase_body(app.route_id, 1))
        .await;
    let body: Value = response.json();
    let ticket_id = body["ticket_ids"][0].as_i64().unwrap();

    let ticket = app.server.get(&format!("/api/tickets/{ticket_id}")).await;
    ticket.assert_status_ok();

    let view: Value = ticket.json();
    assert_eq!(view["ruta_nombre"], json!("L1 Sur-Norte"));
    assert_eq!(view["origen"], json!("Quitumbe"));
    assert_eq!(view["destino"], json!("El Labrador"));
    assert_eq!(view["estado"], json!("paid"));
    assert_eq!(view["monto"], json!(55));
    assert!(
        view["codigo_qr"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,")
    );
    // Operator-local rendering of the purchase instant (America/Guayaquil).
    assert!(
        view["fecha_compra_local"]
            .as_str()
            .unwrap()
            .ends_with("-05:00")
    );
}

#[tokio::test]
async fn forged_token_repeating_one_ticket_is_rejected() {
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let app = spawn_app();

    let response = app
        .server
        .post("/api/purchase")
        .json(&purchase_body(app.route_id, 1))
        .await;
    let body: Value = response.json();
    let ticket_id = body["ticket_ids"][0].as_i64().unwrap();

    let forged =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&[ticket_id, ticket_id, ticket_id]).unwrap());
    let confirmation = app
        .server
        .get("/api/purchase-confirmation")
        .add_query_param("token", &forged)
        .await;
    confirmation.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = confirmation.json();
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn unknown_ticket_is_a_404_not_a_server_error() {
    let app = spawn_app();
    let response = app.server.get("/api/tickets/424242").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], json!("TICKET_NOT_FOUND"));
}

#[tokio::test]
async fn unknown_route_purchase_is_rejected() {
    let app = spawn_app();
    let response = app
        .server
        .post("/api/purchase")
        .json(&purchase_body(RouteId::new(9999), 1))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], json!("ROUTE_NOT_FOUND"));
    assert_eq!(app.store.ticket_count(), 0);
}

#[tokio::test]
async fn zero_quantity_is_a_validation_error() {
    let app = spawn_app();
    let response = app
        .server
        .post("/api/purchase")
        .json(&purchase_body(app.route_id, 0))
        .await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn confirmation_without_token_is_a_bad_request() {
    let app = spawn_app();
    let response = app.server.get("/api/purchase-confirmation").await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let garbled = app
        .server
        .get("/api/purchase-confirmation")
        .add_query_param("token", "!!not-a-token!!")
        .await;
    garbled.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn history_lists_a_riders_tickets_newest_first() {
    let app = spawn_app();

    for _ in 0..2 {
        app.server
            .post("/api/purchase")
            .json(&purchase_body(app.route_id, 1))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    let history = app.server.get("/api/users/1/tickets").await;
    history.assert_status_ok();
    let body: Value = history.json();
    let tickets = body["tickets"].as_array().unwrap();
    assert_eq!(tickets.len(), 2);

    let first = tickets[0]["fecha_compra"].as_str().unwrap();
    let second = tickets[1]["fecha_compra"].as_str().unwrap();
    assert!(first >= second);

    let other = app.server.get("/api/users/99/tickets").await;
    other.assert_status_ok();
    let body: Value = other.json();
    assert_eq!(body["tickets"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn route_catalog_and_reports_reflect_sales() {
    let app = spawn_app();

    let catalog = app.server.get("/api/routes").await;
    catalog.assert_status_ok();
    let body: Value = catalog.json();
    assert_eq!(body["routes"][0]["origen"], json!("Quitumbe"));
    assert_eq!(body["routes"][0]["precio"], json!(55));

    app.server
        .post("/api/purchase")
        .json(&purchase_body(app.route_id, 2))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let sales = app.server.get("/api/reports/sales").await;
    sales.assert_status_ok();
    let body: Value = sales.json();
    assert_eq!(body["tickets_sold"], json!(2));
    assert_eq!(body["total_revenue"], json!(110));

    let report = app.server.get("/api/reports/tickets").await;
    report.assert_status_ok();
    let body: Value = report.json();
    assert_eq!(body["tickets"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn store_failure_mid_purchase_leaves_no_rows_and_maps_to_500() {
    let app = spawn_app();
    app.store.fail_next(FailNext::InsertAfter(1));

    let response = app
        .server
        .post("/api/purchase")
        .json(&purchase_body(app.route_id, 3))
        .await;
    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.store.ticket_count(), 0);
    assert_eq!(app.store.payment_count(), 0);
}

#[tokio::test]
async fn store_outage_maps_to_503() {
    let app = spawn_app();
    app.store.fail_next(FailNext::Reads);

    let response = app.server.get("/api/routes").await;
    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["code"], json!("STORE_UNAVAILABLE"));
}
