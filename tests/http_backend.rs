use axum::extract::{Path, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{FixedOffset, NaiveDate};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use car_rental_core::auth::Credentials;
use car_rental_core::backend::Backend;
use car_rental_core::booking::models::{
    BookingId, BookingStatus, NewBooking, Payment, RescheduleChange, WalletCharge,
};
use car_rental_core::pricing::{DateRange, DiscountType, PaymentMethod};
use car_rental_core::vehicles::{Availability, VehicleId};
use car_rental_core::{AppError, HttpBackend};

const TOKEN: &str = "secret";

/// Request bodies seen by the stand-in backend, keyed by route
#[derive(Clone, Default)]
struct Seen {
    bodies: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Seen {
    fn record(&self, route: &str, body: Value) {
        self.bodies.lock().unwrap().push((route.to_string(), body));
    }

    fn body(&self, route: &str) -> Value {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .find(|(r, _)| r == route)
            .map(|(_, b)| b.clone())
            .unwrap_or(Value::Null)
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid token" }))).into_response()
}

async fn list_cars() -> Json<Value> {
    Json(json!([
        {
            "car_id": 1,
            "brand": "Honda Civic",
            "price": 1500,
            "status": "Available",
            "category": "Sedan"
        },
        {
            "car_id": "2",
            "brand": "Toyota Fortuner",
            "price": "2500.00",
            "status": "rented",
            "category": "SUV"
        }
    ]))
}

async fn get_car(Path(id): Path<String>) -> Response {
    if id == "1" {
        Json(json!({ "car_id": 1, "brand": "Honda Civic", "price": 1500, "status": "available" }))
            .into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "message": "Car not found" }))).into_response()
    }
}

async fn set_status(
    State(seen): State<Seen>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    seen.record(&format!("status/{}", id), body);
    Json(json!({ "message": "Status updated" })).into_response()
}

async fn create_booking(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    seen.record("bookings", body);
    (StatusCode::CREATED, Json(json!({ "bookingId": 77 }))).into_response()
}

async fn booking_history(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "bookings": [
            {
                "booking_id": 77,
                "car_id": 1,
                "car_name": "Honda Civic",
                "start_date": "2024-05-31T16:00:00.000Z",
                "end_date": "2024-06-02T16:00:00.000Z",
                "total_price": "4500.00",
                "final_price": null,
                "status": null
            },
            {
                "booking_id": 78,
                "car_id": 2,
                "start_date": "2024-04-01",
                "end_date": "2024-04-02",
                "total_price": 5000,
                "status": "cancelled"
            }
        ]
    }))
    .into_response()
}

async fn cancel_booking(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({ "message": format!("Booking {} cancelled", id) })).into_response()
}

async fn delete_booking() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "database unavailable" })),
    )
        .into_response()
}

async fn reschedule(
    State(seen): State<Seen>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    seen.record(&format!("reschedule/{}", id), body);
    Json(json!({ "message": "Booking updated" })).into_response()
}

async fn payments(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    seen.record("payments", body);
    // ack without a body
    StatusCode::CREATED.into_response()
}

async fn wallet(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    seen.record("wallet", body);
    Json(json!({ "checkout_url": "https://pay.example.test/session/abc" })).into_response()
}

async fn spawn_backend() -> (HttpBackend, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/cars", get(list_cars))
        .route("/cars/:id", get(get_car))
        .route("/cars/:id/status", put(set_status))
        .route("/bookings", post(create_booking))
        .route("/bookings/:id", put(reschedule))
        .route("/booking-history", get(booking_history))
        .route("/cancel-booking/:id", post(cancel_booking))
        .route("/delete-booking/:id", delete(delete_booking))
        .route("/payments", post(payments))
        .route("/create-gcash-payment", post(wallet))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let backend = HttpBackend::new(
        format!("http://{}/", addr),
        Duration::from_secs(5),
        FixedOffset::east_opt(8 * 3600).unwrap(),
    )
    .unwrap();
    (backend, seen)
}

fn token() -> car_rental_core::auth::BearerToken {
    Credentials::with_token(TOKEN).bearer().unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ==================== vehicles ====================

#[tokio::test]
async fn test_list_vehicles_normalizes_records() {
    let (backend, _) = spawn_backend().await;

    let vehicles = backend.list_vehicles().await.unwrap();

    assert_eq!(vehicles.len(), 2);
    assert_eq!(vehicles[0].id, VehicleId::from("1"));
    assert_eq!(vehicles[0].availability, Availability::Available);
    assert_eq!(vehicles[1].name, "Toyota Fortuner");
    assert_eq!(vehicles[1].daily_rate, dec!(2500));
    assert_eq!(vehicles[1].availability, Availability::Unavailable);
}

#[tokio::test]
async fn test_get_vehicle_not_found() {
    let (backend, _) = spawn_backend().await;

    let found = backend.get_vehicle(&VehicleId::from("1")).await.unwrap();
    assert_eq!(found.name, "Honda Civic");

    let err = backend.get_vehicle(&VehicleId::from("9")).await.unwrap_err();
    assert_eq!(err, AppError::NotFound("Car not found".to_string()));
}

#[tokio::test]
async fn test_set_availability_sends_status_with_bearer() {
    let (backend, seen) = spawn_backend().await;

    backend
        .set_availability(&token(), &VehicleId::from("1"), Availability::Unavailable)
        .await
        .unwrap();

    assert_eq!(seen.body("status/1"), json!({ "status": "unavailable" }));
}

#[tokio::test]
async fn test_rejected_token_is_unauthorized() {
    let (backend, _) = spawn_backend().await;
    let wrong = Credentials::with_token("stale").bearer().unwrap();

    let err = backend
        .set_availability(&wrong, &VehicleId::from("1"), Availability::Available)
        .await
        .unwrap_err();

    assert_eq!(err, AppError::Unauthorized);
}

// ==================== bookings ====================

#[tokio::test]
async fn test_create_booking_body_and_id() {
    let (backend, seen) = spawn_backend().await;
    let booking = NewBooking {
        vehicle_id: VehicleId::from("1"),
        vehicle_name: "Honda Civic".to_string(),
        contact: "09171234567".to_string(),
        dates: DateRange::new(date(2024, 6, 1), date(2024, 6, 3)),
        total_price: dec!(4500),
    };

    let id = backend.create_booking(&token(), &booking).await.unwrap();

    assert_eq!(id, BookingId::from("77"));
    assert_eq!(
        seen.body("bookings"),
        json!({
            "car_id": 1,
            "car_name": "Honda Civic",
            "contact": "09171234567",
            "start_date": "2024-06-01",
            "end_date": "2024-06-03",
            "total_price": 4500.0
        })
    );
}

#[tokio::test]
async fn test_booking_history_shifts_timestamps() {
    let (backend, _) = spawn_backend().await;

    let bookings = backend.booking_history(&token()).await.unwrap();

    assert_eq!(bookings.len(), 2);
    assert_eq!(bookings[0].start_date, date(2024, 6, 1));
    assert_eq!(bookings[0].end_date, date(2024, 6, 3));
    assert_eq!(bookings[0].base_price, dec!(4500));
    assert_eq!(bookings[0].stored_status, None);
    assert_eq!(bookings[1].stored_status, Some(BookingStatus::Cancelled));
}

#[tokio::test]
async fn test_cancel_returns_backend_message() {
    let (backend, _) = spawn_backend().await;

    let message = backend
        .cancel_booking(&token(), &BookingId::from("77"))
        .await
        .unwrap();

    assert_eq!(message, "Booking 77 cancelled");
}

#[tokio::test]
async fn test_server_error_is_sync_failed() {
    let (backend, _) = spawn_backend().await;

    let err = backend
        .delete_booking(&token(), &BookingId::from("78"))
        .await
        .unwrap_err();

    match err {
        AppError::SyncFailed(message) => assert!(message.contains("database unavailable")),
        other => panic!("expected SyncFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reschedule_body() {
    let (backend, seen) = spawn_backend().await;
    let change = RescheduleChange {
        dates: DateRange::new(date(2024, 6, 10), date(2024, 6, 12)),
        reason: None,
    };

    backend
        .reschedule_booking(&token(), &BookingId::from("77"), &change)
        .await
        .unwrap();

    assert_eq!(
        seen.body("reschedule/77"),
        json!({ "start_date": "2024-06-10", "end_date": "2024-06-12", "reason": "" })
    );
}

// ==================== payments ====================

#[tokio::test]
async fn test_record_payment_accepts_empty_ack() {
    let (backend, seen) = spawn_backend().await;
    let payment = Payment {
        booking_id: BookingId::from("77"),
        vehicle_id: Some(VehicleId::from("1")),
        base_price: dec!(4500),
        discount_type: DiscountType::Student,
        discount_amount: dec!(900),
        final_price: dec!(3600),
        cash_tendered: dec!(4000),
        change_due: dec!(400),
        method: PaymentMethod::Cash,
    };

    backend.record_payment(&token(), &payment).await.unwrap();

    assert_eq!(
        seen.body("payments"),
        json!({
            "booking_id": 77,
            "car_id": 1,
            "total_price": 4500.0,
            "discount_type": "student",
            "discount_amount": 900.0,
            "final_price": 3600.0,
            "cash": 4000.0,
            "change_amount": 400.0,
            "payment_method": "cash"
        })
    );
}

#[tokio::test]
async fn test_wallet_payment_returns_checkout_url() {
    let (backend, seen) = spawn_backend().await;
    let charge = WalletCharge {
        booking_id: BookingId::from("77"),
        amount: dec!(3150),
        description: "Car rental payment for Honda Civic".to_string(),
    };

    let url = backend.create_wallet_payment(&token(), &charge).await.unwrap();

    assert_eq!(url, "https://pay.example.test/session/abc");
    let body = seen.body("wallet");
    assert_eq!(body["bookingId"], json!(77));
    assert_eq!(body["amount"], json!(3150.0));
}
