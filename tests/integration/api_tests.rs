//! API integration tests
//!
//! Run against a live server seeded with the default admin account:
//! `cargo test -- --ignored`

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Value unique across test runs, used to build plate numbers, phones...
fn unique() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos() as u64;
    nanos / 1000 + COUNTER.fetch_add(1, Ordering::SeqCst)
}

fn plate_number(n: u64) -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut n = n;
    let mut tail = String::new();
    for _ in 0..5 {
        tail.push(ALPHABET[(n % 36) as usize] as char);
        n /= 36;
    }
    format!("京A{}", tail)
}

/// Helper to get an admin token
async fn get_auth_token(client: &Client) -> String {
    login(client, "admin", "admin").await
}

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn create_vehicle(client: &Client, admin: &str, price_per_day: f64) -> i64 {
    let response = client
        .post(format!("{}/vehicles", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "type": "SUV",
            "brand": "Toyota",
            "model": "RAV4",
            "color": "white",
            "price_per_day": price_per_day,
            "plate_number": plate_number(unique()),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No vehicle id")
}

/// Register a customer account and log it in. Returns (token, customer id).
async fn register_customer(client: &Client) -> (String, i64) {
    let n = unique();
    let username = format!("driver{}", n);
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "username": username,
            "password": "secret123",
            "name": "Test Driver",
            "phone": format!("1{:010}", n % 10_000_000_000),
            "address": "1 Test Road",
            "id_card": format!("{:017}X", n % 100_000_000_000_000_000),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let customer_id = body["customer"]["id"].as_i64().expect("No customer id");

    (login(client, &username, "secret123").await, customer_id)
}

async fn recharge(client: &Client, token: &str, customer_id: i64, amount: f64) -> Value {
    client
        .post(format!("{}/money/{}", BASE_URL, customer_id))
        .bearer_auth(token)
        .json(&json!({ "amount": amount }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
}

async fn balance(client: &Client, token: &str, customer_id: i64) -> f64 {
    let body: Value = client
        .get(format!("{}/money/{}", BASE_URL, customer_id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    body["balance"].as_f64().expect("No balance")
}

async fn rent(client: &Client, token: &str, vehicle_id: i64, customer_id: i64, days: i64) -> reqwest::Response {
    client
        .post(format!("{}/rentals", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "vehicle_id": vehicle_id,
            "customer_id": customer_id,
            "duration_days": days,
        }))
        .send()
        .await
        .expect("Failed to send request")
}

async fn availability(client: &Client, token: &str, vehicle_id: i64) -> String {
    let body: Value = client
        .get(format!("{}/vehicles/{}", BASE_URL, vehicle_id))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    body["availability"].as_str().expect("No availability").to_string()
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .expect("timestamp string")
        .parse()
        .expect("RFC 3339 timestamp")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["code"].is_u64());
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/rentals", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_customer_cannot_list_all_rentals() {
    let client = Client::new();
    let (token, _) = register_customer(&client).await;

    let response = client
        .get(format!("{}/rentals", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_rental_lifecycle() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let vehicle_id = create_vehicle(&client, &admin, 100.0).await;
    let (token, customer_id) = register_customer(&client).await;
    recharge(&client, &token, customer_id, 1000.0).await;

    assert_eq!(availability(&client, &token, vehicle_id).await, "available");

    let response = rent(&client, &token, vehicle_id, customer_id, 5).await;
    assert_eq!(response.status(), 201);
    let rental: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(rental["status"], "ongoing");
    assert_eq!(rental["total_fee"].as_f64(), Some(500.0));
    assert!(rental["actual_return_time"].is_null());
    assert_eq!(
        timestamp(&rental["expected_return_time"]) - timestamp(&rental["start_time"]),
        Duration::days(5)
    );
    assert_eq!(balance(&client, &token, customer_id).await, 500.0);
    assert_eq!(availability(&client, &token, vehicle_id).await, "busy");

    // the vehicle is held: nobody else can rent it
    let (other_token, other_id) = register_customer(&client).await;
    recharge(&client, &other_token, other_id, 1000.0).await;
    let response = rent(&client, &other_token, vehicle_id, other_id, 1).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Vehicle is currently rented out");

    let rental_id = rental["id"].as_i64().expect("No rental id");
    let response = client
        .patch(format!("{}/rentals/{}", BASE_URL, rental_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
    assert_eq!(availability(&client, &token, vehicle_id).await, "available");

    let returned: Value = client
        .get(format!("{}/rentals/{}", BASE_URL, rental_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(returned["status"], "completed");
    assert!(returned["actual_return_time"].is_string());

    // returning twice is refused and the return time stays put
    let response = client
        .patch(format!("{}/rentals/{}", BASE_URL, rental_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_rental_rejects_zero_duration() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let vehicle_id = create_vehicle(&client, &admin, 100.0).await;
    let (token, customer_id) = register_customer(&client).await;
    recharge(&client, &token, customer_id, 1000.0).await;

    let response = rent(&client, &token, vehicle_id, customer_id, 0).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Duration days must be positive");
}

#[tokio::test]
#[ignore]
async fn test_rental_missing_duration_is_json_error() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let vehicle_id = create_vehicle(&client, &admin, 100.0).await;
    let (token, customer_id) = register_customer(&client).await;

    let response = client
        .post(format!("{}/rentals", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "vehicle_id": vehicle_id, "customer_id": customer_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["error"]
        .as_str()
        .expect("No error message")
        .contains("duration_days"));
}

#[tokio::test]
#[ignore]
async fn test_rental_duration_upper_bound() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let vehicle_id = create_vehicle(&client, &admin, 100.0).await;
    let (token, customer_id) = register_customer(&client).await;
    recharge(&client, &token, customer_id, 1000.0).await;

    let response = rent(&client, &token, vehicle_id, customer_id, 100_000_000).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Duration days cannot exceed 365");
}

#[tokio::test]
#[ignore]
async fn test_rental_requires_funds() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let vehicle_id = create_vehicle(&client, &admin, 100.0).await;
    let (token, customer_id) = register_customer(&client).await;
    recharge(&client, &token, customer_id, 99.0).await;

    let response = rent(&client, &token, vehicle_id, customer_id, 1).await;
    assert_eq!(response.status(), 400);

    assert_eq!(balance(&client, &token, customer_id).await, 99.0);
    assert_eq!(availability(&client, &token, vehicle_id).await, "available");
}

#[tokio::test]
#[ignore]
async fn test_cancel_refunds_fee() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let vehicle_id = create_vehicle(&client, &admin, 80.0).await;
    let (token, customer_id) = register_customer(&client).await;
    recharge(&client, &token, customer_id, 300.0).await;

    let rental: Value = rent(&client, &token, vehicle_id, customer_id, 3)
        .await
        .json()
        .await
        .expect("Failed to parse response");
    let rental_id = rental["id"].as_i64().expect("No rental id");
    assert_eq!(balance(&client, &token, customer_id).await, 60.0);

    let response = client
        .delete(format!("{}/rentals/{}", BASE_URL, rental_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let cancelled: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(cancelled["status"], "cancelled");

    assert_eq!(balance(&client, &token, customer_id).await, 300.0);
    assert_eq!(availability(&client, &token, vehicle_id).await, "available");

    let response = client
        .delete(format!("{}/rentals/{}", BASE_URL, rental_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_duration_update_reprices_until_terminal() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let vehicle_id = create_vehicle(&client, &admin, 100.0).await;
    let (token, customer_id) = register_customer(&client).await;
    recharge(&client, &token, customer_id, 1000.0).await;

    let rental: Value = rent(&client, &token, vehicle_id, customer_id, 2)
        .await
        .json()
        .await
        .expect("Failed to parse response");
    let rental_id = rental["id"].as_i64().expect("No rental id");

    let updated: Value = client
        .put(format!("{}/rentals/{}", BASE_URL, rental_id))
        .bearer_auth(&token)
        .json(&json!({ "duration_days": 4 }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(updated["duration_days"], 4);
    assert_eq!(updated["total_fee"].as_f64(), Some(400.0));
    assert_eq!(updated["start_time"], rental["start_time"]);
    assert_eq!(
        timestamp(&updated["expected_return_time"]) - timestamp(&updated["start_time"]),
        Duration::days(4)
    );
    assert_eq!(balance(&client, &token, customer_id).await, 600.0);

    // complete and extend in one request: status wins, duration is ignored
    let completed: Value = client
        .put(format!("{}/rentals/{}", BASE_URL, rental_id))
        .bearer_auth(&token)
        .json(&json!({ "status": "completed", "duration_days": 10 }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["duration_days"], 4);
    assert_eq!(completed["total_fee"].as_f64(), Some(400.0));

    let response = client
        .put(format!("{}/rentals/{}", BASE_URL, rental_id))
        .bearer_auth(&token)
        .json(&json!({ "status": "ongoing" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_invalid_status_is_rejected() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let vehicle_id = create_vehicle(&client, &admin, 50.0).await;
    let (token, customer_id) = register_customer(&client).await;
    recharge(&client, &token, customer_id, 100.0).await;

    let rental: Value = rent(&client, &token, vehicle_id, customer_id, 1)
        .await
        .json()
        .await
        .expect("Failed to parse response");

    let response = client
        .put(format!("{}/rentals/{}", BASE_URL, rental["id"]))
        .bearer_auth(&token)
        .json(&json!({ "status": "returned" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_customer_history() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let (token, customer_id) = register_customer(&client).await;
    recharge(&client, &token, customer_id, 1000.0).await;

    let first = create_vehicle(&client, &admin, 100.0).await;
    let second = create_vehicle(&client, &admin, 120.0).await;

    let rental: Value = rent(&client, &token, first, customer_id, 1)
        .await
        .json()
        .await
        .expect("Failed to parse response");
    client
        .patch(format!("{}/rentals/{}", BASE_URL, rental["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(rent(&client, &token, second, customer_id, 1).await.status(), 201);

    let history: Value = client
        .get(format!("{}/rentals/customer/{}", BASE_URL, customer_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let history = history.as_array().expect("history array");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["vehicle_id"].as_i64(), Some(second));
    assert_eq!(history[0]["price_per_day"].as_f64(), Some(120.0));
    assert!(history[0]["plate_number"].is_string());
    assert_eq!(history[1]["status"], "completed");

    let response = client
        .get(format!("{}/rentals/customer/{}", BASE_URL, i32::MAX))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_recharge_must_be_positive() {
    let client = Client::new();
    let (token, customer_id) = register_customer(&client).await;

    let response = client
        .post(format!("{}/money/{}", BASE_URL, customer_id))
        .bearer_auth(&token)
        .json(&json!({ "amount": -5.0 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let body = recharge(&client, &token, customer_id, 25.5).await;
    assert_eq!(body["balance"].as_f64(), Some(25.5));
}

#[tokio::test]
#[ignore]
async fn test_vehicle_with_rentals_cannot_be_deleted() {
    let client = Client::new();
    let admin = get_auth_token(&client).await;
    let vehicle_id = create_vehicle(&client, &admin, 100.0).await;
    let (token, customer_id) = register_customer(&client).await;
    recharge(&client, &token, customer_id, 100.0).await;
    assert_eq!(rent(&client, &token, vehicle_id, customer_id, 1).await.status(), 201);

    let response = client
        .delete(format!("{}/vehicles/{}", BASE_URL, vehicle_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let unused = create_vehicle(&client, &admin, 100.0).await;
    let response = client
        .delete(format!("{}/vehicles/{}", BASE_URL, unused))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}
