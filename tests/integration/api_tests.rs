//! API integration tests against a running server and database

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};

use biblioteca_server::models::user::{Role, UserClaims};

const BASE_URL: &str = "http://localhost:8080/api";

fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".to_string())
}

/// Tokens are minted with the server's secret; there is no login endpoint
fn mint_token(user_id: i32, role: Role) -> String {
    UserClaims::new(user_id, "tests@tectijuana.edu.mx", role, Duration::hours(1))
        .create_token(&jwt_secret())
        .expect("Failed to mint token")
}

fn unique_suffix() -> String {
    Utc::now().timestamp_nanos_opt().unwrap_or_default().to_string()
}

/// Register a fresh user and return its id
async fn register_user(client: &Client) -> i32 {
    let response = client
        .post(format!("{}/users/register", BASE_URL))
        .json(&json!({
            "name": "Alumno de Prueba",
            "email": format!("alumno{}@tectijuana.edu.mx", unique_suffix()),
            "password": "secreto123",
            "matricula": "20210001",
            "carrera": "Sistemas"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.get("password").is_none());
    body["id"].as_i64().expect("No id in response") as i32
}

/// Create a book as admin and return its id
async fn create_book(client: &Client, unit: i32) -> i32 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(mint_token(1, Role::Admin))
        .json(&json!({
            "catalogCode": format!("QA76.{}", unique_suffix()),
            "title": "Programming Rust",
            "author": "Blandy",
            "classification": "QA76.73",
            "unit": unit
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["available"], true);
    body["id"].as_i64().expect("No id in response") as i32
}

async fn create_loan(client: &Client, token: &str, book_id: i32, user_id: i32, due: &str) -> reqwest::Response {
    client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "bookId": book_id, "userId": user_id, "fechaDevolucion": due }))
        .send()
        .await
        .expect("Failed to send request")
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
async fn test_register_duplicate_email() {
    let client = Client::new();
    let email = format!("dup{}@tectijuana.edu.mx", unique_suffix());
    let payload = json!({ "name": "Dup", "email": email, "password": "secreto123" });

    let first = client
        .post(format!("{}/users/register", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), 201);

    let second = client
        .post(format!("{}/users/register", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_loan_makes_book_unavailable() {
    let client = Client::new();
    let user_id = register_user(&client).await;
    let token = mint_token(user_id, Role::User);
    let book_id = create_book(&client, 3).await;

    let due = (Utc::now() + Duration::days(7)).format("%Y-%m-%d").to_string();
    let response = create_loan(&client, &token, book_id, user_id, &due).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(loan["status"], "ACTIVO");

    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(book["available"], false);

    // Second loan of the same book
    let response = create_loan(&client, &token, book_id, user_id, &due).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], 5);
}

#[tokio::test]
#[ignore]
async fn test_overdue_fine_and_return() {
    let client = Client::new();
    let user_id = register_user(&client).await;
    let token = mint_token(user_id, Role::User);
    let admin = mint_token(1, Role::Admin);
    let book_id = create_book(&client, 1).await;

    let due = (Utc::now() - Duration::days(3) - Duration::hours(1)).to_rfc3339();
    let response = create_loan(&client, &token, book_id, user_id, &due).await;
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse response");
    let loan_id = loan["id"].as_i64().expect("No id in response");

    let fine: Value = client
        .post(format!("{}/loans/calculate-fine", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "loanId": loan_id }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(fine["daysLate"], 3);
    assert_eq!(fine["fine"].as_f64(), Some(30.0));
    assert_eq!(fine["status"], "VENCIDO");

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "DEVUELTO");

    // Recomputing after the return keeps the frozen fine
    let fine: Value = client
        .post(format!("{}/loans/calculate-fine", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "loanId": loan_id }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(fine["status"], "DEVUELTO");
    assert_eq!(fine["fine"], returned["fine"]);

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_exit_recorded_once() {
    let client = Client::new();
    let user_id = register_user(&client).await;
    let token = mint_token(user_id, Role::User);

    let response = client
        .post(format!("{}/entries", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "purpose": "Estudio" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let entry: Value = response.json().await.expect("Failed to parse response");
    assert!(entry["exitTime"].is_null());
    let entry_id = entry["id"].as_i64().expect("No id in response");

    let first = client
        .patch(format!("{}/entries/{}/exit", BASE_URL, entry_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(first.status().is_success());

    let second = client
        .patch(format!("{}/entries/{}/exit", BASE_URL, entry_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_unit_filter_is_exact() {
    let client = Client::new();
    create_book(&client, 12).await;

    let books: Value = client
        .get(format!("{}/books?unit=1", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let books = books.as_array().expect("Expected an array");
    assert!(books.iter().all(|b| b["unit"] == 1));
}
