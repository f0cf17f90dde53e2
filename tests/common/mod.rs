//! Stub Cooper backend for integration tests: the canonical wire contract,
//! served from an ephemeral local port.

use std::collections::HashMap;

use actix_web::{web, App, HttpResponse, HttpServer};
use serde_json::json;

type Params = web::Query<HashMap<String, String>>;

async fn register(_q: Params) -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "registered"}))
}

async fn login(q: Params) -> HttpResponse {
    if q.get("email").map(String::as_str) == Some("asha@example.com")
        && q.get("password").map(String::as_str) == Some("hunter22")
    {
        HttpResponse::Ok().json(json!({"user_id": 1}))
    } else {
        // The deployed backend answers rejections with a 200 error body.
        HttpResponse::Ok().json(json!({"error": "invalid credentials"}))
    }
}

async fn create_event(q: Params) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "id": 101,
        "title": q.get("title").cloned().unwrap_or_default(),
        "organizer_id": q.get("organizer_id").and_then(|v| v.parse::<i64>().ok()).unwrap_or(0),
    }))
}

async fn add_participant(_path: web::Path<i64>, _q: Params) -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "added"}))
}

async fn deposit(_q: Params) -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "deposited"}))
}

async fn get_pool(path: web::Path<i64>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "event_id": *path,
        "total_pool": 50.0,
        "contributors": [{"user_id": 1, "amount": 50.0}],
    }))
}

async fn create_category(_q: Params) -> HttpResponse {
    HttpResponse::Ok().json(json!({"category_id": 7}))
}

async fn join_category(_path: web::Path<i64>, q: Params) -> HttpResponse {
    if q.get("user_id").map(String::as_str) == Some("99") {
        HttpResponse::Ok().json(json!({"error": "50% approval required"}))
    } else {
        HttpResponse::Ok().json(json!({"status": "joined"}))
    }
}

async fn vote(_q: Params) -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "vote recorded"}))
}

async fn create_expense(q: Params) -> HttpResponse {
    // Charge rejection path for oversized amounts, to exercise non-2xx
    // handling in the client.
    if q.get("amount").and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0) > 10_000.0 {
        return HttpResponse::UnprocessableEntity().body("amount too large");
    }
    HttpResponse::Ok().json(json!({
        "intent_id": "pi_test",
        "payment_url": "https://pay.example/pi_test",
        "status": "requires_payment",
    }))
}

async fn payment_status(path: web::Path<String>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "intent_id": *path,
        "status": "completed",
        "settlement_status": "settled",
    }))
}

async fn settlement(path: web::Path<i64>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "event_id": *path,
        "settlement": [
            {"user_id": 1, "net_balance": 25.5},
            {"user_id": 2, "net_balance": -25.5},
        ],
    }))
}

async fn chart(path: web::Path<i64>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "event_id": *path,
        "by_category": [{"category": "Food", "amount": 20.0}],
    }))
}

async fn user_events(path: web::Path<i64>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "user_id": *path,
        "events": [{"event_id": 101, "title": "Goa Trip"}],
    }))
}

/// Bind the stub backend to an ephemeral port and return its base URL.
pub async fn spawn_backend() -> String {
    let server = HttpServer::new(|| {
        App::new()
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/events", web::post().to(create_event))
            .route("/events/{event_id}/participants", web::post().to(add_participant))
            .route("/pool/deposit", web::post().to(deposit))
            .route("/pool/{event_id}", web::get().to(get_pool))
            .route("/categories", web::post().to(create_category))
            .route("/categories/{category_id}/join", web::post().to(join_category))
            .route("/votes", web::post().to(vote))
            .route("/expenses", web::post().to(create_expense))
            .route("/payments/{intent_id}/status", web::get().to(payment_status))
            .route("/settlement/{event_id}", web::get().to(settlement))
            .route("/expenses/{event_id}/chart", web::get().to(chart))
            .route("/users/{user_id}/events", web::get().to(user_events))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind stub backend");

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}", addr)
}
