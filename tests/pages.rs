//! HTTP-level tests for the session guard and form validation paths.

mod common;

use actix_identity::IdentityMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Cookie, Key};
use actix_web::http::StatusCode;
use actix_web::{test, web::Data, App};

use cooper::api::CooperApi;
use cooper::models::Bill;
use cooper::routes;
use cooper::service::CooperService;
use cooper::store::{keys, Store};
use cooper::AppState;

macro_rules! test_app {
    () => {{
        let store = Store::in_memory().await.unwrap();
        let state = AppState {
            // Nothing in these tests reaches the backend.
            service: CooperService::new(store, CooperApi::new("http://127.0.0.1:9")),
        };
        test::init_service(
            App::new()
                .wrap(IdentityMiddleware::default())
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .configure(routes::configure)
                .app_data(Data::new(state)),
        )
        .await
    }};
}

fn location(resp: &actix_web::dev::ServiceResponse) -> &str {
    resp.headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[actix_web::test]
async fn anonymous_root_redirects_to_login() {
    let app = test_app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
}

#[actix_web::test]
async fn anonymous_dashboard_redirects_to_login() {
    let app = test_app!();
    for uri in ["/dashboard", "/events", "/wallet", "/settlement", "/debug"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&resp), "/login");
    }
}

#[actix_web::test]
async fn login_page_renders() {
    let app = test_app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/login").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Log in"));
}

#[actix_web::test]
async fn invalid_register_rerenders_with_the_error() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/register")
        .set_form([("name", "Asha"), ("email", "not-an-email"), ("password", "hunter22")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("Invalid email address"));
    // The form stays populated for correction.
    assert!(body.contains("not-an-email"));
}

#[actix_web::test]
async fn register_establishes_a_session_and_root_goes_to_dashboard() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/register")
        .set_form([
            ("name", "Asha"),
            ("email", "asha@example.com"),
            ("password", "hunter22"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    let cookies: Vec<Cookie<'static>> = resp.response().cookies().map(|c| c.into_owned()).collect();
    assert!(!cookies.is_empty());

    let mut req = test::TestRequest::get().uri("/");
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    let mut req = test::TestRequest::get().uri("/dashboard");
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("Welcome back, Asha"));
}

#[actix_web::test]
async fn settlement_page_shows_a_placeholder_before_any_fetch() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/register")
        .set_form([
            ("name", "Asha"),
            ("email", "asha@example.com"),
            ("password", "hunter22"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookies: Vec<Cookie<'static>> = resp.response().cookies().map(|c| c.into_owned()).collect();

    let mut req = test::TestRequest::get().uri("/settlement");
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("No settlement calculated yet"));
    // No balance table until an event is selected and fetched.
    assert!(!body.contains("<td"));
}

#[actix_web::test]
async fn manual_bill_for_an_unknown_category_records_nothing() {
    let store = Store::in_memory().await.unwrap();
    let state = AppState {
        service: CooperService::new(store.clone(), CooperApi::new(common::spawn_backend().await)),
    };
    let app = test::init_service(
        App::new()
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                    .cookie_secure(false)
                    .build(),
            )
            .configure(routes::configure)
            .app_data(Data::new(state)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/register")
        .set_form([
            ("name", "Asha"),
            ("email", "asha@example.com"),
            ("password", "hunter22"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookies: Vec<Cookie<'static>> = resp.response().cookies().map(|c| c.into_owned()).collect();

    let mut req = test::TestRequest::post().uri("/bills").set_form([
        ("event_id", "1"),
        ("category_id", "42"),
        ("amount", "20"),
        ("vendor", "Deli"),
    ]);
    for cookie in &cookies {
        req = req.cookie(cookie.clone());
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("No such category"));

    // No payment intent was minted, so no bill may linger locally either.
    let bills: Vec<Bill> = store.load(keys::BILLS).await.unwrap();
    assert!(bills.is_empty());
}

#[actix_web::test]
async fn failed_login_rerenders_inline() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("email", "ghost@example.com"), ("password", "nope")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8_lossy(&test::read_body(resp).await).to_string();
    assert!(body.contains("Invalid email or password"));
}
