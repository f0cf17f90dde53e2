//! Page handlers. Every form follows the same shape: validate synchronously,
//! call the shared service, and either redirect (success) or re-render the
//! page with an inline error and the submitted values.

use actix_identity::Identity;
use actix_web::HttpResponse;
use tera::Context;

use crate::auth;
use crate::errors::AppError;
use crate::models::SessionUser;
use crate::{AppState, TEMPLATES};

pub mod account;
pub mod bills;
pub mod categories;
pub mod debug;
pub mod events;
pub mod pages;
pub mod settlement;
pub mod wallet;

/// Register every page and form handler. Shared between the server binary
/// and the HTTP-level tests.
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(pages::index)
        .service(pages::dashboard)
        .service(account::login_page)
        .service(account::login_form)
        .service(account::register_page)
        .service(account::register_form)
        .service(account::logout)
        .service(events::list)
        .service(events::create)
        .service(events::detail)
        .service(events::add_participant)
        .service(events::deposit)
        .service(events::create_category)
        .service(events::vote)
        .service(categories::list)
        .service(categories::create)
        .service(categories::join)
        .service(categories::add_expense)
        .service(bills::list)
        .service(bills::scan)
        .service(bills::submit)
        .service(wallet::page)
        .service(wallet::deposit)
        .service(settlement::page)
        .service(debug::page)
        .service(debug::clear);
}

pub(crate) fn render(template: &str, context: &Context) -> Result<HttpResponse, AppError> {
    let rendered = TEMPLATES.render(template, context).map_err(|e| {
        log::error!("Failed to render template {}: {}", template, e);
        AppError::Template(e)
    })?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header(("Location", location.to_owned()))
        .finish()
}

/// Resolve the cookie identity to a registry user. `None` means the request
/// should bounce to `/login`.
pub(crate) async fn current_user(
    state: &AppState,
    identity: Option<Identity>,
) -> Result<Option<SessionUser>, AppError> {
    let id = match identity {
        Some(identity) => identity.id()?,
        None => return Ok(None),
    };
    let user_id: i64 = match id.parse() {
        Ok(user_id) => user_id,
        Err(_) => return Ok(None),
    };
    auth::user_by_id(&state.service.store, user_id).await
}

pub(crate) fn base_context(user: &SessionUser, title: &str) -> Context {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("user", user);
    context.insert("version", env!("CARGO_PKG_VERSION"));
    context
}

/// Success notes carried across the redirect as short query tokens.
pub(crate) fn flash(token: Option<&str>) -> Option<&'static str> {
    match token? {
        "deposited" => Some("Deposit successful!"),
        "joined" => Some("Joined category successfully!"),
        "voted" => Some("Vote recorded."),
        "scanned" => Some("Bill scanned! Enter the details manually below."),
        "expense_added" => Some("Expense added successfully!"),
        "participant_added" => Some("Participant added."),
        "cleared" => Some("All local data cleared!"),
        _ => None,
    }
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("Please select a valid {}", what))
}

pub(crate) fn parse_amount(raw: &str) -> Result<f64, String> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| "Amount must be a number".to_owned())?;
    if amount <= 0.0 {
        return Err("Amount must be greater than zero".to_owned());
    }
    Ok(amount)
}
