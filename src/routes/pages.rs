use actix_identity::Identity;
use actix_web::{get, web, HttpResponse};

use crate::errors::AppError;
use crate::mirror;
use crate::routes::{base_context, current_user, redirect, render};
use crate::AppState;

/// Root navigation guard: authenticated sessions land on the dashboard,
/// everyone else on the login page.
#[get("/")]
pub async fn index(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    match current_user(&state, identity).await? {
        Some(_) => Ok(redirect("/dashboard")),
        None => Ok(redirect("/login")),
    }
}

#[get("/dashboard")]
pub async fn dashboard(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let store = &state.service.store;

    let events = mirror::visible_events(store, user.id).await?;
    let categories = mirror::all_categories(store).await?;
    let bills = mirror::all_bills(store).await?;
    let total_pooled: f64 = events.iter().map(|e| e.pooled_amount).sum();

    let mut context = base_context(&user, "Dashboard");
    context.insert("event_count", &events.len());
    context.insert("category_count", &categories.len());
    context.insert("bill_count", &bills.len());
    context.insert("total_pooled", &format!("{:.2}", total_pooled));
    context.insert("events", &events);
    render("dashboard.html", &context)
}
