use actix_identity::Identity;
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;

use crate::errors::AppError;
use crate::mirror;
use crate::routes::{base_context, current_user, flash, redirect, render};
use crate::AppState;

#[derive(Deserialize)]
pub struct DebugQuery {
    msg: Option<String>,
}

/// Raw dumps of the mirrored arrays, plus the per-category lockstep check
/// (total vs. line count) that makes drift visible at a glance.
#[get("/debug")]
pub async fn page(
    query: web::Query<DebugQuery>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let store = &state.service.store;

    let events = mirror::visible_events(store, user.id).await?;
    let all_events: Vec<crate::models::Event> = store.load(crate::store::keys::EVENTS).await?;
    let categories = mirror::all_categories(store).await?;
    let bills = mirror::all_bills(store).await?;

    let checks: Vec<_> = categories
        .iter()
        .map(|c| {
            serde_json::json!({
                "name": c.name,
                "total_spent": format!("{:.2}", c.total_spent),
                "expense_count": c.expenses.len(),
            })
        })
        .collect();

    let mut context = base_context(&user, "Debug Data");
    context.insert("event_count", &all_events.len());
    context.insert("visible_event_count", &events.len());
    context.insert("category_count", &categories.len());
    context.insert("bill_count", &bills.len());
    context.insert("events_json", &serde_json::to_string_pretty(&all_events)?);
    context.insert("categories_json", &serde_json::to_string_pretty(&categories)?);
    context.insert("bills_json", &serde_json::to_string_pretty(&bills)?);
    context.insert("checks", &checks);
    if let Some(text) = flash(query.msg.as_deref()) {
        context.insert("flash", text);
    }
    render("debug.html", &context)
}

/// Purge the entire local mirror. The user registry survives.
#[post("/debug/clear")]
pub async fn clear(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    if current_user(&state, identity).await?.is_none() {
        return Ok(redirect("/login"));
    }
    state.service.clear_local_data().await?;
    Ok(redirect("/debug?msg=cleared"))
}
