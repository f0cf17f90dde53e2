use actix_identity::Identity;
use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use crate::errors::AppError;
use crate::mirror;
use crate::routes::{base_context, current_user, redirect, render};
use crate::settlement;
use crate::AppState;

#[derive(Deserialize)]
pub struct SettlementQuery {
    event_id: Option<String>,
}

/// Without a selected event the page shows a "no settlement calculated"
/// placeholder; with one it fetches the remote balances and renders each row
/// with its sign-based label. No balance math happens here.
#[get("/settlement")]
pub async fn page(
    query: web::Query<SettlementQuery>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let events = mirror::visible_events(&state.service.store, user.id).await?;

    let mut context = base_context(&user, "Settlement & Refunds");
    context.insert("events", &events);
    context.insert("calculated", &false);

    let selected = match query.event_id.as_deref() {
        Some(raw) if !raw.is_empty() => match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                context.insert("error", "Please select an event");
                None
            }
        },
        Some(_) => {
            context.insert("error", "Please select an event");
            None
        }
        None => None,
    };

    if let Some(event_id) = selected {
        context.insert("selected_event", &event_id);
        match state.service.settlement(event_id).await {
            Ok(result) => {
                let event = events.iter().find(|e| e.id == event_id);
                let rows = settlement::rows(&result, event);
                context.insert("calculated", &true);
                context.insert("rows", &rows);
            }
            Err(err) => {
                log::warn!("settlement fetch failed for event {}: {}", event_id, err);
                context.insert("error", &err.to_string());
            }
        }
    }

    render("settlement.html", &context)
}
