use actix_identity::Identity;
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use tera::Context;

use crate::errors::AppError;
use crate::mirror;
use crate::models::SessionUser;
use crate::routes::{base_context, current_user, flash, parse_amount, parse_id, redirect, render};
use crate::AppState;

async fn list_context(
    state: &AppState,
    user: &SessionUser,
    error: Option<&str>,
    title_value: &str,
) -> Result<Context, AppError> {
    let events = mirror::visible_events(&state.service.store, user.id).await?;
    let mut context = base_context(user, "My Events");
    context.insert("events", &events);
    context.insert("event_title", title_value);
    if let Some(error) = error {
        context.insert("error", error);
    }
    Ok(context)
}

#[get("/events")]
pub async fn list(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let context = list_context(&state, &user, None, "").await?;
    render("events.html", &context)
}

#[derive(Deserialize)]
pub struct CreateEventForm {
    title: String,
}

#[post("/events")]
pub async fn create(
    web::Form(form): web::Form<CreateEventForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let title = form.title.trim();
    if title.is_empty() {
        let context = list_context(&state, &user, Some("Event title is required"), "").await?;
        return render("events.html", &context);
    }

    match state.service.create_event(&user, title).await {
        Ok(event) => Ok(redirect(&format!("/events/{}", event.id))),
        Err(err) => {
            log::warn!("event creation failed: {}", err);
            let context = list_context(&state, &user, Some(&err.to_string()), title).await?;
            render("events.html", &context)
        }
    }
}

/// Build the detail page context: the mirrored event plus the remote pool,
/// chart and settlement sections. Remote reads are best-effort; a failed
/// section renders its own inline note instead of failing the page.
async fn detail_context(
    state: &AppState,
    user: &SessionUser,
    event_id: i64,
    error: Option<&str>,
    msg: Option<&str>,
) -> Result<Option<Context>, AppError> {
    let Some(event) = mirror::find_event(&state.service.store, event_id).await? else {
        return Ok(None);
    };
    let categories: Vec<_> = mirror::all_categories(&state.service.store)
        .await?
        .into_iter()
        .filter(|c| c.event_id == event_id)
        .collect();

    let mut context = base_context(user, &event.title);
    context.insert("status_label", event.status.label());
    context.insert("categories", &categories);

    match state.service.pool(event_id).await {
        Ok(pool) => context.insert("pool", &serde_json::json!({
            "total": format!("{:.2}", pool.total_pool),
            "contributors": pool.contributors.iter().map(|c| serde_json::json!({
                "user_id": c.user_id,
                "amount": format!("{:.2}", c.amount),
            })).collect::<Vec<_>>(),
        })),
        Err(err) => {
            log::warn!("pool fetch failed for event {}: {}", event_id, err);
            context.insert("pool_error", &err.to_string());
        }
    }

    match state.service.chart(event_id).await {
        Ok(chart) => context.insert("chart", &chart.by_category),
        Err(err) => {
            log::warn!("chart fetch failed for event {}: {}", event_id, err);
            context.insert("chart_error", &err.to_string());
        }
    }

    context.insert("event", &event);
    if let Some(error) = error {
        context.insert("error", error);
    }
    if let Some(text) = flash(msg) {
        context.insert("flash", text);
    }
    Ok(Some(context))
}

#[derive(Deserialize)]
pub struct DetailQuery {
    msg: Option<String>,
}

#[get("/events/{event_id}")]
pub async fn detail(
    path: web::Path<i64>,
    query: web::Query<DetailQuery>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    match detail_context(&state, &user, *path, None, query.msg.as_deref()).await? {
        Some(context) => render("event_detail.html", &context),
        // Unknown ids bounce back to the list, like the original client.
        None => Ok(redirect("/events")),
    }
}

async fn rerender_detail(
    state: &AppState,
    user: &SessionUser,
    event_id: i64,
    error: &str,
) -> Result<HttpResponse, AppError> {
    match detail_context(state, user, event_id, Some(error), None).await? {
        Some(context) => render("event_detail.html", &context),
        None => Ok(redirect("/events")),
    }
}

#[derive(Deserialize)]
pub struct AddParticipantForm {
    user_id: String,
}

#[post("/events/{event_id}/participants")]
pub async fn add_participant(
    path: web::Path<i64>,
    web::Form(form): web::Form<AddParticipantForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let event_id = *path;
    let participant_id = match parse_id(&form.user_id, "user id") {
        Ok(id) => id,
        Err(msg) => return rerender_detail(&state, &user, event_id, &msg).await,
    };

    match state.service.add_participant(event_id, participant_id).await {
        Ok(()) => Ok(redirect(&format!("/events/{}?msg=participant_added", event_id))),
        Err(err) => {
            log::warn!("add participant failed: {}", err);
            rerender_detail(&state, &user, event_id, &err.to_string()).await
        }
    }
}

#[derive(Deserialize)]
pub struct DepositForm {
    amount: String,
}

#[post("/events/{event_id}/deposit")]
pub async fn deposit(
    path: web::Path<i64>,
    web::Form(form): web::Form<DepositForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let event_id = *path;
    let amount = match parse_amount(&form.amount) {
        Ok(amount) => amount,
        Err(msg) => return rerender_detail(&state, &user, event_id, &msg).await,
    };

    match state.service.deposit(&user, event_id, amount).await {
        Ok(_) => Ok(redirect(&format!("/events/{}?msg=deposited", event_id))),
        Err(err) => {
            log::warn!("deposit failed: {}", err);
            rerender_detail(&state, &user, event_id, &err.to_string()).await
        }
    }
}

#[derive(Deserialize)]
pub struct CreateCategoryForm {
    name: String,
}

#[post("/events/{event_id}/categories")]
pub async fn create_category(
    path: web::Path<i64>,
    web::Form(form): web::Form<CreateCategoryForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let event_id = *path;
    let name = form.name.trim();
    if name.is_empty() {
        return rerender_detail(&state, &user, event_id, "Category name is required").await;
    }

    match state.service.create_category(&user, event_id, name).await {
        Ok(_) => Ok(redirect(&format!("/events/{}", event_id))),
        Err(err) => {
            log::warn!("category creation failed: {}", err);
            rerender_detail(&state, &user, event_id, &err.to_string()).await
        }
    }
}

#[derive(Deserialize)]
pub struct VoteForm {
    target_user_id: String,
    approve: String,
}

#[post("/events/{event_id}/votes")]
pub async fn vote(
    path: web::Path<i64>,
    web::Form(form): web::Form<VoteForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let event_id = *path;
    let target = match parse_id(&form.target_user_id, "user id") {
        Ok(id) => id,
        Err(msg) => return rerender_detail(&state, &user, event_id, &msg).await,
    };
    let approve = form.approve == "approve";

    match state.service.record_vote(event_id, target, user.id, approve).await {
        Ok(_) => Ok(redirect(&format!("/events/{}?msg=voted", event_id))),
        Err(err) => {
            log::warn!("vote failed: {}", err);
            rerender_detail(&state, &user, event_id, &err.to_string()).await
        }
    }
}
