use actix_identity::Identity;
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use tera::Context;

use crate::errors::AppError;
use crate::mirror;
use crate::models::SessionUser;
use crate::routes::{base_context, current_user, flash, parse_amount, parse_id, redirect, render};
use crate::AppState;

async fn page_context(
    state: &AppState,
    user: &SessionUser,
    manual: bool,
    error: Option<&str>,
    msg: Option<&str>,
) -> Result<Context, AppError> {
    let store = &state.service.store;
    let events = mirror::visible_events(store, user.id).await?;
    let categories = mirror::all_categories(store).await?;
    let bills = mirror::all_bills(store).await?;

    let listed: Vec<_> = bills
        .iter()
        .map(|b| {
            let category_name = categories
                .iter()
                .find(|c| c.id == b.category_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Unknown".to_owned());
            serde_json::json!({
                "vendor": b.vendor,
                "amount": format!("{:.2}", b.amount),
                "category": category_name,
                "date": b.date,
                "status": b.status,
                "payment_url": b.payment_url,
            })
        })
        .collect();

    let mut context = base_context(user, "Bills");
    context.insert("events", &events);
    context.insert("categories", &categories);
    context.insert("bills", &listed);
    context.insert("manual", &manual);
    if let Some(error) = error {
        context.insert("error", error);
    }
    if let Some(text) = flash(msg) {
        context.insert("flash", text);
    }
    Ok(context)
}

#[derive(Deserialize)]
pub struct BillsQuery {
    #[serde(default)]
    manual: Option<String>,
    msg: Option<String>,
}

#[get("/bills")]
pub async fn list(
    query: web::Query<BillsQuery>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let manual = query.manual.is_some();
    let context = page_context(&state, &user, manual, None, query.msg.as_deref()).await?;
    render("bills.html", &context)
}

/// There is no OCR pipeline; "scanning" reveals the manual entry form.
#[post("/bills/scan")]
pub async fn scan(identity: Option<Identity>) -> Result<HttpResponse, AppError> {
    if identity.is_none() {
        return Ok(redirect("/login"));
    }
    Ok(redirect("/bills?manual=1&msg=scanned"))
}

async fn rerender(
    state: &AppState,
    user: &SessionUser,
    msg: String,
) -> Result<HttpResponse, AppError> {
    let context = page_context(state, user, true, Some(&msg), None).await?;
    render("bills.html", &context)
}

#[derive(Deserialize)]
pub struct ManualBillForm {
    event_id: String,
    category_id: String,
    amount: String,
    #[serde(default)]
    vendor: String,
}

#[post("/bills")]
pub async fn submit(
    web::Form(form): web::Form<ManualBillForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };

    let event_id = match parse_id(&form.event_id, "event") {
        Ok(id) => id,
        Err(msg) => return rerender(&state, &user, msg).await,
    };
    let category_id = match parse_id(&form.category_id, "category") {
        Ok(id) => id,
        Err(msg) => return rerender(&state, &user, msg).await,
    };
    let amount = match parse_amount(&form.amount) {
        Ok(amount) => amount,
        Err(msg) => return rerender(&state, &user, msg).await,
    };

    // The category must exist and belong to the selected event before the
    // remote call mints a payment intent.
    let Some(category) = mirror::find_category(&state.service.store, category_id).await? else {
        return rerender(&state, &user, "No such category".to_owned()).await;
    };
    if category.event_id != event_id {
        return rerender(
            &state,
            &user,
            "That category belongs to a different event".to_owned(),
        )
        .await;
    }

    match state
        .service
        .add_expense(event_id, category_id, amount, &form.vendor)
        .await
    {
        Ok(_) => Ok(redirect("/bills?msg=expense_added")),
        Err(err) => {
            log::warn!("bill submission failed: {}", err);
            rerender(&state, &user, err.to_string()).await
        }
    }
}
