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
    error: Option<&str>,
    msg: Option<&str>,
) -> Result<Context, AppError> {
    let events = mirror::visible_events(&state.service.store, user.id).await?;
    let total: f64 = events.iter().map(|e| e.pooled_amount).sum();

    let mut context = base_context(user, "Shared Wallet");
    context.insert("events", &events);
    context.insert("event_count", &events.len());
    context.insert("total_pooled", &format!("{:.2}", total));
    if let Some(error) = error {
        context.insert("error", error);
    }
    if let Some(text) = flash(msg) {
        context.insert("flash", text);
    }
    Ok(context)
}

#[derive(Deserialize)]
pub struct WalletQuery {
    msg: Option<String>,
}

#[get("/wallet")]
pub async fn page(
    query: web::Query<WalletQuery>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let context = page_context(&state, &user, None, query.msg.as_deref()).await?;
    render("wallet.html", &context)
}

#[derive(Deserialize)]
pub struct DepositForm {
    event_id: String,
    amount: String,
}

#[post("/wallet/deposit")]
pub async fn deposit(
    web::Form(form): web::Form<DepositForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };

    let event_id = match parse_id(&form.event_id, "event") {
        Ok(id) => id,
        Err(msg) => {
            let context = page_context(&state, &user, Some(&msg), None).await?;
            return render("wallet.html", &context);
        }
    };
    let amount = match parse_amount(&form.amount) {
        Ok(amount) => amount,
        Err(msg) => {
            let context = page_context(&state, &user, Some(&msg), None).await?;
            return render("wallet.html", &context);
        }
    };

    match state.service.deposit(&user, event_id, amount).await {
        Ok(_) => Ok(redirect("/wallet?msg=deposited")),
        Err(err) => {
            log::warn!("wallet deposit failed: {}", err);
            let context = page_context(&state, &user, Some(&err.to_string()), None).await?;
            render("wallet.html", &context)
        }
    }
}
