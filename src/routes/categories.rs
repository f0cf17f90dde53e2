use actix_identity::Identity;
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use tera::Context;

use crate::errors::AppError;
use crate::mirror;
use crate::models::SessionUser;
use crate::routes::{base_context, current_user, flash, parse_amount, parse_id, redirect, render};
use crate::AppState;

/// Every user sees every category; only the event selector in the create
/// form is scoped to the session user.
async fn page_context(
    state: &AppState,
    user: &SessionUser,
    error: Option<&str>,
    msg: Option<&str>,
) -> Result<Context, AppError> {
    let store = &state.service.store;
    let events = mirror::visible_events(store, user.id).await?;
    let categories = mirror::all_categories(store).await?;

    let listed: Vec<_> = categories
        .iter()
        .map(|c| {
            let event_title = events
                .iter()
                .find(|e| e.id == c.event_id)
                .map(|e| e.title.clone())
                .unwrap_or_else(|| "Unknown Event".to_owned());
            serde_json::json!({
                "id": c.id,
                "name": c.name,
                "event_title": event_title,
                "participant_count": c.participants.len(),
                "expense_count": c.expenses.len(),
                "total_spent": format!("{:.2}", c.total_spent),
                "expenses": c.expenses,
                "is_member": c.participants.contains(&user.id),
            })
        })
        .collect();

    let mut context = base_context(user, "Expense Categories");
    context.insert("events", &events);
    context.insert("categories", &listed);
    if let Some(error) = error {
        context.insert("error", error);
    }
    if let Some(text) = flash(msg) {
        context.insert("flash", text);
    }
    Ok(context)
}

#[derive(Deserialize)]
pub struct ListQuery {
    msg: Option<String>,
}

#[get("/categories")]
pub async fn list(
    query: web::Query<ListQuery>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let context = page_context(&state, &user, None, query.msg.as_deref()).await?;
    render("categories.html", &context)
}

#[derive(Deserialize)]
pub struct CreateCategoryForm {
    event_id: String,
    name: String,
}

#[post("/categories")]
pub async fn create(
    web::Form(form): web::Form<CreateCategoryForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let name = form.name.trim();
    if name.is_empty() {
        let context = page_context(&state, &user, Some("Category name is required"), None).await?;
        return render("categories.html", &context);
    }
    let event_id = match parse_id(&form.event_id, "event") {
        Ok(id) => id,
        Err(msg) => {
            let context = page_context(&state, &user, Some(&msg), None).await?;
            return render("categories.html", &context);
        }
    };

    match state.service.create_category(&user, event_id, name).await {
        Ok(_) => Ok(redirect("/categories")),
        Err(err) => {
            log::warn!("category creation failed: {}", err);
            let context = page_context(&state, &user, Some(&err.to_string()), None).await?;
            render("categories.html", &context)
        }
    }
}

#[post("/categories/{category_id}/join")]
pub async fn join(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };

    match state.service.join_category(&user, *path).await {
        Ok(()) => Ok(redirect("/categories?msg=joined")),
        Err(err) => {
            log::warn!("join category failed: {}", err);
            let context = page_context(&state, &user, Some(&err.to_string()), None).await?;
            render("categories.html", &context)
        }
    }
}

#[derive(Deserialize)]
pub struct AddExpenseForm {
    amount: String,
    #[serde(default)]
    vendor: String,
}

#[post("/categories/{category_id}/expenses")]
pub async fn add_expense(
    path: web::Path<i64>,
    web::Form(form): web::Form<AddExpenseForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, identity).await? else {
        return Ok(redirect("/login"));
    };
    let category_id = *path;
    let amount = match parse_amount(&form.amount) {
        Ok(amount) => amount,
        Err(msg) => {
            let context = page_context(&state, &user, Some(&msg), None).await?;
            return render("categories.html", &context);
        }
    };

    // The event id comes off the mirrored category, not the form.
    let Some(category) = mirror::find_category(&state.service.store, category_id).await? else {
        let context = page_context(&state, &user, Some("No such category"), None).await?;
        return render("categories.html", &context);
    };

    match state
        .service
        .add_expense(category.event_id, category_id, amount, &form.vendor)
        .await
    {
        Ok(_) => Ok(redirect("/categories?msg=expense_added")),
        Err(err) => {
            log::warn!("expense creation failed: {}", err);
            let context = page_context(&state, &user, Some(&err.to_string()), None).await?;
            render("categories.html", &context)
        }
    }
}
