use actix_identity::Identity;
use actix_web::{get, post, web, HttpMessage, HttpRequest, HttpResponse};
use serde::Deserialize;
use tera::Context;

use crate::auth;
use crate::errors::AppError;
use crate::routes::{current_user, redirect, render};
use crate::AppState;

fn login_context(error: Option<&str>, email: &str) -> Context {
    let mut context = Context::new();
    context.insert("title", "Log in");
    context.insert("email", email);
    if let Some(error) = error {
        context.insert("error", error);
    }
    context
}

fn register_context(error: Option<&str>, form: Option<&RegisterForm>) -> Context {
    let mut context = Context::new();
    context.insert("title", "Create account");
    context.insert("name", form.map(|f| f.name.as_str()).unwrap_or(""));
    context.insert("email", form.map(|f| f.email.as_str()).unwrap_or(""));
    context.insert("phone", form.map(|f| f.phone.as_str()).unwrap_or(""));
    if let Some(error) = error {
        context.insert("error", error);
    }
    context
}

#[get("/login")]
pub async fn login_page(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    if current_user(&state, identity).await?.is_some() {
        return Ok(redirect("/dashboard"));
    }
    render("login.html", &login_context(None, ""))
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

#[post("/login")]
pub async fn login_form(
    web::Form(form): web::Form<LoginForm>,
    state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if form.email.is_empty() || form.password.is_empty() {
        return render(
            "login.html",
            &login_context(Some("All fields are required"), &form.email),
        );
    }
    if !form.email.contains('@') {
        return render(
            "login.html",
            &login_context(Some("Invalid email address"), &form.email),
        );
    }

    match auth::log_in(&state.service.store, &form.email, &form.password).await? {
        Some(session) => {
            Identity::login(&request.extensions(), session.id.to_string())?;
            Ok(redirect("/dashboard"))
        }
        None => render(
            "login.html",
            &login_context(Some("Invalid email or password"), &form.email),
        ),
    }
}

#[get("/register")]
pub async fn register_page(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<HttpResponse, AppError> {
    if current_user(&state, identity).await?.is_some() {
        return Ok(redirect("/dashboard"));
    }
    render("register.html", &register_context(None, None))
}

#[derive(Deserialize)]
pub struct RegisterForm {
    name: String,
    email: String,
    password: String,
    #[serde(default)]
    phone: String,
}

#[post("/register")]
pub async fn register_form(
    web::Form(form): web::Form<RegisterForm>,
    state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if form.name.is_empty() || form.email.is_empty() || form.password.is_empty() {
        return render(
            "register.html",
            &register_context(Some("All fields are required"), Some(&form)),
        );
    }
    if !form.email.contains('@') {
        return render(
            "register.html",
            &register_context(Some("Invalid email address"), Some(&form)),
        );
    }
    if form.password.len() < 8 {
        return render(
            "register.html",
            &register_context(
                Some("Password must be at least 8 characters long"),
                Some(&form),
            ),
        );
    }

    let phone = if form.phone.trim().is_empty() {
        None
    } else {
        Some(form.phone.trim().to_owned())
    };

    match auth::sign_up(
        &state.service.store,
        form.name.trim(),
        &form.email,
        &form.password,
        phone,
    )
    .await?
    {
        Some(session) => {
            Identity::login(&request.extensions(), session.id.to_string())?;
            Ok(redirect("/dashboard"))
        }
        None => render(
            "register.html",
            &register_context(Some("That email is already registered"), Some(&form)),
        ),
    }
}

#[post("/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    identity: Identity,
) -> Result<HttpResponse, AppError> {
    identity.logout();
    auth::log_out(&state.service.store).await?;
    Ok(redirect("/login"))
}
