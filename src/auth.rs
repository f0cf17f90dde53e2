//! Local user registry and session record.
//!
//! Signup and login run entirely against the `cooper_users` registry held in
//! the store; the backend's `/auth` routes are a separate concern of the API
//! client. The session record written to `cooper_user` never carries a
//! credential.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::AppError;
use crate::models::{RegisteredUser, SessionUser};
use crate::store::{keys, Store};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    Argon2::default()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            AppError::Password(e.to_string())
        })
}

pub fn verify_password(provided: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(provided.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Append a user to the registry and establish a session. Returns `None`
/// without touching the registry when the email is already taken.
pub async fn sign_up(
    store: &Store,
    name: &str,
    email: &str,
    password: &str,
    phone: Option<String>,
) -> Result<Option<SessionUser>, AppError> {
    let pwd_hash = hash_password(password)?;
    let name = name.to_owned();
    let email = email.to_lowercase();

    let session = store
        .update(keys::USERS, |users: &mut Vec<RegisteredUser>| {
            if users.iter().any(|u| u.email == email) {
                return None;
            }
            let user = RegisteredUser {
                id: users.len() as i64 + 1,
                name,
                email,
                phone,
                pwd_hash,
            };
            let session = SessionUser::from(&user);
            users.push(user);
            Some(session)
        })
        .await?;

    if let Some(session) = &session {
        store.save(keys::USER, session).await?;
        log::info!("user {} registered", session.id);
    }
    Ok(session)
}

/// Look the email up in the registry and verify the password. On success the
/// credential-free session record is written to `cooper_user`.
pub async fn log_in(
    store: &Store,
    email: &str,
    password: &str,
) -> Result<Option<SessionUser>, AppError> {
    let email = email.to_lowercase();
    let users: Vec<RegisteredUser> = store.load(keys::USERS).await?;

    let found = users
        .iter()
        .find(|u| u.email == email && verify_password(password, &u.pwd_hash));

    match found {
        Some(user) => {
            let session = SessionUser::from(user);
            store.save(keys::USER, &session).await?;
            log::info!("user {} logged in", session.id);
            Ok(Some(session))
        }
        None => Ok(None),
    }
}

pub async fn log_out(store: &Store) -> Result<(), AppError> {
    store.remove(keys::USER).await
}

/// Resolve a registry user by id (the value carried in the identity cookie).
pub async fn user_by_id(store: &Store, id: i64) -> Result<Option<SessionUser>, AppError> {
    let users: Vec<RegisteredUser> = store.load(keys::USERS).await?;
    Ok(users.iter().find(|u| u.id == id).map(SessionUser::from))
}
