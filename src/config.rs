use std::env;

use actix_web::cookie::Key;

/// Runtime configuration, read once at startup from the environment (with
/// `.env` support via dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub api_base_url: String,
    session_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            bind_addr: env::var("COOPER_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://cooper.db".into()),
            api_base_url: env::var("COOPER_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".into()),
            session_key: env::var("SESSION_KEY").ok(),
        }
    }

    /// Cookie-signing key. `SESSION_KEY` must be at least 64 bytes when set;
    /// without it a fresh key is generated, which invalidates sessions on
    /// restart.
    pub fn session_key(&self) -> Key {
        match &self.session_key {
            Some(raw) if raw.len() >= 64 => Key::from(raw.as_bytes()),
            Some(_) => {
                log::error!("FATAL: SESSION_KEY must be at least 64 bytes");
                std::process::exit(1);
            }
            None => {
                log::warn!("SESSION_KEY not set, generating an ephemeral key");
                Key::generate()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_local_development() {
        let config = Config {
            bind_addr: "0.0.0.0:8080".into(),
            database_url: "sqlite://cooper.db".into(),
            api_base_url: "http://localhost:8000".into(),
            session_key: None,
        };
        // An absent key falls back to a generated one instead of exiting.
        let _ = config.session_key();
    }
}
