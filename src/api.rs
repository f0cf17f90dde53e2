//! Typed client for the Cooper backend.
//!
//! One method per backend operation. POST parameters travel as query strings
//! on empty-bodied requests, matching the deployed FastAPI contract. Non-2xx
//! responses surface as an error carrying the HTTP status and the raw body
//! text; the backend also answers some rejections as 200s with an
//! `{"error": ...}` body, which callers receive as [`ApiError::Rejected`].
//! No retries, no caching, no request coalescing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend rejected the request: {0}")]
    Rejected(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// `{"status": ...}` on success, `{"error": ...}` on rejection. Both arrive
/// with a 200 status from the deployed backend.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ApiOutcome {
    Ok { status: String },
    Rejected { error: String },
}

impl ApiOutcome {
    pub fn into_result(self) -> Result<String, ApiError> {
        match self {
            ApiOutcome::Ok { status } => Ok(status),
            ApiOutcome::Rejected { error } => Err(ApiError::Rejected(error)),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum LoginOutcome {
    Ok { user_id: i64 },
    Rejected { error: String },
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreatedEvent {
    pub id: i64,
    pub title: String,
    pub organizer_id: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreatedCategory {
    pub category_id: i64,
}

/// Payment-intent envelope returned by expense creation.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub payment_url: String,
    pub status: String,
}

/// Deposit acknowledgement. One deployed backend answers a bare status, the
/// other a full payment intent; the optional fields absorb both.
#[derive(Deserialize, Debug, Clone)]
pub struct DepositReceipt {
    pub status: String,
    #[serde(default)]
    pub intent_id: Option<String>,
    #[serde(default)]
    pub payment_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PoolContributor {
    pub user_id: i64,
    pub amount: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PoolBalance {
    pub event_id: i64,
    pub total_pool: f64,
    pub contributors: Vec<PoolContributor>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PaymentStatus {
    pub intent_id: String,
    pub status: String,
    #[serde(default)]
    pub settlement_status: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SettlementLine {
    pub user_id: i64,
    pub net_balance: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settlement {
    pub event_id: i64,
    pub settlement: Vec<SettlementLine>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ChartSlice {
    pub category: String,
    pub amount: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ExpenseChart {
    pub event_id: i64,
    pub by_category: Vec<ChartSlice>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RemoteEvent {
    pub event_id: i64,
    pub title: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserEvents {
    pub user_id: i64,
    pub events: Vec<RemoteEvent>,
}

#[derive(Debug, Clone)]
pub struct CooperApi {
    base_url: String,
    client: reqwest::Client,
}

impl CooperApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        CooperApi {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .header("ngrok-skip-browser-warning", "true")
            .send()
            .await?;
        Self::handle(response).await
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .query(params)
            .header("Content-Type", "application/json")
            .header("ngrok-skip-browser-warning", "true")
            .send()
            .await?;
        Self::handle(response).await
    }

    async fn handle<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(response.json().await?)
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let outcome: ApiOutcome = self
            .post(
                "/auth/register",
                &[("email", email.to_owned()), ("password", password.to_owned())],
            )
            .await?;
        outcome.into_result()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<i64, ApiError> {
        let outcome: LoginOutcome = self
            .post(
                "/auth/login",
                &[("email", email.to_owned()), ("password", password.to_owned())],
            )
            .await?;
        match outcome {
            LoginOutcome::Ok { user_id } => Ok(user_id),
            LoginOutcome::Rejected { error } => Err(ApiError::Rejected(error)),
        }
    }

    pub async fn create_event(&self, title: &str, organizer_id: i64) -> Result<CreatedEvent, ApiError> {
        self.post(
            "/events",
            &[
                ("title", title.to_owned()),
                ("organizer_id", organizer_id.to_string()),
            ],
        )
        .await
    }

    pub async fn add_participant(&self, event_id: i64, user_id: i64) -> Result<String, ApiError> {
        let outcome: ApiOutcome = self
            .post(
                &format!("/events/{}/participants", event_id),
                &[("user_id", user_id.to_string())],
            )
            .await?;
        outcome.into_result()
    }

    pub async fn deposit_to_pool(
        &self,
        event_id: i64,
        user_id: i64,
        amount: f64,
    ) -> Result<DepositReceipt, ApiError> {
        self.post(
            "/pool/deposit",
            &[
                ("event_id", event_id.to_string()),
                ("user_id", user_id.to_string()),
                ("amount", amount.to_string()),
            ],
        )
        .await
    }

    pub async fn get_pool(&self, event_id: i64) -> Result<PoolBalance, ApiError> {
        self.get(&format!("/pool/{}", event_id)).await
    }

    pub async fn create_category(&self, event_id: i64, name: &str) -> Result<CreatedCategory, ApiError> {
        self.post(
            "/categories",
            &[("event_id", event_id.to_string()), ("name", name.to_owned())],
        )
        .await
    }

    pub async fn join_category(
        &self,
        category_id: i64,
        user_id: i64,
        event_id: i64,
    ) -> Result<String, ApiError> {
        let outcome: ApiOutcome = self
            .post(
                &format!("/categories/{}/join", category_id),
                &[
                    ("user_id", user_id.to_string()),
                    ("event_id", event_id.to_string()),
                ],
            )
            .await?;
        outcome.into_result()
    }

    pub async fn vote(
        &self,
        event_id: i64,
        target_user_id: i64,
        voter_user_id: i64,
        approve: bool,
    ) -> Result<String, ApiError> {
        let outcome: ApiOutcome = self
            .post(
                "/votes",
                &[
                    ("event_id", event_id.to_string()),
                    ("target_user_id", target_user_id.to_string()),
                    ("voter_user_id", voter_user_id.to_string()),
                    ("approve", approve.to_string()),
                ],
            )
            .await?;
        outcome.into_result()
    }

    pub async fn create_expense(
        &self,
        event_id: i64,
        category_id: i64,
        amount: f64,
    ) -> Result<PaymentIntent, ApiError> {
        self.post(
            "/expenses",
            &[
                ("event_id", event_id.to_string()),
                ("category_id", category_id.to_string()),
                ("amount", amount.to_string()),
            ],
        )
        .await
    }

    pub async fn payment_status(&self, intent_id: &str) -> Result<PaymentStatus, ApiError> {
        self.get(&format!("/payments/{}/status", intent_id)).await
    }

    pub async fn get_settlement(&self, event_id: i64) -> Result<Settlement, ApiError> {
        self.get(&format!("/settlement/{}", event_id)).await
    }

    pub async fn expense_chart(&self, event_id: i64) -> Result<ExpenseChart, ApiError> {
        self.get(&format!("/expenses/{}/chart", event_id)).await
    }

    pub async fn user_events(&self, user_id: i64) -> Result<UserEvents, ApiError> {
        self.get(&format!("/users/{}/events", user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_parses_both_envelope_shapes() {
        let ok: ApiOutcome = serde_json::from_str(r#"{"status":"joined"}"#).unwrap();
        assert_eq!(ok.into_result().unwrap(), "joined");

        let rejected: ApiOutcome =
            serde_json::from_str(r#"{"error":"50% approval required"}"#).unwrap();
        assert!(matches!(
            rejected.into_result(),
            Err(ApiError::Rejected(msg)) if msg.contains("approval")
        ));
    }

    #[test]
    fn login_outcome_distinguishes_error_bodies() {
        let ok: LoginOutcome = serde_json::from_str(r#"{"user_id":7}"#).unwrap();
        assert!(matches!(ok, LoginOutcome::Ok { user_id: 7 }));

        let rejected: LoginOutcome =
            serde_json::from_str(r#"{"error":"invalid credentials"}"#).unwrap();
        assert!(matches!(rejected, LoginOutcome::Rejected { .. }));
    }

    #[test]
    fn deposit_receipt_absorbs_both_backend_variants() {
        let bare: DepositReceipt = serde_json::from_str(r#"{"status":"deposited"}"#).unwrap();
        assert!(bare.intent_id.is_none());

        let intent: DepositReceipt = serde_json::from_str(
            r#"{"status":"pending","intent_id":"pi_1","payment_url":"https://pay/pi_1"}"#,
        )
        .unwrap();
        assert_eq!(intent.intent_id.as_deref(), Some("pi_1"));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let api = CooperApi::new("http://localhost:8000/");
        assert_eq!(api.base_url, "http://localhost:8000");
    }
}
