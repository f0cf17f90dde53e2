use serde::{Deserialize, Serialize};

/// Entry in the local user registry (`cooper_users`). The credential is an
/// argon2 hash, never the raw password.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub pwd_hash: String,
}

/// The session mirror persisted under `cooper_user`. Carries no credential.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl From<&RegisteredUser> for SessionUser {
    fn from(user: &RegisteredUser) -> Self {
        SessionUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Active,
    Completed,
    PendingSettlement,
}

impl EventStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Completed => "completed",
            EventStatus::PendingSettlement => "pending settlement",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: i64,
    pub user_name: String,
    pub status: String,
}

/// Locally mirrored event (`cooper_events`). Organizer and participant names
/// are denormalized client-side; the backend only knows ids and titles.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub organizer_id: i64,
    pub organizer_name: String,
    pub status: EventStatus,
    pub participants: Vec<Participant>,
    pub pooled_amount: f64,
    pub created_at: String,
}

impl Event {
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }
}

/// A single expense line inside a category.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseLine {
    pub id: i64,
    pub amount: f64,
    pub vendor: String,
    pub date: String,
}

/// Locally mirrored category (`cooper_categories`). `total_spent` is always
/// recomputed from the expense lines, never accumulated by delta.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub participants: Vec<i64>,
    pub expenses: Vec<ExpenseLine>,
    pub total_spent: f64,
}

impl Category {
    pub fn recompute_total(&mut self) {
        self.total_spent = self.expenses.iter().map(|e| e.amount).sum();
    }
}

/// Local record of a remote expense creation (`cooper_bills`). The id is a
/// millisecond wall-clock timestamp, so appends are deliberately not
/// idempotent.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: i64,
    pub event_id: i64,
    pub category_id: i64,
    pub amount: f64,
    pub vendor: String,
    pub date: String,
    pub payment_url: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_user_serializes_without_credentials() {
        let registered = RegisteredUser {
            id: 1,
            name: "Asha".into(),
            email: "asha@example.com".into(),
            phone: None,
            pwd_hash: "$argon2id$...".into(),
        };
        let session = SessionUser::from(&registered);
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("pwd"));
        assert!(!json.contains("password"));
        assert!(!json.contains("phone"));
    }

    #[test]
    fn event_status_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&EventStatus::PendingSettlement).unwrap();
        assert_eq!(json, "\"pending_settlement\"");
    }

    #[test]
    fn category_total_tracks_expense_lines() {
        let mut cat = Category {
            id: 1,
            event_id: 1,
            name: "Food".into(),
            participants: vec![1],
            expenses: vec![],
            total_spent: 0.0,
        };
        cat.expenses.push(ExpenseLine {
            id: 1,
            amount: 12.5,
            vendor: "Deli".into(),
            date: "2025-03-01T00:00:00Z".into(),
        });
        cat.expenses.push(ExpenseLine {
            id: 2,
            amount: 7.5,
            vendor: "Deli".into(),
            date: "2025-03-01T00:00:00Z".into(),
        });
        cat.recompute_total();
        assert_eq!(cat.total_spent, 20.0);
    }
}
