//! Shared flow layer: every user-facing operation pairs the remote call with
//! the corresponding local-mirror mutation in one place, so pages cannot
//! drift apart in how they talk to the backend.
//!
//! The remote service stays authoritative for anything it computes
//! (settlement, pool, chart); the mirror only carries the denormalized
//! display records the backend does not return.

use chrono::Utc;

use crate::api::{CooperApi, DepositReceipt, ExpenseChart, PoolBalance, Settlement, UserEvents};
use crate::errors::AppError;
use crate::mirror;
use crate::models::{Bill, Category, Event, EventStatus, ExpenseLine, Participant, SessionUser};
use crate::auth;
use crate::store::Store;

#[derive(Clone)]
pub struct CooperService {
    pub store: Store,
    pub api: CooperApi,
}

impl CooperService {
    pub fn new(store: Store, api: CooperApi) -> Self {
        CooperService { store, api }
    }

    /// Create the event remotely, then mirror it with the denormalized
    /// organizer data the backend does not return.
    pub async fn create_event(&self, user: &SessionUser, title: &str) -> Result<Event, AppError> {
        let created = self.api.create_event(title, user.id).await?;

        let event = Event {
            id: created.id,
            title: title.to_owned(),
            organizer_id: user.id,
            organizer_name: user.name.clone(),
            status: EventStatus::Active,
            participants: vec![Participant {
                user_id: user.id,
                user_name: user.name.clone(),
                status: "joined".into(),
            }],
            pooled_amount: 0.0,
            created_at: Utc::now().to_rfc3339(),
        };
        mirror::append_event(&self.store, event.clone()).await?;
        log::info!("event {} ({}) created by user {}", event.id, title, user.id);
        Ok(event)
    }

    /// Add a participant remotely, then mirror the membership. The push is
    /// skipped when the id is already present, keeping participant lists
    /// unique.
    pub async fn add_participant(&self, event_id: i64, user_id: i64) -> Result<(), AppError> {
        self.api.add_participant(event_id, user_id).await?;

        let user_name = match auth::user_by_id(&self.store, user_id).await? {
            Some(user) => user.name,
            None => format!("User {}", user_id),
        };
        let found = mirror::update_event(&self.store, event_id, |event| {
            if !event.has_participant(user_id) {
                event.participants.push(Participant {
                    user_id,
                    user_name,
                    status: "joined".into(),
                });
            }
        })
        .await?;
        if !found {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn deposit(
        &self,
        user: &SessionUser,
        event_id: i64,
        amount: f64,
    ) -> Result<DepositReceipt, AppError> {
        let receipt = self.api.deposit_to_pool(event_id, user.id, amount).await?;

        let found = mirror::update_event(&self.store, event_id, |event| {
            event.pooled_amount += amount;
        })
        .await?;
        if !found {
            return Err(AppError::NotFound);
        }
        log::info!("user {} deposited {:.2} into event {}", user.id, amount, event_id);
        Ok(receipt)
    }

    pub async fn create_category(
        &self,
        user: &SessionUser,
        event_id: i64,
        name: &str,
    ) -> Result<Category, AppError> {
        let created = self.api.create_category(event_id, name).await?;

        let category = Category {
            id: created.category_id,
            event_id,
            name: name.to_owned(),
            participants: vec![user.id],
            expenses: vec![],
            total_spent: 0.0,
        };
        mirror::append_category(&self.store, category.clone()).await?;
        Ok(category)
    }

    pub async fn join_category(&self, user: &SessionUser, category_id: i64) -> Result<(), AppError> {
        let category = mirror::find_category(&self.store, category_id)
            .await?
            .ok_or(AppError::NotFound)?;

        self.api
            .join_category(category_id, user.id, category.event_id)
            .await?;

        let user_id = user.id;
        mirror::update_category(&self.store, category_id, |category| {
            if !category.participants.contains(&user_id) {
                category.participants.push(user_id);
            }
        })
        .await?;
        Ok(())
    }

    /// Log an expense: remote payment intent first, then the bill record and
    /// the category line item. The line push and the total recomputation
    /// happen inside one store transaction, so `total_spent` can never drift
    /// from the sum of the lines.
    pub async fn add_expense(
        &self,
        event_id: i64,
        category_id: i64,
        amount: f64,
        vendor: &str,
    ) -> Result<Bill, AppError> {
        let intent = self.api.create_expense(event_id, category_id, amount).await?;

        let now = Utc::now();
        let vendor = if vendor.trim().is_empty() {
            "Unknown".to_owned()
        } else {
            vendor.trim().to_owned()
        };
        let bill = Bill {
            id: now.timestamp_millis(),
            event_id,
            category_id,
            amount,
            vendor: vendor.clone(),
            date: now.to_rfc3339(),
            payment_url: intent.payment_url.clone(),
            status: intent.status.clone(),
        };
        mirror::append_bill(&self.store, bill.clone()).await?;

        let line = ExpenseLine {
            id: bill.id,
            amount,
            vendor,
            date: bill.date.clone(),
        };
        let found = mirror::update_category(&self.store, category_id, |category| {
            category.expenses.push(line);
            category.recompute_total();
        })
        .await?;
        if !found {
            return Err(AppError::NotFound);
        }
        log::info!(
            "expense of {:.2} logged against category {} (intent {})",
            amount,
            category_id,
            intent.intent_id
        );
        Ok(bill)
    }

    pub async fn record_vote(
        &self,
        event_id: i64,
        target_user_id: i64,
        voter_user_id: i64,
        approve: bool,
    ) -> Result<String, AppError> {
        Ok(self
            .api
            .vote(event_id, target_user_id, voter_user_id, approve)
            .await?)
    }

    pub async fn settlement(&self, event_id: i64) -> Result<Settlement, AppError> {
        Ok(self.api.get_settlement(event_id).await?)
    }

    pub async fn pool(&self, event_id: i64) -> Result<PoolBalance, AppError> {
        Ok(self.api.get_pool(event_id).await?)
    }

    pub async fn chart(&self, event_id: i64) -> Result<ExpenseChart, AppError> {
        Ok(self.api.expense_chart(event_id).await?)
    }

    pub async fn remote_events(&self, user_id: i64) -> Result<UserEvents, AppError> {
        Ok(self.api.user_events(user_id).await?)
    }

    pub async fn clear_local_data(&self) -> Result<(), AppError> {
        self.store.clear_mirror().await
    }

    pub async fn payment_status(&self, intent_id: &str) -> Result<crate::api::PaymentStatus, AppError> {
        Ok(self.api.payment_status(intent_id).await?)
    }
}
