//! Typed access to the mirrored entity arrays.
//!
//! Events are filtered to the session user's membership; the category array
//! is global and never filtered by user. Mutations go through the store's
//! transactional `update`, so the find-by-id-then-mutate cycle cannot lose a
//! concurrent write on the same key.

use crate::errors::AppError;
use crate::models::{Bill, Category, Event};
use crate::store::{keys, Store};

/// Events where some participant entry's userId equals the given user's id.
pub async fn visible_events(store: &Store, user_id: i64) -> Result<Vec<Event>, AppError> {
    let events: Vec<Event> = store.load(keys::EVENTS).await?;
    Ok(events
        .into_iter()
        .filter(|e| e.has_participant(user_id))
        .collect())
}

pub async fn find_event(store: &Store, event_id: i64) -> Result<Option<Event>, AppError> {
    let events: Vec<Event> = store.load(keys::EVENTS).await?;
    Ok(events.into_iter().find(|e| e.id == event_id))
}

pub async fn all_categories(store: &Store) -> Result<Vec<Category>, AppError> {
    store.load(keys::CATEGORIES).await
}

pub async fn find_category(store: &Store, category_id: i64) -> Result<Option<Category>, AppError> {
    let categories: Vec<Category> = store.load(keys::CATEGORIES).await?;
    Ok(categories.into_iter().find(|c| c.id == category_id))
}

pub async fn all_bills(store: &Store) -> Result<Vec<Bill>, AppError> {
    store.load(keys::BILLS).await
}

pub async fn append_event(store: &Store, event: Event) -> Result<(), AppError> {
    store
        .update(keys::EVENTS, |events: &mut Vec<Event>| events.push(event))
        .await
}

pub async fn append_category(store: &Store, category: Category) -> Result<(), AppError> {
    store
        .update(keys::CATEGORIES, |categories: &mut Vec<Category>| {
            categories.push(category)
        })
        .await
}

pub async fn append_bill(store: &Store, bill: Bill) -> Result<(), AppError> {
    store
        .update(keys::BILLS, |bills: &mut Vec<Bill>| bills.push(bill))
        .await
}

/// Mutate one event in place. Returns whether the id was found.
pub async fn update_event<F>(store: &Store, event_id: i64, f: F) -> Result<bool, AppError>
where
    F: FnOnce(&mut Event),
{
    store
        .update(keys::EVENTS, |events: &mut Vec<Event>| {
            match events.iter_mut().find(|e| e.id == event_id) {
                Some(event) => {
                    f(event);
                    true
                }
                None => false,
            }
        })
        .await
}

/// Mutate one category in place. Returns whether the id was found.
pub async fn update_category<F>(store: &Store, category_id: i64, f: F) -> Result<bool, AppError>
where
    F: FnOnce(&mut Category),
{
    store
        .update(keys::CATEGORIES, |categories: &mut Vec<Category>| {
            match categories.iter_mut().find(|c| c.id == category_id) {
                Some(category) => {
                    f(category);
                    true
                }
                None => false,
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventStatus, Participant};

    fn event_with_members(id: i64, members: &[i64]) -> Event {
        Event {
            id,
            title: format!("Event {}", id),
            organizer_id: members.first().copied().unwrap_or(0),
            organizer_name: "org".into(),
            status: EventStatus::Active,
            participants: members
                .iter()
                .map(|&user_id| Participant {
                    user_id,
                    user_name: format!("User {}", user_id),
                    status: "joined".into(),
                })
                .collect(),
            pooled_amount: 0.0,
            created_at: "2025-03-01T00:00:00Z".into(),
        }
    }

    #[tokio::test]
    async fn event_is_visible_iff_user_is_a_participant() {
        let store = Store::in_memory().await.unwrap();
        append_event(&store, event_with_members(1, &[1, 2])).await.unwrap();
        append_event(&store, event_with_members(2, &[2])).await.unwrap();
        append_event(&store, event_with_members(3, &[1])).await.unwrap();

        let visible = visible_events(&store, 1).await.unwrap();
        let ids: Vec<i64> = visible.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 3]);

        assert!(visible_events(&store, 99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_event_reports_missing_ids() {
        let store = Store::in_memory().await.unwrap();
        append_event(&store, event_with_members(1, &[1])).await.unwrap();

        let found = update_event(&store, 1, |e| e.pooled_amount = 50.0)
            .await
            .unwrap();
        assert!(found);
        let missing = update_event(&store, 42, |_| {}).await.unwrap();
        assert!(!missing);

        let event = find_event(&store, 1).await.unwrap().unwrap();
        assert_eq!(event.pooled_amount, 50.0);
    }

    #[tokio::test]
    async fn categories_are_never_filtered_by_user() {
        let store = Store::in_memory().await.unwrap();
        append_category(
            &store,
            Category {
                id: 1,
                event_id: 1,
                name: "Food".into(),
                participants: vec![2],
                expenses: vec![],
                total_spent: 0.0,
            },
        )
        .await
        .unwrap();

        // The global array is what every page sees, member or not.
        assert_eq!(all_categories(&store).await.unwrap().len(), 1);
    }
}
