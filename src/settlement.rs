//! Settlement display helpers.
//!
//! The debt-netting math is entirely the backend's. The client only
//! classifies each balance by sign and formats it to two decimal places.

use serde::Serialize;

use crate::api::Settlement;
use crate::models::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceKind {
    Refund,
    Owes,
    Settled,
}

impl BalanceKind {
    pub fn label(&self) -> &'static str {
        match self {
            BalanceKind::Refund => "gets a refund",
            BalanceKind::Owes => "owes",
            BalanceKind::Settled => "settled",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            BalanceKind::Refund => "positive",
            BalanceKind::Owes => "negative",
            BalanceKind::Settled => "zero",
        }
    }
}

pub fn classify(balance: f64) -> BalanceKind {
    if balance > 0.0 {
        BalanceKind::Refund
    } else if balance < 0.0 {
        BalanceKind::Owes
    } else {
        BalanceKind::Settled
    }
}

pub fn format_balance(balance: f64) -> String {
    match classify(balance) {
        BalanceKind::Refund => format!("+${:.2}", balance),
        BalanceKind::Owes => format!("-${:.2}", balance.abs()),
        BalanceKind::Settled => "$0.00".to_owned(),
    }
}

/// One rendered settlement row. Participant names come from the mirrored
/// event when available; unknown ids fall back to `User {id}`.
#[derive(Serialize, Debug, Clone)]
pub struct BalanceRow {
    pub user_id: i64,
    pub user_name: String,
    pub amount: String,
    pub label: &'static str,
    pub css_class: &'static str,
}

pub fn rows(settlement: &Settlement, event: Option<&Event>) -> Vec<BalanceRow> {
    settlement
        .settlement
        .iter()
        .map(|line| {
            let user_name = event
                .and_then(|e| {
                    e.participants
                        .iter()
                        .find(|p| p.user_id == line.user_id)
                        .map(|p| p.user_name.clone())
                })
                .unwrap_or_else(|| format!("User {}", line.user_id));
            let kind = classify(line.net_balance);
            BalanceRow {
                user_id: line.user_id,
                user_name,
                amount: format_balance(line.net_balance),
                label: kind.label(),
                css_class: kind.css_class(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SettlementLine;

    #[test]
    fn signs_classify_and_format() {
        assert_eq!(format_balance(25.5), "+$25.50");
        assert_eq!(format_balance(-25.5), "-$25.50");
        assert_eq!(format_balance(0.0), "$0.00");
        assert_eq!(classify(0.01), BalanceKind::Refund);
        assert_eq!(classify(-0.01), BalanceKind::Owes);
        assert_eq!(classify(0.0), BalanceKind::Settled);
    }

    #[test]
    fn rows_fall_back_to_generic_names() {
        let settlement = Settlement {
            event_id: 1,
            settlement: vec![
                SettlementLine { user_id: 1, net_balance: 25.5 },
                SettlementLine { user_id: 2, net_balance: -25.5 },
            ],
        };
        let rows = rows(&settlement, None);
        assert_eq!(rows[0].user_name, "User 1");
        assert_eq!(rows[0].amount, "+$25.50");
        assert_eq!(rows[1].amount, "-$25.50");
        assert_eq!(rows[1].css_class, "negative");
    }
}
