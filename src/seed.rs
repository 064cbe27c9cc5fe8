use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::{Date, Duration};

use crate::ledger::LedgerStore;
use crate::models::{AuxiliaryState, ExpenseDraft, Mood, Subscription, ValidationError};

/// The fixed category set; every category gets a default budget on first
/// login.
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    "Food & Dining",
    "Transportation",
    "Shopping",
    "Entertainment",
    "Bills & Utilities",
    "Healthcare",
    "Education",
    "Others",
];

pub fn default_budget_amount() -> Decimal {
    dec!(500)
}

/// Starter ledger for a user with no usable snapshot: three sample
/// expenses over the last three days plus a default budget per category.
pub fn starter_ledger(today: Date) -> Result<LedgerStore, ValidationError> {
    let mut ledger = LedgerStore::new();
    for draft in sample_expenses(today) {
        ledger.add_expense(draft)?;
    }
    for category in DEFAULT_CATEGORIES {
        ledger.set_budget(category, default_budget_amount());
    }
    Ok(ledger)
}

fn sample_expenses(today: Date) -> Vec<ExpenseDraft> {
    let yesterday = today.previous_day().unwrap_or(today);
    let two_days_ago = yesterday.previous_day().unwrap_or(yesterday);

    vec![
        ExpenseDraft::new(dec!(45.50), "Food & Dining", "Lunch at cafe", today)
            .with_tags(&["lunch"])
            .with_mood(Mood::Happy),
        ExpenseDraft::new(dec!(120), "Shopping", "New shoes", yesterday).with_tags(&["clothing"]),
        ExpenseDraft::new(dec!(30), "Transportation", "Uber ride", two_days_ago)
            .with_tags(&["commute"]),
    ]
}

/// Starter auxiliary state for a user with no blob: default settings and
/// two sample subscriptions.
pub fn starter_auxiliary(today: Date) -> AuxiliaryState {
    AuxiliaryState {
        subscriptions: sample_subscriptions(today),
        ..AuxiliaryState::default()
    }
}

fn sample_subscriptions(today: Date) -> Vec<Subscription> {
    let in_a_week = today.checked_add(Duration::days(7)).unwrap_or(today);
    let in_two_weeks = today.checked_add(Duration::days(14)).unwrap_or(today);

    vec![
        Subscription {
            id: 1,
            name: "Netflix".to_string(),
            amount: dec!(15.99),
            frequency: "monthly".to_string(),
            next_billing: Some(in_a_week),
            cancel_reminder: true,
        },
        Subscription {
            id: 2,
            name: "Spotify".to_string(),
            amount: dec!(9.99),
            frequency: "monthly".to_string(),
            next_billing: Some(in_two_weeks),
            cancel_reminder: false,
        },
    ]
}
