use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, OffsetDateTime};

/// Store-assigned expense row id.
pub type ExpenseId = u64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("amount is not a valid decimal: '{0}'")]
    AmountNotNumeric(String),
    #[error("amount must not be negative")]
    NegativeAmount,
    #[error("category must not be empty")]
    EmptyCategory,
    #[error("description must not be empty")]
    EmptyDescription,
}

/// Parse a textual amount (receipt pipeline, form input) into a `Decimal`.
pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| ValidationError::AmountNotNumeric(raw.to_string()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    #[default]
    Neutral,
    Sad,
}

impl Mood {
    /// Upstream extractors supply moods as free text; unknown labels
    /// normalize to `Neutral` at this boundary.
    pub fn from_label(label: &str) -> Mood {
        match label.trim() {
            "happy" => Mood::Happy,
            "sad" => Mood::Sad,
            _ => Mood::Neutral,
        }
    }
}

/// An expense row as stored and read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub date: Date,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub recurring: bool,
}

/// Write command for inserting an expense. `id` is normally `None` and
/// assigned by the store; an update re-insert carries the original id.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub id: Option<ExpenseId>,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub date: Date,
    pub tags: Vec<String>,
    pub mood: Mood,
    pub recurring: bool,
}

impl ExpenseDraft {
    pub fn new(amount: Decimal, category: &str, description: &str, date: Date) -> Self {
        Self {
            id: None,
            amount,
            category: category.to_string(),
            description: description.to_string(),
            date,
            tags: Vec::new(),
            mood: Mood::Neutral,
            recurring: false,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = mood;
        self
    }

    /// Validated on write; readers never see a malformed row.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount);
        }
        if self.category.trim().is_empty() {
            return Err(ValidationError::EmptyCategory);
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        Ok(())
    }
}

/// One budget row per category, upserted by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    pub amount: Decimal,
    pub updated_at: OffsetDateTime,
}

/// Per-user state kept outside the relational store: settings, the four
/// planning lists, and gamification counters. Serialized as JSON text with
/// the wire field names of the original blobs (including the historical
/// `regretedPurchases` spelling).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuxiliaryState {
    pub settings: Settings,
    pub goals: Vec<Goal>,
    #[serde(rename = "regretedPurchases")]
    pub regretted_purchases: Vec<RegretEntry>,
    pub future_purchases: Vec<FuturePurchase>,
    pub subscriptions: Vec<Subscription>,
    pub streak: u32,
    pub badges: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub dark_mode: bool,
    pub currency: String,
    pub hourly_wage: Decimal,
    pub notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dark_mode: false,
            currency: "USD".to_string(),
            hourly_wage: Decimal::from(25),
            notifications: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Goal {
    pub id: u64,
    pub name: String,
    pub target: Decimal,
    pub current: Decimal,
    pub deadline: Option<Date>,
}

/// An expense the user marked as regretted, with when and why.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegretEntry {
    pub id: ExpenseId,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub regret_date: Option<OffsetDateTime>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FuturePurchase {
    pub id: u64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_savings: Decimal,
    pub target_date: Option<Date>,
    pub priority: String,
}

impl Default for FuturePurchase {
    fn default() -> Self {
        FuturePurchase {
            id: 0,
            name: String::new(),
            target_amount: Decimal::ZERO,
            current_savings: Decimal::ZERO,
            target_date: None,
            priority: "medium".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subscription {
    pub id: u64,
    pub name: String,
    pub amount: Decimal,
    pub frequency: String,
    pub next_billing: Option<Date>,
    pub cancel_reminder: bool,
}

impl Default for Subscription {
    fn default() -> Self {
        Subscription {
            id: 0,
            name: String::new(),
            amount: Decimal::ZERO,
            frequency: "monthly".to_string(),
            next_billing: None,
            cancel_reminder: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn auxiliary_state_defaults_missing_fields() {
        let state: AuxiliaryState = serde_json::from_str("{}").unwrap();
        assert!(!state.settings.dark_mode);
        assert_eq!(state.settings.currency, "USD");
        assert_eq!(state.settings.hourly_wage, dec!(25));
        assert!(state.settings.notifications);
        assert!(state.goals.is_empty());
        assert!(state.subscriptions.is_empty());
        assert_eq!(state.streak, 0);
        assert!(state.badges.is_empty());
    }

    #[test]
    fn auxiliary_state_wire_names_are_camel_case() {
        let text = serde_json::to_string(&AuxiliaryState::default()).unwrap();
        assert!(text.contains("\"darkMode\""));
        assert!(text.contains("\"hourlyWage\""));
        assert!(text.contains("\"regretedPurchases\""));
        assert!(text.contains("\"futurePurchases\""));
    }

    #[test]
    fn parse_amount_rejects_non_numeric() {
        assert_eq!(parse_amount("45.50"), Ok(dec!(45.50)));
        assert_eq!(parse_amount(" 12 "), Ok(dec!(12)));
        assert!(matches!(
            parse_amount("abc"),
            Err(ValidationError::AmountNotNumeric(_))
        ));
    }

    #[test]
    fn mood_labels_normalize() {
        assert_eq!(Mood::from_label("happy"), Mood::Happy);
        assert_eq!(Mood::from_label("sad"), Mood::Sad);
        assert_eq!(Mood::from_label("ecstatic"), Mood::Neutral);
    }
}
