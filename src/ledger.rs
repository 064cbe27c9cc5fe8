use std::collections::BTreeMap;

use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::models::{Budget, Expense, ExpenseDraft, ExpenseId, ValidationError};

/// In-memory relational store for one user's session: an expenses table and
/// a budgets table keyed by category. Constructed fresh per login and only
/// persisted through the snapshot codec.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerStore {
    expenses: BTreeMap<ExpenseId, Expense>,
    budgets: BTreeMap<String, Budget>,
    next_expense_id: ExpenseId,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore {
    pub fn new() -> Self {
        Self {
            expenses: BTreeMap::new(),
            budgets: BTreeMap::new(),
            next_expense_id: 1,
        }
    }

    /// Insert a validated expense. Drafts without an id get the next auto
    /// id; a draft carrying an id (update re-insert) keeps it, and the
    /// sequence advances past it so later inserts cannot collide.
    pub fn add_expense(&mut self, draft: ExpenseDraft) -> Result<ExpenseId, ValidationError> {
        draft.validate()?;

        let id = match draft.id {
            Some(id) => {
                self.next_expense_id = self.next_expense_id.max(id + 1);
                id
            }
            None => {
                let id = self.next_expense_id;
                self.next_expense_id += 1;
                id
            }
        };

        self.expenses.insert(
            id,
            Expense {
                id,
                amount: draft.amount,
                category: draft.category,
                description: draft.description,
                date: draft.date,
                tags: draft.tags,
                mood: draft.mood,
                recurring: draft.recurring,
            },
        );
        tracing::debug!(id, "expense inserted");
        Ok(id)
    }

    /// All expenses, date descending; same-day rows newest-insert first.
    pub fn get_all_expenses(&self) -> Vec<Expense> {
        let mut rows: Vec<Expense> = self.expenses.values().cloned().collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        rows
    }

    pub fn expense_count(&self) -> usize {
        self.expenses.len()
    }

    /// Removing an absent id is a no-op, not an error.
    pub fn delete_expense(&mut self, id: ExpenseId) {
        if self.expenses.remove(&id).is_some() {
            tracing::debug!(id, "expense deleted");
        }
    }

    /// Upsert by category, touching the row's update timestamp.
    pub fn set_budget(&mut self, category: &str, amount: Decimal) {
        self.budgets.insert(
            category.to_string(),
            Budget {
                category: category.to_string(),
                amount,
                updated_at: OffsetDateTime::now_utc(),
            },
        );
    }

    /// Category -> amount; categories with no budget are simply absent.
    pub fn get_all_budgets(&self) -> BTreeMap<String, Decimal> {
        self.budgets
            .iter()
            .map(|(category, budget)| (category.clone(), budget.amount))
            .collect()
    }

    pub(crate) fn expense_rows(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.values()
    }

    pub(crate) fn budget_rows(&self) -> impl Iterator<Item = &Budget> {
        self.budgets.values()
    }

    pub(crate) fn next_expense_id(&self) -> ExpenseId {
        self.next_expense_id
    }

    /// Rebuild a store from decoded rows. The id sequence is normalized to
    /// sit past every restored row even if the stored counter lags.
    pub(crate) fn from_rows(
        expenses: Vec<Expense>,
        budgets: Vec<Budget>,
        next_expense_id: ExpenseId,
    ) -> Self {
        let max_id = expenses.iter().map(|e| e.id).max().unwrap_or(0);
        Self {
            expenses: expenses.into_iter().map(|e| (e.id, e)).collect(),
            budgets: budgets.into_iter().map(|b| (b.category.clone(), b)).collect(),
            next_expense_id: next_expense_id.max(max_id + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mood;
    use rust_decimal_macros::dec;
    use time::macros::date;

    #[test]
    fn auto_ids_are_monotonic() {
        let mut ledger = LedgerStore::new();
        let a = ledger
            .add_expense(ExpenseDraft::new(dec!(1), "Others", "a", date!(2024 - 01 - 01)))
            .unwrap();
        let b = ledger
            .add_expense(ExpenseDraft::new(dec!(2), "Others", "b", date!(2024 - 01 - 01)))
            .unwrap();
        assert_eq!((a, b), (1, 2));
    }

    #[test]
    fn explicit_id_advances_the_sequence() {
        let mut ledger = LedgerStore::new();
        let mut draft = ExpenseDraft::new(dec!(5), "Others", "kept id", date!(2024 - 01 - 01));
        draft.id = Some(7);
        assert_eq!(ledger.add_expense(draft).unwrap(), 7);

        let next = ledger
            .add_expense(ExpenseDraft::new(dec!(1), "Others", "fresh", date!(2024 - 01 - 02)))
            .unwrap();
        assert_eq!(next, 8);
    }

    #[test]
    fn rejected_draft_leaves_store_unchanged() {
        let mut ledger = LedgerStore::new();
        let err = ledger
            .add_expense(ExpenseDraft::new(dec!(-3), "Others", "bad", date!(2024 - 01 - 01)))
            .unwrap_err();
        assert_eq!(err, ValidationError::NegativeAmount);
        assert_eq!(ledger.expense_count(), 0);
        assert_eq!(ledger.next_expense_id(), 1);
    }

    #[test]
    fn moods_and_tags_survive_insert() {
        let mut ledger = LedgerStore::new();
        let id = ledger
            .add_expense(
                ExpenseDraft::new(dec!(45.50), "Food & Dining", "Lunch", date!(2024 - 03 - 05))
                    .with_tags(&["lunch", "work"])
                    .with_mood(Mood::Happy),
            )
            .unwrap();
        let rows = ledger.get_all_expenses();
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].tags, vec!["lunch", "work"]);
        assert_eq!(rows[0].mood, Mood::Happy);
    }
}
