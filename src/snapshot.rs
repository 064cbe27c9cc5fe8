use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::LedgerStore;
use crate::models::{Budget, Expense, ExpenseId};

/// First bytes of every snapshot blob; anything else is untrusted input.
const SNAPSHOT_MAGIC: &[u8; 4] = b"FNT\0";

/// Bumped on any incompatible payload change.
const SNAPSHOT_VERSION: u8 = 1;

const HEADER_LEN: usize = SNAPSHOT_MAGIC.len() + 1;

#[derive(Debug, Error)]
pub enum CorruptSnapshotError {
    #[error("snapshot shorter than its header")]
    TooShort,
    #[error("snapshot magic mismatch")]
    BadMagic,
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u8),
    #[error("snapshot payload does not decode: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct SnapshotPayload {
    next_expense_id: ExpenseId,
    expenses: Vec<Expense>,
    budgets: Vec<Budget>,
}

/// Serialize the full store to an opaque blob: magic, format version, then
/// the row payload. Restoring the result yields an observably identical
/// store.
pub fn encode(store: &LedgerStore) -> Result<Vec<u8>, serde_json::Error> {
    let payload = SnapshotPayload {
        next_expense_id: store.next_expense_id(),
        expenses: store.expense_rows().cloned().collect(),
        budgets: store.budget_rows().cloned().collect(),
    };
    let body = serde_json::to_vec(&payload)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(SNAPSHOT_MAGIC);
    bytes.push(SNAPSHOT_VERSION);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Restore a store from a blob previously produced by [`encode`]. Callers
/// recover from a corrupt blob by starting a fresh store; the error is
/// never shown to the user.
pub fn decode(bytes: &[u8]) -> Result<LedgerStore, CorruptSnapshotError> {
    if bytes.len() < HEADER_LEN {
        return Err(CorruptSnapshotError::TooShort);
    }
    if &bytes[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(CorruptSnapshotError::BadMagic);
    }
    let version = bytes[SNAPSHOT_MAGIC.len()];
    if version != SNAPSHOT_VERSION {
        return Err(CorruptSnapshotError::UnsupportedVersion(version));
    }

    let payload: SnapshotPayload = serde_json::from_slice(&bytes[HEADER_LEN..])?;
    Ok(LedgerStore::from_rows(
        payload.expenses,
        payload.budgets,
        payload.next_expense_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpenseDraft;
    use rust_decimal_macros::dec;
    use time::macros::date;

    fn populated_store() -> LedgerStore {
        let mut store = LedgerStore::new();
        store
            .add_expense(
                ExpenseDraft::new(dec!(45.50), "Food & Dining", "Lunch", date!(2024 - 01 - 03))
                    .with_tags(&["lunch"]),
            )
            .unwrap();
        store
            .add_expense(ExpenseDraft::new(dec!(30), "Transportation", "Uber", date!(2024 - 01 - 01)))
            .unwrap();
        store.set_budget("Food & Dining", dec!(500));
        store.set_budget("Shopping", dec!(250));
        store
    }

    #[test]
    fn round_trip_preserves_observable_state() {
        let store = populated_store();
        let restored = decode(&encode(&store).unwrap()).unwrap();
        assert_eq!(restored.get_all_expenses(), store.get_all_expenses());
        assert_eq!(restored.get_all_budgets(), store.get_all_budgets());
        assert_eq!(restored.next_expense_id(), store.next_expense_id());
    }

    #[test]
    fn decode_rejects_short_input() {
        assert!(matches!(decode(b"FN"), Err(CorruptSnapshotError::TooShort)));
    }

    #[test]
    fn decode_rejects_wrong_magic() {
        assert!(matches!(
            decode(b"NOPE\x01{}"),
            Err(CorruptSnapshotError::BadMagic)
        ));
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let mut bytes = encode(&LedgerStore::new()).unwrap();
        bytes[SNAPSHOT_MAGIC.len()] = 9;
        assert!(matches!(
            decode(&bytes),
            Err(CorruptSnapshotError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn decode_rejects_mangled_payload() {
        let mut bytes = encode(&populated_store()).unwrap();
        bytes.truncate(bytes.len() / 2);
        assert!(matches!(
            decode(&bytes),
            Err(CorruptSnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn restored_store_accepts_new_rows_without_id_reuse() {
        let store = populated_store();
        let mut restored = decode(&encode(&store).unwrap()).unwrap();
        let id = restored
            .add_expense(ExpenseDraft::new(dec!(9.99), "Others", "after restore", date!(2024 - 02 - 01)))
            .unwrap();
        assert!(store.get_all_expenses().iter().all(|e| e.id != id));
    }
}
