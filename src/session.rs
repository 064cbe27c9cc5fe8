use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::blob::{BlobStore, StorageUnavailableError};
use crate::gamification;
use crate::ledger::LedgerStore;
use crate::models::{
    AuxiliaryState, Expense, ExpenseDraft, ExpenseId, FuturePurchase, Goal, RegretEntry,
    Settings, Subscription, ValidationError,
};
use crate::seed;
use crate::snapshot;

/// Failure before a session reached `Ready`; the session stays logged out
/// and the caller must show an explicit error state, never an empty
/// dashboard.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("durable storage unavailable during session start: {0}")]
    Storage(#[from] StorageUnavailableError),
    #[error("a session is already active")]
    SessionAlreadyActive,
    #[error("starter data rejected by the ledger: {0}")]
    Seed(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active session")]
    NoActiveSession,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    Initializing,
    Ready,
    Flushing,
}

struct ActiveSession {
    user_id: String,
    session_id: Uuid,
    ledger: LedgerStore,
    auxiliary: AuxiliaryState,
    snapshot_dirty: bool,
    auxiliary_dirty: bool,
}

/// Owns one login session at a time: loads or seeds the ledger and the
/// auxiliary blob on login, applies mutations followed by a durable save,
/// and flushes on logout. The ledger instance lives exactly as long as the
/// login; nothing is shared across sessions except the injected blob
/// store.
///
/// Methods take `&mut self`, so a single writer is enforced by ownership;
/// share across threads by wrapping the manager in a `Mutex`.
pub struct SessionManager {
    blobs: Arc<dyn BlobStore>,
    state: SessionState,
    active: Option<ActiveSession>,
}

impl SessionManager {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            state: SessionState::LoggedOut,
            active: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_user(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.user_id.as_str())
    }

    /// True when an earlier save failed and the durable copy lags the
    /// in-memory state; the next successful sync clears it.
    pub fn is_persistence_behind(&self) -> bool {
        self.active
            .as_ref()
            .map(|a| a.snapshot_dirty || a.auxiliary_dirty)
            .unwrap_or(false)
    }

    /// Start a session for `user_id`. Restores the ledger from its durable
    /// snapshot when one decodes, otherwise seeds starter data; a corrupt
    /// snapshot is recovered silently, but an unreachable durable layer is
    /// surfaced and the session stays logged out.
    pub fn login(&mut self, user_id: &str) -> Result<(), InitializationError> {
        if self.active.is_some() {
            return Err(InitializationError::SessionAlreadyActive);
        }

        self.state = SessionState::Initializing;
        match self.initialize(user_id) {
            Ok(active) => {
                info!(
                    user_id,
                    session_id = %active.session_id,
                    expenses = active.ledger.expense_count(),
                    streak = active.auxiliary.streak,
                    "session ready"
                );
                self.active = Some(active);
                self.state = SessionState::Ready;
                // Freshly seeded data is persisted right away, best effort.
                self.sync();
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::LoggedOut;
                Err(e)
            }
        }
    }

    fn initialize(&self, user_id: &str) -> Result<ActiveSession, InitializationError> {
        let session_id = Uuid::new_v4();
        let today = OffsetDateTime::now_utc().date();

        let (ledger, ledger_seeded) = match self.blobs.load_snapshot(user_id)? {
            Some(bytes) => match snapshot::decode(&bytes) {
                Ok(ledger) => {
                    info!(user_id, expenses = ledger.expense_count(), "snapshot restored");
                    (ledger, false)
                }
                Err(e) => {
                    warn!(user_id, error = %e, "snapshot corrupt, seeding a fresh ledger");
                    (seed::starter_ledger(today)?, true)
                }
            },
            None => {
                info!(user_id, "no snapshot found, seeding starter data");
                (seed::starter_ledger(today)?, true)
            }
        };

        let (auxiliary, auxiliary_seeded) = match self.blobs.load_auxiliary(user_id)? {
            Some(state) => (state, false),
            None => (seed::starter_auxiliary(today), true),
        };

        Ok(ActiveSession {
            user_id: user_id.to_string(),
            session_id,
            ledger,
            auxiliary,
            snapshot_dirty: ledger_seeded,
            auxiliary_dirty: auxiliary_seeded,
        })
    }

    /// Insert an expense, advance the streak, re-derive badges, then save
    /// both blobs. A validation failure leaves every store untouched.
    pub fn add_expense(&mut self, draft: ExpenseDraft) -> Result<ExpenseId, SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NoActiveSession)?;
        let id = active.ledger.add_expense(draft)?;
        active.snapshot_dirty = true;

        active.auxiliary.streak = active.auxiliary.streak.saturating_add(1);
        let badges = gamification::derive_badges(
            &active.auxiliary.badges,
            active.ledger.expense_count(),
            active.auxiliary.streak,
        );
        for badge in badges.difference(&active.auxiliary.badges) {
            info!(user_id = %active.user_id, %badge, "badge awarded");
        }
        active.auxiliary.badges = badges;
        active.auxiliary_dirty = true;

        self.sync();
        Ok(id)
    }

    /// Replace the row with `id`: delete then re-insert under the same id.
    /// The draft is validated up front so a rejected update leaves the
    /// original row in place.
    pub fn update_expense(&mut self, id: ExpenseId, draft: ExpenseDraft) -> Result<(), SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NoActiveSession)?;
        draft.validate()?;

        let mut draft = draft;
        draft.id = Some(id);
        active.ledger.delete_expense(id);
        active.ledger.add_expense(draft)?;
        active.snapshot_dirty = true;

        self.sync();
        Ok(())
    }

    pub fn delete_expense(&mut self, id: ExpenseId) -> Result<(), SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NoActiveSession)?;
        active.ledger.delete_expense(id);
        active.snapshot_dirty = true;

        self.sync();
        Ok(())
    }

    /// Upsert every (category, amount) pair, then save the snapshot.
    pub fn update_budgets(
        &mut self,
        budgets: BTreeMap<String, Decimal>,
    ) -> Result<(), SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NoActiveSession)?;
        for (category, amount) in budgets {
            active.ledger.set_budget(&category, amount);
        }
        active.snapshot_dirty = true;

        self.sync();
        Ok(())
    }

    pub fn update_settings(&mut self, settings: Settings) -> Result<(), SessionError> {
        self.mutate_auxiliary(|aux| aux.settings = settings)
    }

    pub fn replace_goals(&mut self, goals: Vec<Goal>) -> Result<(), SessionError> {
        self.mutate_auxiliary(|aux| aux.goals = goals)
    }

    pub fn replace_regretted_purchases(
        &mut self,
        entries: Vec<RegretEntry>,
    ) -> Result<(), SessionError> {
        self.mutate_auxiliary(|aux| aux.regretted_purchases = entries)
    }

    pub fn replace_future_purchases(
        &mut self,
        purchases: Vec<FuturePurchase>,
    ) -> Result<(), SessionError> {
        self.mutate_auxiliary(|aux| aux.future_purchases = purchases)
    }

    pub fn replace_subscriptions(
        &mut self,
        subscriptions: Vec<Subscription>,
    ) -> Result<(), SessionError> {
        self.mutate_auxiliary(|aux| aux.subscriptions = subscriptions)
    }

    fn mutate_auxiliary(
        &mut self,
        apply: impl FnOnce(&mut AuxiliaryState),
    ) -> Result<(), SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NoActiveSession)?;
        apply(&mut active.auxiliary);
        active.auxiliary_dirty = true;

        self.sync();
        Ok(())
    }

    pub fn expenses(&self) -> Vec<Expense> {
        self.active
            .as_ref()
            .map(|a| a.ledger.get_all_expenses())
            .unwrap_or_default()
    }

    pub fn budgets(&self) -> BTreeMap<String, Decimal> {
        self.active
            .as_ref()
            .map(|a| a.ledger.get_all_budgets())
            .unwrap_or_default()
    }

    pub fn auxiliary(&self) -> Option<&AuxiliaryState> {
        self.active.as_ref().map(|a| &a.auxiliary)
    }

    pub fn streak(&self) -> u32 {
        self.active.as_ref().map(|a| a.auxiliary.streak).unwrap_or(0)
    }

    pub fn badges(&self) -> BTreeSet<String> {
        self.active
            .as_ref()
            .map(|a| a.auxiliary.badges.clone())
            .unwrap_or_default()
    }

    /// Flush both blobs and tear the session down. The flush is best
    /// effort: a failed save is logged and never blocks the logout.
    pub fn logout(&mut self) {
        let Some(active) = self.active.as_mut() else {
            self.state = SessionState::LoggedOut;
            return;
        };

        self.state = SessionState::Flushing;
        active.snapshot_dirty = true;
        active.auxiliary_dirty = true;
        self.sync();

        if let Some(active) = self.active.take() {
            if active.snapshot_dirty || active.auxiliary_dirty {
                warn!(
                    user_id = %active.user_id,
                    "logout flush incomplete, latest state was not persisted"
                );
            }
            info!(user_id = %active.user_id, session_id = %active.session_id, "logged out");
        }
        self.state = SessionState::LoggedOut;
    }

    /// Write whichever blobs are marked dirty, wholesale, clearing the
    /// flags on success. A failure keeps the flag set, so the next sync
    /// retries with the latest state and the last mutation always wins.
    fn sync(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        if active.snapshot_dirty {
            let saved = snapshot::encode(&active.ledger)
                .map_err(|e| StorageUnavailableError::Backend(e.to_string()))
                .and_then(|bytes| self.blobs.save_snapshot(&active.user_id, &bytes));
            match saved {
                Ok(()) => active.snapshot_dirty = false,
                Err(e) => {
                    warn!(
                        user_id = %active.user_id,
                        error = %e,
                        "snapshot save failed, durable copy is behind memory"
                    );
                }
            }
        }

        if active.auxiliary_dirty {
            match self.blobs.save_auxiliary(&active.user_id, &active.auxiliary) {
                Ok(()) => active.auxiliary_dirty = false,
                Err(e) => {
                    warn!(
                        user_id = %active.user_id,
                        error = %e,
                        "auxiliary save failed, durable copy is behind memory"
                    );
                }
            }
        }
    }
}
