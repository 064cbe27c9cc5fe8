// Finote persistence engine: an in-memory ledger, a byte snapshot codec,
// per-user durable blob storage, and the session orchestration gluing them
// together. Consumed by the UI layer and by the binary in main.rs.

pub mod blob;
pub mod config;
pub mod gamification;
pub mod ledger;
pub mod models;
pub mod seed;
pub mod session;
pub mod snapshot;

pub use blob::{BlobStore, MemoryBlobStore, SqliteBlobStore, StorageUnavailableError};
pub use gamification::derive_badges;
pub use ledger::LedgerStore;
pub use models::{
    parse_amount, AuxiliaryState, Budget, Expense, ExpenseDraft, ExpenseId, FuturePurchase,
    Goal, Mood, RegretEntry, Settings, Subscription, ValidationError,
};
pub use session::{InitializationError, SessionError, SessionManager, SessionState};
pub use snapshot::CorruptSnapshotError;
