use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal_macros::dec;
use time::macros::date;

use finote_engine::blob::MemoryBlobStore;
use finote_engine::ledger::LedgerStore;
use finote_engine::models::ExpenseDraft;
use finote_engine::session::SessionManager;
use finote_engine::snapshot;

fn seeded_ledger(rows: u32) -> LedgerStore {
    let mut ledger = LedgerStore::new();
    for n in 0..rows {
        ledger
            .add_expense(ExpenseDraft::new(
                dec!(12.50),
                "Food & Dining",
                &format!("expense {n}"),
                date!(2024 - 01 - 01),
            ))
            .unwrap();
    }
    for category in finote_engine::seed::DEFAULT_CATEGORIES {
        ledger.set_budget(category, dec!(500));
    }
    ledger
}

fn bench_snapshot_encode(c: &mut Criterion) {
    let ledger = seeded_ledger(1000);
    c.bench_function("snapshot_encode_1k", |b| {
        b.iter(|| snapshot::encode(black_box(&ledger)).unwrap())
    });
}

fn bench_snapshot_decode(c: &mut Criterion) {
    let bytes = snapshot::encode(&seeded_ledger(1000)).unwrap();
    c.bench_function("snapshot_decode_1k", |b| {
        b.iter(|| snapshot::decode(black_box(&bytes)).unwrap())
    });
}

fn bench_add_expense_with_save(c: &mut Criterion) {
    let mut manager = SessionManager::new(Arc::new(MemoryBlobStore::new()));
    manager.login("bench").unwrap();

    c.bench_function("session_add_expense", |b| {
        b.iter(|| {
            manager
                .add_expense(black_box(ExpenseDraft::new(
                    dec!(9.99),
                    "Others",
                    "bench expense",
                    date!(2024 - 01 - 01),
                )))
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_snapshot_encode,
    bench_snapshot_decode,
    bench_add_expense_with_save
);
criterion_main!(benches);
