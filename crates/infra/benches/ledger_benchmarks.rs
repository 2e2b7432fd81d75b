use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use simpleledger_core::{AccountId, Amount, Transaction};
use simpleledger_infra::balance_store::{BalanceStore, InMemoryBalanceStore};
use simpleledger_infra::{LedgerEngine, RetryPolicy};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::runtime::Runtime;

/// Naive read-then-overwrite store (no version check). Only here as a
/// lower bound for what the conditional write costs.
#[derive(Debug, Clone, Default)]
struct NaiveStore {
    inner: Arc<RwLock<HashMap<AccountId, i64>>>,
}

impl NaiveStore {
    fn deposit(&self, id: AccountId, amount: i64) {
        let current = self.inner.read().unwrap().get(&id).copied().unwrap_or(0);
        self.inner.write().unwrap().insert(id, current + amount);
    }
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

fn bench_apply_latency(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("apply_latency");

    group.bench_function("deposit_existing_account", |b| {
        let engine = LedgerEngine::new(InMemoryBalanceStore::new(), RetryPolicy::immediate(5));
        let id = AccountId::new();
        let amount = Amount::new(1).unwrap();

        b.iter(|| {
            rt.block_on(engine.apply(black_box(Transaction::deposit(id, amount))))
                .unwrap();
        });
    });

    group.bench_function("first_deposit_new_account", |b| {
        let engine = LedgerEngine::new(InMemoryBalanceStore::new(), RetryPolicy::immediate(5));
        let amount = Amount::new(1).unwrap();

        b.iter(|| {
            rt.block_on(engine.apply(black_box(Transaction::deposit(AccountId::new(), amount))))
                .unwrap();
        });
    });

    group.bench_function("naive_overwrite", |b| {
        let store = NaiveStore::default();
        let id = AccountId::new();

        b.iter(|| store.deposit(id, black_box(1)));
    });

    group.finish();
}

fn bench_contended_throughput(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("contended_throughput");

    for tasks in [1usize, 8, 32] {
        group.throughput(Throughput::Elements(tasks as u64));
        group.bench_with_input(BenchmarkId::from_parameter(tasks), &tasks, |b, &tasks| {
            let engine = Arc::new(LedgerEngine::new(
                InMemoryBalanceStore::new(),
                RetryPolicy::immediate(u32::MAX),
            ));
            let id = AccountId::new();
            let amount = Amount::new(1).unwrap();

            b.iter(|| {
                rt.block_on(async {
                    let handles: Vec<_> = (0..tasks)
                        .map(|_| {
                            let engine = engine.clone();
                            tokio::spawn(async move {
                                engine.apply(Transaction::deposit(id, amount)).await
                            })
                        })
                        .collect();
                    for h in handles {
                        h.await.unwrap().unwrap();
                    }
                });
            });

            let final_amount = rt
                .block_on(engine.store().get(id))
                .unwrap()
                .map(|b| b.amount)
                .unwrap_or(0);
            black_box(final_amount);
        });
    }

    group.finish();
}

criterion_group!(benches, bench_apply_latency, bench_contended_throughput);
criterion_main!(benches);
