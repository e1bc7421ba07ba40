//! Benchmarks for a full coordinator update cycle.
//!
//! Measures `get_updates` + `commit_updates` over the checksum engine with
//! one edited document per iteration.

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use hotreload_kernel::engine::ChecksumDiffEngine;
use hotreload_kernel::session::SessionCoordinator;
use hotreload_kernel::snapshot::{SnapshotStore, SourceDocument};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

fn bench_update_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("session/update_cycle");
    let runtime = Runtime::new().unwrap();

    for count in [10usize, 100, 1000] {
        let store = Arc::new(SnapshotStore::new());
        store.replace_all(
            (0..count).map(|i| SourceDocument::new(format!("src/m{i}.rs"), "app", format!("fn f{i}() {{}}"))),
        );
        let coordinator = SessionCoordinator::new(store.clone(), Arc::new(ChecksumDiffEngine::new()));
        let cancel = CancellationToken::new();
        runtime.block_on(coordinator.start_session(&cancel)).unwrap();
        let edits = AtomicU64::new(0);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.to_async(&runtime).iter(|| async {
                let n = edits.fetch_add(1, Ordering::Relaxed);
                store.upsert_document(SourceDocument::new("src/m0.rs", "app", format!("fn f0() {{ {n} }}")));
                coordinator.get_updates(&cancel).await.unwrap();
                coordinator.commit_updates(&cancel).await.unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_update_cycle);
criterion_main!(benches);
