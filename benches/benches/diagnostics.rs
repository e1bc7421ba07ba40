//! Benchmarks for diagnostics aggregation.

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use hotreload_kernel::diagnostics::{
    Diagnostic, DiagnosticsAggregator, Location, Severity, SourceSpan,
};
use hotreload_kernel::engine::{RudeEdit, RudeEditKind, UpdateResult, UpdateStatus};
use hotreload_kernel::snapshot::{Snapshot, SnapshotVersion, SourceDocument};

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("diagnostics/merge");

    let snapshot = Snapshot::new(
        SnapshotVersion::INITIAL,
        (0..256).map(|i| SourceDocument::new(format!("p{}/m{i}.rs", i % 4), format!("p{}", i % 4), "")),
    );

    for count in [10u32, 100, 1000] {
        let kinds = [
            RudeEditKind::DeleteUnit,
            RudeEditKind::SignatureChange,
            RudeEditKind::ActiveStatementUpdate,
            RudeEditKind::Unsupported,
        ];
        let result = UpdateResult {
            status: UpdateStatus::RestartRequired,
            diagnostics: (0..count)
                .map(|i| {
                    Diagnostic::new("E0001", Severity::Warning, "unused variable").with_location(
                        Location::new(format!("p{}/m{}.rs", i % 4, i % 256), SourceSpan::point(i, 1)),
                    )
                })
                .collect(),
            rude_edits: (0..count)
                .rev()
                .map(|i| {
                    RudeEdit::new(
                        kinds[(i % 4) as usize],
                        Location::new(format!("p{}/m{}.rs", i % 4, i % 256), SourceSpan::point(i, 1)),
                    )
                })
                .collect(),
            ..UpdateResult::default()
        };

        group.bench_with_input(BenchmarkId::from_parameter(count), &result, |b, result| {
            b.iter(|| DiagnosticsAggregator::new(&snapshot).merge(black_box(result)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
