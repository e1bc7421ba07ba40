//! Benchmarks for snapshot change detection.
//!
//! Performance-critical paths:
//! - `has_changes`: whole-session comparison of two snapshots
//! - `has_changes` scoped to one document
//! - `scan_directory`: directory traversal and checksumming

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hotreload_kernel::infrastructure::config::{ChangeDetectionSettings, WatchSettings};
use hotreload_kernel::snapshot::{Snapshot, SnapshotVersion, SourceDocument, has_changes, scan_directory};
use std::fs;

fn documents(count: usize, edited: Option<usize>) -> Vec<SourceDocument> {
    (0..count)
        .map(|i| {
            let content = if Some(i) == edited {
                format!("pub fn f{i}() -> u32 {{ 1 }}")
            } else {
                format!("pub fn f{i}() {{}}")
            };
            SourceDocument::new(format!("src/m{i}.rs"), "app", content)
        })
        .collect()
}

fn bench_whole_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("change_detection/whole");
    let settings = ChangeDetectionSettings {
        trust_versions: false,
        include_generated: false,
    };

    for count in [10usize, 100, 1000, 10_000] {
        let committed = Snapshot::new(SnapshotVersion::new(1), documents(count, None));
        // Worst case: the only edit is in the last document.
        let latest = Snapshot::new(SnapshotVersion::new(2), documents(count, Some(count - 1)));

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| has_changes(black_box(&committed), black_box(&latest), None, &settings));
        });
    }

    group.finish();
}

fn bench_scoped(c: &mut Criterion) {
    let settings = ChangeDetectionSettings::default();
    let committed = Snapshot::new(SnapshotVersion::new(1), documents(10_000, None));
    let latest = Snapshot::new(SnapshotVersion::new(2), documents(10_000, Some(5000)));

    c.bench_function("change_detection/scoped", |b| {
        b.iter(|| {
            has_changes(
                black_box(&committed),
                black_box(&latest),
                Some("src/m5000.rs"),
                &settings,
            )
        });
    });
}

fn bench_scan_directory(c: &mut Criterion) {
    let mut group = c.benchmark_group("change_detection/scan_directory");
    let settings = WatchSettings::default();

    for count in [10usize, 100, 500] {
        let temp_dir = tempfile::tempdir().unwrap();
        for i in 0..count {
            let dir = temp_dir.path().join(format!("crate{}", i % 8)).join("src");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(format!("m{i}.rs")), format!("pub fn f{i}() {{}}")).unwrap();
        }

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| scan_directory(black_box(temp_dir.path()), &settings).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_whole_session, bench_scoped, bench_scan_directory);
criterion_main!(benches);
