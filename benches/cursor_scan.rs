use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rucks_cursor::{
    DB, DBOptions, FaultCursor, ForwardCursor, KeyRange, ReadOptions, Slice, Status, WriteOptions,
};

fn setup_db(num_keys: usize, value_size: usize) -> DB {
    let db = DB::open(DBOptions::default()).unwrap();
    let value = vec![b'x'; value_size];
    for i in 0..num_keys {
        db.put(
            &WriteOptions::default(),
            Slice::from(format!("key{i:010}")),
            Slice::from(value.as_slice()),
        )
        .unwrap();
    }
    db
}

fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scan");

    for num_keys in [1_000, 10_000] {
        let db = setup_db(num_keys, 100);
        group.throughput(Throughput::Elements(num_keys as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_keys), &db, |b, db| {
            b.iter(|| {
                let mut cursor = db
                    .cursor(&ReadOptions::default(), KeyRange::all())
                    .unwrap();
                let mut count = 0;
                while let Some((key, value)) = cursor.next() {
                    black_box((key, value));
                    count += 1;
                }
                cursor.status().unwrap();
                cursor.close().unwrap();
                count
            });
        });
    }

    group.finish();
}

fn bench_scan_checksums(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_checksums");
    let db = setup_db(10_000, 1024);
    group.throughput(Throughput::Elements(10_000));

    for verify in [true, false] {
        let options = ReadOptions {
            verify_checksums: Some(verify),
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(verify), &options, |b, options| {
            b.iter(|| {
                let mut cursor = db.cursor(options, KeyRange::all()).unwrap();
                let count = cursor.entries().count();
                cursor.close().unwrap();
                black_box(count)
            });
        });
    }

    group.finish();
}

fn bench_short_range(c: &mut Criterion) {
    let db = setup_db(100_000, 100);
    let mut i = 0u64;

    c.bench_function("short_range_16", |b| {
        b.iter(|| {
            let start = format!("key{:010}", (i * 7919) % 99_000);
            i += 1;
            let mut cursor = db
                .cursor(&ReadOptions::default(), KeyRange::starting_at(start))
                .unwrap();
            for _ in 0..16 {
                black_box(cursor.next());
            }
            cursor.close().unwrap();
        });
    });
}

fn bench_overwritten_keys(c: &mut Criterion) {
    let db = setup_db(1_000, 100);
    // Ten versions per key behind a pinned snapshot, so compaction keeps them.
    let _snapshot = db.get_snapshot().unwrap();
    for round in 0..10 {
        for i in 0..1_000 {
            db.put(
                &WriteOptions::default(),
                Slice::from(format!("key{i:010}")),
                Slice::from(format!("v{round}")),
            )
            .unwrap();
        }
    }

    c.bench_function("scan_with_10_versions", |b| {
        b.iter(|| {
            let mut cursor = db
                .cursor(&ReadOptions::default(), KeyRange::all())
                .unwrap();
            let count = cursor.entries().count();
            cursor.close().unwrap();
            black_box(count)
        });
    });
}

fn bench_fault_wrapper(c: &mut Criterion) {
    let db = setup_db(10_000, 100);

    c.bench_function("fault_cursor_passthrough", |b| {
        b.iter(|| {
            let inner = db
                .cursor(&ReadOptions::default(), KeyRange::all())
                .unwrap();
            let mut cursor = FaultCursor::new(inner).fail_after(usize::MAX, Status::io_error("never"));
            let count = cursor.entries().count();
            cursor.close().unwrap();
            black_box(count)
        });
    });
}

criterion_group!(
    benches,
    bench_full_scan,
    bench_scan_checksums,
    bench_short_range,
    bench_overwritten_keys,
    bench_fault_wrapper
);
criterion_main!(benches);
