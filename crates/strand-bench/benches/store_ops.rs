//! Criterion benchmarks for checkpoint container writes and reads.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use strand_bench::seeded_field;
use strand_core::GridDims;
use strand_store::{checkpoint_path, CheckpointStore, OpenMode};

/// Append one checkpoint of two 256x256 fields to an existing container.
fn bench_append_checkpoint(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.chk");
    let dims = GridDims::new(&[256, 256]).unwrap();
    let values = seeded_field(&dims, 11);
    CheckpointStore::open(&path, OpenMode::Create { dims })
        .unwrap()
        .close()
        .unwrap();

    let mut index = 0;
    c.bench_function("append_checkpoint_2x256x256", |b| {
        b.iter(|| {
            let mut store = CheckpointStore::open(&path, OpenMode::Append { dims }).unwrap();
            for field in ["phi", "c"] {
                store
                    .write_dataset(&checkpoint_path(field, index), &values)
                    .unwrap();
            }
            store.close().unwrap();
            index += 1;
        });
    });
}

/// Read one 256x256 dataset back.
fn bench_read_dataset(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.chk");
    let dims = GridDims::new(&[256, 256]).unwrap();
    let values = seeded_field(&dims, 12);
    let mut store = CheckpointStore::open(&path, OpenMode::Create { dims }).unwrap();
    store.write_dataset("phi", &values).unwrap();
    store.close().unwrap();

    let mut store = CheckpointStore::open(&path, OpenMode::Read).unwrap();
    c.bench_function("read_dataset_256x256", |b| {
        b.iter(|| black_box(store.read_dataset("phi").unwrap()));
    });
}

criterion_group!(benches, bench_append_checkpoint, bench_read_dataset);
criterion_main!(benches);
