//! Integration test: checkpoint read-after-write.
//!
//! Datasets read back bit-identical, across reopen and append, and a
//! freshly written container lists exactly the field names written.

use proptest::prelude::*;
use strand_core::GridDims;
use strand_store::{checkpoint_path, CheckpointStore, OpenMode};

fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}

#[test]
fn special_values_survive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("special.chk");
    let dims = GridDims::new(&[2, 3]).unwrap();
    let values = [
        0.0,
        -0.0,
        f64::NAN,
        f64::INFINITY,
        f64::MIN_POSITIVE / 2.0,
        -1.0e300,
    ];

    let mut store = CheckpointStore::open(&path, OpenMode::Create { dims }).unwrap();
    store.write_dataset(&checkpoint_path("phi", 0), &values).unwrap();
    store.close().unwrap();

    let mut store = CheckpointStore::open(&path, OpenMode::Read).unwrap();
    let back = store.read_dataset(&checkpoint_path("phi", 0)).unwrap();
    assert_eq!(bits(&back), bits(&values));
}

#[test]
fn checkpoint_sequence_over_several_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.chk");
    let dims = GridDims::new(&[5]).unwrap();
    let fields = ["phi", "c", "eta"];
    let value = |field: usize, index: u64| vec![field as f64 * 100.0 + index as f64; 5];

    let mut store = CheckpointStore::open(&path, OpenMode::Create { dims }).unwrap();
    for (f, name) in fields.iter().enumerate() {
        store.write_dataset(&checkpoint_path(name, 0), &value(f, 0)).unwrap();
    }
    store.close().unwrap();

    for index in 1..4 {
        let mut store = CheckpointStore::open(&path, OpenMode::Append { dims }).unwrap();
        for (f, name) in fields.iter().enumerate() {
            store
                .write_dataset(&checkpoint_path(name, index), &value(f, index))
                .unwrap();
        }
        store.close().unwrap();
    }

    let mut store = CheckpointStore::open(&path, OpenMode::Read).unwrap();
    assert_eq!(store.list("/").unwrap(), fields);
    assert_eq!(store.len(), 12);
    for (f, name) in fields.iter().enumerate() {
        assert_eq!(
            store.list(name).unwrap(),
            vec!["000000", "000001", "000002", "000003"]
        );
        for index in 0..4 {
            let got = store.read_dataset(&checkpoint_path(name, index)).unwrap();
            assert_eq!(got, value(f, index));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn read_after_write_is_bit_identical(
        extent in prop::collection::vec(1usize..6, 1..=3),
        seed in any::<u64>(),
        names in prop::collection::hash_set("[a-z][a-z0-9_]{0,7}", 1..4),
    ) {
        let dims = GridDims::new(&extent).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prop.chk");
        let names: Vec<String> = names.into_iter().collect();
        let data: Vec<Vec<f64>> = (0..names.len() as u64)
            .map(|n| {
                (0..dims.volume() as u64)
                    .map(|i| f64::from_bits(seed ^ i.wrapping_mul(0x9e37_79b9_7f4a_7c15).wrapping_add(n)))
                    .collect()
            })
            .collect();

        let mut store = CheckpointStore::open(&path, OpenMode::Create { dims }).unwrap();
        for (name, values) in names.iter().zip(&data) {
            store.write_dataset(name, values).unwrap();
        }
        store.close().unwrap();

        let mut store = CheckpointStore::open(&path, OpenMode::Read).unwrap();
        prop_assert_eq!(store.list("/").unwrap(), names.clone());
        for (name, values) in names.iter().zip(&data) {
            let back = store.read_dataset(name).unwrap();
            prop_assert_eq!(bits(&back), bits(values));
        }
    }
}
