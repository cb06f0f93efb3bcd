//! Criterion benchmarks for scatter, gather, and halo exchange.
//!
//! Each measurement runs a full in-process group; the reported time is
//! the slowest rank's, since a collective finishes when its last rank
//! does.

use std::hint::black_box;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion};
use strand_bench::{seeded_field, BenchProfile};
use strand_comm::{Communicator, LocalComm, LocalGroup};
use strand_decomp::DecompGrid;

/// Run `op` `iters` times on every rank of `profile` and return the
/// slowest rank's total.
fn time_collective<F>(profile: &BenchProfile, iters: u64, op: F) -> Duration
where
    F: Fn(&LocalComm, &DecompGrid, &[f64], &mut [f64], &mut [f64]) + Sync,
{
    let global = seeded_field(&profile.global, 42);
    let config = profile.decomp_config();
    let times = LocalGroup::run(profile.nprocs, |comm| {
        let grid = DecompGrid::setup(&comm, &config).unwrap();
        let mut local = vec![0.0; grid.local_len()];
        let mut sink = if comm.is_coordinator() {
            vec![0.0; grid.global_len()]
        } else {
            Vec::new()
        };
        let source = comm.is_coordinator().then_some(global.as_slice());
        grid.scatter(&comm, source, &mut local).unwrap();
        comm.barrier().unwrap();

        let start = Instant::now();
        for _ in 0..iters {
            op(&comm, &grid, &global, &mut local, &mut sink);
        }
        start.elapsed()
    })
    .unwrap();
    times.into_iter().max().unwrap_or_default()
}

fn bench_scatter(c: &mut Criterion) {
    for profile in [BenchProfile::square(), BenchProfile::cube()] {
        c.bench_function(&format!("scatter_{}", profile.name), |b| {
            b.iter_custom(|iters| {
                time_collective(&profile, iters, |comm, grid, global, local, _| {
                    let source = comm.is_coordinator().then_some(global);
                    grid.scatter(comm, source, local).unwrap();
                    black_box(&local);
                })
            });
        });
    }
}

fn bench_gather(c: &mut Criterion) {
    for profile in [BenchProfile::square(), BenchProfile::cube()] {
        c.bench_function(&format!("gather_{}", profile.name), |b| {
            b.iter_custom(|iters| {
                time_collective(&profile, iters, |comm, grid, _, local, sink| {
                    let target = comm.is_coordinator().then_some(&mut *sink);
                    grid.gather(comm, target, local).unwrap();
                    black_box(&sink);
                })
            });
        });
    }
}

fn bench_share(c: &mut Criterion) {
    for profile in [BenchProfile::square(), BenchProfile::cube()] {
        c.bench_function(&format!("share_{}", profile.name), |b| {
            b.iter_custom(|iters| {
                time_collective(&profile, iters, |comm, grid, _, local, _| {
                    grid.share(comm, local).unwrap();
                    black_box(&local);
                })
            });
        });
    }
}

criterion_group!(benches, bench_scatter, bench_gather, bench_share);
criterion_main!(benches);
