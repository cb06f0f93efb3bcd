//! End-to-end runs of the driver on an in-process group.

use std::path::Path;
use std::sync::Arc;

use strand_comm::{CommError, LocalGroup};
use strand_core::GridDims;
use strand_engine::{
    Driver, ParamLoading, ParamSource, RunError, RunLog, RunReport,
};
use strand_kernel::Kernel;
use strand_kernels::Diffusion;
use strand_store::{checkpoint_path, CheckpointStore, OpenMode};
use strand_test_utils::{
    coordinate_field, params, write_initial, CallCounts, CountingKernel, FailPoint, FailingKernel,
};
use tracing::Level;

type Outcome = Result<RunReport, RunError>;

fn run_group<K, F>(nprocs: usize, source: &ParamSource, log: &RunLog, make: F) -> Vec<Outcome>
where
    K: Kernel,
    F: Fn(usize) -> K + Sync,
{
    LocalGroup::run(nprocs, |comm| {
        let rank = strand_comm::Communicator::rank(&comm);
        Driver::new(&comm, make(rank), log.clone()).run(source)
    })
    .unwrap()
}

fn base_params(dir: &Path, nsteps: &str, output: &str) -> strand_core::Params {
    let init = dir.join("init.chk");
    let chk = dir.join("run.chk");
    params(&[
        ("init_file", init.to_str().unwrap()),
        ("checkpoint_file", chk.to_str().unwrap()),
        ("nsteps", nsteps),
        ("output_frequency", output),
    ])
}

fn two_field_init(dir: &Path, global: GridDims) -> (Vec<f64>, Vec<f64>) {
    let phi = coordinate_field(&global, 0.0);
    let c = coordinate_field(&global, 0.5);
    write_initial(
        dir.join("init.chk"),
        global,
        &[("phi", phi.clone()), ("c", c.clone())],
    )
    .unwrap();
    (phi, c)
}

fn aborted_by(outcome: &Outcome) -> Option<(usize, i32)> {
    match outcome {
        Err(e) => e.aborted_by(),
        Ok(_) => None,
    }
}

// ── Successful runs ────────────────────────────────────────────────

#[test]
fn checkpoints_track_every_output_step() {
    let dir = tempfile::tempdir().unwrap();
    let global = GridDims::new(&[6, 8]).unwrap();
    let (phi, c) = two_field_init(dir.path(), global);
    let source = ParamSource::Inline(base_params(dir.path(), "20", "5"));
    let calls = Arc::new(CallCounts::default());

    let out = run_group(4, &source, &RunLog::discard(), |_| {
        CountingKernel::new(1.0, Arc::clone(&calls))
    });

    for outcome in &out {
        let report = outcome.as_ref().unwrap();
        assert_eq!(report.steps, 20);
        assert_eq!(report.checkpoints, 5);
        assert_eq!(report.fields, vec!["phi", "c"]);
        assert_eq!(report.global_dims, global);
        assert_eq!(report.process_grid.volume(), 4);
        assert!(report.timers.total >= report.timers.compute);
    }
    assert_eq!(calls.preprocess(), 4);
    assert_eq!(calls.apply(), 80);
    assert_eq!(calls.postprocess(), 4);

    let mut store = CheckpointStore::open(dir.path().join("run.chk"), OpenMode::Read).unwrap();
    assert_eq!(store.list("/").unwrap(), vec!["phi", "c"]);
    assert_eq!(
        store.list("phi").unwrap(),
        vec!["000000", "000001", "000002", "000003", "000004"]
    );
    for index in 0..5u64 {
        let shift = 5.0 * index as f64;
        let got = store.read_dataset(&checkpoint_path("phi", index)).unwrap();
        let want: Vec<f64> = phi.iter().map(|v| v + shift).collect();
        assert_eq!(got, want, "phi checkpoint {index}");
        let got = store.read_dataset(&checkpoint_path("c", index)).unwrap();
        let want: Vec<f64> = c.iter().map(|v| v + shift).collect();
        assert_eq!(got, want, "c checkpoint {index}");
    }
}

#[test]
fn log_records_parameters_topology_and_progress() {
    let dir = tempfile::tempdir().unwrap();
    let global = GridDims::new(&[8]).unwrap();
    two_field_init(dir.path(), global);
    let mut p = base_params(dir.path(), "20", "4");
    p.set("dimensions", "1");
    let source = ParamSource::Inline(p);
    let (log, capture) = RunLog::memory(Level::INFO);
    let calls = Arc::new(CallCounts::default());

    let out = run_group(2, &source, &log, |_| CountingKernel::new(0.0, Arc::clone(&calls)));
    assert!(out.iter().all(Result::is_ok));

    let text = capture.contents();
    assert!(text.contains("Beginning simulation"), "{text}");
    assert!(text.contains("Parameter:nsteps:20:"), "{text}");
    assert!(text.contains("Parameter:output_frequency:4:"), "{text}");
    assert!(text.contains("Number of Processors: 2"), "{text}");
    assert!(text.contains("Global Grid Dimensions: 8"), "{text}");
    assert!(text.contains("Local Grid Dimensions: 4"), "{text}");
    assert_eq!(text.matches("% Complete, ETA: ").count(), 10, "{text}");
    assert!(text.contains("100% Complete"), "{text}");
    assert!(text.contains("Computation Time (%):"), "{text}");
    assert!(text.contains("Elapsed Time: 0 days, 0 hours, 0 minutes"), "{text}");
    // Debug lines are below the configured level.
    assert!(!text.contains("Share data"), "{text}");
}

#[test]
fn short_runs_skip_progress_reports() {
    let dir = tempfile::tempdir().unwrap();
    let global = GridDims::new(&[4, 4]).unwrap();
    two_field_init(dir.path(), global);
    let source = ParamSource::Inline(base_params(dir.path(), "7", "7"));
    let (log, capture) = RunLog::memory(Level::DEBUG);
    let calls = Arc::new(CallCounts::default());

    let out = run_group(2, &source, &log, |_| CountingKernel::new(1.0, Arc::clone(&calls)));
    for outcome in &out {
        assert_eq!(outcome.as_ref().unwrap().checkpoints, 2);
    }
    let text = capture.contents();
    assert!(!text.contains("Complete, ETA"), "{text}");
    assert_eq!(text.matches("Step step=").count(), 14, "{text}");
}

#[test]
fn token_chain_loading_reads_the_file_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let global = GridDims::new(&[6, 6]).unwrap();
    two_field_init(dir.path(), global);
    let file = dir.path().join("params.txt");
    let mut text = String::from("# run parameters\n");
    for (k, v) in base_params(dir.path(), "10", "5").iter() {
        text.push_str(&format!("{k} = {v}\n"));
    }
    std::fs::write(&file, text).unwrap();
    let source = ParamSource::File(file);
    let calls = Arc::new(CallCounts::default());

    let out = LocalGroup::run(3, |comm| {
        Driver::new(&comm, CountingKernel::new(1.0, Arc::clone(&calls)), RunLog::discard())
            .with_param_loading(ParamLoading::TokenChain)
            .run(&source)
    })
    .unwrap();
    assert!(out.iter().all(Result::is_ok));
    assert_eq!(calls.apply(), 30);
}

#[test]
fn periodic_diffusion_run_conserves_mass() {
    let dir = tempfile::tempdir().unwrap();
    let global = GridDims::new(&[12, 10]).unwrap();
    let phi: Vec<f64> = (0..global.volume()).map(|i| ((i * 7) % 11) as f64).collect();
    write_initial(dir.path().join("init.chk"), global, &[("phi", phi.clone())]).unwrap();
    let mut p = base_params(dir.path(), "30", "10");
    p.set("dt", "0.2");
    let source = ParamSource::Inline(p);

    let out = run_group(6, &source, &RunLog::discard(), |_| Diffusion::default());
    assert!(out.iter().all(Result::is_ok));

    let mut store = CheckpointStore::open(dir.path().join("run.chk"), OpenMode::Read).unwrap();
    let last = store.read_dataset(&checkpoint_path("phi", 3)).unwrap();
    let before: f64 = phi.iter().sum();
    let after: f64 = last.iter().sum();
    assert!((before - after).abs() < 1e-9, "{before} vs {after}");
    assert_ne!(last, phi);
}

// ── Failures ───────────────────────────────────────────────────────

#[test]
fn kernel_failure_aborts_every_rank() {
    let dir = tempfile::tempdir().unwrap();
    let global = GridDims::new(&[8, 8]).unwrap();
    two_field_init(dir.path(), global);
    let source = ParamSource::Inline(base_params(dir.path(), "10", "2"));
    let (log, capture) = RunLog::memory(Level::INFO);

    let out = run_group(4, &source, &log, |rank| -> Box<dyn Kernel> {
        if rank == 1 {
            Box::new(FailingKernel::new(FailPoint::Step(3)))
        } else {
            Box::new(FailingKernel::new(FailPoint::Never))
        }
    });

    match &out[1] {
        Err(e @ RunError::Kernel(_)) => assert_eq!(e.code(), 40),
        other => panic!("rank 1: expected a kernel error, got {other:?}"),
    }
    for rank in [0, 2, 3] {
        assert_eq!(aborted_by(&out[rank]), Some((1, 40)), "rank {rank}");
    }
    let text = capture.contents();
    assert!(text.contains("code=40"), "{text}");
    assert!(text.contains("run aborted by rank 1 with code 40"), "{text}");

    // Checkpoints up to the last completed output survive.
    let store = CheckpointStore::open(dir.path().join("run.chk"), OpenMode::Read).unwrap();
    assert_eq!(store.list("phi").unwrap(), vec!["000000", "000001"]);
}

#[test]
fn postprocess_failure_is_reported_with_kernel_code() {
    let dir = tempfile::tempdir().unwrap();
    let global = GridDims::new(&[4]).unwrap();
    two_field_init(dir.path(), global);
    let mut p = base_params(dir.path(), "3", "1");
    p.set("dimensions", "1");
    let source = ParamSource::Inline(p);

    let out = run_group(1, &source, &RunLog::discard(), |_| {
        FailingKernel::new(FailPoint::Postprocess)
    });
    assert_eq!(out[0].as_ref().map_err(RunError::code).unwrap_err(), 40);
}

#[test]
fn missing_initial_file_aborts_from_the_coordinator() {
    let dir = tempfile::tempdir().unwrap();
    let source = ParamSource::Inline(base_params(dir.path(), "10", "5"));

    let out = run_group(3, &source, &RunLog::discard(), |_| {
        FailingKernel::new(FailPoint::Never)
    });
    match &out[0] {
        Err(e) => assert_eq!(e.code(), 20, "{e}"),
        Ok(_) => panic!("coordinator should fail"),
    }
    assert_eq!(aborted_by(&out[1]), Some((0, 20)));
    assert_eq!(aborted_by(&out[2]), Some((0, 20)));
}

#[test]
fn dimensionality_mismatch_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    two_field_init(dir.path(), GridDims::new(&[4, 4]).unwrap());
    let mut p = base_params(dir.path(), "10", "5");
    p.set("dimensions", "3");
    let source = ParamSource::Inline(p);

    let out = run_group(2, &source, &RunLog::discard(), |_| {
        FailingKernel::new(FailPoint::Never)
    });
    match &out[0] {
        Err(e) => assert_eq!(e.code(), 22, "{e}"),
        Ok(_) => panic!("coordinator should fail"),
    }
    assert_eq!(aborted_by(&out[1]), Some((0, 22)));
}

#[test]
fn bad_configuration_fails_on_every_rank() {
    let dir = tempfile::tempdir().unwrap();
    let source = ParamSource::Inline(base_params(dir.path(), "0", "5"));

    let out = run_group(3, &source, &RunLog::discard(), |_| {
        FailingKernel::new(FailPoint::Never)
    });
    for outcome in &out {
        match outcome {
            // Every rank rejects the configuration itself, unless a
            // faster rank's abort reaches it first.
            Err(e) => assert!(
                e.code() == 1 || matches!(e, RunError::Comm(CommError::Aborted { code: 1, .. })),
                "{e}"
            ),
            Ok(_) => panic!("run should fail"),
        }
    }
}

#[test]
fn empty_subdomain_is_a_decomposition_error() {
    let dir = tempfile::tempdir().unwrap();
    let global = GridDims::new(&[3]).unwrap();
    two_field_init(dir.path(), global);
    let mut p = base_params(dir.path(), "10", "5");
    p.set("dimensions", "1");
    let source = ParamSource::Inline(p);

    let out = run_group(4, &source, &RunLog::discard(), |_| {
        FailingKernel::new(FailPoint::Never)
    });
    for outcome in &out {
        match outcome {
            Err(e) => assert!(
                e.code() == 10 || matches!(e.aborted_by(), Some((_, 10))),
                "{e}"
            ),
            Ok(_) => panic!("run should fail"),
        }
    }
}
