//! The time-stepping driver.
//!
//! One [`Driver`] runs on every rank. Each rank evaluates the same
//! branch conditions (`nsteps`, `output_frequency`, the step counter),
//! so every rank issues the same collectives in the same order.

use std::path::Path;
use std::time::Duration;

use chrono::{Local, TimeDelta};
use strand_comm::Communicator;
use strand_core::{FieldStack, GridDims, NameIndex};
use strand_decomp::{DecompError, DecompGrid};
use strand_kernel::{Kernel, KernelState};
use strand_store::{checkpoint_path, CheckpointStore, OpenMode};
use tracing::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::error::{RunError, StoreOp};
use crate::log::RunLog;
use crate::progress::{estimate_remaining, ElapsedBreakdown};
use crate::startup::{load_initial, load_params, InitialState, ParamLoading, ParamSource};
use crate::timer::{RunTimers, TimerReport};

/// Outcome of a completed run on one rank.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// This rank.
    pub rank: usize,
    /// Steps completed.
    pub steps: u64,
    /// Checkpoints written, including step 0.
    pub checkpoints: u64,
    /// Timer readings at the end of the run.
    pub timers: TimerReport,
    /// Field names, in stack order.
    pub fields: Vec<String>,
    /// Global grid extents.
    pub global_dims: GridDims,
    /// Process grid.
    pub process_grid: GridDims,
    /// This rank's interior extents.
    pub local_dims: GridDims,
}

/// Runs one simulation on one rank.
///
/// ```text
/// INIT      parameters -> field table -> decomposition -> scatter
///           -> share -> checkpoint 0 -> kernel preprocess
/// STEPPING  kernel apply -> share -> [gather + checkpoint]
///           -> [progress report]
/// FINALIZE  kernel postprocess -> timing breakdown
/// ```
///
/// Any error is logged with its [`code`](RunError::code) on the rank
/// that hit it, which then aborts the group. Ranks stopped by that
/// abort log the origin and return the abort as
/// [`RunError::Comm`].
pub struct Driver<'c, C, K>
where
    C: Communicator + ?Sized,
    K: Kernel,
{
    comm: &'c C,
    kernel: K,
    log: RunLog,
    loading: ParamLoading,
}

impl<'c, C, K> Driver<'c, C, K>
where
    C: Communicator + ?Sized,
    K: Kernel,
{
    /// A driver for `kernel` on `comm`'s rank, logging to `log`.
    pub fn new(comm: &'c C, kernel: K, log: RunLog) -> Self {
        Self {
            comm,
            kernel,
            log,
            loading: ParamLoading::default(),
        }
    }

    /// Choose how parameters reach every rank.
    pub fn with_param_loading(mut self, loading: ParamLoading) -> Self {
        self.loading = loading;
        self
    }

    /// Run to completion or first failure.
    pub fn run(mut self, source: &ParamSource) -> Result<RunReport, RunError> {
        let log = self.log.clone();
        let result = log.in_scope(|| {
            let result = self.execute(source);
            if let Err(e) = &result {
                self.fail(e);
            }
            result
        });
        match (result, log.flush()) {
            (Ok(_), Err(e)) => Err(RunError::Log(e)),
            (result, _) => result,
        }
    }

    fn fail(&self, err: &RunError) {
        match err.aborted_by() {
            Some((origin, code)) => {
                warn!(origin, code, "run aborted by rank {origin} with code {code}");
            }
            None => {
                error!(code = err.code(), "{err}");
                // An MPI abort does not return.
                let _ = self.log.flush();
                self.comm.abort(err.code());
            }
        }
    }

    fn execute(&mut self, source: &ParamSource) -> Result<RunReport, RunError> {
        let comm = self.comm;
        let coordinator = comm.is_coordinator();
        let mut timers = RunTimers::new();
        timers.total.start();

        if coordinator {
            info!("Beginning simulation");
            info!("{}", Local::now().format("%c"));
        }
        debug!(
            rank = comm.rank(),
            size = comm.size(),
            kernel = self.kernel.name(),
            "rank started"
        );

        let params = load_params(comm, source, self.loading)?;
        if coordinator {
            for (key, value) in params.iter() {
                info!("Parameter:{key}:{value}:");
            }
        }
        let config = RunConfig::from_params(&params)?;
        config.validate(self.kernel.min_ghost_width())?;

        let InitialState {
            names,
            global,
            data: mut global_data,
        } = load_initial(comm, &config)?;
        let grid = DecompGrid::setup(comm, &config.decomp_config(global))?;
        if coordinator {
            log_topology(comm.size(), &config, &grid);
        }
        debug!(
            offset = ?grid.subdomain().offset(),
            local = %grid.local_dims(),
            "subdomain assigned"
        );

        let nfields = names.len();
        let layout = *grid.layout();
        let mut fields = FieldStack::try_new(nfields, grid.local_len())?;
        let mut chem_pot = FieldStack::try_new(nfields, grid.local_len())?;
        let mut mobility = FieldStack::try_new(nfields, grid.local_len())?;

        for f in 0..nfields {
            let source = global_data.as_ref().map(|g| g.field(f));
            grid.scatter(comm, source, fields.field_mut(f))?;
        }
        timers
            .communication
            .time(|| share_all(comm, &grid, &mut fields))?;

        if let Some(data) = &global_data {
            let mode = OpenMode::Create { dims: global };
            timers
                .io
                .time(|| write_checkpoint(&config.checkpoint_file, mode, &names, data, 0))?;
        }
        let mut checkpoints = 1;

        let mut state = KernelState::new(
            &mut fields,
            &mut chem_pot,
            &mut mobility,
            &layout,
            &names,
            0,
        );
        self.kernel.preprocess(&mut state, &params)?;

        let progress = config.progress_interval();
        for step in 1..=config.nsteps {
            debug!(step, "Step");
            let kernel = &mut self.kernel;
            timers.compute.time(|| {
                let mut state = KernelState::new(
                    &mut fields,
                    &mut chem_pot,
                    &mut mobility,
                    &layout,
                    &names,
                    step,
                );
                kernel.apply(&mut state)
            })?;

            debug!("Share data");
            timers
                .communication
                .time(|| share_all(comm, &grid, &mut fields))?;

            if step % config.output_frequency == 0 {
                let index = step / config.output_frequency;
                timers.io.time(|| -> Result<(), RunError> {
                    debug!("Gather data");
                    for f in 0..nfields {
                        let sink = global_data.as_mut().map(|g| g.field_mut(f));
                        grid.gather(comm, sink, fields.field(f))?;
                    }
                    if let Some(data) = &global_data {
                        debug!(index, "Coordinator writing checkpoint");
                        let mode = OpenMode::Append { dims: global };
                        write_checkpoint(&config.checkpoint_file, mode, &names, data, index)?;
                    }
                    Ok(())
                })?;
                checkpoints += 1;
            }

            if let Some(interval) = progress {
                if coordinator && step % interval == 0 {
                    report_progress(step, config.nsteps, timers.total.elapsed());
                }
            }
        }

        debug!("Postprocess");
        let mut state = KernelState::new(
            &mut fields,
            &mut chem_pot,
            &mut mobility,
            &layout,
            &names,
            config.nsteps,
        );
        self.kernel.postprocess(&mut state)?;

        timers.total.stop();
        let report = timers.report();
        if coordinator {
            info!("");
            for line in report.to_string().lines() {
                info!("{line}");
            }
            info!("Elapsed Time: {}", ElapsedBreakdown::from(report.total));
        }

        Ok(RunReport {
            rank: comm.rank(),
            steps: config.nsteps,
            checkpoints,
            timers: report,
            fields: names.iter().map(|(_, n)| n.to_string()).collect(),
            global_dims: global,
            process_grid: *grid.process_grid(),
            local_dims: *grid.local_dims(),
        })
    }
}

fn share_all<C>(comm: &C, grid: &DecompGrid, fields: &mut FieldStack) -> Result<(), DecompError>
where
    C: Communicator + ?Sized,
{
    for field in fields.fields_mut() {
        grid.share(comm, field)?;
    }
    Ok(())
}

fn write_checkpoint(
    path: &Path,
    mode: OpenMode,
    names: &NameIndex,
    data: &FieldStack,
    index: u64,
) -> Result<(), RunError> {
    let mut store =
        CheckpointStore::open(path, mode).map_err(RunError::store(StoreOp::Open, path))?;
    for (f, name) in names.iter() {
        store
            .write_dataset(&checkpoint_path(name.as_str(), index), data.field(f))
            .map_err(RunError::store(StoreOp::Write, path))?;
    }
    store
        .close()
        .map_err(RunError::store(StoreOp::Close, path))
}

fn log_topology(size: usize, config: &RunConfig, grid: &DecompGrid) {
    info!("");
    info!("Number of Processors: {size}");
    info!("Number of Dimensions: {}", config.dimensions);
    info!("Global Grid Dimensions: {}", grid.global_dims());
    info!("Processor Dimensions: {}", grid.process_grid());
    info!("Local Grid Dimensions: {}", grid.local_dims());
    info!("Boundary: {}", grid.boundary());
    info!("");
}

fn report_progress(step: u64, nsteps: u64, elapsed: Duration) {
    let fraction = step as f64 / nsteps as f64;
    let percent = (fraction * 100.0) as u32;
    let eta = estimate_remaining(fraction, elapsed)
        .and_then(|left| TimeDelta::from_std(left).ok())
        .and_then(|left| Local::now().checked_add_signed(left));
    match eta {
        Some(eta) => info!("{percent}% Complete, ETA: {}", eta.format("%c")),
        None => info!("{percent}% Complete, ETA: unknown"),
    }
}
