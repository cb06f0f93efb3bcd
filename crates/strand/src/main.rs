//! The `strand` command-line runner.
//!
//! ```text
//! strand run --params run.txt --np 4 --kernel allen-cahn
//! strand init --out init.chk --dims 64,64 --field phi --field c
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use strand::comm::LocalGroup;
use strand::engine::{Driver, ParamLoading, ParamSource, RunError, RunLog, RunReport};
use strand::kernel::Kernel;
use strand::kernels::{AllenCahn, Diffusion};
use strand::noise::{write_noise_initial, NoiseSpec};
use strand::types::GridDims;
use tracing::Level;

/// Distributed stencil-field simulation.
#[derive(Parser)]
#[command(name = "strand")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Distributed stencil-field simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation on an in-process group of ranks
    Run(RunArgs),
    /// Run one rank per MPI process
    #[cfg(feature = "mpi")]
    RunMpi(MpiArgs),
    /// Write a seeded noise initial-condition container
    Init(InitArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum KernelChoice {
    Diffusion,
    AllenCahn,
}

impl KernelChoice {
    fn build(self) -> Box<dyn Kernel> {
        match self {
            Self::Diffusion => Box::new(Diffusion::default()),
            Self::AllenCahn => Box::new(AllenCahn::default()),
        }
    }
}

/// Options shared by the run commands.
#[derive(Args)]
struct RunOptions {
    /// Parameter file (`key = value` per line)
    #[arg(long)]
    params: PathBuf,

    /// Physics kernel
    #[arg(long, value_enum, default_value = "diffusion")]
    kernel: KernelChoice,

    /// Log file; stderr when omitted
    #[arg(long)]
    log: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Let every rank read the parameter file in turn instead of
    /// broadcasting the coordinator's copy
    #[arg(long)]
    token_chain: bool,
}

impl RunOptions {
    fn loading(&self) -> ParamLoading {
        if self.token_chain {
            ParamLoading::TokenChain
        } else {
            ParamLoading::Broadcast
        }
    }

    fn open_log(&self) -> anyhow::Result<RunLog> {
        match &self.log {
            Some(path) => RunLog::to_file(path, self.log_level)
                .with_context(|| format!("cannot create log file {}", path.display())),
            None => Ok(RunLog::stderr(self.log_level)),
        }
    }
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    options: RunOptions,

    /// Number of ranks
    #[arg(long, default_value_t = 1)]
    np: usize,
}

#[cfg(feature = "mpi")]
#[derive(Args)]
struct MpiArgs {
    #[command(flatten)]
    options: RunOptions,
}

#[derive(Args)]
struct InitArgs {
    /// Container to create
    #[arg(long)]
    out: PathBuf,

    /// Global extents, comma-separated
    #[arg(long, value_delimiter = ',', required = true)]
    dims: Vec<usize>,

    /// Field name; repeat for several fields
    #[arg(long = "field", required = true)]
    fields: Vec<String>,

    /// Mean value
    #[arg(long, default_value_t = 0.5)]
    mean: f64,

    /// Noise half-width
    #[arg(long, default_value_t = 0.01)]
    amplitude: f64,

    /// Generator seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn run_local(args: RunArgs) -> anyhow::Result<()> {
    if args.np == 0 {
        return Err(anyhow!("--np must be at least 1"));
    }
    let log = args.options.open_log()?;
    let source = ParamSource::File(args.options.params.clone());
    let loading = args.options.loading();
    let kernel = args.options.kernel;

    let outcomes = LocalGroup::run(args.np, |comm| {
        Driver::new(&comm, kernel.build(), log.clone())
            .with_param_loading(loading)
            .run(&source)
    })?;
    first_failure(outcomes)
}

/// The root cause of a failed run: the error of the rank that aborted,
/// not the aborts its peers received.
fn first_failure(outcomes: Vec<Result<RunReport, RunError>>) -> anyhow::Result<()> {
    let mut errors: Vec<RunError> = outcomes.into_iter().filter_map(Result::err).collect();
    match errors.iter().position(|e| e.aborted_by().is_none()) {
        Some(i) => Err(errors.swap_remove(i).into()),
        None => match errors.into_iter().next() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        },
    }
}

#[cfg(feature = "mpi")]
fn run_mpi(args: MpiArgs) -> anyhow::Result<()> {
    use strand::comm::{Communicator, MpiComm};

    let comm = MpiComm::init().ok_or_else(|| anyhow!("MPI is already initialized"))?;
    // Only the coordinator writes the run log; other ranks report
    // warnings and errors to stderr.
    let log = if comm.is_coordinator() {
        args.options.open_log()?
    } else {
        RunLog::stderr(Level::WARN)
    };
    let source = ParamSource::File(args.options.params.clone());
    Driver::new(&comm, args.options.kernel.build(), log)
        .with_param_loading(args.options.loading())
        .run(&source)?;
    Ok(())
}

fn init(args: InitArgs) -> anyhow::Result<()> {
    let global = GridDims::new(&args.dims).context("invalid --dims")?;
    let spec = NoiseSpec {
        mean: args.mean,
        amplitude: args.amplitude,
        seed: args.seed,
    };
    write_noise_initial(&args.out, global, &args.fields, &spec)?;
    println!(
        "wrote {} field(s) of {} cells to {}",
        args.fields.len(),
        global,
        args.out.display()
    );
    Ok(())
}

/// Exit status for a failed command: the run's abort code when there
/// is one, otherwise 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<RunError>()
        .map(|e| match e.aborted_by() {
            Some((_, code)) => code,
            None => e.code(),
        })
        .and_then(|code| u8::try_from(code).ok())
        .filter(|&code| code != 0)
        .unwrap_or(1)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => run_local(args),
        #[cfg(feature = "mpi")]
        Commands::RunMpi(args) => run_mpi(args),
        Commands::Init(args) => init(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}
