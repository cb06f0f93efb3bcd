//! Startup collectives: parameters and the initial field table.

use std::path::PathBuf;

use strand_comm::{broadcast_strings, broadcast_u64s, in_rank_order, Communicator, COORDINATOR};
use strand_core::{FieldStack, GridDims, NameIndex, Params};
use strand_store::{CheckpointStore, OpenMode};
use tracing::{debug, info};

use crate::config::{ConfigError, RunConfig};
use crate::error::{RunError, StoreOp};

/// Where a run's parameters come from.
#[derive(Clone, Debug)]
pub enum ParamSource {
    /// A `key=value` parameter file.
    File(PathBuf),
    /// Parameters already in memory.
    Inline(Params),
}

/// How parameters reach every rank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParamLoading {
    /// The coordinator reads the source and broadcasts the result.
    #[default]
    Broadcast,
    /// Every rank reads the source itself, one rank at a time, lowest
    /// rank first.
    TokenChain,
}

fn read_source(source: &ParamSource) -> Result<Params, RunError> {
    match source {
        ParamSource::File(path) => {
            Params::from_file(path).map_err(|e| RunError::Config(ConfigError::Params(e)))
        }
        ParamSource::Inline(params) => Ok(params.clone()),
    }
}

/// Give every rank the same parameters.
///
/// With [`ParamLoading::Broadcast`] only the coordinator touches
/// `source`; other ranks may pass anything.
pub fn load_params<C>(
    comm: &C,
    source: &ParamSource,
    loading: ParamLoading,
) -> Result<Params, RunError>
where
    C: Communicator + ?Sized,
{
    match loading {
        ParamLoading::Broadcast => {
            let mut flat = Vec::new();
            if comm.is_coordinator() {
                let params = read_source(source)?;
                for (k, v) in params.iter() {
                    flat.push(k.to_string());
                    flat.push(v.to_string());
                }
            }
            broadcast_strings(comm, COORDINATOR, &mut flat)?;
            let mut pairs = flat.chunks_exact(2);
            let params = pairs.by_ref().map(|kv| (kv[0].as_str(), kv[1].as_str())).collect();
            if !pairs.remainder().is_empty() {
                return Err(RunError::Comm(strand_comm::CommError::Decode {
                    reason: "parameter table has a key without a value".to_string(),
                }));
            }
            Ok(params)
        }
        ParamLoading::TokenChain => in_rank_order(comm, || read_source(source))?,
    }
}

/// The fields a run evolves, as known to one rank.
#[derive(Debug)]
pub struct InitialState {
    /// Field names, in stack order.
    pub names: NameIndex,
    /// Global grid extents.
    pub global: GridDims,
    /// Full-domain values, one buffer per field; coordinator only.
    pub data: Option<FieldStack>,
}

/// Read the initial-condition container on the coordinator and share
/// its field table and grid extents with every rank.
///
/// The coordinator's global buffer is kept in the returned state and
/// reused for every later gather.
pub fn load_initial<C>(comm: &C, config: &RunConfig) -> Result<InitialState, RunError>
where
    C: Communicator + ?Sized,
{
    let mut names = Vec::new();
    let mut extents = Vec::new();
    let mut data = None;

    if comm.is_coordinator() {
        let path = &config.init_file;
        let mut store = CheckpointStore::open(path, OpenMode::Read)
            .map_err(RunError::store(StoreOp::Open, path))?;
        store
            .check_ndim(config.dimensions)
            .map_err(RunError::store(StoreOp::Read, path))?;
        names = store
            .list("/")
            .map_err(RunError::store(StoreOp::List, path))?;
        let global = *store.global_dims();
        info!(
            file = %path.display(),
            fields = names.len(),
            dims = %global,
            "read initial conditions"
        );

        let mut stack = FieldStack::try_new(names.len(), global.volume())?;
        for (f, name) in names.iter().enumerate() {
            let values = store
                .read_dataset(name)
                .map_err(RunError::store(StoreOp::Read, path))?;
            if values.len() != global.volume() {
                return Err(RunError::Store {
                    op: StoreOp::Read,
                    path: path.display().to_string(),
                    source: strand_store::StoreError::ShapeMismatch {
                        path: name.clone(),
                        expected: global.volume(),
                        found: values.len(),
                    },
                });
            }
            stack.field_mut(f).copy_from_slice(&values);
        }
        store
            .close()
            .map_err(RunError::store(StoreOp::Close, path))?;

        extents = global.extent().iter().map(|&n| n as u64).collect();
        data = Some(stack);
    }

    broadcast_strings(comm, COORDINATOR, &mut names)?;
    broadcast_u64s(comm, COORDINATOR, &mut extents)?;

    let extents: Vec<usize> = extents.into_iter().map(|n| n as usize).collect();
    let global = GridDims::new(&extents).map_err(strand_decomp::DecompError::Dims)?;
    let names = NameIndex::from_strings(&names)?;
    debug!(fields = names.len(), dims = %global, "field table received");
    Ok(InitialState {
        names,
        global,
        data,
    })
}
