//! The checkpoint container handle.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use strand_core::GridDims;
use tracing::{debug, warn};

use crate::codec::{
    decode_header, decode_record_header, encode_header, encode_record, header_len, read_f64s_le,
    RecordHeader,
};
use crate::error::StoreError;
use crate::path::{child_of, is_ancestor, normalize_dataset, normalize_group};

/// How to open a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Open an existing container for reading.
    Read,
    /// Create a fresh, empty container, replacing any existing file.
    Create {
        /// Global extents every dataset will have.
        dims: GridDims,
    },
    /// Open an existing container to add datasets.
    ///
    /// The stored extents must equal `dims`.
    Append {
        /// Expected global extents.
        dims: GridDims,
    },
}

#[derive(Clone, Copy, Debug)]
struct DatasetEntry {
    /// File offset of the first value.
    offset: u64,
    dims: GridDims,
}

/// An open checkpoint container.
///
/// One file holding a header with the global extents followed by an
/// append-only sequence of dataset records. The dataset index is built
/// when the file is opened; a record cut short by a crash is ignored
/// on open and cut off before the next append.
///
/// # Examples
///
/// ```no_run
/// use strand_core::GridDims;
/// use strand_store::{checkpoint_path, CheckpointStore, OpenMode};
///
/// let dims = GridDims::new(&[4]).unwrap();
/// let mut store = CheckpointStore::open("run.chk", OpenMode::Create { dims }).unwrap();
/// store.write_dataset(&checkpoint_path("phi", 0), &[0.0; 4]).unwrap();
/// store.close().unwrap();
///
/// let store = CheckpointStore::open("run.chk", OpenMode::Read).unwrap();
/// assert_eq!(store.list("/").unwrap(), vec!["phi"]);
/// ```
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    file: File,
    writable: bool,
    dims: GridDims,
    index: IndexMap<String, DatasetEntry>,
    end: u64,
}

impl CheckpointStore {
    /// Open or create the container at `path`.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let store = match mode {
            OpenMode::Create { dims } => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(&path)?;
                let mut w = BufWriter::new(&file);
                encode_header(&mut w, &dims)?;
                w.flush()?;
                drop(w);
                Self {
                    path,
                    file,
                    writable: true,
                    dims,
                    index: IndexMap::new(),
                    end: header_len(&dims),
                }
            }
            OpenMode::Read => {
                let file = File::open(&path)?;
                Self::scan(path, file, false)?
            }
            OpenMode::Append { dims } => {
                let file = OpenOptions::new().read(true).write(true).open(&path)?;
                let store = Self::scan(path, file, true)?;
                if store.dims != dims {
                    return Err(StoreError::DimsMismatch {
                        stored: store.dims,
                        requested: dims,
                    });
                }
                store
            }
        };
        debug!(
            path = %store.path.display(),
            ?mode,
            datasets = store.index.len(),
            "checkpoint container open"
        );
        Ok(store)
    }

    fn scan(path: PathBuf, file: File, writable: bool) -> Result<Self, StoreError> {
        let file_len = file.metadata()?.len();
        let mut r = BufReader::new(&file);
        let dims = decode_header(&mut r)?;
        let mut pos = header_len(&dims);
        let mut index = IndexMap::new();

        loop {
            let header = match decode_record_header(&mut r) {
                Ok(Some(h)) => h,
                Ok(None) => break,
                Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(
                        path = %path.display(),
                        offset = pos,
                        "ignoring truncated record header at end of container"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            let offset = pos + header.encoded_len();
            let next = offset + header.data_len();
            if next > file_len {
                warn!(
                    path = %path.display(),
                    dataset = %header.path,
                    offset = pos,
                    "ignoring truncated dataset at end of container"
                );
                break;
            }
            if index.contains_key(&header.path) {
                return Err(StoreError::Malformed {
                    detail: format!("dataset '{}' stored twice", header.path),
                });
            }
            r.seek_relative(header.data_len() as i64)?;
            index.insert(
                header.path,
                DatasetEntry {
                    offset,
                    dims: header.dims,
                },
            );
            pos = next;
        }
        drop(r);

        if writable && pos < file_len {
            file.set_len(pos)?;
        }
        Ok(Self {
            path,
            file,
            writable,
            dims,
            index,
            end: pos,
        })
    }

    /// File system path of the container.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Global extents shared by every dataset.
    pub fn global_dims(&self) -> &GridDims {
        &self.dims
    }

    /// Fail unless the stored grid has `ndim` axes.
    pub fn check_ndim(&self, ndim: usize) -> Result<(), StoreError> {
        if self.dims.ndim() == ndim {
            Ok(())
        } else {
            Err(StoreError::DimensionalityMismatch {
                stored: self.dims.ndim(),
                expected: ndim,
            })
        }
    }

    /// Number of datasets.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the container holds no datasets.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether a dataset exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        normalize_dataset(path).is_ok_and(|p| self.index.contains_key(&p))
    }

    /// Names directly below `group`, in first-written order.
    ///
    /// Each name is a dataset or a subgroup. Listing the root of an
    /// empty container yields nothing.
    pub fn list(&self, group: &str) -> Result<Vec<String>, StoreError> {
        let group = normalize_group(group)?;
        if self.index.contains_key(&group) {
            return Err(StoreError::NotAGroup { path: group });
        }
        let mut names: Vec<String> = Vec::new();
        for path in self.index.keys() {
            if let Some(child) = child_of(&group, path) {
                if !names.iter().any(|n| n == child) {
                    names.push(child.to_string());
                }
            }
        }
        if names.is_empty() && group != "/" {
            return Err(StoreError::GroupNotFound { path: group });
        }
        Ok(names)
    }

    /// Read the dataset at `path`.
    pub fn read_dataset(&mut self, path: &str) -> Result<Vec<f64>, StoreError> {
        let path = normalize_dataset(path)?;
        let entry = *self
            .index
            .get(&path)
            .ok_or_else(|| StoreError::NotFound { path: path.clone() })?;
        if entry.dims.ndim() != self.dims.ndim() {
            return Err(StoreError::DimensionalityMismatch {
                stored: entry.dims.ndim(),
                expected: self.dims.ndim(),
            });
        }
        if entry.dims != self.dims {
            return Err(StoreError::ShapeMismatch {
                path,
                expected: self.dims.volume(),
                found: entry.dims.volume(),
            });
        }
        self.file.seek(SeekFrom::Start(entry.offset))?;
        let mut r = BufReader::new(&self.file);
        read_f64s_le(&mut r, entry.dims.volume())
    }

    /// Append a dataset at `path`.
    ///
    /// `values` must hold exactly one value per global cell. Existing
    /// datasets are never replaced, and a dataset cannot sit where a
    /// group is or below another dataset.
    pub fn write_dataset(&mut self, path: &str, values: &[f64]) -> Result<(), StoreError> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        let path = normalize_dataset(path)?;
        if self.index.contains_key(&path) {
            return Err(StoreError::DatasetExists { path });
        }
        if let Some(existing) = self
            .index
            .keys()
            .find(|e| is_ancestor(e, &path) || is_ancestor(&path, e))
        {
            return Err(StoreError::PathConflict {
                existing: existing.clone(),
                path,
            });
        }
        if values.len() != self.dims.volume() {
            return Err(StoreError::ShapeMismatch {
                path,
                expected: self.dims.volume(),
                found: values.len(),
            });
        }

        self.file.seek(SeekFrom::Start(self.end))?;
        let mut w = BufWriter::new(&self.file);
        encode_record(&mut w, &path, &self.dims, values)?;
        w.flush()?;
        drop(w);

        let header = RecordHeader {
            path,
            dims: self.dims,
        };
        let offset = self.end + header.encoded_len();
        self.end = offset + header.data_len();
        debug!(dataset = %header.path, values = values.len(), "dataset written");
        self.index.insert(
            header.path,
            DatasetEntry {
                offset,
                dims: header.dims,
            },
        );
        Ok(())
    }

    /// Flush and release the container.
    pub fn close(self) -> Result<(), StoreError> {
        if self.writable {
            self.file.sync_all()?;
        }
        debug!(path = %self.path.display(), "checkpoint container closed");
        Ok(())
    }
}
