//! Binary encode/decode for the checkpoint container.
//!
//! All integers and floats are little-endian. Strings are prefixed with
//! a `u32` byte length. There is no compression and no alignment
//! padding.

use std::io::{self, Read, Write};

use strand_core::{GridDims, MAX_DIMS};

use crate::error::StoreError;
use crate::{FORMAT_VERSION, MAGIC, RECORD_DATASET};

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), StoreError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), StoreError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), StoreError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_length_prefixed_str(w: &mut dyn Write, s: &str) -> Result<(), StoreError> {
    let len = u32::try_from(s.len()).map_err(|_| StoreError::Malformed {
        detail: format!("string of {} bytes exceeds u32 length prefix", s.len()),
    })?;
    write_u32_le(w, len)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

/// Write a run of little-endian f64 values.
pub fn write_f64s_le(w: &mut dyn Write, values: &[f64]) -> Result<(), StoreError> {
    let mut buf = Vec::with_capacity(8 * values.len().min(8192));
    for chunk in values.chunks(8192) {
        buf.clear();
        for v in chunk {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        w.write_all(&buf)?;
    }
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, StoreError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, StoreError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, StoreError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a length-prefixed UTF-8 string.
pub fn read_length_prefixed_str(r: &mut dyn Read) -> Result<String, StoreError> {
    let len = read_u32_le(r)? as usize;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| StoreError::Malformed {
        detail: format!("cannot allocate a {len}-byte string"),
    })?;
    // Grows only as far as the bytes actually present.
    r.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("string of {len} bytes truncated to {}", buf.len()),
        )
        .into());
    }
    String::from_utf8(buf).map_err(|e| StoreError::Malformed {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

/// Read `count` little-endian f64 values.
pub fn read_f64s_le(r: &mut dyn Read, count: usize) -> Result<Vec<f64>, StoreError> {
    let mut out = Vec::new();
    out.try_reserve_exact(count).map_err(|_| StoreError::Malformed {
        detail: format!("cannot allocate {count} values"),
    })?;
    let mut buf = vec![0u8; 8 * count.min(8192)];
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(8192);
        r.read_exact(&mut buf[..8 * n])?;
        out.extend(buf[..8 * n].chunks_exact(8).map(|b| {
            f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        }));
        remaining -= n;
    }
    Ok(out)
}

// ── Extents ─────────────────────────────────────────────────────

fn write_dims(w: &mut dyn Write, dims: &GridDims) -> Result<(), StoreError> {
    write_u8(w, dims.ndim() as u8)?;
    for &n in dims.extent() {
        write_u64_le(w, n as u64)?;
    }
    Ok(())
}

fn read_dims(r: &mut dyn Read) -> Result<GridDims, StoreError> {
    let ndim = read_u8(r)? as usize;
    if ndim == 0 || ndim > MAX_DIMS {
        return Err(StoreError::Malformed {
            detail: format!("{ndim} dimensions, expected 1 to {MAX_DIMS}"),
        });
    }
    let mut extent = [0usize; MAX_DIMS];
    for e in extent.iter_mut().take(ndim) {
        let n = read_u64_le(r)?;
        *e = usize::try_from(n).map_err(|_| StoreError::Malformed {
            detail: format!("extent {n} does not fit in memory"),
        })?;
    }
    Ok(GridDims::new(&extent[..ndim])?)
}

fn dims_len(dims: &GridDims) -> u64 {
    1 + 8 * dims.ndim() as u64
}

// ── Header encode/decode ────────────────────────────────────────

/// Encode the container header: magic, version, and global extents.
pub fn encode_header(w: &mut dyn Write, dims: &GridDims) -> Result<(), StoreError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_dims(w, dims)
}

/// Decode and validate the container header.
pub fn decode_header(r: &mut dyn Read) -> Result<GridDims, StoreError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => StoreError::InvalidMagic,
        _ => StoreError::Io(e),
    })?;
    if magic != MAGIC {
        return Err(StoreError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion { found: version });
    }
    read_dims(r)
}

/// Encoded size of a header for `dims`, in bytes.
pub fn header_len(dims: &GridDims) -> u64 {
    MAGIC.len() as u64 + 1 + dims_len(dims)
}

// ── Record encode/decode ────────────────────────────────────────

/// The fixed part of a dataset record, before its values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordHeader {
    /// Normalized dataset path.
    pub path: String,
    /// Dataset extents.
    pub dims: GridDims,
}

impl RecordHeader {
    /// Encoded size of this header, in bytes.
    pub fn encoded_len(&self) -> u64 {
        1 + 4 + self.path.len() as u64 + dims_len(&self.dims)
    }

    /// Encoded size of the values that follow, in bytes.
    pub fn data_len(&self) -> u64 {
        8 * self.dims.volume() as u64
    }
}

/// Encode one dataset record.
pub fn encode_record(
    w: &mut dyn Write,
    path: &str,
    dims: &GridDims,
    values: &[f64],
) -> Result<(), StoreError> {
    write_u8(w, RECORD_DATASET)?;
    write_length_prefixed_str(w, path)?;
    write_dims(w, dims)?;
    write_f64s_le(w, values)
}

/// Decode the header of the next record.
///
/// Returns `Ok(None)` on clean EOF (no bytes available). A record cut
/// short surfaces as an [`io::ErrorKind::UnexpectedEof`] I/O error.
pub fn decode_record_header(r: &mut dyn Read) -> Result<Option<RecordHeader>, StoreError> {
    let mut kind = [0u8; 1];
    loop {
        match r.read(&mut kind) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StoreError::Io(e)),
        }
    }
    if kind[0] != RECORD_DATASET {
        return Err(StoreError::Malformed {
            detail: format!("unknown record kind {}", kind[0]),
        });
    }
    let path = read_length_prefixed_str(r)?;
    let dims = read_dims(r)?;
    Ok(Some(RecordHeader { path, dims }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(e: &[usize]) -> GridDims {
        GridDims::new(e).unwrap()
    }

    #[test]
    fn header_round_trip_and_length() {
        let d = dims(&[4, 5, 6]);
        let mut buf = Vec::new();
        encode_header(&mut buf, &d).unwrap();
        assert_eq!(buf.len() as u64, header_len(&d));
        assert_eq!(&buf[..4], b"STRD");
        assert_eq!(decode_header(&mut buf.as_slice()).unwrap(), d);
    }

    #[test]
    fn bad_magic_and_version() {
        let mut buf = Vec::new();
        encode_header(&mut buf, &dims(&[2])).unwrap();
        let mut wrong = buf.clone();
        wrong[0] = b'X';
        assert!(matches!(
            decode_header(&mut wrong.as_slice()),
            Err(StoreError::InvalidMagic)
        ));
        let mut newer = buf.clone();
        newer[4] = FORMAT_VERSION + 1;
        assert!(matches!(
            decode_header(&mut newer.as_slice()),
            Err(StoreError::UnsupportedVersion { .. })
        ));
        assert!(matches!(
            decode_header(&mut &b"ST"[..]),
            Err(StoreError::InvalidMagic)
        ));
    }

    #[test]
    fn zero_dimensional_header_is_malformed() {
        let mut buf = MAGIC.to_vec();
        buf.push(FORMAT_VERSION);
        buf.push(0);
        assert!(matches!(
            decode_header(&mut buf.as_slice()),
            Err(StoreError::Malformed { .. })
        ));
    }

    #[test]
    fn record_round_trip() {
        let d = dims(&[3]);
        let mut buf = Vec::new();
        encode_record(&mut buf, "/phi/000000", &d, &[1.5, -0.0, f64::MAX]).unwrap();
        let mut r = buf.as_slice();
        let header = decode_record_header(&mut r).unwrap().unwrap();
        assert_eq!(header.path, "/phi/000000");
        assert_eq!(header.encoded_len() + header.data_len(), buf.len() as u64);
        let values = read_f64s_le(&mut r, 3).unwrap();
        assert_eq!(values[0], 1.5);
        assert!(values[1].is_sign_negative());
        assert_eq!(values[2], f64::MAX);
        assert!(decode_record_header(&mut r).unwrap().is_none());
    }

    #[test]
    fn truncated_record_is_an_eof_error() {
        let mut buf = Vec::new();
        encode_record(&mut buf, "/c", &dims(&[2]), &[0.0, 1.0]).unwrap();
        let mut r = &buf[..3];
        match decode_record_header(&mut r) {
            Err(StoreError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected EOF error, got {other:?}"),
        }
    }

    #[test]
    fn oversized_string_length_is_an_error() {
        let mut buf = u32::MAX.to_le_bytes().to_vec();
        buf.extend_from_slice(b"/phi");
        match read_length_prefixed_str(&mut buf.as_slice()) {
            Err(StoreError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            Err(StoreError::Malformed { .. }) => {}
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_record_kind_is_malformed() {
        assert!(matches!(
            decode_record_header(&mut &[9u8, 0, 0][..]),
            Err(StoreError::Malformed { .. })
        ));
    }

    #[test]
    fn many_values_cross_chunk_boundaries() {
        let values: Vec<f64> = (0..20_000).map(|i| i as f64 / 3.0).collect();
        let mut buf = Vec::new();
        write_f64s_le(&mut buf, &values).unwrap();
        assert_eq!(buf.len(), 8 * values.len());
        assert_eq!(read_f64s_le(&mut buf.as_slice(), values.len()).unwrap(), values);
    }
}
