//! Small collectives built on the [`Communicator`] primitives.

use crate::communicator::{tags, Communicator};
use crate::error::CommError;

/// Broadcast a list of integers from `root`.
///
/// On non-root ranks `values` is replaced by the root's list.
pub fn broadcast_u64s<C>(comm: &C, root: usize, values: &mut Vec<u64>) -> Result<(), CommError>
where
    C: Communicator + ?Sized,
{
    let mut bytes = if comm.rank() == root {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    } else {
        Vec::new()
    };
    comm.broadcast_bytes(root, &mut bytes)?;
    if comm.rank() != root {
        if bytes.len() % 8 != 0 {
            return Err(CommError::Decode {
                reason: format!("{} bytes is not a whole number of u64 values", bytes.len()),
            });
        }
        *values = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut le = [0u8; 8];
                le.copy_from_slice(chunk);
                u64::from_le_bytes(le)
            })
            .collect();
    }
    Ok(())
}

/// Broadcast a list of strings from `root`.
///
/// Each string is sent as a little-endian `u32` byte length followed by
/// its UTF-8 bytes. On non-root ranks `strings` is replaced.
pub fn broadcast_strings<C>(
    comm: &C,
    root: usize,
    strings: &mut Vec<String>,
) -> Result<(), CommError>
where
    C: Communicator + ?Sized,
{
    let mut bytes = Vec::new();
    if comm.rank() == root {
        for s in strings.iter() {
            let len = u32::try_from(s.len()).map_err(|_| CommError::Decode {
                reason: format!("string of {} bytes is too long to broadcast", s.len()),
            })?;
            bytes.extend_from_slice(&len.to_le_bytes());
            bytes.extend_from_slice(s.as_bytes());
        }
    }
    comm.broadcast_bytes(root, &mut bytes)?;
    if comm.rank() != root {
        *strings = decode_strings(&bytes)?;
    }
    Ok(())
}

fn decode_strings(mut bytes: &[u8]) -> Result<Vec<String>, CommError> {
    let mut out = Vec::new();
    while !bytes.is_empty() {
        if bytes.len() < 4 {
            return Err(CommError::Decode {
                reason: "truncated string length".to_string(),
            });
        }
        let (len, rest) = bytes.split_at(4);
        let len = u32::from_le_bytes([len[0], len[1], len[2], len[3]]) as usize;
        if rest.len() < len {
            return Err(CommError::Decode {
                reason: format!("string needs {len} bytes, {} remain", rest.len()),
            });
        }
        let (body, rest) = rest.split_at(len);
        let s = std::str::from_utf8(body).map_err(|e| CommError::Decode {
            reason: e.to_string(),
        })?;
        out.push(s.to_string());
        bytes = rest;
    }
    Ok(out)
}

/// Run `f` on every rank in turn, lowest rank first.
///
/// Rank `r` waits for a token from rank `r - 1`, runs `f`, then passes
/// the token to rank `r + 1`. The token is forwarded whatever `f`
/// returns, so a failure inside `f` never strands later ranks.
pub fn in_rank_order<C, T, F>(comm: &C, f: F) -> Result<T, CommError>
where
    C: Communicator + ?Sized,
    F: FnOnce() -> T,
{
    let rank = comm.rank();
    if rank > 0 {
        comm.recv(rank - 1, tags::HANDOFF, &mut [])?;
    }
    let out = f();
    if rank + 1 < comm.size() {
        comm.send(rank + 1, tags::HANDOFF, &[])?;
    }
    Ok(out)
}
