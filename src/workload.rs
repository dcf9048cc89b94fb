//! Synthetic request traces.

use crate::{config::WORD_BYTES, error::ConfigError, trace::Request};

/// Access pattern of a naive `n x n` matrix multiply `C = A * B`.
///
/// A, B and C are stored row-major and back to back starting at `base`. For
/// every element of C the trace writes 0, then for each `k` reads `A[i][k]`
/// and `B[k][j]` and writes the running sum. Returns the trace and C.
///
/// All three matrices must fit in the 32-bit address space; anything larger is rejected
/// with [`ConfigError::WorkloadTooLarge`].
pub fn matrix_multiplication(
    a: &[u32],
    b: &[u32],
    n: usize,
    base: u32,
) -> Result<(Vec<Request>, Vec<u32>), ConfigError> {
    let too_large = || ConfigError::WorkloadTooLarge { n, base };
    let elems = n.checked_mul(n).ok_or_else(too_large)?;
    for m in [a, b] {
        if m.len() != elems {
            return Err(ConfigError::MatrixShape { n, len: m.len() });
        }
    }

    // Byte span of A, B and C together.
    let span = elems
        .checked_mul(3)
        .and_then(|words| u32::try_from(words).ok())
        .and_then(|words| words.checked_mul(WORD_BYTES))
        .ok_or_else(too_large)?;
    base.checked_add(span).ok_or_else(too_large)?;
    let len = n
        .checked_mul(3)
        .and_then(|per_k| per_k.checked_add(1))
        .and_then(|per_elem| per_elem.checked_mul(elems))
        .ok_or_else(too_large)?;

    // Cannot overflow: every offset is below `span`.
    let addr_of = |matrix: usize, idx: usize| base + ((matrix * elems + idx) as u32) * WORD_BYTES;
    let mut c = vec![0u32; elems];
    let mut requests = Vec::with_capacity(len);

    for i in 0..n {
        for j in 0..n {
            let c_addr = addr_of(2, i * n + j);
            requests.push(Request::write(c_addr, 0));
            for k in 0..n {
                requests.push(Request::read(addr_of(0, i * n + k)));
                requests.push(Request::read(addr_of(1, k * n + j)));
                c[i * n + j] = c[i * n + j].wrapping_add(a[i * n + k].wrapping_mul(b[k * n + j]));
                requests.push(Request::write(c_addr, c[i * n + j]));
            }
        }
    }
    Ok((requests, c))
}

/// Reproducible stream of word-aligned requests below `limit`.
pub fn random(count: usize, limit: u32, write_ratio: f64, seed: u64) -> Vec<Request> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let words = (limit / WORD_BYTES).max(1);
    (0..count)
        .map(|_| {
            let address = rng.u32(0..words) * WORD_BYTES;
            if rng.f64() < write_ratio {
                Request::write(address, rng.u32(..))
            } else {
                Request::read(address)
            }
        })
        .collect()
}
