use std::collections::HashSet;

use rand::Rng;

use crate::error::LedgerError;
use crate::fortune::FortuneId;

/// Random bytes per token; 4 bytes gives the familiar 8-character IDs.
pub const DEFAULT_TOKEN_BYTES: usize = 4;

/// Hands out random hex tokens that are unique within the current pool.
///
/// Tokens are sampled until one misses the existing set. The only way to fail
/// is a pool that already holds every possible token.
#[derive(Debug, Clone, Copy)]
pub struct TokenAllocator {
    token_bytes: usize,
}

impl TokenAllocator {
    pub fn new(token_bytes: usize) -> Self {
        Self {
            token_bytes: token_bytes.clamp(1, 16),
        }
    }

    /// Number of distinct tokens, saturating at `u128::MAX`.
    pub fn capacity(&self) -> u128 {
        1u128.checked_shl(8 * self.token_bytes as u32).unwrap_or(u128::MAX)
    }

    pub fn allocate<R: Rng + ?Sized>(
        &self,
        existing: &HashSet<&FortuneId>,
        rng: &mut R,
    ) -> Result<FortuneId, LedgerError> {
        if existing.len() as u128 >= self.capacity() {
            return Err(LedgerError::AllocationExhausted);
        }
        let mut buf = vec![0u8; self.token_bytes];
        loop {
            rng.fill(buf.as_mut_slice());
            let candidate = FortuneId::from_token(hex::encode(&buf));
            if !existing.contains(&candidate) {
                return Ok(candidate);
            }
        }
    }
}

impl Default for TokenAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_BYTES)
    }
}
