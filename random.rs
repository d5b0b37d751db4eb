//! Cryptographically secure random buffers.
//!
//! [`RandomBuffer`] is the unit of overwrite data: one is generated per pass,
//! written once, and zeroized when dropped. Bytes come from an
//! [`EntropySource`], which in production is the OS CSPRNG via
//! `rand_core::OsRng`.

use rand_core::{OsRng, RngCore};
use std::ops::Deref;
use thiserror::Error;
use zeroize::Zeroize;

/// The entropy collaborator could not supply bytes.
#[derive(Debug, Error)]
pub enum EntropyError {
    #[error("entropy source unavailable: {0}")]
    Unavailable(String),
}

/// Source of cryptographically secure random bytes.
///
/// Implementations must fill the whole buffer or fail; partial or
/// substitute data is never acceptable.
pub trait EntropySource {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// OS-level CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEntropy;

impl EntropySource for SystemEntropy {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| EntropyError::Unavailable(e.to_string()))
    }
}

impl<E: EntropySource + ?Sized> EntropySource for &E {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        (**self).fill_bytes(dest)
    }
}

/// Owned random bytes of an exact length. Zeroized on drop.
pub struct RandomBuffer {
    bytes: Vec<u8>,
}

impl RandomBuffer {
    /// Fill a fresh buffer of `length` bytes from `source`.
    pub fn generate<E: EntropySource + ?Sized>(
        source: &E,
        length: usize,
    ) -> Result<Self, EntropyError> {
        let mut buffer = Self {
            bytes: vec![0u8; length],
        };
        // on failure the partially filled buffer is dropped (and zeroized) here
        source.fill_bytes(&mut buffer.bytes)?;
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Deref for RandomBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for RandomBuffer {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

// Never print the bytes themselves.
impl std::fmt::Debug for RandomBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomBuffer")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Generate `length` random bytes from the system CSPRNG.
pub fn generate_random_bytes(length: usize) -> Result<RandomBuffer, EntropyError> {
    RandomBuffer::generate(&SystemEntropy, length)
}
