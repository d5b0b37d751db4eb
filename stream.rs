//! Multi-pass overwrite of a repositionable stream.
//!
//! A [`Stream`] wraps any [`Write`] destination together with the optional
//! capabilities it exposes: durability sync and repositioning. Capabilities
//! are bound once when the stream is built, never probed per pass.
//!
//! [`Overwriter`] fills the same byte range of a stream with fresh random
//! data `passes` times:
//!
//! ```text
//! for each pass:
//!     buffer <- random(length)
//!     write buffer            (abort on error or short write)
//!     sync                    (if supported; abort on error)
//!     seek to offset 0        (mandatory; abort on error)
//! ```
//!
//! Seeking is load-bearing: without it every pass after the first would land
//! past the target range. A stream without the capability is rejected before
//! any byte is written.

use std::io::{self, Seek, SeekFrom, Write};
use tracing::debug;

use crate::config::DEFAULT_PASS_COUNT;
use crate::error::{Result, ShredError};
use crate::random::{EntropySource, RandomBuffer, SystemEntropy};

/// Durability flush for destinations backed by storage.
pub trait Synchronize {
    fn sync(&mut self) -> io::Result<()>;
}

impl Synchronize for std::fs::File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl<T: Synchronize + ?Sized> Synchronize for &mut T {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}

type SyncFn<W> = fn(&mut W) -> io::Result<()>;
type RepositionFn<W> = fn(&mut W, SeekFrom) -> io::Result<u64>;

/// Which optional capabilities a [`Stream`] was bound with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub sync: bool,
    pub reposition: bool,
}

/// A writable destination plus its optional capabilities.
pub struct Stream<W> {
    inner: W,
    sync: Option<SyncFn<W>>,
    reposition: Option<RepositionFn<W>>,
}

impl<W: Write> Stream<W> {
    /// Write-only stream. Cannot be overwritten (no repositioning).
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            sync: None,
            reposition: None,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            sync: self.sync.is_some(),
            reposition: self.reposition.is_some(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Seek> Stream<W> {
    /// Stream that can be repositioned between passes.
    pub fn seekable(inner: W) -> Self {
        Self {
            inner,
            sync: None,
            reposition: Some(<W as Seek>::seek),
        }
    }
}

impl<W: Write + Synchronize> Stream<W> {
    /// Flush every pass to durable storage before repositioning.
    pub fn with_sync(mut self) -> Self {
        self.sync = Some(<W as Synchronize>::sync);
        self
    }
}

/// Reported after each completed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassProgress {
    /// 1-based pass number
    pub pass: usize,
    pub passes: usize,
    pub bytes: u64,
}

/// Drives the multi-pass overwrite protocol.
pub struct Overwriter<E = SystemEntropy> {
    entropy: E,
    passes: usize,
}

impl Overwriter {
    pub fn new(passes: usize) -> Self {
        Self::with_entropy(SystemEntropy, passes)
    }
}

impl Default for Overwriter {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_COUNT)
    }
}

impl<E: EntropySource> Overwriter<E> {
    pub fn with_entropy(entropy: E, passes: usize) -> Self {
        Self { entropy, passes }
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Overwrite the first `length` bytes of `stream` once per pass.
    ///
    /// All-or-nothing: the first failure aborts with the stage that failed.
    /// A zero `length` still runs every pass with empty buffers.
    pub fn overwrite<W: Write>(&self, stream: &mut Stream<W>, length: u64) -> Result<()> {
        self.overwrite_with_progress(stream, length, |_| {})
    }

    /// Like [`Overwriter::overwrite`], calling `on_pass` after each pass
    /// has been written, synced and rewound.
    pub fn overwrite_with_progress<W, F>(
        &self,
        stream: &mut Stream<W>,
        length: u64,
        mut on_pass: F,
    ) -> Result<()>
    where
        W: Write,
        F: FnMut(PassProgress),
    {
        let reposition = stream.reposition.ok_or(ShredError::Unseekable)?;
        let buffer_len =
            usize::try_from(length).map_err(|_| ShredError::TargetTooLarge { length })?;

        for pass in 1..=self.passes {
            let buffer = RandomBuffer::generate(&self.entropy, buffer_len)?;

            stream
                .inner
                .write_all(&buffer)
                .and_then(|_| stream.inner.flush())
                .map_err(|source| ShredError::Write { pass, source })?;
            drop(buffer);

            if let Some(sync) = stream.sync {
                sync(&mut stream.inner).map_err(|source| ShredError::Sync { pass, source })?;
            }

            reposition(&mut stream.inner, SeekFrom::Start(0))
                .map_err(|source| ShredError::Seek { pass, source })?;

            debug!(pass, passes = self.passes, bytes = length, "overwrite pass complete");
            on_pass(PassProgress {
                pass,
                passes: self.passes,
                bytes: length,
            });
        }

        Ok(())
    }
}
