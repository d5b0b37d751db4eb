//! File-level shredding.
//!
//! [`Shredder`] opens a file read/write, takes its length once, binds the
//! handle as a seekable (and, for durable handles, syncing) [`Stream`] and
//! runs the [`Overwriter`] across the full length. The handle is owned by
//! the call and closed on every exit path. The file is never truncated,
//! renamed or deleted.

use std::path::Path;
use tracing::{error, info};

use crate::config::{Config, DEFAULT_PASS_COUNT};
use crate::error::{Result, ShredError};
use crate::fs::{FileHandle, FileSystem, OsFs};
use crate::random::{EntropySource, SystemEntropy};
use crate::stream::{Overwriter, PassProgress, Stream};

pub struct Shredder<F = OsFs, E = SystemEntropy> {
    fs: F,
    overwriter: Overwriter<E>,
}

impl Shredder {
    /// Shredder on the real filesystem with system entropy.
    pub fn new(passes: usize) -> Self {
        Self::with_parts(OsFs, Overwriter::new(passes))
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.pass_count)
    }
}

impl Default for Shredder {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_COUNT)
    }
}

impl<F: FileSystem, E: EntropySource> Shredder<F, E> {
    pub fn with_parts(fs: F, overwriter: Overwriter<E>) -> Self {
        Self { fs, overwriter }
    }

    pub fn passes(&self) -> usize {
        self.overwriter.passes()
    }

    /// Overwrite the contents of `path` in place with random data.
    pub fn shred(&self, path: impl AsRef<Path>) -> Result<()> {
        self.shred_with_progress(path, |_| {})
    }

    /// Like [`Shredder::shred`], reporting each completed pass.
    pub fn shred_with_progress<P, C>(&self, path: P, on_pass: C) -> Result<()>
    where
        P: AsRef<Path>,
        C: FnMut(PassProgress),
    {
        let path = path.as_ref();
        info!(path = %path.display(), passes = self.passes(), "shredding file");

        match self.shred_file(path, on_pass) {
            Ok(bytes) => {
                info!(path = %path.display(), bytes, passes = self.passes(), "file shredded");
                Ok(())
            }
            Err(e) => {
                error!(path = %path.display(), stage = e.stage(), error = %e, "shred aborted");
                Err(e)
            }
        }
    }

    fn shred_file<C: FnMut(PassProgress)>(&self, path: &Path, on_pass: C) -> Result<u64> {
        let file = self
            .fs
            .open_read_write(path)
            .map_err(|e| ShredError::open(path, e))?;

        // From here the handle is owned by `file`/`stream` and closed on drop.
        let length = file.size().map_err(ShredError::Stat)?;
        let mut stream = bind_stream(file);

        self.overwriter
            .overwrite_with_progress(&mut stream, length, on_pass)?;
        Ok(length)
    }
}

fn bind_stream<H: FileHandle>(file: H) -> Stream<H> {
    let stream = Stream::seekable(file);
    if H::DURABLE {
        stream.with_sync()
    } else {
        stream
    }
}

/// Shred `path` on the real filesystem with the default pass count.
pub fn shred(path: impl AsRef<Path>) -> Result<()> {
    Shredder::default().shred(path)
}
