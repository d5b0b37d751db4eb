//! Filesystem collaborators.
//!
//! The shredder never touches `std::fs` directly; it is handed a
//! [`FileSystem`]. [`OsFs`] is the real filesystem, [`MemoryFs`] keeps files
//! in memory and counts live handles so callers can check none leak.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::stream::Synchronize;

/// An open, read/write file that can be shredded.
pub trait FileHandle: Write + Seek + Synchronize {
    /// Whether [`Synchronize::sync`] reaches durable storage. Handles that
    /// report `false` are bound without the sync capability.
    const DURABLE: bool;

    /// Current size in bytes.
    fn size(&self) -> io::Result<u64>;
}

pub trait FileSystem {
    type File: FileHandle;

    /// Open an existing file for reading and writing. Never creates it.
    fn open_read_write(&self, path: &Path) -> io::Result<Self::File>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    type File = T::File;

    fn open_read_write(&self, path: &Path) -> io::Result<Self::File> {
        (**self).open_read_write(path)
    }
}

/// The operating system's filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl FileSystem for OsFs {
    type File = File;

    fn open_read_write(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new().read(true).write(true).open(path)
    }
}

impl FileHandle for File {
    const DURABLE: bool = true;

    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

type FileTable = HashMap<PathBuf, Vec<u8>>;

/// In-memory filesystem. Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: Arc<Mutex<FileTable>>,
    open_handles: Arc<AtomicUsize>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file.
    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> io::Result<()> {
        self.table()?
            .insert(path.as_ref().to_path_buf(), contents.into());
        Ok(())
    }

    /// Contents of a file, if it exists.
    pub fn read_file(&self, path: impl AsRef<Path>) -> io::Result<Option<Vec<u8>>> {
        Ok(self.table()?.get(path.as_ref()).cloned())
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.table()
            .map(|files| files.contains_key(path.as_ref()))
            .unwrap_or(false)
    }

    /// Number of handles opened through this filesystem and not yet dropped.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    fn table(&self) -> io::Result<MutexGuard<'_, FileTable>> {
        self.files
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory filesystem lock poisoned"))
    }
}

impl FileSystem for MemoryFs {
    type File = MemoryFile;

    fn open_read_write(&self, path: &Path) -> io::Result<MemoryFile> {
        if !self.table()?.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ));
        }
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryFile {
            fs: self.clone(),
            path: path.to_path_buf(),
            pos: 0,
        })
    }
}

/// Handle to a [`MemoryFs`] file.
#[derive(Debug)]
pub struct MemoryFile {
    fs: MemoryFs,
    path: PathBuf,
    pos: u64,
}

impl MemoryFile {
    fn with_contents<T>(&self, f: impl FnOnce(&mut Vec<u8>) -> T) -> io::Result<T> {
        let mut files = self.fs.table()?;
        let contents = files.get_mut(&self.path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} was removed while open", self.path.display()),
            )
        })?;
        Ok(f(contents))
    }
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let out_of_range =
            || io::Error::new(io::ErrorKind::InvalidInput, "write past addressable range");
        let start = usize::try_from(self.pos).map_err(|_| out_of_range())?;
        let end = start.checked_add(buf.len()).ok_or_else(out_of_range)?;
        let next_pos = self
            .pos
            .checked_add(buf.len() as u64)
            .ok_or_else(out_of_range)?;

        self.with_contents(|contents| {
            if contents.len() < end {
                contents.resize(end, 0);
            }
            contents[start..end].copy_from_slice(buf);
        })?;
        self.pos = next_pos;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, offset) = match pos {
            SeekFrom::Start(n) => {
                self.pos = n;
                return Ok(n);
            }
            SeekFrom::End(n) => (self.size()?, n),
            SeekFrom::Current(n) => (self.pos, n),
        };
        let target = base.checked_add_signed(offset).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative or overflowing position")
        })?;
        self.pos = target;
        Ok(target)
    }
}

impl Synchronize for MemoryFile {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl FileHandle for MemoryFile {
    const DURABLE: bool = false;

    fn size(&self) -> io::Result<u64> {
        self.with_contents(|contents| contents.len() as u64)
    }
}

impl Drop for MemoryFile {
    fn drop(&mut self) {
        self.fs.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}
