use anyhow::Result;
use std::fs;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::TempDir;

use shredder::{
    config,
    fs::{FileHandle, FileSystem, MemoryFile, MemoryFs, OsFs},
    random::{EntropyError, EntropySource},
    stream::{Overwriter, Stream, Synchronize},
    ShredError, Shredder,
};

const CONTENT: &[u8] = b"Some bytes that need replacing";

/// Helper to create a temp dir holding one file with known content
fn setup_test_file(content: &[u8]) -> Result<(TempDir, std::path::PathBuf)> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("secret.txt");
    fs::write(&path, content)?;
    Ok((tmp, path))
}

#[test]
fn shred_overwrites_file_on_disk() -> Result<()> {
    let (_tmp, path) = setup_test_file(CONTENT)?;

    Shredder::default().shred(&path)?;

    let after = fs::read(&path)?;
    assert_eq!(after.len(), CONTENT.len());
    assert_ne!(after, CONTENT);
    Ok(())
}

#[test]
fn shred_free_function_uses_default_passes() -> Result<()> {
    let (_tmp, path) = setup_test_file(CONTENT)?;

    shredder::shred(&path)?;

    assert_ne!(fs::read(&path)?, CONTENT);
    Ok(())
}

#[test]
fn shred_twice_randomizes_independently() -> Result<()> {
    let (_tmp, path) = setup_test_file(CONTENT)?;
    let shredder = Shredder::new(2);

    shredder.shred(&path)?;
    let first = fs::read(&path)?;
    shredder.shred(&path)?;
    let second = fs::read(&path)?;

    assert_eq!(first.len(), CONTENT.len());
    assert_eq!(second.len(), CONTENT.len());
    assert_ne!(first, CONTENT);
    assert_ne!(second, first);
    Ok(())
}

#[test]
fn shred_large_file_keeps_size() -> Result<()> {
    let original = vec![0x42u8; 3 * 1024 * 1024 + 17];
    let (_tmp, path) = setup_test_file(&original)?;

    Shredder::new(1).shred(&path)?;

    let after = fs::read(&path)?;
    assert_eq!(after.len(), original.len());
    // a run of 4 KiB of the original byte would be an astronomically unlikely draw
    assert!(after.windows(4096).all(|w| w.iter().any(|&b| b != 0x42)));
    Ok(())
}

#[test]
fn shred_empty_file_succeeds() -> Result<()> {
    let (_tmp, path) = setup_test_file(b"")?;

    Shredder::default().shred(&path)?;

    assert_eq!(fs::metadata(&path)?.len(), 0);
    Ok(())
}

#[test]
fn shred_missing_file_fails_without_creating_it() -> Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("nonexistent_file.txt");

    let err = Shredder::default().shred(&path).unwrap_err();

    assert!(matches!(err, ShredError::Open { .. }));
    assert!(err.to_string().contains("nonexistent_file.txt"));
    assert!(!path.exists());
    Ok(())
}

#[test]
fn shred_directory_fails() -> Result<()> {
    let tmp = TempDir::new()?;

    let err = Shredder::default().shred(tmp.path()).unwrap_err();

    assert!(matches!(err, ShredError::Open { .. }));
    Ok(())
}

#[test]
fn overwrite_std_file_stream() -> Result<()> {
    let (_tmp, path) = setup_test_file(CONTENT)?;
    let file = OsFs.open_read_write(&path)?;
    let length = file.size()?;

    let mut stream = Stream::seekable(file).with_sync();
    let caps = stream.capabilities();
    assert!(caps.sync && caps.reposition);

    Overwriter::new(config::DEFAULT_PASS_COUNT).overwrite(&mut stream, length)?;

    assert_eq!(stream.get_mut().stream_position()?, 0);
    drop(stream);
    let after = fs::read(&path)?;
    assert_eq!(after.len(), CONTENT.len());
    assert_ne!(after, CONTENT);
    Ok(())
}

#[test]
fn config_file_drives_pass_count() -> Result<()> {
    let tmp = TempDir::new()?;
    let cfg_path = tmp.path().join("shredder.json");
    fs::write(&cfg_path, r#"{ "pass_count": 5 }"#)?;

    let cfg = config::Config::load(&cfg_path)?;
    let shredder = Shredder::from_config(&cfg);
    assert_eq!(shredder.passes(), 5);

    let path = tmp.path().join("data.bin");
    fs::write(&path, CONTENT)?;
    let mut passes = 0;
    shredder.shred_with_progress(&path, |_| passes += 1)?;
    assert_eq!(passes, 5);
    Ok(())
}

#[test]
fn config_with_zero_passes_is_rejected() -> Result<()> {
    let tmp = TempDir::new()?;
    let cfg_path = tmp.path().join("shredder.json");
    fs::write(&cfg_path, r#"{ "pass_count": 0 }"#)?;

    assert!(config::Config::load(&cfg_path).is_err());
    Ok(())
}

// Fault injection

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Open,
    Stat,
    Write,
    Sync,
    Seek,
}

/// MemoryFs that fails one stage on demand
struct FaultyFs {
    inner: MemoryFs,
    fault: Fault,
}

struct FaultyFile {
    inner: MemoryFile,
    fault: Fault,
}

fn injected(stage: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("Some awful {} error", stage))
}

impl FileSystem for FaultyFs {
    type File = FaultyFile;

    fn open_read_write(&self, path: &Path) -> io::Result<FaultyFile> {
        if self.fault == Fault::Open {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        Ok(FaultyFile {
            inner: self.inner.open_read_write(path)?,
            fault: self.fault,
        })
    }
}

impl Write for FaultyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fault == Fault::Write {
            return Err(injected("write"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Seek for FaultyFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if self.fault == Fault::Seek {
            return Err(injected("seek"));
        }
        self.inner.seek(pos)
    }
}

impl Synchronize for FaultyFile {
    fn sync(&mut self) -> io::Result<()> {
        if self.fault == Fault::Sync {
            return Err(injected("sync"));
        }
        Ok(())
    }
}

impl FileHandle for FaultyFile {
    const DURABLE: bool = true;

    fn size(&self) -> io::Result<u64> {
        if self.fault == Fault::Stat {
            return Err(injected("stat"));
        }
        self.inner.size()
    }
}

fn shred_with_fault(fault: Fault) -> (ShredError, MemoryFs) {
    let mem = MemoryFs::new();
    mem.write_file("test.txt", CONTENT).expect("seed file");

    let fs = FaultyFs {
        inner: mem.clone(),
        fault,
    };
    let err = Shredder::with_parts(fs, Overwriter::new(3))
        .shred("test.txt")
        .expect_err("injected fault must abort the shred");
    (err, mem)
}

#[test]
fn open_failure_aborts() {
    let (err, mem) = shred_with_fault(Fault::Open);
    assert!(matches!(err, ShredError::Open { .. }));
    assert_eq!(err.stage(), "open");
    assert_eq!(mem.read_file("test.txt").unwrap().unwrap(), CONTENT);
    assert_eq!(mem.open_handles(), 0);
}

#[test]
fn stat_failure_aborts_and_closes_handle() {
    let (err, mem) = shred_with_fault(Fault::Stat);
    assert!(matches!(err, ShredError::Stat(_)));
    assert_eq!(mem.read_file("test.txt").unwrap().unwrap(), CONTENT);
    assert_eq!(mem.open_handles(), 0);
}

#[test]
fn write_failure_aborts_and_closes_handle() {
    let (err, mem) = shred_with_fault(Fault::Write);
    assert!(matches!(err, ShredError::Write { pass: 1, .. }));
    assert!(err.to_string().contains("Some awful write error"));
    assert_eq!(mem.open_handles(), 0);
}

#[test]
fn sync_failure_aborts_and_closes_handle() {
    let (err, mem) = shred_with_fault(Fault::Sync);
    assert!(matches!(err, ShredError::Sync { pass: 1, .. }));
    assert_eq!(mem.open_handles(), 0);
}

#[test]
fn seek_failure_aborts_and_closes_handle() {
    let (err, mem) = shred_with_fault(Fault::Seek);
    assert!(matches!(err, ShredError::Seek { pass: 1, .. }));
    assert_eq!(mem.open_handles(), 0);
}

struct ExhaustedEntropy;

impl EntropySource for ExhaustedEntropy {
    fn fill_bytes(&self, _dest: &mut [u8]) -> std::result::Result<(), EntropyError> {
        Err(EntropyError::Unavailable("entropy pool exhausted".into()))
    }
}

#[test]
fn entropy_failure_aborts_and_closes_handle() {
    let mem = MemoryFs::new();
    mem.write_file("test.txt", CONTENT).unwrap();

    let err = Shredder::with_parts(&mem, Overwriter::with_entropy(ExhaustedEntropy, 3))
        .shred("test.txt")
        .unwrap_err();

    assert!(matches!(err, ShredError::Entropy(_)));
    assert!(err.to_string().contains("entropy pool exhausted"));
    assert_eq!(mem.read_file("test.txt").unwrap().unwrap(), CONTENT);
    assert_eq!(mem.open_handles(), 0);
}

#[test]
fn memory_fs_shred_twice() {
    let mem = MemoryFs::new();
    mem.write_file("test.txt", CONTENT).unwrap();
    let shredder = Shredder::with_parts(&mem, Overwriter::default());

    shredder.shred("test.txt").unwrap();
    let first = mem.read_file("test.txt").unwrap().unwrap();
    shredder.shred("test.txt").unwrap();
    let second = mem.read_file("test.txt").unwrap().unwrap();

    assert_eq!(first.len(), CONTENT.len());
    assert_eq!(second.len(), CONTENT.len());
    assert_ne!(first, CONTENT);
    assert_ne!(first, second);
    assert_eq!(mem.open_handles(), 0);
}

#[tokio::test]
async fn test_concurrent_shreds_of_distinct_files() -> Result<()> {
    let tmp = TempDir::new()?;
    let shredder = std::sync::Arc::new(Shredder::default());

    let mut handles = Vec::new();
    for i in 0..5 {
        let path = tmp.path().join(format!("concurrent_{}.txt", i));
        fs::write(&path, format!("content for file {}", i))?;

        let worker = shredder.clone();
        handles.push((
            i,
            path.clone(),
            tokio::task::spawn_blocking(move || worker.shred(&path)),
        ));
    }

    for (i, path, handle) in handles {
        handle.await??;
        let expected = format!("content for file {}", i);
        let after = fs::read(&path)?;
        assert_eq!(after.len(), expected.len());
        assert_ne!(after, expected.as_bytes());
    }

    Ok(())
}
