//! Byte-range providers backing the automata and grammatical-information readers.
//!
//! Everything above this module only ever asks for `bytes[offset..offset + len]`.

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, info};

use crate::morphy::types::error::{MorphyError, Result};

/// Random-access, read-only view of a dictionary file.
pub trait ByteStore: Send + Sync + fmt::Debug {
    /// Reads exactly `len` bytes starting at `offset`.
    ///
    /// Fails when the range does not lie entirely inside the store.
    fn read(&self, offset: u64, len: u64) -> Result<Cow<'_, [u8]>>;

    /// Total size of the store in bytes.
    fn size(&self) -> u64;

    /// Direct access to the bytes when the store is memory resident.
    fn as_slice(&self) -> Option<&[u8]> {
        None
    }

    /// Returns true if `[offset, offset + len)` lies inside the store.
    fn contains(&self, offset: u64, len: u64) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.size())
    }
}

/// Which [`ByteStore`] implementation the facade opens dictionary files with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageKind {
    /// Seek and read from the file on every access.
    #[default]
    File,
    /// Load the whole file into memory once.
    Mem,
}

impl StorageKind {
    pub fn open(self, path: impl AsRef<Path>) -> Result<Arc<dyn ByteStore>> {
        Ok(match self {
            StorageKind::File => Arc::new(FileStore::open(path)?),
            StorageKind::Mem => Arc::new(MemStore::from_file(path)?),
        })
    }
}

fn out_of_bounds(offset: u64, len: u64, size: u64) -> MorphyError {
    MorphyError::InvalidFormat(format!(
        "Read [{}..{}] is out of bounds for store of size {}",
        offset,
        offset.saturating_add(len),
        size
    ))
}

/// File-backed store; the handle is shared behind a mutex so reads can seek.
pub struct FileStore {
    path: PathBuf,
    file: Mutex<File>,
    size: u64,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening dictionary file: {}", path.display());
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        debug!("{}: {} bytes", path.display(), size);

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            size,
        })
    }
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("size", &self.size)
            .finish()
    }
}

impl ByteStore for FileStore {
    fn read(&self, offset: u64, len: u64) -> Result<Cow<'_, [u8]>> {
        if !self.contains(offset, len) {
            return Err(out_of_bounds(offset, len, self.size));
        }
        let mut file = self.file.lock().map_err(|_| MorphyError::LockPoisoned)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len as usize];
        file.read_exact(&mut buf)?;
        Ok(Cow::Owned(buf))
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// In-memory store.
#[derive(Clone)]
pub struct MemStore {
    data: Vec<u8>,
}

impl MemStore {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading dictionary file into memory: {}", path.display());
        let data = std::fs::read(path)?;
        debug!("{}: {} bytes loaded", path.display(), data.len());
        Ok(Self { data })
    }
}

impl fmt::Debug for MemStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemStore")
            .field("size", &self.data.len())
            .finish()
    }
}

impl ByteStore for MemStore {
    fn read(&self, offset: u64, len: u64) -> Result<Cow<'_, [u8]>> {
        if !self.contains(offset, len) {
            return Err(out_of_bounds(offset, len, self.size()));
        }
        let start = offset as usize;
        Ok(Cow::Borrowed(&self.data[start..start + len as usize]))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn as_slice(&self) -> Option<&[u8]> {
        Some(&self.data)
    }
}
