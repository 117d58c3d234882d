//! In-memory runtime for tests.
//!
//! Files live in a map with explicit modification times, and every read is
//! counted so tests can assert that an unchanged file was not read again.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::runtime::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    modified: u64,
}

/// Runtime backed by an in-memory file map.
///
/// Directories are implicit: a path is a directory when some file lives below it.
#[derive(Debug)]
pub struct MemoryRuntime {
    files: RwLock<FxHashMap<PathBuf, MemoryFile>>,
    reads: Mutex<FxHashMap<PathBuf, usize>>,
    clock: AtomicU64,
    cwd: PathBuf,
}

impl MemoryRuntime {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            files: RwLock::new(FxHashMap::default()),
            reads: Mutex::new(FxHashMap::default()),
            clock: AtomicU64::new(1_000),
            cwd: cwd.into(),
        }
    }

    /// Add a file with a fresh modification time.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let modified = self.tick();
        self.add_file_with_mtime(path, content, modified);
    }

    /// Builder-style variant of [`MemoryRuntime::add_file`].
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn add_file_with_mtime(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        modified: u64,
    ) {
        let path = self.normalize(path.as_ref());
        self.files.write().insert(
            path,
            MemoryFile {
                content: content.into(),
                modified,
            },
        );
    }

    /// Bump the modification time of an existing file without changing it.
    pub fn touch(&self, path: impl AsRef<Path>) {
        let modified = self.tick();
        let path = self.normalize(path.as_ref());
        if let Some(file) = self.files.write().get_mut(&path) {
            file.modified = modified;
        }
    }

    pub fn mtime(&self, path: impl AsRef<Path>) -> Option<u64> {
        let path = self.normalize(path.as_ref());
        self.files.read().get(&path).map(|file| file.modified)
    }

    /// How many times `path` has been read.
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        let path = self.normalize(path.as_ref());
        self.reads.lock().get(&path).copied().unwrap_or(0)
    }

    /// Text content of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = self.normalize(path.as_ref());
        self.files
            .read()
            .get(&path)
            .map(|file| String::from_utf8_lossy(&file.content).into_owned())
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn normalize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.cwd.join(path).clean()
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .read()
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

#[async_trait]
impl Runtime for MemoryRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let path = self.normalize(path);
        let content = self
            .files
            .read()
            .get(&path)
            .map(|file| file.content.clone())
            .ok_or_else(|| RuntimeError::FileNotFound(path.clone()))?;

        *self.reads.lock().entry(path).or_insert(0) += 1;
        Ok(content)
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        self.add_file(path, content.to_vec());
        Ok(())
    }

    async fn metadata(&self, path: &Path) -> RuntimeResult<FileMetadata> {
        let path = self.normalize(path);
        if let Some(file) = self.files.read().get(&path) {
            return Ok(FileMetadata {
                size: file.content.len() as u64,
                is_dir: false,
                is_file: true,
                modified: Some(file.modified),
            });
        }

        if self.is_dir(&path) {
            return Ok(FileMetadata {
                size: 0,
                is_dir: true,
                is_file: false,
                modified: None,
            });
        }

        Err(RuntimeError::FileNotFound(path))
    }

    fn exists(&self, path: &Path) -> bool {
        let path = self.normalize(path);
        self.files.read().contains_key(&path) || self.is_dir(&path)
    }

    async fn create_dir(&self, _path: &Path, _recursive: bool) -> RuntimeResult<()> {
        Ok(())
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.cwd.clone())
    }
}
