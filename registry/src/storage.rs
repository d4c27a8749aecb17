//! Durable storage backends for the save document.

use std::{
    cell::RefCell,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::error::PersistenceError;

/// File name used for the save document inside the application data directory.
pub const SAVE_FILE_NAME: &str = "SaveData.json";

/// Medium that holds the serialized save document.
pub trait DocumentStorage {
    /// Reads the stored document, returning `None` when nothing was saved yet.
    fn read(&self) -> Result<Option<String>, PersistenceError>;

    /// Replaces the stored document with `contents`.
    fn write(&mut self, contents: &str) -> Result<(), PersistenceError>;

    /// Human-readable description of where the document lives.
    fn describe(&self) -> String;
}

/// JSON file on the local filesystem, replaced atomically on every write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    /// Creates a backend that stores the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temporary_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_atomically(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temporary = self.temporary_path();
        let mut file = File::create(&temporary)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temporary, &self.path)
    }
}

impl DocumentStorage for JsonFile {
    fn read(&self) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(PersistenceError::io(self.describe(), error)),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), PersistenceError> {
        self.write_atomically(contents).map_err(|error| {
            let _ = fs::remove_file(self.temporary_path());
            PersistenceError::io(self.describe(), error)
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    contents: Option<String>,
    read_only: bool,
    writes: usize,
}

/// In-memory backend whose clones share one buffer.
///
/// Handy for dry runs and for observing what the registry persisted.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStorage {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that already holds `contents`.
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.state.borrow_mut().contents = Some(contents.into());
        storage
    }

    /// Current stored document, if any.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.state.borrow().contents.clone()
    }

    /// Makes subsequent writes fail as if the medium were unwritable.
    pub fn set_read_only(&self, read_only: bool) {
        self.state.borrow_mut().read_only = read_only;
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }
}

impl DocumentStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, PersistenceError> {
        Ok(self.state.borrow().contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), PersistenceError> {
        let mut state = self.state.borrow_mut();
        if state.read_only {
            return Err(PersistenceError::io(
                "memory",
                io::Error::new(io::ErrorKind::PermissionDenied, "storage is read-only"),
            ));
        }
        state.contents = Some(contents.to_owned());
        state.writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_owned()
    }
}
