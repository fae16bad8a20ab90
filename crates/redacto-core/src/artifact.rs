//! Artifact lifecycle management
//!
//! An artifact is a decoded document held so a viewer can render it or the
//! operator can download it. The manager owns creation and release of
//! artifact references and keeps at most one alive: installing a new
//! artifact stores it first and only then releases the previous one, so a
//! failed install leaves the previous artifact in place.
//!
//! Where the bytes live is delegated to an [`ArtifactBackend`]:
//! - [`MemoryBackend`] keeps them in memory behind a `blob:` style locator
//! - [`TempDirBackend`] writes each artifact to a private temporary
//!   directory so an external PDF viewer can open it by path

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use tracing::debug;

use crate::document::PDF_CONTENT_TYPE;
use crate::error::RedactError;
use crate::transit;

/// What an artifact is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactRole {
    /// Interim document with visual markers over each detection
    Preview,
    /// Fully sanitized, metadata-stripped document
    Final,
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRole::Preview => write!(f, "preview"),
            ArtifactRole::Final => write!(f, "final"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(u64);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live reference to an installed artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub id: ArtifactId,
    pub role: ArtifactRole,
    pub content_type: &'static str,
    /// Where a viewer can find the bytes (`blob:` URL or file path)
    pub locator: String,
    pub size_bytes: usize,
}

/// Storage for artifact bytes.
///
/// Implementations only store and release; deciding when to swap belongs
/// to [`ArtifactManager`].
pub trait ArtifactBackend: Send {
    /// Store `bytes` under `id` and return a locator for it
    fn create(&mut self, id: ArtifactId, role: ArtifactRole, bytes: Vec<u8>)
        -> Result<String, RedactError>;

    /// Release `id`. Returns false if nothing was stored under it.
    fn release(&mut self, id: ArtifactId) -> bool;

    fn read(&self, id: ArtifactId) -> Result<Arc<[u8]>, RedactError>;

    /// Number of artifacts currently held
    fn live_count(&self) -> usize;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    blobs: HashMap<ArtifactId, Arc<[u8]>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactBackend for MemoryBackend {
    fn create(
        &mut self,
        id: ArtifactId,
        _role: ArtifactRole,
        bytes: Vec<u8>,
    ) -> Result<String, RedactError> {
        self.blobs.insert(id, Arc::from(bytes));
        Ok(format!("blob:redacto/{}", id))
    }

    fn release(&mut self, id: ArtifactId) -> bool {
        self.blobs.remove(&id).is_some()
    }

    fn read(&self, id: ArtifactId) -> Result<Arc<[u8]>, RedactError> {
        self.blobs
            .get(&id)
            .cloned()
            .ok_or_else(|| RedactError::Storage(format!("artifact {} was released", id)))
    }

    fn live_count(&self) -> usize {
        self.blobs.len()
    }
}

/// File-backed storage inside a private temporary directory.
///
/// The directory and anything left in it are removed when the backend is
/// dropped.
#[derive(Debug)]
pub struct TempDirBackend {
    dir: TempDir,
    files: HashMap<ArtifactId, PathBuf>,
}

impl TempDirBackend {
    pub fn new() -> Result<Self, RedactError> {
        let dir = tempfile::Builder::new()
            .prefix("redacto-")
            .tempdir()
            .map_err(|e| RedactError::Storage(format!("Failed to create temp dir: {}", e)))?;
        Ok(Self {
            dir,
            files: HashMap::new(),
        })
    }

    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl ArtifactBackend for TempDirBackend {
    fn create(
        &mut self,
        id: ArtifactId,
        role: ArtifactRole,
        bytes: Vec<u8>,
    ) -> Result<String, RedactError> {
        let path = self.dir.path().join(format!("{}-{}.pdf", role, id));
        std::fs::write(&path, &bytes).map_err(|e| {
            RedactError::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;
        let locator = path.display().to_string();
        self.files.insert(id, path);
        Ok(locator)
    }

    fn release(&mut self, id: ArtifactId) -> bool {
        match self.files.remove(&id) {
            Some(path) => {
                if let Err(e) = std::fs::remove_file(&path) {
                    debug!(path = %path.display(), error = %e, "artifact file already gone");
                }
                true
            }
            None => false,
        }
    }

    fn read(&self, id: ArtifactId) -> Result<Arc<[u8]>, RedactError> {
        let path = self
            .files
            .get(&id)
            .ok_or_else(|| RedactError::Storage(format!("artifact {} was released", id)))?;
        let bytes = std::fs::read(path).map_err(|e| {
            RedactError::Storage(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Arc::from(bytes))
    }

    fn live_count(&self) -> usize {
        self.files.len()
    }
}

/// Owns the single live artifact reference
pub struct ArtifactManager {
    backend: Box<dyn ArtifactBackend>,
    current: Option<ArtifactHandle>,
    next_id: u64,
}

impl ArtifactManager {
    pub fn new(backend: Box<dyn ArtifactBackend>) -> Self {
        Self {
            backend,
            current: None,
            next_id: 1,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    pub fn temp_dir() -> Result<Self, RedactError> {
        Ok(Self::new(Box::new(TempDirBackend::new()?)))
    }

    /// Decode a transit payload and install it.
    ///
    /// Decoding happens before anything is released, so a malformed payload
    /// leaves the current artifact in place.
    pub fn install_encoded(
        &mut self,
        payload: &str,
        role: ArtifactRole,
    ) -> Result<ArtifactHandle, RedactError> {
        let bytes = transit::decode(payload)?;
        self.install(bytes, role)
    }

    /// Swap in a new artifact.
    ///
    /// The new bytes are stored before the previous artifact is released; if
    /// storing fails the previous artifact stays current.
    pub fn install(
        &mut self,
        bytes: Vec<u8>,
        role: ArtifactRole,
    ) -> Result<ArtifactHandle, RedactError> {
        let id = ArtifactId(self.next_id);
        self.next_id += 1;

        let size_bytes = bytes.len();
        let locator = self.backend.create(id, role, bytes)?;
        let handle = ArtifactHandle {
            id,
            role,
            content_type: PDF_CONTENT_TYPE,
            locator,
            size_bytes,
        };

        self.release_all();
        debug!(artifact = %id, %role, size_bytes, "installed artifact");
        self.current = Some(handle.clone());
        Ok(handle)
    }

    /// Release the live artifact, if any. Safe to call repeatedly.
    pub fn release_all(&mut self) -> bool {
        match self.current.take() {
            Some(handle) => {
                let released = self.backend.release(handle.id);
                debug!(artifact = %handle.id, role = %handle.role, "released artifact");
                released
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<&ArtifactHandle> {
        self.current.as_ref()
    }

    /// Bytes of the live artifact
    pub fn read_current(&self) -> Result<Option<Arc<[u8]>>, RedactError> {
        match &self.current {
            Some(handle) => self.backend.read(handle.id).map(Some),
            None => Ok(None),
        }
    }

    pub fn live_count(&self) -> usize {
        self.backend.live_count()
    }
}

impl Drop for ArtifactManager {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl fmt::Debug for ArtifactManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactManager")
            .field("current", &self.current)
            .field("live_count", &self.backend.live_count())
            .finish()
    }
}
