//! Container backend abstraction.
//!
//! Arenaforge decides *which* worlds should exist; actually creating and
//! destroying them (loading a map, allocating a region, starting a
//! process) belongs to the host. The host plugs that in by implementing
//! [`ContainerBackend`].
//!
//! Calls are synchronous from the pool's point of view and are never
//! retried here. A failure goes straight back to whoever asked for the
//! placement or teardown.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

/// A failure reported by a container backend.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying error from the host's own stack.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Creates and destroys the spatial containers arenas live in.
pub trait ContainerBackend: Send + Sync + 'static {
    /// Whatever the backend needs to find the container again later.
    type Handle: Send + Sync + fmt::Debug + 'static;

    /// Provisions a new, empty container called `name`.
    fn create_container(&self, name: &str) -> Result<Self::Handle, BackendError>;

    /// Tears a container down.
    fn destroy_container(&self, handle: &Self::Handle) -> Result<(), BackendError>;
}

impl<B: ContainerBackend> ContainerBackend for Arc<B> {
    type Handle = B::Handle;

    fn create_container(&self, name: &str) -> Result<Self::Handle, BackendError> {
        (**self).create_container(name)
    }

    fn destroy_container(&self, handle: &Self::Handle) -> Result<(), BackendError> {
        (**self).destroy_container(handle)
    }
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// Handle to a container held by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryHandle {
    id: u64,
    name: String,
}

impl MemoryHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A backend that only keeps bookkeeping in memory.
///
/// Useful for tests, demos, and hosts whose containers are purely logical.
/// Failures can be injected with [`fail_next_creates`](Self::fail_next_creates)
/// and [`fail_next_destroys`](Self::fail_next_destroys).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    live: IndexMap<u64, String>,
    created: usize,
    destroyed: usize,
    failing_creates: usize,
    failing_destroys: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls to `create_container` fail.
    pub fn fail_next_creates(&self, count: usize) {
        self.state.lock().failing_creates = count;
    }

    /// Makes the next `count` calls to `destroy_container` fail.
    pub fn fail_next_destroys(&self, count: usize) {
        self.state.lock().failing_destroys = count;
    }

    /// Names of containers that currently exist, oldest first.
    pub fn live_containers(&self) -> Vec<String> {
        self.state.lock().live.values().cloned().collect()
    }

    /// Total successful creations.
    pub fn created_count(&self) -> usize {
        self.state.lock().created
    }

    /// Total successful destructions.
    pub fn destroyed_count(&self) -> usize {
        self.state.lock().destroyed
    }
}

impl ContainerBackend for MemoryBackend {
    type Handle = MemoryHandle;

    fn create_container(&self, name: &str) -> Result<MemoryHandle, BackendError> {
        let mut state = self.state.lock();
        if state.failing_creates > 0 {
            state.failing_creates -= 1;
            return Err(BackendError::new(format!(
                "injected failure creating '{name}'"
            )));
        }
        if state.live.values().any(|live| live == name) {
            return Err(BackendError::new(format!(
                "container '{name}' already exists"
            )));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(id, name.to_string());
        state.created += 1;
        Ok(MemoryHandle {
            id,
            name: name.to_string(),
        })
    }

    fn destroy_container(&self, handle: &MemoryHandle) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        if state.failing_destroys > 0 {
            state.failing_destroys -= 1;
            return Err(BackendError::new(format!(
                "injected failure destroying '{}'",
                handle.name
            )));
        }
        if state.live.shift_remove(&handle.id).is_none() {
            return Err(BackendError::new(format!(
                "container '{}' does not exist",
                handle.name
            )));
        }
        state.destroyed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_create_and_destroy() {
        let backend = MemoryBackend::new();
        let a = backend.create_container("arena_world_1").unwrap();
        let _b = backend.create_container("arena_world_2").unwrap();

        assert_eq!(backend.live_containers(), vec!["arena_world_1", "arena_world_2"]);

        backend.destroy_container(&a).unwrap();

        assert_eq!(backend.live_containers(), vec!["arena_world_2"]);
        assert_eq!(backend.created_count(), 2);
        assert_eq!(backend.destroyed_count(), 1);
    }

    #[test]
    fn test_memory_backend_rejects_duplicate_names() {
        let backend = MemoryBackend::new();
        backend.create_container("w").unwrap();
        assert!(backend.create_container("w").is_err());
    }

    #[test]
    fn test_memory_backend_destroy_twice_fails() {
        let backend = MemoryBackend::new();
        let handle = backend.create_container("w").unwrap();
        backend.destroy_container(&handle).unwrap();
        assert!(backend.destroy_container(&handle).is_err());
        assert_eq!(backend.destroyed_count(), 1);
    }

    #[test]
    fn test_memory_backend_injected_failures_are_consumed() {
        let backend = MemoryBackend::new();
        backend.fail_next_creates(1);

        assert!(backend.create_container("w").is_err());
        assert!(backend.create_container("w").is_ok());

        let handle = backend.create_container("v").unwrap();
        backend.fail_next_destroys(1);
        assert!(backend.destroy_container(&handle).is_err());
        assert!(backend.destroy_container(&handle).is_ok());
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let io = std::io::Error::other("disk full");
        let err = BackendError::with_source("could not save world", io);
        assert_eq!(err.to_string(), "could not save world");
        assert_eq!(err.source().unwrap().to_string(), "disk full");
    }
}
