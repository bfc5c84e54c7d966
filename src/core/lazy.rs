//! Lazily created, shared client handle.
//!
//! The handle is built on first use by an injected factory and then shared by
//! every caller. Reads after initialization never take a lock. Concurrent
//! first callers are serialized on an init mutex so the factory runs at most
//! once per successful initialization. A failing factory leaves the cell
//! empty and the next caller tries again.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::debug;

/// Factory that produces the shared handle.
pub type Factory<T, E> = Box<dyn Fn() -> Result<Arc<T>, E> + Send + Sync>;

pub struct LazyClient<T: ?Sized, E> {
    cell: OnceLock<Arc<T>>,
    init: Mutex<()>,
    factory: Factory<T, E>,
}

impl<T: ?Sized, E> LazyClient<T, E> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<T>, E> + Send + Sync + 'static,
    {
        Self {
            cell: OnceLock::new(),
            init: Mutex::new(()),
            factory: Box::new(factory),
        }
    }

    /// Return the shared handle, creating it on first use.
    ///
    /// Blocks while another thread is running the factory.
    pub fn get(&self) -> Result<Arc<T>, E> {
        if let Some(handle) = self.cell.get() {
            return Ok(handle.clone());
        }

        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self
            .init
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(handle) = self.cell.get() {
            return Ok(handle.clone());
        }

        debug!("Creating client handle");
        let handle = (self.factory)()?;
        let _ = self.cell.set(handle.clone());
        Ok(handle)
    }

    /// Whether a handle has been created.
    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Drop the cached handle so the next [`get`](Self::get) runs the factory again.
    pub fn reset(&mut self) {
        self.cell.take();
    }
}

impl<T: ?Sized, E> fmt::Debug for LazyClient<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyClient")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}
