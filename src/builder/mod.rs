//! Application builder.
//!
//! The builder owns exactly one root [`ServiceRegistry`] and applies
//! configuration steps to it in the order they are supplied. Each step runs to
//! completion, awaited work included, before the next one starts.

use std::future::Future;

use crate::{DiResult, ServiceRegistry};

pub mod module_system;
pub use module_system::*;

/// Accumulates configuration steps against one root registry.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use wa_shell::{ApplicationBuilder, DiError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), DiError> {
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let mut builder = ApplicationBuilder::new();
///
/// let l = log.clone();
/// builder.configure(move |_| l.lock().push("sync"));
///
/// let l = log.clone();
/// builder
///     .configure_async(move |registry| async move {
///         tokio::task::yield_now().await;
///         registry.register_instance("answer", 42u32);
///         l.lock().push("async");
///         Ok::<_, DiError>(())
///     })
///     .await?;
///
/// let registry = builder.build();
/// assert_eq!(*registry.resolve_required::<u32>("answer")?, 42);
/// assert_eq!(*log.lock(), ["sync", "async"]);
/// # Ok(())
/// # }
/// ```
pub struct ApplicationBuilder {
    registry: ServiceRegistry,
    steps: usize,
}

impl ApplicationBuilder {
    /// Creates a builder with an empty root registry.
    pub fn new() -> Self {
        Self {
            registry: ServiceRegistry::new(),
            steps: 0,
        }
    }

    /// Runs a synchronous configuration step immediately.
    pub fn configure<F>(&mut self, step: F) -> &mut Self
    where
        F: FnOnce(&ServiceRegistry),
    {
        step(&self.registry);
        self.step_done("sync");
        self
    }

    /// Runs a fallible synchronous configuration step immediately.
    ///
    /// The step's error is returned unchanged; steps already applied stay
    /// applied.
    pub fn try_configure<F, E>(&mut self, step: F) -> Result<&mut Self, E>
    where
        F: FnOnce(&ServiceRegistry) -> Result<(), E>,
    {
        step(&self.registry)?;
        self.step_done("sync");
        Ok(self)
    }

    /// Awaits an asynchronous configuration step.
    ///
    /// The step receives a handle to the root registry (handles are cheap
    /// clones of the same registry) so the future can own it across awaits.
    pub async fn configure_async<F, Fut, E>(&mut self, step: F) -> Result<&mut Self, E>
    where
        F: FnOnce(ServiceRegistry) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        step(self.registry.clone()).await?;
        self.step_done("async");
        Ok(self)
    }

    /// Applies a [`ServiceModule`].
    pub fn add_module<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_services(&self.registry)?;
        self.step_done("module");
        Ok(self)
    }

    /// Applies an [`AsyncServiceModule`].
    pub async fn add_async_module<M: AsyncServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_services(self.registry.clone()).await?;
        self.step_done("async module");
        Ok(self)
    }

    /// Returns the root registry.
    ///
    /// Every call returns a handle to the same registry; building does not
    /// lock it against further registration.
    pub fn build(&self) -> ServiceRegistry {
        self.registry.clone()
    }

    /// Number of configuration steps applied so far.
    pub fn steps_applied(&self) -> usize {
        self.steps
    }

    fn step_done(&mut self, kind: &'static str) {
        self.steps += 1;
        tracing::debug!(step = self.steps, kind, services = self.registry.len(), "configuration step applied");
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
