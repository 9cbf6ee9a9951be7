//! Service module system for grouped registration.
//!
//! This module provides traits for organizing registrations into reusable
//! modules that an [`ApplicationBuilder`](crate::ApplicationBuilder) applies
//! as ordinary configuration steps.

use async_trait::async_trait;

use crate::{DiResult, ServiceRegistry};

/// A module that registers services synchronously.
///
/// # Example
///
/// ```rust
/// use wa_shell::{ApplicationBuilder, DiResult, ServiceModule, ServiceRegistry};
///
/// struct GreetingModule {
///     greeting: &'static str,
/// }
///
/// impl ServiceModule for GreetingModule {
///     fn register_services(self, registry: &ServiceRegistry) -> DiResult<()> {
///         registry.register_instance("greeting", self.greeting.to_string());
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut builder = ApplicationBuilder::new();
/// let registry = builder.add_module(GreetingModule { greeting: "hi" })?.build();
/// assert_eq!(*registry.resolve_required::<String>("greeting")?, "hi");
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Register this module's services with the registry.
    fn register_services(self, registry: &ServiceRegistry) -> DiResult<()>;
}

/// A module whose registration needs awaited setup first.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use wa_shell::{ApplicationBuilder, AsyncServiceModule, DiResult, ServiceRegistry};
///
/// struct Handshake;
///
/// #[async_trait]
/// impl AsyncServiceModule for Handshake {
///     async fn register_services(self, registry: ServiceRegistry) -> DiResult<()> {
///         tokio::task::yield_now().await;
///         registry.register_instance("session", 42u32);
///         Ok(())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> DiResult<()> {
/// let mut builder = ApplicationBuilder::new();
/// builder.add_async_module(Handshake).await?;
/// assert_eq!(*builder.build().resolve_required::<u32>("session")?, 42);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait AsyncServiceModule: Send {
    /// Perform setup and register this module's services.
    async fn register_services(self, registry: ServiceRegistry) -> DiResult<()>;
}
