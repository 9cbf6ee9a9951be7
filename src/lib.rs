//! # wa-shell
//!
//! A small application shell for WhatsApp bots, built around a named-service
//! dependency injection registry.
//!
//! ## Features
//!
//! - **Named services**: Singleton (ready value or lazy factory), Scoped and
//!   Transient lifetimes, resolved by name and downcast on demand
//! - **Scopes**: child registries that inherit a snapshot of their parent and
//!   may override entries locally
//! - **Ordered configuration**: a builder that applies synchronous and
//!   asynchronous configuration steps strictly in order
//! - **Circular dependency detection**: cycles surface as an error with the
//!   full path instead of a deadlock
//! - **Shell**: socket wrapper with TTL caches, event notifier and a logging
//!   message handler on top of an opaque [`WaClient`](whatsapp::WaClient)
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use wa_shell::{ApplicationBuilder, Resolver};
//!
//! struct Greeter {
//!     greeting: Arc<String>,
//! }
//!
//! impl Greeter {
//!     fn greet(&self, name: &str) -> String {
//!         format!("{}, {}!", self.greeting, name)
//!     }
//! }
//!
//! let mut builder = ApplicationBuilder::new();
//! builder.configure(|registry| {
//!     registry
//!         .register_instance("greeting", "Hello".to_string())
//!         .register_singleton_factory("greeter", |ctx| Greeter {
//!             greeting: ctx.get_required::<String>("greeting"),
//!         });
//! });
//!
//! let registry = builder.build();
//! let greeter = registry.resolve_required::<Greeter>("greeter").unwrap();
//! assert_eq!(greeter.greet("Ana"), "Hello, Ana!");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created at most once and shared with every scope that
//!   inherited the entry
//! - **Scoped**: Created once per registry (ideal for per-session state)
//! - **Transient**: Created fresh on every resolution
//!
//! ## Scoped Services
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use wa_shell::ServiceRegistry;
//!
//! struct SessionId(u32);
//!
//! let counter = Arc::new(AtomicU32::new(0));
//! let c = counter.clone();
//!
//! let root = ServiceRegistry::new();
//! root.register_scoped("session", move |_| SessionId(c.fetch_add(1, Ordering::SeqCst)));
//!
//! let scope1 = root.create_scope();
//! let scope2 = root.create_scope();
//! assert_eq!(scope1.resolve_required::<SessionId>("session").unwrap().0, 0);
//! assert_eq!(scope2.resolve_required::<SessionId>("session").unwrap().0, 1);
//! assert_eq!(scope1.resolve_required::<SessionId>("session").unwrap().0, 0);
//! ```

// Module declarations
pub mod builder;
pub mod cache;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod lifetime;
pub mod notifier;
pub mod observer;
pub mod registry;
pub mod traits;
pub mod whatsapp;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use builder::{ApplicationBuilder, AsyncServiceModule, ServiceModule};
pub use cache::{CacheConfig, CacheStats, TtlCache};
pub use config::{
    AppConfig, ConfigError, ConfigProvider, ConfigSource, ConfigValue, EnvironmentConfigSource, JsonConfigSource,
    MemoryConfigSource, PairingMode,
};
pub use descriptors::ServiceDescriptor;
pub use error::{BoxError, DiError, DiResult};
pub use internal::CircularPanic;
pub use lifetime::Lifetime;
pub use notifier::{EventNotifier, SubscriptionId};
pub use observer::{DiObserver, TracingObserver};
pub use registry::{ResolverContext, ServiceRegistry};
pub use traits::{Resolver, ResolverCore};
