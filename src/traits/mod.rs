//! Core traits for the service registry.

mod resolver;

pub use resolver::{Resolver, ResolverCore};
