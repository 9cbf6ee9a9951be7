//! Error types for the service registry.

use std::fmt;
use std::sync::Arc;

/// Boxed error produced by a fallible factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Represents the failure conditions of service resolution. Registration
/// itself never fails.
///
/// # Examples
///
/// ```rust
/// use wa_shell::{DiError, ServiceRegistry};
///
/// let registry = ServiceRegistry::new();
/// match registry.resolve_required::<String>("greeting") {
///     Err(DiError::NotFound(name)) => assert_eq!(name, "greeting"),
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use wa_shell::DiError;
///
/// let not_found = DiError::NotFound("socket".to_string());
/// let circular = DiError::Circular(vec!["a".into(), "b".into(), "a".into()]);
///
/// assert_eq!(not_found.to_string(), "Service not found: socket");
/// assert_eq!(circular.to_string(), "Circular dependency: a -> b -> a");
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// No registry in the ancestor chain has an entry for the name
    NotFound(String),
    /// The registered value is not of the requested type
    TypeMismatch {
        /// Service name
        name: String,
        /// Type requested by the caller
        expected: &'static str,
    },
    /// A fallible factory failed while materializing the service
    Factory {
        /// Service name
        name: String,
        /// Error returned by the factory
        source: Arc<dyn std::error::Error + Send + Sync + 'static>,
    },
    /// Circular dependency detected (includes path)
    Circular(Vec<String>),
    /// Maximum recursion depth exceeded
    DepthExceeded(usize),
}

impl DiError {
    /// Wraps a factory failure. Errors that already are a `DiError` (for
    /// example a missing dependency resolved with `?` inside the factory)
    /// pass through unchanged.
    pub(crate) fn from_factory(name: &str, err: BoxError) -> Self {
        match err.downcast::<DiError>() {
            Ok(inner) => *inner,
            Err(other) => DiError::Factory {
                name: name.to_string(),
                source: Arc::from(other),
            },
        }
    }

    /// Name of the service the error refers to, when there is one.
    pub fn service_name(&self) -> Option<&str> {
        match self {
            DiError::NotFound(name) => Some(name),
            DiError::TypeMismatch { name, .. } => Some(name),
            DiError::Factory { name, .. } => Some(name),
            DiError::Circular(path) => path.first().map(String::as_str),
            DiError::DepthExceeded(_) => None,
        }
    }

    /// True for [`DiError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiError::NotFound(_))
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotFound(name) => write!(f, "Service not found: {}", name),
            DiError::TypeMismatch { name, expected } => {
                write!(f, "Type mismatch for {}: expected {}", name, expected)
            }
            DiError::Factory { name, source } => {
                write!(f, "Factory for {} failed: {}", name, source)
            }
            DiError::Circular(path) => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            DiError::DepthExceeded(depth) => write!(f, "Max depth {} exceeded", depth),
        }
    }
}

impl std::error::Error for DiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiError::Factory { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
