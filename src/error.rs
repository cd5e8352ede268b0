//! Error types for record resolution

use std::fmt;
use thiserror::Error;

/// Separator used when rendering a resolution path.
pub const PATH_SEPARATOR: &str = "->";

/// Ordered list of identifiers that were being resolved when an error occurred.
///
/// Renders as `a->b->c`. An empty path renders as nothing, so errors raised
/// outside a tracked resolution keep a short message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPath(Vec<String>);

impl ResolutionPath {
    /// Create a path from identifiers in resolution order
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    /// Check if no path was recorded
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identifiers in resolution order
    #[inline]
    pub fn ids(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        write!(f, " (resolution path: {})", self.0.join(PATH_SEPARATOR))
    }
}

/// Errors that can occur while registering or resolving records
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// Identifier is empty, numeric-looking, or contains a forbidden separator
    #[error("Invalid identifier {id:?}: {reason}")]
    InvalidIdentifier { id: String, reason: &'static str },

    /// Identifier is already occupied and the operation forbids overwrite
    #[error("Identifier already defined: {id}")]
    AlreadyDefined { id: String },

    /// No record and no sub-container claims the identifier
    #[error("Identifier not defined: {id}{path}")]
    NotFound { id: String, path: ResolutionPath },

    /// A sub-container could not resolve the remainder of a prefixed identifier.
    ///
    /// `source()` yields the boxed sub-container error, so chain walkers see it
    /// as `Box<DiError>`; [`DiError::cause`] returns it as a `DiError`.
    #[error("Identifier {id:?} not defined in sub-container {container:?}{path}")]
    NotFoundInSubContainer {
        container: String,
        id: String,
        path: ResolutionPath,
        #[source]
        source: Box<DiError>,
    },

    /// Identifier requested while already being resolved higher in the call stack
    #[error("Circular reference detected while resolving {id}{path}")]
    CircularReference { id: String, path: ResolutionPath },

    /// A value does not have the type its slot requires
    #[error("Value for {id:?} is not of the expected type {expected}")]
    InvalidType { id: String, expected: &'static str },

    /// A factory failed to produce a value
    #[error("Failed to create {type_name}: {reason}")]
    CreationFailed {
        type_name: &'static str,
        reason: String,
    },
}

impl DiError {
    /// Create an InvalidIdentifier error
    #[inline]
    pub fn invalid_identifier(id: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidIdentifier {
            id: id.into(),
            reason,
        }
    }

    /// Create an AlreadyDefined error
    #[inline]
    pub fn already_defined(id: impl Into<String>) -> Self {
        Self::AlreadyDefined { id: id.into() }
    }

    /// Create a NotFound error without a resolution path
    #[inline]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            id: id.into(),
            path: ResolutionPath::default(),
        }
    }

    /// Wrap a sub-container's not-found failure
    #[inline]
    pub fn not_found_in(
        container: impl Into<String>,
        id: impl Into<String>,
        cause: DiError,
    ) -> Self {
        Self::NotFoundInSubContainer {
            container: container.into(),
            id: id.into(),
            path: ResolutionPath::default(),
            source: Box::new(cause),
        }
    }

    /// Create a CircularReference error
    #[inline]
    pub fn circular(id: impl Into<String>, path: ResolutionPath) -> Self {
        Self::CircularReference {
            id: id.into(),
            path,
        }
    }

    /// Create an InvalidType error for a value expected to be a `T`
    #[inline]
    pub fn invalid_type<T: ?Sized + 'static>(id: impl Into<String>) -> Self {
        Self::InvalidType {
            id: id.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed<T: ?Sized + 'static>(reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Check if this is a not-found kind, including sub-container failures
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::NotFoundInSubContainer { .. }
        )
    }

    /// The sub-container error wrapped by `NotFoundInSubContainer`
    pub fn cause(&self) -> Option<&DiError> {
        match self {
            Self::NotFoundInSubContainer { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Resolution path attached to this error, if any
    pub fn path(&self) -> Option<&ResolutionPath> {
        match self {
            Self::NotFound { path, .. }
            | Self::NotFoundInSubContainer { path, .. }
            | Self::CircularReference { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Attach a resolution path unless one was recorded deeper in the stack.
    pub(crate) fn with_path(mut self, stack: impl FnOnce() -> ResolutionPath) -> Self {
        match &mut self {
            Self::NotFound { path, .. } | Self::NotFoundInSubContainer { path, .. }
                if path.is_empty() =>
            {
                *path = stack();
            }
            _ => {}
        }
        self
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;
