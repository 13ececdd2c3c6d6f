use std::fmt;

// ============================================================================
// Field graph construction
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two fields share the same id
    DuplicateFieldId(String),

    /// `dependsOn` names a field that is not in the schema
    UnknownParent { field: String, parent: String },

    /// A field lists itself as parent
    SelfDependency(String),

    /// A parent is ordered after its child (this is also how cycles surface)
    ParentAfterChild { field: String, parent: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DuplicateFieldId(id) => write!(f, "Duplicate field id '{}'", id),
            GraphError::UnknownParent { field, parent } => {
                write!(f, "Field '{}' depends on unknown field '{}'", field, parent)
            }
            GraphError::SelfDependency(id) => write!(f, "Field '{}' depends on itself", id),
            GraphError::ParentAfterChild { field, parent } => write!(
                f,
                "Field '{}' depends on '{}', which does not precede it",
                field, parent
            ),
        }
    }
}

impl std::error::Error for GraphError {}

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug)]
pub enum TransportError {
    /// HTTP client could not be constructed
    Client(reqwest::Error),

    /// The request failed before a response arrived (connect, timeout, body read)
    Request { url: String, source: reqwest::Error },

    /// No route for the URL (mock transport) or an injected failure
    Unreachable { url: String, reason: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Client(e) => write!(f, "Failed to build HTTP client: {}", e),
            TransportError::Request { url, source } => {
                write!(f, "Request to {} failed: {}", url, source)
            }
            TransportError::Unreachable { url, reason } => {
                write!(f, "{} unreachable: {}", url, reason)
            }
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Client(e) => Some(e),
            TransportError::Request { source, .. } => Some(source),
            TransportError::Unreachable { .. } => None,
        }
    }
}

// ============================================================================
// Option resolution
// ============================================================================

#[derive(Debug)]
pub enum ResolveError {
    Transport(TransportError),

    /// Endpoint answered with a non-success status
    Status { url: String, status: u16 },

    /// Body was not valid JSON
    Parse { url: String, source: serde_json::Error },

    /// The fetch worker died before reporting a result
    Aborted { field: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Transport(e) => write!(f, "{}", e),
            ResolveError::Status { url, status } => {
                write!(f, "{} responded with status {}", url, status)
            }
            ResolveError::Parse { url, source } => {
                write!(f, "Invalid JSON from {}: {}", url, source)
            }
            ResolveError::Aborted { field } => {
                write!(f, "Fetch for field '{}' aborted", field)
            }
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Transport(e) => Some(e),
            ResolveError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<TransportError> for ResolveError {
    fn from(e: TransportError) -> Self {
        ResolveError::Transport(e)
    }
}

// ============================================================================
// Form session
// ============================================================================

#[derive(Debug)]
pub enum SessionError {
    /// No field with this id in the session's schema
    UnknownField(String),

    /// The schema's dependency graph is invalid
    Graph(GraphError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UnknownField(id) => write!(f, "Unknown field '{}'", id),
            SessionError::Graph(e) => write!(f, "Invalid schema: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Graph(e) => Some(e),
            SessionError::UnknownField(_) => None,
        }
    }
}

impl From<GraphError> for SessionError {
    fn from(e: GraphError) -> Self {
        SessionError::Graph(e)
    }
}
