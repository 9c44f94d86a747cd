use std::fmt;

// === StorageError ===

/// Errors related to the persisted storage envelope.
#[derive(Debug)]
pub enum StorageError {
    /// The envelope could not be interpreted even after recovery heuristics.
    FormatUnrecognized,
    /// Reading from the storage area failed.
    ReadFailed(String),
    /// The persistence call itself rejected. In-memory state stays
    /// authoritative for the session; the write is not retried.
    WriteFailed(String),
    /// Failed to serialize or deserialize envelope data.
    Serialization(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::FormatUnrecognized => {
                write!(f, "Storage envelope format unrecognized")
            }
            StorageError::ReadFailed(msg) => write!(f, "Storage read failed: {}", msg),
            StorageError::WriteFailed(msg) => write!(f, "Storage write failed: {}", msg),
            StorageError::Serialization(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

// === MessageError ===

/// Errors related to inter-context messaging.
#[derive(Debug)]
pub enum MessageError {
    /// No response arrived within the caller-supplied timeout. May indicate
    /// a truly missing recipient; callers should not blindly retry.
    Timeout(u64),
    /// The transport itself failed; safe to retry.
    Transport(String),
    /// Malformed or unknown message, discarded at the boundary.
    ValidationFailed(Vec<String>),
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::Timeout(ms) => write!(f, "Message timed out after {}ms", ms),
            MessageError::Transport(msg) => write!(f, "Message transport error: {}", msg),
            MessageError::ValidationFailed(errors) => {
                write!(f, "Message validation failed: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for MessageError {}

// === PanelError ===

/// Errors related to management panel rendering.
#[derive(Debug)]
pub enum PanelError {
    /// Computing or applying the rendered content failed. The previously
    /// rendered content is left in place.
    RenderFailed(String),
}

impl fmt::Display for PanelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelError::RenderFailed(msg) => write!(f, "Panel render failed: {}", msg),
        }
    }
}

impl std::error::Error for PanelError {}
