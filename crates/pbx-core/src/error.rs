use std::fmt;

/// Registry-level failures. TU-level protocol conflicts (busy, self-dial,
/// chat while not connected, hangup in an impossible state) are not
/// errors — they are state transitions handled entirely within
/// [`crate::Tu`] and never surface as a `Result::Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PbxError {
    /// Registration was attempted while the registry is draining.
    ShuttingDown,
    /// The extension named is outside `[0, MAX_EXTENSIONS)`.
    ExtensionOutOfRange,
    /// The extension is already occupied by another TU.
    ExtensionInUse,
    /// The TU named in the call is not currently registered at its
    /// claimed extension (already unregistered, or never registered).
    NotRegistered,
}

impl fmt::Display for PbxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PbxError::ShuttingDown => write!(f, "registry is shutting down"),
            PbxError::ExtensionOutOfRange => write!(f, "extension out of range"),
            PbxError::ExtensionInUse => write!(f, "extension already in use"),
            PbxError::NotRegistered => write!(f, "TU is not registered"),
        }
    }
}

impl std::error::Error for PbxError {}
