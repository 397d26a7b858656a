use core::fmt;

/// Error when composing the outer header of a push tunnel action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BuildHeaderError {
    /// The given port handle is not registered.
    UnknownPort,
    /// The composed header does not fit into the fixed size header buffer.
    HeaderSpace {
        /// Number of bytes the header would have needed.
        required: usize,
    },
    /// The netdev rejected the tunnel flow (protocol specific reason).
    Unsupported(&'static str),
}

impl fmt::Display for BuildHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BuildHeaderError::*;
        match self {
            UnknownPort => write!(f, "The given port handle is not a registered tunnel port."),
            HeaderSpace { required } => write!(
                f,
                "The tunnel header ({required} bytes) exceeds the header buffer capacity ({} bytes).",
                crate::TNL_PUSH_HEADER_SIZE
            ),
            Unsupported(reason) => write!(f, "The netdev rejected the tunnel flow: {reason}."),
        }
    }
}

impl std::error::Error for BuildHeaderError {}
