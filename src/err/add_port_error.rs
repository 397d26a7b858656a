use core::fmt;

/// Error when registering a tunnel port.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AddPortError {
    /// A port with an identical match tuple is already registered. Contains
    /// the name of the existing port.
    DuplicateMatch(String),
}

impl fmt::Display for AddPortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddPortError::DuplicateMatch(existing) => write!(
                f,
                "A tunnel port with an identical match is already registered as '{existing}'."
            ),
        }
    }
}

impl std::error::Error for AddPortError {}
