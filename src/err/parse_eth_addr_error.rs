use core::fmt;

/// Error when parsing an Ethernet address from its `xx:xx:xx:xx:xx:xx`
/// textual form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseEthAddrError {
    /// The address did not consist of 6 ':' separated groups.
    GroupCount(usize),
    /// A group was not a valid 2 digit hex number.
    GroupValue(String),
}

impl fmt::Display for ParseEthAddrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParseEthAddrError::*;
        match self {
            GroupCount(count) => write!(
                f,
                "Invalid Ethernet address: expected 6 ':' separated groups but got {count}."
            ),
            GroupValue(group) => write!(
                f,
                "Invalid Ethernet address: '{group}' is not a 2 digit hex number."
            ),
        }
    }
}

impl std::error::Error for ParseEthAddrError {}
