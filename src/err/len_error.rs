use core::fmt;

/// Error when a slice contains less data than a wire record requires.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct LenError {
    /// Minimum required length in bytes.
    pub required: usize,
    /// Actual length of the given slice in bytes.
    pub actual: usize,
}

impl fmt::Display for LenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Not enough data: the given slice contains less than the minimum required {} bytes ({} bytes present).",
            self.required, self.actual
        )
    }
}

impl std::error::Error for LenError {}
