use crate::flow::flow::Flow;

/// Wildcards for a [`Flow`], expressed as a flow of bit masks: a set bit
/// means the classifier must match on that bit, a clear bit means "don't
/// care".
#[derive(Clone, Debug, Default)]
pub struct FlowWildcards {
    pub masks: Flow,
}

impl FlowWildcards {
    /// All fields wildcarded.
    pub fn new() -> FlowWildcards {
        Default::default()
    }
}
