use core::fmt;

/// Datapath port number (the underlay interface carrying tunneled packets).
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Debug)]
pub struct OdpPort(pub u32);

impl fmt::Display for OdpPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque handle identifying a logical switch port in the upper layer.
/// Only used as an identity token by this crate.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Debug)]
pub struct OfPort(pub u32);

impl fmt::Display for OfPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Packet mark bit reserved for flagging IPsec protected tunnel traffic
/// during demultiplexing.
pub const IPSEC_MARK: u32 = 1;
