use crate::wire::{wire_layout, Be16, Be32A16};

/// SCTP common header.
///
/// The checksum is a CRC32c over the whole packet; this crate only fixes
/// the field placement, computing the CRC is left to the datapath.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct SctpHeader {
    pub source: Be16,
    pub destination: Be16,
    pub verification_tag: Be32A16,
    pub checksum: Be32A16,
}

impl SctpHeader {
    pub const LEN: usize = 12;
}

wire_layout!(SctpHeader, SctpHeader::LEN);
