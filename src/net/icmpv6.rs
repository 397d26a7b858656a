use crate::link::eth_addr::EthAddr;
use crate::wire::{wire_layout, Be16, Be32A16, Ipv6A16};

pub const ICMP6_ECHO_REQUEST: u8 = 128;
pub const ICMP6_ECHO_REPLY: u8 = 129;
pub const MLD_QUERY: u8 = 130;
pub const MLD_REPORT: u8 = 131;
pub const MLD_DONE: u8 = 132;
pub const ND_ROUTER_SOLICIT: u8 = 133;
pub const ND_ROUTER_ADVERT: u8 = 134;
pub const ND_NEIGHBOR_SOLICIT: u8 = 135;
pub const ND_NEIGHBOR_ADVERT: u8 = 136;
pub const MLD2_REPORT: u8 = 143;

pub const ND_OPT_SOURCE_LINKADDR: u8 = 1;
pub const ND_OPT_TARGET_LINKADDR: u8 = 2;

/// Router flag of a neighbor advertisement.
pub const ND_RSO_ROUTER: u32 = 0x8000_0000;
/// Solicited flag of a neighbor advertisement.
pub const ND_RSO_SOLICITED: u32 = 0x4000_0000;
/// Override flag of a neighbor advertisement.
pub const ND_RSO_OVERRIDE: u32 = 0x2000_0000;

/// ICMPv6 header (shared prefix of all ICMPv6 messages).
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct Icmpv6Header {
    pub msg_type: u8,
    pub code: u8,
    pub checksum: Be16,
}

impl Icmpv6Header {
    pub const LEN: usize = 4;
}

wire_layout!(Icmpv6Header, Icmpv6Header::LEN);

/// Neighbor discovery solicitation / advertisement message.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct NdMsg {
    pub icmph: Icmpv6Header,
    /// Router/solicited/override flags (advertisements), reserved otherwise.
    pub rso_flags: Be32A16,
    pub target: Ipv6A16,
}

impl NdMsg {
    pub const LEN: usize = 24;
}

wire_layout!(NdMsg, NdMsg::LEN);

/// Neighbor discovery option carrying a link layer address.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct NdOption {
    pub option_type: u8,
    /// Length of the option in 8 byte units (1 for a link layer address).
    pub len: u8,
    pub eth: EthAddr,
}

impl NdOption {
    pub const LEN: usize = 8;
}

wire_layout!(NdOption, NdOption::LEN);

/// Multicast listener discovery message (RFC 2710).
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct MldHeader {
    pub msg_type: u8,
    pub reserved1: u8,
    pub checksum: Be16,
    pub max_resp_delay: Be16,
    pub reserved2: Be16,
}

impl MldHeader {
    pub const LEN: usize = 8;
}

wire_layout!(MldHeader, MldHeader::LEN);

/// Fixed part of an MLDv2 multicast address record (RFC 3810).
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct Mldv2Record {
    pub record_type: u8,
    /// Length of the auxiliary data trailing the record in 32 bit words.
    pub aux_len: u8,
    pub nsources: Be16,
    pub group: Ipv6A16,
}

impl Mldv2Record {
    pub const LEN: usize = 20;
}

wire_layout!(Mldv2Record, Mldv2Record::LEN);
