use crate::link::eth_addr::EthAddr;
use crate::wire::{wire_layout, Be16, Be32A16};
use core::net::Ipv4Addr;

pub const ARP_HRD_ETHERNET: u16 = 1;
pub const ARP_OP_REQUEST: u16 = 1;
pub const ARP_OP_REPLY: u16 = 2;
/// Reverse ARP (RFC 903) operations.
pub const ARP_OP_RREQUEST: u16 = 3;
pub const ARP_OP_RREPLY: u16 = 4;

/// ARP header for Ethernet / IPv4.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct ArpEthHeader {
    pub hw_type: Be16,
    pub proto_type: Be16,
    pub hw_len: u8,
    pub proto_len: u8,
    pub op: Be16,
    pub sender_hw: EthAddr,
    pub sender_proto: Be32A16,
    pub target_hw: EthAddr,
    pub target_proto: Be32A16,
}

impl ArpEthHeader {
    pub const LEN: usize = 28;

    /// An Ethernet / IPv4 ARP message with the given operation.
    #[inline]
    pub fn new(
        op: u16,
        sender_hw: EthAddr,
        sender_proto: Ipv4Addr,
        target_hw: EthAddr,
        target_proto: Ipv4Addr,
    ) -> ArpEthHeader {
        ArpEthHeader {
            hw_type: Be16::new(ARP_HRD_ETHERNET),
            proto_type: Be16::new(crate::link::ethernet::ETH_TYPE_IP),
            hw_len: EthAddr::LEN as u8,
            proto_len: 4,
            op: Be16::new(op),
            sender_hw,
            sender_proto: sender_proto.into(),
            target_hw,
            target_proto: target_proto.into(),
        }
    }

    /// True if the header announces an Ethernet / IPv4 payload.
    #[inline]
    pub fn is_eth_ipv4(&self) -> bool {
        self.hw_type.get() == ARP_HRD_ETHERNET
            && self.proto_type.get() == crate::link::ethernet::ETH_TYPE_IP
            && self.hw_len == EthAddr::LEN as u8
            && self.proto_len == 4
    }
}

wire_layout!(ArpEthHeader, ArpEthHeader::LEN);
