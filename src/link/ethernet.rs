use crate::link::eth_addr::EthAddr;
use crate::wire::{wire_layout, Be16};

// Ether types this crate composes or inspects.
pub const ETH_TYPE_IP: u16 = 0x0800;
pub const ETH_TYPE_ARP: u16 = 0x0806;
pub const ETH_TYPE_RARP: u16 = 0x8035;
pub const ETH_TYPE_VLAN_8021Q: u16 = 0x8100;
pub const ETH_TYPE_VLAN_8021AD: u16 = 0x88a8;
pub const ETH_TYPE_IPV6: u16 = 0x86dd;
pub const ETH_TYPE_MPLS: u16 = 0x8847;
pub const ETH_TYPE_MPLS_MCAST: u16 = 0x8848;

/// Values below this in the Ethernet type field are 802.3 frame lengths.
pub const ETH_TYPE_MIN: u16 = 0x600;

/// Ethernet II header.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct EthernetHeader {
    pub destination: EthAddr,
    pub source: EthAddr,
    /// Ether type of the payload (or frame length for 802.3 frames).
    pub ether_type: Be16,
}

impl EthernetHeader {
    /// Serialized size of the header in bytes.
    pub const LEN: usize = 14;

    #[inline]
    pub fn new(destination: EthAddr, source: EthAddr, ether_type: u16) -> EthernetHeader {
        EthernetHeader {
            destination,
            source,
            ether_type: Be16::new(ether_type),
        }
    }
}

wire_layout!(EthernetHeader, EthernetHeader::LEN);

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::WireLayout;

    #[test]
    fn layout() {
        let header = EthernetHeader::new(
            EthAddr([1, 2, 3, 4, 5, 6]),
            EthAddr([7, 8, 9, 10, 11, 12]),
            ETH_TYPE_IP,
        );
        assert_eq!(
            header.as_bytes(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 0x08, 0x00]
        );
    }

    #[test]
    fn from_slice() {
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 0x86, 0xdd, 0xaa];
        let (header, rest) = EthernetHeader::from_slice(&bytes).unwrap();
        assert_eq!(header.ether_type.get(), ETH_TYPE_IPV6);
        assert_eq!(rest, &[0xaa]);

        assert_eq!(
            EthernetHeader::from_slice(&bytes[..13]).unwrap_err(),
            crate::err::LenError {
                required: 14,
                actual: 13
            }
        );
    }
}
