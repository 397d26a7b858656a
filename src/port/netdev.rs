use crate::err::BuildHeaderError;
use crate::flow::flow_tnl::FlowTnl;
use crate::flow::port_id::OdpPort;
use crate::link::ethernet::EthernetHeader;
use arrayvec::ArrayVec;
use core::net::Ipv6Addr;

/// Capacity of the outer header buffer of a push tunnel action.
pub const TNL_PUSH_HEADER_SIZE: usize = 128;

/// Tunnel configuration of a netdev, pulled through
/// [`TunnelNetdev::tunnel_config`].
///
/// IPv4 endpoints are carried in IPv4 mapped form (`::ffff:a.b.c.d`); the
/// `*_flow` booleans mean "this field is not fixed by the configuration,
/// defer to the flow table".
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TunnelConfig {
    pub in_key: u64,
    pub in_key_flow: bool,
    pub ipv6_src: Ipv6Addr,
    pub ipv6_dst: Ipv6Addr,
    pub ip_src_flow: bool,
    pub ip_dst_flow: bool,
    pub out_key: u64,
    pub out_key_flow: bool,
    pub out_key_present: bool,
    /// The tunnel is IPsec protected.
    pub ipsec: bool,
    pub ttl: u8,
    pub ttl_inherit: bool,
    pub tos: u8,
    pub tos_inherit: bool,
    pub dont_fragment: bool,
    pub csum: bool,
    /// Outer transport destination port.
    pub dst_port: u16,
}

impl Default for TunnelConfig {
    fn default() -> TunnelConfig {
        TunnelConfig {
            in_key: 0,
            in_key_flow: false,
            ipv6_src: Ipv6Addr::UNSPECIFIED,
            ipv6_dst: Ipv6Addr::UNSPECIFIED,
            ip_src_flow: false,
            ip_dst_flow: false,
            out_key: 0,
            out_key_flow: false,
            out_key_present: false,
            ipsec: false,
            ttl: 64,
            ttl_inherit: false,
            tos: 0,
            tos_inherit: false,
            dont_fragment: false,
            csum: false,
            dst_port: 0,
        }
    }
}

/// The netdev side of a tunnel port. The registry does not know VXLAN from
/// GRE; everything protocol specific lives behind this trait.
pub trait TunnelNetdev: Send + Sync {
    /// Name of the device (used in logs and the native tunnel table).
    fn name(&self) -> &str;

    /// Tunnel type string (`"vxlan"`, `"gre"`, ...).
    fn kind(&self) -> &str;

    /// Current tunnel configuration. Called with the registry lock held,
    /// so this must be a pure read without callbacks of its own.
    fn tunnel_config(&self) -> TunnelConfig;

    /// Monotonically increasing sequence number, bumped whenever the
    /// configuration changes.
    fn change_seq(&self) -> u64;

    /// Appends the L4 and tunnel bytes to a header already holding the
    /// outer Ethernet + IPv4 prefix, and sets the outer IP protocol via
    /// [`TunnelHeader::set_ip_proto`].
    fn build_header(&self, header: &mut TunnelHeader, tnl: &FlowTnl)
        -> Result<(), BuildHeaderError>;
}

/// Side table mapping tunnels terminated in userspace back to their port:
/// `(odp_port, outer transport port, name)` registered on add, dropped on
/// delete. Implementations must be reentrant with respect to the registry
/// lock.
pub trait NativeTunnelSink: Send + Sync {
    fn insert(&self, odp_port: OdpPort, dst_port: u16, name: &str);
    fn remove(&self, dst_port: u16);
}

/// Fixed capacity buffer for the outer header of a push tunnel action.
#[derive(Clone, Debug, Default)]
pub struct TunnelHeader {
    data: ArrayVec<u8, TNL_PUSH_HEADER_SIZE>,
}

/// Offset of the protocol byte of the outer IPv4 header.
const IP_PROTO_OFFSET: usize = EthernetHeader::LEN + 9;

impl TunnelHeader {
    pub fn new() -> TunnelHeader {
        Default::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Appends raw header bytes.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), BuildHeaderError> {
        self.data
            .try_extend_from_slice(bytes)
            .map_err(|_| BuildHeaderError::HeaderSpace {
                required: self.data.len() + bytes.len(),
            })
    }

    /// Stores the protocol of the outer IPv4 header (for netdev callbacks,
    /// e.g. UDP for VXLAN or GRE for GRE).
    pub fn set_ip_proto(&mut self, protocol: u8) -> Result<(), BuildHeaderError> {
        match self.data.get_mut(IP_PROTO_OFFSET) {
            Some(byte) => {
                *byte = protocol;
                Ok(())
            }
            None => Err(BuildHeaderError::HeaderSpace {
                required: IP_PROTO_OFFSET + 1,
            }),
        }
    }

    /// Computes and stores the checksum of the outer IPv4 header.
    pub(crate) fn finalize_ipv4_checksum(&mut self) -> Result<(), BuildHeaderError> {
        use crate::checksum::Sum16BitWords;
        use crate::net::ipv4::Ipv4Header;

        let end = EthernetHeader::LEN + Ipv4Header::LEN;
        if self.data.len() < end {
            return Err(BuildHeaderError::HeaderSpace { required: end });
        }
        let csum_at = EthernetHeader::LEN + 10;
        self.data[csum_at] = 0;
        self.data[csum_at + 1] = 0;
        let checksum = Sum16BitWords::new()
            .add_slice(&self.data[EthernetHeader::LEN..end])
            .ones_complement();
        self.data[csum_at..csum_at + 2].copy_from_slice(&checksum.to_be_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn append_and_overflow() {
        let mut header = TunnelHeader::new();
        assert!(header.is_empty());
        header.append(&[0u8; 100]).unwrap();
        assert_eq!(header.len(), 100);
        assert_eq!(
            header.append(&[0u8; 29]).unwrap_err(),
            crate::err::BuildHeaderError::HeaderSpace { required: 129 }
        );
        header.append(&[1u8; 28]).unwrap();
        assert_eq!(header.len(), TNL_PUSH_HEADER_SIZE);
    }

    #[test]
    fn ip_proto_offset() {
        let mut header = TunnelHeader::new();
        header.append(&[0u8; 34]).unwrap();
        header.set_ip_proto(17).unwrap();
        assert_eq!(header.as_bytes()[23], 17);

        let mut short = TunnelHeader::new();
        assert!(short.set_ip_proto(17).is_err());
    }
}
