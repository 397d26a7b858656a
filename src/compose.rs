//! Helpers composing & rewriting packets in caller owned buffers.
//!
//! The building helpers append to a `Vec<u8>`; the rewrite helpers work in
//! place on a `&mut [u8]` that starts at the header being rewritten and
//! keep the ones complement transport checksums consistent incrementally.

use crate::checksum;
use crate::err::LenError;
use crate::link::eth_addr::EthAddr;
use crate::link::ethernet::{EthernetHeader, ETH_TYPE_ARP, ETH_TYPE_RARP};
use crate::link::llc_snap::LlcSnapHeader;
use crate::link::mpls::MplsLse;
use crate::net::arp::{ArpEthHeader, ARP_OP_REQUEST, ARP_OP_RREQUEST};
use crate::net::icmpv6::{NdMsg, NdOption, ND_OPT_SOURCE_LINKADDR, ND_OPT_TARGET_LINKADDR};
use crate::net::ipv4::{Ipv4Header, IP_DONT_FRAGMENT, IP_VER_IHL_NO_OPTIONS};
use crate::net::ipv6::Ipv6Header;
use crate::transport::sctp::SctpHeader;
use crate::transport::tcp::TcpHeader;
use crate::transport::udp::UdpHeader;
use crate::wire::{Be16, WireLayout};
use core::net::{Ipv4Addr, Ipv6Addr};

/// Appends an Ethernet II header.
pub fn push_eth(buf: &mut Vec<u8>, destination: EthAddr, source: EthAddr, ether_type: u16) {
    buf.extend_from_slice(EthernetHeader::new(destination, source, ether_type).as_bytes());
}

/// Appends an 802.3 Ethernet header with an LLC + SNAP encapsulation for a
/// payload of `payload_len` bytes.
pub fn push_snap(
    buf: &mut Vec<u8>,
    destination: EthAddr,
    source: EthAddr,
    snap_type: u16,
    payload_len: u16,
) {
    buf.extend_from_slice(
        EthernetHeader::new(
            destination,
            source,
            payload_len + LlcSnapHeader::LEN as u16,
        )
        .as_bytes(),
    );
    buf.extend_from_slice(LlcSnapHeader::for_ethernet(snap_type).as_bytes());
}

/// Appends an IPv4 header (no options) with its checksum filled in.
#[allow(clippy::too_many_arguments)]
pub fn push_ipv4(
    buf: &mut Vec<u8>,
    source: Ipv4Addr,
    destination: Ipv4Addr,
    tos: u8,
    ttl: u8,
    protocol: u8,
    dont_fragment: bool,
    payload_len: u16,
) {
    let mut header = Ipv4Header {
        ver_ihl: IP_VER_IHL_NO_OPTIONS,
        tos,
        total_len: Be16::new(payload_len + Ipv4Header::LEN as u16),
        id: Be16::ZERO,
        frag_off: Be16::new(if dont_fragment { IP_DONT_FRAGMENT } else { 0 }),
        ttl,
        protocol,
        checksum: Be16::ZERO,
        source: source.into(),
        destination: destination.into(),
    };
    header.update_checksum();
    buf.extend_from_slice(header.as_bytes());
}

/// Appends an IPv6 fixed header.
#[allow(clippy::too_many_arguments)]
pub fn push_ipv6(
    buf: &mut Vec<u8>,
    source: Ipv6Addr,
    destination: Ipv6Addr,
    traffic_class: u8,
    hop_limit: u8,
    next_header: u8,
    payload_len: u16,
) {
    buf.extend_from_slice(
        Ipv6Header::new(
            traffic_class,
            0,
            payload_len,
            next_header,
            hop_limit,
            source,
            destination,
        )
        .as_bytes(),
    );
}

/// Builds a complete Ethernet / IPv4 ARP frame. Requests go to the
/// broadcast address with a zeroed target hardware address.
pub fn compose_arp(
    buf: &mut Vec<u8>,
    op: u16,
    sender_hw: EthAddr,
    sender_ip: Ipv4Addr,
    target_hw: EthAddr,
    target_ip: Ipv4Addr,
) {
    let eth_dst = if op == ARP_OP_REQUEST {
        EthAddr::BROADCAST
    } else {
        target_hw
    };
    let arp_tha = if op == ARP_OP_REQUEST {
        EthAddr::ZERO
    } else {
        target_hw
    };
    push_eth(buf, eth_dst, sender_hw, ETH_TYPE_ARP);
    buf.extend_from_slice(
        ArpEthHeader::new(op, sender_hw, sender_ip, arp_tha, target_ip).as_bytes(),
    );
}

/// Builds the broadcast RARP request a port announces itself with
/// (RFC 903).
pub fn compose_rarp(buf: &mut Vec<u8>, hw: EthAddr) {
    push_eth(buf, EthAddr::BROADCAST, hw, ETH_TYPE_RARP);
    buf.extend_from_slice(
        ArpEthHeader::new(
            ARP_OP_RREQUEST,
            hw,
            Ipv4Addr::UNSPECIFIED,
            hw,
            Ipv4Addr::UNSPECIFIED,
        )
        .as_bytes(),
    );
}

/// Inserts an 802.1Q tag into an Ethernet frame (after the address pair).
pub fn push_vlan(frame: &mut Vec<u8>, tpid: u16, tci: u16) -> Result<(), LenError> {
    if frame.len() < 12 {
        return Err(LenError {
            required: 12,
            actual: frame.len(),
        });
    }
    let mut tag = [0u8; 4];
    tag[..2].copy_from_slice(&tpid.to_be_bytes());
    tag[2..].copy_from_slice(&tci.to_be_bytes());
    frame.splice(12..12, tag);
    Ok(())
}

/// Removes the outermost 802.1Q tag of an Ethernet frame, if any. Returns
/// the TCI of the removed tag.
pub fn pop_vlan(frame: &mut Vec<u8>) -> Option<u16> {
    use crate::link::ethernet::{ETH_TYPE_VLAN_8021AD, ETH_TYPE_VLAN_8021Q};
    if frame.len() < EthernetHeader::LEN + 4 {
        return None;
    }
    let tpid = u16::from_be_bytes([frame[12], frame[13]]);
    if tpid != ETH_TYPE_VLAN_8021Q && tpid != ETH_TYPE_VLAN_8021AD {
        return None;
    }
    let tci = u16::from_be_bytes([frame[14], frame[15]]);
    frame.drain(12..16);
    Some(tci)
}

/// Pushes an MPLS label stack entry behind the Ethernet header and rewrites
/// the ether type (`ETH_TYPE_MPLS` or `ETH_TYPE_MPLS_MCAST`).
pub fn push_mpls(frame: &mut Vec<u8>, ether_type: u16, lse: MplsLse) -> Result<(), LenError> {
    if frame.len() < EthernetHeader::LEN {
        return Err(LenError {
            required: EthernetHeader::LEN,
            actual: frame.len(),
        });
    }
    frame[12..14].copy_from_slice(&ether_type.to_be_bytes());
    let bytes: [u8; 4] = lse.lse.bytes();
    frame.splice(EthernetHeader::LEN..EthernetHeader::LEN, bytes);
    Ok(())
}

/// Pops the outermost MPLS label stack entry and restores `next_type` as
/// the ether type. Returns the removed entry.
pub fn pop_mpls(frame: &mut Vec<u8>, next_type: u16) -> Result<MplsLse, LenError> {
    let (lse, _) = MplsLse::from_slice(frame.get(EthernetHeader::LEN..).unwrap_or(&[]))?;
    frame[12..14].copy_from_slice(&next_type.to_be_bytes());
    frame.drain(EthernetHeader::LEN..EthernetHeader::LEN + MplsLse::LEN);
    Ok(lse)
}

/// Rewrites the port pair of a UDP header in place, updating the checksum
/// incrementally (a zero checksum stays zero: no checksum in use).
pub fn set_udp_ports(udp: &mut [u8], source: u16, destination: u16) -> Result<(), LenError> {
    if udp.len() < UdpHeader::LEN {
        return Err(LenError {
            required: UdpHeader::LEN,
            actual: udp.len(),
        });
    }
    let old_src = u16::from_be_bytes([udp[0], udp[1]]);
    let old_dst = u16::from_be_bytes([udp[2], udp[3]]);
    let checksum = u16::from_be_bytes([udp[6], udp[7]]);
    if checksum != 0 {
        let updated = checksum::recalc_16(checksum::recalc_16(checksum, old_src, source), old_dst, destination);
        udp[6..8].copy_from_slice(&updated.to_be_bytes());
    }
    udp[0..2].copy_from_slice(&source.to_be_bytes());
    udp[2..4].copy_from_slice(&destination.to_be_bytes());
    Ok(())
}

/// Rewrites the port pair of a TCP header in place, updating the checksum
/// incrementally.
pub fn set_tcp_ports(tcp: &mut [u8], source: u16, destination: u16) -> Result<(), LenError> {
    if tcp.len() < TcpHeader::LEN {
        return Err(LenError {
            required: TcpHeader::LEN,
            actual: tcp.len(),
        });
    }
    let old_src = u16::from_be_bytes([tcp[0], tcp[1]]);
    let old_dst = u16::from_be_bytes([tcp[2], tcp[3]]);
    let checksum = u16::from_be_bytes([tcp[16], tcp[17]]);
    let updated = checksum::recalc_16(checksum::recalc_16(checksum, old_src, source), old_dst, destination);
    tcp[16..18].copy_from_slice(&updated.to_be_bytes());
    tcp[0..2].copy_from_slice(&source.to_be_bytes());
    tcp[2..4].copy_from_slice(&destination.to_be_bytes());
    Ok(())
}

/// Rewrites the port pair of an SCTP header in place. The CRC32c checksum
/// does not cover a pseudo header, so it is left for the datapath to
/// recompute.
pub fn set_sctp_ports(sctp: &mut [u8], source: u16, destination: u16) -> Result<(), LenError> {
    if sctp.len() < SctpHeader::LEN {
        return Err(LenError {
            required: SctpHeader::LEN,
            actual: sctp.len(),
        });
    }
    sctp[0..2].copy_from_slice(&source.to_be_bytes());
    sctp[2..4].copy_from_slice(&destination.to_be_bytes());
    Ok(())
}

/// Rewrites type & code of an ICMP message in place, updating the checksum
/// incrementally.
pub fn set_icmp_type_code(icmp: &mut [u8], msg_type: u8, code: u8) -> Result<(), LenError> {
    if icmp.len() < 4 {
        return Err(LenError {
            required: 4,
            actual: icmp.len(),
        });
    }
    let old = u16::from_be_bytes([icmp[0], icmp[1]]);
    let new = u16::from_be_bytes([msg_type, code]);
    let checksum = u16::from_be_bytes([icmp[2], icmp[3]]);
    let updated = checksum::recalc_16(checksum, old, new);
    icmp[0] = msg_type;
    icmp[1] = code;
    icmp[2..4].copy_from_slice(&updated.to_be_bytes());
    Ok(())
}

/// Rewrites the target of a neighbor discovery message and the link layer
/// addresses in its source/target options, keeping the ICMPv6 checksum
/// consistent. `nd` starts at the ICMPv6 header of the ND message.
pub fn set_nd(
    nd: &mut [u8],
    target: Ipv6Addr,
    source_ll: Option<EthAddr>,
    target_ll: Option<EthAddr>,
) -> Result<(), LenError> {
    if nd.len() < NdMsg::LEN {
        return Err(LenError {
            required: NdMsg::LEN,
            actual: nd.len(),
        });
    }

    let mut checksum = u16::from_be_bytes([nd[2], nd[3]]);

    let new_target = target.octets();
    for i in 0..8 {
        let at = 8 + i * 2;
        let old = u16::from_be_bytes([nd[at], nd[at + 1]]);
        let new = u16::from_be_bytes([new_target[i * 2], new_target[i * 2 + 1]]);
        checksum = checksum::recalc_16(checksum, old, new);
    }
    nd[8..24].copy_from_slice(&new_target);

    // walk the options for link layer addresses
    let mut at = NdMsg::LEN;
    while nd.len() >= at + NdOption::LEN {
        let opt_type = nd[at];
        let opt_len = nd[at + 1] as usize * 8;
        if opt_len == 0 || nd.len() < at + opt_len {
            break;
        }
        let replacement = match opt_type {
            ND_OPT_SOURCE_LINKADDR => source_ll,
            ND_OPT_TARGET_LINKADDR => target_ll,
            _ => None,
        };
        if let Some(addr) = replacement {
            if opt_len == NdOption::LEN {
                let new = addr.octets();
                for i in 0..3 {
                    let field = at + 2 + i * 2;
                    let old = u16::from_be_bytes([nd[field], nd[field + 1]]);
                    let word = u16::from_be_bytes([new[i * 2], new[i * 2 + 1]]);
                    checksum = checksum::recalc_16(checksum, old, word);
                }
                nd[at + 2..at + 8].copy_from_slice(&new);
            }
        }
        at += opt_len;
    }

    nd[2..4].copy_from_slice(&checksum.to_be_bytes());
    Ok(())
}
