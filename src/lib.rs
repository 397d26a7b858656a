//! Tunnel port demultiplexing & encapsulation for a software virtual
//! switch: decide which logical tunnel port a received packet belongs to,
//! and which datapath port & outer header fields to use when sending.
//!
//! The crate provides:
//!
//! * Bit exact, alignment safe layouts of the headers involved (Ethernet II,
//!   LLC/SNAP, 802.1Q VLAN, MPLS, IPv4/IPv6, ICMP, IGMP/MLD, neighbor
//!   discovery, ARP, TCP/UDP/SCTP, GRE, VXLAN) plus address & checksum
//!   primitives ([`wire`], [`checksum`], [`compose`]).
//! * A concurrent, reader heavy registry of tunnel ports partitioned by
//!   wildcarding pattern, with a deterministic most-specific-first lookup
//!   ([`TnlPorts`]).
//! * The send path rewrite of a flow's outer tunnel fields ([`TnlPorts::send`]),
//!   the ECN tunneling discipline of RFC 6040 ([`process_ecn`]) and the
//!   outer Ethernet + IPv4 header builder used by push tunnel actions
//!   ([`TnlPorts::build_header`]).
//!
//! What a tunnel actually looks like on the wire stays behind the
//! [`TunnelNetdev`] trait; the registry does not know VXLAN from GRE.
//!
//! # Example
//!
//! ```ignore
//! use tunport::{Flow, FlowWildcards, OdpPort, OfPort, TnlPorts};
//!
//! let ports = TnlPorts::new();
//! ports.add(OfPort(1), vxlan_netdev, OdpPort(3), true)?;
//!
//! if tunport::should_receive(&flow) {
//!     if let Some(ofport) = ports.receive(&flow) {
//!         if tunport::process_ecn(&mut flow) {
//!             // re-classify the inner packet against `ofport`
//!         }
//!     }
//! }
//! ```
//!
//! # References
//! * Virtual eXtensible Local Area Network (VXLAN) [RFC 7348](https://datatracker.ietf.org/doc/html/rfc7348)
//! * Generic Routing Encapsulation (GRE) [RFC 2784](https://datatracker.ietf.org/doc/html/rfc2784)
//! * The Addition of Explicit Congestion Notification (ECN) to IP [RFC 3168](https://datatracker.ietf.org/doc/html/rfc3168)
//! * Tunnelling of Explicit Congestion Notification [RFC 6040](https://datatracker.ietf.org/doc/html/rfc6040)
//! * Computing the Internet Checksum [RFC 1071](https://datatracker.ietf.org/doc/html/rfc1071)
//! * Incremental Updating of the Internet Checksum [RFC 1624](https://datatracker.ietf.org/doc/html/rfc1624)

/// Module containing error types that can be triggered.
pub mod err;

pub mod wire;
pub use crate::wire::{Be16, Be32A16, Ipv6A16, WireLayout};

/// Helpers for calculating checksums.
pub mod checksum;

mod link;
pub use crate::link::eth_addr::*;
pub use crate::link::ethernet::*;
pub use crate::link::llc_snap::*;
pub use crate::link::mpls::*;
pub use crate::link::vlan::*;

mod net;
pub use crate::net::arp::*;
pub use crate::net::ecn::*;
pub use crate::net::icmpv4::*;
pub use crate::net::icmpv6::*;
pub use crate::net::igmp::*;
pub use crate::net::ip_proto::*;
pub use crate::net::ipv4::*;
pub use crate::net::ipv4_addr;
pub use crate::net::ipv6::*;
pub use crate::net::ipv6_addr;
pub use crate::net::ipv6_frag::*;

mod transport;
pub use crate::transport::sctp::*;
pub use crate::transport::tcp::*;
pub use crate::transport::udp::*;

mod tunnel;
pub use crate::tunnel::gre::*;
pub use crate::tunnel::vxlan::*;

pub mod compose;

mod flow;
pub use crate::flow::flow::Flow;
pub use crate::flow::flow_tnl::*;
pub use crate::flow::port_id::*;
pub use crate::flow::wildcards::FlowWildcards;

mod port;
pub use crate::port::netdev::{
    NativeTunnelSink, TunnelConfig, TunnelHeader, TunnelNetdev, TNL_PUSH_HEADER_SIZE,
};
pub use crate::port::ratelimit::RateLimit;
pub use crate::port::tnl_ports::{process_ecn, should_receive, wc_init, TnlPorts};
