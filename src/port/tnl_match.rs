use crate::flow::flow::Flow;
use crate::flow::port_id::{OdpPort, IPSEC_MARK};
use crate::net::ipv6_addr;
use crate::port::netdev::TunnelConfig;
use core::fmt;
use core::mem::{offset_of, size_of};
use core::net::Ipv6Addr;

/// Number of match buckets: (in_key_flow) x (ip_dst_flow) x (ip_src_kind).
pub(crate) const TNL_MATCH_MAPS: usize = 2 * 2 * 3;

/// How the source address of a match constrains a flow, from most to
/// least specific.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum IpSrcKind {
    /// Fixed by the configuration.
    Cfg = 0,
    /// Any source.
    Any = 1,
    /// Left to the flow table.
    Flow = 2,
}

/// Registry key of a tunnel port, expressed from the port's sending
/// perspective. Zero initialized with explicit padding so the whole record
/// hashes and compares deterministically.
#[repr(C)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub(crate) struct TnlMatch {
    /// Tunnel id; zero while `in_key_flow` is set.
    pub in_key: u64,
    /// IPv4 carried in mapped form; zero while `ip_src_flow` is set.
    pub ipv6_src: [u8; 16],
    pub ipv6_dst: [u8; 16],
    pub odp_port: OdpPort,
    /// `IPSEC_MARK` for IPsec protected tunnels, zero otherwise.
    pub pkt_mark: u32,
    pub in_key_flow: bool,
    pub ip_src_flow: bool,
    pub ip_dst_flow: bool,
    pub pad: [u8; 5],
}

// The tuple must stay contiguous with no implicit padding so the derived
// Hash/Eq cover exactly the declared fields.
const _: () = assert!(size_of::<TnlMatch>() == 56);
const _: () = assert!(offset_of!(TnlMatch, ipv6_src) == 8);
const _: () = assert!(offset_of!(TnlMatch, ipv6_dst) == 24);
const _: () = assert!(offset_of!(TnlMatch, odp_port) == 40);
const _: () = assert!(offset_of!(TnlMatch, pkt_mark) == 44);
const _: () = assert!(offset_of!(TnlMatch, pad) == 51);

impl TnlMatch {
    /// The match of a port with the given tunnel configuration.
    pub(crate) fn from_config(cfg: &TunnelConfig, odp_port: OdpPort) -> TnlMatch {
        TnlMatch {
            in_key: if cfg.in_key_flow { 0 } else { cfg.in_key },
            ipv6_src: if cfg.ip_src_flow {
                [0; 16]
            } else {
                cfg.ipv6_src.octets()
            },
            ipv6_dst: if cfg.ip_dst_flow {
                [0; 16]
            } else {
                cfg.ipv6_dst.octets()
            },
            odp_port,
            pkt_mark: if cfg.ipsec { IPSEC_MARK } else { 0 },
            in_key_flow: cfg.in_key_flow,
            ip_src_flow: cfg.ip_src_flow,
            ip_dst_flow: cfg.ip_dst_flow,
            pad: [0; 5],
        }
    }

    /// The synthetic match a received flow produces in the given bucket.
    ///
    /// The registry stores matches from the port's *sending* perspective,
    /// so the received packet's outer destination fills the match source
    /// and the outer source fills the match destination.
    pub(crate) fn for_lookup(flow: &Flow, bucket: usize) -> TnlMatch {
        let (in_key_flow, ip_dst_flow, src_kind) = bucket_coords(bucket);
        TnlMatch {
            in_key: if in_key_flow { 0 } else { flow.tunnel.tun_id },
            ipv6_src: if src_kind == IpSrcKind::Cfg {
                flow.tunnel.dst6().octets()
            } else {
                [0; 16]
            },
            ipv6_dst: if ip_dst_flow {
                [0; 16]
            } else {
                flow.tunnel.src6().octets()
            },
            odp_port: flow.in_port,
            pkt_mark: flow.pkt_mark,
            in_key_flow,
            ip_src_flow: src_kind == IpSrcKind::Flow,
            ip_dst_flow,
            pad: [0; 5],
        }
    }

    pub(crate) fn ip_src_kind(&self) -> IpSrcKind {
        if self.ip_src_flow {
            IpSrcKind::Flow
        } else if self.ipv6_src != [0; 16] {
            IpSrcKind::Cfg
        } else {
            IpSrcKind::Any
        }
    }

    /// Bucket of this match; lower indices are searched first on receive.
    pub(crate) fn bucket_index(&self) -> usize {
        6 * self.in_key_flow as usize + 3 * self.ip_dst_flow as usize + self.ip_src_kind() as usize
    }
}

/// Decomposes a bucket index into its coordinates (inverse of
/// [`TnlMatch::bucket_index`]).
pub(crate) fn bucket_coords(bucket: usize) -> (bool, bool, IpSrcKind) {
    debug_assert!(bucket < TNL_MATCH_MAPS);
    let src_kind = match bucket % 3 {
        0 => IpSrcKind::Cfg,
        1 => IpSrcKind::Any,
        _ => IpSrcKind::Flow,
    };
    (bucket >= 6, (bucket % 6) >= 3, src_kind)
}

fn fmt_endpoint(f: &mut fmt::Formatter<'_>, octets: [u8; 16], flow_controlled: bool) -> fmt::Result {
    if flow_controlled {
        write!(f, "flow")
    } else if octets == [0; 16] {
        write!(f, "any")
    } else {
        let addr = Ipv6Addr::from(octets);
        match ipv6_addr::mapped_ipv4(addr) {
            Some(v4) => write!(f, "{v4}"),
            None => write!(f, "{addr}"),
        }
    }
}

impl fmt::Display for TnlMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.in_key_flow {
            write!(f, "id=flow")?;
        } else {
            write!(f, "id={:#x}", self.in_key)?;
        }
        write!(f, ", src=")?;
        fmt_endpoint(f, self.ipv6_src, self.ip_src_flow)?;
        write!(f, ", dst=")?;
        fmt_endpoint(f, self.ipv6_dst, self.ip_dst_flow)?;
        write!(
            f,
            ", dp port={}, pkt mark={}",
            self.odp_port, self.pkt_mark
        )
    }
}
