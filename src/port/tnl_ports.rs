//! The tunnel port registry and the lookup, send and receive paths built
//! on top of it.

use crate::err::{AddPortError, BuildHeaderError};
use crate::flow::flow::Flow;
use crate::flow::flow_tnl::{
    FLOW_TNL_F_CSUM, FLOW_TNL_F_DONT_FRAGMENT, FLOW_TNL_F_KEY, FLOW_TNL_F_MASK,
};
use crate::flow::port_id::{OdpPort, OfPort, IPSEC_MARK};
use crate::flow::wildcards::FlowWildcards;
use crate::link::eth_addr::EthAddr;
use crate::link::ethernet::{EthernetHeader, ETH_TYPE_IP};
use crate::net::ecn::{Ecn, IP_DSCP_MASK};
use crate::net::ipv4::{Ipv4Header, IP_DONT_FRAGMENT, IP_VER_IHL_NO_OPTIONS};
use crate::net::ipv6_addr;
use crate::port::netdev::{NativeTunnelSink, TunnelHeader, TunnelNetdev};
use crate::port::ratelimit::RateLimit;
use crate::port::tnl_match::{TnlMatch, TNL_MATCH_MAPS};
use crate::wire::{Be16, Be32A16, WireLayout};
use ahash::AHashMap;
use core::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, LazyLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, warn};

static RECV_MISS_RL: LazyLock<RateLimit> =
    LazyLock::new(|| RateLimit::new(1, Duration::from_secs(5)));
static ECN_DROP_RL: LazyLock<RateLimit> =
    LazyLock::new(|| RateLimit::new(1, Duration::from_secs(5)));

/// A registered tunnel port. Owned by the registry, referenced from the
/// handle index and from exactly one match bucket.
struct TnlPort {
    netdev: Arc<dyn TunnelNetdev>,
    /// Sequence number of the netdev at registration time; a drift makes
    /// `reconfigure` rebuild the port.
    change_seq: u64,
    native_tnl: bool,
    tnl_match: TnlMatch,
}

#[derive(Default)]
struct PortTables {
    by_handle: AHashMap<OfPort, TnlPort>,
    /// Match index partitioned by wildcarding pattern. Buckets are
    /// allocated on first insertion and freed when they become empty, so
    /// the receive path can skip unused patterns cheaply.
    match_maps: [Option<AHashMap<TnlMatch, OfPort>>; TNL_MATCH_MAPS],
}

/// Registry of tunnel ports: two indices (by port handle and by match
/// tuple) behind one readers-writer lock.
///
/// Lookups (`receive`, `send`, `build_header`) run concurrently; mutations
/// (`add`, `del`, `reconfigure`) are exclusive. The effect of a mutation
/// is visible to every lookup that acquires the lock afterwards.
#[derive(Default)]
pub struct TnlPorts {
    tables: RwLock<PortTables>,
    native: Option<Arc<dyn NativeTunnelSink>>,
}

impl TnlPorts {
    /// An empty registry.
    pub fn new() -> TnlPorts {
        Default::default()
    }

    /// An empty registry that reports native (userspace terminated)
    /// tunnel ports to `sink`.
    pub fn with_native_sink(sink: Arc<dyn NativeTunnelSink>) -> TnlPorts {
        TnlPorts {
            tables: RwLock::new(Default::default()),
            native: Some(sink),
        }
    }

    fn read_tables(&self) -> RwLockReadGuard<'_, PortTables> {
        self.tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_tables(&self) -> RwLockWriteGuard<'_, PortTables> {
        self.tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of registered tunnel ports.
    pub fn count(&self) -> usize {
        self.read_tables().by_handle.len()
    }

    /// Cheap check whether any tunnel port exists at all, letting callers
    /// skip tunnel processing entirely.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Registers a tunnel port. Fails if a port with an identical match
    /// tuple already exists.
    pub fn add(
        &self,
        ofport: OfPort,
        netdev: Arc<dyn TunnelNetdev>,
        odp_port: OdpPort,
        native_tnl: bool,
    ) -> Result<(), AddPortError> {
        let mut tables = self.write_tables();
        self.add_locked(&mut tables, ofport, netdev, odp_port, native_tnl, true)
    }

    fn add_locked(
        &self,
        tables: &mut PortTables,
        ofport: OfPort,
        netdev: Arc<dyn TunnelNetdev>,
        odp_port: OdpPort,
        native_tnl: bool,
        warn_on_duplicate: bool,
    ) -> Result<(), AddPortError> {
        let cfg = netdev.tunnel_config();
        let tnl_match = TnlMatch::from_config(&cfg, odp_port);
        let index = tnl_match.bucket_index();

        if let Some(existing) = tables.match_maps[index]
            .as_ref()
            .and_then(|map| map.get(&tnl_match))
        {
            let existing_name = tables
                .by_handle
                .get(existing)
                .map(|port| port.netdev.name().to_string())
                .unwrap_or_default();
            if warn_on_duplicate {
                warn!(
                    port = netdev.name(),
                    existing = existing_name.as_str(),
                    tnl_match = %tnl_match,
                    "attempt to add tunnel port with same config as existing port"
                );
            }
            return Err(AddPortError::DuplicateMatch(existing_name));
        }

        if native_tnl {
            if let Some(sink) = &self.native {
                sink.insert(odp_port, cfg.dst_port, netdev.name());
            }
        }
        tables.match_maps[index]
            .get_or_insert_with(AHashMap::new)
            .insert(tnl_match, ofport);
        debug!(port = netdev.name(), kind = netdev.kind(), tnl_match = %tnl_match, "added tunnel port");
        tables.by_handle.insert(
            ofport,
            TnlPort {
                change_seq: netdev.change_seq(),
                netdev,
                native_tnl,
                tnl_match,
            },
        );
        Ok(())
    }

    /// Removes a tunnel port. Unknown handles are ignored.
    pub fn del(&self, ofport: OfPort) {
        let mut tables = self.write_tables();
        self.del_locked(&mut tables, ofport);
    }

    fn del_locked(&self, tables: &mut PortTables, ofport: OfPort) {
        let Some(port) = tables.by_handle.remove(&ofport) else {
            return;
        };
        if port.native_tnl {
            if let Some(sink) = &self.native {
                sink.remove(port.netdev.tunnel_config().dst_port);
            }
        }
        let index = port.tnl_match.bucket_index();
        if let Some(map) = &mut tables.match_maps[index] {
            map.remove(&port.tnl_match);
            if map.is_empty() {
                tables.match_maps[index] = None;
            }
        }
        debug!(port = port.netdev.name(), tnl_match = %port.tnl_match, "removed tunnel port");
    }

    /// Brings the port for `ofport` in sync with `netdev`: adds it when
    /// absent, rebuilds it when the netdev identity, the datapath port or
    /// the netdev's change sequence moved. Returns whether anything
    /// changed.
    pub fn reconfigure(
        &self,
        ofport: OfPort,
        netdev: Arc<dyn TunnelNetdev>,
        odp_port: OdpPort,
        native_tnl: bool,
    ) -> bool {
        let mut tables = self.write_tables();
        let changed = match tables.by_handle.get(&ofport) {
            None => true,
            Some(port) => {
                !Arc::ptr_eq(&port.netdev, &netdev)
                    || port.tnl_match.odp_port != odp_port
                    || port.change_seq != netdev.change_seq()
            }
        };
        if changed {
            self.del_locked(&mut tables, ofport);
            let _ = self.add_locked(&mut tables, ofport, netdev, odp_port, native_tnl, false);
        }
        changed
    }

    /// Finds the tunnel port that claims the received `flow`, searching the
    /// match buckets from most to least specific. A miss means no port has
    /// claimed the flow.
    pub fn receive(&self, flow: &Flow) -> Option<OfPort> {
        let tables = self.read_tables();
        for bucket in 0..TNL_MATCH_MAPS {
            let Some(map) = &tables.match_maps[bucket] else {
                continue;
            };
            if let Some(&ofport) = map.get(&TnlMatch::for_lookup(flow, bucket)) {
                return Some(ofport);
            }
        }
        if RECV_MISS_RL.check() {
            warn!(flow = ?flow, "receive tunnel port not found");
        }
        None
    }

    /// Fills the outer tunnel fields of `flow` from the port's
    /// configuration and widens `wc` for every inner field read in the
    /// process. Returns the datapath port to emit on, or `None` for an
    /// unknown handle (leaving `flow` untouched).
    pub fn send(&self, ofport: OfPort, flow: &mut Flow, wc: &mut FlowWildcards) -> Option<OdpPort> {
        let tables = self.read_tables();
        let port = tables.by_handle.get(&ofport)?;
        let cfg = port.netdev.tunnel_config();

        if !cfg.ip_src_flow {
            let src = Ipv6Addr::from(port.tnl_match.ipv6_src);
            match ipv6_addr::mapped_ipv4(src) {
                Some(v4) => flow.tunnel.set_ipv4_src(v4),
                None => flow.tunnel.ipv6_src = port.tnl_match.ipv6_src,
            }
        }
        if !cfg.ip_dst_flow {
            let dst = Ipv6Addr::from(port.tnl_match.ipv6_dst);
            match ipv6_addr::mapped_ipv4(dst) {
                Some(v4) => flow.tunnel.set_ipv4_dst(v4),
                None => flow.tunnel.ipv6_dst = port.tnl_match.ipv6_dst,
            }
        }
        flow.pkt_mark = port.tnl_match.pkt_mark;

        if !cfg.out_key_flow {
            flow.tunnel.tun_id = cfg.out_key;
        }

        if cfg.ttl_inherit && flow.is_ip() {
            wc.masks.nw_ttl = 0xff;
            flow.tunnel.ip_ttl = flow.nw_ttl;
        } else {
            flow.tunnel.ip_ttl = cfg.ttl;
        }

        if cfg.tos_inherit && flow.is_ip() {
            wc.masks.nw_tos |= IP_DSCP_MASK;
            flow.tunnel.ip_tos = flow.nw_tos & IP_DSCP_MASK;
        } else {
            flow.tunnel.ip_tos = cfg.tos;
        }

        // ECN is always inherited. A congestion marked inner packet gets
        // ECT(0) on the outside so the outer header never claims CE for a
        // transport that is not ECN capable (RFC 6040).
        if flow.is_ip() {
            wc.masks.nw_tos |= Ecn::MASK;
            let inner = Ecn::from_tos(flow.nw_tos);
            flow.tunnel.ip_tos |= if inner.is_ce() {
                Ecn::Ect0.value()
            } else {
                inner.value()
            };
        }

        flow.tunnel.flags &= !(FLOW_TNL_F_DONT_FRAGMENT | FLOW_TNL_F_CSUM | FLOW_TNL_F_KEY);
        if cfg.dont_fragment {
            flow.tunnel.flags |= FLOW_TNL_F_DONT_FRAGMENT;
        }
        if cfg.csum {
            flow.tunnel.flags |= FLOW_TNL_F_CSUM;
        }
        if cfg.out_key_present {
            flow.tunnel.flags |= FLOW_TNL_F_KEY;
        }

        Some(port.tnl_match.odp_port)
    }

    /// Composes the outer Ethernet + IPv4 prefix for a push tunnel action
    /// into `header`, lets the port's netdev append the L4 and tunnel
    /// bytes, then stores the IPv4 header checksum.
    ///
    /// The outer IPv4 total length stays zero; the datapath patches it per
    /// packet.
    pub fn build_header(
        &self,
        ofport: OfPort,
        flow: &Flow,
        dmac: EthAddr,
        smac: EthAddr,
        src_ip: Ipv4Addr,
        header: &mut TunnelHeader,
    ) -> Result<(), BuildHeaderError> {
        // take the netdev reference out of the lock; only the tunnel config
        // getter and the native sink may be called with it held
        let netdev = {
            let tables = self.read_tables();
            let port = tables
                .by_handle
                .get(&ofport)
                .ok_or(BuildHeaderError::UnknownPort)?;
            Arc::clone(&port.netdev)
        };

        header.clear();
        let eth = EthernetHeader::new(dmac, smac, ETH_TYPE_IP);
        header.append(eth.as_bytes())?;

        let ip = Ipv4Header {
            ver_ihl: IP_VER_IHL_NO_OPTIONS,
            tos: flow.tunnel.ip_tos,
            total_len: Be16::ZERO,
            id: Be16::ZERO,
            frag_off: Be16::new(if flow.tunnel.flags & FLOW_TNL_F_DONT_FRAGMENT != 0 {
                IP_DONT_FRAGMENT
            } else {
                0
            }),
            ttl: flow.tunnel.ip_ttl,
            protocol: 0,
            checksum: Be16::ZERO,
            source: src_ip.into(),
            destination: Be32A16::new(u32::from_be_bytes(flow.tunnel.ip_dst)),
        };
        header.append(ip.as_bytes())?;

        netdev.build_header(header, &flow.tunnel)?;
        header.finalize_ipv4_checksum()
    }
}

/// True iff the flow's outer tunnel destination is set in either family,
/// i.e. tunnel processing applies to it at all.
#[inline]
pub fn should_receive(flow: &Flow) -> bool {
    flow.tunnel.dst_is_set()
}

/// Unwildcards the tunnel fields a received tunnel flow was classified on.
///
/// The outer transport ports stay wildcarded on purpose; the inner ECN
/// bits are widened when the outer header carries CE because
/// [`process_ecn`] may rewrite them.
pub fn wc_init(flow: &Flow, wc: &mut FlowWildcards) {
    if !should_receive(flow) {
        return;
    }
    wc.masks.tunnel.tun_id = u64::MAX;
    if flow.tunnel.ip_dst != [0; 4] {
        wc.masks.tunnel.ip_src = [0xff; 4];
        wc.masks.tunnel.ip_dst = [0xff; 4];
    } else {
        wc.masks.tunnel.ipv6_src = [0xff; 16];
        wc.masks.tunnel.ipv6_dst = [0xff; 16];
    }
    wc.masks.tunnel.flags |= FLOW_TNL_F_MASK;
    wc.masks.tunnel.ip_tos = u8::MAX;
    wc.masks.tunnel.ip_ttl = u8::MAX;
    wc.masks.tunnel.tp_src = 0;
    wc.masks.tunnel.tp_dst = 0;
    wc.masks.pkt_mark = u32::MAX;
    if flow.is_ip() && Ecn::from_tos(flow.tunnel.ip_tos).is_ce() {
        wc.masks.nw_tos |= Ecn::MASK;
    }
}

/// Applies the ECN tunneling discipline to a received tunnel flow.
///
/// Outer CE with a non ECN capable inner packet drops the flow (returns
/// `false`); outer CE with an ECN capable inner packet marks the inner
/// packet with CE.
pub fn process_ecn(flow: &mut Flow) -> bool {
    if !should_receive(flow) {
        return true;
    }
    if flow.is_ip() && Ecn::from_tos(flow.tunnel.ip_tos).is_ce() {
        let inner = Ecn::from_tos(flow.nw_tos);
        if !inner.is_ect() {
            if ECN_DROP_RL.check() {
                warn!(flow = ?flow, "dropping tunnel packet marked ECN CE but is not ECN capable");
            }
            return false;
        }
        if !inner.is_ce() {
            flow.nw_tos |= Ecn::CongestionExperienced.value();
        }
    }
    // demux state, cleared whether or not this was an IPsec flow
    flow.pkt_mark &= !IPSEC_MARK;
    true
}
