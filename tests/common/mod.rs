//! Test doubles shared by the integration tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tunport::err::BuildHeaderError;
use tunport::{
    FlowTnl, NativeTunnelSink, OdpPort, TunnelConfig, TunnelHeader, TunnelNetdev, UdpHeader,
    VxlanHeader, WireLayout, IP_PROTO_UDP,
};

/// A VXLAN flavored netdev with a mutable configuration.
pub struct MockNetdev {
    name: String,
    config: Mutex<TunnelConfig>,
    change_seq: AtomicU64,
}

impl MockNetdev {
    pub fn new(name: &str, config: TunnelConfig) -> MockNetdev {
        MockNetdev {
            name: name.to_string(),
            config: Mutex::new(config),
            change_seq: AtomicU64::new(1),
        }
    }

    /// Applies a new configuration, bumping the change sequence.
    pub fn set_config(&self, config: TunnelConfig) {
        *self.config.lock().unwrap() = config;
        self.change_seq.fetch_add(1, Ordering::SeqCst);
    }
}

impl TunnelNetdev for MockNetdev {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "vxlan"
    }

    fn tunnel_config(&self) -> TunnelConfig {
        self.config.lock().unwrap().clone()
    }

    fn change_seq(&self) -> u64 {
        self.change_seq.load(Ordering::SeqCst)
    }

    fn build_header(
        &self,
        header: &mut TunnelHeader,
        tnl: &FlowTnl,
    ) -> Result<(), BuildHeaderError> {
        header.set_ip_proto(IP_PROTO_UDP)?;
        let dst_port = self.tunnel_config().dst_port;
        header.append(UdpHeader::new(0, dst_port, VxlanHeader::LEN as u16).as_bytes())?;
        header.append(VxlanHeader::new(tnl.tun_id as u32).as_bytes())?;
        Ok(())
    }
}

/// Records native tunnel registrations.
#[derive(Default)]
pub struct RecordingSink {
    pub inserts: Mutex<Vec<(OdpPort, u16, String)>>,
    pub removes: Mutex<Vec<u16>>,
}

impl NativeTunnelSink for RecordingSink {
    fn insert(&self, odp_port: OdpPort, dst_port: u16, name: &str) {
        self.inserts
            .lock()
            .unwrap()
            .push((odp_port, dst_port, name.to_string()));
    }

    fn remove(&self, dst_port: u16) {
        self.removes.lock().unwrap().push(dst_port);
    }
}
