mod common;

use common::MockNetdev;
use core::net::Ipv4Addr;
use std::sync::Arc;
use tunport::checksum::Sum16BitWords;
use tunport::err::BuildHeaderError;
use tunport::{
    ipv6_addr, EthAddr, EthernetHeader, Flow, FlowWildcards, Ipv4Header, OdpPort, OfPort,
    TnlPorts, TunnelConfig, TunnelHeader, UdpHeader, VxlanHeader,
};

fn config() -> TunnelConfig {
    TunnelConfig {
        ipv6_src: ipv6_addr::map_ipv4(Ipv4Addr::new(10, 0, 0, 1)),
        ipv6_dst: ipv6_addr::map_ipv4(Ipv4Addr::new(10, 0, 0, 2)),
        dst_port: 4789,
        out_key_present: true,
        out_key: 0x123456,
        dont_fragment: true,
        ttl: 64,
        tos: 0,
        ..Default::default()
    }
}

#[test]
fn vxlan_outer_header() {
    let ports = TnlPorts::new();
    let netdev = Arc::new(MockNetdev::new("vxlan0", config()));
    ports
        .add(OfPort(1), netdev, OdpPort(3), true)
        .unwrap();

    // populate the flow's tunnel fields the way the send path would
    let mut flow = Flow {
        dl_type: 0x0800,
        nw_ttl: 42,
        ..Default::default()
    };
    let mut wc = FlowWildcards::new();
    assert_eq!(ports.send(OfPort(1), &mut flow, &mut wc), Some(OdpPort(3)));

    let dmac = EthAddr([0x52, 0x54, 0, 0, 0, 2]);
    let smac = EthAddr([0x52, 0x54, 0, 0, 0, 1]);
    let mut header = TunnelHeader::new();
    ports
        .build_header(
            OfPort(1),
            &flow,
            dmac,
            smac,
            Ipv4Addr::new(10, 0, 0, 1),
            &mut header,
        )
        .unwrap();

    let bytes = header.as_bytes();
    assert_eq!(
        bytes.len(),
        EthernetHeader::LEN + Ipv4Header::LEN + UdpHeader::LEN + VxlanHeader::LEN
    );

    // Ethernet II: dmac, smac, always IPv4
    assert_eq!(&bytes[0..6], &dmac.octets());
    assert_eq!(&bytes[6..12], &smac.octets());
    assert_eq!(&bytes[12..14], &[0x08, 0x00]);

    // outer IPv4: version 4, IHL 5, id 0, DF, no fragment offset
    let ip = &bytes[14..34];
    assert_eq!(ip[0], 0x45);
    assert_eq!(&ip[4..6], &[0, 0]);
    assert_eq!(u16::from_be_bytes([ip[6], ip[7]]), 0x4000);
    assert_eq!(ip[8], 64);
    // the netdev callback picked UDP
    assert_eq!(ip[9], 17);
    assert_eq!(&ip[12..16], &[10, 0, 0, 1]);
    assert_eq!(&ip[16..20], &[10, 0, 0, 2]);

    // the ones complement sum over the outer IPv4 header including its
    // checksum folds to zero
    assert_eq!(Sum16BitWords::new().add_slice(ip).ones_complement(), 0);

    // UDP towards the configured tunnel port
    assert_eq!(u16::from_be_bytes([bytes[36], bytes[37]]), 4789);

    // VXLAN: mandatory flag word and the key from the flow
    assert_eq!(&bytes[42..46], &[0x08, 0, 0, 0]);
    assert_eq!(
        u32::from_be_bytes([bytes[46], bytes[47], bytes[48], bytes[49]]) >> 8,
        0x123456
    );
}

#[test]
fn unknown_port() {
    let ports = TnlPorts::new();
    let mut header = TunnelHeader::new();
    assert_eq!(
        ports.build_header(
            OfPort(1),
            &Flow::default(),
            EthAddr::ZERO,
            EthAddr::ZERO,
            Ipv4Addr::UNSPECIFIED,
            &mut header,
        ),
        Err(BuildHeaderError::UnknownPort)
    );
}

#[test]
fn rebuild_reuses_the_buffer() {
    let ports = TnlPorts::new();
    let netdev = Arc::new(MockNetdev::new("vxlan0", config()));
    ports
        .add(OfPort(1), netdev, OdpPort(3), false)
        .unwrap();

    let mut flow = Flow {
        dl_type: 0x0800,
        ..Default::default()
    };
    let mut wc = FlowWildcards::new();
    ports.send(OfPort(1), &mut flow, &mut wc);

    let mut header = TunnelHeader::new();
    for _ in 0..3 {
        ports
            .build_header(
                OfPort(1),
                &flow,
                EthAddr::BROADCAST,
                EthAddr::ZERO,
                Ipv4Addr::new(10, 0, 0, 1),
                &mut header,
            )
            .unwrap();
        assert_eq!(header.len(), 50);
    }
}
