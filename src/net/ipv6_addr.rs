//! Predicates & formatting for IPv6 addresses and masks.

use core::net::{Ipv4Addr, Ipv6Addr};

/// The all hosts multicast group (`ff02::1`).
pub const ALL_HOSTS: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 1);

/// Mask matching every bit of an address.
pub const EXACT_MASK: Ipv6Addr = Ipv6Addr::new(
    0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff, 0xffff,
);

/// True if the address is not the unspecified address `::`.
#[inline]
pub fn is_set(addr: Ipv6Addr) -> bool {
    addr != Ipv6Addr::UNSPECIFIED
}

/// True for multicast addresses (`ff00::/8`).
#[inline]
pub fn is_multicast(addr: Ipv6Addr) -> bool {
    addr.octets()[0] == 0xff
}

/// The IPv4 address carried in an IPv4 mapped address (`::ffff:a.b.c.d`),
/// `None` for everything else.
#[inline]
pub fn mapped_ipv4(addr: Ipv6Addr) -> Option<Ipv4Addr> {
    addr.to_ipv4_mapped()
}

/// Maps an IPv4 address into the `::ffff:0:0/96` prefix.
#[inline]
pub fn map_ipv4(addr: Ipv4Addr) -> Ipv6Addr {
    addr.to_ipv6_mapped()
}

/// Prefix length of a CIDR mask, `None` for non CIDR masks.
pub fn cidr_prefix_len(mask: Ipv6Addr) -> Option<u8> {
    let value = u128::from_be_bytes(mask.octets());
    let x = !value;
    if x & x.wrapping_add(1) == 0 {
        Some(value.count_ones() as u8)
    } else {
        None
    }
}

/// Formats `addr` with its mask: bare `addr` for an exact mask,
/// `addr/prefixlen` for a CIDR mask and `addr/mask` otherwise.
pub fn format_masked(addr: Ipv6Addr, mask: Ipv6Addr) -> String {
    if mask == EXACT_MASK {
        addr.to_string()
    } else {
        match cidr_prefix_len(mask) {
            Some(len) => format!("{addr}/{len}"),
            None => format!("{addr}/{mask}"),
        }
    }
}

/// Formats an address for use in `address:port` contexts (`[addr]`, with
/// mapped addresses collapsed to their IPv4 form).
pub fn format_bracketed(addr: Ipv6Addr) -> String {
    match mapped_ipv4(addr) {
        Some(v4) => v4.to_string(),
        None => format!("[{addr}]"),
    }
}
