//! Predicates & formatting for IPv4 addresses and netmasks.

use core::net::Ipv4Addr;

/// True if `mask` consists of `k` one bits followed by `32 - k` zero bits
/// for some `0 <= k <= 32`.
#[inline]
pub fn is_cidr(mask: Ipv4Addr) -> bool {
    let x = !u32::from_be_bytes(mask.octets());
    x & x.wrapping_add(1) == 0
}

/// Prefix length of a CIDR mask, `None` for non CIDR masks.
#[inline]
pub fn cidr_prefix_len(mask: Ipv4Addr) -> Option<u8> {
    if is_cidr(mask) {
        Some(u32::from_be_bytes(mask.octets()).count_ones() as u8)
    } else {
        None
    }
}

/// True for addresses in `224.0.0.0/4`.
#[inline]
pub fn is_multicast(addr: Ipv4Addr) -> bool {
    addr.octets()[0] >> 4 == 0xe
}

/// True for link local multicast addresses (`224.0.0.0/24`).
#[inline]
pub fn is_local_multicast(addr: Ipv4Addr) -> bool {
    let octets = addr.octets();
    octets[0] == 224 && octets[1] == 0 && octets[2] == 0
}

/// Formats `addr` with its mask: bare `addr` for an exact mask,
/// `addr/prefixlen` for a CIDR mask and `addr/mask` otherwise.
pub fn format_masked(addr: Ipv4Addr, mask: Ipv4Addr) -> String {
    if mask == Ipv4Addr::BROADCAST {
        addr.to_string()
    } else {
        match cidr_prefix_len(mask) {
            Some(len) => format!("{addr}/{len}"),
            None => format!("{addr}/{mask}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cidr_predicate() {
        assert!(is_cidr(Ipv4Addr::new(255, 255, 240, 0)));
        assert!(!is_cidr(Ipv4Addr::new(255, 0, 255, 0)));
        assert!(is_cidr(Ipv4Addr::new(0, 0, 0, 0)));
        assert!(is_cidr(Ipv4Addr::new(255, 255, 255, 255)));
        assert!(!is_cidr(Ipv4Addr::new(0, 0, 0, 1)));

        assert_eq!(cidr_prefix_len(Ipv4Addr::new(255, 255, 240, 0)), Some(20));
        assert_eq!(cidr_prefix_len(Ipv4Addr::new(255, 0, 255, 0)), None);
    }

    proptest! {
        #[test]
        fn cidr_matches_prefix_construction(len in 0..=32u32) {
            let mask = Ipv4Addr::from(
                (u32::MAX.checked_shl(32 - len).unwrap_or(0)).to_be_bytes()
            );
            assert!(is_cidr(mask));
            assert_eq!(cidr_prefix_len(mask), Some(len as u8));
        }
    }

    #[test]
    fn multicast() {
        assert!(is_multicast(Ipv4Addr::new(224, 0, 0, 1)));
        assert!(is_multicast(Ipv4Addr::new(239, 255, 255, 255)));
        assert!(!is_multicast(Ipv4Addr::new(223, 255, 255, 255)));
        assert!(!is_multicast(Ipv4Addr::new(240, 0, 0, 0)));

        assert!(is_local_multicast(Ipv4Addr::new(224, 0, 0, 251)));
        assert!(!is_local_multicast(Ipv4Addr::new(224, 0, 1, 1)));
    }

    #[test]
    fn masked_formatting() {
        let addr = Ipv4Addr::new(10, 1, 2, 3);
        assert_eq!(format_masked(addr, Ipv4Addr::BROADCAST), "10.1.2.3");
        assert_eq!(
            format_masked(addr, Ipv4Addr::new(255, 255, 240, 0)),
            "10.1.2.3/20"
        );
        assert_eq!(
            format_masked(addr, Ipv4Addr::new(255, 0, 255, 0)),
            "10.1.2.3/255.0.255.0"
        );
    }
}
