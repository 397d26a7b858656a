use crate::err::ParseEthAddrError;
use core::fmt;
use core::str::FromStr;

/// Six byte Ethernet address (MAC).
///
/// Stored as plain bytes; [`EthAddr::words`] exposes the three 16 bit word
/// view used by hashing and bit tests.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct EthAddr(pub [u8; 6]);

impl EthAddr {
    /// Length of an Ethernet address in bytes.
    pub const LEN: usize = 6;

    pub const ZERO: EthAddr = EthAddr([0; 6]);
    pub const BROADCAST: EthAddr = EthAddr([0xff; 6]);
    /// Mask matching every bit of an address.
    pub const EXACT_MASK: EthAddr = EthAddr::BROADCAST;

    #[inline]
    pub const fn new(octets: [u8; 6]) -> EthAddr {
        EthAddr(octets)
    }

    /// Byte view of the address.
    #[inline]
    pub const fn octets(self) -> [u8; 6] {
        self.0
    }

    /// The address as three 16 bit words in host byte order.
    #[inline]
    pub const fn words(self) -> [u16; 3] {
        [
            u16::from_be_bytes([self.0[0], self.0[1]]),
            u16::from_be_bytes([self.0[2], self.0[3]]),
            u16::from_be_bytes([self.0[4], self.0[5]]),
        ]
    }

    #[inline]
    pub const fn is_broadcast(self) -> bool {
        // all ones is both a broadcast address and the exact match mask
        (self.0[0] & self.0[1] & self.0[2] & self.0[3] & self.0[4] & self.0[5]) == 0xff
    }

    #[inline]
    pub const fn is_exact_mask(self) -> bool {
        self.is_broadcast()
    }

    #[inline]
    pub const fn is_multicast(self) -> bool {
        self.0[0] & 1 != 0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        (self.0[0] | self.0[1] | self.0[2] | self.0[3] | self.0[4] | self.0[5]) == 0
    }

    /// True for locally administered addresses: either bit 2 of the first
    /// byte is set, or the address carries the `00:23:20` OUI with the high
    /// bit of the fourth byte set (the pattern [`EthAddr::random_vendor_tagged`]
    /// generates).
    #[inline]
    pub const fn is_local(self) -> bool {
        self.0[0] & 0x02 != 0
            || (self.0[0] == 0x00 && self.0[1] == 0x23 && self.0[2] == 0x20 && self.0[3] & 0x80 != 0)
    }

    /// True if `self` and `other` are equal in all bits set in `mask`.
    #[inline]
    pub fn equal_except_masked(self, other: EthAddr, mask: EthAddr) -> bool {
        for i in 0..6 {
            if (self.0[i] ^ other.0[i]) & mask.0[i] != 0 {
                return false;
            }
        }
        true
    }

    /// Bitwise complement of the address (used to flip masks).
    #[inline]
    pub const fn invert(self) -> EthAddr {
        EthAddr([
            !self.0[0], !self.0[1], !self.0[2], !self.0[3], !self.0[4], !self.0[5],
        ])
    }

    /// The address packed into the low 48 bits of an u64.
    #[inline]
    pub const fn to_u64(self) -> u64 {
        ((self.0[0] as u64) << 40)
            | ((self.0[1] as u64) << 32)
            | ((self.0[2] as u64) << 24)
            | ((self.0[3] as u64) << 16)
            | ((self.0[4] as u64) << 8)
            | (self.0[5] as u64)
    }

    /// Address from the low 48 bits of an u64.
    #[inline]
    pub const fn from_u64(value: u64) -> EthAddr {
        EthAddr([
            (value >> 40) as u8,
            (value >> 32) as u8,
            (value >> 24) as u8,
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ])
    }

    /// The address in the upper 48 bits and the VLAN id in the low 16 bits
    /// of an u64 (a learning table key).
    #[inline]
    pub const fn vlan_to_u64(self, vlan: u16) -> u64 {
        (self.to_u64() << 16) | vlan as u64
    }

    /// Hash of the address seeded with `basis`.
    #[inline]
    pub fn hash(self, basis: u32) -> u32 {
        use core::hash::{BuildHasher, Hasher};
        let mut hasher = ahash::RandomState::with_seeds(
            0x243f_6a88_85a3_08d3,
            0x1319_8a2e_0370_7344,
            0xa409_3822_299f_31d0,
            basis as u64,
        )
        .build_hasher();
        hasher.write(&self.0);
        hasher.finish() as u32
    }

    /// Generates a random unicast, locally administered address.
    pub fn random_local() -> EthAddr {
        let mut octets: [u8; 6] = rand::random();
        octets[0] &= !1; // unicast
        octets[0] |= 2; // locally administered
        EthAddr(octets)
    }

    /// Generates a random address under the `00:23:20` OUI with the high bit
    /// of the fourth byte set, marking it as generated rather than assigned.
    pub fn random_vendor_tagged() -> EthAddr {
        use rand::Rng;
        let mut octets = [0x00, 0x23, 0x20, 0, 0, 0];
        rand::thread_rng().fill(&mut octets[3..]);
        octets[3] |= 0x80;
        EthAddr(octets)
    }
}

impl From<[u8; 6]> for EthAddr {
    #[inline]
    fn from(octets: [u8; 6]) -> EthAddr {
        EthAddr(octets)
    }
}

impl fmt::Display for EthAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Debug for EthAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for EthAddr {
    type Err = ParseEthAddrError;

    fn from_str(s: &str) -> Result<EthAddr, ParseEthAddrError> {
        let mut octets = [0u8; 6];
        let mut count = 0;
        for group in s.split(':') {
            if count < 6 {
                if group.len() != 2 {
                    return Err(ParseEthAddrError::GroupValue(group.to_string()));
                }
                octets[count] = u8::from_str_radix(group, 16)
                    .map_err(|_| ParseEthAddrError::GroupValue(group.to_string()))?;
            }
            count += 1;
        }
        if count != 6 {
            return Err(ParseEthAddrError::GroupCount(count));
        }
        Ok(EthAddr(octets))
    }
}
