use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem::{offset_of, size_of};
use core::net::{Ipv4Addr, Ipv6Addr};

/// Don't fragment the outer packet.
pub const FLOW_TNL_F_DONT_FRAGMENT: u16 = 1 << 0;
/// Compute the outer transport checksum.
pub const FLOW_TNL_F_CSUM: u16 = 1 << 1;
/// A tunnel key is present.
pub const FLOW_TNL_F_KEY: u16 = 1 << 2;
/// Operations/administration/maintenance frame.
pub const FLOW_TNL_F_OAM: u16 = 1 << 3;
/// The option area is still in raw datapath format and `metadata.present`
/// holds its byte length. Internal, never exposed in a match.
pub const FLOW_TNL_F_UDPIF: u16 = 1 << 4;

/// Flag bits a flow table entry may match on.
pub const FLOW_TNL_F_MASK: u16 = FLOW_TNL_F_DONT_FRAGMENT | FLOW_TNL_F_CSUM | FLOW_TNL_F_KEY;

/// Size of the TLV option area in bytes.
pub const TUN_METADATA_OPTS_SIZE: usize = 256;

/// Optional TLV metadata carried with a tunnel flow (Geneve style options).
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TunMetadata {
    /// Bitmap of populated option slots. When [`FLOW_TNL_F_UDPIF`] is set
    /// on the flow the options are still in raw datapath format and this
    /// holds the raw byte length instead.
    pub present: u64,
    pub opts: [u8; TUN_METADATA_OPTS_SIZE],
}

impl TunMetadata {
    pub const ZERO: TunMetadata = TunMetadata {
        present: 0,
        opts: [0; TUN_METADATA_OPTS_SIZE],
    };

    /// Raw option byte length (only meaningful while the flow carries
    /// [`FLOW_TNL_F_UDPIF`]).
    #[inline]
    pub fn raw_len(&self) -> usize {
        self.present as u8 as usize
    }
}

impl Default for TunMetadata {
    fn default() -> TunMetadata {
        TunMetadata::ZERO
    }
}

/// Per packet tunnel state: outer addresses, tunnel key, flags, TOS/TTL,
/// outer transport ports, group policy data and the TLV option area.
///
/// If neither destination slot is set all other fields may be
/// uninitialized, so equality, hashing and copying only consider the
/// *effective* prefix of the record reported by
/// [`FlowTnl::effective_size`]. Allocations are always zero filled
/// ([`FlowTnl::ZERO`] / `Default`) so the bytes beyond the effective size
/// never leak garbage into a comparison.
#[repr(C)]
pub struct FlowTnl {
    /// Outer IPv4 destination; non zero means "IPv4 tunnel".
    pub ip_dst: [u8; 4],
    pub ipv6_dst: [u8; 16],
    pub ip_src: [u8; 4],
    pub ipv6_src: [u8; 16],
    pub tun_id: u64,
    pub flags: u16,
    /// DSCP + ECN byte of the outer header.
    pub ip_tos: u8,
    pub ip_ttl: u8,
    /// Outer transport ports. Kept wildcarded by the lookup path.
    pub tp_src: u16,
    pub tp_dst: u16,
    /// Group based policy id & flags.
    pub gbp_id: u16,
    pub gbp_flags: u8,
    pub pad: [u8; 5],
    pub metadata: TunMetadata,
}

// The effective size rules below slice the record as raw bytes, which is
// only sound while the layout stays exactly this.
const _: () = assert!(size_of::<FlowTnl>() == 328);
const _: () = assert!(offset_of!(FlowTnl, ip_src) == 20);
const _: () = assert!(offset_of!(FlowTnl, tun_id) == 40);
const _: () = assert!(offset_of!(FlowTnl, metadata) == 64);
const _: () = assert!(offset_of!(TunMetadata, opts) == 8);
const _: () = assert!(size_of::<TunMetadata>() == 8 + TUN_METADATA_OPTS_SIZE);

impl FlowTnl {
    pub const ZERO: FlowTnl = FlowTnl {
        ip_dst: [0; 4],
        ipv6_dst: [0; 16],
        ip_src: [0; 4],
        ipv6_src: [0; 16],
        tun_id: 0,
        flags: 0,
        ip_tos: 0,
        ip_ttl: 0,
        tp_src: 0,
        tp_dst: 0,
        gbp_id: 0,
        gbp_flags: 0,
        pad: [0; 5],
        metadata: TunMetadata::ZERO,
    };

    #[inline]
    pub fn ipv4_dst(&self) -> Option<Ipv4Addr> {
        if self.ip_dst == [0; 4] {
            None
        } else {
            Some(Ipv4Addr::from(self.ip_dst))
        }
    }

    #[inline]
    pub fn ipv4_src(&self) -> Option<Ipv4Addr> {
        if self.ip_src == [0; 4] {
            None
        } else {
            Some(Ipv4Addr::from(self.ip_src))
        }
    }

    #[inline]
    pub fn set_ipv4_dst(&mut self, addr: Ipv4Addr) {
        self.ip_dst = addr.octets();
    }

    #[inline]
    pub fn set_ipv4_src(&mut self, addr: Ipv4Addr) {
        self.ip_src = addr.octets();
    }

    #[inline]
    pub fn set_ipv6_dst(&mut self, addr: Ipv6Addr) {
        self.ipv6_dst = addr.octets();
    }

    #[inline]
    pub fn set_ipv6_src(&mut self, addr: Ipv6Addr) {
        self.ipv6_src = addr.octets();
    }

    /// True if a tunnel destination of either family is set.
    #[inline]
    pub fn dst_is_set(&self) -> bool {
        self.ip_dst != [0; 4] || self.ipv6_dst != [0; 16]
    }

    /// The outer destination as an IPv6 address (IPv4 mapped when the IPv4
    /// slot is set).
    #[inline]
    pub fn dst6(&self) -> Ipv6Addr {
        match self.ipv4_dst() {
            Some(v4) => v4.to_ipv6_mapped(),
            None => Ipv6Addr::from(self.ipv6_dst),
        }
    }

    /// The outer source as an IPv6 address (IPv4 mapped when the IPv4 slot
    /// is set).
    #[inline]
    pub fn src6(&self) -> Ipv6Addr {
        match self.ipv4_src() {
            Some(v4) => v4.to_ipv6_mapped(),
            None => Ipv6Addr::from(self.ipv6_src),
        }
    }

    #[inline]
    pub fn has_options(&self) -> bool {
        self.metadata.present != 0
    }

    /// Raw option byte length while in datapath format, number of populated
    /// TLV slots otherwise.
    #[inline]
    pub fn present_len(&self) -> usize {
        if self.flags & FLOW_TNL_F_UDPIF != 0 {
            self.metadata.raw_len()
        } else {
            self.metadata.present.count_ones() as usize
        }
    }

    #[inline]
    pub fn clear_options(&mut self) {
        self.flags &= !FLOW_TNL_F_UDPIF;
        self.metadata = TunMetadata::ZERO;
    }

    /// Size of the smallest prefix of the record covering its meaningful
    /// fields. The sole source of truth for equality, hashing and copying.
    pub fn effective_size(&self) -> usize {
        if !self.dst_is_set() {
            // nothing else is initialized without a destination
            offset_of!(FlowTnl, ip_src)
        } else if self.flags & FLOW_TNL_F_UDPIF != 0 {
            offset_of!(FlowTnl, metadata) + offset_of!(TunMetadata, opts) + self.metadata.raw_len()
        } else if self.metadata.present == 0 {
            offset_of!(FlowTnl, metadata) + offset_of!(TunMetadata, opts)
        } else {
            size_of::<FlowTnl>()
        }
    }

    /// Hash of the effective prefix seeded with `basis`.
    pub fn hash_with_basis(&self, basis: u64) -> u64 {
        use core::hash::BuildHasher;
        let mut hasher = ahash::RandomState::with_seeds(
            0x243f_6a88_85a3_08d3,
            0x1319_8a2e_0370_7344,
            0xa409_3822_299f_31d0,
            basis,
        )
        .build_hasher();
        hasher.write(&self.bytes()[..self.effective_size()]);
        hasher.finish()
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        // SAFETY: FlowTnl is repr(C) with explicit padding only (checked by
        //         the layout assertions above), so every byte of a value is
        //         an initialized field byte.
        unsafe {
            core::slice::from_raw_parts((self as *const FlowTnl).cast::<u8>(), size_of::<FlowTnl>())
        }
    }

    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: As in `bytes`; all fields are plain integers & byte
        //         arrays, so any byte value written stays a valid field.
        unsafe {
            core::slice::from_raw_parts_mut((self as *mut FlowTnl).cast::<u8>(), size_of::<FlowTnl>())
        }
    }
}

impl Default for FlowTnl {
    fn default() -> FlowTnl {
        FlowTnl::ZERO
    }
}

/// Copies observe the effective size: the prefix is copied, the tail is
/// zero filled.
impl Clone for FlowTnl {
    fn clone(&self) -> FlowTnl {
        let mut out = FlowTnl::ZERO;
        let size = self.effective_size();
        out.bytes_mut()[..size].copy_from_slice(&self.bytes()[..size]);
        out
    }
}

/// Two values are equal iff their effective sizes match and the covered
/// bytes match.
impl PartialEq for FlowTnl {
    fn eq(&self, other: &FlowTnl) -> bool {
        let size = self.effective_size();
        size == other.effective_size() && self.bytes()[..size] == other.bytes()[..size]
    }
}

impl Eq for FlowTnl {}

impl Hash for FlowTnl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(&self.bytes()[..self.effective_size()]);
    }
}

impl fmt::Debug for FlowTnl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowTnl")
            .field("tun_id", &format_args!("{:#x}", self.tun_id))
            .field("src", &self.src6())
            .field("dst", &self.dst6())
            .field("flags", &format_args!("{:#x}", self.flags))
            .field("ip_tos", &format_args!("{:#x}", self.ip_tos))
            .field("ip_ttl", &self.ip_ttl)
            .field("tp_src", &self.tp_src)
            .field("tp_dst", &self.tp_dst)
            .field("present", &format_args!("{:#x}", self.metadata.present))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn effective_size_steps() {
        // nothing set: effective size reaches up to the source slot
        let tnl = FlowTnl::ZERO;
        assert_eq!(tnl.effective_size(), 20);

        // destination set, no options: through the start of the option area
        let mut tnl = FlowTnl::ZERO;
        tnl.set_ipv4_dst(Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(tnl.effective_size(), 72);

        // raw datapath options: present counts bytes
        tnl.flags |= FLOW_TNL_F_UDPIF;
        tnl.metadata.present = 12;
        assert_eq!(tnl.effective_size(), 72 + 12);

        // decoded option map: the full record matters
        tnl.flags &= !FLOW_TNL_F_UDPIF;
        tnl.metadata.present = 0b101;
        assert_eq!(tnl.effective_size(), size_of::<FlowTnl>());

        // an IPv6 destination counts as set too
        let mut tnl = FlowTnl::ZERO;
        tnl.set_ipv6_dst("fe80::2".parse().unwrap());
        assert_eq!(tnl.effective_size(), 72);
    }

    #[test]
    fn eq_ignores_tail_garbage() {
        let mut a = FlowTnl::ZERO;
        let mut b = FlowTnl::ZERO;
        // bytes beyond the effective size must not influence equality
        a.tun_id = 0x1234;
        b.tun_id = 0xffff_ffff;
        assert_eq!(a, b);

        a.set_ipv4_dst(Ipv4Addr::new(10, 0, 0, 2));
        assert_ne!(a, b);
        b.set_ipv4_dst(Ipv4Addr::new(10, 0, 0, 2));
        b.tun_id = 0x1234;
        assert_eq!(a, b);
    }

    #[test]
    fn clone_zero_extends() {
        let mut tnl = FlowTnl::ZERO;
        tnl.set_ipv4_dst(Ipv4Addr::new(10, 0, 0, 2));
        tnl.tun_id = 42;
        // scribble into the region beyond the effective size
        tnl.metadata.opts[17] = 0xaa;

        let copy = tnl.clone();
        assert_eq!(copy, tnl);
        assert_eq!(copy.tun_id, 42);
        assert_eq!(copy.metadata.opts[17], 0);

        // extending the copy with zero bytes yields the canonical record
        let mut canonical = tnl;
        canonical.metadata.opts[17] = 0;
        assert_eq!(copy.bytes(), canonical.bytes());
    }

    #[test]
    fn hash_matches_equality() {
        let mut a = FlowTnl::ZERO;
        a.set_ipv4_dst(Ipv4Addr::new(10, 0, 0, 2));
        a.tun_id = 7;
        let b = a.clone();
        assert_eq!(a.hash_with_basis(99), b.hash_with_basis(99));
        assert_ne!(a.hash_with_basis(1), a.hash_with_basis(2));
    }

    #[test]
    fn mapped_accessors() {
        let mut tnl = FlowTnl::ZERO;
        tnl.set_ipv4_dst(Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(tnl.dst6().to_string(), "::ffff:10.0.0.2");
        assert!(tnl.dst_is_set());
        assert_eq!(tnl.src6(), core::net::Ipv6Addr::UNSPECIFIED);

        let v6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        tnl.set_ipv6_src(v6);
        assert_eq!(tnl.src6(), v6);
    }

    #[test]
    fn option_helpers() {
        let mut tnl = FlowTnl::ZERO;
        assert!(!tnl.has_options());
        tnl.metadata.present = 0b1011;
        assert!(tnl.has_options());
        assert_eq!(tnl.present_len(), 3);

        tnl.flags |= FLOW_TNL_F_UDPIF;
        tnl.metadata.present = 24;
        assert_eq!(tnl.present_len(), 24);

        tnl.clear_options();
        assert!(!tnl.has_options());
        assert_eq!(tnl.flags & FLOW_TNL_F_UDPIF, 0);
    }
}
