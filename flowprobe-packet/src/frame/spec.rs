use crate::ethernet::{EtherType, MacAddress};
use crate::vlan::VlanTag;
use flowprobe_core::{Error, Result};
use std::fmt;
use std::net::Ipv4Addr;

/// Transport layer selected by the IPv4 protocol number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum L4Protocol {
    /// Protocol 0: bare IPv4 header, empty payload
    None,
    /// Protocol 6
    Tcp,
    /// Protocol 17
    Udp,
}

impl TryFrom<u8> for L4Protocol {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(L4Protocol::None),
            0x06 => Ok(L4Protocol::Tcp),
            0x11 => Ok(L4Protocol::Udp),
            other => Err(Error::InvalidProtocol(other)),
        }
    }
}

impl fmt::Display for L4Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            L4Protocol::None => write!(f, "none"),
            L4Protocol::Tcp => write!(f, "TCP"),
            L4Protocol::Udp => write!(f, "UDP"),
        }
    }
}

/// Header-field values describing one frame
///
/// Defaults: zero MAC addresses, EtherType 0x0800, no VLAN tag,
/// `0.0.0.0` for both IPv4 addresses, protocol 0 (no L4 header), ToS 0,
/// ports 0.
///
/// ```
/// use flowprobe_packet::frame::FrameSpec;
/// use std::net::Ipv4Addr;
///
/// let spec = FrameSpec {
///     ipv4_dst: Ipv4Addr::new(10, 0, 0, 1),
///     ipv4_proto: 17,
///     l4_sport: 1234,
///     l4_dport: 4321,
///     ..FrameSpec::default()
/// };
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    pub eth_src: MacAddress,
    pub eth_dst: MacAddress,
    /// Type of the Ethernet payload. With a VLAN tag this is carried inside
    /// the tag and the outer type becomes 0x8100.
    pub eth_type: EtherType,
    /// 802.1Q tag; `None` sends an untagged frame
    pub vlan: Option<VlanTag>,
    pub ipv4_src: Ipv4Addr,
    pub ipv4_dst: Ipv4Addr,
    /// IPv4 protocol number: 0 (none), 6 (TCP) or 17 (UDP)
    pub ipv4_proto: u8,
    pub ipv4_tos: u8,
    /// Ignored unless the protocol is TCP or UDP
    pub l4_sport: u16,
    /// Ignored unless the protocol is TCP or UDP
    pub l4_dport: u16,
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self {
            eth_src: MacAddress::ZERO,
            eth_dst: MacAddress::ZERO,
            eth_type: EtherType::IPv4,
            vlan: None,
            ipv4_src: Ipv4Addr::UNSPECIFIED,
            ipv4_dst: Ipv4Addr::UNSPECIFIED,
            ipv4_proto: 0,
            ipv4_tos: 0,
            l4_sport: 0,
            l4_dport: 0,
        }
    }
}

impl FrameSpec {
    /// Check the spec can be encoded and return the transport it selects
    pub fn validate(&self) -> Result<L4Protocol> {
        L4Protocol::try_from(self.ipv4_proto)
    }
}

impl fmt::Display for FrameSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} type 0x{:04x}", self.eth_src, self.eth_dst, self.eth_type.to_u16())?;
        if let Some(tag) = self.vlan {
            write!(f, " vlan {} pcp {}", tag.vlan_id, tag.priority)?;
        }
        write!(
            f,
            ", {} -> {} proto {} tos 0x{:02x}",
            self.ipv4_src, self.ipv4_dst, self.ipv4_proto, self.ipv4_tos
        )?;
        if matches!(self.ipv4_proto, 6 | 17) {
            write!(f, ", ports {} -> {}", self.l4_sport, self.l4_dport)?;
        }
        Ok(())
    }
}
