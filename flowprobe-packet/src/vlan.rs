//! IEEE 802.1Q VLAN tag construction and parsing
//!
//! On the wire a tagged frame looks like:
//!
//! ```text
//! | dst (6) | src (6) | TPID 0x8100 (2) | TCI (2) | inner EtherType (2) | payload |
//! ```
//!
//! The TPID is the outer Ethernet EtherType, so [`VlanPacket`] covers the part
//! after it: TCI, the real EtherType of the payload, and the payload itself.
//!
//! TCI (Tag Control Information) format:
//! ```text
//! | PCP (3 bits) | DEI (1 bit) | VID (12 bits) |
//! ```

use crate::ethernet::EtherType;
use bytes::{BufMut, BytesMut};
use flowprobe_core::{Error, Result};
use std::fmt;

/// 802.1Q Tag Protocol Identifier (TPID)
pub const DOT1Q_TPID: u16 = 0x8100;

/// Largest value of the 12-bit VLAN ID field
pub const MAX_VLAN_ID: u16 = 0x0FFF;

/// Largest value of the 3-bit priority field
pub const MAX_PRIORITY: u8 = 7;

const VLAN_ID_MASK: u16 = 0x0FFF;
const PRIORITY_MASK: u16 = 0xE000;
const DEI_MASK: u16 = 0x1000;

/// 802.1Q VLAN tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VlanTag {
    /// VLAN Identifier (12 bits)
    pub vlan_id: u16,
    /// Priority Code Point (3 bits)
    pub priority: u8,
    /// Drop Eligible Indicator
    pub dei: bool,
}

impl VlanTag {
    /// Create a tag. Values wider than their field are truncated to it when
    /// encoded, matching how the wire format would carry them.
    pub fn new(vlan_id: u16, priority: u8) -> Self {
        Self {
            vlan_id,
            priority,
            dei: false,
        }
    }

    /// Create a tag, rejecting values that do not fit their field
    pub fn checked(vlan_id: u16, priority: u8) -> Result<Self> {
        if vlan_id > MAX_VLAN_ID {
            return Err(Error::invalid_parameter(
                "vlan_id",
                format!("{} does not fit in 12 bits (max {})", vlan_id, MAX_VLAN_ID),
            ));
        }

        if priority > MAX_PRIORITY {
            return Err(Error::invalid_parameter(
                "vlan_pcp",
                format!("{} does not fit in 3 bits (max {})", priority, MAX_PRIORITY),
            ));
        }

        Ok(Self::new(vlan_id, priority))
    }

    /// Interpret the legacy "VLAN ID 0 means untagged" convention.
    ///
    /// Returns `None` for VLAN ID 0, so a genuine priority-tagged frame
    /// (VID 0) cannot be requested this way; build the tag with
    /// [`VlanTag::new`] for that.
    pub fn from_legacy_id(vlan_id: u16, priority: u8) -> Result<Option<Self>> {
        if vlan_id == 0 {
            return Ok(None);
        }
        Self::checked(vlan_id, priority).map(Some)
    }

    pub fn with_dei(mut self, dei: bool) -> Self {
        self.dei = dei;
        self
    }

    /// The 16-bit TCI value
    pub fn tci(&self) -> u16 {
        let mut tci: u16 = ((self.priority as u16) << 13) & PRIORITY_MASK;
        if self.dei {
            tci |= DEI_MASK;
        }
        tci | (self.vlan_id & VLAN_ID_MASK)
    }

    /// Decode a TCI value
    pub fn from_tci(tci: u16) -> Self {
        Self {
            vlan_id: tci & VLAN_ID_MASK,
            priority: ((tci & PRIORITY_MASK) >> 13) as u8,
            dei: (tci & DEI_MASK) != 0,
        }
    }
}

impl fmt::Display for VlanTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VLAN {} (Priority: {}, DEI: {})",
            self.vlan_id,
            self.priority,
            if self.dei { "1" } else { "0" }
        )
    }
}

/// The part of a tagged frame that follows the TPID
#[derive(Debug, Clone)]
pub struct VlanPacket {
    pub tag: VlanTag,
    /// EtherType of the payload
    pub ethertype: EtherType,
    pub payload: Vec<u8>,
}

impl VlanPacket {
    /// TCI + inner EtherType
    pub const HEADER_SIZE: usize = 4;

    pub fn new(tag: VlanTag, ethertype: EtherType, payload: Vec<u8>) -> Self {
        Self {
            tag,
            ethertype,
            payload,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(Self::HEADER_SIZE + self.payload.len());
        buf.put_u16(self.tag.tci());
        buf.put_u16(self.ethertype.to_u16());
        buf.put_slice(&self.payload);
        buf.to_vec()
    }

    /// Parse the bytes that follow a 0x8100 EtherType
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::PacketParsing(format!(
                "802.1Q header too short: {} bytes, expected {}",
                data.len(),
                Self::HEADER_SIZE
            )));
        }

        let tci = u16::from_be_bytes([data[0], data[1]]);
        let ethertype = EtherType::from_u16(u16::from_be_bytes([data[2], data[3]]));

        Ok(Self {
            tag: VlanTag::from_tci(tci),
            ethertype,
            payload: data[Self::HEADER_SIZE..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tci_layout() {
        // PCP=5, DEI=0, VID=100
        assert_eq!(VlanTag::new(100, 5).tci(), 0xA064);
        assert_eq!(VlanTag::new(100, 5).with_dei(true).tci(), 0xB064);
    }

    #[test]
    fn test_tci_decode() {
        let tag = VlanTag::from_tci(0xB064);
        assert_eq!(tag.vlan_id, 100);
        assert_eq!(tag.priority, 5);
        assert!(tag.dei);
    }

    #[test]
    fn test_new_truncates_to_field_width() {
        let tag = VlanTag::new(0x1005, 9);
        assert_eq!(tag.tci() & 0x0FFF, 0x005);
        assert_eq!(tag.tci() >> 13, 1);
    }

    #[test]
    fn test_checked_rejects_wide_values() {
        assert!(VlanTag::checked(4095, 7).is_ok());
        assert!(matches!(
            VlanTag::checked(4096, 0),
            Err(Error::InvalidParameter { ref name, .. }) if name == "vlan_id"
        ));
        assert!(matches!(
            VlanTag::checked(10, 8),
            Err(Error::InvalidParameter { ref name, .. }) if name == "vlan_pcp"
        ));
    }

    #[test]
    fn test_legacy_zero_means_untagged() {
        assert_eq!(VlanTag::from_legacy_id(0, 3).unwrap(), None);
        assert_eq!(
            VlanTag::from_legacy_id(42, 3).unwrap(),
            Some(VlanTag::new(42, 3))
        );
        assert!(VlanTag::from_legacy_id(5000, 0).is_err());
    }

    #[test]
    fn test_vlan_packet_to_bytes() {
        let packet = VlanPacket::new(VlanTag::new(100, 5), EtherType::IPv4, vec![0x45]);
        assert_eq!(packet.to_bytes(), vec![0xA0, 0x64, 0x08, 0x00, 0x45]);
    }

    #[test]
    fn test_vlan_packet_from_bytes() {
        let packet = VlanPacket::from_bytes(&[0x20, 0x0A, 0x08, 0x06, 0x01, 0x02]).unwrap();
        assert_eq!(packet.tag.vlan_id, 10);
        assert_eq!(packet.tag.priority, 1);
        assert_eq!(packet.ethertype, EtherType::ARP);
        assert_eq!(packet.payload, vec![0x01, 0x02]);
    }

    #[test]
    fn test_vlan_packet_too_short() {
        assert!(matches!(
            VlanPacket::from_bytes(&[0x00, 0x0A, 0x08]),
            Err(Error::PacketParsing(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            VlanTag::new(100, 5).to_string(),
            "VLAN 100 (Priority: 5, DEI: 0)"
        );
    }
}
