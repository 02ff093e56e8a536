//! IPv4 packet construction and parsing
//!
//! Headers are always the fixed 20 bytes (IHL 5); options are never emitted.

use crate::checksum::internet_checksum;
use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;

/// Default time-to-live for every packet flowprobe builds
pub const DEFAULT_TTL: u8 = 64;

/// Default identification field
pub const DEFAULT_IDENTIFICATION: u16 = 1;

/// IP Protocol numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpProtocol {
    /// ICMP (1)
    ICMP,
    /// TCP (6)
    TCP,
    /// UDP (17)
    UDP,
    /// Any other protocol number, including 0 for a bare IPv4 header
    Custom(u8),
}

impl IpProtocol {
    pub fn to_u8(self) -> u8 {
        match self {
            IpProtocol::ICMP => 1,
            IpProtocol::TCP => 6,
            IpProtocol::UDP => 17,
            IpProtocol::Custom(val) => val,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => IpProtocol::ICMP,
            6 => IpProtocol::TCP,
            17 => IpProtocol::UDP,
            val => IpProtocol::Custom(val),
        }
    }
}

/// IP Flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IpFlags {
    /// Don't Fragment flag
    pub dont_fragment: bool,
    /// More Fragments flag
    pub more_fragments: bool,
}

impl IpFlags {
    pub const NONE: IpFlags = IpFlags {
        dont_fragment: false,
        more_fragments: false,
    };

    /// Convert to the 3-bit field value (reserved bit always 0)
    pub fn to_u8(self) -> u8 {
        let mut flags = 0u8;
        if self.dont_fragment {
            flags |= 0b010;
        }
        if self.more_fragments {
            flags |= 0b001;
        }
        flags
    }

    pub fn from_u8(value: u8) -> Self {
        IpFlags {
            dont_fragment: (value & 0b010) != 0,
            more_fragments: (value & 0b001) != 0,
        }
    }
}

/// IPv4 packet
#[derive(Debug, Clone)]
pub struct Ipv4Packet {
    /// Version (always 4 for packets built here)
    pub version: u8,
    /// Internet Header Length in 32-bit words
    pub ihl: u8,
    /// Type of Service / DSCP+ECN byte
    pub tos: u8,
    /// Total length (header + data) in bytes
    pub total_length: u16,
    pub identification: u16,
    pub flags: IpFlags,
    /// Fragment offset (in 8-byte blocks)
    pub fragment_offset: u16,
    pub ttl: u8,
    pub protocol: IpProtocol,
    /// Header checksum as carried on the wire
    pub checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub payload: Vec<u8>,
}

impl Ipv4Packet {
    /// IPv4 header size without options
    pub const HEADER_SIZE: usize = 20;

    /// Largest value the 16-bit total length field can carry
    pub const MAX_TOTAL_LENGTH: usize = u16::MAX as usize;

    /// Create a new IPv4 packet with version 4, IHL 5 and TTL 64
    ///
    /// The payload must fit within [`MAX_TOTAL_LENGTH`](Self::MAX_TOTAL_LENGTH);
    /// [`PacketBuilder`](crate::PacketBuilder) checks this before encoding.
    pub fn new(
        source: Ipv4Addr,
        destination: Ipv4Addr,
        protocol: IpProtocol,
        payload: Vec<u8>,
    ) -> Self {
        let total_length = (Self::HEADER_SIZE + payload.len()) as u16;

        Ipv4Packet {
            version: 4,
            ihl: 5,
            tos: 0,
            total_length,
            identification: DEFAULT_IDENTIFICATION,
            flags: IpFlags::NONE,
            fragment_offset: 0,
            ttl: DEFAULT_TTL,
            protocol,
            checksum: 0,
            source,
            destination,
            payload,
        }
    }

    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_tos(mut self, tos: u8) -> Self {
        self.tos = tos;
        self
    }

    pub fn with_identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    /// Calculate and update the header checksum
    pub fn calculate_checksum(&mut self) {
        self.checksum = 0;
        self.checksum = internet_checksum(&self.header_bytes());
    }

    fn header_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(Self::HEADER_SIZE);

        buffer.put_u8((self.version << 4) | (self.ihl & 0x0F));
        buffer.put_u8(self.tos);
        buffer.put_u16(self.total_length);
        buffer.put_u16(self.identification);
        buffer.put_u16(((self.flags.to_u8() as u16) << 13) | (self.fragment_offset & 0x1FFF));
        buffer.put_u8(self.ttl);
        buffer.put_u8(self.protocol.to_u8());
        buffer.put_u16(self.checksum);
        buffer.put_slice(&self.source.octets());
        buffer.put_slice(&self.destination.octets());

        buffer.to_vec()
    }

    /// Encode header and payload; the checksum is computed over the final header
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut packet = self.clone();
        packet.calculate_checksum();

        let mut buffer = BytesMut::with_capacity(packet.total_length as usize);
        buffer.put_slice(&packet.header_bytes());
        buffer.put_slice(&packet.payload);
        buffer.to_vec()
    }

    /// Parse an IPv4 packet from bytes
    ///
    /// The payload is cut at `total_length`, so link-layer padding after the
    /// packet is dropped.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        let version = data[0] >> 4;
        let ihl = data[0] & 0x0F;
        if version != 4 || ihl < 5 {
            return None;
        }

        let header_len = (ihl as usize) * 4;
        let total_length = u16::from_be_bytes([data[2], data[3]]);
        let end = total_length as usize;
        if end < header_len || data.len() < end {
            return None;
        }

        let flags_and_offset = u16::from_be_bytes([data[6], data[7]]);

        Some(Ipv4Packet {
            version,
            ihl,
            tos: data[1],
            total_length,
            identification: u16::from_be_bytes([data[4], data[5]]),
            flags: IpFlags::from_u8((flags_and_offset >> 13) as u8),
            fragment_offset: flags_and_offset & 0x1FFF,
            ttl: data[8],
            protocol: IpProtocol::from_u8(data[9]),
            checksum: u16::from_be_bytes([data[10], data[11]]),
            source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            payload: data[header_len..end].to_vec(),
        })
    }

    pub fn header_len(&self) -> usize {
        (self.ihl as usize) * 4
    }

    pub fn len(&self) -> usize {
        self.total_length as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::validate_checksum;

    #[test]
    fn test_ip_protocol_conversion() {
        assert_eq!(IpProtocol::TCP.to_u8(), 6);
        assert_eq!(IpProtocol::UDP.to_u8(), 17);
        assert_eq!(IpProtocol::from_u8(6), IpProtocol::TCP);
        assert_eq!(IpProtocol::from_u8(0), IpProtocol::Custom(0));
    }

    #[test]
    fn test_ip_flags() {
        let df = IpFlags::from_u8(0b010);
        assert!(df.dont_fragment && !df.more_fragments);
        assert_eq!(df.to_u8(), 0b010);
        assert_eq!(IpFlags::default(), IpFlags::NONE);
    }

    #[test]
    fn test_ipv4_packet_new() {
        let packet = Ipv4Packet::new(
            Ipv4Addr::new(192, 168, 1, 1),
            Ipv4Addr::new(192, 168, 1, 2),
            IpProtocol::UDP,
            vec![0x01, 0x02, 0x03, 0x04],
        );

        assert_eq!(packet.version, 4);
        assert_eq!(packet.ihl, 5);
        assert_eq!(packet.ttl, 64);
        assert_eq!(packet.total_length, 24);
    }

    #[test]
    fn test_ipv4_packet_to_bytes() {
        let packet = Ipv4Packet::new(
            Ipv4Addr::new(12, 13, 14, 15),
            Ipv4Addr::new(10, 0, 0, 1),
            IpProtocol::UDP,
            vec![0x01, 0x02, 0x03, 0x04],
        )
        .with_tos(0xB8);
        let bytes = packet.to_bytes();

        assert_eq!(bytes.len(), 24);
        assert_eq!(bytes[0], 0x45);
        assert_eq!(bytes[1], 0xB8);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 24);
        assert_eq!(u16::from_be_bytes([bytes[4], bytes[5]]), 1);
        assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 0);
        assert_eq!(bytes[8], 64);
        assert_eq!(bytes[9], 17);
        assert_eq!(&bytes[12..16], &[12, 13, 14, 15]);
        assert_eq!(&bytes[16..20], &[10, 0, 0, 1]);
        assert_eq!(&bytes[20..24], &[0x01, 0x02, 0x03, 0x04]);
        assert!(validate_checksum(&bytes[..20]));
    }

    #[test]
    fn test_ipv4_checksum_reflects_final_header() {
        let src = Ipv4Addr::new(10, 0, 0, 2);
        let dst = Ipv4Addr::new(10, 0, 0, 2);
        let a = Ipv4Packet::new(src, dst, IpProtocol::UDP, vec![]).to_bytes();
        let b = Ipv4Packet::new(src, dst, IpProtocol::UDP, vec![])
            .with_tos(0x10)
            .to_bytes();

        assert_ne!(&a[10..12], &b[10..12]);
        assert!(validate_checksum(&a));
        assert!(validate_checksum(&b));
    }

    #[test]
    fn test_ipv4_from_bytes_drops_padding() {
        let packet = Ipv4Packet::new(
            Ipv4Addr::new(10, 0, 0, 3),
            Ipv4Addr::new(10, 0, 0, 1),
            IpProtocol::Custom(0),
            vec![],
        );
        let mut bytes = packet.to_bytes();
        bytes.extend_from_slice(&[0u8; 26]);

        let parsed = Ipv4Packet::from_bytes(&bytes).unwrap();
        assert!(parsed.payload.is_empty());
        assert_eq!(parsed.protocol, IpProtocol::Custom(0));
    }

    #[test]
    fn test_ipv4_from_bytes_rejects_bad_headers() {
        let mut bytes = Ipv4Packet::new(
            Ipv4Addr::LOCALHOST,
            Ipv4Addr::LOCALHOST,
            IpProtocol::TCP,
            vec![0; 8],
        )
        .to_bytes();

        assert!(Ipv4Packet::from_bytes(&bytes[..19]).is_none());
        // Truncated below total_length
        assert!(Ipv4Packet::from_bytes(&bytes[..24]).is_none());

        bytes[0] = 0x65;
        assert!(Ipv4Packet::from_bytes(&bytes).is_none());
    }
}
