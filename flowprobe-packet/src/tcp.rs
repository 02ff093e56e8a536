//! TCP segment construction and parsing
//!
//! Segments built here only have to look like TCP to a match-action table;
//! no connection is ever established, so sequence numbers and the window
//! carry fixed values unless the caller overrides them.

use crate::checksum::transport_checksum;
use crate::ip::IpProtocol;
use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;

/// Default window advertised by generated segments
pub const DEFAULT_WINDOW: u16 = 8192;

/// TCP flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags {
    pub fin: bool,
    pub syn: bool,
    pub rst: bool,
    pub psh: bool,
    pub ack: bool,
    pub urg: bool,
    pub ece: bool,
    pub cwr: bool,
}

impl TcpFlags {
    pub const NONE: TcpFlags = TcpFlags {
        fin: false,
        syn: false,
        rst: false,
        psh: false,
        ack: false,
        urg: false,
        ece: false,
        cwr: false,
    };

    pub const SYN: TcpFlags = TcpFlags {
        syn: true,
        ..TcpFlags::NONE
    };

    pub const ACK: TcpFlags = TcpFlags {
        ack: true,
        ..TcpFlags::NONE
    };

    pub const SYN_ACK: TcpFlags = TcpFlags {
        syn: true,
        ack: true,
        ..TcpFlags::NONE
    };

    pub fn to_u8(self) -> u8 {
        [
            self.fin, self.syn, self.rst, self.psh, self.ack, self.urg, self.ece, self.cwr,
        ]
        .iter()
        .enumerate()
        .fold(0u8, |acc, (bit, &set)| if set { acc | (1 << bit) } else { acc })
    }

    pub fn from_u8(value: u8) -> Self {
        let bit = |n: u8| value & (1 << n) != 0;
        TcpFlags {
            fin: bit(0),
            syn: bit(1),
            rst: bit(2),
            psh: bit(3),
            ack: bit(4),
            urg: bit(5),
            ece: bit(6),
            cwr: bit(7),
        }
    }
}

/// TCP segment
///
/// Built segments carry no options. Options on parsed segments are kept
/// as raw bytes so the segment re-encodes exactly.
#[derive(Debug, Clone)]
pub struct TcpSegment {
    pub source_port: u16,
    pub destination_port: u16,
    pub sequence_number: u32,
    pub acknowledgment_number: u32,
    /// Data offset in 32-bit words
    pub data_offset: u8,
    pub flags: TcpFlags,
    pub window_size: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
    /// Raw option bytes, `header_len() - 20` long
    pub options: Vec<u8>,
    pub payload: Vec<u8>,
}

impl TcpSegment {
    /// TCP header size without options
    pub const HEADER_SIZE: usize = 20;

    pub fn new(
        source_port: u16,
        destination_port: u16,
        sequence_number: u32,
        acknowledgment_number: u32,
        flags: TcpFlags,
        window_size: u16,
        payload: Vec<u8>,
    ) -> Self {
        TcpSegment {
            source_port,
            destination_port,
            sequence_number,
            acknowledgment_number,
            data_offset: 5,
            flags,
            window_size,
            checksum: 0,
            urgent_pointer: 0,
            options: Vec::new(),
            payload,
        }
    }

    /// Calculate and set the checksum over the pseudo-header and segment
    pub fn calculate_checksum(&mut self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) {
        self.checksum = 0;
        self.checksum = transport_checksum(
            src_ip,
            dst_ip,
            IpProtocol::TCP.to_u8(),
            &self.to_bytes(),
        );
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer =
            BytesMut::with_capacity(Self::HEADER_SIZE + self.options.len() + self.payload.len());

        buffer.put_u16(self.source_port);
        buffer.put_u16(self.destination_port);
        buffer.put_u32(self.sequence_number);
        buffer.put_u32(self.acknowledgment_number);
        buffer.put_u8(self.data_offset << 4);
        buffer.put_u8(self.flags.to_u8());
        buffer.put_u16(self.window_size);
        buffer.put_u16(self.checksum);
        buffer.put_u16(self.urgent_pointer);
        buffer.put_slice(&self.options);
        buffer.put_slice(&self.payload);

        buffer.to_vec()
    }

    pub fn to_bytes_with_checksum(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Vec<u8> {
        let mut segment = self.clone();
        segment.calculate_checksum(src_ip, dst_ip);
        segment.to_bytes()
    }

    /// Parse a TCP segment, keeping any option bytes
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        let data_offset = data[12] >> 4;
        let header_len = (data_offset as usize) * 4;
        if header_len < Self::HEADER_SIZE || data.len() < header_len {
            return None;
        }

        Some(TcpSegment {
            source_port: u16::from_be_bytes([data[0], data[1]]),
            destination_port: u16::from_be_bytes([data[2], data[3]]),
            sequence_number: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            acknowledgment_number: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            data_offset,
            flags: TcpFlags::from_u8(data[13]),
            window_size: u16::from_be_bytes([data[14], data[15]]),
            checksum: u16::from_be_bytes([data[16], data[17]]),
            urgent_pointer: u16::from_be_bytes([data[18], data[19]]),
            options: data[Self::HEADER_SIZE..header_len].to_vec(),
            payload: data[header_len..].to_vec(),
        })
    }

    pub fn validate_checksum(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> bool {
        let calculated = transport_checksum(
            src_ip,
            dst_ip,
            IpProtocol::TCP.to_u8(),
            &self.to_bytes(),
        );
        calculated == 0 || calculated == 0xFFFF
    }

    pub fn header_len(&self) -> usize {
        (self.data_offset as usize) * 4
    }

    pub fn len(&self) -> usize {
        self.header_len() + self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syn(source_port: u16, destination_port: u16) -> TcpSegment {
        TcpSegment::new(source_port, destination_port, 0, 0, TcpFlags::SYN, DEFAULT_WINDOW, Vec::new())
    }

    #[test]
    fn test_tcp_flags() {
        assert_eq!(TcpFlags::SYN.to_u8(), 0b0000_0010);
        assert_eq!(TcpFlags::SYN_ACK.to_u8(), 0b0001_0010);
        assert_eq!(TcpFlags::from_u8(0b0001_0010), TcpFlags::SYN_ACK);
        assert_eq!(TcpFlags::from_u8(0), TcpFlags::default());
    }

    #[test]
    fn test_new_has_bare_header() {
        let segment = syn(1234, 80);
        assert_eq!(segment.data_offset, 5);
        assert!(segment.options.is_empty());
        assert_eq!(segment.len(), 20);
    }

    #[test]
    fn test_tcp_segment_to_bytes() {
        let segment = TcpSegment::new(12345, 80, 1000, 2000, TcpFlags::SYN, 65535, vec![0x01]);
        let bytes = segment.to_bytes();

        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), 12345);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 80);
        assert_eq!(u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 1000);
        assert_eq!(u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]), 2000);
        assert_eq!(bytes[12], 0x50);
        assert_eq!(bytes[13], 0x02);
        assert_eq!(u16::from_be_bytes([bytes[14], bytes[15]]), 65535);
        assert_eq!(bytes[20], 0x01);
    }

    #[test]
    fn test_tcp_segment_checksum() {
        let src_ip = Ipv4Addr::new(192, 168, 1, 1);
        let dst_ip = Ipv4Addr::new(192, 168, 1, 2);

        let mut segment = syn(54321, 443);
        segment.calculate_checksum(src_ip, dst_ip);

        assert!(segment.validate_checksum(src_ip, dst_ip));
        assert!(!segment.validate_checksum(dst_ip, Ipv4Addr::new(192, 168, 1, 3)));
    }

    #[test]
    fn test_tcp_segment_from_bytes_keeps_options() {
        let mut data = vec![
            0x30, 0x39, // Source port (12345)
            0x00, 0x50, // Dest port (80)
            0x00, 0x00, 0x03, 0xE8, // Sequence (1000)
            0x00, 0x00, 0x00, 0x00, // Ack
            0x60, // Data offset 6
            0x12, // SYN+ACK
            0x20, 0x00, // Window
            0x00, 0x00, // Checksum
            0x00, 0x00, // Urgent pointer
            0x02, 0x04, 0x05, 0xB4, // MSS option
        ];
        data.push(0xEE);

        let segment = TcpSegment::from_bytes(&data).unwrap();
        assert_eq!(segment.source_port, 12345);
        assert_eq!(segment.destination_port, 80);
        assert_eq!(segment.sequence_number, 1000);
        assert_eq!(segment.flags, TcpFlags::SYN_ACK);
        assert_eq!(segment.window_size, 8192);
        assert_eq!(segment.options, vec![0x02, 0x04, 0x05, 0xB4]);
        assert_eq!(segment.payload, vec![0xEE]);
        assert_eq!(segment.to_bytes(), data);
    }

    #[test]
    fn test_checksum_covers_options() {
        let src_ip = Ipv4Addr::new(10, 0, 0, 1);
        let dst_ip = Ipv4Addr::new(10, 0, 0, 2);

        let mut data = vec![
            0x04, 0xD2, // Source port (1234)
            0x00, 0x50, // Dest port (80)
            0x00, 0x00, 0x00, 0x00, // Sequence
            0x00, 0x00, 0x00, 0x00, // Ack
            0x60, // Data offset 6
            0x02, // SYN
            0x20, 0x00, // Window
            0x00, 0x00, // Checksum
            0x00, 0x00, // Urgent pointer
            0x02, 0x04, 0x05, 0xB4, // MSS option
        ];
        let checksum = transport_checksum(src_ip, dst_ip, 6, &data);
        data[16..18].copy_from_slice(&checksum.to_be_bytes());

        let segment = TcpSegment::from_bytes(&data).unwrap();
        assert_eq!(segment.header_len(), 24);
        assert!(segment.validate_checksum(src_ip, dst_ip));

        let mut stripped = segment.clone();
        stripped.options.clear();
        stripped.data_offset = 5;
        assert!(!stripped.validate_checksum(src_ip, dst_ip));
    }

    #[test]
    fn test_tcp_segment_from_bytes_bad_offset() {
        let mut data = syn(1, 2).to_bytes();
        data[12] = 0x40;
        assert!(TcpSegment::from_bytes(&data).is_none());
    }
}
