//! UDP datagram construction and parsing

use crate::checksum::transport_checksum;
use crate::ip::IpProtocol;
use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;

/// UDP datagram
#[derive(Debug, Clone)]
pub struct UdpDatagram {
    pub source_port: u16,
    pub destination_port: u16,
    /// Length (header + data)
    pub length: u16,
    pub checksum: u16,
    pub payload: Vec<u8>,
}

impl UdpDatagram {
    /// UDP header size in bytes
    pub const HEADER_SIZE: usize = 8;

    /// Create a new UDP datagram with a zero checksum; call
    /// [`calculate_checksum`](Self::calculate_checksum) once the IPv4
    /// addresses are known. The payload must fit the 16-bit length field.
    pub fn new(source_port: u16, destination_port: u16, payload: Vec<u8>) -> Self {
        UdpDatagram {
            source_port,
            destination_port,
            length: (Self::HEADER_SIZE + payload.len()) as u16,
            checksum: 0,
            payload,
        }
    }

    /// Calculate and set the checksum over the pseudo-header and datagram
    pub fn calculate_checksum(&mut self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) {
        self.checksum = 0;
        let checksum = transport_checksum(
            src_ip,
            dst_ip,
            IpProtocol::UDP.to_u8(),
            &self.to_bytes(),
        );

        // 0 on the wire means "no checksum"
        self.checksum = if checksum == 0 { 0xFFFF } else { checksum };
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(Self::HEADER_SIZE + self.payload.len());
        buffer.put_u16(self.source_port);
        buffer.put_u16(self.destination_port);
        buffer.put_u16(self.length);
        buffer.put_u16(self.checksum);
        buffer.put_slice(&self.payload);
        buffer.to_vec()
    }

    /// Encode with the checksum computed for the given addresses
    pub fn to_bytes_with_checksum(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Vec<u8> {
        let mut datagram = self.clone();
        datagram.calculate_checksum(src_ip, dst_ip);
        datagram.to_bytes()
    }

    /// Parse a UDP datagram; the payload is cut at the length field when it
    /// is consistent with the data
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        let length = u16::from_be_bytes([data[4], data[5]]);
        let end = (length as usize).clamp(Self::HEADER_SIZE, data.len());

        Some(UdpDatagram {
            source_port: u16::from_be_bytes([data[0], data[1]]),
            destination_port: u16::from_be_bytes([data[2], data[3]]),
            length,
            checksum: u16::from_be_bytes([data[6], data[7]]),
            payload: data[Self::HEADER_SIZE..end].to_vec(),
        })
    }

    /// Validate the checksum; a zero checksum means none was sent
    pub fn validate_checksum(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> bool {
        if self.checksum == 0 {
            return true;
        }

        let calculated = transport_checksum(
            src_ip,
            dst_ip,
            IpProtocol::UDP.to_u8(),
            &self.to_bytes(),
        );
        calculated == 0 || calculated == 0xFFFF
    }

    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_datagram_to_bytes() {
        let datagram = UdpDatagram::new(1234, 4321, vec![]);
        let bytes = datagram.to_bytes();

        assert_eq!(
            bytes,
            vec![0x04, 0xd2, 0x10, 0xe1, 0x00, 0x08, 0x00, 0x00]
        );
        assert_eq!(datagram.len(), 8);
    }

    #[test]
    fn test_udp_datagram_checksum() {
        let src_ip = Ipv4Addr::new(12, 13, 14, 15);
        let dst_ip = Ipv4Addr::new(10, 0, 0, 1);

        let mut datagram = UdpDatagram::new(1234, 4321, vec![]);
        datagram.calculate_checksum(src_ip, dst_ip);

        assert_ne!(datagram.checksum, 0);
        assert!(datagram.validate_checksum(src_ip, dst_ip));
        assert!(!datagram.validate_checksum(src_ip, Ipv4Addr::new(10, 0, 0, 2)));
    }

    #[test]
    fn test_udp_datagram_from_bytes_ignores_trailing_padding() {
        let data = vec![
            0x30, 0x39, // Source port (12345)
            0x00, 0x35, // Dest port (53)
            0x00, 0x0A, // Length (10)
            0x00, 0x00, // Checksum
            0x01, 0x02, // Payload
            0x00, 0x00, 0x00, // padding
        ];

        let datagram = UdpDatagram::from_bytes(&data).unwrap();
        assert_eq!(datagram.source_port, 12345);
        assert_eq!(datagram.destination_port, 53);
        assert_eq!(datagram.payload, vec![0x01, 0x02]);
    }

    #[test]
    fn test_udp_datagram_with_checksum_parses_back() {
        let src_ip = Ipv4Addr::new(192, 168, 1, 1);
        let dst_ip = Ipv4Addr::new(192, 168, 1, 2);

        let bytes = UdpDatagram::new(5000, 53, vec![0xAA, 0xBB, 0xCC])
            .to_bytes_with_checksum(src_ip, dst_ip);
        let parsed = UdpDatagram::from_bytes(&bytes).unwrap();

        assert_eq!(parsed.length, 11);
        assert_eq!(parsed.payload, vec![0xAA, 0xBB, 0xCC]);
        assert!(parsed.validate_checksum(src_ip, dst_ip));
    }

    #[test]
    fn test_udp_datagram_too_short() {
        assert!(UdpDatagram::from_bytes(&[0u8; 7]).is_none());
    }
}
