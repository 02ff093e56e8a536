//! Internet checksum (RFC 1071) for IPv4 headers and TCP/UDP segments

use std::net::Ipv4Addr;

/// Ones'-complement sum of `data` taken as big-endian 16-bit words, folded
/// to 16 bits. An odd trailing byte is padded with a zero low byte.
fn ones_complement_sum(data: &[u8], initial: u32) -> u32 {
    let mut sum = initial;

    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }

    if let Some(&byte) = chunks.remainder().first() {
        sum += (byte as u32) << 8;
    }

    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    sum
}

/// Calculates the Internet Checksum over `data`.
///
/// ```
/// use flowprobe_packet::checksum::internet_checksum;
///
/// // RFC 1071 section 3 example
/// let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
/// assert_eq!(internet_checksum(&data), !0xddf2);
/// ```
pub fn internet_checksum(data: &[u8]) -> u16 {
    !(ones_complement_sum(data, 0) as u16)
}

/// Checksum of a TCP or UDP segment including the IPv4 pseudo-header
/// (source, destination, zero, protocol, segment length).
pub fn transport_checksum(src_ip: Ipv4Addr, dst_ip: Ipv4Addr, protocol: u8, segment: &[u8]) -> u16 {
    let mut pseudo_header = [0u8; 12];
    pseudo_header[0..4].copy_from_slice(&src_ip.octets());
    pseudo_header[4..8].copy_from_slice(&dst_ip.octets());
    pseudo_header[9] = protocol;
    pseudo_header[10..12].copy_from_slice(&(segment.len() as u16).to_be_bytes());

    let sum = ones_complement_sum(&pseudo_header, 0);
    !(ones_complement_sum(segment, sum) as u16)
}

/// Validates data that already carries its checksum field.
pub fn validate_checksum(data: &[u8]) -> bool {
    let result = internet_checksum(data);
    result == 0 || result == 0xFFFF
}
