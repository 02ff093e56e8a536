//! Parsing of textual field values at the edge of the frame builder
//!
//! Test fixtures describe IPv4 addresses as hexadecimal integers
//! (`"0x0a000001"`) and header fields as either decimal or `0x` hex. These
//! helpers turn that text into the typed values [`FrameSpec`] takes.
//!
//! [`FrameSpec`]: crate::frame::FrameSpec

use flowprobe_core::{Error, Result};
use std::net::Ipv4Addr;

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

/// Convert a big-endian 32-bit integer to an IPv4 address
pub fn ipv4_from_u32(value: u32) -> Ipv4Addr {
    Ipv4Addr::new(
        ((value >> 24) & 0xFF) as u8,
        ((value >> 16) & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        (value & 0xFF) as u8,
    )
}

/// Parse an IPv4 address written as a hexadecimal integer
///
/// The `0x` prefix is optional.
///
/// ```
/// use flowprobe_packet::addr::parse_hex_ipv4;
/// use std::net::Ipv4Addr;
///
/// assert_eq!(parse_hex_ipv4("0x0a000001").unwrap(), Ipv4Addr::new(10, 0, 0, 1));
/// assert_eq!(parse_hex_ipv4("0c0d0e0f").unwrap(), Ipv4Addr::new(12, 13, 14, 15));
/// ```
pub fn parse_hex_ipv4(s: &str) -> Result<Ipv4Addr> {
    let trimmed = s.trim();
    let digits = strip_hex_prefix(trimmed).unwrap_or(trimmed);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::invalid_parameter(
            "ipv4",
            format!("'{}' is not a hexadecimal address", s),
        ));
    }

    let value = u32::from_str_radix(digits, 16).map_err(|_| {
        Error::invalid_parameter("ipv4", format!("'{}' does not fit in 32 bits", s))
    })?;

    Ok(ipv4_from_u32(value))
}

/// Parse an unsigned integer written in decimal or with a `0x` prefix
fn parse_uint(name: &str, s: &str, max: u64) -> Result<u64> {
    let trimmed = s.trim();
    let (digits, radix) = match strip_hex_prefix(trimmed) {
        Some(hex) => (hex, 16),
        None => (trimmed, 10),
    };

    // from_str_radix would also take a leading sign
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(Error::invalid_parameter(name, format!("'{}' is not a number", s)));
    }

    let value = u64::from_str_radix(digits, radix).map_err(|_| {
        Error::invalid_parameter(name, format!("'{}' is out of range", s))
    })?;

    if value > max {
        return Err(Error::invalid_parameter(
            name,
            format!("{} is larger than {}", value, max),
        ));
    }

    Ok(value)
}

/// Parse a 16-bit field (EtherType, port, VLAN ID)
pub fn parse_u16_auto(name: &str, s: &str) -> Result<u16> {
    parse_uint(name, s, u16::MAX as u64).map(|v| v as u16)
}

/// Parse an 8-bit field (protocol, ToS, priority)
pub fn parse_u8_auto(name: &str, s: &str) -> Result<u8> {
    parse_uint(name, s, u8::MAX as u64).map(|v| v as u8)
}
