//! Frame construction and parsing for flow-rule test traffic
//!
//! This crate builds the frames a match/action pipeline is tested with:
//! an Ethernet II header, an optional 802.1Q tag, an IPv4 header and an
//! optional UDP or TCP header. Every frame can also be parsed back into its
//! header fields, which is how the tests check what went on the wire.
//!
//! # Architecture
//!
//! - [`frame`] - Declarative frame builder driven by a [`FrameSpec`]
//! - [`builder`] - Fluent layer-by-layer API used underneath
//! - [`ethernet`] - Ethernet II frame construction and parsing
//! - [`vlan`] - 802.1Q tag encoding
//! - [`ip`] - IPv4 packet construction
//! - [`udp`] - UDP datagram construction
//! - [`tcp`] - TCP segment construction
//! - [`checksum`] - Internet checksum calculation utilities
//! - [`addr`] - Parsers for hex IPv4 addresses and numeric arguments
//!
//! # Quick Start
//!
//! ## Building a frame from a spec
//!
//! ```rust
//! use flowprobe_packet::{build_frame, parse_hex_ipv4, FrameSpec, MacAddress};
//!
//! let spec = FrameSpec {
//!     eth_src: "aa:bb:cc:dd:ee:ff".parse().unwrap(),
//!     eth_dst: "00:0a:35:00:10:00".parse().unwrap(),
//!     ipv4_src: parse_hex_ipv4("0x0c0d0e0f").unwrap(),
//!     ipv4_dst: parse_hex_ipv4("0x0a000001").unwrap(),
//!     ipv4_proto: 17,
//!     l4_sport: 1234,
//!     l4_dport: 4321,
//!     ..FrameSpec::default()
//! };
//!
//! let frame = build_frame(&spec).unwrap();
//! assert_eq!(frame.to_string(), "Ether / IP / UDP");
//! assert_eq!(frame.len(), 60);
//! assert_ne!(spec.eth_src, MacAddress::ZERO);
//! ```
//!
//! ## Tagged TCP probe with the fluent builder
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use flowprobe_packet::PacketBuilder;
//! use flowprobe_packet::ethernet::{MacAddress, EtherType};
//! use flowprobe_packet::tcp::TcpFlags;
//! use flowprobe_packet::vlan::VlanTag;
//!
//! let packet = PacketBuilder::new()
//!     .ethernet(MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]), MacAddress::BROADCAST, EtherType::IPv4)
//!     .vlan(VlanTag::new(100, 5))
//!     .ipv4(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2))
//!     .tcp(54321, 80, 0, 0, TcpFlags::SYN)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(&packet[12..14], &[0x81, 0x00]);
//! ```

pub mod addr;
pub mod builder;
pub mod checksum;
pub mod ethernet;
pub mod frame;
pub mod ip;
pub mod tcp;
pub mod udp;
pub mod vlan;

pub use addr::{parse_hex_ipv4, parse_u16_auto, parse_u8_auto};
pub use builder::{LayerKind, PacketBuilder};
pub use checksum::{internet_checksum, transport_checksum};
pub use ethernet::{EtherType, EthernetFrame, MacAddress};
pub use frame::{build_frame, DecodedFrame, Frame, FrameSpec, L4Header, L4Protocol};
pub use ip::{IpProtocol, Ipv4Packet};
pub use tcp::{TcpFlags, TcpSegment};
pub use udp::UdpDatagram;
pub use vlan::{VlanPacket, VlanTag};
