//! Packet builder for constructing layered frames with a fluent API
//!
//! Layers are encoded innermost first: the L4 segment becomes the IPv4
//! payload, the IPv4 packet becomes the 802.1Q payload (if tagged), and
//! that becomes the Ethernet payload.

use crate::ethernet::{EtherType, EthernetFrame, MacAddress};
use crate::ip::{IpProtocol, Ipv4Packet, DEFAULT_IDENTIFICATION, DEFAULT_TTL};
use crate::tcp::{TcpFlags, TcpSegment, DEFAULT_WINDOW};
use crate::udp::UdpDatagram;
use crate::vlan::{VlanPacket, VlanTag};
use flowprobe_core::{Error, Result};
use std::fmt;
use std::net::Ipv4Addr;
use tracing::trace;

/// Kind of an encoded layer, outermost first in a built frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Ethernet,
    Vlan,
    Ipv4,
    Udp,
    Tcp,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::Ethernet => "Ether",
            LayerKind::Vlan => "Dot1Q",
            LayerKind::Ipv4 => "IP",
            LayerKind::Udp => "UDP",
            LayerKind::Tcp => "TCP",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
struct Layer2 {
    src: MacAddress,
    dst: MacAddress,
    ethertype: EtherType,
}

#[derive(Debug, Clone)]
struct Layer3 {
    src: Ipv4Addr,
    dst: Ipv4Addr,
    tos: u8,
    ttl: u8,
    identification: u16,
}

#[derive(Debug, Clone, Copy)]
enum Layer4 {
    Udp {
        src_port: u16,
        dst_port: u16,
    },
    Tcp {
        src_port: u16,
        dst_port: u16,
        seq: u32,
        ack: u32,
        flags: TcpFlags,
        window: u16,
    },
}

/// Packet builder with fluent API for constructing layered frames
///
/// ```
/// use std::net::Ipv4Addr;
/// use flowprobe_packet::PacketBuilder;
/// use flowprobe_packet::ethernet::{EtherType, MacAddress};
/// use flowprobe_packet::vlan::VlanTag;
///
/// let frame = PacketBuilder::new()
///     .ethernet(MacAddress([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]), MacAddress::BROADCAST, EtherType::IPv4)
///     .vlan(VlanTag::new(100, 3))
///     .ipv4(Ipv4Addr::new(12, 13, 14, 15), Ipv4Addr::new(10, 0, 0, 1))
///     .udp(1234, 4321)
///     .build()
///     .unwrap();
///
/// // Outer EtherType is the 802.1Q TPID
/// assert_eq!(&frame[12..14], &[0x81, 0x00]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PacketBuilder {
    layer2: Option<Layer2>,
    vlan: Option<VlanTag>,
    layer3: Option<Layer3>,
    layer4: Option<Layer4>,
    protocol: Option<u8>,
    payload: Vec<u8>,
}

impl PacketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an Ethernet layer
    ///
    /// `ethertype` is the type of the payload. When a VLAN tag is added the
    /// wire EtherType becomes 0x8100 and this value moves into the tag.
    pub fn ethernet(mut self, src: MacAddress, dst: MacAddress, ethertype: EtherType) -> Self {
        self.layer2 = Some(Layer2 {
            src,
            dst,
            ethertype,
        });
        self
    }

    /// Add an 802.1Q tag between the Ethernet header and its payload
    pub fn vlan(mut self, tag: VlanTag) -> Self {
        self.vlan = Some(tag);
        self
    }

    /// Add an IPv4 layer (TTL 64, ToS 0)
    pub fn ipv4(mut self, src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        self.layer3 = Some(Layer3 {
            src,
            dst,
            tos: 0,
            ttl: DEFAULT_TTL,
            identification: DEFAULT_IDENTIFICATION,
        });
        self
    }

    /// Set the Type of Service byte. Must be called after `ipv4()`.
    pub fn tos(mut self, tos: u8) -> Self {
        if let Some(layer3) = self.layer3.as_mut() {
            layer3.tos = tos;
        }
        self
    }

    /// Set the TTL. Must be called after `ipv4()`.
    pub fn ttl(mut self, ttl: u8) -> Self {
        if let Some(layer3) = self.layer3.as_mut() {
            layer3.ttl = ttl;
        }
        self
    }

    /// Set the identification field. Must be called after `ipv4()`.
    pub fn identification(mut self, id: u16) -> Self {
        if let Some(layer3) = self.layer3.as_mut() {
            layer3.identification = id;
        }
        self
    }

    /// Override the IPv4 protocol number when no L4 layer is added
    pub fn protocol(mut self, protocol: u8) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Add a UDP layer
    pub fn udp(mut self, src_port: u16, dst_port: u16) -> Self {
        self.layer4 = Some(Layer4::Udp { src_port, dst_port });
        self
    }

    /// Add a TCP layer with the default window
    pub fn tcp(mut self, src_port: u16, dst_port: u16, seq: u32, ack: u32, flags: TcpFlags) -> Self {
        self.layer4 = Some(Layer4::Tcp {
            src_port,
            dst_port,
            seq,
            ack,
            flags,
            window: DEFAULT_WINDOW,
        });
        self
    }

    /// Set the TCP window size. Must be called after `tcp()`.
    pub fn window(mut self, new_window: u16) -> Self {
        if let Some(Layer4::Tcp { ref mut window, .. }) = self.layer4 {
            *window = new_window;
        }
        self
    }

    /// Set the innermost payload data
    pub fn payload(mut self, data: Vec<u8>) -> Self {
        self.payload = data;
        self
    }

    /// The layers `build()` will emit, outermost first
    pub fn layers(&self) -> Vec<LayerKind> {
        let mut layers = Vec::with_capacity(4);
        if self.layer2.is_some() {
            layers.push(LayerKind::Ethernet);
        }
        if self.vlan.is_some() {
            layers.push(LayerKind::Vlan);
        }
        if self.layer3.is_some() {
            layers.push(LayerKind::Ipv4);
        }
        match self.layer4 {
            Some(Layer4::Udp { .. }) => layers.push(LayerKind::Udp),
            Some(Layer4::Tcp { .. }) => layers.push(LayerKind::Tcp),
            None => {}
        }
        layers
    }

    /// Build the complete frame
    ///
    /// # Errors
    ///
    /// `PacketConstruction` if L4 is configured without IPv4, if the
    /// Ethernet layer is missing, or if the payload does not fit in one
    /// IPv4 packet.
    pub fn build(&self) -> Result<Vec<u8>> {
        let layer2 = self
            .layer2
            .as_ref()
            .ok_or_else(|| Error::PacketConstruction("Layer 2 is required".into()))?;

        if self.layer3.is_some() {
            let l4_header = match self.layer4 {
                Some(Layer4::Udp { .. }) => UdpDatagram::HEADER_SIZE,
                Some(Layer4::Tcp { .. }) => TcpSegment::HEADER_SIZE,
                None => 0,
            };
            let total = Ipv4Packet::HEADER_SIZE + l4_header + self.payload.len();
            if total > Ipv4Packet::MAX_TOTAL_LENGTH {
                return Err(Error::PacketConstruction(format!(
                    "IPv4 packet of {} bytes exceeds the {}-byte limit",
                    total,
                    Ipv4Packet::MAX_TOTAL_LENGTH
                )));
            }
        }

        let mut packet_data = self.payload.clone();

        if let Some(layer4) = self.layer4 {
            let layer3 = self
                .layer3
                .as_ref()
                .ok_or_else(|| Error::PacketConstruction("Layer 4 requires Layer 3".into()))?;

            packet_data = match layer4 {
                Layer4::Udp { src_port, dst_port } => {
                    UdpDatagram::new(src_port, dst_port, packet_data)
                        .to_bytes_with_checksum(layer3.src, layer3.dst)
                }
                Layer4::Tcp {
                    src_port,
                    dst_port,
                    seq,
                    ack,
                    flags,
                    window,
                } => TcpSegment::new(src_port, dst_port, seq, ack, flags, window, packet_data)
                    .to_bytes_with_checksum(layer3.src, layer3.dst),
            };
            trace!(len = packet_data.len(), "encoded L4");
        }

        if let Some(layer3) = &self.layer3 {
            let protocol = match self.layer4 {
                Some(Layer4::Udp { .. }) => IpProtocol::UDP,
                Some(Layer4::Tcp { .. }) => IpProtocol::TCP,
                None => IpProtocol::from_u8(self.protocol.unwrap_or(0)),
            };

            packet_data = Ipv4Packet::new(layer3.src, layer3.dst, protocol, packet_data)
                .with_tos(layer3.tos)
                .with_ttl(layer3.ttl)
                .with_identification(layer3.identification)
                .to_bytes();
            trace!(len = packet_data.len(), "encoded IPv4");
        }

        let ethertype = match self.vlan {
            Some(tag) => {
                packet_data = VlanPacket::new(tag, layer2.ethertype, packet_data).to_bytes();
                EtherType::VLAN
            }
            None => layer2.ethertype,
        };

        Ok(EthernetFrame::new(layer2.dst, layer2.src, ethertype, packet_data).to_bytes())
    }

    /// Build the frame and hand it to a transmit function
    pub fn send<F>(&self, mut tx: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let frame = self.build()?;
        tx(&frame)
    }
}
