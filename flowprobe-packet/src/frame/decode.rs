use crate::ethernet::{EtherType, EthernetFrame, MacAddress};
use crate::ip::{IpProtocol, Ipv4Packet};
use crate::tcp::TcpSegment;
use crate::udp::UdpDatagram;
use crate::vlan::{VlanPacket, VlanTag};
use flowprobe_core::{Error, Result};

/// Transport header found inside a decoded frame
#[derive(Debug, Clone)]
pub enum L4Header {
    Udp(UdpDatagram),
    Tcp(TcpSegment),
}

impl L4Header {
    pub fn source_port(&self) -> u16 {
        match self {
            L4Header::Udp(udp) => udp.source_port,
            L4Header::Tcp(tcp) => tcp.source_port,
        }
    }

    pub fn destination_port(&self) -> u16 {
        match self {
            L4Header::Udp(udp) => udp.destination_port,
            L4Header::Tcp(tcp) => tcp.destination_port,
        }
    }
}

/// Header fields recovered from an Ethernet / [802.1Q] / IPv4 / [TCP|UDP] frame
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub eth_src: MacAddress,
    pub eth_dst: MacAddress,
    /// EtherType on the wire right after the MAC addresses
    pub outer_ethertype: EtherType,
    /// EtherType of the payload (inside the tag when tagged)
    pub ethertype: EtherType,
    pub vlan: Option<VlanTag>,
    pub ipv4: Ipv4Packet,
    pub l4: Option<L4Header>,
}

impl DecodedFrame {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let eth = EthernetFrame::from_bytes(data)
            .ok_or_else(|| Error::PacketParsing("truncated Ethernet header".into()))?;

        let (vlan, ethertype, l3) = if eth.ethertype == EtherType::VLAN {
            let tagged = VlanPacket::from_bytes(&eth.payload)?;
            (Some(tagged.tag), tagged.ethertype, tagged.payload)
        } else {
            (None, eth.ethertype, eth.payload)
        };

        let ipv4 = Ipv4Packet::from_bytes(&l3)
            .ok_or_else(|| Error::PacketParsing("payload is not a valid IPv4 packet".into()))?;

        let l4 = match ipv4.protocol {
            IpProtocol::UDP => Some(L4Header::Udp(
                UdpDatagram::from_bytes(&ipv4.payload)
                    .ok_or_else(|| Error::PacketParsing("truncated UDP header".into()))?,
            )),
            IpProtocol::TCP => Some(L4Header::Tcp(
                TcpSegment::from_bytes(&ipv4.payload)
                    .ok_or_else(|| Error::PacketParsing("truncated TCP header".into()))?,
            )),
            _ => None,
        };

        Ok(Self {
            eth_src: eth.source,
            eth_dst: eth.destination,
            outer_ethertype: eth.ethertype,
            ethertype,
            vlan,
            ipv4,
            l4,
        })
    }
}
