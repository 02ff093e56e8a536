//! Frame builder: turns a [`FrameSpec`] into wire bytes
//!
//! The composition is always Ethernet, then an optional 802.1Q tag, then
//! IPv4 (20-byte header, TTL 64), then an optional TCP or UDP header
//! selected by the IPv4 protocol number. Building is pure and reentrant;
//! each call returns a fresh [`Frame`].

mod decode;
mod spec;


pub use decode::{DecodedFrame, L4Header};
pub use spec::{FrameSpec, L4Protocol};

use crate::builder::{LayerKind, PacketBuilder};
use crate::ip::DEFAULT_TTL;
use crate::tcp::TcpFlags;
use flowprobe_core::Result;
use std::fmt;
use std::net::Ipv4Addr;
use tracing::debug;

/// An encoded frame, ready to hand to a link-layer sender unmodified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
    layers: Vec<LayerKind>,
    source: Ipv4Addr,
    destination: Ipv4Addr,
}

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encoded layers, outermost first
    pub fn layers(&self) -> &[LayerKind] {
        &self.layers
    }

    /// IPv4 source address
    pub fn source(&self) -> Ipv4Addr {
        self.source
    }

    /// IPv4 destination address
    pub fn destination(&self) -> Ipv4Addr {
        self.destination
    }

    /// Parse the frame back into its header fields
    pub fn decode(&self) -> Result<DecodedFrame> {
        DecodedFrame::parse(&self.bytes)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Layer summary, e.g. `Ether / Dot1Q / IP / UDP`
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, layer) in self.layers.iter().enumerate() {
            if i > 0 {
                f.write_str(" / ")?;
            }
            write!(f, "{}", layer)?;
        }
        Ok(())
    }
}

/// Build a frame from a spec
///
/// # Errors
///
/// `InvalidProtocol` when `ipv4_proto` is not 0, 6 or 17. Nothing is
/// encoded in that case.
///
/// ```
/// use flowprobe_packet::frame::{build_frame, FrameSpec};
/// use flowprobe_core::Error;
///
/// let icmp = FrameSpec { ipv4_proto: 1, ..FrameSpec::default() };
/// assert!(matches!(build_frame(&icmp), Err(Error::InvalidProtocol(1))));
/// ```
pub fn build_frame(spec: &FrameSpec) -> Result<Frame> {
    let l4 = spec.validate()?;

    let mut builder = PacketBuilder::new()
        .ethernet(spec.eth_src, spec.eth_dst, spec.eth_type)
        .ipv4(spec.ipv4_src, spec.ipv4_dst)
        .tos(spec.ipv4_tos)
        .ttl(DEFAULT_TTL);

    if let Some(tag) = spec.vlan {
        builder = builder.vlan(tag);
    }

    builder = match l4 {
        L4Protocol::Udp => builder.udp(spec.l4_sport, spec.l4_dport),
        L4Protocol::Tcp => builder.tcp(spec.l4_sport, spec.l4_dport, 0, 0, TcpFlags::SYN),
        L4Protocol::None => builder.protocol(0),
    };

    let bytes = builder.build()?;
    let frame = Frame {
        bytes,
        layers: builder.layers(),
        source: spec.ipv4_src,
        destination: spec.ipv4_dst,
    };

    debug!(
        layers = %frame,
        src = %spec.ipv4_src,
        dst = %spec.ipv4_dst,
        len = frame.len(),
        "built frame"
    );

    Ok(frame)
}
