//! Example: Building a tagged UDP frame from a spec
//!
//! Builds a VLAN 100 / PCP 5 UDP frame, prints its bytes and parses it back.

use flowprobe_packet::vlan::VlanTag;
use flowprobe_packet::{build_frame, parse_hex_ipv4, FrameSpec, L4Header};

fn main() -> flowprobe_core::Result<()> {
    let spec = FrameSpec {
        eth_src: "aa:bb:cc:dd:ee:ff".parse()?,
        eth_dst: "00:0a:35:00:10:00".parse()?,
        vlan: Some(VlanTag::checked(100, 5)?),
        ipv4_src: parse_hex_ipv4("0x0c0d0e0f")?,
        ipv4_dst: parse_hex_ipv4("0x0a000001")?,
        ipv4_proto: 17,
        ipv4_tos: 0x2e,
        l4_sport: 1234,
        l4_dport: 4321,
        ..FrameSpec::default()
    };

    let frame = build_frame(&spec)?;
    println!("{}", spec);
    println!("{} ({} bytes)", frame, frame.len());
    println!("Ethernet header: {:02x?}", &frame.as_bytes()[..14]);
    println!("802.1Q TCI + type: {:02x?}", &frame.as_bytes()[14..18]);

    let decoded = frame.decode()?;
    if let Some(tag) = decoded.vlan {
        println!("{}", tag);
    }
    println!("IPv4 {} -> {}", decoded.ipv4.source, decoded.ipv4.destination);
    if let Some(L4Header::Udp(udp)) = decoded.l4 {
        println!(
            "UDP {} -> {} (checksum 0x{:04x})",
            udp.source_port, udp.destination_port, udp.checksum
        );
    }

    Ok(())
}
