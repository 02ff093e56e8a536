//! Example: Building a TCP SYN probe with the fluent builder

use std::net::Ipv4Addr;
use flowprobe_packet::ethernet::{EtherType, MacAddress};
use flowprobe_packet::tcp::TcpFlags;
use flowprobe_packet::PacketBuilder;

fn main() -> flowprobe_core::Result<()> {
    let builder = PacketBuilder::new()
        .ethernet(
            MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            MacAddress([0x00, 0x0a, 0x35, 0x00, 0x10, 0x00]),
            EtherType::IPv4,
        )
        .ipv4(Ipv4Addr::new(192, 168, 1, 100), Ipv4Addr::new(10, 0, 0, 1))
        .tos(0x10)
        .tcp(54321, 80, 0, 0, TcpFlags::SYN)
        .window(65535);

    let packet = builder.build()?;
    let layers: Vec<String> = builder.layers().iter().map(|l| l.to_string()).collect();

    println!("{} ({} bytes)", layers.join(" / "), packet.len());
    println!("TCP flags: 0x{:02x}", packet[47]);
    println!(
        "Window size: {}",
        u16::from_be_bytes([packet[48], packet[49]])
    );

    Ok(())
}
