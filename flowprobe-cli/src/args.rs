//! CLI argument parsing
//!
//! Numeric flags accept decimal or `0x`-prefixed hex; IPv4 addresses are
//! given as 32-bit hex strings.

use crate::scenario::Scenario;
use crate::sender::SendConfig;
use clap::{Args, Parser, Subcommand};
use flowprobe_core::{Error, Result};
use flowprobe_packet::ethernet::EtherType;
use flowprobe_packet::vlan::VlanTag;
use flowprobe_packet::{parse_hex_ipv4, parse_u16_auto, parse_u8_auto, FrameSpec};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "flowprobe")]
#[command(version, about = "Send crafted Ethernet/IPv4 frames to exercise forwarding rules", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available network interfaces
    Interfaces,

    /// Send a built-in probe scenario
    Scenario {
        /// Scenario name
        #[arg(value_name = "NAME", default_value = "dst-match")]
        name: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Send a single frame described by flags
    Send {
        #[command(flatten)]
        frame: FrameArgs,

        /// Number of copies to send
        #[arg(short = 'c', long, default_value_t = 1)]
        count: u32,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Where and how fast frames go out
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Network interface to send on
    #[arg(short = 'I', long, required_unless_present = "dry_run")]
    pub interface: Option<String>,

    /// Delay before each frame, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 300)]
    pub interval_ms: u64,

    /// Print frames as hex instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

impl OutputArgs {
    pub fn send_config(&self) -> SendConfig {
        SendConfig {
            interface: self.interface.clone(),
            interval: Duration::from_millis(self.interval_ms),
            dry_run: self.dry_run,
            ..SendConfig::default()
        }
    }
}

/// Header fields for `send`, kept as strings until validated
#[derive(Args, Debug, Clone)]
pub struct FrameArgs {
    /// Source MAC address
    #[arg(long, value_name = "MAC", default_value = "aa:bb:cc:dd:ee:ff")]
    pub eth_src: String,

    /// Destination MAC address
    #[arg(long, value_name = "MAC", default_value = "00:0a:35:00:10:00")]
    pub eth_dst: String,

    /// EtherType of the Ethernet payload
    #[arg(long, value_name = "N", default_value = "0x0800")]
    pub eth_type: String,

    /// 802.1Q VLAN ID (0 sends an untagged frame)
    #[arg(long, value_name = "N", default_value = "0")]
    pub vlan_id: String,

    /// 802.1Q priority code point
    #[arg(long, value_name = "N", default_value = "0")]
    pub vlan_pcp: String,

    /// IPv4 source address as 32-bit hex
    #[arg(long, value_name = "HEX", default_value = "0x0c0d0e0f")]
    pub ip_src: String,

    /// IPv4 destination address as 32-bit hex
    #[arg(long, value_name = "HEX", default_value = "0x0a000001")]
    pub ip_dst: String,

    /// IPv4 protocol: 0 (none), 6 (TCP) or 17 (UDP)
    #[arg(long, value_name = "N", default_value = "17")]
    pub proto: String,

    /// IPv4 type of service
    #[arg(long, value_name = "N", default_value = "0")]
    pub tos: String,

    /// L4 source port
    #[arg(long, value_name = "N", default_value = "1234")]
    pub sport: String,

    /// L4 destination port
    #[arg(long, value_name = "N", default_value = "4321")]
    pub dport: String,
}

impl FrameArgs {
    /// Validate the flags into a frame spec
    pub fn to_spec(&self) -> Result<FrameSpec> {
        let vlan_id = parse_u16_auto("vlan_id", &self.vlan_id)?;
        let vlan_pcp = parse_u8_auto("vlan_pcp", &self.vlan_pcp)?;

        Ok(FrameSpec {
            eth_src: self.eth_src.parse()?,
            eth_dst: self.eth_dst.parse()?,
            eth_type: EtherType::from_u16(parse_u16_auto("eth_type", &self.eth_type)?),
            vlan: VlanTag::from_legacy_id(vlan_id, vlan_pcp)?,
            ipv4_src: parse_hex_ipv4(&self.ip_src)?,
            ipv4_dst: parse_hex_ipv4(&self.ip_dst)?,
            ipv4_proto: parse_u8_auto("proto", &self.proto)?,
            ipv4_tos: parse_u8_auto("tos", &self.tos)?,
            l4_sport: parse_u16_auto("sport", &self.sport)?,
            l4_dport: parse_u16_auto("dport", &self.dport)?,
        })
    }
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Resolve a built-in scenario by name
pub fn scenario_by_name(name: &str) -> Result<Scenario> {
    match name {
        "dst-match" => Ok(Scenario::dst_match()),
        other => Err(Error::invalid_parameter(
            "scenario",
            format!("unknown scenario '{}' (available: {})", other, Scenario::NAMES.join(", ")),
        )),
    }
}

/// Scenario and settings for a `send` invocation: one frame, sent `count` times
pub fn single_frame_plan(
    frame: &FrameArgs,
    count: u32,
    output: &OutputArgs,
) -> Result<(Scenario, SendConfig)> {
    let scenario = Scenario::single("cli", frame.to_spec()?);
    Ok((scenario, output.send_config().with_repeat(count as usize)))
}
