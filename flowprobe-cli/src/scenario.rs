//! Built-in probe scenarios
//!
//! A scenario is an ordered list of labelled frames, each annotated with
//! whether the device under test is expected to match it.

use flowprobe_core::Result;
use flowprobe_packet::ethernet::{EtherType, MacAddress};
use flowprobe_packet::{build_frame, Frame, FrameSpec};
use std::fmt;
use std::net::Ipv4Addr;

/// Expected rule outcome for a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    ShouldMatch,
    ShouldNotMatch,
    /// No rule is under test
    Unspecified,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::ShouldMatch => write!(f, "should match"),
            Expectation::ShouldNotMatch => write!(f, "should not match"),
            Expectation::Unspecified => write!(f, "-"),
        }
    }
}

/// One labelled frame in a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub label: String,
    pub expectation: Expectation,
    pub spec: FrameSpec,
}

impl Probe {
    pub fn new(label: impl Into<String>, expectation: Expectation, spec: FrameSpec) -> Self {
        Self {
            label: label.into(),
            expectation,
            spec,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    name: String,
    probes: Vec<Probe>,
}

const FIXTURE_SRC_MAC: MacAddress = MacAddress([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
const FIXTURE_DST_MAC: MacAddress = MacAddress([0x00, 0x0a, 0x35, 0x00, 0x10, 0x00]);

fn fixture_udp(src: Ipv4Addr, dst: Ipv4Addr) -> FrameSpec {
    FrameSpec {
        eth_src: FIXTURE_SRC_MAC,
        eth_dst: FIXTURE_DST_MAC,
        eth_type: EtherType::IPv4,
        vlan: None,
        ipv4_src: src,
        ipv4_dst: dst,
        ipv4_proto: 17,
        ipv4_tos: 0,
        l4_sport: 1234,
        l4_dport: 4321,
    }
}

impl Scenario {
    /// Names accepted by the `scenario` subcommand
    pub const NAMES: &'static [&'static str] = &["dst-match"];

    pub fn new(name: impl Into<String>, probes: Vec<Probe>) -> Self {
        Self {
            name: name.into(),
            probes,
        }
    }

    /// Destination-address match test
    ///
    /// Probe 1 targets 10.0.0.1 and should hit the rule; probes 2 and 3
    /// target 10.0.0.2 and 10.0.0.3 and should not. All three are untagged
    /// UDP 1234 -> 4321.
    pub fn dst_match() -> Self {
        Self::new(
            "dst-match",
            vec![
                Probe::new(
                    "probe 1",
                    Expectation::ShouldMatch,
                    fixture_udp(Ipv4Addr::new(12, 13, 14, 15), Ipv4Addr::new(10, 0, 0, 1)),
                ),
                Probe::new(
                    "probe 2",
                    Expectation::ShouldNotMatch,
                    fixture_udp(Ipv4Addr::new(10, 0, 0, 2), Ipv4Addr::new(10, 0, 0, 2)),
                ),
                Probe::new(
                    "probe 3",
                    Expectation::ShouldNotMatch,
                    fixture_udp(Ipv4Addr::new(12, 13, 14, 100), Ipv4Addr::new(10, 0, 0, 3)),
                ),
            ],
        )
    }

    /// A one-frame scenario with no expectation attached
    pub fn single(label: impl Into<String>, spec: FrameSpec) -> Self {
        Self::new("single", vec![Probe::new(label, Expectation::Unspecified, spec)])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    /// Build every frame, failing on the first invalid probe
    pub fn build_frames(&self) -> Result<Vec<Frame>> {
        self.probes.iter().map(|p| build_frame(&p.spec)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowprobe_packet::L4Header;

    #[test]
    fn test_dst_match_fixtures() {
        let scenario = Scenario::dst_match();
        let probes = scenario.probes();
        assert_eq!(scenario.name(), "dst-match");
        assert_eq!(probes.len(), 3);

        assert_eq!(probes[0].expectation, Expectation::ShouldMatch);
        assert_eq!(probes[0].spec.ipv4_src, Ipv4Addr::new(12, 13, 14, 15));
        assert_eq!(probes[0].spec.ipv4_dst, Ipv4Addr::new(10, 0, 0, 1));

        assert_eq!(probes[1].expectation, Expectation::ShouldNotMatch);
        assert_eq!(probes[1].spec.ipv4_dst, Ipv4Addr::new(10, 0, 0, 2));

        assert_eq!(probes[2].expectation, Expectation::ShouldNotMatch);
        assert_eq!(probes[2].spec.ipv4_src, Ipv4Addr::new(12, 13, 14, 100));
        assert_eq!(probes[2].spec.ipv4_dst, Ipv4Addr::new(10, 0, 0, 3));

        for probe in probes {
            assert_eq!(probe.spec.vlan, None);
            assert_eq!(probe.spec.eth_src, FIXTURE_SRC_MAC);
            assert_eq!(probe.spec.eth_dst, FIXTURE_DST_MAC);
        }
    }

    #[test]
    fn test_dst_match_frames_decode() {
        let frames = Scenario::dst_match().build_frames().unwrap();
        let dsts: Vec<_> = frames.iter().map(|f| f.destination()).collect();
        assert_eq!(
            dsts,
            [
                Ipv4Addr::new(10, 0, 0, 1),
                Ipv4Addr::new(10, 0, 0, 2),
                Ipv4Addr::new(10, 0, 0, 3)
            ]
        );

        for frame in &frames {
            let decoded = frame.decode().unwrap();
            match decoded.l4 {
                Some(L4Header::Udp(udp)) => {
                    assert_eq!(udp.source_port, 1234);
                    assert_eq!(udp.destination_port, 4321);
                }
                other => panic!("expected UDP, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_build_frames_stops_on_invalid_probe() {
        let bad = FrameSpec {
            ipv4_proto: 1,
            ..FrameSpec::default()
        };
        let scenario = Scenario::single("icmp", bad);
        assert!(scenario.build_frames().unwrap_err().is_invalid_protocol());
    }
}
