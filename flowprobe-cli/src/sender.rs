//! Ordered, paced transmission of a scenario

use crate::scenario::Scenario;
use flowprobe_core::{Error, Interface, Result};
use std::fmt::Write as _;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Delay before each frame when none is given
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(300);

/// Transmission settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendConfig {
    /// Interface to send on; unused in dry-run mode
    pub interface: Option<String>,
    /// Sleep before each frame
    pub interval: Duration,
    /// Print frames instead of sending them
    pub dry_run: bool,
    /// Passes over the scenario's probe list
    pub repeat: usize,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            interface: None,
            interval: DEFAULT_INTERVAL,
            dry_run: false,
            repeat: 1,
        }
    }
}

impl SendConfig {
    pub fn with_repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat;
        self
    }
}

/// Totals for a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendReport {
    pub frames: usize,
    pub bytes: usize,
}

/// Build every frame of `scenario`, then hand them to `tx` in order,
/// `config.repeat` times over
///
/// Frames are built once and reused for each pass. Nothing is sent if any
/// probe fails to build. `tx` errors abort the run.
pub fn send_scenario<F>(scenario: &Scenario, config: &SendConfig, mut tx: F) -> Result<SendReport>
where
    F: FnMut(&[u8]) -> Result<()>,
{
    let frames = scenario.build_frames()?;
    let mut report = SendReport::default();

    for pass in 0..config.repeat {
        for (probe, frame) in scenario.probes().iter().zip(&frames) {
            info!(
                probe = %probe.label,
                pass,
                expect = %probe.expectation,
                src = %frame.source(),
                dst = %frame.destination(),
                layers = %frame,
                "sending"
            );

            if !config.interval.is_zero() {
                thread::sleep(config.interval);
            }

            tx(frame.as_bytes())?;
            report.frames += 1;
            report.bytes += frame.len();
        }
    }

    info!(
        scenario = scenario.name(),
        frames = report.frames,
        bytes = report.bytes,
        "scenario complete"
    );
    Ok(report)
}

/// Run a scenario against the configured interface, or print it in dry-run mode
pub fn run(scenario: &Scenario, config: &SendConfig) -> Result<SendReport> {
    if config.dry_run {
        warn!("dry run: frames are printed, not sent");
        return send_scenario(scenario, config, |frame| {
            println!("{}", hex_dump(frame));
            Ok(())
        });
    }

    let name = config
        .interface
        .as_deref()
        .ok_or_else(|| Error::invalid_parameter("interface", "required unless --dry-run is given"))?;

    let mut link = Interface::by_name(name)?.sender()?;
    send_scenario(scenario, config, |frame| link.send_frame(frame))
}

/// Offset-prefixed hex dump, 16 bytes per line
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3 + data.len() / 16 * 7);
    for (i, chunk) in data.chunks(16).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{:04x} ", i * 16);
        for byte in chunk {
            let _ = write!(out, " {:02x}", byte);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Expectation;
    use flowprobe_packet::{DecodedFrame, FrameSpec};
    use std::net::Ipv4Addr;

    fn quick() -> SendConfig {
        SendConfig {
            interval: Duration::ZERO,
            dry_run: true,
            ..SendConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = SendConfig::default();
        assert_eq!(config.interval, Duration::from_millis(300));
        assert!(!config.dry_run);
        assert!(config.interface.is_none());
        assert_eq!(config.repeat, 1);
    }

    #[test]
    fn test_frames_sent_in_order() {
        let scenario = Scenario::dst_match();
        let mut sent: Vec<Vec<u8>> = Vec::new();

        let report = send_scenario(&scenario, &quick(), |frame| {
            sent.push(frame.to_vec());
            Ok(())
        })
        .unwrap();

        assert_eq!(report.frames, 3);
        assert_eq!(report.bytes, sent.iter().map(Vec::len).sum::<usize>());

        let dsts: Vec<_> = sent
            .iter()
            .map(|f| DecodedFrame::parse(f).unwrap().ipv4.destination)
            .collect();
        assert_eq!(
            dsts,
            [
                Ipv4Addr::new(10, 0, 0, 1),
                Ipv4Addr::new(10, 0, 0, 2),
                Ipv4Addr::new(10, 0, 0, 3)
            ]
        );
        assert_eq!(scenario.probes()[0].expectation, Expectation::ShouldMatch);
    }

    #[test]
    fn test_invalid_probe_sends_nothing() {
        let mut scenario = Scenario::dst_match();
        let mut probes = scenario.probes().to_vec();
        probes.push(crate::scenario::Probe::new(
            "icmp",
            Expectation::Unspecified,
            FrameSpec {
                ipv4_proto: 1,
                ..FrameSpec::default()
            },
        ));
        scenario = Scenario::new("broken", probes);

        let mut calls = 0;
        let err = send_scenario(&scenario, &quick(), |_| {
            calls += 1;
            Ok(())
        })
        .unwrap_err();

        assert!(err.is_invalid_protocol());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_transmit_error_stops_run() {
        let scenario = Scenario::dst_match();
        let mut calls = 0;
        let result = send_scenario(&scenario, &quick(), |_| {
            calls += 1;
            if calls == 2 {
                Err(Error::Interface("link down".into()))
            } else {
                Ok(())
            }
        });

        assert!(matches!(result, Err(Error::Interface(_))));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_repeat_passes_in_order() {
        let config = quick().with_repeat(2);
        let mut dsts = Vec::new();

        let report = send_scenario(&Scenario::dst_match(), &config, |frame| {
            dsts.push(DecodedFrame::parse(frame).unwrap().ipv4.destination.octets()[3]);
            Ok(())
        })
        .unwrap();

        assert_eq!(report.frames, 6);
        assert_eq!(dsts, [1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_zero_repeat_sends_nothing() {
        let report = send_scenario(&Scenario::dst_match(), &quick().with_repeat(0), |_| {
            panic!("nothing should be sent");
        })
        .unwrap();
        assert_eq!(report, SendReport::default());
    }

    #[test]
    fn test_huge_repeat_streams_frames() {
        // Frames must go out as they are reached, not be expanded up front
        let config = quick().with_repeat(u32::MAX as usize);
        let mut calls = 0;
        let result = send_scenario(&Scenario::dst_match(), &config, |_| {
            calls += 1;
            if calls == 5 {
                Err(Error::Interface("stop".into()))
            } else {
                Ok(())
            }
        });

        assert!(matches!(result, Err(Error::Interface(_))));
        assert_eq!(calls, 5);
    }

    #[test]
    fn test_run_without_interface() {
        let config = SendConfig {
            dry_run: false,
            ..quick()
        };
        let err = run(&Scenario::dst_match(), &config).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "interface"));
    }

    #[test]
    fn test_dry_run_reports_totals() {
        let report = run(&Scenario::dst_match(), &quick()).unwrap();
        assert_eq!(report, SendReport { frames: 3, bytes: 180 });
    }

    #[test]
    fn test_hex_dump() {
        let data: Vec<u8> = (0u8..18).collect();
        assert_eq!(
            hex_dump(&data),
            "0000  00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f\n0010  10 11"
        );
        assert_eq!(hex_dump(&[]), "");
    }
}
