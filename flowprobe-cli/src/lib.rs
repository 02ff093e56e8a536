//! Command-line front end for flowprobe
//!
//! Argument parsing, the built-in probe scenarios and the paced sender
//! used by the `flowprobe` binary.

pub mod args;
pub mod scenario;
pub mod sender;

pub use args::{Cli, Commands};
pub use scenario::{Expectation, Probe, Scenario};
pub use sender::{run, send_scenario, SendConfig, SendReport};
