use flowprobe_cli::args::{scenario_by_name, single_frame_plan};
use flowprobe_cli::{run, Cli, Commands};
use flowprobe_core::{Interface, Result};
use std::process::ExitCode;
use tracing::Level;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Interfaces => {
            for iface in Interface::list_all() {
                let kind = if iface.is_loopback { " [loopback]" } else { "" };
                println!("{}{}", iface, kind);
            }
            Ok(())
        }
        Commands::Scenario { name, output } => {
            let scenario = scenario_by_name(&name)?;
            let report = run(&scenario, &output.send_config())?;
            println!("{}: sent {} frames ({} bytes)", scenario.name(), report.frames, report.bytes);
            Ok(())
        }
        Commands::Send { frame, count, output } => {
            let (scenario, config) = single_frame_plan(&frame, count, &output)?;
            let report = run(&scenario, &config)?;
            println!("sent {} frames ({} bytes)", report.frames, report.bytes);
            Ok(())
        }
    }
}
