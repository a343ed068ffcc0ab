use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use netcore::config::{load_or_default, validate_config, NetConfig};
use netcore::lifecycle::startup;
use netcore::observability::init_logging;
use netcore::runtime::Scheduler;

#[derive(Parser)]
#[command(name = "netcore")]
#[command(about = "TCP line server, UDP datagram server and HTTP data endpoint", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the TCP bind address
    #[arg(long)]
    tcp: Option<String>,

    /// Override the UDP bind address
    #[arg(long)]
    udp: Option<String>,

    /// Override the HTTP bind address
    #[arg(long)]
    http: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut NetConfig) {
        if let Some(addr) = &self.tcp {
            config.tcp.bind_address = addr.clone();
        }
        if let Some(addr) = &self.udp {
            config.udp.bind_address = addr.clone();
        }
        if let Some(addr) = &self.http {
            config.http.bind_address = addr.clone();
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("netcore: {e}");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut config);
    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            eprintln!("netcore: invalid configuration: {e}");
        }
        return ExitCode::FAILURE;
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "netcore starting");

    let scheduler = match Scheduler::new(&config.runtime) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build runtime");
            return ExitCode::FAILURE;
        }
    };

    match scheduler.block_on(startup::run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            ExitCode::FAILURE
        }
    }
}
