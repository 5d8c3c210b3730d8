use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;
mod geocode;
mod ledger;
mod table;
mod workflow;

use cli::{Command, RootArgs};

fn main() -> Result<()> {
    let args = RootArgs::parse();

    let default_filter = if matches!(&args.command, Command::Run(run) if run.verbose) {
        "geofill=debug"
    } else {
        "info"
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    match &args.command {
        Command::Run(run) => workflow::run_run(run),
        Command::Check(check) => workflow::run_check(check),
        Command::Usage(usage) => workflow::run_usage(usage),
        Command::InitConfig(init) => workflow::run_init_config(init),
    }
}
