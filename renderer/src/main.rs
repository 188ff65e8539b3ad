use anyhow::Context;
use load_test_renderer::cli::{self, CliError};
use load_test_renderer::{render_report, RenderConfig};
use log::debug;

const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    env_logger::try_init()?;

    let args = match cli::parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(CliError::Usage) => {
            println!("{}", cli::usage());
            std::process::exit(1);
        }
        Err(CliError::Info(e)) => e.exit(),
    };
    debug!("{CRATE_NAME} {CRATE_VERSION}");

    let config = RenderConfig::from_env().context("Invalid render configuration")?;
    debug!("Using render configuration: {config:?}");

    render_report(&args.results_directory, &config)?;

    Ok(())
}
