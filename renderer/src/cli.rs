use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

/// Name of the binary, as shown in the usage message.
pub const BIN_NAME: &str = "render";

#[derive(Debug, Parser, PartialEq)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct CliArgs {
    /// Directory holding `test_summary.csv`. The chart image is written to the same directory.
    #[arg(allow_hyphen_values = true)]
    pub results_directory: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Wrong number of arguments, or an argument that is not the results directory.
    #[error("expected exactly one argument, the results directory")]
    Usage,
    /// Help or version was requested. Clap prints it and exits successfully.
    #[error(transparent)]
    Info(clap::Error),
}

/// The usage line printed when the arguments are wrong.
pub fn usage() -> String {
    format!("Usage: {BIN_NAME} <results_directory>")
}

/// Parse the process arguments, including the program name in first position.
pub fn parse_args<I, T>(args: I) -> Result<CliArgs, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CliArgs::try_parse_from(args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => CliError::Info(e),
        _ => CliError::Usage,
    })
}
